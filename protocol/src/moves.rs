//! 走法定义

use serde::{Deserialize, Serialize};

use crate::piece::{Color, Position};

/// 客户端提交的走法
///
/// `color` 仅作参考，服务端以座位颜色为准。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectFourMove {
    /// 列
    pub column: u8,
    /// 行（重力模式下可省略）
    pub row: Option<u8>,
    /// 客户端声称的颜色
    pub color: Color,
}

impl ConnectFourMove {
    /// 重力落子：只给出列
    pub fn drop(column: u8, color: Color) -> Self {
        Self {
            column,
            row: None,
            color,
        }
    }

    /// 指定行列落子
    pub fn at(column: u8, row: u8, color: Color) -> Self {
        Self {
            column,
            row: Some(row),
            color,
        }
    }
}

/// 已执行的走法（落点已确定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedMove {
    pub column: u8,
    pub row: u8,
    pub color: Color,
}

impl AppliedMove {
    pub fn new(column: u8, row: u8, color: Color) -> Self {
        Self { column, row, color }
    }

    /// 落点位置
    pub fn position(&self) -> Position {
        Position::new(self.column, self.row)
    }
}
