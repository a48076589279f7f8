//! 棋子颜色与棋盘位置

use serde::{Deserialize, Serialize};

/// 棋子颜色，同时标识座位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// 红方（默认先手）
    Red,
    /// 黄方
    Yellow,
}

impl Color {
    /// 规范顺序：先红后黄
    pub const ALL: [Color; 2] = [Color::Red, Color::Yellow];

    /// 获取对方颜色
    pub fn opponent(&self) -> Color {
        match self {
            Color::Red => Color::Yellow,
            Color::Yellow => Color::Red,
        }
    }

    /// 获取 FEN 字符（棋子用大写）
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::Red => 'R',
            Color::Yellow => 'Y',
        }
    }

    /// 从 FEN 字符解析，大小写均可
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'r' | 'R' => Some(Color::Red),
            'y' | 'Y' => Some(Color::Yellow),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Yellow => write!(f, "Yellow"),
        }
    }
}

/// 棋盘位置
///
/// 第 0 行在最上方，最后一行是底行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 列
    pub column: u8,
    /// 行
    pub row: u8,
}

impl Position {
    /// 创建新位置（是否越界由棋盘判断）
    pub const fn new(column: u8, row: u8) -> Self {
        Self { column, row }
    }

    /// 获取偏移后的位置，超出给定尺寸时返回 None
    pub fn offset(&self, dc: i8, dr: i8, columns: u8, rows: u8) -> Option<Position> {
        let column = self.column as i16 + dc as i16;
        let row = self.row as i16 + dr as i16;
        if column >= 0 && column < columns as i16 && row >= 0 && row < rows as i16 {
            Some(Position {
                column: column as u8,
                row: row as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(col {}, row {})", self.column, self.row)
    }
}
