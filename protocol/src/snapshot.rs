//! 会话快照
//!
//! 快照是不可变值：每次状态转换都生成新快照整体替换旧快照。

use serde::{Deserialize, Serialize};

use crate::board::ConnectFourState;
use crate::message::{PlayerId, SessionId};
use crate::piece::Color;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// 等待玩家加入
    WaitingForPlayers,
    /// 座位已满，等待双方准备
    WaitingToStart,
    /// 对局进行中
    InProgress,
    /// 对局结束
    Over,
}

/// 终局判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// 某方连线获胜
    Win(Color),
    /// 平局
    Draw,
}

/// 游戏结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// 红方胜
    RedWin(WinReason),
    /// 黄方胜
    YellowWin(WinReason),
    /// 和棋
    Draw(DrawReason),
}

impl GameResult {
    /// 指定颜色获胜
    pub fn win(color: Color, reason: WinReason) -> Self {
        match color {
            Color::Red => GameResult::RedWin(reason),
            Color::Yellow => GameResult::YellowWin(reason),
        }
    }

    /// 获胜颜色（和棋为 None）
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::RedWin(_) => Some(Color::Red),
            GameResult::YellowWin(_) => Some(Color::Yellow),
            GameResult::Draw(_) => None,
        }
    }

    /// 判负离开的玩家
    pub fn leaver(&self) -> Option<PlayerId> {
        match self {
            GameResult::RedWin(WinReason::Forfeit { leaver })
            | GameResult::YellowWin(WinReason::Forfeit { leaver }) => Some(*leaver),
            _ => None,
        }
    }
}

/// 胜利原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinReason {
    /// 连成一线
    Connected,
    /// 对方在对局中离开
    Forfeit { leaver: PlayerId },
}

/// 和棋原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// 棋盘已满
    BoardFull,
}

/// 两个座位，按颜色寻址
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub red: Option<PlayerId>,
    pub yellow: Option<PlayerId>,
}

impl Seats {
    /// 获取指定颜色的玩家
    pub fn get(&self, color: Color) -> Option<PlayerId> {
        match color {
            Color::Red => self.red,
            Color::Yellow => self.yellow,
        }
    }

    /// 获取玩家的颜色
    pub fn color_of(&self, player: PlayerId) -> Option<Color> {
        Color::ALL.into_iter().find(|c| self.get(*c) == Some(player))
    }

    /// 玩家是否在座
    pub fn contains(&self, player: PlayerId) -> bool {
        self.color_of(player).is_some()
    }

    /// 第一个空座（先红后黄）
    pub fn open_color(&self) -> Option<Color> {
        Color::ALL.into_iter().find(|c| self.get(*c).is_none())
    }

    pub fn is_full(&self) -> bool {
        self.red.is_some() && self.yellow.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_none() && self.yellow.is_none()
    }

    /// 在座人数
    pub fn count(&self) -> usize {
        self.red.is_some() as usize + self.yellow.is_some() as usize
    }

    /// 返回占据指定座位后的新值
    pub fn with(self, color: Color, player: PlayerId) -> Self {
        match color {
            Color::Red => Self { red: Some(player), ..self },
            Color::Yellow => Self { yellow: Some(player), ..self },
        }
    }

    /// 返回清空指定座位后的新值
    pub fn without(self, color: Color) -> Self {
        match color {
            Color::Red => Self { red: None, ..self },
            Color::Yellow => Self { yellow: None, ..self },
        }
    }
}

/// 准备标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyFlags {
    pub red: bool,
    pub yellow: bool,
}

impl ReadyFlags {
    pub fn get(&self, color: Color) -> bool {
        match color {
            Color::Red => self.red,
            Color::Yellow => self.yellow,
        }
    }

    /// 返回设置指定颜色准备后的新值
    pub fn with(self, color: Color) -> Self {
        match color {
            Color::Red => Self { red: true, ..self },
            Color::Yellow => Self { yellow: true, ..self },
        }
    }

    /// 双方都已准备
    pub fn both(&self) -> bool {
        self.red && self.yellow
    }
}

/// 与同一房间上一局的延续信息
///
/// 构造新会话时从上一局复制，仅用于默认座位和先手的计算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityLink {
    /// 上一局的座位
    pub seats: Seats,
    /// 上一局的先手
    pub first_player: Color,
}

impl ContinuityLink {
    pub fn new(seats: Seats, first_player: Color) -> Self {
        Self { seats, first_player }
    }

    /// 玩家在上一局的颜色
    pub fn color_of(&self, player: PlayerId) -> Option<Color> {
        self.seats.color_of(player)
    }

    /// 玩家是否参加过上一局
    pub fn involves(&self, player: PlayerId) -> bool {
        self.seats.contains(player)
    }

    /// 忘记某个玩家（离开后再加入视为新玩家）
    pub fn forget(self, player: PlayerId) -> Self {
        match self.seats.color_of(player) {
            Some(color) => Self {
                seats: self.seats.without(color),
                ..self
            },
            None => self,
        }
    }
}

/// 会话快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot<S> {
    /// 会话 ID
    pub session_id: SessionId,
    /// 会话状态
    pub status: GameStatus,
    /// 座位
    pub seats: Seats,
    /// 准备标志
    pub ready: ReadyFlags,
    /// 获胜玩家（进行中或和棋时为 None）
    pub winner: Option<PlayerId>,
    /// 对局结果
    pub result: Option<GameResult>,
    /// 上一局延续信息
    pub prior: Option<ContinuityLink>,
    /// 游戏相关状态
    pub state: S,
}

impl<S> GameSnapshot<S> {
    /// 创建空会话的初始快照
    pub fn new(session_id: SessionId, prior: Option<ContinuityLink>, state: S) -> Self {
        Self {
            session_id,
            status: GameStatus::WaitingForPlayers,
            seats: Seats::default(),
            ready: ReadyFlags::default(),
            winner: None,
            result: None,
            prior,
            state,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::Over
    }
}

/// 四子棋会话快照
pub type ConnectFourSnapshot = GameSnapshot<ConnectFourState>;
