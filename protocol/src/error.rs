//! 错误类型定义

use thiserror::Error;

/// 对局规则错误
///
/// 全部是可恢复的业务拒绝：出错时会话状态保持不变。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 玩家已在对局中
    #[error("Player is already in this game")]
    AlreadyInGame,

    /// 座位已满
    #[error("Game is full")]
    GameFull,

    /// 对局已结束
    #[error("Game is already over")]
    GameOver,

    /// 玩家不在对局中
    #[error("Player is not in this game")]
    PlayerNotInGame,

    /// 当前状态不能准备开始
    #[error("Game is not waiting to start")]
    GameNotStartable,

    /// 对局未在进行中
    #[error("Game is not in progress")]
    GameNotInProgress,

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 目标格已有棋子
    #[error("Board position (col {column}, row {row}) is not empty")]
    BoardPositionNotEmpty { column: u8, row: u8 },

    /// 该列已满
    #[error("Column {column} is full")]
    ColumnFull { column: u8 },

    /// 无效位置（越界或悬空）
    #[error("Invalid board position: col {column}, row {row:?}")]
    InvalidPosition { column: u8, row: Option<u8> },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 无效的 FEN 字符串
    #[error("Invalid FEN string: {reason}")]
    InvalidFen { reason: String },

    /// 无效的棋盘配置
    #[error("Invalid board config: {reason}")]
    InvalidBoardConfig { reason: String },

    /// 对局规则错误
    #[error("Game error: {0}")]
    Game(#[from] GameError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
