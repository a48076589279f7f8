//! 协议常量定义

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 默认棋盘行数
pub const DEFAULT_ROWS: u8 = 6;

/// 默认棋盘列数
pub const DEFAULT_COLUMNS: u8 = 7;

/// 默认连线长度
pub const DEFAULT_WIN_LENGTH: u8 = 4;

/// 棋盘单边最大尺寸
pub const MAX_BOARD_DIMENSION: u8 = 32;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 会话请求队列默认容量
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
