//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::moves::ConnectFourMove;
use crate::snapshot::{ConnectFourSnapshot, GameStatus, Seats};

/// 玩家 ID
pub type PlayerId = u64;

/// 房间 ID
pub type RoomId = u64;

/// 会话 ID
pub type SessionId = u64;

/// 房间信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    pub session_id: SessionId,
    pub status: GameStatus,
    pub seats: Seats,
    /// 已结束的对局数
    pub games_played: u32,
}

/// 宿主层转交给引擎的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    // === 房间操作 ===
    /// 创建房间并加入
    CreateRoom,
    /// 加入房间当前对局
    JoinRoom { room_id: RoomId },
    /// 离开房间当前对局
    LeaveRoom { room_id: RoomId },
    /// 获取可加入的房间列表
    ListRooms,
    /// 上一局结束后开新局
    NewGame { room_id: RoomId },

    // === 对局操作 ===
    /// 准备开始
    Ready { room_id: RoomId },
    /// 落子
    MakeMove { room_id: RoomId, mv: ConnectFourMove },
    /// 查询当前快照
    GetState { room_id: RoomId },

    // === 心跳 ===
    /// 心跳请求
    Ping,
}

/// 引擎返回给宿主层的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// 房间创建成功
    RoomCreated {
        room_id: RoomId,
        snapshot: ConnectFourSnapshot,
    },
    /// 房间列表
    RoomList { rooms: Vec<RoomInfo> },
    /// 最新快照
    State {
        room_id: RoomId,
        snapshot: ConnectFourSnapshot,
    },

    /// 心跳响应
    Pong,

    /// 错误消息
    Error { code: ErrorCode, message: String },
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // === 房间相关 (1xx) ===
    /// 房间不存在
    RoomNotFound = 100,
    /// 座位已满
    GameFull = 101,
    /// 玩家已在对局中
    AlreadyInGame = 102,
    /// 玩家不在对局中
    PlayerNotInGame = 103,
    /// 上一局尚未结束
    GameNotOver = 104,

    // === 对局相关 (2xx) ===
    /// 不是你的回合
    NotYourTurn = 200,
    /// 无效位置
    InvalidPosition = 201,
    /// 对局未在进行中
    GameNotInProgress = 202,
    /// 对局已结束
    GameAlreadyOver = 203,
    /// 当前不能准备
    GameNotStartable = 204,
    /// 目标格已有棋子
    BoardPositionNotEmpty = 205,
    /// 该列已满
    ColumnFull = 206,

    // === 系统相关 (5xx) ===
    /// 内部错误
    InternalError = 500,
}

impl From<&GameError> for ErrorCode {
    fn from(err: &GameError) -> Self {
        match err {
            GameError::AlreadyInGame => ErrorCode::AlreadyInGame,
            GameError::GameFull => ErrorCode::GameFull,
            GameError::GameOver => ErrorCode::GameAlreadyOver,
            GameError::PlayerNotInGame => ErrorCode::PlayerNotInGame,
            GameError::GameNotStartable => ErrorCode::GameNotStartable,
            GameError::GameNotInProgress => ErrorCode::GameNotInProgress,
            GameError::NotYourTurn => ErrorCode::NotYourTurn,
            GameError::BoardPositionNotEmpty { .. } => ErrorCode::BoardPositionNotEmpty,
            GameError::ColumnFull { .. } => ErrorCode::ColumnFull,
            GameError::InvalidPosition { .. } => ErrorCode::InvalidPosition,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
