//! 四子棋共享协议库
//!
//! 包含:
//! - 颜色、位置、棋盘等核心数据结构
//! - 落点计算与连线判定
//! - 会话快照与生命周期状态
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 帧编解码
//! - 棋谱格式 (JSON, FEN)

mod board;
mod codec;
mod constants;
mod error;
mod fen;
mod message;
mod moves;
mod piece;
mod record;
mod snapshot;

pub use board::{Board, BoardConfig, ConnectFourState};
pub use codec::{decode_frame, encode_frame, HEADER_SIZE};
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use fen::{Fen, EMPTY_FEN};
pub use message::{
    ClientMessage, ServerMessage, ErrorCode, RoomInfo, PlayerId, RoomId, SessionId,
};
pub use moves::{AppliedMove, ConnectFourMove};
pub use piece::{Color, Position};
pub use record::{GameMetadata, GameRecord, RECORD_VERSION};
pub use snapshot::{
    ConnectFourSnapshot, ContinuityLink, DrawReason, GameResult, GameSnapshot, GameStatus,
    Outcome, ReadyFlags, Seats, WinReason,
};
