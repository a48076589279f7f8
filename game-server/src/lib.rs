//! 四子棋服务端
//!
//! 包含:
//! - 通用会话引擎
//! - 四子棋规则
//! - 会话宿主与消息分发
//! - 房间系统
//! - 服务端设置

pub mod connect_four;
pub mod room;
pub mod server;
pub mod session;
pub mod settings;

pub use connect_four::ConnectFourRules;
pub use room::{ConnectFourHandle, Room, RoomManager};
pub use server::{MessageHandler, ServerError, SessionEvent, SessionHandle, SessionRequest};
pub use session::{GameRules, Session, SharedSnapshot};
pub use settings::{LogLevel, ServerSettings};
