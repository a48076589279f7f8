//! 会话宿主与消息分发
//!
//! 每个会话由一个 tokio 任务独占，请求经有界队列按顺序处理，
//! 同一会话任意时刻只有一个状态转换在执行。最新快照通过
//! `watch` 通道发布，读取不阻塞。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use protocol::{
    decode_frame, encode_frame, ClientMessage, ErrorCode, GameError, PlayerId, ProtocolError,
    RoomId, ServerMessage, SessionId,
};

use crate::room::RoomManager;
use crate::session::{GameRules, Session, SharedSnapshot};

/// 宿主层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    #[error("Room {room_id} not found")]
    RoomNotFound { room_id: RoomId },

    #[error("Session {session_id} is closed")]
    SessionClosed { session_id: SessionId },

    #[error("Game in room {room_id} is not over yet")]
    GameNotOver { room_id: RoomId },

    #[error(transparent)]
    Game(#[from] GameError),
}

impl From<&ServerError> for ErrorCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::RoomNotFound { .. } => ErrorCode::RoomNotFound,
            ServerError::SessionClosed { .. } => ErrorCode::InternalError,
            ServerError::GameNotOver { .. } => ErrorCode::GameNotOver,
            ServerError::Game(e) => ErrorCode::from(e),
        }
    }
}

/// 发给会话任务的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest<M> {
    /// 加入
    Join,
    /// 准备
    Ready,
    /// 走棋
    Move(M),
    /// 离开
    Leave,
}

/// 会话快照更新事件
#[derive(Debug, Clone)]
pub struct SessionEvent<S> {
    pub room_id: RoomId,
    pub snapshot: SharedSnapshot<S>,
    /// 本次转换使对局进入结束状态
    pub finished: bool,
}

type Reply<S> = oneshot::Sender<Result<SharedSnapshot<S>, GameError>>;

struct Envelope<R: GameRules> {
    player: PlayerId,
    request: SessionRequest<R::Move>,
    reply: Reply<R::State>,
}

/// 会话句柄
///
/// 可自由克隆；所有句柄被丢弃后会话任务退出。
pub struct SessionHandle<R: GameRules> {
    session_id: SessionId,
    tx: mpsc::Sender<Envelope<R>>,
    latest: watch::Receiver<SharedSnapshot<R::State>>,
}

impl<R: GameRules> Clone for SessionHandle<R> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id,
            tx: self.tx.clone(),
            latest: self.latest.clone(),
        }
    }
}

impl<R: GameRules> SessionHandle<R> {
    /// 启动会话任务
    ///
    /// `events` 存在时，每次成功的状态转换后发送一条 [`SessionEvent`]。
    pub fn spawn(
        room_id: RoomId,
        session: Session<R>,
        capacity: usize,
        events: Option<mpsc::Sender<SessionEvent<R::State>>>,
    ) -> Self {
        let session_id = session.id();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (watch_tx, latest) = watch::channel(session.snapshot());

        tokio::spawn(run_session(room_id, session, rx, watch_tx, events));
        debug!(room_id, session_id, "会话任务已启动");

        Self {
            session_id,
            tx,
            latest,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// 最新快照（不阻塞）
    pub fn snapshot(&self) -> SharedSnapshot<R::State> {
        Arc::clone(&self.latest.borrow())
    }

    /// 订阅快照更新
    pub fn watch(&self) -> watch::Receiver<SharedSnapshot<R::State>> {
        self.latest.clone()
    }

    /// 提交请求并等待结果
    pub async fn request(
        &self,
        player: PlayerId,
        request: SessionRequest<R::Move>,
    ) -> Result<SharedSnapshot<R::State>, ServerError> {
        let closed = || ServerError::SessionClosed {
            session_id: self.session_id,
        };
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                player,
                request,
                reply,
            })
            .await
            .map_err(|_| closed())?;
        let result = rx.await.map_err(|_| closed())?;
        Ok(result?)
    }

    pub async fn join(&self, player: PlayerId) -> Result<SharedSnapshot<R::State>, ServerError> {
        self.request(player, SessionRequest::Join).await
    }

    pub async fn ready(&self, player: PlayerId) -> Result<SharedSnapshot<R::State>, ServerError> {
        self.request(player, SessionRequest::Ready).await
    }

    pub async fn apply_move(
        &self,
        player: PlayerId,
        mv: R::Move,
    ) -> Result<SharedSnapshot<R::State>, ServerError> {
        self.request(player, SessionRequest::Move(mv)).await
    }

    pub async fn leave(&self, player: PlayerId) -> Result<SharedSnapshot<R::State>, ServerError> {
        self.request(player, SessionRequest::Leave).await
    }
}

/// 会话任务主循环
async fn run_session<R: GameRules>(
    room_id: RoomId,
    mut session: Session<R>,
    mut rx: mpsc::Receiver<Envelope<R>>,
    watch_tx: watch::Sender<SharedSnapshot<R::State>>,
    events: Option<mpsc::Sender<SessionEvent<R::State>>>,
) {
    let session_id = session.id();

    while let Some(Envelope {
        player,
        request,
        reply,
    }) = rx.recv().await
    {
        let was_over = session.snapshot().is_over();
        let result = match request {
            SessionRequest::Join => session.join(player),
            SessionRequest::Ready => session.mark_ready(player),
            SessionRequest::Move(mv) => session.apply_move(player, mv),
            SessionRequest::Leave => session.leave(player),
        };

        match &result {
            Ok(snapshot) => {
                watch_tx.send_replace(Arc::clone(snapshot));
                if let Some(events) = &events {
                    let event = SessionEvent {
                        room_id,
                        snapshot: Arc::clone(snapshot),
                        finished: !was_over && snapshot.is_over(),
                    };
                    if events.send(event).await.is_err() {
                        warn!(room_id, session_id, "事件接收端已关闭");
                    }
                }
            }
            Err(e) => debug!(room_id, session_id, player, error = %e, "请求被拒绝"),
        }

        // 请求方可能已放弃等待
        let _ = reply.send(result);
    }

    info!(room_id, session_id, "会话任务结束");
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理二进制帧形式的请求
    ///
    /// 缓冲区不足一帧时返回 `Ok(None)`；否则返回编码后的响应帧和已消费的字节数。
    pub async fn handle_frame(
        rooms: &RoomManager,
        player_id: PlayerId,
        buf: &[u8],
    ) -> Result<Option<(Vec<u8>, usize)>, ProtocolError> {
        let Some((msg, used)) = decode_frame::<ClientMessage>(buf)? else {
            return Ok(None);
        };
        let response = Self::handle(rooms, player_id, msg).await;
        Ok(Some((encode_frame(&response)?, used)))
    }

    /// 处理宿主层转交的请求
    pub async fn handle(rooms: &RoomManager, player_id: PlayerId, msg: ClientMessage) -> ServerMessage {
        let result = match msg {
            ClientMessage::CreateRoom => Self::handle_create_room(rooms, player_id).await,
            ClientMessage::JoinRoom { room_id } => {
                Self::forward(rooms, room_id, player_id, SessionRequest::Join).await
            }
            ClientMessage::LeaveRoom { room_id } => {
                Self::forward(rooms, room_id, player_id, SessionRequest::Leave).await
            }
            ClientMessage::Ready { room_id } => {
                Self::forward(rooms, room_id, player_id, SessionRequest::Ready).await
            }
            ClientMessage::MakeMove { room_id, mv } => {
                Self::forward(rooms, room_id, player_id, SessionRequest::Move(mv)).await
            }
            ClientMessage::ListRooms => Ok(ServerMessage::RoomList {
                rooms: rooms.list_open().await,
            }),
            ClientMessage::NewGame { room_id } => {
                rooms
                    .new_game(room_id)
                    .await
                    .map(|snapshot| ServerMessage::State {
                        room_id,
                        snapshot: (*snapshot).clone(),
                    })
            }
            ClientMessage::GetState { room_id } => {
                rooms
                    .session(room_id)
                    .await
                    .map(|handle| ServerMessage::State {
                        room_id,
                        snapshot: (*handle.snapshot()).clone(),
                    })
            }
            ClientMessage::Ping => Ok(ServerMessage::Pong),
        };

        result.unwrap_or_else(|e| {
            debug!(player_id, error = %e, "请求失败");
            ServerMessage::Error {
                code: ErrorCode::from(&e),
                message: e.to_string(),
            }
        })
    }

    /// 创建房间，创建者自动入座
    async fn handle_create_room(
        rooms: &RoomManager,
        player_id: PlayerId,
    ) -> Result<ServerMessage, ServerError> {
        let (room_id, handle) = rooms.create().await;
        let snapshot = handle.join(player_id).await?;
        Ok(ServerMessage::RoomCreated {
            room_id,
            snapshot: (*snapshot).clone(),
        })
    }

    /// 转发到房间当前会话
    async fn forward(
        rooms: &RoomManager,
        room_id: RoomId,
        player_id: PlayerId,
        request: SessionRequest<protocol::ConnectFourMove>,
    ) -> Result<ServerMessage, ServerError> {
        let handle = rooms.session(room_id).await?;
        let snapshot = handle.request(player_id, request).await?;
        Ok(ServerMessage::State {
            room_id,
            snapshot: (*snapshot).clone(),
        })
    }
}
