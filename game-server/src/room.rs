//! 房间系统
//!
//! 一个房间依次承载多局对局，每局是一个新的会话；
//! 新会话带上上一局的延续信息。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};
use tracing::info;

use protocol::{ConnectFourState, GameStatus, RoomId, RoomInfo, SessionId};

use crate::connect_four::ConnectFourRules;
use crate::server::{ServerError, SessionEvent, SessionHandle};
use crate::session::{GameRules, Session, SharedSnapshot};
use crate::settings::ServerSettings;

/// 四子棋会话句柄
pub type ConnectFourHandle = SessionHandle<ConnectFourRules>;

/// 房间
pub struct Room {
    pub id: RoomId,
    /// 当前对局
    pub session: ConnectFourHandle,
    /// 已结束并被替换的对局数
    pub games_played: u32,
    /// 创建时间
    pub created_at: Instant,
}

impl Room {
    /// 获取房间信息（用于列表展示）
    pub fn info(&self) -> RoomInfo {
        let snapshot = self.session.snapshot();
        RoomInfo {
            id: self.id,
            session_id: snapshot.session_id,
            status: snapshot.status,
            seats: snapshot.seats,
            games_played: self.games_played,
        }
    }

    /// 房间存在的时长
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// 房间管理器
pub struct RoomManager {
    rooms: RwLock<HashMap<RoomId, Room>>,
    next_room_id: AtomicU64,
    next_session_id: AtomicU64,
    rules: ConnectFourRules,
    queue_capacity: usize,
    events: Option<mpsc::Sender<SessionEvent<ConnectFourState>>>,
}

impl RoomManager {
    pub fn new(settings: &ServerSettings) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_room_id: AtomicU64::new(1),
            next_session_id: AtomicU64::new(1),
            rules: ConnectFourRules::new(settings.board, settings.default_first_player),
            queue_capacity: settings.queue_capacity,
            events: None,
        }
    }

    /// 设置快照事件接收端
    pub fn with_events(mut self, events: mpsc::Sender<SessionEvent<ConnectFourState>>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn rules(&self) -> &ConnectFourRules {
        &self.rules
    }

    fn next_session_id(&self) -> SessionId {
        self.next_session_id.fetch_add(1, Ordering::SeqCst)
    }

    fn spawn_session(&self, room_id: RoomId, session: Session<ConnectFourRules>) -> ConnectFourHandle {
        SessionHandle::spawn(room_id, session, self.queue_capacity, self.events.clone())
    }

    /// 创建房间
    pub async fn create(&self) -> (RoomId, ConnectFourHandle) {
        let id = self.next_room_id.fetch_add(1, Ordering::SeqCst);
        let session = Session::new(self.next_session_id(), self.rules);
        let handle = self.spawn_session(id, session);

        let room = Room {
            id,
            session: handle.clone(),
            games_played: 0,
            created_at: Instant::now(),
        };
        self.rooms.write().await.insert(id, room);

        info!(room_id = id, session_id = handle.session_id(), "房间已创建");
        (id, handle)
    }

    /// 获取房间当前会话
    pub async fn session(&self, room_id: RoomId) -> Result<ConnectFourHandle, ServerError> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map(|room| room.session.clone())
            .ok_or(ServerError::RoomNotFound { room_id })
    }

    /// 获取房间信息
    pub async fn info(&self, room_id: RoomId) -> Result<RoomInfo, ServerError> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map(Room::info)
            .ok_or(ServerError::RoomNotFound { room_id })
    }

    /// 上一局结束后开始新的一局
    pub async fn new_game(
        &self,
        room_id: RoomId,
    ) -> Result<SharedSnapshot<ConnectFourState>, ServerError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&room_id)
            .ok_or(ServerError::RoomNotFound { room_id })?;

        let finished = room.session.snapshot();
        if finished.status != GameStatus::Over {
            return Err(ServerError::GameNotOver { room_id });
        }

        let link = self.rules.continuity(&finished);
        let session = Session::with_prior(self.next_session_id(), self.rules, Some(link));
        let snapshot = session.snapshot();
        room.session = self.spawn_session(room_id, session);
        room.games_played += 1;

        info!(
            room_id,
            session_id = snapshot.session_id,
            games_played = room.games_played,
            "新一局已创建"
        );
        Ok(snapshot)
    }

    /// 移除房间，会话任务随最后一个句柄退出
    pub async fn remove(&self, room_id: RoomId) -> Result<(), ServerError> {
        match self.rooms.write().await.remove(&room_id) {
            Some(room) => {
                info!(
                    room_id,
                    games_played = room.games_played,
                    age_secs = room.age().as_secs(),
                    "房间已移除"
                );
                Ok(())
            }
            None => Err(ServerError::RoomNotFound { room_id }),
        }
    }

    /// 房间数量
    pub async fn count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// 可加入的房间列表
    pub async fn list_open(&self) -> Vec<RoomInfo> {
        let mut rooms: Vec<RoomInfo> = self
            .rooms
            .read()
            .await
            .values()
            .map(Room::info)
            .filter(|info| info.status == GameStatus::WaitingForPlayers)
            .collect();
        rooms.sort_by_key(|info| info.id);
        rooms
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(&ServerSettings::default())
    }
}
