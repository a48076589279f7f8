//! 通用会话引擎
//!
//! 管理两人对局的座位、准备标志和生命周期。具体规则通过
//! [`GameRules`] 注入，会话本身不了解棋盘。
//!
//! 每次操作都基于当前快照构造新快照并整体替换；
//! 被拒绝的操作不会修改任何状态。

use std::fmt;
use std::sync::Arc;

use protocol::{
    Color, ContinuityLink, DrawReason, GameError, GameResult, GameSnapshot, GameStatus, Outcome,
    PlayerId, ReadyFlags, Seats, SessionId, WinReason,
};
use tracing::debug;

/// 规则能力接口
pub trait GameRules: Send + Sync + 'static {
    /// 游戏相关状态
    type State: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// 走法
    type Move: fmt::Debug + Send + 'static;

    /// 开局前的状态
    fn initial_state(&self) -> Self::State;

    /// 为新加入的玩家选择座位
    ///
    /// 调用方保证至少有一个空座；返回已占用的座位属于编程错误。
    fn assign_seat(&self, seats: &Seats, prior: Option<&ContinuityLink>, player: PlayerId) -> Color;

    /// 双方准备后计算开局状态（先手等）
    fn start(&self, state: &Self::State, seats: &Seats, prior: Option<&ContinuityLink>) -> Self::State;

    /// 当前应走棋的颜色
    fn turn(&self, state: &Self::State) -> Color;

    /// 本局先手
    fn first_player(&self, state: &Self::State) -> Color;

    /// 检查走法是否合法
    fn validate_move(&self, state: &Self::State, color: Color, mv: &Self::Move) -> Result<(), GameError>;

    /// 执行已校验的走法，返回新状态
    fn apply_move(&self, state: &Self::State, color: Color, mv: &Self::Move) -> Self::State;

    /// 判断是否终局
    fn check_terminal(&self, state: &Self::State) -> Option<Outcome>;

    /// 由某局快照生成下一局的延续信息
    fn continuity(&self, snapshot: &GameSnapshot<Self::State>) -> ContinuityLink {
        ContinuityLink::new(snapshot.seats, self.first_player(&snapshot.state))
    }
}

/// 共享的只读快照
pub type SharedSnapshot<S> = Arc<GameSnapshot<S>>;

/// 会话
pub struct Session<R: GameRules> {
    rules: R,
    current: SharedSnapshot<R::State>,
}

impl<R: GameRules> Session<R> {
    /// 创建空会话
    pub fn new(id: SessionId, rules: R) -> Self {
        Self::with_prior(id, rules, None)
    }

    /// 创建与上一局关联的会话
    pub fn with_prior(id: SessionId, rules: R, prior: Option<ContinuityLink>) -> Self {
        let state = rules.initial_state();
        Self {
            rules,
            current: Arc::new(GameSnapshot::new(id, prior, state)),
        }
    }

    /// 会话 ID
    pub fn id(&self) -> SessionId {
        self.current.session_id
    }

    /// 规则
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// 当前快照
    pub fn snapshot(&self) -> SharedSnapshot<R::State> {
        Arc::clone(&self.current)
    }

    /// 本局的延续信息，供同房间下一局使用
    pub fn continuity(&self) -> ContinuityLink {
        self.rules.continuity(&self.current)
    }

    /// 替换当前快照
    fn commit(&mut self, next: GameSnapshot<R::State>) -> SharedSnapshot<R::State> {
        self.current = Arc::new(next);
        self.snapshot()
    }

    /// 加入对局
    pub fn join(&mut self, player: PlayerId) -> Result<SharedSnapshot<R::State>, GameError> {
        let cur = &self.current;
        if cur.seats.contains(player) {
            return Err(GameError::AlreadyInGame);
        }
        if cur.status == GameStatus::Over {
            return Err(GameError::GameOver);
        }
        if cur.seats.is_full() {
            return Err(GameError::GameFull);
        }

        let color = self.rules.assign_seat(&cur.seats, cur.prior.as_ref(), player);
        assert!(
            cur.seats.get(color).is_none(),
            "assign_seat returned occupied seat {color}"
        );

        let seats = cur.seats.with(color, player);
        let status = if seats.is_full() {
            GameStatus::WaitingToStart
        } else {
            GameStatus::WaitingForPlayers
        };
        debug!(session_id = cur.session_id, player, %color, ?status, "玩家入座");

        let next = GameSnapshot {
            status,
            seats,
            ready: ReadyFlags::default(),
            ..(**cur).clone()
        };
        Ok(self.commit(next))
    }

    /// 准备开始
    pub fn mark_ready(&mut self, player: PlayerId) -> Result<SharedSnapshot<R::State>, GameError> {
        let cur = &self.current;
        let color = cur.seats.color_of(player).ok_or(GameError::PlayerNotInGame)?;
        if cur.status != GameStatus::WaitingToStart {
            return Err(GameError::GameNotStartable);
        }

        let ready = cur.ready.with(color);
        let mut next = GameSnapshot {
            ready,
            ..(**cur).clone()
        };

        if ready.both() {
            next.state = self.rules.start(&cur.state, &cur.seats, cur.prior.as_ref());
            next.status = GameStatus::InProgress;
            debug!(
                session_id = cur.session_id,
                first_player = %self.rules.first_player(&next.state),
                "双方已准备，对局开始"
            );
        } else {
            debug!(session_id = cur.session_id, player, %color, "玩家已准备");
        }

        Ok(self.commit(next))
    }

    /// 离开对局
    ///
    /// 进行中离开判负；等待开局时离开回到等待玩家；其余状态只清空座位。
    pub fn leave(&mut self, player: PlayerId) -> Result<SharedSnapshot<R::State>, GameError> {
        let cur = &self.current;
        let color = cur.seats.color_of(player).ok_or(GameError::PlayerNotInGame)?;

        let mut next = GameSnapshot {
            seats: cur.seats.without(color),
            ready: ReadyFlags::default(),
            prior: cur.prior.map(|link| link.forget(player)),
            ..(**cur).clone()
        };

        match cur.status {
            GameStatus::InProgress => {
                let remaining = color.opponent();
                next.status = GameStatus::Over;
                next.winner = cur.seats.get(remaining);
                next.result = Some(GameResult::win(remaining, WinReason::Forfeit { leaver: player }));
                debug!(session_id = cur.session_id, player, winner = ?next.winner, "对局中离开，判负");
            }
            GameStatus::WaitingToStart => {
                next.status = GameStatus::WaitingForPlayers;
                debug!(session_id = cur.session_id, player, "等待开局时离开");
            }
            GameStatus::WaitingForPlayers | GameStatus::Over => {
                debug!(session_id = cur.session_id, player, status = ?cur.status, "玩家离座");
            }
        }

        Ok(self.commit(next))
    }

    /// 走棋
    pub fn apply_move(
        &mut self,
        player: PlayerId,
        mv: R::Move,
    ) -> Result<SharedSnapshot<R::State>, GameError> {
        let cur = &self.current;
        if cur.status != GameStatus::InProgress {
            return Err(GameError::GameNotInProgress);
        }
        let color = cur.seats.color_of(player).ok_or(GameError::PlayerNotInGame)?;
        if self.rules.turn(&cur.state) != color {
            return Err(GameError::NotYourTurn);
        }
        self.rules.validate_move(&cur.state, color, &mv)?;

        let state = self.rules.apply_move(&cur.state, color, &mv);
        let mut next = GameSnapshot {
            state,
            ..(**cur).clone()
        };

        match self.rules.check_terminal(&next.state) {
            Some(Outcome::Win(winner)) => {
                next.status = GameStatus::Over;
                next.winner = cur.seats.get(winner);
                next.result = Some(GameResult::win(winner, WinReason::Connected));
                debug!(session_id = cur.session_id, %winner, "连线获胜");
            }
            Some(Outcome::Draw) => {
                next.status = GameStatus::Over;
                next.winner = None;
                next.result = Some(GameResult::Draw(DrawReason::BoardFull));
                debug!(session_id = cur.session_id, "棋盘已满，和棋");
            }
            None => {
                debug!(session_id = cur.session_id, player, ?mv, "落子");
            }
        }

        Ok(self.commit(next))
    }
}
