//! 四子棋规则
//!
//! 棋盘计算在 `protocol::Board`，这里负责把它接入会话引擎，
//! 并实现同房间连续对局的座位与先手策略。

use protocol::{
    AppliedMove, BoardConfig, Color, ConnectFourMove, ConnectFourState, ContinuityLink,
    GameError, Outcome, PlayerId, Seats,
};
use tracing::warn;

use crate::session::GameRules;

/// 四子棋规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectFourRules {
    config: BoardConfig,
    default_first_player: Color,
}

impl ConnectFourRules {
    pub fn new(config: BoardConfig, default_first_player: Color) -> Self {
        Self {
            config,
            default_first_player,
        }
    }

    /// 棋盘配置
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }
}

impl Default for ConnectFourRules {
    fn default() -> Self {
        Self::new(BoardConfig::default(), Color::Red)
    }
}

impl GameRules for ConnectFourRules {
    type State = ConnectFourState;
    type Move = ConnectFourMove;

    fn initial_state(&self) -> ConnectFourState {
        ConnectFourState::new(&self.config, self.default_first_player)
    }

    /// 上一局的玩家换一种颜色，其余玩家按红、黄顺序入座
    fn assign_seat(&self, seats: &Seats, prior: Option<&ContinuityLink>, player: PlayerId) -> Color {
        let preferred = prior
            .and_then(|link| link.color_of(player))
            .map(|color| color.opponent());

        match preferred {
            Some(color) if seats.get(color).is_none() => color,
            _ => {
                let open = seats.open_color();
                debug_assert!(open.is_some(), "assign_seat called with both seats taken");
                open.unwrap_or(Color::Red)
            }
        }
    }

    /// 有玩家参加过上一局时先手交换，否则使用默认先手
    fn start(
        &self,
        _state: &ConnectFourState,
        seats: &Seats,
        prior: Option<&ContinuityLink>,
    ) -> ConnectFourState {
        let first_player = match prior {
            Some(link)
                if Color::ALL
                    .into_iter()
                    .filter_map(|color| seats.get(color))
                    .any(|player| link.involves(player)) =>
            {
                link.first_player.opponent()
            }
            _ => self.default_first_player,
        };
        ConnectFourState::new(&self.config, first_player)
    }

    fn turn(&self, state: &ConnectFourState) -> Color {
        state.current_turn()
    }

    fn first_player(&self, state: &ConnectFourState) -> Color {
        state.first_player
    }

    fn validate_move(
        &self,
        state: &ConnectFourState,
        _color: Color,
        mv: &ConnectFourMove,
    ) -> Result<(), GameError> {
        state
            .board
            .resolve_target(mv.column, mv.row, self.config.gravity)
            .map(|_| ())
    }

    fn apply_move(&self, state: &ConnectFourState, color: Color, mv: &ConnectFourMove) -> ConnectFourState {
        match state.board.resolve_target(mv.column, mv.row, self.config.gravity) {
            Ok(pos) => state.with_move(AppliedMove::new(pos.column, pos.row, color)),
            Err(e) => {
                warn!(?mv, error = %e, "未校验的走法被忽略");
                debug_assert!(false, "apply_move called with invalid move {:?}", mv);
                state.clone()
            }
        }
    }

    fn check_terminal(&self, state: &ConnectFourState) -> Option<Outcome> {
        state.outcome(self.config.win_length)
    }
}
