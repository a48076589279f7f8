//! 棋谱记录格式
//!
//! 支持 JSON 格式的棋谱导出，以及按走法重放校验

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::board::{BoardConfig, ConnectFourState};
use crate::error::GameError;
use crate::fen::Fen;
use crate::message::PlayerId;
use crate::moves::AppliedMove;
use crate::piece::Color;
use crate::snapshot::{ConnectFourSnapshot, GameResult, Outcome};

/// 棋谱版本
pub const RECORD_VERSION: &str = "1.0";

/// 游戏元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// 红方玩家
    pub red_player: Option<PlayerId>,
    /// 黄方玩家
    pub yellow_player: Option<PlayerId>,
    /// 游戏日期
    pub date: String,
    /// 先手
    pub first_player: Color,
    /// 棋盘配置
    pub board: BoardConfig,
    /// 游戏结果
    pub result: Option<GameResult>,
}

/// 完整的棋谱记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 版本号
    pub version: String,
    /// 元数据
    pub metadata: GameMetadata,
    /// 走法列表
    pub moves: Vec<AppliedMove>,
    /// 最终局面 FEN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_fen: Option<String>,
}

impl GameRecord {
    /// 创建新的棋谱记录
    pub fn new(board: BoardConfig, first_player: Color) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            metadata: GameMetadata {
                red_player: None,
                yellow_player: None,
                date: Utc::now().format("%Y-%m-%d").to_string(),
                first_player,
                board,
                result: None,
            },
            moves: Vec::new(),
            final_fen: None,
        }
    }

    /// 从会话快照生成棋谱
    ///
    /// 结束后离座的玩家从结果中找回：获胜方取自 `winner`，判负方取自离开记录。
    pub fn from_snapshot(snapshot: &ConnectFourSnapshot, board: BoardConfig) -> Self {
        let mut record = Self::new(board, snapshot.state.first_player);
        let mut seats = snapshot.seats;
        if let Some(ref result) = snapshot.result {
            if let (Some(color), Some(winner)) = (result.winner(), snapshot.winner) {
                seats = seats.with(color, winner);
                if let Some(leaver) = result.leaver() {
                    seats = seats.with(color.opponent(), leaver);
                }
            }
        }
        record.metadata.red_player = seats.red;
        record.metadata.yellow_player = seats.yellow;
        record.metadata.result = snapshot.result.clone();
        record.moves = snapshot.state.moves.clone();
        record.final_fen = Some(Fen::to_string(&snapshot.state));
        record
    }

    /// 添加走法
    pub fn add_move(&mut self, mv: AppliedMove) {
        self.moves.push(mv);
    }

    /// 设置游戏结果
    pub fn set_result(&mut self, result: GameResult) {
        self.metadata.result = Some(result);
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 从空棋盘按顺序重放全部走法
    ///
    /// 每一步都校验走子顺序和落点，终局后不允许继续落子。
    pub fn replay(&self) -> Result<(ConnectFourState, Option<Outcome>), GameError> {
        let config = &self.metadata.board;
        let mut state = ConnectFourState::new(config, self.metadata.first_player);
        let mut outcome = None;

        for mv in &self.moves {
            if outcome.is_some() {
                return Err(GameError::GameNotInProgress);
            }
            if mv.color != state.current_turn() {
                return Err(GameError::NotYourTurn);
            }
            let pos = state
                .board
                .resolve_target(mv.column, Some(mv.row), config.gravity)?;
            state = state.with_move(AppliedMove::new(pos.column, pos.row, mv.color));
            outcome = state.outcome(config.win_length);
        }

        tracing::debug!(moves = self.moves.len(), ?outcome, "棋谱重放完成");
        Ok((state, outcome))
    }

    /// 生成可读的文本格式
    ///
    /// 落点记为列字母加自底向上的行号，如 `d1`。
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let rows = self.metadata.board.rows;

        let name = |player: Option<PlayerId>| match player {
            Some(id) => format!("#{}", id),
            None => "-".to_string(),
        };
        output.push_str(&format!("红方: {}\n", name(self.metadata.red_player)));
        output.push_str(&format!("黄方: {}\n", name(self.metadata.yellow_player)));
        output.push_str(&format!("先手: {}\n", self.metadata.first_player));

        if !self.moves.is_empty() {
            output.push_str("\n走法：\n");
            for (i, mv) in self.moves.iter().enumerate() {
                let square = format!("{}{}", column_label(mv.column), rows.saturating_sub(mv.row));
                if i % 2 == 0 {
                    output.push_str(&format!("{}. {}", i / 2 + 1, square));
                } else {
                    output.push_str(&format!("  {}\n", square));
                }
            }
            if self.moves.len() % 2 == 1 {
                output.push('\n');
            }
        }

        if let Some(ref result) = self.metadata.result {
            output.push_str(&format!("\n结果: {:?}\n", result));
        }

        output
    }
}

/// 列标记：前 26 列用字母，其后用 `[序号]`
fn column_label(column: u8) -> String {
    if column < 26 {
        ((b'a' + column) as char).to_string()
    } else {
        format!("[{}]", column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::WinReason;

    fn vertical_win_record() -> GameRecord {
        let mut record = GameRecord::new(BoardConfig::default(), Color::Red);
        // 红方在第 0 列竖连四子，黄方在第 1 列陪走
        for row in (2..6).rev() {
            record.add_move(AppliedMove::new(0, row, Color::Red));
            if row > 2 {
                record.add_move(AppliedMove::new(1, row, Color::Yellow));
            }
        }
        record
    }

    #[test]
    fn test_game_record_json() {
        let mut record = vertical_win_record();
        record.set_result(GameResult::win(Color::Red, WinReason::Connected));

        let json = record.to_json().unwrap();
        let parsed = GameRecord::from_json(&json).unwrap();
        assert_eq!(parsed.moves.len(), 7);
        assert_eq!(parsed.metadata.first_player, Color::Red);
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_replay_detects_win() {
        let record = vertical_win_record();
        let (state, outcome) = record.replay().unwrap();
        assert_eq!(outcome, Some(Outcome::Win(Color::Red)));
        assert_eq!(state.moves.len(), 7);
    }

    #[test]
    fn test_replay_rejects_out_of_turn() {
        let mut record = GameRecord::new(BoardConfig::default(), Color::Red);
        record.add_move(AppliedMove::new(0, 5, Color::Red));
        record.add_move(AppliedMove::new(1, 5, Color::Red));
        assert_eq!(record.replay().unwrap_err(), GameError::NotYourTurn);
    }

    #[test]
    fn test_replay_rejects_floating_piece() {
        let mut record = GameRecord::new(BoardConfig::default(), Color::Yellow);
        record.add_move(AppliedMove::new(3, 2, Color::Yellow));
        assert_eq!(
            record.replay().unwrap_err(),
            GameError::InvalidPosition { column: 3, row: Some(2) }
        );
    }

    #[test]
    fn test_replay_rejects_moves_after_win() {
        let mut record = vertical_win_record();
        record.add_move(AppliedMove::new(1, 2, Color::Yellow));
        assert_eq!(record.replay().unwrap_err(), GameError::GameNotInProgress);
    }

    #[test]
    fn test_forfeit_record_keeps_both_players() {
        let config = BoardConfig::default();
        let mut snapshot = ConnectFourSnapshot::new(1, None, ConnectFourState::new(&config, Color::Red));
        // 红方 10 对局中离开，黄方 20 随后也离座
        snapshot.status = crate::snapshot::GameStatus::Over;
        snapshot.winner = Some(20);
        snapshot.result = Some(GameResult::win(Color::Yellow, WinReason::Forfeit { leaver: 10 }));

        let record = GameRecord::from_snapshot(&snapshot, config);
        assert_eq!(record.metadata.red_player, Some(10));
        assert_eq!(record.metadata.yellow_player, Some(20));
        assert_eq!(record.metadata.result.as_ref().and_then(GameResult::leaver), Some(10));
    }

    #[test]
    fn test_connected_record_uses_seats() {
        let config = BoardConfig::default();
        let mut snapshot = ConnectFourSnapshot::new(1, None, ConnectFourState::new(&config, Color::Red));
        snapshot.seats = crate::snapshot::Seats { red: Some(1), yellow: None };
        snapshot.winner = Some(1);
        snapshot.result = Some(GameResult::win(Color::Red, WinReason::Connected));

        let record = GameRecord::from_snapshot(&snapshot, config);
        assert_eq!(record.metadata.red_player, Some(1));
        assert_eq!(record.metadata.yellow_player, None);
    }

    #[test]
    fn test_text_format_wide_columns() {
        let mut record = GameRecord::new(BoardConfig::default(), Color::Red);
        record.add_move(AppliedMove::new(200, 5, Color::Red));
        record.add_move(AppliedMove::new(25, 5, Color::Yellow));
        let text = record.to_text();
        assert!(text.contains("1. [200]1  z1"));
    }

    #[test]
    fn test_text_format() {
        let record = vertical_win_record();
        let text = record.to_text();
        assert!(text.contains("1. a1  b1"));
        assert!(text.contains("4. a4"));
    }
}
