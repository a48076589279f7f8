//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_WIN_LENGTH, MAX_BOARD_DIMENSION};
use crate::error::{GameError, ProtocolError, Result};
use crate::moves::AppliedMove;
use crate::piece::{Color, Position};
use crate::snapshot::Outcome;

/// 检查连线的四个方向：横、竖、右上斜、右下斜
const DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (1, -1), (1, 1)];

/// 棋盘配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// 行数
    pub rows: u8,
    /// 列数
    pub columns: u8,
    /// 获胜所需连子数
    pub win_length: u8,
    /// 是否重力落子（只指定列，落到最低空位）
    pub gravity: bool,
}

impl BoardConfig {
    /// 格子总数
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ProtocolError::InvalidBoardConfig {
                reason: "board must have at least one row and one column".to_string(),
            });
        }
        if self.rows > MAX_BOARD_DIMENSION || self.columns > MAX_BOARD_DIMENSION {
            return Err(ProtocolError::InvalidBoardConfig {
                reason: format!(
                    "board is {}x{}, max dimension is {}",
                    self.rows, self.columns, MAX_BOARD_DIMENSION
                ),
            });
        }
        if self.win_length < 2 {
            return Err(ProtocolError::InvalidBoardConfig {
                reason: format!("win length {} is shorter than 2", self.win_length),
            });
        }
        if self.win_length > self.rows.max(self.columns) {
            return Err(ProtocolError::InvalidBoardConfig {
                reason: format!(
                    "win length {} does not fit on a {}x{} board",
                    self.win_length, self.rows, self.columns
                ),
            });
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            win_length: DEFAULT_WIN_LENGTH,
            gravity: true,
        }
    }
}

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: u8,
    columns: u8,
    /// 索引为 row * columns + column
    cells: Vec<Option<Color>>,
    /// 每列已落子数
    heights: Vec<u8>,
}

impl Board {
    /// 按配置创建空棋盘
    pub fn empty(config: &BoardConfig) -> Self {
        Self::with_size(config.rows, config.columns)
    }

    /// 创建指定尺寸的空棋盘
    pub fn with_size(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows as usize * columns as usize],
            heights: vec![0; columns as usize],
        }
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    /// 检查位置是否在棋盘内
    pub fn contains(&self, pos: Position) -> bool {
        pos.column < self.columns && pos.row < self.rows
    }

    fn index(&self, pos: Position) -> usize {
        pos.row as usize * self.columns as usize + pos.column as usize
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Position) -> Option<Color> {
        if self.contains(pos) {
            self.cells[self.index(pos)]
        } else {
            None
        }
    }

    /// 放置棋子（不检查规则）
    pub fn place(&mut self, pos: Position, color: Color) {
        if !self.contains(pos) {
            return;
        }
        let index = self.index(pos);
        debug_assert!(self.cells[index].is_none(), "cell {} already occupied", pos);
        if self.cells[index].is_none() {
            self.heights[pos.column as usize] += 1;
        }
        self.cells[index] = Some(color);
    }

    /// 某列已落子数
    pub fn height(&self, column: u8) -> u8 {
        self.heights.get(column as usize).copied().unwrap_or(0)
    }

    /// 某列是否已满
    pub fn is_column_full(&self, column: u8) -> bool {
        self.height(column) >= self.rows
    }

    /// 重力落子时的落点行（列满或越界时为 None）
    pub fn landing_row(&self, column: u8) -> Option<u8> {
        if column >= self.columns || self.is_column_full(column) {
            return None;
        }
        Some(self.rows - 1 - self.height(column))
    }

    /// 棋子总数
    pub fn piece_count(&self) -> usize {
        self.heights.iter().map(|h| *h as usize).sum()
    }

    /// 棋盘是否已无空位
    pub fn is_full(&self) -> bool {
        self.piece_count() == self.cells.len()
    }

    /// 计算一步棋的目标格
    ///
    /// 先做越界检查，再查看棋盘。重力模式下 `row` 可省略，
    /// 给出时必须等于落点行。
    pub fn resolve_target(
        &self,
        column: u8,
        row: Option<u8>,
        gravity: bool,
    ) -> std::result::Result<Position, GameError> {
        if column >= self.columns || row.is_some_and(|r| r >= self.rows) {
            return Err(GameError::InvalidPosition { column, row });
        }

        if !gravity {
            let row = row.ok_or(GameError::InvalidPosition { column, row })?;
            let pos = Position::new(column, row);
            if self.get(pos).is_some() {
                return Err(GameError::BoardPositionNotEmpty { column, row });
            }
            return Ok(pos);
        }

        let landing = self
            .landing_row(column)
            .ok_or(GameError::ColumnFull { column })?;
        match row {
            None => Ok(Position::new(column, landing)),
            Some(r) if r == landing => Ok(Position::new(column, r)),
            Some(r) if self.get(Position::new(column, r)).is_some() => {
                Err(GameError::BoardPositionNotEmpty { column, row: r })
            }
            Some(r) => Err(GameError::InvalidPosition { column, row: Some(r) }),
        }
    }

    /// 从 `pos` 出发（不含自身）沿方向统计同色连续棋子
    fn run(&self, pos: Position, color: Color, dc: i8, dr: i8) -> Vec<Position> {
        let mut cells = Vec::new();
        let mut cursor = pos;
        while let Some(next) = cursor.offset(dc, dr, self.columns, self.rows) {
            if self.get(next) != Some(color) {
                break;
            }
            cells.push(next);
            cursor = next;
        }
        cells
    }

    /// 经过 `pos` 的获胜连线
    ///
    /// 只检查经过该格的四条线，不扫描整个棋盘。
    pub fn line_through(&self, pos: Position, win_length: u8) -> Option<Vec<Position>> {
        let color = self.get(pos)?;
        for (dc, dr) in DIRECTIONS {
            let mut line = self.run(pos, color, -dc, -dr);
            line.reverse();
            line.push(pos);
            line.extend(self.run(pos, color, dc, dr));
            if line.len() >= win_length as usize {
                return Some(line);
            }
        }
        None
    }

    /// 经过 `pos` 是否存在获胜连线
    pub fn connects(&self, pos: Position, win_length: u8) -> bool {
        self.line_through(pos, win_length).is_some()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty(&BoardConfig::default())
    }
}

/// 四子棋对局状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectFourState {
    /// 棋盘
    pub board: Board,
    /// 先手颜色
    pub first_player: Color,
    /// 已执行的走法（只追加）
    pub moves: Vec<AppliedMove>,
}

impl ConnectFourState {
    /// 创建空局面
    pub fn new(config: &BoardConfig, first_player: Color) -> Self {
        Self {
            board: Board::empty(config),
            first_player,
            moves: Vec::new(),
        }
    }

    /// 当前走子方，由步数奇偶决定
    pub fn current_turn(&self) -> Color {
        if self.moves.len() % 2 == 0 {
            self.first_player
        } else {
            self.first_player.opponent()
        }
    }

    /// 最后一步
    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.moves.last()
    }

    /// 返回落子后的新状态，原状态不变
    pub fn with_move(&self, mv: AppliedMove) -> Self {
        let mut next = self.clone();
        next.board.place(mv.position(), mv.color);
        next.moves.push(mv);
        next
    }

    /// 根据最后一步判断终局：先查连线，再查平局
    pub fn outcome(&self, win_length: u8) -> Option<Outcome> {
        let last = self.last_move()?;
        if self.board.connects(last.position(), win_length) {
            return Some(Outcome::Win(last.color));
        }
        if self.board.is_full() {
            return Some(Outcome::Draw);
        }
        None
    }
}

impl Default for ConnectFourState {
    fn default() -> Self {
        Self::new(&BoardConfig::default(), Color::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_piece(board: &mut Board, column: u8, color: Color) -> Position {
        let row = board.landing_row(column).unwrap();
        let pos = Position::new(column, row);
        board.place(pos, color);
        pos
    }

    #[test]
    fn test_landing_row_and_column_full() {
        let mut board = Board::default();
        assert_eq!(board.landing_row(3), Some(5));

        for _ in 0..6 {
            drop_piece(&mut board, 3, Color::Red);
        }
        assert_eq!(board.height(3), 6);
        assert!(board.is_column_full(3));
        assert_eq!(board.landing_row(3), None);
        assert_eq!(board.landing_row(7), None);
    }

    #[test]
    fn test_resolve_target_gravity() {
        let mut board = Board::default();
        drop_piece(&mut board, 1, Color::Red);

        assert_eq!(board.resolve_target(1, None, true), Ok(Position::new(1, 4)));
        assert_eq!(board.resolve_target(1, Some(4), true), Ok(Position::new(1, 4)));
        assert_eq!(
            board.resolve_target(1, Some(5), true),
            Err(GameError::BoardPositionNotEmpty { column: 1, row: 5 })
        );
        assert_eq!(
            board.resolve_target(1, Some(2), true),
            Err(GameError::InvalidPosition { column: 1, row: Some(2) })
        );
        assert_eq!(
            board.resolve_target(7, None, true),
            Err(GameError::InvalidPosition { column: 7, row: None })
        );
        assert_eq!(
            board.resolve_target(0, Some(6), true),
            Err(GameError::InvalidPosition { column: 0, row: Some(6) })
        );
    }

    #[test]
    fn test_resolve_target_full_column() {
        let mut board = Board::default();
        for _ in 0..6 {
            drop_piece(&mut board, 0, Color::Yellow);
        }
        assert_eq!(
            board.resolve_target(0, None, true),
            Err(GameError::ColumnFull { column: 0 })
        );
    }

    #[test]
    fn test_resolve_target_without_gravity() {
        let mut board = Board::default();
        board.place(Position::new(2, 0), Color::Red);

        assert_eq!(board.resolve_target(3, Some(0), false), Ok(Position::new(3, 0)));
        assert_eq!(
            board.resolve_target(2, Some(0), false),
            Err(GameError::BoardPositionNotEmpty { column: 2, row: 0 })
        );
        assert_eq!(
            board.resolve_target(2, None, false),
            Err(GameError::InvalidPosition { column: 2, row: None })
        );
    }

    #[test]
    fn test_line_through_each_direction() {
        // 横向
        let mut board = Board::default();
        for column in 0..4 {
            board.place(Position::new(column, 5), Color::Red);
        }
        assert!(board.connects(Position::new(2, 5), 4));

        // 竖向
        let mut board = Board::default();
        for row in 2..6 {
            board.place(Position::new(6, row), Color::Yellow);
        }
        assert!(board.connects(Position::new(6, 2), 4));

        // 右上斜
        let mut board = Board::default();
        for i in 0..4 {
            board.place(Position::new(i, 5 - i), Color::Red);
        }
        let line = board.line_through(Position::new(3, 2), 4).unwrap();
        assert_eq!(line.first(), Some(&Position::new(0, 5)));
        assert_eq!(line.last(), Some(&Position::new(3, 2)));

        // 右下斜
        let mut board = Board::default();
        for i in 0..4 {
            board.place(Position::new(2 + i, 1 + i), Color::Yellow);
        }
        assert!(board.connects(Position::new(2, 1), 4));
    }

    #[test]
    fn test_three_is_not_a_line() {
        let mut board = Board::default();
        for column in 0..3 {
            board.place(Position::new(column, 5), Color::Red);
        }
        board.place(Position::new(3, 5), Color::Yellow);
        assert!(!board.connects(Position::new(2, 5), 4));
        assert!(!board.connects(Position::new(3, 5), 4));
    }

    #[test]
    fn test_state_turn_and_outcome() {
        let config = BoardConfig::default();
        let mut state = ConnectFourState::new(&config, Color::Yellow);
        assert_eq!(state.current_turn(), Color::Yellow);

        state = state.with_move(AppliedMove::new(0, 5, Color::Yellow));
        assert_eq!(state.current_turn(), Color::Red);
        assert_eq!(state.outcome(config.win_length), None);
        assert_eq!(state.board.get(Position::new(0, 5)), Some(Color::Yellow));
    }

    #[test]
    fn test_with_move_leaves_previous_state() {
        let state = ConnectFourState::default();
        let next = state.with_move(AppliedMove::new(3, 5, Color::Red));
        assert!(state.moves.is_empty());
        assert_eq!(state.board.piece_count(), 0);
        assert_eq!(next.moves.len(), 1);
    }

    #[test]
    fn test_config_validate() {
        assert!(BoardConfig::default().validate().is_ok());

        let bad = BoardConfig { win_length: 8, ..BoardConfig::default() };
        assert!(bad.validate().is_err());

        let bad = BoardConfig { win_length: 1, ..BoardConfig::default() };
        assert!(bad.validate().is_err());

        let bad = BoardConfig { rows: 0, ..BoardConfig::default() };
        assert!(bad.validate().is_err());
    }
}
