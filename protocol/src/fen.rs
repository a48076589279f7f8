//! FEN 风格的棋盘记法
//!
//! 格式：`<棋盘> [走子方]`，棋盘从最上一行到底行，以 `/` 分隔，
//! 数字表示连续空格，`R`/`Y` 表示棋子，走子方为 `r` 或 `y`。
//!
//! 示例（标准 6x7 棋盘）：
//! `7/7/7/7/1YY4/1RR4 r`

use crate::board::{Board, ConnectFourState};
use crate::constants::MAX_BOARD_DIMENSION;
use crate::error::{ProtocolError, Result};
use crate::piece::{Color, Position};

/// 标准空棋盘 FEN
pub const EMPTY_FEN: &str = "7/7/7/7/7/7 r";

/// FEN 格式处理
pub struct Fen;

impl Fen {
    /// 解析 FEN 字符串，返回棋盘和走子方（未给出时为 None）
    ///
    /// `gravity` 为 true 时拒绝悬空的棋子。
    pub fn parse(fen: &str, gravity: bool) -> Result<(Board, Option<Color>)> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(ProtocolError::InvalidFen {
                reason: "Empty FEN string".to_string(),
            });
        }

        let board = Self::parse_board(parts[0], gravity)?;

        let turn = match parts.get(1) {
            Some(side) => {
                let c = side.chars().next().unwrap_or('r');
                Some(Color::from_fen_char(c).ok_or_else(|| ProtocolError::InvalidFen {
                    reason: format!("Invalid side to move: {}", side),
                })?)
            }
            None => None,
        };

        Ok((board, turn))
    }

    /// 解析棋盘部分
    pub fn parse_board(board_str: &str, gravity: bool) -> Result<Board> {
        let rows: Vec<Vec<Option<Color>>> = board_str
            .split('/')
            .enumerate()
            .map(|(row_idx, row)| Self::parse_row(row_idx, row))
            .collect::<Result<_>>()?;

        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if columns == 0 {
            return Err(ProtocolError::InvalidFen {
                reason: "Board has no columns".to_string(),
            });
        }
        if rows.len() > MAX_BOARD_DIMENSION as usize || columns > MAX_BOARD_DIMENSION as usize {
            return Err(ProtocolError::InvalidFen {
                reason: format!("Board {}x{} is too large", rows.len(), columns),
            });
        }
        if let Some((row_idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(ProtocolError::InvalidFen {
                reason: format!("Row {} has {} columns, expected {}", row_idx, row.len(), columns),
            });
        }

        let mut board = Board::with_size(rows.len() as u8, columns as u8);
        for (row_idx, row) in rows.iter().enumerate() {
            for (column, cell) in row.iter().enumerate() {
                if let Some(color) = cell {
                    board.place(Position::new(column as u8, row_idx as u8), *color);
                }
            }
        }

        if gravity {
            // 重力模式下每列的棋子必须从底行连续堆叠
            for column in 0..board.columns() {
                let top_empty = board.rows() - board.height(column);
                if (0..top_empty).any(|row| board.get(Position::new(column, row)).is_some()) {
                    return Err(ProtocolError::InvalidFen {
                        reason: format!("Floating piece in column {}", column),
                    });
                }
            }
        }

        Ok(board)
    }

    /// 解析一行
    fn parse_row(row_idx: usize, row: &str) -> Result<Vec<Option<Color>>> {
        let mut cells = Vec::new();
        let mut run = 0usize;

        for c in row.chars() {
            if let Some(digit) = c.to_digit(10) {
                run = run * 10 + digit as usize;
                if run > MAX_BOARD_DIMENSION as usize {
                    return Err(ProtocolError::InvalidFen {
                        reason: format!("Row {} has too many columns", row_idx),
                    });
                }
                continue;
            }
            cells.extend(std::iter::repeat(None).take(run));
            run = 0;

            match Color::from_fen_char(c) {
                Some(color) if c.is_ascii_uppercase() => cells.push(Some(color)),
                _ => {
                    return Err(ProtocolError::InvalidFen {
                        reason: format!("Invalid piece character: {}", c),
                    });
                }
            }
        }
        cells.extend(std::iter::repeat(None).take(run));

        Ok(cells)
    }

    /// 将对局状态转换为 FEN 字符串
    pub fn to_string(state: &ConnectFourState) -> String {
        format!(
            "{} {}",
            Self::board_to_string(&state.board),
            state.current_turn().to_fen_char().to_ascii_lowercase()
        )
    }

    /// 将棋盘转换为 FEN 棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut rows = Vec::with_capacity(board.rows() as usize);

        for y in 0..board.rows() {
            let mut row = String::new();
            let mut empty_count = 0;

            for x in 0..board.columns() {
                if let Some(color) = board.get(Position::new(x, y)) {
                    if empty_count > 0 {
                        row.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    row.push(color.to_fen_char());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                row.push_str(&empty_count.to_string());
            }

            rows.push(row);
        }

        rows.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardConfig;
    use crate::moves::AppliedMove;

    #[test]
    fn test_parse_empty_fen() {
        let (board, turn) = Fen::parse(EMPTY_FEN, true).unwrap();
        assert_eq!(board, Board::default());
        assert_eq!(turn, Some(Color::Red));
    }

    #[test]
    fn test_fen_roundtrip() {
        let fen = "7/7/7/7/1YY4/1RR4";
        let (board, turn) = Fen::parse(fen, true).unwrap();
        assert_eq!(turn, None);
        assert_eq!(board.get(Position::new(1, 4)), Some(Color::Yellow));
        assert_eq!(board.get(Position::new(2, 5)), Some(Color::Red));
        assert_eq!(board.piece_count(), 4);
        assert_eq!(Fen::board_to_string(&board), fen);
    }

    #[test]
    fn test_state_to_string() {
        let state = ConnectFourState::new(&BoardConfig::default(), Color::Red)
            .with_move(AppliedMove::new(3, 5, Color::Red));
        assert_eq!(Fen::to_string(&state), "7/7/7/7/7/3R3 y");
    }

    #[test]
    fn test_parse_custom_size() {
        let (board, _) = Fen::parse("10/10/10/10/10/10/10/10/R9", true).unwrap();
        assert_eq!(board.rows(), 9);
        assert_eq!(board.columns(), 10);
        assert_eq!(board.get(Position::new(0, 8)), Some(Color::Red));
    }

    #[test]
    fn test_invalid_fen() {
        // 空字符串
        assert!(Fen::parse("", true).is_err());

        // 行宽不一致
        assert!(Fen::parse("7/6/7/7/7/7", true).is_err());

        // 无效字符
        assert!(Fen::parse("7/7/7/7/7/3X3", true).is_err());

        // 无效走子方
        assert!(Fen::parse("7/7/7/7/7/7 b", true).is_err());

        // 悬空棋子
        assert!(Fen::parse("7/7/7/7/R6/7", true).is_err());
        assert!(Fen::parse("7/7/7/7/R6/7", false).is_ok());
    }
}
