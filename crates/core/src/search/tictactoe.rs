use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{AiError, Result};

/// A player's mark. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// A move, as `(row, col)` with both in `0..3`.
pub type Action = (usize, usize);

const LINES: [[Action; 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// A 3×3 Tic-Tac-Toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [[Option<Mark>; 3]; 3],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// The mark in a cell; `None` for an empty cell or one off the board.
    pub fn get(&self, (row, col): Action) -> Option<Mark> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    fn count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| **c == Some(mark))
            .count()
    }

    /// The player who moves next: O once X has more marks on the board.
    pub fn player(&self) -> Mark {
        if self.count(Mark::X) > self.count(Mark::O) {
            Mark::O
        } else {
            Mark::X
        }
    }

    /// Every empty cell, in row-major order.
    pub fn actions(&self) -> Vec<Action> {
        (0..3)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .filter(|&a| self.get(a).is_none())
            .collect()
    }

    /// The board after the current player marks `action`.
    ///
    /// # Errors
    /// Returns [`AiError::InvalidMove`] if the cell is off the board or taken.
    pub fn result(&self, (row, col): Action) -> Result<Board> {
        if row >= 3 || col >= 3 {
            return Err(AiError::InvalidMove {
                row,
                col,
                reason: "off the board".to_string(),
            });
        }
        if let Some(mark) = self.cells[row][col] {
            return Err(AiError::InvalidMove {
                row,
                col,
                reason: format!("already taken by {}", mark),
            });
        }
        let mut next = *self;
        next.cells[row][col] = Some(self.player());
        Ok(next)
    }

    /// The mark occupying a full row, column, or diagonal, if any.
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.get(a)?;
            (self.get(b) == Some(mark) && self.get(c) == Some(mark)).then_some(mark)
        })
    }

    /// Whether the game is over.
    pub fn terminal(&self) -> bool {
        self.winner().is_some() || self.cells.iter().flatten().all(Option::is_some)
    }

    /// 1 if X has won, -1 if O has won, 0 otherwise.
    pub fn utility(&self) -> i32 {
        match self.winner() {
            Some(Mark::X) => 1,
            Some(Mark::O) => -1,
            None => 0,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                match cell {
                    Some(mark) => write!(f, "{}", mark)?,
                    None => write!(f, ".")?,
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = AiError;

    /// Parse three rows of `X`, `O` and `.` (or `_`). Rows are separated by
    /// newlines or `/`; whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let rows: Vec<Vec<char>> = s
            .split(|ch: char| ch == '\n' || ch == '/')
            .map(|r| r.chars().filter(|ch| !ch.is_whitespace()).collect::<Vec<_>>())
            .filter(|r| !r.is_empty())
            .collect();

        if rows.len() != 3 || rows.iter().any(|r| r.len() != 3) {
            return Err(AiError::Malformed(format!(
                "board must be 3 rows of 3 cells, got '{}'",
                s
            )));
        }

        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, &ch) in row.iter().enumerate() {
                board.cells[r][c] = match ch.to_ascii_uppercase() {
                    'X' => Some(Mark::X),
                    'O' => Some(Mark::O),
                    '.' | '_' => None,
                    other => {
                        return Err(AiError::Malformed(format!(
                            "unexpected board cell '{}'",
                            other
                        )))
                    }
                };
            }
        }

        let (x, o) = (board.count(Mark::X), board.count(Mark::O));
        if x != o && x != o + 1 {
            return Err(AiError::Malformed(format!(
                "{} X marks and {} O marks cannot arise in play",
                x, o
            )));
        }
        Ok(board)
    }
}

/// The optimal move for the player to move, or `None` if the game is over.
///
/// X maximizes [`Board::utility`] and O minimizes it. Actions are explored
/// in row-major order and a branch stops as soon as it finds a forced win,
/// so ties go to the earliest cell.
pub fn minimax(board: &Board) -> Option<Action> {
    if board.terminal() {
        return None;
    }
    best_move(board).map(|(action, _)| action)
}

/// Game value of `board` under optimal play by both sides.
pub fn value(board: &Board) -> i32 {
    if board.terminal() {
        board.utility()
    } else {
        best_move(board).map_or(0, |(_, v)| v)
    }
}

fn best_move(board: &Board) -> Option<(Action, i32)> {
    let maximizing = board.player() == Mark::X;
    let goal = if maximizing { 1 } else { -1 };
    let mut best: Option<(Action, i32)> = None;

    for action in board.actions() {
        let Ok(next) = board.result(action) else {
            continue;
        };
        let v = value(&next);
        let better = match best {
            None => true,
            Some((_, b)) if maximizing => v > b,
            Some((_, b)) => v < b,
        };
        if better {
            best = Some((action, v));
        }
        if v == goal {
            break;
        }
    }
    best
}

/// Play both sides optimally from `board` until the game ends, returning
/// every position reached (including the starting one).
pub fn self_play(board: &Board) -> Vec<Board> {
    let mut history = vec![*board];
    let mut current = *board;
    while let Some(action) = minimax(&current) {
        match current.result(action) {
            Ok(next) => {
                current = next;
                history.push(current);
            }
            Err(_) => break,
        }
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_initial_state() {
        let b = Board::new();
        assert_eq!(b.player(), Mark::X);
        assert_eq!(b.actions().len(), 9);
        assert!(!b.terminal());
        assert_eq!(b.winner(), None);
    }

    #[test]
    fn test_player_alternates() {
        let b = Board::new().result((1, 1)).unwrap();
        assert_eq!(b.player(), Mark::O);
        assert_eq!(b.get((1, 1)), Some(Mark::X));
        let b = b.result((0, 0)).unwrap();
        assert_eq!(b.player(), Mark::X);
        assert_eq!(b.get((0, 0)), Some(Mark::O));
        assert_eq!(Mark::O.opponent(), Mark::X);
    }

    #[test]
    fn test_result_rejects_taken_and_off_board() {
        let b = Board::new().result((0, 0)).unwrap();
        assert!(matches!(b.result((0, 0)), Err(AiError::InvalidMove { .. })));
        assert!(matches!(b.result((3, 0)), Err(AiError::InvalidMove { .. })));
        // The original board is untouched.
        assert_eq!(b.get((0, 1)), None);
    }

    #[test]
    fn test_get_off_board_is_empty() {
        let b = board("XXX/OO./...");
        assert_eq!(b.get((0, 2)), Some(Mark::X));
        assert_eq!(b.get((3, 0)), None);
        assert_eq!(b.get((0, 3)), None);
    }

    #[test]
    fn test_winner_lines() {
        assert_eq!(board("XXX/OO./...").winner(), Some(Mark::X));
        assert_eq!(board("XO./XO./X..").winner(), Some(Mark::X));
        assert_eq!(board("OXX/XO./..O").winner(), Some(Mark::O));
        assert_eq!(board("XXO/XO./O..").winner(), Some(Mark::O));
        assert_eq!(board("XOX/XOO/OXX").winner(), None);
    }

    #[test]
    fn test_terminal_and_utility() {
        let draw = board("XOX/XOO/OXX");
        assert!(draw.terminal());
        assert_eq!(draw.utility(), 0);
        assert_eq!(minimax(&draw), None);

        let x_wins = board("XXX/OO./...");
        assert!(x_wins.terminal());
        assert_eq!(x_wins.utility(), 1);
        assert_eq!(board("OOO/XX./X..").utility(), -1);
    }

    #[test]
    fn test_minimax_takes_immediate_win() {
        // X to move, can win at (0, 2).
        assert_eq!(minimax(&board("XX./OO./...")), Some((0, 2)));
    }

    #[test]
    fn test_minimax_blocks_opponent() {
        // O to move; X threatens (0, 2).
        let b = board("XX./.O./...");
        assert_eq!(b.player(), Mark::O);
        assert_eq!(minimax(&b), Some((0, 2)));
    }

    #[test]
    fn test_empty_board_is_a_draw() {
        assert_eq!(value(&Board::new()), 0);
    }

    #[test]
    fn test_self_play_ends_in_draw() {
        let history = self_play(&Board::new());
        let last = history.last().unwrap();
        assert!(last.terminal());
        assert_eq!(last.utility(), 0);
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn test_display_roundtrip() {
        let b = board("X.O/.X./O..");
        assert_eq!(b.to_string(), "X.O\n.X.\nO..");
        assert_eq!(b.to_string().parse::<Board>().unwrap(), b);
    }

    #[test]
    fn test_parse_rejects_bad_boards() {
        assert!("XX/OO/..".parse::<Board>().is_err());
        assert!("XXX/XXX/...".parse::<Board>().is_err());
        assert!("XQ./.../...".parse::<Board>().is_err());
    }
}
