// Adversarial search
// Tic-Tac-Toe with exhaustive minimax

pub mod tictactoe;

pub use tictactoe::{minimax, self_play, value, Action, Board, Mark};
