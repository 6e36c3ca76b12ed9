// Connect Four against a random bot. The board module knows nothing about
// turns; the turn module advances one full turn per call and never holds state
// between calls.

mod board;
mod turn;

pub use board::{Board, Cell, Side, COLS, ROWS};
pub use turn::{new_game, play_random, take_turn, GameState, Outcome, Phase};
