use rand::{seq::IndexedRandom, Rng};
use serde::{Deserialize, Serialize};

use super::board::{Board, Side, COLS};

// Snapshot of one game between two requests. A new value is produced on every
// turn; nothing here is updated in place once handed back to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub winner: Option<Side>,
    pub is_draw: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    AwaitingFirstMove,
    AwaitingMove,
    Won(Side),
    Drawn,
}

// What happened to the input of a turn. None of these are errors: every variant
// comes back together with a valid state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Continue,
    InvalidInput,
    ColumnFull,
    GameAlreadyOver,
    Won(Side),
    Drawn,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_draw
    }

    pub fn phase(&self) -> Phase {
        match (self.winner, self.is_draw) {
            (Some(side), _) => Phase::Won(side),
            (None, true) => Phase::Drawn,
            (None, false) if self.board.is_empty() => Phase::AwaitingFirstMove,
            (None, false) => Phase::AwaitingMove,
        }
    }

    fn won(board: Board, side: Side) -> (Self, Outcome) {
        (Self { board, winner: Some(side), is_draw: false }, Outcome::Won(side))
    }

    fn drawn(board: Board) -> (Self, Outcome) {
        (Self { board, winner: None, is_draw: true }, Outcome::Drawn)
    }
}

impl Default for GameState {
    fn default() -> Self {
        new_game()
    }
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::Continue => "Enter your next move!",
            Outcome::InvalidInput => "Invalid input! Please enter a number between 1 and 7.",
            Outcome::ColumnFull => "That column is full! Pick another one.",
            Outcome::GameAlreadyOver => "The game is over. Start a new game to play again.",
            Outcome::Won(Side::Player) => "You win!",
            Outcome::Won(Side::Opponent) => "Bot wins!",
            Outcome::Drawn => "It's a draw!",
        }
    }
}

// Start a new game. Valid at any point, terminal or not.
pub fn new_game() -> GameState {
    GameState {
        board: Board::new(),
        winner: None,
        is_draw: false,
    }
}

// Pick one of the open columns uniformly at random. None means the board is
// full.
pub fn play_random<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<usize> {
    board.legal_columns().choose(rng).copied()
}

// Columns are typed 1-based. Leading whitespace is skipped and only the
// leading digits count, so "4abc" is column 4 and "3.5" column 3. Negative
// numbers and text without a leading number are rejected.
fn parse_column(input: &str) -> Option<usize> {
    let input = input.trim_start();
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() || negative {
        return None;
    }

    digits
        .parse::<usize>()
        .ok()
        .filter(|column| (1..=COLS).contains(column))
        .map(|column| column - 1)
}

// A snapshot coming from outside might already hold a finished board without
// saying so. Classify it before looking at the input.
fn settle(state: &GameState) -> Option<(GameState, Outcome)> {
    if let Some(side) = state.board.check_winner() {
        log::warn!("Snapshot was not marked as won, {:?} already has four in a row", side);
        return Some(GameState::won(state.board, side));
    }

    if state.board.is_full() {
        log::warn!("Snapshot was not marked as drawn but the board is full");
        return Some(GameState::drawn(state.board));
    }

    None
}

// Play one full turn: the human move from `input` and, if the game goes on,
// one random opponent move drawn from `rng`. `previous` of `None` starts a
// fresh game. Rejected input hands back the previous state untouched.
pub fn take_turn<R: Rng + ?Sized>(previous: Option<GameState>, input: &str, rng: &mut R) -> (GameState, Outcome) {
    let state = previous.unwrap_or_else(new_game);

    if state.is_terminal() {
        log::debug!("Ignoring input {:?}, game is already over", input);
        return (state, Outcome::GameAlreadyOver);
    }

    if let Some(settled) = settle(&state) {
        return settled;
    }

    let Some(column) = parse_column(input) else {
        log::debug!("Rejected input {:?}", input);
        return (state, Outcome::InvalidInput);
    };

    let Some((board, row)) = state.board.drop_chip(column, Side::Player) else {
        log::debug!("Column {} is full", column + 1);
        return (state, Outcome::ColumnFull);
    };
    log::debug!("Player chip landed at row {}, column {}", row, column);

    if let Some(side) = board.check_winner() {
        return GameState::won(board, side);
    }

    let Some(bot_column) = play_random(&board, rng) else {
        return GameState::drawn(board);
    };

    let Some((board, bot_row)) = board.drop_chip(bot_column, Side::Opponent) else {
        unreachable!("Open column {} rejected the opponent chip", bot_column);
    };
    log::debug!("Opponent chip landed at row {}, column {}", bot_row, bot_column);

    if let Some(side) = board.check_winner() {
        return GameState::won(board, side);
    }

    // With the human moving first the opponent always makes the last drop
    if board.is_full() {
        return GameState::drawn(board);
    }

    (GameState { board, winner: None, is_draw: false }, Outcome::Continue)
}
