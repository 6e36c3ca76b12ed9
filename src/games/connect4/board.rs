use std::fmt;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Player,
    Opponent,
}

// Owner of a chip. The human is always `Player` and moves first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn cell(self) -> Cell {
        match self {
            Side::Player => Cell::Player,
            Side::Opponent => Cell::Opponent,
        }
    }
}

impl Cell {
    fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Player => Some(Side::Player),
            Cell::Opponent => Some(Side::Opponent),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Player => 'X',
            Cell::Opponent => 'O',
        }
    }
}

// Row 0 is the top of the grid, row 5 the bottom. Chips stack from the bottom
// so a non-empty cell never sits above an empty one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    // Drop `chip` into `column` on a copy of the board. Returns the new board
    // and the row the chip landed on, or `None` when the column is full or
    // does not exist. `self` is left untouched.
    pub fn drop_chip(&self, column: usize, chip: Side) -> Option<(Board, usize)> {
        if column >= COLS {
            return None;
        }

        let row = (0..ROWS).rev().find(|&row| self.cells[row][column] == Cell::Empty)?;
        let mut board = *self;
        board.cells[row][column] = chip.cell();
        Some((board, row))
    }

    pub fn column_is_open(&self, column: usize) -> bool {
        column < COLS && self.cells[0][column] == Cell::Empty
    }

    // Columns that can still take a chip, in ascending order
    pub fn legal_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| self.column_is_open(col)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.legal_columns().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|&cell| cell == Cell::Empty)
    }

    // Find a run of four identical chips. Runs are scanned horizontally, then
    // vertically, then along `\` diagonals and finally `/` diagonals; the
    // first run found wins.
    pub fn check_winner(&self) -> Option<Side> {
        let c = &self.cells;

        for row in 0..ROWS {
            for col in 0..COLS - 3 {
                if let Some(side) = four_of_a_kind([c[row][col], c[row][col + 1], c[row][col + 2], c[row][col + 3]]) {
                    return Some(side);
                }
            }
        }

        for row in 0..ROWS - 3 {
            for col in 0..COLS {
                if let Some(side) = four_of_a_kind([c[row][col], c[row + 1][col], c[row + 2][col], c[row + 3][col]]) {
                    return Some(side);
                }
            }
        }

        for row in 0..ROWS - 3 {
            for col in 0..COLS - 3 {
                if let Some(side) = four_of_a_kind([c[row][col], c[row + 1][col + 1], c[row + 2][col + 2], c[row + 3][col + 3]]) {
                    return Some(side);
                }
            }
        }

        for row in 3..ROWS {
            for col in 0..COLS - 3 {
                if let Some(side) = four_of_a_kind([c[row][col], c[row - 1][col + 1], c[row - 2][col + 2], c[row - 3][col + 3]]) {
                    return Some(side);
                }
            }
        }

        None
    }

    pub fn check_gravity(&self) -> Result<()> {
        for col in 0..COLS {
            for row in 0..ROWS - 1 {
                if self.cells[row][col] != Cell::Empty && self.cells[row + 1][col] == Cell::Empty {
                    bail!("Chip at row {} column {} floats over an empty cell", row, col);
                }
            }
        }

        Ok(())
    }
}

fn four_of_a_kind(run: [Cell; 4]) -> Option<Side> {
    if run.iter().all(|&cell| cell == run[0]) {
        run[0].side()
    } else {
        None
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = anyhow::Error;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self> {
        if rows.len() != ROWS {
            return Err(anyhow!("Board has {} rows, expected {}", rows.len(), ROWS));
        }

        let mut board = Board::new();
        for (i, row) in rows.into_iter().enumerate() {
            board.cells[i] = row
                .try_into()
                .map_err(|row: Vec<Cell>| anyhow!("Row {} has {} cells, expected {}", i, row.len(), COLS))?;
        }

        Ok(board)
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board.cells.iter().map(|row| row.to_vec()).collect()
    }
}

// Text rendering for renderers: one line per row, top row first, followed by a
// 1-based column legend matching what the player types.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row.iter().map(|cell| cell.glyph().to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }

        let legend: Vec<String> = (1..=COLS).map(|col| col.to_string()).collect();
        write!(f, "{}", legend.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drop_all(board: Board, moves: &[(usize, Side)]) -> Board {
        moves.iter().fold(board, |board, &(col, side)| board.drop_chip(col, side).unwrap().0)
    }

    #[test]
    fn test_drop_lands_on_bottom_then_stacks() {
        let board = Board::new();
        let (board, row) = board.drop_chip(3, Side::Player).unwrap();
        assert_eq!(row, 5);
        assert_eq!(board.get(5, 3), Cell::Player);

        let (board, row) = board.drop_chip(3, Side::Opponent).unwrap();
        assert_eq!(row, 4);
        assert_eq!(board.get(4, 3), Cell::Opponent);
    }

    #[test]
    fn test_drop_does_not_mutate_input() {
        let before = Board::new();
        let (after, _) = before.drop_chip(0, Side::Player).unwrap();
        assert_eq!(before, Board::new());
        assert_ne!(before, after);
    }

    #[test]
    fn test_full_column_rejected() {
        let board = drop_all(Board::new(), &[(0, Side::Player); ROWS]);
        assert!(!board.column_is_open(0));
        assert_eq!(board.drop_chip(0, Side::Opponent), None);
        assert_eq!(board.legal_columns(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        assert_eq!(Board::new().drop_chip(COLS, Side::Player), None);
        assert!(!Board::new().column_is_open(COLS));
    }

    #[test]
    fn test_gravity_holds_after_drops() {
        let mut board = Board::new();
        for i in 0..30 {
            let side = if i % 2 == 0 { Side::Player } else { Side::Opponent };
            if let Some((next, _)) = board.drop_chip((i * 5) % COLS, side) {
                board = next;
            }
            assert!(board.check_gravity().is_ok());
        }
    }

    #[test]
    fn test_gravity_violation_detected() {
        let mut rows: Vec<Vec<Cell>> = Board::new().into();
        rows[2][4] = Cell::Player;
        let board = Board::try_from(rows).unwrap();
        assert!(board.check_gravity().is_err());
    }

    #[test]
    fn test_horizontal_win() {
        let board = drop_all(Board::new(), &[(1, Side::Opponent), (2, Side::Opponent), (3, Side::Opponent), (4, Side::Opponent)]);
        assert_eq!(board.check_winner(), Some(Side::Opponent));
    }

    #[test]
    fn test_vertical_win() {
        let board = drop_all(Board::new(), &[(6, Side::Player); 4]);
        assert_eq!(board.check_winner(), Some(Side::Player));
    }

    #[test]
    fn test_diagonal_wins() {
        // `/` rising to the right from (5, 0)
        let board = drop_all(
            Board::new(),
            &[
                (0, Side::Player),
                (1, Side::Opponent), (1, Side::Player),
                (2, Side::Opponent), (2, Side::Opponent), (2, Side::Player),
                (3, Side::Opponent), (3, Side::Opponent), (3, Side::Opponent), (3, Side::Player),
            ],
        );
        assert_eq!(board.check_winner(), Some(Side::Player));

        // `\` falling to the right, ending at (5, 6)
        let board = drop_all(
            Board::new(),
            &[
                (6, Side::Opponent),
                (5, Side::Player), (5, Side::Opponent),
                (4, Side::Player), (4, Side::Player), (4, Side::Opponent),
                (3, Side::Player), (3, Side::Player), (3, Side::Player), (3, Side::Opponent),
            ],
        );
        assert_eq!(board.check_winner(), Some(Side::Opponent));
    }

    #[test]
    fn test_three_in_a_row_is_not_a_win() {
        let board = drop_all(
            Board::new(),
            &[(0, Side::Player), (1, Side::Player), (2, Side::Player), (4, Side::Player), (6, Side::Opponent), (6, Side::Opponent), (6, Side::Opponent)],
        );
        assert_eq!(board.check_winner(), None);
        assert_eq!(Board::new().check_winner(), None);
    }

    fn board_with(runs: &[(Cell, [(usize, usize); 4])]) -> Board {
        let mut rows: Vec<Vec<Cell>> = Board::new().into();
        for (cell, run) in runs {
            for &(row, col) in run {
                rows[row][col] = *cell;
            }
        }
        Board::try_from(rows).unwrap()
    }

    #[test]
    fn test_scan_order_prefers_horizontal() {
        let board = board_with(&[
            (Cell::Opponent, [(5, 0), (5, 1), (5, 2), (5, 3)]),
            (Cell::Player, [(1, 6), (2, 6), (3, 6), (4, 6)]),
        ]);
        assert_eq!(board.check_winner(), Some(Side::Opponent));

        let board = board_with(&[
            (Cell::Player, [(5, 0), (5, 1), (5, 2), (5, 3)]),
            (Cell::Opponent, [(1, 6), (2, 6), (3, 6), (4, 6)]),
        ]);
        assert_eq!(board.check_winner(), Some(Side::Player));
    }

    #[test]
    fn test_scan_order_vertical_before_diagonals() {
        let board = board_with(&[
            (Cell::Player, [(2, 0), (3, 0), (4, 0), (5, 0)]),
            (Cell::Opponent, [(2, 3), (3, 4), (4, 5), (5, 6)]),
        ]);
        assert_eq!(board.check_winner(), Some(Side::Player));

        let board = board_with(&[
            (Cell::Player, [(2, 0), (3, 0), (4, 0), (5, 0)]),
            (Cell::Opponent, [(5, 3), (4, 4), (3, 5), (2, 6)]),
        ]);
        assert_eq!(board.check_winner(), Some(Side::Player));
    }

    #[test]
    fn test_scan_order_falling_diagonal_before_rising() {
        let board = board_with(&[
            (Cell::Opponent, [(0, 0), (1, 1), (2, 2), (3, 3)]),
            (Cell::Player, [(5, 3), (4, 4), (3, 5), (2, 6)]),
        ]);
        assert_eq!(board.check_winner(), Some(Side::Opponent));
    }

    #[test]
    fn test_shape_validated_on_conversion() {
        let mut rows: Vec<Vec<Cell>> = Board::new().into();
        rows[3].pop();
        assert!(Board::try_from(rows).is_err());

        let rows = vec![vec![Cell::Empty; COLS]; ROWS + 1];
        assert!(Board::try_from(rows).is_err());
    }

    #[test]
    fn test_render() {
        let board = drop_all(Board::new(), &[(0, Side::Player), (0, Side::Opponent), (6, Side::Player)]);
        let expected = [
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            ". . . . . . .",
            "O . . . . . .",
            "X . . . . . X",
            "1 2 3 4 5 6 7",
        ]
        .join("\n");
        assert_eq!(board.to_string(), expected);
    }
}
