// JSON form of a game snapshot, as it travels with each request. The grid shape
// is checked while deserializing; the rest of the integrity checks run through
// `Validate` before a decoded state is handed to the turn logic.

use anyhow::{bail, Context, Result};

use crate::games::connect4::GameState;
use crate::games::Validate;

impl Validate for GameState {
    fn validate(&self) -> Result<()> {
        self.board.check_gravity()?;

        if self.winner.is_some() && self.is_draw {
            bail!("Snapshot claims both a winner and a draw");
        }

        if let Some(side) = self.winner {
            if self.board.check_winner() != Some(side) {
                bail!("Snapshot names {:?} as winner but the board does not agree", side);
            }
        }

        if self.is_draw && !self.board.is_full() {
            bail!("Snapshot is marked as drawn but the board still has open columns");
        }

        Ok(())
    }
}

pub fn encode(state: &GameState) -> Result<String> {
    serde_json::to_string(state).context("Failed to serialize game snapshot")
}

pub fn decode(raw: &str) -> Result<GameState> {
    let state: GameState = serde_json::from_str(raw).context("Failed to parse game snapshot")?;
    if let Err(err) = state.validate() {
        log::warn!("Rejected snapshot: {}", err);
        return Err(err);
    }

    Ok(state)
}
