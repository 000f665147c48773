//! Validation errors reported back to the requesting client.

use thiserror::Error;

/// Everything a client can be told "no" about. The `Display` text is sent
/// verbatim as `error{msg}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("match ended")]
    MatchEnded,

    #[error("unknown unit type: {0}")]
    UnknownUnit(String),

    #[error("not enough gold: need {need}, have {have}")]
    NotEnoughGold { need: u32, have: u32 },

    #[error("population cap reached ({cap})")]
    PopulationCap { cap: u32 },

    #[error("room not found")]
    RoomNotFound,

    #[error("room full")]
    RoomFull,
}
