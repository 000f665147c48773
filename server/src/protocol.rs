//! Wire-protocol shared by client, WS handler and rooms.

use crate::game::types::{MatchState, Side};
use serde::{Deserialize, Serialize};

// ---------- client → server ----------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Create,
    Join {
        #[serde(rename = "roomId", default)]
        room_id: String,
    },
    Spawn {
        #[serde(rename = "unitType", default)]
        unit_type: String,
    },
    /// Stance change; anything but "attack"/"aggressive" means defend.
    Mode {
        #[serde(default)]
        value: String,
    },
    Reset,
}

// ---------- server → client ----------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    Joined {
        #[serde(rename = "roomId")]
        room_id: String,
        role: Side,
    },
    /// Full snapshot, pushed every tick.
    State {
        #[serde(rename = "roomId")]
        room_id: String,
        state: MatchState,
    },
    Error {
        msg: String,
    },
    OpponentJoined {
        role: Side,
    },
    OpponentLeft {
        role: Side,
    },
    ResetOk,
}
