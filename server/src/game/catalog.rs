//! Static unit archetypes.

use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of spawnable unit types.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Miner,
    Sword,
    Archer,
    Spear,
}

/// How a ranged archetype's shots fly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Missile {
    pub speed: f64,
    pub pierce: bool,
    pub ttl_ms: f64,
}

/// Immutable stats of one unit type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitArchetype {
    pub cost: u32,
    pub pop_weight: u32,
    pub max_hp: i32,
    pub damage: i32,
    pub range: f64,
    pub speed: f64,
    pub attack_period_ms: f64,
    pub missile: Option<Missile>,
    /// Gold carried home per trip. Only gatherers have one.
    pub resource_yield: Option<u32>,
    /// Gold paid to whoever kills this unit.
    pub bounty: u32,
}

impl UnitKind {
    pub const ALL: [UnitKind; 4] = [
        UnitKind::Miner,
        UnitKind::Sword,
        UnitKind::Archer,
        UnitKind::Spear,
    ];

    pub fn archetype(self) -> UnitArchetype {
        match self {
            UnitKind::Miner => UnitArchetype {
                cost: 50,
                pop_weight: 1,
                max_hp: 45,
                damage: 0,
                range: 0.0,
                speed: 55.0,
                attack_period_ms: 0.0,
                missile: None,
                resource_yield: Some(10),
                bounty: 10,
            },
            UnitKind::Sword => UnitArchetype {
                cost: 120,
                pop_weight: 1,
                max_hp: 95,
                damage: 12,
                range: 22.0,
                speed: 75.0,
                attack_period_ms: 650.0,
                missile: None,
                resource_yield: None,
                bounty: 30,
            },
            UnitKind::Archer => UnitArchetype {
                cost: 170,
                pop_weight: 1,
                max_hp: 65,
                damage: 8,
                range: 140.0,
                speed: 65.0,
                attack_period_ms: 900.0,
                missile: Some(Missile {
                    speed: 220.0,
                    pierce: false,
                    ttl_ms: 1500.0,
                }),
                resource_yield: None,
                bounty: 40,
            },
            UnitKind::Spear => UnitArchetype {
                cost: 200,
                pop_weight: 2,
                max_hp: 80,
                damage: 10,
                range: 110.0,
                speed: 60.0,
                attack_period_ms: 1400.0,
                missile: Some(Missile {
                    speed: 260.0,
                    pierce: true,
                    ttl_ms: 1200.0,
                }),
                resource_yield: None,
                bounty: 50,
            },
        }
    }

    pub fn is_gatherer(self) -> bool {
        self.archetype().resource_yield.is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Miner => "miner",
            UnitKind::Sword => "sword",
            UnitKind::Archer => "archer",
            UnitKind::Spear => "spear",
        }
    }
}

impl FromStr for UnitKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        UnitKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GameError::UnknownUnit(wanted.to_string()))
    }
}
