use crate::game::catalog::UnitKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

pub type UnitId = u64;
pub type NodeId = u32;

/// One of the two match participants. A starts on the left.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Forward direction along the lane: A walks towards +x, B towards −x.
    pub fn dir(self) -> f64 {
        match self {
            Side::A => 1.0,
            Side::B => -1.0,
        }
    }
}

/// A value held once per side, serialised as `{"A": .., "B": ..}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct PerSide<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
}

impl<T: Clone> PerSide<T> {
    pub fn splat(value: T) -> Self {
        PerSide {
            a: value.clone(),
            b: value,
        }
    }
}

impl<T> Index<Side> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }
}

impl<T> IndexMut<Side> for PerSide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

/// Per-side stance toggle. Only affects units with nothing in range.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[default]
    Defend,
    Attack,
}

impl Stance {
    /// Unrecognised values fall back to `Defend`.
    pub fn parse(value: &str) -> Stance {
        let v = value.trim();
        if v.eq_ignore_ascii_case("attack") || v.eq_ignore_ascii_case("aggressive") {
            Stance::Attack
        } else {
            Stance::Defend
        }
    }
}

/// The 1-D battlefield.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Lane {
    pub min: f64,
    pub max: f64,
    /// Units never stand closer than this to either lane edge.
    pub margin: f64,
}

impl Lane {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn clamp_interior(&self, x: f64) -> f64 {
        x.clamp(self.min + self.margin, self.max - self.margin)
    }

    /// Whether `x` lies on `side`'s half. The midpoint belongs to both.
    pub fn on_half(&self, side: Side, x: f64) -> bool {
        match side {
            Side::A => x <= self.midpoint(),
            Side::B => x >= self.midpoint(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    pub x: f64,
    pub hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ResourceNode {
    pub id: NodeId,
    pub x: f64,
}

/// Sub-state of a gatherer's trip between a node and home.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GatherPhase {
    ToResource,
    #[serde(rename_all = "camelCase")]
    Gathering {
        elapsed_ms: f64,
    },
    ToBase,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GatherJob {
    pub phase: GatherPhase,
    pub node: Option<NodeId>,
    pub carried: u32,
}

/// What a unit does each tick. Fighters never carry resources and gatherers
/// never attack.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnitRole {
    #[serde(rename_all = "camelCase")]
    Fighter { cooldown_ms: f64 },
    Gatherer(GatherJob),
}

/// One unit on the lane.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub side: Side,
    pub kind: UnitKind,
    pub x: f64,
    /// Current hit points; the unit is dead at zero or below.
    pub hp: i32,
    pub role: UnitRole,
}

impl Unit {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn gather_job(&self) -> Option<&GatherJob> {
        match &self.role {
            UnitRole::Gatherer(job) => Some(job),
            UnitRole::Fighter { .. } => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: UnitId,
    pub side: Side,
    pub x: f64,
    pub vx: f64,
    pub damage: i32,
    #[serde(default)]
    pub pierce: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<f64>,
    /// Units a piercing projectile has already hit.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub struck: BTreeSet<UnitId>,
}

/// Match life-cycle. `Ended` is terminal until a reset.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum MatchPhase {
    #[default]
    Active,
    /// `winner` is `None` when both bases fell in the same tick.
    Ended { winner: Option<Side> },
}

/// Full state of one match. Serialised as-is into every `state` message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub lane: Lane,
    pub bases: PerSide<Base>,
    pub gold: PerSide<u32>,
    pub pop: PerSide<u32>,
    pub pop_cap: PerSide<u32>,
    pub stance: PerSide<Stance>,
    pub units: Vec<Unit>,
    pub projectiles: Vec<Projectile>,
    pub nodes: Vec<ResourceNode>,
    /// Milliseconds accrued towards the next passive-income payout.
    pub income_ms: PerSide<f64>,
    pub tick: u64,
    pub phase: MatchPhase,
    pub(crate) next_id: u64,
}

impl MatchState {
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended { .. })
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            MatchPhase::Ended { winner } => winner,
            MatchPhase::Active => None,
        }
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Where `side`'s units appear and where its gatherers unload.
    pub fn home_x(&self, side: Side) -> f64 {
        self.bases[side].x + side.dir() * crate::game::logic::SPAWN_OFFSET
    }

    pub(crate) fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Move from `from` towards `to` by at most `max_step`, never overshooting.
pub fn step_toward(from: f64, to: f64, max_step: f64) -> f64 {
    let delta = to - from;
    if delta.abs() <= max_step {
        to
    } else {
        from + delta.signum() * max_step
    }
}
