use crate::error::GameError;
use crate::game::{
    catalog::UnitKind,
    combat, economy,
    types::*,
};

/// Units appear this far in front of their own base.
pub const SPAWN_OFFSET: f64 = 35.0;

pub const LANE_MIN: f64 = 0.0;
pub const LANE_MAX: f64 = 1000.0;
pub const LANE_MARGIN: f64 = 20.0;
pub const BASE_X: PerSide<f64> = PerSide { a: 80.0, b: 920.0 };
pub const BASE_HP: i32 = 650;
pub const START_GOLD: u32 = 250;
pub const POP_CAP: u32 = 30;
pub const NODE_XS: [f64; 4] = [220.0, 340.0, 660.0, 780.0];

impl MatchState {
    /// A fresh match. Deterministic: two calls compare equal.
    pub fn new() -> Self {
        let base = |x| Base {
            x,
            hp: BASE_HP,
            max_hp: BASE_HP,
        };
        MatchState {
            lane: Lane {
                min: LANE_MIN,
                max: LANE_MAX,
                margin: LANE_MARGIN,
            },
            bases: PerSide {
                a: base(BASE_X.a),
                b: base(BASE_X.b),
            },
            gold: PerSide::splat(START_GOLD),
            pop: PerSide::splat(0),
            pop_cap: PerSide::splat(POP_CAP),
            stance: PerSide::splat(Stance::Defend),
            units: Vec::new(),
            projectiles: Vec::new(),
            nodes: NODE_XS
                .iter()
                .zip(1..)
                .map(|(&x, id)| ResourceNode { id, x })
                .collect(),
            income_ms: PerSide::splat(0.0),
            tick: 0,
            phase: MatchPhase::Active,
            next_id: 1,
        }
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate and perform a spawn for `side`. Checks run in a fixed order and
/// the first failure is returned; nothing is debited unless all pass.
pub fn spawn_unit(state: &mut MatchState, side: Side, unit_type: &str) -> Result<UnitId, GameError> {
    if state.is_ended() {
        return Err(GameError::MatchEnded);
    }
    let kind: UnitKind = unit_type.parse()?;
    let arch = kind.archetype();

    let have = state.gold[side];
    if have < arch.cost {
        return Err(GameError::NotEnoughGold {
            need: arch.cost,
            have,
        });
    }
    let cap = state.pop_cap[side];
    if state.pop[side] + arch.pop_weight > cap {
        return Err(GameError::PopulationCap { cap });
    }

    state.gold[side] -= arch.cost;
    state.pop[side] += arch.pop_weight;

    let x = state.home_x(side);
    let role = if kind.is_gatherer() {
        // Pick a node now so the first tick already walks somewhere.
        UnitRole::Gatherer(GatherJob {
            phase: GatherPhase::ToResource,
            node: economy::nearest_node(&state.nodes, &state.lane, side, x),
            carried: 0,
        })
    } else {
        UnitRole::Fighter { cooldown_ms: 0.0 }
    };

    let id = state.alloc_id();
    state.units.push(Unit {
        id,
        side,
        kind,
        x,
        hp: arch.max_hp,
        role,
    });
    Ok(id)
}

pub fn set_stance(state: &mut MatchState, side: Side, stance: Stance) {
    state.stance[side] = stance;
}

/// Advance the match by `dt_ms` of wall-clock time. A no-op once ended.
pub fn step(state: &mut MatchState, dt_ms: f64) {
    if state.is_ended() {
        return;
    }
    state.tick += 1;

    economy::accrue_income(state, dt_ms);
    economy::advance_gatherers(state, dt_ms);
    combat::advance_fighters(state, dt_ms);
    combat::advance_projectiles(state, dt_ms);
    combat::remove_dead(state);

    let a_down = state.bases.a.hp <= 0;
    let b_down = state.bases.b.hp <= 0;
    let winner = match (a_down, b_down) {
        (false, false) => return,
        (true, false) => Some(Side::B),
        (false, true) => Some(Side::A),
        (true, true) => None,
    };
    state.phase = MatchPhase::Ended { winner };
}
