//! Passive income and the gatherer trip cycle.

use crate::game::types::{
    step_toward, GatherJob, GatherPhase, Lane, MatchState, NodeId, ResourceNode, Side, UnitRole,
};

/// Passive income is paid in whole chunks of this many milliseconds.
pub const INCOME_INTERVAL_MS: f64 = 1000.0;
pub const PASSIVE_GOLD: u32 = 3;
/// An enemy this close sends a gatherer running home.
pub const THREAT_RADIUS: f64 = 90.0;
pub const GATHER_DWELL_MS: f64 = 2000.0;
pub const ARRIVE_EPSILON: f64 = 0.5;

/// Add `dt_ms` to each side's income timer and pay out every full interval.
pub fn accrue_income(state: &mut MatchState, dt_ms: f64) {
    let dt_ms = dt_ms.max(0.0);
    for side in Side::BOTH {
        let timer = &mut state.income_ms[side];
        *timer += dt_ms;
        while *timer >= INCOME_INTERVAL_MS {
            *timer -= INCOME_INTERVAL_MS;
            state.gold[side] = state.gold[side].saturating_add(PASSIVE_GOLD);
        }
    }
}

/// Nearest node to `x` on `side`'s half of the lane, or the nearest node
/// anywhere when that half has none.
pub fn nearest_node(nodes: &[ResourceNode], lane: &Lane, side: Side, x: f64) -> Option<NodeId> {
    let closest = |own_half_only: bool| {
        nodes
            .iter()
            .filter(|n| !own_half_only || lane.on_half(side, n.x))
            .min_by(|a, b| (a.x - x).abs().total_cmp(&(b.x - x).abs()))
            .map(|n| n.id)
    };
    closest(true).or_else(|| closest(false))
}

fn enemy_within(state: &MatchState, side: Side, x: f64, radius: f64) -> bool {
    state
        .units
        .iter()
        .any(|u| u.side != side && u.is_alive() && (u.x - x).abs() <= radius)
}

/// One tick of the toResource → gathering → toBase cycle for every gatherer.
pub fn advance_gatherers(state: &mut MatchState, dt_ms: f64) {
    for idx in 0..state.units.len() {
        let unit = &state.units[idx];
        let mut job = match (&unit.role, unit.is_alive()) {
            (UnitRole::Gatherer(job), true) => *job,
            _ => continue,
        };
        let side = unit.side;
        let mut x = unit.x;
        let step = unit.kind.archetype().speed * dt_ms / 1000.0;
        let load = unit.kind.archetype().resource_yield.unwrap_or(0);
        let home = state.home_x(side);

        if job.phase != GatherPhase::ToBase && enemy_within(state, side, x, THREAT_RADIUS) {
            job.phase = GatherPhase::ToBase;
        }

        if job.node.is_none() {
            job.node = nearest_node(&state.nodes, &state.lane, side, x);
        }
        let node_x = job
            .node
            .and_then(|id| state.nodes.iter().find(|n| n.id == id))
            .map(|n| n.x);

        match job.phase {
            GatherPhase::ToResource => {
                if let Some(target) = node_x {
                    x = step_toward(x, target, step);
                    if (x - target).abs() <= ARRIVE_EPSILON {
                        job.phase = GatherPhase::Gathering { elapsed_ms: 0.0 };
                    }
                }
            }
            GatherPhase::Gathering { elapsed_ms } => {
                let elapsed_ms = elapsed_ms + dt_ms;
                job.phase = if elapsed_ms >= GATHER_DWELL_MS {
                    job.carried = load;
                    GatherPhase::ToBase
                } else {
                    GatherPhase::Gathering { elapsed_ms }
                };
            }
            GatherPhase::ToBase => {
                x = step_toward(x, home, step);
                if (x - home).abs() <= ARRIVE_EPSILON {
                    state.gold[side] = state.gold[side].saturating_add(job.carried);
                    job = GatherJob {
                        phase: GatherPhase::ToResource,
                        node: nearest_node(&state.nodes, &state.lane, side, x),
                        carried: 0,
                    };
                }
            }
        }

        let unit = &mut state.units[idx];
        unit.x = state.lane.clamp_interior(x);
        unit.role = UnitRole::Gatherer(job);
    }
}
