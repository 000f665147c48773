//! Per-tick targeting, attacks, movement and projectile flight.

use crate::game::types::{step_toward, MatchState, Projectile, Side, Stance, UnitRole};
use std::collections::BTreeSet;

/// Marching units stop this far short of the enemy base.
pub const BASE_CLEARANCE: f64 = 10.0;
/// Defensive units wait this far in front of their own base.
pub const RALLY_DISTANCE: f64 = 120.0;
/// An enemy this close to a base releases that side's defenders.
pub const DEFEND_RADIUS: f64 = 300.0;
pub const UNIT_HIT_RADIUS: f64 = 14.0;
pub const BASE_HIT_RADIUS: f64 = 18.0;
/// Projectiles are dropped once this far outside the lane.
pub const PROJECTILE_MARGIN: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Index into `MatchState::units`.
    Unit(usize),
    Base(Side),
}

/// Nearest living enemy at or ahead of unit `idx`, with its distance.
/// Units never look behind themselves.
pub fn nearest_forward_enemy(state: &MatchState, idx: usize) -> Option<(usize, f64)> {
    let me = &state.units[idx];
    let dir = me.side.dir();
    let mut best: Option<(usize, f64)> = None;
    for (j, other) in state.units.iter().enumerate() {
        if other.side == me.side || !other.is_alive() {
            continue;
        }
        let dx = other.x - me.x;
        if dx * dir < 0.0 {
            continue;
        }
        let dist = dx.abs();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((j, dist));
        }
    }
    best
}

/// What unit `idx` would hit this tick, if anything is in range.
pub fn find_target(state: &MatchState, idx: usize) -> Option<Target> {
    let me = &state.units[idx];
    let range = me.kind.archetype().range;

    if let Some((j, dist)) = nearest_forward_enemy(state, idx) {
        if dist <= range {
            return Some(Target::Unit(j));
        }
    }

    let foe = me.side.opponent();
    if (state.bases[foe].x - me.x).abs() <= range {
        return Some(Target::Base(foe));
    }
    None
}

/// Apply `damage` to unit `idx`. Pays the bounty to `by` on the hit that
/// takes the unit from alive to dead; later hits on a corpse do nothing.
pub fn damage_unit(state: &mut MatchState, idx: usize, damage: i32, by: Side) {
    let unit = &mut state.units[idx];
    if !unit.is_alive() {
        return;
    }
    unit.hp -= damage;
    if !unit.is_alive() {
        let bounty = unit.kind.archetype().bounty;
        state.gold[by] = state.gold[by].saturating_add(bounty);
    }
}

pub fn damage_base(state: &mut MatchState, side: Side, damage: i32) {
    let base = &mut state.bases[side];
    base.hp = (base.hp - damage).max(0);
}

/// Whether any living unit of `side`'s enemy stands within `DEFEND_RADIUS`
/// of `side`'s base.
fn base_threatened(state: &MatchState, side: Side) -> bool {
    let base_x = state.bases[side].x;
    state
        .units
        .iter()
        .any(|u| u.side != side && u.is_alive() && (u.x - base_x).abs() <= DEFEND_RADIUS)
}

/// Move an idle fighter according to its side's stance.
fn advance(state: &mut MatchState, idx: usize, dt_ms: f64) {
    let side = state.units[idx].side;
    let step = state.units[idx].kind.archetype().speed * dt_ms / 1000.0;
    let x = state.units[idx].x;

    let marching = match state.stance[side] {
        Stance::Attack => true,
        Stance::Defend => base_threatened(state, side),
    };

    let next = if marching {
        let limit = state.bases[side.opponent()].x - side.dir() * BASE_CLEARANCE;
        let forward = x + side.dir() * step;
        match side {
            Side::A => forward.min(limit.max(x)),
            Side::B => forward.max(limit.min(x)),
        }
    } else {
        let rally = state.bases[side].x + side.dir() * RALLY_DISTANCE;
        step_toward(x, rally, step)
    };

    state.units[idx].x = state.lane.clamp_interior(next);
}

fn strike(state: &mut MatchState, idx: usize, target: Target) {
    let unit = &state.units[idx];
    let side = unit.side;
    let arch = unit.kind.archetype();

    if let Some(missile) = arch.missile {
        let projectile = Projectile {
            id: 0,
            side,
            x: unit.x,
            vx: side.dir() * missile.speed,
            damage: arch.damage,
            pierce: missile.pierce,
            ttl_ms: Some(missile.ttl_ms),
            struck: BTreeSet::new(),
        };
        let id = state.alloc_id();
        state.projectiles.push(Projectile { id, ..projectile });
        return;
    }

    match target {
        Target::Unit(j) => damage_unit(state, j, arch.damage, side),
        Target::Base(s) => damage_base(state, s, arch.damage),
    }
}

/// One tick for every living fighter: cool down, then attack or move.
pub fn advance_fighters(state: &mut MatchState, dt_ms: f64) {
    for idx in 0..state.units.len() {
        if !state.units[idx].is_alive() {
            continue;
        }
        let period = state.units[idx].kind.archetype().attack_period_ms;
        let ready = match &mut state.units[idx].role {
            UnitRole::Fighter { cooldown_ms } => {
                *cooldown_ms = (*cooldown_ms - dt_ms).max(0.0);
                *cooldown_ms <= 0.0
            }
            UnitRole::Gatherer(_) => continue,
        };

        match find_target(state, idx) {
            Some(target) => {
                if ready {
                    if let UnitRole::Fighter { cooldown_ms } = &mut state.units[idx].role {
                        *cooldown_ms = period;
                    }
                    strike(state, idx, target);
                }
            }
            None => advance(state, idx, dt_ms),
        }
    }
}

/// First living enemy `p` reaches on its way from `from` to its current x
/// that it has not struck yet. The swept segment is widened by the hit
/// radius at both ends, so fast shots cannot skip a unit between ticks.
fn projectile_victim(state: &MatchState, p: &Projectile, from: f64) -> Option<usize> {
    let lo = from.min(p.x) - UNIT_HIT_RADIUS;
    let hi = from.max(p.x) + UNIT_HIT_RADIUS;
    let dir = if p.vx < 0.0 { -1.0 } else { 1.0 };

    let mut best: Option<(usize, f64)> = None;
    for (j, u) in state.units.iter().enumerate() {
        if u.side == p.side || !u.is_alive() || p.struck.contains(&u.id) {
            continue;
        }
        if u.x < lo || u.x > hi {
            continue;
        }
        let along = (u.x - from) * dir;
        if best.map_or(true, |(_, d)| along < d) {
            best = Some((j, along));
        }
    }
    best.map(|(j, _)| j)
}

/// Fly every projectile and resolve its hits. Runs after all units moved.
pub fn advance_projectiles(state: &mut MatchState, dt_ms: f64) {
    let in_flight = std::mem::take(&mut state.projectiles);
    let mut kept = Vec::with_capacity(in_flight.len());

    for mut p in in_flight {
        let from = p.x;
        p.x += p.vx * dt_ms / 1000.0;
        if let Some(ttl) = p.ttl_ms.as_mut() {
            *ttl -= dt_ms;
        }

        if let Some(j) = projectile_victim(state, &p, from) {
            let victim = state.units[j].id;
            damage_unit(state, j, p.damage, p.side);
            if !p.pierce {
                continue;
            }
            p.struck.insert(victim);
        }

        let foe = p.side.opponent();
        let swept = from.min(p.x) - BASE_HIT_RADIUS..=from.max(p.x) + BASE_HIT_RADIUS;
        if swept.contains(&state.bases[foe].x) {
            damage_base(state, foe, p.damage);
            continue;
        }

        let out_of_lane =
            p.x < state.lane.min - PROJECTILE_MARGIN || p.x > state.lane.max + PROJECTILE_MARGIN;
        let expired = p.ttl_ms.is_some_and(|t| t <= 0.0);
        if out_of_lane || expired {
            continue;
        }
        kept.push(p);
    }

    state.projectiles = kept;
}

/// Drop dead units and release their population.
pub fn remove_dead(state: &mut MatchState) {
    let pop = &mut state.pop;
    state.units.retain(|u| {
        if u.is_alive() {
            return true;
        }
        let w = u.kind.archetype().pop_weight;
        pop[u.side] = pop[u.side].saturating_sub(w);
        false
    });
}
