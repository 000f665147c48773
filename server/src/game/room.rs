//! One match plus the connections playing it.
//!
//! `Room` is plain synchronous state; the async task that owns it lives in
//! [`crate::game::session`]. Every outbound message goes through a member's
//! bounded outbox and is fire-and-forget: when the outbox is full the message
//! is dropped (the next snapshot supersedes it), and a closed outbox counts as
//! the member leaving.

use crate::{
    config::RoomPolicy,
    error::GameError,
    game::{
        logic,
        types::{MatchState, Side, Stance},
    },
    metrics,
    protocol::ServerMsg,
};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::Instant,
};
use uuid::Uuid;

pub type RoomId = String;
pub type ConnId = Uuid;
pub type Outbox = mpsc::Sender<ServerMsg>;

/// Messages queued per connection before new ones are dropped.
pub const OUTBOX_CAPACITY: usize = 32;

/// A validated player request against the room's match.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Spawn(String),
    Stance(Stance),
    Reset,
}

#[derive(Debug)]
struct Member {
    conn: ConnId,
    side: Side,
    outbox: Outbox,
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    state: MatchState,
    members: Vec<Member>,
    last_tick: Instant,
    policy: RoomPolicy,
}

impl Room {
    /// New room with `creator` seated as A. The creator is told its role and
    /// gets the opening snapshot.
    pub fn open(id: RoomId, creator: ConnId, outbox: Outbox, policy: RoomPolicy, now: Instant) -> Self {
        let mut room = Room {
            id,
            state: MatchState::new(),
            members: vec![Member {
                conn: creator,
                side: Side::A,
                outbox,
            }],
            last_tick: now,
            policy,
        };
        room.send_to(
            creator,
            ServerMsg::Joined {
                room_id: room.id.clone(),
                role: Side::A,
            },
        );
        room.send_to(creator, room.snapshot());
        room
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn side_of(&self, conn: ConnId) -> Option<Side> {
        self.members.iter().find(|m| m.conn == conn).map(|m| m.side)
    }

    /// Seat `conn` on the free side. Re-joining returns the existing seat.
    pub fn join(&mut self, conn: ConnId, outbox: Outbox) -> Result<Side, GameError> {
        if let Some(side) = self.side_of(conn) {
            return Ok(side);
        }
        let Some(side) = self.free_side() else {
            return Err(GameError::RoomFull);
        };
        if self.state.is_ended() && !self.policy.join_ended {
            return Err(GameError::MatchEnded);
        }

        self.broadcast(ServerMsg::OpponentJoined { role: side });
        self.members.push(Member { conn, side, outbox });
        self.send_to(
            conn,
            ServerMsg::Joined {
                room_id: self.id.clone(),
                role: side,
            },
        );
        self.send_to(conn, self.snapshot());
        log::info!("room {}: player joined as {side:?}", self.id);
        Ok(side)
    }

    /// Apply an intent from `conn`. Connections without a seat are ignored.
    pub fn handle_intent(&mut self, conn: ConnId, intent: Intent) {
        let Some(side) = self.side_of(conn) else {
            return;
        };

        match intent {
            Intent::Spawn(unit_type) => {
                if let Err(e) = logic::spawn_unit(&mut self.state, side, &unit_type) {
                    log::debug!("room {}: {side:?} spawn {unit_type:?} rejected: {e}", self.id);
                    metrics::SPAWNS_REJECTED_TOTAL.inc();
                    self.send_to(conn, ServerMsg::Error { msg: e.to_string() });
                }
            }
            Intent::Stance(stance) => logic::set_stance(&mut self.state, side, stance),
            Intent::Reset => {
                self.state = MatchState::new();
                log::info!("room {}: reset by {side:?}", self.id);
                self.broadcast(ServerMsg::ResetOk);
            }
        }
    }

    /// Drop `conn` and tell whoever is left. Returns false if it was not seated.
    pub fn leave(&mut self, conn: ConnId) -> bool {
        let Some(pos) = self.members.iter().position(|m| m.conn == conn) else {
            return false;
        };
        let gone = self.members.remove(pos);
        log::info!("room {}: {:?} left", self.id, gone.side);
        self.broadcast(ServerMsg::OpponentLeft { role: gone.side });
        true
    }

    /// Advance the match by the wall-clock time since the previous tick,
    /// clamped to the policy maximum, then push the snapshot to everyone.
    pub fn tick(&mut self, now: Instant) {
        let elapsed = now
            .saturating_duration_since(self.last_tick)
            .min(self.policy.max_tick);
        self.last_tick = now;

        let was_ended = self.state.is_ended();
        logic::step(&mut self.state, elapsed.as_micros() as f64 / 1000.0);
        metrics::TICKS_TOTAL.inc();

        if !was_ended && self.state.is_ended() {
            log::info!(
                "room {}: match over after {} ticks, winner {:?}",
                self.id,
                self.state.tick,
                self.state.winner()
            );
            metrics::MATCHES_FINISHED_TOTAL.inc();
        }

        self.broadcast(self.snapshot());
    }

    /// The side nobody holds yet; `None` once both are taken.
    fn free_side(&self) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|s| self.members.iter().all(|m| m.side != *s))
    }

    fn snapshot(&self) -> ServerMsg {
        ServerMsg::State {
            room_id: self.id.clone(),
            state: self.state.clone(),
        }
    }

    /// Queue `msg` for `member`. Returns false once its receiver is gone.
    fn push(&self, member: &Member, msg: ServerMsg) -> bool {
        match member.outbox.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("room {}: outbox of {:?} full, message dropped", self.id, member.side);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    fn send_to(&mut self, conn: ConnId, msg: ServerMsg) {
        let gone = self
            .members
            .iter()
            .find(|m| m.conn == conn)
            .is_some_and(|m| !self.push(m, msg));
        if gone {
            self.leave(conn);
        }
    }

    fn broadcast(&mut self, msg: ServerMsg) {
        let gone: Vec<ConnId> = self
            .members
            .iter()
            .filter(|m| !self.push(m, msg.clone()))
            .map(|m| m.conn)
            .collect();
        for conn in gone {
            self.leave(conn);
        }
    }
}
