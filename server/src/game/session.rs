//! One async task per live room.
//!
//! The task owns its `Room` outright; everything else reaches it through a
//! `RoomHandle`. Rooms tick on their own interval, so a slow room never
//! holds up another one.

use crate::{
    config::RoomPolicy,
    error::GameError,
    game::{
        room::{ConnId, Intent, Outbox, Room, RoomId},
        types::Side,
    },
    metrics,
};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{self, Instant, MissedTickBehavior},
};

/// Room codes avoid 0/O and 1/I so they survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 6;

/// Requests a room task accepts.
#[derive(Debug)]
pub enum RoomCmd {
    Join {
        conn: ConnId,
        outbox: Outbox,
        reply: oneshot::Sender<Result<Side, GameError>>,
    },
    Intent {
        conn: ConnId,
        intent: Intent,
    },
    Leave {
        conn: ConnId,
    },
}

/// Cheap, cloneable address of a running room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub id: RoomId,
    tx: mpsc::Sender<RoomCmd>,
}

impl RoomHandle {
    /// Best-effort relay. A room that already shut down drops the intent.
    pub async fn intent(&self, conn: ConnId, intent: Intent) {
        if self.tx.send(RoomCmd::Intent { conn, intent }).await.is_err() {
            log::debug!("room {} gone; intent dropped", self.id);
        }
    }

    pub async fn leave(&self, conn: ConnId) {
        let _ = self.tx.send(RoomCmd::Leave { conn }).await;
    }

    async fn join(&self, conn: ConnId, outbox: Outbox) -> Result<Side, GameError> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(RoomCmd::Join {
                conn,
                outbox,
                reply,
            })
            .await
            .map_err(|_| GameError::RoomNotFound)?;
        // A dropped reply means the room emptied out while we queued.
        answer.await.map_err(|_| GameError::RoomNotFound)?
    }
}

/// Every live room, keyed by its code. Rooms insert themselves on creation
/// and remove themselves once their last member leaves.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    policy: RoomPolicy,
}

impl RoomRegistry {
    pub fn new(policy: RoomPolicy) -> Arc<Self> {
        Arc::new(RoomRegistry {
            rooms: DashMap::new(),
            policy,
        })
    }

    pub fn policy(&self) -> RoomPolicy {
        self.policy
    }

    pub fn get(&self, id: &str) -> Option<RoomHandle> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Open a room with `creator` seated as A and start its task.
    pub fn create(self: &Arc<Self>, creator: ConnId, outbox: Outbox) -> RoomHandle {
        let (tx, rx) = mpsc::channel::<RoomCmd>(64);

        let handle = loop {
            let code = room_code();
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                let handle = RoomHandle { id: code, tx };
                slot.insert(handle.clone());
                break handle;
            }
        };

        let room = Room::open(handle.id.clone(), creator, outbox, self.policy, Instant::now());
        metrics::ROOMS_ACTIVE.inc();
        log::info!("room {} created", handle.id);

        tokio::spawn(run_room(self.clone(), room, rx));
        handle
    }

    /// Seat `conn` in the room named by `code` (case and whitespace are
    /// ignored).
    pub async fn join(
        &self,
        code: &str,
        conn: ConnId,
        outbox: Outbox,
    ) -> Result<(RoomHandle, Side), GameError> {
        let code = code.trim().to_ascii_uppercase();
        let handle = self.get(&code).ok_or(GameError::RoomNotFound)?;
        let side = handle.join(conn, outbox).await?;
        Ok((handle, side))
    }
}

fn room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

fn apply(room: &mut Room, cmd: RoomCmd) {
    match cmd {
        RoomCmd::Join {
            conn,
            outbox,
            reply,
        } => {
            let _ = reply.send(room.join(conn, outbox));
        }
        RoomCmd::Intent { conn, intent } => room.handle_intent(conn, intent),
        RoomCmd::Leave { conn } => {
            room.leave(conn);
        }
    }
}

async fn run_room(registry: Arc<RoomRegistry>, mut room: Room, mut rx: mpsc::Receiver<RoomCmd>) {
    let mut ticker = time::interval(registry.policy.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick fires immediately; the opening snapshot already went out.
    ticker.tick().await;

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(cmd) => apply(&mut room, cmd),
                None => break,
            },
            _ = ticker.tick() => room.tick(Instant::now()),
        }

        if room.is_empty() {
            break;
        }
    }

    // final cleanup
    registry.rooms.remove(room.id());
    metrics::ROOMS_ACTIVE.dec();
    log::info!("room {} closed", room.id());
}
