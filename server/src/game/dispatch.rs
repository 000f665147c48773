//! Routes one connection's client messages to rooms.
//!
//! Transport-agnostic: the WS layer feeds text in and drains the outbox.

use crate::{
    game::{
        room::{ConnId, Intent, Outbox},
        session::{RoomHandle, RoomRegistry},
        types::{Side, Stance},
    },
    protocol::{ClientMsg, ServerMsg},
};
use std::sync::Arc;
use uuid::Uuid;

/// Where a connection currently plays.
#[derive(Debug, Clone)]
pub struct Seat {
    pub room: RoomHandle,
    pub side: Side,
}

#[derive(Debug)]
pub struct Connection {
    id: ConnId,
    outbox: Outbox,
    registry: Arc<RoomRegistry>,
    seat: Option<Seat>,
}

impl Connection {
    pub fn new(registry: Arc<RoomRegistry>, outbox: Outbox) -> Self {
        Connection {
            id: Uuid::new_v4(),
            outbox,
            registry,
            seat: None,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn seat(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    /// Parse and handle one text frame. Anything that is not a valid
    /// `ClientMsg` is dropped without a reply.
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMsg>(text) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => log::trace!("conn {}: ignoring malformed frame: {e}", self.id),
        }
    }

    pub async fn handle(&mut self, msg: ClientMsg) {
        match msg {
            ClientMsg::Create => {
                let room = self.registry.create(self.id, self.outbox.clone());
                self.take_seat(Seat {
                    room,
                    side: Side::A,
                })
                .await;
            }
            ClientMsg::Join { room_id } => {
                match self
                    .registry
                    .join(&room_id, self.id, self.outbox.clone())
                    .await
                {
                    Ok((room, side)) => self.take_seat(Seat { room, side }).await,
                    Err(e) => {
                        let _ = self.outbox.try_send(ServerMsg::Error { msg: e.to_string() });
                    }
                }
            }
            ClientMsg::Spawn { unit_type } => self.relay(Intent::Spawn(unit_type)).await,
            ClientMsg::Mode { value } => self.relay(Intent::Stance(Stance::parse(&value))).await,
            ClientMsg::Reset => self.relay(Intent::Reset).await,
        }
    }

    /// Leave whatever room this connection sits in.
    pub async fn close(mut self) {
        if let Some(seat) = self.seat.take() {
            seat.room.leave(self.id).await;
        }
    }

    // Intents from a connection without a seat are ignored.
    async fn relay(&self, intent: Intent) {
        if let Some(seat) = &self.seat {
            seat.room.intent(self.id, intent).await;
        }
    }

    /// Switch to `seat`, leaving the previous room only once the new one has
    /// accepted us.
    async fn take_seat(&mut self, seat: Seat) {
        if let Some(old) = self.seat.replace(seat) {
            let same_room = self.seat.as_ref().is_some_and(|s| s.room.id == old.room.id);
            if !same_room {
                old.room.leave(self.id).await;
            }
        }
    }
}
