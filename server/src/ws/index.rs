//! WebSocket endpoint: one socket per player.

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::{handle, Message};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::game::{dispatch::Connection, room::OUTBOX_CAPACITY, session::RoomRegistry};
use crate::metrics;
use crate::protocol::ServerMsg;

pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    registry: web::Data<RoomRegistry>,
) -> Result<HttpResponse, Error> {
    // 1 · handshake
    let (response, mut session, mut ws_stream) = handle(&req, body)?;

    // 2 · outbox the rooms push into
    let (outbox, mut inbox) = mpsc::channel::<ServerMsg>(OUTBOX_CAPACITY);
    let mut conn = Connection::new(registry.into_inner(), outbox);
    let conn_id = conn.id();
    metrics::CONNECTIONS_ACTIVE.inc();
    log::info!("WS opened: {conn_id}");

    actix::spawn(async move {
        loop {
            tokio::select! {
                // client → server
                frame = ws_stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => conn.handle_text(&text).await,
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                // room → client
                Some(msg) = inbox.recv() => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(json) => json,
                        Err(e) => {
                            log::warn!("snapshot encode failed for {conn_id}: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = session.text(json).await {
                        log::warn!("WS send failed for {conn_id}: {e:?}");
                        break;
                    }
                }
            }
        }

        // On disconnect … a broken socket counts as leaving.
        conn.close().await;
        let _ = session.close(None).await;
        metrics::CONNECTIONS_ACTIVE.dec();
        log::info!("WS closed: {conn_id}");
    });

    Ok(response)
}
