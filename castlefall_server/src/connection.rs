use crate::hub::{HubCommand, Outbound};
use axum::extract::ws::{Message, WebSocket};
use castlefall_core::protocol::{ClientId, ClientMessage};
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use std::net::SocketAddr;
use tokio::sync::mpsc::{self, Sender};

/// Decodes one incoming frame into a client message. `None` for frames that
/// carry no message or can't be read.
fn decode(peer: SocketAddr, frame: &Message) -> Option<ClientMessage> {
    let text = match frame {
        Message::Text(text) => text.as_str(),
        Message::Binary(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("{peer}: binary frame is not utf-8: {e}");
                return None;
            }
        },
        _ => return None,
    };
    match ClientMessage::parse(text) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("{peer}: ignoring malformed message: {e}");
            None
        }
    }
}

/// Pumps one websocket until either side closes it.
pub async fn serve(socket: WebSocket, peer: SocketAddr, id: ClientId, hub: Sender<HubCommand>) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut inbox) = mpsc::unbounded_channel();

    if hub
        .send(HubCommand::Connect { id, peer, outbox })
        .await
        .is_err()
    {
        error!("{peer}: hub is gone, dropping connection");
        return;
    }

    loop {
        tokio::select! {
            outgoing = inbox.recv() => match outgoing {
                Some(Outbound::Message(message)) => {
                    let text = match message.to_json() {
                        Ok(text) => text,
                        Err(e) => {
                            error!("{peer}: failed to encode {message:?}: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        debug!("{peer}: send failed: {e}");
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(frame)) => {
                    if let Some(message) = decode(peer, &frame) {
                        if hub.send(HubCommand::Message { id, message }).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    debug!("{peer}: receive failed: {e}");
                    break;
                }
            },
        }
    }

    _ = hub.send(HubCommand::Disconnect { id }).await;
}
