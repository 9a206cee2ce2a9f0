use castlefall_core::{
    protocol::{
        ClientId, ClientMessage, DisconnectReason, PlayersUpdate, ServerMessage, StartRequest,
        Welcome, PROTOCOL_VERSION,
    },
    Room, WordLists,
};
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use std::{collections::HashMap, net::SocketAddr, time::Instant};
use tokio::sync::mpsc::{Receiver, UnboundedSender};

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(ServerMessage),
    Close,
}

#[derive(Debug)]
pub enum HubCommand {
    Connect {
        id: ClientId,
        peer: SocketAddr,
        outbox: UnboundedSender<Outbound>,
    },
    Message {
        id: ClientId,
        message: ClientMessage,
    },
    Disconnect {
        id: ClientId,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Seat {
    room: String,
    name: String,
}

struct Client {
    peer: SocketAddr,
    outbox: UnboundedSender<Outbound>,
    seat: Option<Seat>,
}

/// Owns every room and every connection's outbound channel. Connections talk
/// to it only through `HubCommand`s.
pub struct Hub {
    lists: WordLists,
    rooms: HashMap<String, Room>,
    clients: HashMap<ClientId, Client>,
    rng: StdRng,
}

fn is_name_valid(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_LEN
}

impl Hub {
    pub fn new(lists: WordLists, rng: StdRng) -> Self {
        Hub {
            lists,
            rooms: HashMap::new(),
            clients: HashMap::new(),
            rng,
        }
    }

    pub async fn run(mut self, mut commands: Receiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            self.handle(command, Instant::now());
        }
        debug!("hub channel closed, {} rooms dropped", self.rooms.len());
    }

    pub fn handle(&mut self, command: HubCommand, now: Instant) {
        match command {
            HubCommand::Connect { id, peer, outbox } => {
                debug!("{peer}: connected as client {id}");
                self.clients.insert(
                    id,
                    Client {
                        peer,
                        outbox,
                        seat: None,
                    },
                );
            }
            HubCommand::Message { id, message } => {
                if let Some((room, name)) = message.join() {
                    self.register(id, room, name);
                }
                if let Some(start) = &message.start {
                    self.start_round(id, start, now);
                }
                if let Some(target) = &message.kick {
                    self.kick(id, target);
                }
            }
            HubCommand::Disconnect { id } => self.unregister(id),
        }
    }

    fn peer(&self, id: ClientId) -> String {
        self.clients
            .get(&id)
            .map(|c| c.peer.to_string())
            .unwrap_or_else(|| format!("client {id}"))
    }

    fn seat_of(&self, id: ClientId) -> Option<Seat> {
        self.clients.get(&id).and_then(|c| c.seat.clone())
    }

    fn send(&self, id: ClientId, outbound: Outbound) {
        if let Some(client) = self.clients.get(&id) {
            if client.outbox.send(outbound).is_err() {
                debug!("{}: outbox closed", client.peer);
            }
        }
    }

    fn broadcast_players(&self, room_name: &str) {
        let Some(room) = self.rooms.get(room_name) else {
            return;
        };
        let update = ServerMessage::Players(PlayersUpdate {
            players: room.player_names(),
        });
        for (_, client) in room.members() {
            self.send(client, Outbound::Message(update.clone()));
        }
    }

    fn drop_room_if_empty(&mut self, room_name: &str) {
        if self.rooms.get(room_name).is_some_and(Room::is_empty) {
            debug!("room '{room_name}' is empty, dropping it");
            self.rooms.remove(room_name);
        }
    }

    /// Tells `id` why it is being dropped, closes it and forgets its seat.
    /// The caller has already taken the seat away in the room.
    fn evict(&mut self, id: ClientId, reason: DisconnectReason) {
        self.send(id, Outbound::Message(reason.into()));
        self.send(id, Outbound::Close);
        if let Some(client) = self.clients.get_mut(&id) {
            client.seat = None;
        }
    }

    fn vacate(&mut self, id: ClientId, seat: &Seat) {
        if let Some(room) = self.rooms.get_mut(&seat.room) {
            room.leave_client(&seat.name, id);
        }
        self.broadcast_players(&seat.room);
        self.drop_room_if_empty(&seat.room);
    }

    fn register(&mut self, id: ClientId, room_name: &str, name: &str) {
        let (room_name, name) = (room_name.trim(), name.trim());
        let peer = self.peer(id);
        if !is_name_valid(room_name) || !is_name_valid(name) {
            warn!("{peer}: ignoring join with invalid room '{room_name}' or name '{name}'");
            return;
        }
        if !self.clients.contains_key(&id) {
            warn!("{peer}: join from unknown client");
            return;
        }
        info!("{peer}: registering as '{name}' in room '{room_name}'");

        let seat = Seat {
            room: room_name.to_string(),
            name: name.to_string(),
        };
        match self.seat_of(id) {
            // a rename keeps the room, and with it the round state
            Some(previous) if previous.room == seat.room && previous.name != seat.name => {
                if let Some(room) = self.rooms.get_mut(&previous.room) {
                    room.leave_client(&previous.name, id);
                }
            }
            Some(previous) if previous != seat => self.vacate(id, &previous),
            _ => {}
        }

        let displaced = self
            .rooms
            .entry(seat.room.clone())
            .or_default()
            .join(name, id);
        if let Some(old) = displaced {
            info!("{}: name '{name}' taken over by {peer}", self.peer(old));
            self.evict(old, DisconnectReason::NameTaken);
        }
        if let Some(client) = self.clients.get_mut(&id) {
            client.seat = Some(seat);
        }

        self.broadcast_players(room_name);
        let Some(room) = self.rooms.get(room_name) else {
            return;
        };
        let welcome = ServerMessage::Welcome(Welcome {
            room: room_name.to_string(),
            round: room.round(),
            players_in_round: room.players_in_round().to_vec(),
            words: room.words_shuffled(&mut self.rng),
            word: room.assigned_word(name).map(str::to_string),
            wordlists: self.lists.summary(),
            version: PROTOCOL_VERSION.to_string(),
        });
        self.send(id, Outbound::Message(welcome));
    }

    fn start_round(&mut self, id: ClientId, request: &StartRequest, now: Instant) {
        let peer = self.peer(id);
        let Some(seat) = self.seat_of(id) else {
            warn!("{peer}: start from a client outside any room");
            return;
        };
        let Some(room) = self.rooms.get_mut(&seat.room) else {
            return;
        };
        debug!("{peer}: start {request:?}");
        if let Err(e) = room.start_round(request, &self.lists, now, &mut self.rng) {
            warn!("{peer}: start refused in room '{}': {e}", seat.room);
            return;
        }
        info!(
            "room '{}' started round {} with {} players",
            seat.room,
            room.round(),
            room.players_in_round().len()
        );
        debug!("round words: {}", room.words().iter().join(", "));

        let deals = room
            .members()
            .map(|(name, client)| {
                let dealt = room.round_dealt(name, &mut self.rng);
                (client, ServerMessage::RoundDealt(dealt))
            })
            .collect_vec();
        for (client, message) in deals {
            self.send(client, Outbound::Message(message));
        }
    }

    fn kick(&mut self, id: ClientId, target: &str) {
        let peer = self.peer(id);
        let Some(seat) = self.seat_of(id) else {
            return;
        };
        info!("{peer}: kicking '{target}' from room '{}'", seat.room);
        let victim = self
            .rooms
            .get_mut(&seat.room)
            .and_then(|room| room.leave(target));
        if let Some(victim) = victim {
            self.evict(victim, DisconnectReason::Kicked);
        }
        self.broadcast_players(&seat.room);
        self.drop_room_if_empty(&seat.room);
    }

    fn unregister(&mut self, id: ClientId) {
        let Some(client) = self.clients.remove(&id) else {
            return;
        };
        info!("{}: disconnected", client.peer);
        if let Some(seat) = client.seat {
            let left = self
                .rooms
                .get_mut(&seat.room)
                .is_some_and(|room| room.leave_client(&seat.name, id));
            if !left {
                warn!("{}: seat '{}' was no longer held", client.peer, seat.name);
            }
            self.broadcast_players(&seat.room);
            self.drop_room_if_empty(&seat.room);
        }
    }

    #[cfg(test)]
    fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }
}
