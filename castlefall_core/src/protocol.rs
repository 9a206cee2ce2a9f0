use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum_macros::Display;

pub type ClientId = u64;

pub const PROTOCOL_VERSION: &str = "v0.2";
pub const DEFAULT_WORD_COUNT: usize = 18;

/// Reads a string key; any other JSON type counts as absent.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A `start` that is not an object still becomes a request, which the room
/// then refuses.
fn lenient_start<'de, D: Deserializer<'de>>(d: D) -> Result<Option<StartRequest>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        value => Some(serde_json::from_value(value).unwrap_or_default()),
    })
}

/// One message from a client. Any subset of the keys may be present; they are
/// handled in the order join, start, kick. A key of the wrong type never
/// spoils the others.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClientMessage {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub room: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_start",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<StartRequest>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kick: Option<String>,
}

impl ClientMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The `(room, name)` pair, when both join keys are present.
    pub fn join(&self) -> Option<(&str, &str)> {
        match (&self.room, &self.name) {
            (Some(room), Some(name)) => Some((room.as_str(), name.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct StartRequest {
    /// The round the client believes the room is in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub wordlist: Option<String>,
    /// Number or numeric string; anything else falls back to the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wordcount: Option<Value>,
}

impl StartRequest {
    /// Only a non-negative integer names a round; anything else matches none.
    pub fn round(&self) -> Option<u64> {
        self.round.as_ref().and_then(Value::as_u64)
    }

    pub fn word_count(&self) -> usize {
        let requested = match &self.wordcount {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        requested
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_WORD_COUNT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Welcome(Welcome),
    RoundDealt(RoundDealt),
    Players(PlayersUpdate),
    Notice(Notice),
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Reply to a join: the whole state of the room as seen by the joiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    pub room: String,
    pub round: u64,
    #[serde(rename = "playersinround")]
    pub players_in_round: Vec<String>,
    pub words: Vec<String>,
    pub word: Option<String>,
    pub wordlists: Vec<(String, usize)>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDealt {
    pub round: u64,
    #[serde(rename = "playersinround")]
    pub players_in_round: Vec<String>,
    pub words: Vec<String>,
    pub word: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayersUpdate {
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DisconnectReason {
    #[strum(to_string = "Disconnected: your name was taken.")]
    NameTaken,
    #[strum(to_string = "Disconnected: you were kicked.")]
    Kicked,
}

impl From<DisconnectReason> for ServerMessage {
    fn from(reason: DisconnectReason) -> Self {
        ServerMessage::Notice(Notice {
            msg: reason.to_string(),
        })
    }
}
