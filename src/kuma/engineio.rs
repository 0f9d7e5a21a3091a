//! Engine.IO v4 packet codec.
//!
//! Only the text packets used by the HTTP long-polling transport are
//! supported. See the
//! [protocol description](https://github.com/socketio/engine.io-protocol)
//! for the wire format.

use serde::Deserialize;

/// Separator between packets inside a single polling payload.
pub const RECORD_SEPARATOR: char = '\x1e';

/// Parameters sent by the server in the `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(String),
    Upgrade,
    Noop,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty engine.io packet")]
    Empty,
    #[error("unknown engine.io packet type `{0}`")]
    UnknownType(char),
    #[error("invalid engine.io handshake `{data}`: {source}")]
    Handshake {
        data: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Packet {
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(DecodeError::Empty)?;
        let data = chars.as_str();
        match kind {
            '0' => serde_json::from_str(data)
                .map(Packet::Open)
                .map_err(|source| DecodeError::Handshake {
                    data: data.to_owned(),
                    source,
                }),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => Ok(Packet::Message(data.to_owned())),
            '5' => Ok(Packet::Upgrade),
            '6' => Ok(Packet::Noop),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    /// Encodes a client-originated packet.
    ///
    /// `Open` is server-only and encodes to its bare type marker.
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(_) => "0".to_owned(),
            Packet::Close => "1".to_owned(),
            Packet::Ping => "2".to_owned(),
            Packet::Pong => "3".to_owned(),
            Packet::Message(data) => format!("4{data}"),
            Packet::Upgrade => "5".to_owned(),
            Packet::Noop => "6".to_owned(),
        }
    }
}

/// Splits a polling response body into packets.
pub fn decode_payload(body: &str) -> Result<Vec<Packet>, DecodeError> {
    body.split(RECORD_SEPARATOR)
        .filter(|raw| !raw.is_empty())
        .map(Packet::decode)
        .collect()
}

pub fn encode_payload(packets: &[Packet]) -> String {
    let mut out = String::new();
    for (i, packet) in packets.iter().enumerate() {
        if i > 0 {
            out.push(RECORD_SEPARATOR);
        }
        out.push_str(&packet.encode());
    }
    out
}
