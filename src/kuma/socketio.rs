//! Socket.IO v5 packet codec for the default namespace.
//!
//! Packets travel inside Engine.IO `message` packets. Binary attachments and
//! custom namespaces are not used by Uptime Kuma and are not supported.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Connect(Option<Value>),
    Disconnect,
    Event { id: Option<u64>, data: Vec<Value> },
    Ack { id: u64, data: Vec<Value> },
    ConnectError(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("empty socket.io packet")]
    Empty,
    #[error("unsupported socket.io packet type `{0}`")]
    UnsupportedType(char),
    #[error("socket.io ack without id: `{0}`")]
    MissingAckId(String),
    #[error("socket.io packet is missing its payload: `{0}`")]
    MissingPayload(String),
    #[error("invalid socket.io payload `{data}`: {source}")]
    Payload {
        data: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Packet {
    /// Builds an event emission expecting an acknowledgement with `id`.
    pub fn event(id: u64, name: &str, args: Vec<Value>) -> Self {
        let mut data = Vec::with_capacity(args.len() + 1);
        data.push(Value::String(name.to_owned()));
        data.extend(args);
        Packet::Event { id: Some(id), data }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Connect(None) => "0".to_owned(),
            Packet::Connect(Some(auth)) => format!("0{auth}"),
            Packet::Disconnect => "1".to_owned(),
            Packet::Event { id, data } => {
                let id = id.map(|id| id.to_string()).unwrap_or_default();
                format!("2{id}{}", Value::Array(data.clone()))
            }
            Packet::Ack { id, data } => format!("3{id}{}", Value::Array(data.clone())),
            Packet::ConnectError(data) => format!("4{data}"),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(DecodeError::Empty)?;
        let rest = skip_namespace(chars.as_str());
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (id, body) = rest.split_at(digits);
        let id = id.parse::<u64>().ok();

        match kind {
            '0' => Ok(Packet::Connect(parse_optional(body)?)),
            '1' => Ok(Packet::Disconnect),
            '2' => Ok(Packet::Event {
                id,
                data: parse_array(raw, body)?,
            }),
            '3' => Ok(Packet::Ack {
                id: id.ok_or_else(|| DecodeError::MissingAckId(raw.to_owned()))?,
                data: parse_array(raw, body)?,
            }),
            '4' => Ok(Packet::ConnectError(
                parse_optional(body)?.unwrap_or(Value::Null),
            )),
            other => Err(DecodeError::UnsupportedType(other)),
        }
    }
}

/// Strips a `/namespace,` prefix if present.
fn skip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        match rest.split_once(',') {
            Some((_, tail)) => tail,
            None => "",
        }
    } else {
        rest
    }
}

fn parse_optional(body: &str) -> Result<Option<Value>, DecodeError> {
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|source| DecodeError::Payload {
            data: body.to_owned(),
            source,
        })
}

fn parse_array(raw: &str, body: &str) -> Result<Vec<Value>, DecodeError> {
    match parse_optional(body)? {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Ok(vec![other]),
        None => Err(DecodeError::MissingPayload(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_event_with_ack_id() {
        let packet = Packet::event(12, "login", vec![json!({"username": "admin"})]);
        assert_eq!(packet.encode(), r#"212["login",{"username":"admin"}]"#);
    }

    #[test]
    fn decodes_ack() {
        let packet = Packet::decode(r#"312[{"ok":true,"token":"abc"}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Ack {
                id: 12,
                data: vec![json!({"ok": true, "token": "abc"})]
            }
        );
    }

    #[test]
    fn decodes_pushed_event_without_id() {
        let packet = Packet::decode(r#"2["dockerHostList",[{"id":1,"name":"prod-docker"}]]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Event {
                id: None,
                data: vec![
                    json!("dockerHostList"),
                    json!([{"id": 1, "name": "prod-docker"}])
                ]
            }
        );
    }

    #[test]
    fn decodes_connect_with_and_without_payload() {
        assert_eq!(
            Packet::decode(r#"0{"sid":"abc"}"#).unwrap(),
            Packet::Connect(Some(json!({"sid": "abc"})))
        );
        assert_eq!(Packet::decode("0").unwrap(), Packet::Connect(None));
    }

    #[test]
    fn skips_namespace_prefix() {
        let packet = Packet::decode(r#"3/admin,4["ok"]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Ack {
                id: 4,
                data: vec![json!("ok")]
            }
        );
    }

    #[test]
    fn ack_requires_id() {
        assert!(matches!(
            Packet::decode(r#"3[{"ok":true}]"#),
            Err(DecodeError::MissingAckId(_))
        ));
    }

    #[test]
    fn rejects_binary_packets() {
        assert!(matches!(
            Packet::decode("51-[\"x\"]"),
            Err(DecodeError::UnsupportedType('5'))
        ));
    }
}
