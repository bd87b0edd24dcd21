//! Text packet codec for Socket.IO v5 running over Engine.IO v4.
//!
//! Only the subset a plain WebSocket client needs: the Engine.IO handshake,
//! heartbeats, and Socket.IO connect/disconnect/event packets. Binary
//! attachments and acknowledgements are surfaced as [`Packet::Other`].

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake (`0{...}`): sid, pingInterval, pingTimeout.
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        name: String,
        args: Vec<Value>,
        ack_id: Option<u64>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
    Other(String),
}

impl Packet {
    /// Event on the default namespace without an ack.
    pub fn event(name: &str, args: Vec<Value>) -> Self {
        Packet::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            name: name.to_string(),
            args,
            ack_id: None,
        }
    }

    pub fn connect() -> Self {
        Packet::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }
}

pub fn decode(text: &str) -> Result<Packet> {
    let Some(kind) = text.chars().next() else {
        bail!("empty packet");
    };
    let body = &text[kind.len_utf8()..];
    let packet = match kind {
        '0' => Packet::Open(serde_json::from_str(body).context("invalid open payload")?),
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' => Packet::Pong,
        '4' => decode_message(body)?,
        '5' => Packet::Other(text.to_string()),
        '6' => Packet::Noop,
        other => bail!("unknown engine.io packet type {:?}", other),
    };
    Ok(packet)
}

fn decode_message(body: &str) -> Result<Packet> {
    let Some(kind) = body.chars().next() else {
        bail!("empty socket.io packet");
    };
    let mut rest = &body[kind.len_utf8()..];

    let namespace = if rest.starts_with('/') {
        let (ns, tail) = rest.split_once(',').unwrap_or((rest, ""));
        rest = tail;
        ns.to_string()
    } else {
        DEFAULT_NAMESPACE.to_string()
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let ack_id = rest[..digits].parse::<u64>().ok();
    rest = &rest[digits..];

    let data: Option<Value> = if rest.is_empty() {
        None
    } else {
        Some(serde_json::from_str(rest).context("invalid socket.io payload")?)
    };

    let packet = match kind {
        '0' => Packet::Connect { namespace, data },
        '1' => Packet::Disconnect { namespace },
        '2' => {
            let Some(Value::Array(mut items)) = data else {
                bail!("event payload is not an array");
            };
            if items.is_empty() {
                bail!("event payload has no name");
            }
            let name = match items.remove(0) {
                Value::String(name) => name,
                other => bail!("event name is not a string: {}", other),
            };
            Packet::Event {
                namespace,
                name,
                args: items,
                ack_id,
            }
        }
        '4' => Packet::ConnectError { namespace, data },
        '3' | '5' | '6' => Packet::Other(format!("4{}", body)),
        other => bail!("unknown socket.io packet type {:?}", other),
    };
    Ok(packet)
}

pub fn encode(packet: &Packet) -> String {
    match packet {
        Packet::Open(data) => format!("0{}", data),
        Packet::Close => "1".to_string(),
        Packet::Ping => "2".to_string(),
        Packet::Pong => "3".to_string(),
        Packet::Noop => "6".to_string(),
        Packet::Connect { namespace, data } => format!(
            "40{}{}",
            namespace_prefix(namespace),
            data.as_ref().map(Value::to_string).unwrap_or_default()
        ),
        Packet::Disconnect { namespace } => format!("41{}", namespace_prefix(namespace)),
        Packet::Event {
            namespace,
            name,
            args,
            ack_id,
        } => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::String(name.clone()));
            items.extend(args.iter().cloned());
            format!(
                "42{}{}{}",
                namespace_prefix(namespace),
                ack_id.map(|id| id.to_string()).unwrap_or_default(),
                Value::Array(items)
            )
        }
        Packet::ConnectError { namespace, data } => format!(
            "44{}{}",
            namespace_prefix(namespace),
            data.as_ref().map(Value::to_string).unwrap_or_default()
        ),
        Packet::Other(raw) => raw.clone(),
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        String::new()
    } else {
        format!("{},", namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let p = decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
            .unwrap();
        match p {
            Packet::Open(v) => assert_eq!(v["pingInterval"], 25000),
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_heartbeats() {
        assert_eq!(decode("2").unwrap(), Packet::Ping);
        assert_eq!(decode("3").unwrap(), Packet::Pong);
        assert_eq!(decode("6").unwrap(), Packet::Noop);
    }

    #[test]
    fn test_decode_connect_ack() {
        let p = decode(r#"40{"sid":"xyz"}"#).unwrap();
        assert_eq!(
            p,
            Packet::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "xyz"})),
            }
        );
    }

    #[test]
    fn test_decode_status_event() {
        let p = decode(r#"42["status",{"message":"Guardando archivo...","action":"clean"}]"#)
            .unwrap();
        match p {
            Packet::Event { namespace, name, args, ack_id } => {
                assert_eq!(namespace, "/");
                assert_eq!(name, "status");
                assert_eq!(args, vec![json!({"message": "Guardando archivo...", "action": "clean"})]);
                assert_eq!(ack_id, None);
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_namespace_and_ack_id() {
        let p = decode(r#"42/admin,7["tick",1,2]"#).unwrap();
        assert_eq!(
            p,
            Packet::Event {
                namespace: "/admin".to_string(),
                name: "tick".to_string(),
                args: vec![json!(1), json!(2)],
                ack_id: Some(7),
            }
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("9").is_err());
        assert!(decode("4").is_err());
        assert!(decode(r#"42{"not":"an array"}"#).is_err());
        assert!(decode("42[]").is_err());
        assert!(decode("42[5]").is_err());
    }

    #[test]
    fn test_ack_and_binary_are_passed_through() {
        assert_eq!(decode("431[]").unwrap(), Packet::Other("431[]".to_string()));
    }

    #[test]
    fn test_encode_run_event() {
        assert_eq!(encode(&Packet::event("run_clean", vec![])), r#"42["run_clean"]"#);
    }

    #[test]
    fn test_encode_control_packets() {
        assert_eq!(encode(&Packet::connect()), "40");
        assert_eq!(encode(&Packet::Pong), "3");
        assert_eq!(
            encode(&Packet::Connect { namespace: "/admin".to_string(), data: None }),
            "40/admin,"
        );
    }

    #[test]
    fn test_encode_event_with_namespace_and_args() {
        let p = Packet::Event {
            namespace: "/admin".to_string(),
            name: "status".to_string(),
            args: vec![json!({"message": "ok"})],
            ack_id: Some(3),
        };
        let text = encode(&p);
        assert_eq!(text, r#"42/admin,3["status",{"message":"ok"}]"#);
        assert_eq!(decode(&text).unwrap(), p);
    }
}
