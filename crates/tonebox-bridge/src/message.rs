//! Line protocol between the host and the engine.
//!
//! Every line is one JSON object `{"event": <name>, "data": {...}}` in both
//! directions. Outbound messages use the `#[serde(tag = "event", content =
//! "data")]` layout directly; inbound lines are read into an [`Envelope`]
//! first so unknown events can be logged by name and ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const IMPORT_IMAGE: &str = "importImage";
pub const ADJUST_IMAGE: &str = "adjustImage";
pub const PING: &str = "ping";

/// Raw inbound message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportImage {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub data_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdjustImage {
    /// The mode name: `cached`, `preview`, `undo`, `redo`, `reset` or `final`.
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filters: Option<Value>,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    ImportImage(ImportImage),
    AdjustImage(AdjustImage),
    Ping,
    /// An event this engine does not handle.
    Unknown(String),
}

impl Request {
    pub fn from_envelope(envelope: Envelope) -> serde_json::Result<Self> {
        // Hosts may send `"data": null` or leave it out entirely.
        let data = match envelope.data {
            Value::Null => Value::Object(Default::default()),
            data => data,
        };
        Ok(match envelope.event.as_str() {
            IMPORT_IMAGE => Request::ImportImage(serde_json::from_value(data)?),
            ADJUST_IMAGE => Request::AdjustImage(serde_json::from_value(data)?),
            PING => Request::Ping,
            _ => Request::Unknown(envelope.event),
        })
    }

    pub fn event(&self) -> &str {
        match self {
            Request::ImportImage(_) => IMPORT_IMAGE,
            Request::AdjustImage(_) => ADJUST_IMAGE,
            Request::Ping => PING,
            Request::Unknown(event) => event,
        }
    }
}

/// The failure shape shared by every reply: `{"status": false, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub status: bool,
    pub message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Ok(T),
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Imported {
    pub status: bool,
    pub filename: String,
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjusted {
    pub status: bool,
    pub filename: String,
    pub data_url: String,
    /// Absent after a reset; `null` when undo/redo hit a boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Option<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedImage {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exported {
    pub status: bool,
    pub data: Vec<ExportedImage>,
}

/// Outbound messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Response {
    ImageImported(Reply<Imported>),
    ImageAdjusted(Reply<Adjusted>),
    ImageExport(Reply<Exported>),
    Pong { ok: bool },
    Error(Failure),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(line: &str) -> Request {
        Request::from_envelope(serde_json::from_str(line).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_import() {
        let request = parse(r#"{"event":"importImage","data":{"filename":"a.png","dataUrl":"data:x"}}"#);
        assert_eq!(
            request,
            Request::ImportImage(ImportImage {
                filename: Some("a.png".into()),
                data_url: Some("data:x".into()),
            })
        );
    }

    #[test]
    fn test_parse_ping_without_data() {
        assert_eq!(parse(r#"{"event":"ping"}"#), Request::Ping);
        assert_eq!(parse(r#"{"event":"ping","data":null}"#), Request::Ping);
    }

    #[test]
    fn test_parse_unknown_keeps_name() {
        let request = parse(r#"{"event":"windowClosed","data":{}}"#);
        assert_eq!(request.event(), "windowClosed");
    }

    #[test]
    fn test_adjust_fields_optional() {
        let request = parse(r#"{"event":"adjustImage","data":{"function":"undo"}}"#);
        let Request::AdjustImage(adjust) = request else {
            panic!("expected adjustImage");
        };
        assert_eq!(adjust.function.as_deref(), Some("undo"));
        assert!(adjust.filename.is_none());
        assert!(adjust.filters.is_none());
    }

    #[test]
    fn test_response_layout() {
        let pong = serde_json::to_value(Response::Pong { ok: true }).unwrap();
        assert_eq!(pong, json!({"event": "pong", "data": {"ok": true}}));

        let failed = Response::ImageAdjusted(Reply::Failed(Failure::new("boom")));
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({"event": "imageAdjusted", "data": {"status": false, "message": "boom"}})
        );
    }

    #[test]
    fn test_adjusted_filters_presence() {
        let base = Adjusted {
            status: true,
            filename: "a.png".into(),
            data_url: "data:".into(),
            filters: None,
        };
        let reset = serde_json::to_value(&base).unwrap();
        assert!(reset.get("filters").is_none());

        let boundary = Adjusted {
            filters: Some(None),
            ..base
        };
        assert_eq!(serde_json::to_value(&boundary).unwrap()["filters"], Value::Null);
        assert!(serde_json::to_value(&boundary).unwrap().get("filters").is_some());
    }
}
