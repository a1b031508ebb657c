//! Typed forms of the board's inbound JSON messages.
//!
//! Device and Master frames carry `{"type": <kind>, "content": <object>}`
//! payloads. The router here maps the known kinds onto typed structs and
//! keeps everything else opaque, so undocumented message kinds pass
//! through without breaking the caller.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::EVENT_TYPE_WAKEUP;

/// A wake report: the board heard the wake word or was woken manually.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WakeEvent {
    /// Direction of arrival in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Wake confidence score.
    #[serde(default)]
    pub score: f64,
    /// Index of the beam that triggered.
    #[serde(default)]
    pub beam: u32,
    /// The wake word, when the firmware reports it.
    #[serde(default)]
    pub keyword: Option<String>,
}

/// An event report from the board's on-device speech engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceEvent {
    /// Engine event code; [`EVENT_TYPE_WAKEUP`] marks a wake report.
    #[serde(rename = "eventType")]
    pub event_type: i64,
    /// Event details as a nested JSON string.
    #[serde(default)]
    pub info: String,
}

impl VoiceEvent {
    /// Whether this event is a wake report.
    pub fn is_wakeup(&self) -> bool {
        self.event_type == EVENT_TYPE_WAKEUP
    }

    /// Parse the wake report nested in `info` (`{"ivw": {...}}`).
    ///
    /// Returns `None` for non-wake events or when `info` does not hold
    /// the expected shape.
    pub fn wake_report(&self) -> Option<WakeEvent> {
        if !self.is_wakeup() {
            return None;
        }
        let info: Value = serde_json::from_str(&self.info).ok()?;
        let ivw = info.get("ivw")?;
        serde_json::from_value(ivw.clone()).ok()
    }
}

/// A decoded device message, routed by its `"type"` field.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// `"wakeup"`: wake word detected.
    Wakeup(WakeEvent),
    /// `"aiui_event"`: speech engine event report.
    Voice(VoiceEvent),
    /// Any other message kind, kept opaque.
    Other {
        /// The `"type"` field (empty if absent).
        kind: String,
        /// The `"content"` field (null if absent).
        content: Value,
    },
}

impl DeviceEvent {
    /// Route a decoded `{type, content}` message onto its typed form.
    ///
    /// Never fails: content that does not match a known shape comes back
    /// as [`DeviceEvent::Other`].
    pub fn from_value(message: Value) -> DeviceEvent {
        let kind = message
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = message.get("content").cloned().unwrap_or(Value::Null);

        match kind.as_str() {
            "wakeup" => match serde_json::from_value::<WakeEvent>(content.clone()) {
                Ok(event) => DeviceEvent::Wakeup(event),
                Err(_) => DeviceEvent::Other { kind, content },
            },
            "aiui_event" => match serde_json::from_value::<VoiceEvent>(content.clone()) {
                Ok(event) => DeviceEvent::Voice(event),
                Err(_) => DeviceEvent::Other { kind, content },
            },
            _ => DeviceEvent::Other { kind, content },
        }
    }

    /// The message kind this event was routed from.
    pub fn kind(&self) -> &str {
        match self {
            DeviceEvent::Wakeup(_) => "wakeup",
            DeviceEvent::Voice(_) => "aiui_event",
            DeviceEvent::Other { kind, .. } => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wakeup_event() {
        let event = DeviceEvent::from_value(json!({
            "type": "wakeup",
            "content": { "angle": 180, "score": 972, "beam": 3, "keyword": "xiao3 fei1" }
        }));
        match event {
            DeviceEvent::Wakeup(wake) => {
                assert_eq!(wake.angle, 180.0);
                assert_eq!(wake.score, 972.0);
                assert_eq!(wake.beam, 3);
                assert_eq!(wake.keyword.as_deref(), Some("xiao3 fei1"));
            }
            other => panic!("expected Wakeup, got {:?}", other),
        }
    }

    #[test]
    fn test_wakeup_event_without_optional_fields() {
        let event = DeviceEvent::from_value(json!({
            "type": "wakeup",
            "content": { "angle": 180, "beam": 3 }
        }));
        match event {
            DeviceEvent::Wakeup(wake) => {
                assert_eq!(wake.angle, 180.0);
                assert_eq!(wake.beam, 3);
                assert_eq!(wake.score, 0.0);
                assert!(wake.keyword.is_none());
            }
            other => panic!("expected Wakeup, got {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_wakeup_falls_back_to_other() {
        let event = DeviceEvent::from_value(json!({
            "type": "wakeup",
            "content": { "angle": "north", "beam": 3 }
        }));
        assert!(matches!(event, DeviceEvent::Other { .. }));
    }

    #[test]
    fn test_voice_event_wake_report() {
        let info = r#"{"ivw":{"angle":120,"beam":2}}"#;
        let event = DeviceEvent::from_value(json!({
            "type": "aiui_event",
            "content": { "eventType": 4, "info": info }
        }));
        match event {
            DeviceEvent::Voice(voice) => {
                assert!(voice.is_wakeup());
                let wake = voice.wake_report().expect("wake report parses");
                assert_eq!(wake.angle, 120.0);
                assert_eq!(wake.beam, 2);
            }
            other => panic!("expected Voice, got {:?}", other),
        }
    }

    #[test]
    fn test_voice_event_non_wake_has_no_report() {
        let event = DeviceEvent::from_value(json!({
            "type": "aiui_event",
            "content": { "eventType": 5, "info": "{}" }
        }));
        match event {
            DeviceEvent::Voice(voice) => {
                assert!(!voice.is_wakeup());
                assert!(voice.wake_report().is_none());
            }
            other => panic!("expected Voice, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_opaque() {
        let event = DeviceEvent::from_value(json!({
            "type": "doa_result",
            "content": { "angle": 45 }
        }));
        match event {
            DeviceEvent::Other { kind, content } => {
                assert_eq!(kind, "doa_result");
                assert_eq!(content["angle"], 45);
            }
            other => panic!("expected Other, got {:?}", other),
        }
        let missing_type = DeviceEvent::from_value(json!({ "content": {} }));
        assert_eq!(missing_type.kind(), "");
    }
}
