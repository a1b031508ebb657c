//! Commands that can be sent to the microphone-array board.
//!
//! Every command travels as a Master frame whose payload is the JSON
//! object `{"type": <kind>, "content": <object>}`.

use serde_json::{json, Value};

/// Microphone array geometries selectable on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicArrayType {
    /// Circular array of six microphones.
    CircularSix,
    /// Linear array of four microphones.
    LinearFour,
    /// Linear array of six microphones.
    LinearSix,
}

impl From<MicArrayType> for u8 {
    fn from(array: MicArrayType) -> Self {
        match array {
            MicArrayType::CircularSix => 0,
            MicArrayType::LinearFour => 1,
            MicArrayType::LinearSix => 2,
        }
    }
}

/// Commands understood by the board firmware.
#[derive(Debug, Clone)]
pub enum Command {
    /// Force a wake on a specific beam without speaking the wake word.
    ManualWakeup {
        /// Beam index. Circular six-mic: 0-5 (60 degrees apart);
        /// linear four-mic: 0-2; linear six-mic: 0-5.
        beam: u8,
    },

    /// Switch the wake word (shallow customization).
    SetWakeKeyword {
        /// Wake word as space-separated pinyin, e.g. "xiao3 fei1 xiao3 fei1".
        keyword: String,
        /// Wake threshold; the firmware default is 900.
        threshold: u32,
    },

    /// Switch the microphone array geometry.
    SwitchMicArray {
        /// Geometry to switch to.
        array: MicArrayType,
    },

    /// An arbitrary `{type, content}` command, for message types without
    /// a dedicated variant.
    Raw {
        /// Value of the `"type"` field.
        kind: String,
        /// Value of the `"content"` field.
        content: Value,
    },
}

impl Command {
    /// Get the `"type"` field value for this command.
    pub fn kind(&self) -> &str {
        match self {
            Command::ManualWakeup { .. } => "manual_wakeup",
            Command::SetWakeKeyword { .. } => "wakeup_keywords",
            Command::SwitchMicArray { .. } => "switch_mic",
            Command::Raw { kind, .. } => kind,
        }
    }

    /// Build the `"content"` object for this command.
    pub fn content(&self) -> Value {
        match self {
            Command::ManualWakeup { beam } => json!({ "beam": beam }),
            // The firmware expects the threshold as a decimal string, not
            // a JSON number.
            Command::SetWakeKeyword { keyword, threshold } => json!({
                "keyword": keyword,
                "threshold": threshold.to_string(),
            }),
            Command::SwitchMicArray { array } => json!({ "mic_type": u8::from(*array) }),
            Command::Raw { content, .. } => content.clone(),
        }
    }

    /// Serialize the full `{"type", "content"}` payload to bytes.
    pub fn to_payload(&self) -> Vec<u8> {
        json!({
            "type": self.kind(),
            "content": self.content(),
        })
        .to_string()
        .into_bytes()
    }
}
