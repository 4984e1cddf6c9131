//! The inbound frame boundary: lenient parsing and raw-message guards.
//!
//! Everything the server pushes arrives here first. The contract at this
//! boundary is deliberately forgiving: a frame that is not JSON, not an
//! object, or has no string `type` is dropped — no error, no panic, no
//! callback. Only well-formed tagged objects flow past this point.
//!
//! ```text
//! socket text ──→ RawMessage::parse ──→ Frame::Ping      (answered, absorbed)
//!                        │
//!                        └────────────→ Frame::Message   (dispatched)
//!                        └────────────→ None             (dropped silently)
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{tags, HostEvent, PlayerEvent, ProtocolError};

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Server heartbeat. The connection layer replies with `pong`;
    /// application handlers never see it.
    Ping,
    /// Any other well-formed tagged message.
    Message(RawMessage),
}

// ---------------------------------------------------------------------------
// RawMessage
// ---------------------------------------------------------------------------

/// A parsed inbound message: a JSON object guaranteed to carry a string
/// `type` tag.
///
/// The guarantee is established once in [`RawMessage::parse`], so
/// downstream code can read the tag without re-validating.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    value: Value,
}

impl RawMessage {
    /// Parses one text frame.
    ///
    /// Returns `None` for anything malformed: non-JSON text, JSON that is
    /// not an object (`null`, arrays, numbers, strings), and objects
    /// whose `type` is missing or not a string. A `{"type":"ping"}` frame
    /// is classified as [`Frame::Ping`].
    pub fn parse(text: &str) -> Option<Frame> {
        let value: Value = serde_json::from_str(text).ok()?;
        if !is_tagged_object(&value) {
            return None;
        }
        let raw = RawMessage { value };
        if raw.tag() == tags::PING {
            return Some(Frame::Ping);
        }
        Some(Frame::Message(raw))
    }

    /// The `type` discriminant.
    pub fn tag(&self) -> &str {
        // Both conditions were checked in `parse`.
        self.value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// A payload field, if present.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    /// A payload field, or `default` when absent. Never panics on
    /// missing keys.
    pub fn property_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.value.get(key).unwrap_or(default)
    }

    /// True iff this message carries exactly the given tag.
    pub fn is(&self, tag: &str) -> bool {
        self.tag() == tag
    }

    /// The underlying JSON object.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Decodes the full message into a typed shape, reporting why a
    /// decode failed. Use the role-specific `from_raw` helpers when the
    /// reason does not matter.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.value.clone()).map_err(ProtocolError::Decode)
    }
}

/// True iff `value` is a non-null JSON object whose `type` field is the
/// given tag. The free-function form of [`RawMessage::is`] for call sites
/// holding a bare [`Value`].
pub fn is_message_type(value: &Value, tag: &str) -> bool {
    value
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t == tag)
}

fn is_tagged_object(value: &Value) -> bool {
    value.is_object()
        && value.get("type").and_then(Value::as_str).is_some()
}

// ---------------------------------------------------------------------------
// Typed decode at the boundary
// ---------------------------------------------------------------------------

impl HostEvent {
    /// Decodes a raw message against the host vocabulary. Unknown tags
    /// and shape mismatches yield `None` — dropped, per the boundary
    /// contract.
    pub fn from_raw(raw: &RawMessage) -> Option<Self> {
        raw.decode().ok()
    }
}

impl PlayerEvent {
    /// Decodes a raw message against the player vocabulary.
    pub fn from_raw(raw: &RawMessage) -> Option<Self> {
        raw.decode().ok()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn msg(text: &str) -> RawMessage {
        match RawMessage::parse(text) {
            Some(Frame::Message(raw)) => raw,
            other => panic!("expected a message frame, got {other:?}"),
        }
    }

    // =====================================================================
    // parse() — the malformed-frame table from the wire contract
    // =====================================================================

    #[test]
    fn test_parse_drops_non_json_text() {
        assert_eq!(RawMessage::parse("definitely not json"), None);
    }

    #[test]
    fn test_parse_drops_json_null() {
        assert_eq!(RawMessage::parse("null"), None);
    }

    #[test]
    fn test_parse_drops_json_array() {
        assert_eq!(RawMessage::parse(r#"[{"type":"question"}]"#), None);
    }

    #[test]
    fn test_parse_drops_json_scalar() {
        assert_eq!(RawMessage::parse("42"), None);
        assert_eq!(RawMessage::parse(r#""question""#), None);
    }

    #[test]
    fn test_parse_drops_object_without_type() {
        assert_eq!(RawMessage::parse(r#"{"question_id":"q1"}"#), None);
    }

    #[test]
    fn test_parse_drops_object_with_non_string_type() {
        assert_eq!(RawMessage::parse(r#"{"type":7}"#), None);
        assert_eq!(RawMessage::parse(r#"{"type":null}"#), None);
        assert_eq!(RawMessage::parse(r#"{"type":{"inner":"x"}}"#), None);
    }

    #[test]
    fn test_parse_classifies_ping() {
        assert_eq!(RawMessage::parse(r#"{"type":"ping"}"#), Some(Frame::Ping));
    }

    #[test]
    fn test_parse_accepts_unknown_tags_as_messages() {
        // Unknown tags survive parsing; the typed decode or dispatcher is
        // what declines them. The parse stage only enforces well-formedness.
        let raw = msg(r#"{"type":"brand_new_feature","x":1}"#);
        assert_eq!(raw.tag(), "brand_new_feature");
    }

    // =====================================================================
    // Property access
    // =====================================================================

    #[test]
    fn test_property_present_and_absent() {
        let raw = msg(r#"{"type":"question","question_id":"q1"}"#);
        assert_eq!(raw.property("question_id"), Some(&json!("q1")));
        assert_eq!(raw.property("missing"), None);
    }

    #[test]
    fn test_property_or_returns_default_for_missing_key() {
        let raw = msg(r#"{"type":"question"}"#);
        let default = json!(30);
        assert_eq!(raw.property_or("time_limit_secs", &default), &json!(30));
    }

    #[test]
    fn test_is_matches_exact_tag_only() {
        let raw = msg(r#"{"type":"round_results","round":1,"standings":[]}"#);
        assert!(raw.is(tags::ROUND_RESULTS));
        assert!(!raw.is(tags::GAME_INTRO));
        assert!(!raw.is("round_result"));
    }

    #[test]
    fn test_is_message_type_on_bare_values() {
        assert!(is_message_type(&json!({"type": "question"}), "question"));
        assert!(!is_message_type(&json!({"type": "question"}), "answer"));
        assert!(!is_message_type(&json!(null), "question"));
        assert!(!is_message_type(&json!("question"), "question"));
        assert!(!is_message_type(&json!({"kind": "question"}), "question"));
    }

    // =====================================================================
    // Typed decode
    // =====================================================================

    #[test]
    fn test_from_raw_decodes_known_player_tag() {
        let raw = msg(
            r#"{"type":"question","question_id":"q1","text":"?",
                "options":["a","b"],"time_limit_secs":15}"#,
        );
        let event = PlayerEvent::from_raw(&raw).expect("should decode");
        assert!(matches!(event, PlayerEvent::Question { .. }));
    }

    #[test]
    fn test_from_raw_returns_none_for_foreign_vocabulary() {
        let raw = msg(r#"{"type":"lobby_snapshot","players":[]}"#);
        assert!(PlayerEvent::from_raw(&raw).is_none());
        assert!(HostEvent::from_raw(&raw).is_some());
    }

    #[test]
    fn test_from_raw_returns_none_for_shape_mismatch() {
        // Right tag, wrong payload: options is a string, not a list.
        let raw = msg(
            r#"{"type":"question","question_id":"q1","text":"?",
                "options":"a,b","time_limit_secs":15}"#,
        );
        assert!(PlayerEvent::from_raw(&raw).is_none());
    }

    #[test]
    fn test_decode_reports_reason() {
        let raw = msg(r#"{"type":"question"}"#);
        let err = raw.decode::<PlayerEvent>().unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }
}
