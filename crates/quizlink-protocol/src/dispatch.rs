//! Tag-keyed message dispatch.
//!
//! A [`Dispatcher`] maps inbound tags to handlers. Exactly one handler
//! fires per message — the one registered for its tag — or none at all.
//! Unknown tags are reported via the `bool` return so callers can count
//! or log them, but nothing is invoked and nothing is thrown.

use std::collections::HashMap;

use crate::RawMessage;

type Handler = Box<dyn Fn(&RawMessage) + Send + Sync>;

/// Routes a [`RawMessage`] to the handler registered for its tag.
///
/// Built once per connection, usually right next to the state it updates:
///
/// ```
/// use quizlink_protocol::{tags, Dispatcher, Frame, RawMessage};
///
/// let dispatcher = Dispatcher::new()
///     .on(tags::QUESTION, |msg| {
///         let _ = msg.property("question_id");
///     })
///     .on(tags::SESSION_ENDED, |_| { /* leave */ });
///
/// if let Some(Frame::Message(raw)) =
///     RawMessage::parse(r#"{"type":"question","question_id":"q1"}"#)
/// {
///     assert!(dispatcher.dispatch(&raw));
/// }
/// ```
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `tag`, replacing any previous handler for
    /// the same tag.
    pub fn on(
        mut self,
        tag: impl Into<String>,
        handler: impl Fn(&RawMessage) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(tag.into(), Box::new(handler));
        self
    }

    /// Invokes the handler registered for the message's tag.
    ///
    /// Returns `true` iff a handler was invoked.
    pub fn dispatch(&self, message: &RawMessage) -> bool {
        match self.handlers.get(message.tag()) {
            Some(handler) => {
                handler(message);
                true
            }
            None => false,
        }
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
