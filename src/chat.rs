//! In-memory chat transcript.
//!
//! Messages are kept oldest-first. History pages fetched from the server
//! are older than everything held, so they go in front.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Source reference attached to an AI reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Citation {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl Citation {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            snippet: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
}

impl Message {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        sender: Sender,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp,
            citations: None,
        }
    }

    #[must_use]
    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = Some(citations);
        self
    }
}

/// Shared chat transcript.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: RwLock<Vec<Message>>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly sent or received message.
    pub fn add_message(&self, message: Message) {
        self.write().push(message);
    }

    /// Replace the whole transcript.
    pub fn set_messages(&self, messages: Vec<Message>) {
        *self.write() = messages;
    }

    /// Insert an older page in front, keeping the page's own order.
    pub fn prepend_messages(&self, messages: Vec<Message>) {
        let mut current = self.write();
        current.splice(0..0, messages);
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Message>> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }
}
