//! Chat message types

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Remi,
}

/// One rendered chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn remi(text: impl Into<String>) -> Self {
        ChatMessage {
            id: Uuid::new_v4(),
            sender: Sender::Remi,
            text: text.into(),
        }
    }
}

/// Which branch of the router produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Greeting,
    Timetable,
    Remote,
}

/// A user submission and Remi's answer to it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub user_message: ChatMessage,
    pub reply: ChatMessage,
    pub strategy: Strategy,
    /// Whether the reply should also be spoken.
    pub speak: bool,
}
