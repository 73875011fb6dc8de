//! Chat transcript with the coach.

use serde::{Deserialize, Serialize};

use super::Coach;
use crate::constants::{COACH_GREETING, COACH_SUGGESTION_CHIPS};
use crate::models::Workout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// A conversation that opens with the coach's greeting.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::model(COACH_GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Canned prompts offered before the user types anything
    pub fn suggestion_chips() -> &'static [&'static str] {
        &COACH_SUGGESTION_CHIPS
    }

    /// Send a user message and append the coach's answer.
    ///
    /// Blank input is ignored and returns `None`.
    pub async fn send(&mut self, coach: &Coach, input: &str, workouts: &[Workout]) -> Option<&ChatMessage> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(input));
        let (topic, reply) = coach.respond(input, workouts).await;
        self.messages.push(ChatMessage::model(reply.display_text(topic)));
        self.messages.last()
    }
}
