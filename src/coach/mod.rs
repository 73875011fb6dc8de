//! AI coach backed by a hosted text model.
//!
//! [`Coach`] turns user prompts and workout history into model requests.
//! Replies are [`CoachReply`] values rather than errors: callers decide whether
//! to show the failure or fall back to the canned text from
//! [`CoachReply::display_text`].

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use crate::constants::{
    COACH_ANALYSIS_EMPTY, COACH_ANALYSIS_FAILED, COACH_ANALYSIS_INSTRUCTION, COACH_ANALYSIS_KEYWORDS,
    COACH_HISTORY_WINDOW, COACH_MISSING_KEY, COACH_PLAN_EMPTY, COACH_PLAN_FAILED, COACH_PLAN_INSTRUCTION,
    COACH_SUGGESTION_COUNT,
};
use crate::models::{Workout, WorkoutSummary};

pub mod chat;
pub mod gemini;

pub use chat::{ChatMessage, ChatRole, Conversation};
pub use gemini::GeminiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// A JSON array of strings
    JsonStringArray,
}

/// One single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub response_format: ResponseFormat,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
        }
    }

    pub fn json_string_array(prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: None,
            prompt: prompt.into(),
            response_format: ResponseFormat::JsonStringArray,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoachError {
    #[error("{}", COACH_MISSING_KEY)]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build request: {0}")]
    InvalidRequest(String),
}

/// A hosted text-generation model.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;

    /// Generate text for `request`. An empty string means the model returned nothing.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CoachError>;
}

/// What a coach reply was about; selects the fallback texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Plan,
    Analysis,
}

impl Topic {
    fn empty_text(self) -> &'static str {
        match self {
            Self::Plan => COACH_PLAN_EMPTY,
            Self::Analysis => COACH_ANALYSIS_EMPTY,
        }
    }

    fn failure_text(self) -> &'static str {
        match self {
            Self::Plan => COACH_PLAN_FAILED,
            Self::Analysis => COACH_ANALYSIS_FAILED,
        }
    }
}

/// Outcome of a coach request.
#[derive(Debug, Clone, PartialEq)]
pub enum CoachReply {
    Text(String),
    Empty,
    Failed(CoachError),
}

impl CoachReply {
    fn from_result(result: Result<String, CoachError>) -> Self {
        match result {
            Ok(text) if text.trim().is_empty() => Self::Empty,
            Ok(text) => Self::Text(text),
            Err(e) => Self::Failed(e),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Text to show the user: the model's reply or the fallback for `topic`
    pub fn display_text(&self, topic: Topic) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Empty => topic.empty_text().to_string(),
            Self::Failed(CoachError::MissingApiKey) => COACH_MISSING_KEY.to_string(),
            Self::Failed(_) => topic.failure_text().to_string(),
        }
    }
}

/// Whether a chat message asks for history analysis rather than a plan
pub fn wants_analysis(message: &str) -> bool {
    let lower = message.to_lowercase();
    COACH_ANALYSIS_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Parse a JSON array of strings, tolerating a Markdown code fence around it
pub fn parse_string_array(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body).ok()
}

/// The AI coach.
#[derive(Clone)]
pub struct Coach {
    model: Arc<dyn TextModel>,
    history_window: usize,
}

impl Coach {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            history_window: COACH_HISTORY_WINDOW,
        }
    }

    /// Summarize this many recent workouts for analysis (at least one)
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Ask for a workout plan.
    pub async fn generate_plan(&self, prompt: &str) -> CoachReply {
        let request = GenerationRequest::text(prompt).with_system_instruction(COACH_PLAN_INSTRUCTION);
        let reply = CoachReply::from_result(self.model.generate(&request).await);
        if let CoachReply::Failed(e) = &reply {
            warn!("Plan generation failed: {}", e);
        }
        reply
    }

    /// Compact summaries of the most recent workouts. `workouts` is newest first.
    pub fn history_summary(&self, workouts: &[Workout]) -> Vec<WorkoutSummary> {
        workouts
            .iter()
            .take(self.history_window)
            .map(Workout::summary)
            .collect()
    }

    /// Ask for tips based on the most recent workouts.
    pub async fn analyze_history(&self, workouts: &[Workout]) -> CoachReply {
        let summary = match serde_json::to_string(&self.history_summary(workouts)) {
            Ok(json) => json,
            Err(e) => return CoachReply::Failed(CoachError::InvalidRequest(e.to_string())),
        };
        let prompt = format!(
            "Analyze my recent workout history and give me 3 specific tips to improve. Here is the data JSON: {summary}"
        );

        let request = GenerationRequest::text(prompt).with_system_instruction(COACH_ANALYSIS_INSTRUCTION);
        let reply = CoachReply::from_result(self.model.generate(&request).await);
        if let CoachReply::Failed(e) = &reply {
            warn!("History analysis failed: {}", e);
        }
        reply
    }

    /// Exercise names for a muscle group; empty on any failure.
    pub async fn suggest_exercises(&self, muscle_group: &str) -> Vec<String> {
        let request = GenerationRequest::json_string_array(format!(
            "Suggest {COACH_SUGGESTION_COUNT} best exercises for {muscle_group}. Return only a JSON array of strings."
        ));

        match self.model.generate(&request).await {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => parse_string_array(&text).unwrap_or_else(|| {
                warn!("Unparseable exercise suggestions: {}", text);
                Vec::new()
            }),
            Err(e) => {
                warn!("Exercise suggestions failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Answer a chat message, routing history questions to analysis.
    pub async fn respond(&self, message: &str, workouts: &[Workout]) -> (Topic, CoachReply) {
        if wants_analysis(message) {
            debug!("Routing chat message to history analysis");
            (Topic::Analysis, self.analyze_history(workouts).await)
        } else {
            (Topic::Plan, self.generate_plan(message).await)
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}
