use super::models::{FieldId, Step};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-field validation messages for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<FieldId, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message recorded for a field wins.
    pub fn insert(&mut self, field: FieldId, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FieldId) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn remove(&mut self, field: FieldId) {
        self.0.remove(&field);
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.0.keys().copied()
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Failures of the AI drafting feature. None of them affect the rest of the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("AI assistance is not configured. Set OPENAI_API_KEY to enable it.")]
    Configuration,

    #[error("The AI request took too long and was cancelled. Please check your internet connection and try again.")]
    Timeout,

    #[error("Authentication with the AI service failed. Please check your API key.")]
    Authentication,

    #[error("AI service rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    #[error("AI service is temporarily unavailable (status {status}). Please try again later.")]
    ServiceUnavailable { status: u16 },

    #[error("AI service returned an error (status {status}).")]
    Http { status: u16 },

    #[error("AI did not return any suggestion. Please try again.")]
    EmptyResponse,

    #[error("An unexpected error occurred while generating the suggestion. Please try again.")]
    Unknown { detail: String },
}

impl AiError {
    pub fn code(&self) -> &'static str {
        match self {
            AiError::Configuration => "MISSING_API_KEY",
            AiError::Timeout => "TIMEOUT",
            AiError::Authentication => "UNAUTHORIZED",
            AiError::RateLimited => "RATE_LIMIT",
            AiError::ServiceUnavailable { .. } => "SERVER_ERROR",
            AiError::Http { .. } => "HTTP_ERROR",
            AiError::EmptyResponse => "EMPTY_RESPONSE",
            AiError::Unknown { .. } => "UNKNOWN",
        }
    }

    /// HTTP status that produced this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AiError::Authentication => Some(401),
            AiError::RateLimited => Some(429),
            AiError::ServiceUnavailable { status } | AiError::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether trying again later can succeed without changing configuration.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AiError::Configuration | AiError::Authentication)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Network(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value at {path:?} is not valid: {source}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Invalid(#[from] FieldErrors),

    #[error("input for step {input} submitted while on step {current}")]
    StepMismatch { current: Step, input: Step },

    #[error("a submission is already in progress")]
    SubmissionInFlight,
}
