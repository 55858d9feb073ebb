use crate::domain::{AiError, ApplicationData, SubmissionError};
use crate::infrastructure::{SubmissionReceipt, SuggestionRequest};

/// Side effects requested by input handling, executed by the task runner.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestSuggestion {
        ticket: u64,
        request: SuggestionRequest,
    },
    CancelSuggestion,
    Submit(ApplicationData),
}

/// Completions reported back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundEvent {
    SuggestionFinished {
        ticket: u64,
        result: Result<String, AiError>,
    },
    SubmissionFinished(Result<SubmissionReceipt, SubmissionError>),
}
