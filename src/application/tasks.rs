//! Runs effects on the async runtime and reports completions back to the UI loop.

use super::events::{BackgroundEvent, Effect};
use super::supervisor::panic_message;
use crate::domain::{AiError, SubmissionError};
use crate::infrastructure::{SimulatedSubmission, SubmissionReceipt, SuggestionClient};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

pub struct TaskRunner {
    runtime: Handle,
    events: UnboundedSender<BackgroundEvent>,
    suggestions: Arc<SuggestionClient>,
    submission: Arc<SimulatedSubmission>,
    suggestion_task: Option<AbortHandle>,
}

impl TaskRunner {
    pub fn new(
        runtime: Handle,
        events: UnboundedSender<BackgroundEvent>,
        suggestions: SuggestionClient,
        submission: SimulatedSubmission,
    ) -> Self {
        Self {
            runtime,
            events,
            suggestions: Arc::new(suggestions),
            submission: Arc::new(submission),
            suggestion_task: None,
        }
    }

    pub fn dispatch(&mut self, effect: Effect) {
        match effect {
            Effect::RequestSuggestion { ticket, request } => {
                self.cancel_suggestion();
                let client = Arc::clone(&self.suggestions);
                let task = self.spawn_reported(
                    async move { client.request_suggestion(&request).await },
                    move |outcome| suggestion_finished(ticket, outcome),
                );
                self.suggestion_task = Some(task);
            }
            Effect::CancelSuggestion => self.cancel_suggestion(),
            Effect::Submit(application) => {
                let submission = Arc::clone(&self.submission);
                self.spawn_reported(
                    async move { submission.submit(&application).await },
                    submission_finished,
                );
            }
        }
    }

    /// Spawns `work` and sends `report` of its outcome to the UI loop.
    ///
    /// A panic in `work` is reported as `Err` with the panic message, so the
    /// UI never waits on a task that died. Aborting through the returned
    /// handle reports nothing.
    fn spawn_reported<T, W, R>(&self, work: W, report: R) -> AbortHandle
    where
        T: Send + 'static,
        W: Future<Output = T> + Send + 'static,
        R: FnOnce(Result<T, String>) -> BackgroundEvent + Send + 'static,
    {
        let work = self.runtime.spawn(work);
        let abort = work.abort_handle();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let outcome = match work.await {
                Ok(value) => Ok(value),
                Err(error) if error.is_cancelled() => return,
                Err(error) => {
                    let message = panic_message(error.into_panic().as_ref());
                    tracing::error!(%message, "background task panicked");
                    Err(message)
                }
            };
            if events.send(report(outcome)).is_err() {
                tracing::debug!("UI gone, background result dropped");
            }
        });
        abort
    }

    /// Aborts the in-flight suggestion request, if any.
    fn cancel_suggestion(&mut self) {
        if let Some(task) = self.suggestion_task.take() {
            if !task.is_finished() {
                tracing::debug!("aborting suggestion request");
            }
            task.abort();
        }
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.cancel_suggestion();
    }
}

fn suggestion_finished(
    ticket: u64,
    outcome: Result<Result<String, AiError>, String>,
) -> BackgroundEvent {
    BackgroundEvent::SuggestionFinished {
        ticket,
        result: outcome.unwrap_or_else(|detail| Err(AiError::Unknown { detail })),
    }
}

fn submission_finished(
    outcome: Result<Result<SubmissionReceipt, SubmissionError>, String>,
) -> BackgroundEvent {
    BackgroundEvent::SubmissionFinished(outcome.unwrap_or_else(|detail| {
        Err(SubmissionError::Network(format!(
            "Submission failed unexpectedly: {detail}"
        )))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationData, FieldId};
    use crate::infrastructure::SuggestionRequest;
    use crate::infrastructure::suggestions::tests::{ScriptedTransport, completion_body};
    use secrecy::SecretString;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn runner(
        transport: Arc<ScriptedTransport>,
        submission: SimulatedSubmission,
    ) -> (TaskRunner, UnboundedReceiver<BackgroundEvent>) {
        let (tx, rx) = unbounded_channel();
        let client = SuggestionClient::new(transport, Some(SecretString::from("sk-test")));
        (
            TaskRunner::new(Handle::current(), tx, client, submission),
            rx,
        )
    }

    fn request(ticket: u64) -> Effect {
        Effect::RequestSuggestion {
            ticket,
            request: SuggestionRequest::new(FieldId::ReasonForApplying, "rent"),
        }
    }

    #[tokio::test]
    async fn test_suggestion_result_is_reported_with_ticket() {
        let transport = Arc::new(ScriptedTransport::replying(
            200,
            &completion_body("I need help with rent."),
        ));
        let (mut runner, mut rx) = runner(transport, SimulatedSubmission::default());

        runner.dispatch(request(7));
        assert_eq!(
            rx.recv().await,
            Some(BackgroundEvent::SuggestionFinished {
                ticket: 7,
                result: Ok("I need help with rent.".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_request() {
        let transport = Arc::new(ScriptedTransport::hanging(Duration::from_secs(60)));
        let (mut runner, mut rx) = runner(Arc::clone(&transport), SimulatedSubmission::default());

        runner.dispatch(request(1));
        for _ in 0..100 {
            if transport.calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        runner.dispatch(Effect::CancelSuggestion);
        for _ in 0..100 {
            if transport.dropped_in_flight.load(Ordering::SeqCst) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(transport.dropped_in_flight.load(Ordering::SeqCst));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_submission_outcome_is_reported() {
        let transport = Arc::new(ScriptedTransport::default());
        let (mut runner, mut rx) = runner(transport, SimulatedSubmission::new(Duration::ZERO, 0.0));

        runner.dispatch(Effect::Submit(ApplicationData::default()));
        let Some(BackgroundEvent::SubmissionFinished(Ok(receipt))) = rx.recv().await else {
            panic!("expected a successful submission");
        };
        assert!(!receipt.reference.is_nil());
    }

    #[tokio::test]
    async fn test_panicking_suggestion_is_reported_as_unknown() {
        let transport = Arc::new(ScriptedTransport::panicking());
        let (mut runner, mut rx) = runner(transport, SimulatedSubmission::default());

        runner.dispatch(request(3));
        let Some(BackgroundEvent::SuggestionFinished { ticket, result }) = rx.recv().await else {
            panic!("expected a suggestion outcome");
        };
        assert_eq!(ticket, 3);
        assert_eq!(
            result,
            Err(AiError::Unknown {
                detail: "transport exploded".to_string()
            })
        );
    }

    async fn exploding_submission() -> Result<SubmissionReceipt, SubmissionError> {
        panic!("back office exploded")
    }

    #[tokio::test]
    async fn test_panicking_submission_is_reported_as_failure() {
        let transport = Arc::new(ScriptedTransport::default());
        let (runner, mut rx) = runner(transport, SimulatedSubmission::default());

        runner.spawn_reported(exploding_submission(), submission_finished);
        let Some(BackgroundEvent::SubmissionFinished(Err(SubmissionError::Network(message)))) =
            rx.recv().await
        else {
            panic!("expected a failed submission");
        };
        assert!(message.contains("back office exploded"));
    }
}
