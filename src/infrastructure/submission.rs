use crate::config::SubmissionConfig;
use crate::domain::{ApplicationData, SubmissionError};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

pub const SIMULATED_FAILURE_MESSAGE: &str = "Random simulated network failure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub reference: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// Stands in for the benefits back office: waits, then accepts the
/// application or fails at the configured rate.
#[derive(Debug, Clone)]
pub struct SimulatedSubmission {
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedSubmission {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self {
            latency,
            failure_rate: if failure_rate.is_nan() {
                0.0
            } else {
                failure_rate.clamp(0.0, 1.0)
            },
        }
    }

    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self::new(config.latency, config.failure_rate)
    }

    pub async fn submit(
        &self,
        application: &ApplicationData,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        tracing::info!(
            national_id_present = !application.personal.national_id.is_empty(),
            "submitting application"
        );
        tokio::time::sleep(self.latency).await;

        if rand::thread_rng().gen_bool(self.failure_rate) {
            tracing::warn!("simulated submission failure");
            return Err(SubmissionError::Network(SIMULATED_FAILURE_MESSAGE.to_string()));
        }

        let receipt = SubmissionReceipt {
            reference: Uuid::new_v4(),
            submitted_at: Utc::now(),
        };
        tracing::info!(reference = %receipt.reference, "application accepted");
        Ok(receipt)
    }
}

impl Default for SimulatedSubmission {
    fn default() -> Self {
        Self::from_config(&SubmissionConfig::default())
    }
}
