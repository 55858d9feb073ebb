//! Step state machine gating navigation on validation.
//!
//! ```text
//! Step1 --valid--> Step2 --valid--> Step3 --valid--> (submitting)
//!   ^               |  ^              |                 |
//!   +-----back------+  +-----back-----+                 |
//!   ^                                                   |
//!   +---------------- success (draft reset) ------------+
//! ```

use super::draft::DraftState;
use crate::domain::{
    ApplicationData, ApplicationDraft, FamilyFinancialForm, PersonalInformation, SectionUpdate,
    SituationDescriptions, Step, SubmissionError, WizardError, validate_family_financial,
    validate_personal, validate_situations,
};
use chrono::NaiveDate;

/// The raw input of one step's form.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    Personal(PersonalInformation),
    FamilyFinancial(FamilyFinancialForm),
    Situations(SituationDescriptions),
}

impl StepInput {
    pub fn step(&self) -> Step {
        match self {
            StepInput::Personal(_) => Step::One,
            StepInput::FamilyFinancial(_) => Step::Two,
            StepInput::Situations(_) => Step::Three,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The section was stored and the wizard moved on.
    Moved(Step),
    /// The last section was stored; this snapshot should be submitted.
    ReadyToSubmit(ApplicationData),
}

#[derive(Debug)]
pub struct Wizard {
    draft: DraftState,
    submitting: bool,
}

impl Wizard {
    pub fn new(draft: DraftState) -> Self {
        Self {
            draft,
            submitting: false,
        }
    }

    pub fn step(&self) -> Step {
        self.draft.step()
    }

    pub fn draft(&self) -> &ApplicationDraft {
        self.draft.draft()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validates the current step's input, stores it, then moves forward.
    ///
    /// The section is persisted before the step pointer changes.
    pub fn advance(&mut self, input: StepInput, today: NaiveDate) -> Result<Advance, WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        let current = self.step();
        if input.step() != current {
            return Err(WizardError::StepMismatch {
                current,
                input: input.step(),
            });
        }

        let next = match input {
            StepInput::Personal(personal) => {
                let section = validate_personal(&personal, today)?;
                self.draft.update_section(SectionUpdate::Personal(section));
                Step::Two
            }
            StepInput::FamilyFinancial(form) => {
                let section = validate_family_financial(&form)?;
                self.draft.update_section(SectionUpdate::FamilyFinancial(section));
                Step::Three
            }
            StepInput::Situations(situations) => {
                let section = validate_situations(&situations)?;
                self.draft.update_section(SectionUpdate::Situations(section));
                self.submitting = true;
                return Ok(Advance::ReadyToSubmit(self.draft.draft().data.clone()));
            }
        };

        self.draft.set_step(next);
        Ok(Advance::Moved(next))
    }

    /// Moves one step back without validating. No-op on step 1 and while a
    /// submission is in flight.
    pub fn back(&mut self) -> Step {
        if !self.submitting {
            if let Some(previous) = self.step().previous() {
                self.draft.set_step(previous);
            }
        }
        self.step()
    }

    /// Applies a submission outcome: success resets the draft, failure
    /// leaves it exactly as it was.
    pub fn finish_submission<T>(&mut self, outcome: &Result<T, SubmissionError>) {
        self.submitting = false;
        match outcome {
            Ok(_) => self.draft.reset(),
            Err(error) => tracing::warn!(%error, "submission failed, draft kept"),
        }
    }

    /// Re-reads the persisted draft. An in-flight submission stays in flight
    /// until its outcome arrives.
    pub fn reload(&mut self) {
        self.draft.reload();
    }
}
