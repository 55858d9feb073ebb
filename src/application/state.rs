//! Application state management for the terminal wizard.
//!
//! This module contains the main application state, the per-step form
//! buffers and the mode machine that decides how keys are interpreted.

use super::events::{BackgroundEvent, Effect};
use super::wizard::{Advance, StepInput, Wizard};
use crate::domain::{
    AiError, ApplicationData, Choice, FamilyFinancialForm, FieldErrors, FieldId, FieldKind,
    PersonalInformation, SituationDescriptions, Step, WizardError,
};
use crate::infrastructure::SuggestionRequest;
use chrono::NaiveDate;

/// Represents the current mode of the application.
///
/// The mode determines how user input is interpreted and which overlays
/// are drawn on top of the form.
#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    /// Navigation mode - arrows move focus between fields, shortcuts available
    Normal,
    /// A text field is being edited through the input buffer
    Editing,
    /// The AI suggestion dialog is open
    Suggestion,
    /// The application is being submitted; input is ignored
    Submitting,
    /// Help screen is displayed
    Help,
    /// A handler panicked; only reload and quit are offered
    Crashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A transient message shown in the status bar until the next key press.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Single-line text buffer with a cursor counted in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    /// Creates a buffer holding `text` with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }

    /// Text before and after the cursor, for rendering.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_index(self.cursor))
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len())
    }
}

/// Editable copies of the three sections as the user is typing them.
///
/// Nothing here is persisted until the wizard accepts a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepForms {
    pub personal: PersonalInformation,
    pub family: FamilyFinancialForm,
    pub situations: SituationDescriptions,
}

impl StepForms {
    pub fn from_data(data: &ApplicationData) -> Self {
        Self {
            personal: data.personal.clone(),
            family: FamilyFinancialForm::from(&data.family_financial),
            situations: data.situations.clone(),
        }
    }

    /// Display value of a field. Unselected choices show as empty.
    pub fn value(&self, field: FieldId) -> String {
        match field {
            FieldId::Gender => self.personal.gender.label().to_string(),
            FieldId::MaritalStatus => self.family.marital_status.label().to_string(),
            FieldId::EmploymentStatus => self.family.employment_status.label().to_string(),
            FieldId::HousingStatus => self.family.housing_status.label().to_string(),
            _ => self.text_slot(field).cloned().unwrap_or_default(),
        }
    }

    /// Replaces the text of a non-choice field. Choice fields are ignored.
    pub fn set_text(&mut self, field: FieldId, value: impl Into<String>) {
        if let Some(slot) = self.text_slot_mut(field) {
            *slot = value.into();
        }
    }

    /// Steps a choice field to its next (or previous) option.
    pub fn cycle_choice(&mut self, field: FieldId, forward: bool) {
        match field {
            FieldId::Gender => self.personal.gender = self.personal.gender.cycle(forward),
            FieldId::MaritalStatus => {
                self.family.marital_status = self.family.marital_status.cycle(forward)
            }
            FieldId::EmploymentStatus => {
                self.family.employment_status = self.family.employment_status.cycle(forward)
            }
            FieldId::HousingStatus => {
                self.family.housing_status = self.family.housing_status.cycle(forward)
            }
            _ => {}
        }
    }

    /// Snapshot of one step's form for the wizard.
    pub fn input_for(&self, step: Step) -> StepInput {
        match step {
            Step::One => StepInput::Personal(self.personal.clone()),
            Step::Two => StepInput::FamilyFinancial(self.family.clone()),
            Step::Three => StepInput::Situations(self.situations.clone()),
        }
    }

    fn text_slot(&self, field: FieldId) -> Option<&String> {
        let slot = match field {
            FieldId::Name => &self.personal.name,
            FieldId::NationalId => &self.personal.national_id,
            FieldId::DateOfBirth => &self.personal.date_of_birth,
            FieldId::Phone => &self.personal.phone,
            FieldId::Email => &self.personal.email,
            FieldId::Address => &self.personal.address,
            FieldId::City => &self.personal.city,
            FieldId::State => &self.personal.state,
            FieldId::Country => &self.personal.country,
            FieldId::Dependents => &self.family.dependents,
            FieldId::MonthlyIncome => &self.family.monthly_income,
            FieldId::CurrentFinancialSituation => &self.situations.current_financial_situation,
            FieldId::EmploymentCircumstances => &self.situations.employment_circumstances,
            FieldId::ReasonForApplying => &self.situations.reason_for_applying,
            FieldId::Gender
            | FieldId::MaritalStatus
            | FieldId::EmploymentStatus
            | FieldId::HousingStatus => return None,
        };
        Some(slot)
    }

    fn text_slot_mut(&mut self, field: FieldId) -> Option<&mut String> {
        let slot = match field {
            FieldId::Name => &mut self.personal.name,
            FieldId::NationalId => &mut self.personal.national_id,
            FieldId::DateOfBirth => &mut self.personal.date_of_birth,
            FieldId::Phone => &mut self.personal.phone,
            FieldId::Email => &mut self.personal.email,
            FieldId::Address => &mut self.personal.address,
            FieldId::City => &mut self.personal.city,
            FieldId::State => &mut self.personal.state,
            FieldId::Country => &mut self.personal.country,
            FieldId::Dependents => &mut self.family.dependents,
            FieldId::MonthlyIncome => &mut self.family.monthly_income,
            FieldId::CurrentFinancialSituation => {
                &mut self.situations.current_financial_situation
            }
            FieldId::EmploymentCircumstances => &mut self.situations.employment_circumstances,
            FieldId::ReasonForApplying => &mut self.situations.reason_for_applying,
            FieldId::Gender
            | FieldId::MaritalStatus
            | FieldId::EmploymentStatus
            | FieldId::HousingStatus => return None,
        };
        Some(slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionStatus {
    Loading,
    Ready,
    Failed(AiError),
}

/// The open "help me write" dialog.
///
/// `ticket` identifies the request that may fill it; results carrying any
/// other ticket are stale and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionDialog {
    pub field: FieldId,
    pub ticket: u64,
    pub status: SuggestionStatus,
    pub buffer: InputBuffer,
}

impl SuggestionDialog {
    pub fn is_loading(&self) -> bool {
        self.status == SuggestionStatus::Loading
    }

    /// Accepting needs a finished request and some text to accept.
    pub fn can_accept(&self) -> bool {
        !self.is_loading() && !self.buffer.text().trim().is_empty()
    }
}

/// Main application state containing the wizard and UI state.
///
/// The UI loop is the only writer. Background work reaches it as
/// [`BackgroundEvent`]s and is started by returning an [`Effect`].
#[derive(Debug)]
pub struct App {
    /// Step machine and the persisted draft behind it
    pub wizard: Wizard,
    /// Unsaved form contents for every step
    pub forms: StepForms,
    /// Current application mode
    pub mode: AppMode,
    /// Index of the focused field within the current step
    pub focus: usize,
    /// Input buffer for editing mode
    pub input: InputBuffer,
    /// Validation messages from the last rejected step
    pub field_errors: FieldErrors,
    /// Temporary status message to display
    pub notification: Option<Notification>,
    /// Open suggestion dialog, if any
    pub suggestion: Option<SuggestionDialog>,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Panic message shown on the crash screen
    pub crash_message: Option<String>,
    next_ticket: u64,
}

impl App {
    pub fn new(wizard: Wizard) -> Self {
        let forms = StepForms::from_data(&wizard.draft().data);
        Self {
            wizard,
            forms,
            mode: AppMode::Normal,
            focus: 0,
            input: InputBuffer::default(),
            field_errors: FieldErrors::new(),
            notification: None,
            suggestion: None,
            help_scroll: 0,
            crash_message: None,
            next_ticket: 0,
        }
    }

    pub fn step(&self) -> Step {
        self.wizard.step()
    }

    /// The field under the cursor.
    pub fn focused_field(&self) -> FieldId {
        let fields = self.step().fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    /// Whether pressing `q` should leave the application.
    pub fn can_quit(&self) -> bool {
        matches!(self.mode, AppMode::Normal | AppMode::Crashed)
    }

    pub fn focus_next(&mut self) {
        let len = self.step().fields().len();
        self.focus = (self.focus + 1) % len;
    }

    pub fn focus_previous(&mut self) {
        let len = self.step().fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn focus_field(&mut self, field: FieldId) {
        if let Some(index) = self.step().fields().iter().position(|f| *f == field) {
            self.focus = index;
        }
    }

    /// Switches to editing mode for the focused field.
    ///
    /// Choice fields have nothing to type, so they advance to the next
    /// option instead.
    pub fn start_editing(&mut self) {
        let field = self.focused_field();
        if field.kind() == FieldKind::Choice {
            self.cycle_choice(true);
            return;
        }
        self.input = InputBuffer::new(self.forms.value(field));
        self.mode = AppMode::Editing;
    }

    /// Writes the input buffer into the focused field and returns to normal mode.
    pub fn finish_editing(&mut self) {
        let field = self.focused_field();
        let text = std::mem::take(&mut self.input).into_text();
        self.forms.set_text(field, text);
        self.field_errors.remove(field);
        self.mode = AppMode::Normal;
    }

    /// Cancels editing and returns to normal mode without changing the field.
    pub fn cancel_editing(&mut self) {
        self.input = InputBuffer::default();
        self.mode = AppMode::Normal;
    }

    /// Cycles the focused field when it is a choice.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = self.focused_field();
        if field.kind() == FieldKind::Choice {
            self.forms.cycle_choice(field, forward);
            self.field_errors.remove(field);
        }
    }

    /// Empties the focused text field.
    pub fn clear_field(&mut self) {
        let field = self.focused_field();
        self.forms.set_text(field, String::new());
    }

    /// Validates the current step and moves on, or starts the submission on
    /// the last step.
    ///
    /// # Returns
    ///
    /// `Some(Effect::Submit)` when the application should be sent.
    pub fn next_step(&mut self, today: NaiveDate) -> Option<Effect> {
        let input = self.forms.input_for(self.step());
        match self.wizard.advance(input, today) {
            Ok(Advance::Moved(step)) => {
                tracing::debug!(%step, "advanced");
                self.enter_step();
                None
            }
            Ok(Advance::ReadyToSubmit(data)) => {
                self.field_errors = FieldErrors::new();
                self.mode = AppMode::Submitting;
                Some(Effect::Submit(data))
            }
            Err(WizardError::Invalid(errors)) => {
                if let Some(first) = errors.fields().next() {
                    self.focus_field(first);
                }
                self.notification = Some(Notification::error(format!(
                    "Please fix {} highlighted field(s) before continuing",
                    errors.len()
                )));
                self.field_errors = errors;
                None
            }
            Err(error) => {
                tracing::warn!(%error, "advance rejected");
                None
            }
        }
    }

    /// Returns to the previous step. Unsaved edits on the current step are dropped.
    pub fn previous_step(&mut self) {
        let before = self.step();
        if self.wizard.back() != before {
            self.enter_step();
        }
    }

    /// Opens the suggestion dialog for the focused field.
    ///
    /// # Returns
    ///
    /// The request to run, or `None` when the field offers no suggestions.
    pub fn open_suggestion(&mut self) -> Option<Effect> {
        let field = self.focused_field();
        if !field.supports_suggestions() {
            self.notification = Some(Notification::info(
                "Writing help is available on the free-text fields of step 3",
            ));
            return None;
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let mut request = SuggestionRequest::new(field, self.forms.value(field));
        if let Some(context) = self.suggestion_context() {
            request = request.with_context(context);
        }

        self.suggestion = Some(SuggestionDialog {
            field,
            ticket,
            status: SuggestionStatus::Loading,
            buffer: InputBuffer::default(),
        });
        self.mode = AppMode::Suggestion;
        Some(Effect::RequestSuggestion { ticket, request })
    }

    /// Closes the suggestion dialog without touching the field.
    ///
    /// A request still running is cancelled.
    pub fn close_suggestion(&mut self) -> Option<Effect> {
        let dialog = self.suggestion.take()?;
        self.mode = AppMode::Normal;
        dialog.is_loading().then_some(Effect::CancelSuggestion)
    }

    /// Copies the dialog text into its field. With `and_edit` the field is
    /// opened for editing straight away.
    pub fn accept_suggestion(&mut self, and_edit: bool) {
        let Some(dialog) = self.suggestion.take_if(|dialog| dialog.can_accept()) else {
            return;
        };
        self.forms.set_text(dialog.field, dialog.buffer.into_text());
        self.field_errors.remove(dialog.field);
        self.focus_field(dialog.field);
        self.mode = AppMode::Normal;
        if and_edit {
            self.start_editing();
        }
    }

    /// Applies a completion coming back from a background task.
    pub fn handle_background_event(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::SuggestionFinished { ticket, result } => {
                let Some(dialog) = self
                    .suggestion
                    .as_mut()
                    .filter(|dialog| dialog.ticket == ticket && dialog.is_loading())
                else {
                    tracing::debug!(ticket, "dropping stale suggestion");
                    return;
                };
                match result {
                    Ok(text) => {
                        dialog.buffer = InputBuffer::new(text);
                        dialog.status = SuggestionStatus::Ready;
                    }
                    Err(error) => dialog.status = SuggestionStatus::Failed(error),
                }
            }
            BackgroundEvent::SubmissionFinished(result) => {
                self.wizard.finish_submission(&result);
                self.notification = Some(match &result {
                    Ok(receipt) => Notification::success(format!(
                        "Application submitted successfully. Reference {}",
                        receipt.reference
                    )),
                    Err(error) => Notification::error(format!("Submission failed: {error}")),
                });
                if self.mode == AppMode::Submitting {
                    self.mode = AppMode::Normal;
                }
                if result.is_ok() {
                    self.enter_step();
                }
            }
        }
    }

    /// Re-reads the saved draft and leaves any overlay or crash screen.
    ///
    /// A submission still in flight keeps the submitting screen up until its
    /// outcome arrives.
    pub fn reload(&mut self) {
        self.wizard.reload();
        self.suggestion = None;
        self.crash_message = None;
        self.input = InputBuffer::default();
        self.mode = if self.wizard.is_submitting() {
            AppMode::Submitting
        } else {
            AppMode::Normal
        };
        self.enter_step();
        self.notification = Some(Notification::info("Reloaded the saved application"));
    }

    /// Switches to the crash screen.
    pub fn crash(&mut self, message: impl Into<String>) {
        self.crash_message = Some(message.into());
        self.suggestion = None;
        self.mode = AppMode::Crashed;
    }

    pub fn open_help(&mut self) {
        self.help_scroll = 0;
        self.mode = AppMode::Help;
    }

    pub fn close_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Resets the form buffers to the stored draft for a freshly entered step.
    fn enter_step(&mut self) {
        self.forms = StepForms::from_data(&self.wizard.draft().data);
        self.field_errors = FieldErrors::new();
        self.focus = 0;
    }

    fn suggestion_context(&self) -> Option<String> {
        let family = &self.wizard.draft().data.family_financial;
        let mut parts = Vec::new();
        if family.employment_status.is_specified() {
            parts.push(format!("Employment status: {}", family.employment_status.label()));
        }
        if family.housing_status.is_specified() {
            parts.push(format!("Housing: {}", family.housing_status.label()));
        }
        if let Some(dependents) = family.dependents {
            parts.push(format!("Dependents: {dependents}"));
        }
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::DraftState;
    use crate::domain::{EmploymentStatus, Gender, MSG_REQUIRED};
    use crate::infrastructure::{JsonStore, SubmissionReceipt};
    use crate::domain::SubmissionError;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn app(dir: &TempDir) -> App {
        App::new(Wizard::new(DraftState::load(JsonStore::new(dir.path()))))
    }

    fn fill_personal(app: &mut App) {
        app.forms.personal = PersonalInformation {
            name: "Layla Haddad".to_string(),
            national_id: "784-1988-1234567-1".to_string(),
            date_of_birth: "1988-03-14".to_string(),
            gender: Gender::Female,
            address: "12 Palm Street".to_string(),
            city: "Dubai".to_string(),
            state: "Dubai".to_string(),
            country: "UAE".to_string(),
            phone: "+971501234567".to_string(),
            email: "layla@example.com".to_string(),
        };
    }

    fn fill_family(app: &mut App) {
        app.forms.family.marital_status = crate::domain::MaritalStatus::Married;
        app.forms.family.dependents = "2".to_string();
        app.forms.family.employment_status = EmploymentStatus::Unemployed;
        app.forms.family.monthly_income = "1500.50".to_string();
        app.forms.family.housing_status = crate::domain::HousingStatus::Rent;
    }

    fn fill_situations(app: &mut App) {
        app.forms.situations = SituationDescriptions {
            current_financial_situation: "Savings are gone.".to_string(),
            employment_circumstances: "Laid off in March.".to_string(),
            reason_for_applying: "Rent and groceries.".to_string(),
        };
    }

    fn go_to_step_three(app: &mut App) {
        fill_personal(app);
        assert_eq!(app.next_step(today()), None);
        fill_family(app);
        assert_eq!(app.next_step(today()), None);
        assert_eq!(app.step(), Step::Three);
    }

    #[test]
    fn test_input_buffer_handles_multibyte_text() {
        let mut buffer = InputBuffer::new("café");
        assert_eq!(buffer.cursor(), 4);
        buffer.backspace();
        assert_eq!(buffer.text(), "caf");
        buffer.home();
        buffer.insert('ñ');
        assert_eq!(buffer.text(), "ñcaf");
        buffer.right();
        buffer.delete();
        assert_eq!(buffer.text(), "ñcf");
        assert_eq!(buffer.split_at_cursor(), ("ñc", "f"));
        buffer.end();
        buffer.right();
        assert_eq!(buffer.cursor(), 3);
    }

    #[test]
    fn test_editing_commits_into_form_only() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.start_editing();
        assert_eq!(app.mode, AppMode::Editing);
        for c in "Layla".chars() {
            app.input.insert(c);
        }
        app.finish_editing();

        assert_eq!(app.forms.personal.name, "Layla");
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.wizard.draft().data.personal.name, "");
    }

    #[test]
    fn test_cancel_editing_keeps_old_value() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.forms.personal.name = "Before".to_string();
        app.start_editing();
        app.input.insert('!');
        app.cancel_editing();
        assert_eq!(app.forms.personal.name, "Before");
    }

    #[test]
    fn test_choice_fields_cycle_instead_of_editing() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.focus_field(FieldId::Gender);
        app.start_editing();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.forms.personal.gender, Gender::Male);
        app.cycle_choice(false);
        assert_eq!(app.forms.personal.gender, Gender::Unspecified);
    }

    #[test]
    fn test_invalid_step_focuses_first_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        fill_personal(&mut app);
        app.forms.personal.name.clear();
        app.focus_field(FieldId::Email);

        assert_eq!(app.next_step(today()), None);
        assert_eq!(app.step(), Step::One);
        assert_eq!(app.focused_field(), FieldId::Name);
        assert_eq!(app.field_errors.get(FieldId::Name), Some(MSG_REQUIRED));
        assert_eq!(
            app.notification.as_ref().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
    }

    #[test]
    fn test_steps_reload_forms_from_draft() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        assert_eq!(app.forms.family.monthly_income, "1500.5");

        app.forms.situations.reason_for_applying = "unsaved".to_string();
        app.previous_step();
        assert_eq!(app.step(), Step::Two);
        assert_eq!(app.forms.situations.reason_for_applying, "");
        assert_eq!(app.focus, 0);
    }

    #[test]
    fn test_suggestion_only_on_free_text_fields() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert_eq!(app.open_suggestion(), None);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.notification.is_some());
    }

    #[test]
    fn test_suggestion_round_trip_with_context() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        app.forms.situations.current_financial_situation = "I lost my job".to_string();

        let Some(Effect::RequestSuggestion { ticket, request }) = app.open_suggestion() else {
            panic!("expected a suggestion request");
        };
        assert_eq!(request.field, FieldId::CurrentFinancialSituation);
        assert_eq!(request.current_text, "I lost my job");
        assert_eq!(
            request.context.as_deref(),
            Some("Employment status: Unemployed; Housing: Renting; Dependents: 2")
        );
        assert_eq!(app.mode, AppMode::Suggestion);

        app.handle_background_event(BackgroundEvent::SuggestionFinished {
            ticket,
            result: Ok("I recently lost my job.".to_string()),
        });
        let dialog = app.suggestion.as_ref().unwrap();
        assert_eq!(dialog.status, SuggestionStatus::Ready);
        assert!(dialog.can_accept());

        app.accept_suggestion(false);
        assert_eq!(
            app.forms.situations.current_financial_situation,
            "I recently lost my job."
        );
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.suggestion.is_none());
        assert_eq!(app.wizard.draft().data.situations.current_financial_situation, "");
    }

    #[test]
    fn test_accept_and_edit_opens_editor() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        app.focus_field(FieldId::ReasonForApplying);
        let Some(Effect::RequestSuggestion { ticket, .. }) = app.open_suggestion() else {
            panic!("expected a suggestion request");
        };
        app.handle_background_event(BackgroundEvent::SuggestionFinished {
            ticket,
            result: Ok("Help with rent".to_string()),
        });

        app.accept_suggestion(true);
        assert_eq!(app.mode, AppMode::Editing);
        assert_eq!(app.focused_field(), FieldId::ReasonForApplying);
        assert_eq!(app.input.text(), "Help with rent");
    }

    #[test]
    fn test_stale_suggestion_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        let Some(Effect::RequestSuggestion { ticket: first, .. }) = app.open_suggestion() else {
            panic!("expected a suggestion request");
        };
        assert_eq!(app.close_suggestion(), Some(Effect::CancelSuggestion));
        let Some(Effect::RequestSuggestion { ticket: second, .. }) = app.open_suggestion() else {
            panic!("expected a suggestion request");
        };
        assert_ne!(first, second);

        app.handle_background_event(BackgroundEvent::SuggestionFinished {
            ticket: first,
            result: Ok("old".to_string()),
        });
        assert!(app.suggestion.as_ref().unwrap().is_loading());

        app.close_suggestion();
        app.handle_background_event(BackgroundEvent::SuggestionFinished {
            ticket: second,
            result: Ok("late".to_string()),
        });
        assert!(app.suggestion.is_none());
        assert_eq!(app.forms.situations.current_financial_situation, "");
    }

    #[test]
    fn test_failed_suggestion_allows_typing_own_text() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        let Some(Effect::RequestSuggestion { ticket, .. }) = app.open_suggestion() else {
            panic!("expected a suggestion request");
        };
        app.handle_background_event(BackgroundEvent::SuggestionFinished {
            ticket,
            result: Err(AiError::Timeout),
        });

        let dialog = app.suggestion.as_mut().unwrap();
        assert_eq!(dialog.status, SuggestionStatus::Failed(AiError::Timeout));
        assert!(!dialog.can_accept());
        dialog.buffer.insert('x');
        assert!(dialog.can_accept());
        assert_eq!(app.close_suggestion(), None);
    }

    #[test]
    fn test_submission_success_resets_wizard() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        fill_situations(&mut app);

        let Some(Effect::Submit(data)) = app.next_step(today()) else {
            panic!("expected submission");
        };
        assert_eq!(data.personal.name, "Layla Haddad");
        assert_eq!(app.mode, AppMode::Submitting);

        app.handle_background_event(BackgroundEvent::SubmissionFinished(Ok(SubmissionReceipt {
            reference: Uuid::new_v4(),
            submitted_at: Utc::now(),
        })));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.step(), Step::One);
        assert_eq!(app.forms, StepForms::default());
        assert_eq!(
            app.notification.as_ref().map(|n| n.kind),
            Some(NotificationKind::Success)
        );
    }

    #[test]
    fn test_submission_failure_keeps_answers() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        fill_situations(&mut app);
        app.next_step(today());

        app.handle_background_event(BackgroundEvent::SubmissionFinished(Err(
            SubmissionError::Network("Random simulated network failure".to_string()),
        )));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.step(), Step::Three);
        assert_eq!(app.forms.situations.reason_for_applying, "Rent and groceries.");
        let notification = app.notification.as_ref().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.message.contains("Random simulated network failure"));
    }

    #[test]
    fn test_reload_after_crash_restores_saved_draft() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        fill_personal(&mut app);
        app.next_step(today());
        app.forms.family.dependents = "unsaved".to_string();

        app.crash("boom");
        assert_eq!(app.mode, AppMode::Crashed);
        assert!(app.can_quit());

        app.reload();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.step(), Step::Two);
        assert_eq!(app.forms.family.dependents, "");
        assert_eq!(app.forms.personal.name, "Layla Haddad");
        assert!(app.crash_message.is_none());
    }

    #[test]
    fn test_reload_during_submission_waits_for_outcome() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        go_to_step_three(&mut app);
        fill_situations(&mut app);
        assert!(matches!(app.next_step(today()), Some(Effect::Submit(_))));

        app.crash("boom");
        app.reload();
        assert_eq!(app.mode, AppMode::Submitting);
        assert!(!app.can_quit());
        assert_eq!(app.next_step(today()), None);

        app.handle_background_event(BackgroundEvent::SubmissionFinished(Ok(SubmissionReceipt {
            reference: Uuid::new_v4(),
            submitted_at: Utc::now(),
        })));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.step(), Step::One);
        assert_eq!(app.forms, StepForms::default());
    }
}
