//! The single authoritative application draft and its persistence.

use crate::domain::{ApplicationDraft, SectionUpdate, Step};
use crate::infrastructure::JsonStore;

/// Key the draft is persisted under.
pub const DRAFT_KEY: &str = "socialSupportApp";

/// Owns the draft and writes the whole record to the store after every
/// mutation. Write failures never reach the caller; the in-memory draft
/// stays authoritative.
#[derive(Debug)]
pub struct DraftState {
    draft: ApplicationDraft,
    store: JsonStore,
}

impl DraftState {
    /// Restores the persisted draft, or starts from defaults.
    pub fn load(store: JsonStore) -> Self {
        let draft = store.load(DRAFT_KEY, ApplicationDraft::default());
        tracing::debug!(step = %draft.current_step, "draft loaded");
        Self { draft, store }
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn step(&self) -> Step {
        self.draft.current_step
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Replaces exactly one section.
    pub fn update_section(&mut self, update: SectionUpdate) {
        tracing::debug!(section = update.section().key(), "section updated");
        let data = &mut self.draft.data;
        match update {
            SectionUpdate::Personal(personal) => data.personal = personal,
            SectionUpdate::FamilyFinancial(family) => data.family_financial = family,
            SectionUpdate::Situations(situations) => data.situations = situations,
        }
        self.persist();
    }

    pub fn set_step(&mut self, step: Step) {
        tracing::debug!(from = %self.draft.current_step, to = %step, "step changed");
        self.draft.current_step = step;
        self.persist();
    }

    pub fn reset(&mut self) {
        tracing::info!("draft reset");
        self.draft = ApplicationDraft::default();
        self.persist();
    }

    /// Throws away in-memory state and re-reads the store.
    pub fn reload(&mut self) {
        self.draft = self.store.load(DRAFT_KEY, ApplicationDraft::default());
    }

    fn persist(&self) {
        self.store.save(DRAFT_KEY, &self.draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        FamilyFinancialInformation, Gender, HousingStatus, PersonalInformation,
        SituationDescriptions,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn personal() -> PersonalInformation {
        PersonalInformation {
            name: "Omar Saleh".to_string(),
            gender: Gender::Male,
            email: "omar@example.com".to_string(),
            ..PersonalInformation::default()
        }
    }

    #[test]
    fn test_update_section_replaces_only_that_section() {
        let dir = TempDir::new().unwrap();
        let mut state = DraftState::load(JsonStore::new(dir.path()));
        state.update_section(SectionUpdate::Situations(SituationDescriptions {
            reason_for_applying: "rent arrears".to_string(),
            ..SituationDescriptions::default()
        }));
        let before = state.draft().clone();

        state.update_section(SectionUpdate::Personal(personal()));

        let after = state.draft();
        assert_eq!(after.data.personal, personal());
        assert_eq!(after.data.family_financial, before.data.family_financial);
        assert_eq!(after.data.situations, before.data.situations);
        assert_eq!(after.current_step, before.current_step);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut state = DraftState::load(JsonStore::new(dir.path()));
        state.update_section(SectionUpdate::FamilyFinancial(FamilyFinancialInformation {
            dependents: Some(3),
            monthly_income: Some(0.0),
            housing_status: HousingStatus::WithFamily,
            ..FamilyFinancialInformation::default()
        }));
        state.set_step(Step::Three);

        let reopened = DraftState::load(JsonStore::new(dir.path()));
        assert_eq!(reopened.draft(), state.draft());
        assert_eq!(reopened.step(), Step::Three);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let dir = TempDir::new().unwrap();
        let mut state = DraftState::load(JsonStore::new(dir.path()));
        state.update_section(SectionUpdate::Personal(personal()));
        state.set_step(Step::Two);

        state.reset();
        assert_eq!(state.draft(), &ApplicationDraft::default());
        assert_eq!(state.step(), Step::One);

        let reopened = DraftState::load(JsonStore::new(dir.path()));
        assert_eq!(reopened.draft(), &ApplicationDraft::default());
    }

    #[test]
    fn test_malformed_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(store.path_for(DRAFT_KEY), "[1, 2").unwrap();

        let state = DraftState::load(store);
        assert_eq!(state.draft(), &ApplicationDraft::default());
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let store = JsonStore::new(&blocker).with_error_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut state = DraftState::load(store);
        state.update_section(SectionUpdate::Personal(personal()));
        state.set_step(Step::Two);

        assert_eq!(failures.load(Ordering::SeqCst), 2);
        assert_eq!(state.draft().data.personal, personal());
        assert_eq!(state.step(), Step::Two);
    }

    #[test]
    fn test_reload_discards_unsaved_memory() {
        let dir = TempDir::new().unwrap();
        let mut state = DraftState::load(JsonStore::new(dir.path()));
        state.update_section(SectionUpdate::Personal(personal()));

        let mut other = DraftState::load(JsonStore::new(dir.path()));
        other.set_step(Step::Three);

        state.reload();
        assert_eq!(state.step(), Step::Three);
        assert_eq!(state.draft().data.personal, personal());
    }
}
