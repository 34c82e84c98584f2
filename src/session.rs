//! OnboardingSession — coordinates draft state, validation, persistence,
//! and submission for one wizard invocation.
//!
//! The hosting screen constructs a session, calls `load` to rehydrate any
//! saved draft, and tears the session down (dropping it cancels the pending
//! debounced save). One session per wizard invocation; there is no global
//! instance.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::OnboardingConfig;
use crate::draft::{
    DiseaseHistoryPatch, MedicationPatch, MedicationsPatch, PersonalInfoPatch, TestResultPatch,
};
use crate::error::SubmitError;
use crate::model::OnboardingPayload;
use crate::persist::{DebouncedSaver, DraftEnvelope, load_draft};
use crate::state::{WizardState, WizardStep};
use crate::storage::{DraftStorage, storage_keys};
use crate::submit::OnboardingSubmitter;
use crate::validate::{self, FieldKey, ValidationErrors};

/// Result of a `next_step` call.
#[derive(Debug)]
pub enum StepOutcome {
    /// Validation passed and the wizard moved to this step.
    Advanced(WizardStep),
    /// Validation failed; the wizard stays put and these errors are now
    /// standing.
    Rejected(ValidationErrors),
    /// The review step submitted successfully; the success screen is up.
    Submitted,
    /// The submit collaborator failed; draft and step are unchanged so the
    /// user can retry. Hosts surface this as a notification.
    SubmitFailed(SubmitError),
    /// A submission is already in flight; the call was ignored.
    Busy,
}

/// One wizard invocation: draft store, wizard controller, and submission
/// pipeline behind a single handle.
pub struct OnboardingSession {
    storage: Arc<dyn DraftStorage>,
    submitter: Arc<dyn OnboardingSubmitter>,
    state: RwLock<WizardState>,
    saver: DebouncedSaver,
}

impl OnboardingSession {
    pub fn new(
        storage: Arc<dyn DraftStorage>,
        submitter: Arc<dyn OnboardingSubmitter>,
        config: OnboardingConfig,
    ) -> Self {
        let saver = DebouncedSaver::new(Arc::clone(&storage), config.save_debounce);
        Self {
            storage,
            submitter,
            state: RwLock::new(WizardState::default()),
            saver,
        }
    }

    /// Rehydrate sections from a previously saved draft, if one exists.
    /// Best-effort: on any failure the session keeps its empty state.
    pub async fn load(&self) {
        let Some(envelope) = load_draft(self.storage.as_ref()).await else {
            return;
        };
        let mut state = self.state.write().await;
        state.personal_info = envelope.personal_info;
        state.disease_history = envelope.disease_history;
        state.medications = envelope.medications;
        state.final_confirmation = envelope.final_confirmation;
        tracing::debug!("Rehydrated onboarding draft from storage");
    }

    /// Clone of the full wizard state, for rendering.
    pub async fn snapshot(&self) -> WizardState {
        self.state.read().await.clone()
    }

    pub async fn current_step(&self) -> WizardStep {
        self.state.read().await.step
    }

    pub async fn errors(&self) -> ValidationErrors {
        self.state.read().await.errors.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.state.read().await.is_submitting
    }

    pub async fn show_success(&self) -> bool {
        self.state.read().await.show_success
    }

    /// Cancel the pending debounced save. Called on teardown; dropping the
    /// session has the same effect.
    pub async fn close(&self) {
        self.saver.cancel().await;
    }

    // ── Draft store ─────────────────────────────────────────────────

    async fn schedule_save(&self, state: &WizardState) {
        self.saver.schedule(DraftEnvelope::snapshot(state)).await;
    }

    /// Merge a personal-info patch, reconcile errors for the touched
    /// fields, and schedule a save.
    pub async fn set_personal_info(&self, patch: PersonalInfoPatch) {
        let mut state = self.state.write().await;
        let touched = state.personal_info.apply(patch);
        let fresh = validate::validate_personal_info(&state.personal_info);
        state.errors = validate::reconcile(fresh, &touched, &state.errors);
        self.schedule_save(&state).await;
    }

    /// Merge a disease-history patch, reconcile errors, schedule a save.
    pub async fn set_disease_history(&self, patch: DiseaseHistoryPatch) {
        let mut state = self.state.write().await;
        let touched = state.disease_history.apply(patch);
        let fresh = validate::validate_disease_history(&state.disease_history);
        state.errors = validate::reconcile(fresh, &touched, &state.errors);
        self.schedule_save(&state).await;
    }

    /// Merge a medications patch, reconcile errors, schedule a save.
    pub async fn set_medications(&self, patch: MedicationsPatch) {
        let mut state = self.state.write().await;
        let touched = state.medications.apply(patch);
        let fresh = validate::validate_medications(&state.medications);
        state.errors = validate::reconcile(fresh, &touched, &state.errors);
        self.schedule_save(&state).await;
    }

    /// Edit one test-result entry in place.
    pub async fn update_test_result(&self, index: usize, patch: TestResultPatch) {
        let mut state = self.state.write().await;
        let touched = state.disease_history.update_test_result(index, patch);
        let fresh = validate::validate_disease_history(&state.disease_history);
        state.errors = validate::reconcile(fresh, &touched, &state.errors);
        self.schedule_save(&state).await;
    }

    /// Edit one medication entry in place.
    pub async fn update_medication(&self, index: usize, patch: MedicationPatch) {
        let mut state = self.state.write().await;
        let touched = state.medications.update_medication(index, patch);
        let fresh = validate::validate_medications(&state.medications);
        state.errors = validate::reconcile(fresh, &touched, &state.errors);
        self.schedule_save(&state).await;
    }

    /// Set the review-step confirmation flag. Confirming clears the
    /// standing general error.
    pub async fn set_final_confirmation(&self, value: bool) {
        let mut state = self.state.write().await;
        state.final_confirmation = value;
        if value {
            state.errors.remove(FieldKey::General);
        }
        self.schedule_save(&state).await;
    }

    /// Append a blank test result. No validation runs; the blank entry
    /// surfaces errors at step-advance time.
    pub async fn add_test_result(&self) {
        let mut state = self.state.write().await;
        state.disease_history.add_test_result();
        self.schedule_save(&state).await;
    }

    /// Remove the test result at `index`.
    pub async fn remove_test_result(&self, index: usize) {
        let mut state = self.state.write().await;
        state.disease_history.remove_test_result(index);
        self.schedule_save(&state).await;
    }

    /// Append a blank medication entry. No validation runs.
    pub async fn add_medication(&self) {
        let mut state = self.state.write().await;
        state.medications.add_medication();
        self.schedule_save(&state).await;
    }

    /// Remove the medication at `index`.
    pub async fn remove_medication(&self, index: usize) {
        let mut state = self.state.write().await;
        state.medications.remove_medication(index);
        self.schedule_save(&state).await;
    }

    // ── Wizard controller ───────────────────────────────────────────

    /// Jump straight to `step` without validation. Used by the review
    /// screen's "edit this section" links.
    pub async fn set_current_step(&self, step: WizardStep) {
        self.state.write().await.step = step;
    }

    /// Clear all standing errors.
    pub async fn clear_errors(&self) {
        self.state.write().await.errors.clear();
    }

    /// Validate the current step and advance, or submit from the review
    /// step. On validation failure the error map is replaced with the
    /// fresh failure set and the wizard stays put.
    pub async fn next_step(&self) -> StepOutcome {
        let mut state = self.state.write().await;
        if state.is_submitting {
            return StepOutcome::Busy;
        }

        let errors = validate::validate_step(&state);
        if !errors.is_empty() {
            state.errors = errors.clone();
            return StepOutcome::Rejected(errors);
        }
        state.errors.clear();

        match state.step.next() {
            Some(next) => {
                state.step = next;
                tracing::debug!("Onboarding advanced to step {next}");
                StepOutcome::Advanced(next)
            }
            None => self.submit(state).await,
        }
    }

    /// Step back without validation. Always clears errors; a no-op at
    /// step 1.
    pub async fn previous_step(&self) {
        let mut state = self.state.write().await;
        if let Some(prev) = state.step.previous() {
            state.step = prev;
            state.errors.clear();
        }
    }

    /// Dismiss the success screen. The caller is expected to navigate away
    /// from the wizard after this.
    pub async fn on_success_complete(&self) {
        self.state.write().await.show_success = false;
    }

    // ── Submission pipeline ─────────────────────────────────────────

    async fn submit(
        &self,
        mut state: tokio::sync::RwLockWriteGuard<'_, WizardState>,
    ) -> StepOutcome {
        // Defense in depth: validate the whole draft again even though each
        // step was gated on the way here.
        let payload = match OnboardingPayload::assemble(&state) {
            Ok(payload) => payload,
            Err(errors) => {
                state.errors = errors.clone();
                return StepOutcome::Rejected(errors);
            }
        };

        state.is_submitting = true;
        drop(state);

        let result = self.submitter.submit(&payload).await;

        match result {
            Ok(()) => {
                // Draft cleanup happens exactly once, here. A pending
                // debounced save must not resurrect the cleared draft.
                self.saver.cancel().await;
                if let Err(e) = self.storage.remove(storage_keys::DRAFT).await {
                    tracing::warn!("Failed to clear onboarding draft after submit: {e}");
                }
                if let Err(e) = self
                    .storage
                    .set(storage_keys::COMPLETED, storage_keys::COMPLETED_SENTINEL)
                    .await
                {
                    tracing::warn!("Failed to set onboarding completion marker: {e}");
                }
                let mut state = self.state.write().await;
                state.is_submitting = false;
                state.show_success = true;
                StepOutcome::Submitted
            }
            Err(e) => {
                tracing::warn!("Onboarding submission failed: {e}");
                let mut state = self.state.write().await;
                state.is_submitting = false;
                StepOutcome::SubmitFailed(e)
            }
        }
    }

    // ── Completion marker ───────────────────────────────────────────

    /// Whether onboarding has already been completed on this installation.
    /// Storage failures default to "not completed".
    pub async fn is_completed(&self) -> bool {
        match self.storage.get(storage_keys::COMPLETED).await {
            Ok(value) => value.as_deref() == Some(storage_keys::COMPLETED_SENTINEL),
            Err(e) => {
                tracing::warn!("Failed to read onboarding completion marker: {e}");
                false
            }
        }
    }

    /// Clear the completion marker. Developer/test affordance: the only
    /// path that re-enables the wizard for a user who already finished.
    pub async fn reset_completed(&self) {
        if let Err(e) = self.storage.remove(storage_keys::COMPLETED).await {
            tracing::warn!("Failed to reset onboarding completion marker: {e}");
        }
    }
}

// Note: session behavior is covered by the end-to-end tests in
// `tests/wizard_flow.rs`, which drive a real session against in-memory
// collaborators. The validation, draft, and persistence building blocks
// are tested in their own modules.
