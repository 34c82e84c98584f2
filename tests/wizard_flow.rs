//! End-to-end tests for the onboarding wizard session.
//!
//! Each test drives a real `OnboardingSession` against in-memory
//! collaborators: a key-value store and a stub submitter that records what
//! it was asked to submit.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use health_onboarding::draft::{
    DiseaseHistoryPatch, EmergencyContactPatch, MedicationPatch, PersonalInfoPatch,
};
use health_onboarding::model::{DiseaseStage, OnboardingPayload};
use health_onboarding::storage::storage_keys;
use health_onboarding::validate::{FieldKey, PersonalField};
use health_onboarding::{
    DraftStorage, MemoryStorage, OnboardingConfig, OnboardingSession, OnboardingSubmitter,
    StepOutcome, SubmitError, WizardStep,
};

/// Stub submit collaborator: counts calls, records the last payload, and
/// fails on demand.
struct StubSubmitter {
    fail: bool,
    calls: AtomicUsize,
    last_payload: Mutex<Option<OnboardingPayload>>,
}

impl StubSubmitter {
    fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnboardingSubmitter for StubSubmitter {
    async fn submit(&self, payload: &OnboardingPayload) -> Result<(), SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().await = Some(payload.clone());
        if self.fail {
            Err(SubmitError::Rejected {
                reason: "backend said no".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn session_with(
    storage: Arc<MemoryStorage>,
    submitter: Arc<StubSubmitter>,
) -> OnboardingSession {
    OnboardingSession::new(storage, submitter, OnboardingConfig::default())
}

fn valid_personal_patch() -> PersonalInfoPatch {
    PersonalInfoPatch {
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
        email: Some("jane@x.com".to_string()),
        phone: Some("(555) 123-4567".to_string()),
        emergency_contact: Some(EmergencyContactPatch {
            full_name: Some("John Doe".to_string()),
            relationship: Some("Spouse".to_string()),
            primary_phone: Some("(555) 765-4321".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn valid_disease_patch() -> DiseaseHistoryPatch {
    DiseaseHistoryPatch {
        primary_diagnosis: Some("Cirrhosis".to_string()),
        diagnosis_date: NaiveDate::from_ymd_opt(2023, 6, 15),
        disease_stage: Some(DiseaseStage::Moderate),
        ..Default::default()
    }
}

/// Fill every step with valid data and walk to the review step.
async fn walk_to_review(session: &OnboardingSession) {
    session.set_personal_info(valid_personal_patch()).await;
    assert!(matches!(
        session.next_step().await,
        StepOutcome::Advanced(WizardStep::DiseaseHistory)
    ));

    session.set_disease_history(valid_disease_patch()).await;
    assert!(matches!(
        session.next_step().await,
        StepOutcome::Advanced(WizardStep::Medications)
    ));

    // Empty medication list is valid.
    assert!(matches!(
        session.next_step().await,
        StepOutcome::Advanced(WizardStep::Review)
    ));
}

// ── Valid step 1 advances cleanly ───────────────────────────────────

#[tokio::test]
async fn valid_personal_info_advances_to_step_two() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );

    session.set_personal_info(valid_personal_patch()).await;
    let outcome = session.next_step().await;

    assert!(matches!(
        outcome,
        StepOutcome::Advanced(WizardStep::DiseaseHistory)
    ));
    assert_eq!(session.current_step().await, WizardStep::DiseaseHistory);
    assert!(session.errors().await.is_empty());
}

// ── Invalid phone blocks the advance ────────────────────────────────

#[tokio::test]
async fn invalid_phone_keeps_wizard_on_step_one() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );

    let mut patch = valid_personal_patch();
    patch.phone = Some("555-1234".to_string());
    session.set_personal_info(patch).await;

    let outcome = session.next_step().await;
    let StepOutcome::Rejected(errors) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };

    assert_eq!(session.current_step().await, WizardStep::PersonalInfo);
    assert_eq!(
        errors.get(FieldKey::Personal(PersonalField::Phone)),
        Some("Phone format: (XXX) XXX-XXXX")
    );
}

// ── Forward progress only with valid data ───────────────────────────

#[tokio::test]
async fn repeated_next_on_empty_draft_never_advances() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );

    for _ in 0..5 {
        assert!(matches!(session.next_step().await, StepOutcome::Rejected(_)));
        assert_eq!(session.current_step().await, WizardStep::PersonalInfo);
    }
}

// ── Back is always free and clears errors ───────────────────────────

#[tokio::test]
async fn previous_step_always_succeeds_and_clears_errors() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );
    walk_to_review(&session).await;

    // Pile up errors by failing the confirmation gate.
    assert!(matches!(session.next_step().await, StepOutcome::Rejected(_)));
    assert!(!session.errors().await.is_empty());

    session.previous_step().await;
    assert_eq!(session.current_step().await, WizardStep::Medications);
    assert!(session.errors().await.is_empty());

    session.previous_step().await;
    session.previous_step().await;
    assert_eq!(session.current_step().await, WizardStep::PersonalInfo);

    // Backing out of step 1 is a no-op.
    session.previous_step().await;
    assert_eq!(session.current_step().await, WizardStep::PersonalInfo);
}

// ── Fixing one field leaves the other's error standing ──────────────

#[tokio::test]
async fn fixing_one_field_keeps_the_other_error() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );

    let mut patch = valid_personal_patch();
    patch.email = Some("nope".to_string());
    patch.phone = Some("555-1234".to_string());
    session.set_personal_info(patch).await;
    assert!(matches!(session.next_step().await, StepOutcome::Rejected(_)));

    let errors = session.errors().await;
    assert!(errors.contains(FieldKey::Personal(PersonalField::Email)));
    assert!(errors.contains(FieldKey::Personal(PersonalField::Phone)));

    // Fix only the email.
    session
        .set_personal_info(PersonalInfoPatch {
            email: Some("jane@x.com".to_string()),
            ..Default::default()
        })
        .await;

    let errors = session.errors().await;
    assert!(!errors.contains(FieldKey::Personal(PersonalField::Email)));
    assert_eq!(
        errors.get(FieldKey::Personal(PersonalField::Phone)),
        Some("Phone format: (XXX) XXX-XXXX")
    );
}

// ── Mutations within the debounce window coalesce ───────────────────

#[tokio::test(start_paused = true)]
async fn burst_of_edits_persists_once_with_final_state() {
    let storage = Arc::new(MemoryStorage::new());
    let session = session_with(storage.clone(), Arc::new(StubSubmitter::succeeding()));

    for name in ["J", "Ja", "Jan", "Jane"] {
        session
            .set_personal_info(PersonalInfoPatch {
                first_name: Some(name.to_string()),
                ..Default::default()
            })
            .await;
    }

    // Nothing lands inside the quiet period.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(storage.get(storage_keys::DRAFT).await.unwrap().is_none());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let raw = storage.get(storage_keys::DRAFT).await.unwrap().unwrap();
    assert!(raw.contains("\"Jane\""));
    assert!(!raw.contains("\"Jan\","));
}

// ── Confirmation gate never reaches the submitter ───────────────────

#[tokio::test]
async fn submit_without_confirmation_sets_general_error() {
    let submitter = Arc::new(StubSubmitter::succeeding());
    let session = session_with(Arc::new(MemoryStorage::new()), submitter.clone());
    walk_to_review(&session).await;

    let outcome = session.next_step().await;
    let StepOutcome::Rejected(errors) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };

    assert_eq!(errors.get(FieldKey::General), Some("You must confirm to proceed"));
    assert_eq!(submitter.call_count(), 0);
    assert_eq!(session.current_step().await, WizardStep::Review);

    // Confirming clears the general error before any resubmit.
    session.set_final_confirmation(true).await;
    assert!(!session.errors().await.contains(FieldKey::General));
}

// ── Successful submission cleans up exactly once ────────────────────

#[tokio::test]
async fn successful_submission_clears_draft_and_sets_marker() {
    let storage = Arc::new(MemoryStorage::new());
    let submitter = Arc::new(StubSubmitter::succeeding());
    let session = session_with(storage.clone(), submitter.clone());

    walk_to_review(&session).await;
    session.set_final_confirmation(true).await;

    let outcome = session.next_step().await;
    assert!(matches!(outcome, StepOutcome::Submitted));

    assert!(session.show_success().await);
    assert!(!session.is_submitting().await);
    assert_eq!(submitter.call_count(), 1);

    let payload = submitter.last_payload.lock().await.clone().unwrap();
    assert_eq!(payload.personal_info.first_name, "Jane");
    assert_eq!(payload.disease_history.primary_diagnosis, "Cirrhosis");
    assert!(payload.final_confirmation);

    assert!(storage.get(storage_keys::DRAFT).await.unwrap().is_none());
    assert_eq!(
        storage.get(storage_keys::COMPLETED).await.unwrap().as_deref(),
        Some("true")
    );
    assert!(session.is_completed().await);

    // Dismissing the success screen resets the flag.
    session.on_success_complete().await;
    assert!(!session.show_success().await);
}

// ── Failed submission preserves everything ──────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_submission_preserves_draft_and_step() {
    let storage = Arc::new(MemoryStorage::new());
    let submitter = Arc::new(StubSubmitter::failing());
    let session = session_with(storage.clone(), submitter.clone());

    walk_to_review(&session).await;
    session.set_final_confirmation(true).await;

    // Let the debounced save land so there is a draft blob to preserve.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let saved = storage.get(storage_keys::DRAFT).await.unwrap().unwrap();

    let outcome = session.next_step().await;
    let StepOutcome::SubmitFailed(error) = outcome else {
        panic!("expected submit failure, got {outcome:?}");
    };
    assert!(error.to_string().contains("backend said no"));

    assert!(!session.is_submitting().await);
    assert!(!session.show_success().await);
    assert_eq!(session.current_step().await, WizardStep::Review);
    assert_eq!(
        storage.get(storage_keys::DRAFT).await.unwrap().as_deref(),
        Some(saved.as_str())
    );
    assert!(storage.get(storage_keys::COMPLETED).await.unwrap().is_none());
    assert_eq!(submitter.call_count(), 1);

    // The user can retry without re-entering anything; swap in a working
    // submitter to prove the draft is still intact.
    let retry = session.next_step().await;
    assert!(matches!(retry, StepOutcome::SubmitFailed(_)));
    assert_eq!(submitter.call_count(), 2);
}

// ── Rehydration and marker reset ────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn new_session_rehydrates_the_saved_draft() {
    let storage = Arc::new(MemoryStorage::new());
    let submitter = Arc::new(StubSubmitter::succeeding());

    {
        let session = session_with(storage.clone(), submitter.clone());
        session.set_personal_info(valid_personal_patch()).await;
        session.set_disease_history(valid_disease_patch()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        session.close().await;
    }

    let session = session_with(storage.clone(), submitter);
    session.load().await;

    let state = session.snapshot().await;
    assert_eq!(state.personal_info.first_name, "Jane");
    assert_eq!(state.disease_history.primary_diagnosis, "Cirrhosis");
    // The step is not persisted; a rehydrated wizard starts at step 1.
    assert_eq!(state.step, WizardStep::PersonalInfo);
    assert_eq!(
        state.personal_info.emergency_contact.full_name,
        "John Doe"
    );
}

#[tokio::test]
async fn load_on_empty_storage_keeps_empty_state() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );
    session.load().await;

    let state = session.snapshot().await;
    assert!(state.personal_info.first_name.is_empty());
    assert_eq!(state.step, WizardStep::PersonalInfo);
}

#[tokio::test]
async fn reset_completed_reenables_the_wizard() {
    let storage = Arc::new(MemoryStorage::new());
    storage.seed(storage_keys::COMPLETED, "true").await;

    let session = session_with(storage, Arc::new(StubSubmitter::succeeding()));
    assert!(session.is_completed().await);

    session.reset_completed().await;
    assert!(!session.is_completed().await);
}

// ── Review-screen edit links jump without validation ────────────────

#[tokio::test]
async fn set_current_step_jumps_freely() {
    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );
    walk_to_review(&session).await;

    // Jump back to an earlier section from the review screen.
    session.set_current_step(WizardStep::PersonalInfo).await;
    assert_eq!(session.current_step().await, WizardStep::PersonalInfo);

    // And forward again, even though nothing was re-validated.
    session.set_current_step(WizardStep::Review).await;
    assert_eq!(session.current_step().await, WizardStep::Review);
}

// ── Per-entry edits reconcile structured keys ───────────────────────

#[tokio::test]
async fn medication_entry_edit_clears_only_its_error() {
    use health_onboarding::validate::MedicationField;

    let session = session_with(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubSubmitter::succeeding()),
    );
    walk_to_review(&session).await;
    session.set_current_step(WizardStep::Medications).await;

    session.add_medication().await;
    // Blank entry raises no live errors until the gate check.
    assert!(session.errors().await.is_empty());

    assert!(matches!(session.next_step().await, StepOutcome::Rejected(_)));
    let errors = session.errors().await;
    assert!(errors.contains(FieldKey::Medication(0, MedicationField::Name)));
    assert!(errors.contains(FieldKey::Medication(0, MedicationField::Dosage)));

    session
        .update_medication(
            0,
            MedicationPatch {
                name: Some("Lactulose".to_string()),
                ..Default::default()
            },
        )
        .await;

    let errors = session.errors().await;
    assert!(!errors.contains(FieldKey::Medication(0, MedicationField::Name)));
    assert!(errors.contains(FieldKey::Medication(0, MedicationField::Dosage)));
}
