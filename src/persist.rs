//! Draft persistence — versioned envelope and debounced saving.
//!
//! Saving is best-effort: a dropped write is silently retried on the next
//! mutation's debounce cycle, and an unreadable blob just means the wizard
//! starts empty. Neither is ever surfaced to the user.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::draft::{DiseaseHistoryDraft, MedicationsDraft, PersonalInfoDraft};
use crate::state::WizardState;
use crate::storage::{DraftStorage, storage_keys};

/// Current envelope schema version. Blobs with a different version are
/// discarded on load.
pub const DRAFT_VERSION: u32 = 1;

/// The persisted draft blob: the three sections, the confirmation flag, and
/// a save timestamp. Step, errors, and transient flags are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEnvelope {
    pub version: u32,
    pub personal_info: PersonalInfoDraft,
    pub disease_history: DiseaseHistoryDraft,
    pub medications: MedicationsDraft,
    pub final_confirmation: bool,
    pub last_saved: DateTime<Utc>,
}

impl DraftEnvelope {
    /// Capture the persistable slice of the wizard state.
    pub fn snapshot(state: &WizardState) -> Self {
        Self {
            version: DRAFT_VERSION,
            personal_info: state.personal_info.clone(),
            disease_history: state.disease_history.clone(),
            medications: state.medications.clone(),
            final_confirmation: state.final_confirmation,
            last_saved: Utc::now(),
        }
    }
}

/// Load the persisted draft, if a compatible one exists.
///
/// Any failure (backend error, unparseable JSON, version mismatch) is
/// logged at warn level and treated as "no draft".
pub async fn load_draft(storage: &dyn DraftStorage) -> Option<DraftEnvelope> {
    let raw = match storage.get(storage_keys::DRAFT).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to load onboarding draft: {e}");
            return None;
        }
    };
    let envelope: DraftEnvelope = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("Discarding unparseable onboarding draft: {e}");
            return None;
        }
    };
    if envelope.version != DRAFT_VERSION {
        tracing::warn!(
            "Discarding onboarding draft with version {} (expected {DRAFT_VERSION})",
            envelope.version
        );
        return None;
    }
    Some(envelope)
}

/// Trailing-edge debounced draft writer.
///
/// At most one save task is pending at a time: scheduling a new snapshot
/// aborts the previous timer, so the write that eventually lands reflects
/// the latest state. The pending task is aborted on drop so no write
/// outlives the session.
pub struct DebouncedSaver {
    storage: Arc<dyn DraftStorage>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSaver {
    pub fn new(storage: Arc<dyn DraftStorage>, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `envelope` to be written after the quiet period, replacing
    /// any not-yet-fired save.
    pub async fn schedule(&self, envelope: DraftEnvelope) {
        let mut pending = self.pending.lock().await;
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let storage = Arc::clone(&self.storage);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let json = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!("Failed to serialize onboarding draft: {e}");
                    return;
                }
            };
            if let Err(e) = storage.set(storage_keys::DRAFT, &json).await {
                tracing::warn!("Failed to save onboarding draft: {e}");
            }
        }));
    }

    /// Drop any pending save without writing.
    pub async fn cancel(&self) {
        if let Some(handle) = self.pending.lock().await.take() {
            handle.abort();
        }
    }
}

impl Drop for DebouncedSaver {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
