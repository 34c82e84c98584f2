//! Onboarding wizard core — multi-step draft state, schema validation,
//! debounced draft persistence, and the terminal submission flow.
//!
//! The wizard walks four steps (personal info, disease history,
//! medications, review) with validated forward transitions and free
//! backward navigation. In-progress data is saved to durable key-value
//! storage after a quiet period and cleared exactly once on successful
//! submission.

pub mod config;
pub mod draft;
pub mod error;
pub mod model;
pub mod persist;
pub mod session;
pub mod state;
pub mod storage;
pub mod submit;
pub mod validate;

pub use config::OnboardingConfig;
pub use error::{Error, Result, StorageError, SubmitError};
pub use model::OnboardingPayload;
pub use session::{OnboardingSession, StepOutcome};
pub use state::{WizardState, WizardStep};
pub use storage::{DraftStorage, MemoryStorage};
pub use submit::OnboardingSubmitter;
pub use validate::{FieldKey, ValidationErrors};
