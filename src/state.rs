//! Wizard step machine and in-memory wizard state.

use serde::{Deserialize, Serialize};

use crate::draft::{DiseaseHistoryDraft, MedicationsDraft, PersonalInfoDraft};
use crate::validate::ValidationErrors;

/// The four steps of the onboarding wizard.
///
/// Forward progress is gated on validation; backward navigation is always
/// free. Step 4 submits instead of advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PersonalInfo,
    DiseaseHistory,
    Medications,
    Review,
}

impl WizardStep {
    /// 1-based step number shown in the progress bar.
    pub fn number(&self) -> u8 {
        match self {
            Self::PersonalInfo => 1,
            Self::DiseaseHistory => 2,
            Self::Medications => 3,
            Self::Review => 4,
        }
    }

    /// Step for a 1-based number, if in range.
    pub fn from_number(number: u8) -> Option<WizardStep> {
        match number {
            1 => Some(Self::PersonalInfo),
            2 => Some(Self::DiseaseHistory),
            3 => Some(Self::Medications),
            4 => Some(Self::Review),
            _ => None,
        }
    }

    /// The next step in the linear progression, if any.
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::PersonalInfo => Some(Self::DiseaseHistory),
            Self::DiseaseHistory => Some(Self::Medications),
            Self::Medications => Some(Self::Review),
            Self::Review => None,
        }
    }

    /// The previous step, if any.
    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            Self::PersonalInfo => None,
            Self::DiseaseHistory => Some(Self::PersonalInfo),
            Self::Medications => Some(Self::DiseaseHistory),
            Self::Review => Some(Self::Medications),
        }
    }

    /// Whether this is the review step, where "next" submits.
    pub fn is_last(&self) -> bool {
        matches!(self, Self::Review)
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::PersonalInfo
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PersonalInfo => "personal_info",
            Self::DiseaseHistory => "disease_history",
            Self::Medications => "medications",
            Self::Review => "review",
        };
        write!(f, "{s}")
    }
}

/// The complete in-memory wizard state for one session.
///
/// Sections and the confirmation flag are persisted via the draft envelope;
/// the step, errors, and the two transient flags are not.
#[derive(Debug, Clone, Default)]
pub struct WizardState {
    pub step: WizardStep,
    pub personal_info: PersonalInfoDraft,
    pub disease_history: DiseaseHistoryDraft,
    pub medications: MedicationsDraft,
    pub final_confirmation: bool,
    pub errors: ValidationErrors,
    pub is_submitting: bool,
    pub show_success: bool,
}
