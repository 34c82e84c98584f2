//! Submission seam — payload assembly and the external submit collaborator.

use async_trait::async_trait;

use crate::draft::{
    DiseaseHistoryDraft, MedicationDraft, PersonalInfoDraft, TestResultDraft,
};
use crate::error::SubmitError;
use crate::model::{
    DiseaseHistory, EmergencyContact, Medication, OnboardingPayload, PersonalInfo, TestResult,
};
use crate::state::WizardState;
use crate::validate::{self, FieldKey, ValidationErrors};

/// The external create/submit collaborator. The core treats it as opaque:
/// it either accepts the payload or fails, and a failure leaves the draft
/// untouched so the user can retry.
#[async_trait]
pub trait OnboardingSubmitter: Send + Sync {
    async fn submit(&self, payload: &OnboardingPayload) -> Result<(), SubmitError>;
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn complete_personal(draft: &PersonalInfoDraft) -> Option<PersonalInfo> {
    let contact = &draft.emergency_contact;
    Some(PersonalInfo {
        first_name: draft.first_name.clone(),
        middle_name: non_empty(&draft.middle_name),
        last_name: draft.last_name.clone(),
        date_of_birth: draft.date_of_birth?,
        email: draft.email.clone(),
        phone: draft.phone.clone(),
        emergency_contact: EmergencyContact {
            full_name: contact.full_name.clone(),
            relationship: contact.relationship.clone(),
            primary_phone: contact.primary_phone.clone(),
            secondary_phone: non_empty(&contact.secondary_phone),
        },
    })
}

fn complete_test_result(draft: &TestResultDraft) -> Option<TestResult> {
    Some(TestResult {
        test_type: draft.test_type.clone(),
        date_conducted: draft.date_conducted?,
        result: draft.result.clone(),
        unit: draft.unit.clone(),
        lab_name: draft.lab_name.clone(),
    })
}

fn complete_disease_history(draft: &DiseaseHistoryDraft) -> Option<DiseaseHistory> {
    Some(DiseaseHistory {
        primary_diagnosis: draft.primary_diagnosis.clone(),
        other_diagnosis: non_empty(&draft.other_diagnosis),
        diagnosis_date: draft.diagnosis_date?,
        disease_stage: draft.disease_stage?,
        secondary_conditions: draft.secondary_conditions.clone(),
        test_results: draft
            .test_results
            .iter()
            .map(complete_test_result)
            .collect::<Option<Vec<_>>>()?,
    })
}

fn complete_medication(draft: &MedicationDraft) -> Option<Medication> {
    Some(Medication {
        name: draft.name.clone(),
        dosage: draft.dosage.clone(),
        unit: draft.unit.clone(),
        frequency: draft.frequency.clone(),
        timing_requirements: draft.timing_requirements.clone(),
        start_date: draft.start_date?,
        special_instructions: non_empty(&draft.special_instructions),
        prescribing_doctor: draft.prescribing_doctor.clone(),
    })
}

impl OnboardingPayload {
    /// Assemble the full cross-section payload from a wizard state,
    /// validating the whole draft against the combined rules. This runs
    /// even though each step was already gated, to catch any staleness
    /// between per-section and full validation.
    pub fn assemble(state: &WizardState) -> Result<OnboardingPayload, ValidationErrors> {
        let errors = validate::validate_all(state);
        if !errors.is_empty() {
            return Err(errors);
        }

        let assembled = complete_personal(&state.personal_info).and_then(|personal_info| {
            Some(OnboardingPayload {
                personal_info,
                disease_history: complete_disease_history(&state.disease_history)?,
                medications: state
                    .medications
                    .medications
                    .iter()
                    .map(complete_medication)
                    .collect::<Option<Vec<_>>>()?,
                final_confirmation: state.final_confirmation,
            })
        });

        // Validation guarantees every required field is present; this arm
        // is unreachable unless the rules and the conversions drift apart.
        assembled.ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.insert(FieldKey::General, "Draft is incomplete");
            errors
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::EmergencyContactDraft;
    use crate::model::DiseaseStage;
    use chrono::NaiveDate;

    fn full_state() -> WizardState {
        let mut state = WizardState::default();
        state.personal_info = PersonalInfoDraft {
            first_name: "Jane".to_string(),
            middle_name: String::new(),
            last_name: "Doe".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            email: "jane@x.com".to_string(),
            phone: "(555) 123-4567".to_string(),
            emergency_contact: EmergencyContactDraft {
                full_name: "John Doe".to_string(),
                relationship: "Spouse".to_string(),
                primary_phone: "(555) 765-4321".to_string(),
                secondary_phone: String::new(),
            },
        };
        state.disease_history = DiseaseHistoryDraft {
            primary_diagnosis: "Cirrhosis".to_string(),
            other_diagnosis: String::new(),
            diagnosis_date: NaiveDate::from_ymd_opt(2023, 6, 15),
            disease_stage: Some(DiseaseStage::Moderate),
            secondary_conditions: vec!["Diabetes".to_string()],
            test_results: Vec::new(),
        };
        state.final_confirmation = true;
        state
    }

    #[test]
    fn assemble_builds_payload_from_valid_state() {
        let payload = OnboardingPayload::assemble(&full_state()).unwrap();
        assert_eq!(payload.personal_info.first_name, "Jane");
        assert_eq!(payload.personal_info.middle_name, None);
        assert_eq!(payload.personal_info.emergency_contact.secondary_phone, None);
        assert_eq!(payload.disease_history.disease_stage, DiseaseStage::Moderate);
        assert!(payload.medications.is_empty());
        assert!(payload.final_confirmation);
    }

    #[test]
    fn assemble_rejects_missing_confirmation() {
        let mut state = full_state();
        state.final_confirmation = false;
        let errors = OnboardingPayload::assemble(&state).unwrap_err();
        assert_eq!(errors.get(FieldKey::General), Some(validate::CONFIRMATION_MESSAGE));
    }

    #[test]
    fn assemble_rejects_invalid_sections() {
        let mut state = full_state();
        state.personal_info.email = "not-an-email".to_string();
        state.disease_history.disease_stage = None;
        let errors = OnboardingPayload::assemble(&state).unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn assemble_keeps_filled_optionals() {
        let mut state = full_state();
        state.personal_info.middle_name = "Q".to_string();
        state.disease_history.primary_diagnosis = "Other".to_string();
        state.disease_history.other_diagnosis = "Gilbert syndrome".to_string();

        let payload = OnboardingPayload::assemble(&state).unwrap();
        assert_eq!(payload.personal_info.middle_name.as_deref(), Some("Q"));
        assert_eq!(
            payload.disease_history.other_diagnosis.as_deref(),
            Some("Gilbert syndrome")
        );
    }

    #[test]
    fn assemble_converts_list_entries() {
        let mut state = full_state();
        state.disease_history.test_results.push(TestResultDraft {
            test_type: "Bilirubin".to_string(),
            date_conducted: NaiveDate::from_ymd_opt(2024, 2, 1),
            result: "1.2".to_string(),
            unit: "mg/dL".to_string(),
            lab_name: "City Lab".to_string(),
        });
        state.medications.medications.push(MedicationDraft {
            name: "Lactulose".to_string(),
            dosage: "30".to_string(),
            unit: "mL".to_string(),
            frequency: "Twice daily".to_string(),
            timing_requirements: vec!["With food".to_string()],
            start_date: NaiveDate::from_ymd_opt(2023, 7, 1),
            special_instructions: String::new(),
            prescribing_doctor: "Dr. Smith".to_string(),
        });

        let payload = OnboardingPayload::assemble(&state).unwrap();
        assert_eq!(payload.disease_history.test_results.len(), 1);
        assert_eq!(payload.medications.len(), 1);
        assert_eq!(payload.medications[0].special_instructions, None);
    }
}
