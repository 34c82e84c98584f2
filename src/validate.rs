//! Section validation and error reconciliation.
//!
//! Validation runs against a whole section at a time (cross-field rules need
//! the full picture), but errors are reconciled per touched field so that a
//! user fixing one field never sees unrelated errors flicker in or out.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use crate::draft::{
    DiseaseHistoryDraft, MedicationDraft, MedicationsDraft, PersonalInfoDraft, TestResultDraft,
};
use crate::state::{WizardState, WizardStep};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Fields of the personal-info section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PersonalField {
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    Email,
    Phone,
}

/// Fields of the nested emergency contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactField {
    FullName,
    Relationship,
    PrimaryPhone,
    SecondaryPhone,
}

/// Scalar fields of the disease-history section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiseaseField {
    PrimaryDiagnosis,
    OtherDiagnosis,
    DiagnosisDate,
    DiseaseStage,
    SecondaryConditions,
}

/// Fields of one test-result list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestResultField {
    TestType,
    DateConducted,
    Result,
    Unit,
    LabName,
}

/// Fields of one medication list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MedicationField {
    Name,
    Dosage,
    Unit,
    Frequency,
    TimingRequirements,
    StartDate,
    SpecialInstructions,
    PrescribingDoctor,
}

/// A validated field, identified structurally rather than by a dotted-path
/// string. List entries carry their position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Personal(PersonalField),
    EmergencyContact(ContactField),
    Disease(DiseaseField),
    TestResult(usize, TestResultField),
    Medication(usize, MedicationField),
    /// Non-field error, e.g. the missing final confirmation.
    General,
}

impl std::fmt::Display for FieldKey {
    /// Renders the dotted path hosts use to key inline error widgets,
    /// e.g. `phone`, `emergency_contact.primary_phone`,
    /// `test_results.0.lab_name`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal(field) => {
                let s = match field {
                    PersonalField::FirstName => "first_name",
                    PersonalField::MiddleName => "middle_name",
                    PersonalField::LastName => "last_name",
                    PersonalField::DateOfBirth => "date_of_birth",
                    PersonalField::Email => "email",
                    PersonalField::Phone => "phone",
                };
                write!(f, "{s}")
            }
            Self::EmergencyContact(field) => {
                let s = match field {
                    ContactField::FullName => "full_name",
                    ContactField::Relationship => "relationship",
                    ContactField::PrimaryPhone => "primary_phone",
                    ContactField::SecondaryPhone => "secondary_phone",
                };
                write!(f, "emergency_contact.{s}")
            }
            Self::Disease(field) => {
                let s = match field {
                    DiseaseField::PrimaryDiagnosis => "primary_diagnosis",
                    DiseaseField::OtherDiagnosis => "other_diagnosis",
                    DiseaseField::DiagnosisDate => "diagnosis_date",
                    DiseaseField::DiseaseStage => "disease_stage",
                    DiseaseField::SecondaryConditions => "secondary_conditions",
                };
                write!(f, "{s}")
            }
            Self::TestResult(index, field) => {
                let s = match field {
                    TestResultField::TestType => "test_type",
                    TestResultField::DateConducted => "date_conducted",
                    TestResultField::Result => "result",
                    TestResultField::Unit => "unit",
                    TestResultField::LabName => "lab_name",
                };
                write!(f, "test_results.{index}.{s}")
            }
            Self::Medication(index, field) => {
                let s = match field {
                    MedicationField::Name => "name",
                    MedicationField::Dosage => "dosage",
                    MedicationField::Unit => "unit",
                    MedicationField::Frequency => "frequency",
                    MedicationField::TimingRequirements => "timing_requirements",
                    MedicationField::StartDate => "start_date",
                    MedicationField::SpecialInstructions => "special_instructions",
                    MedicationField::PrescribingDoctor => "prescribing_doctor",
                };
                write!(f, "medications.{index}.{s}")
            }
            Self::General => write!(f, "general"),
        }
    }
}

/// Per-field validation messages, ordered by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{count} field(s) failed validation", count = .0.len())]
pub struct ValidationErrors(BTreeMap<FieldKey, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, key: FieldKey, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    pub fn remove(&mut self, key: FieldKey) -> Option<String> {
        self.0.remove(&key)
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Absorb all entries from `other`.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

fn required(errors: &mut ValidationErrors, key: FieldKey, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(key, message);
    }
}

/// Validate the personal-info section (step 1 rules).
pub fn validate_personal_info(draft: &PersonalInfoDraft) -> ValidationErrors {
    use ContactField::*;
    use PersonalField::*;

    let mut errors = ValidationErrors::new();

    required(
        &mut errors,
        FieldKey::Personal(FirstName),
        &draft.first_name,
        "First name is required",
    );
    if draft.first_name.chars().count() > 50 {
        errors.insert(FieldKey::Personal(FirstName), "First name too long");
    }
    if draft.middle_name.chars().count() > 50 {
        errors.insert(FieldKey::Personal(MiddleName), "Middle name too long");
    }
    required(
        &mut errors,
        FieldKey::Personal(LastName),
        &draft.last_name,
        "Last name is required",
    );
    if draft.last_name.chars().count() > 50 {
        errors.insert(FieldKey::Personal(LastName), "Last name too long");
    }

    match draft.date_of_birth {
        None => errors.insert(FieldKey::Personal(DateOfBirth), "Date of birth is required"),
        Some(dob) => {
            let age = Utc::now().date_naive().year() - dob.year();
            if !(13..=120).contains(&age) {
                errors.insert(
                    FieldKey::Personal(DateOfBirth),
                    "Age must be between 13 and 120 years",
                );
            }
        }
    }

    if !EMAIL_RE.is_match(&draft.email) {
        errors.insert(
            FieldKey::Personal(Email),
            "Please enter a valid email address",
        );
    }
    if !PHONE_RE.is_match(&draft.phone) {
        errors.insert(FieldKey::Personal(Phone), "Phone format: (XXX) XXX-XXXX");
    }

    let contact = &draft.emergency_contact;
    required(
        &mut errors,
        FieldKey::EmergencyContact(FullName),
        &contact.full_name,
        "Emergency contact name is required",
    );
    required(
        &mut errors,
        FieldKey::EmergencyContact(Relationship),
        &contact.relationship,
        "Relationship is required",
    );
    if !PHONE_RE.is_match(&contact.primary_phone) {
        errors.insert(
            FieldKey::EmergencyContact(PrimaryPhone),
            "Phone format: (XXX) XXX-XXXX",
        );
    }
    // Secondary phone is optional, but must be well-formed when present.
    if !contact.secondary_phone.is_empty() && !PHONE_RE.is_match(&contact.secondary_phone) {
        errors.insert(
            FieldKey::EmergencyContact(SecondaryPhone),
            "Phone format: (XXX) XXX-XXXX",
        );
    }

    errors
}

fn validate_test_result(index: usize, entry: &TestResultDraft, errors: &mut ValidationErrors) {
    use TestResultField::*;

    required(
        errors,
        FieldKey::TestResult(index, TestType),
        &entry.test_type,
        "Test type is required",
    );
    if entry.date_conducted.is_none() {
        errors.insert(FieldKey::TestResult(index, DateConducted), "Test date is required");
    }
    required(
        errors,
        FieldKey::TestResult(index, Result),
        &entry.result,
        "Test result is required",
    );
    required(
        errors,
        FieldKey::TestResult(index, Unit),
        &entry.unit,
        "Unit is required",
    );
    required(
        errors,
        FieldKey::TestResult(index, LabName),
        &entry.lab_name,
        "Lab/facility name is required",
    );
}

/// Validate the disease-history section (step 2 rules).
pub fn validate_disease_history(draft: &DiseaseHistoryDraft) -> ValidationErrors {
    use DiseaseField::*;

    let mut errors = ValidationErrors::new();

    required(
        &mut errors,
        FieldKey::Disease(PrimaryDiagnosis),
        &draft.primary_diagnosis,
        "Primary diagnosis is required",
    );
    if draft.diagnosis_date.is_none() {
        errors.insert(FieldKey::Disease(DiagnosisDate), "Diagnosis date is required");
    }
    if draft.disease_stage.is_none() {
        errors.insert(FieldKey::Disease(DiseaseStage), "Disease stage is required");
    }
    for (index, entry) in draft.test_results.iter().enumerate() {
        validate_test_result(index, entry, &mut errors);
    }

    errors
}

fn validate_medication(index: usize, entry: &MedicationDraft, errors: &mut ValidationErrors) {
    use MedicationField::*;

    required(
        errors,
        FieldKey::Medication(index, Name),
        &entry.name,
        "Medication name is required",
    );
    required(
        errors,
        FieldKey::Medication(index, Dosage),
        &entry.dosage,
        "Dosage is required",
    );
    required(
        errors,
        FieldKey::Medication(index, Unit),
        &entry.unit,
        "Unit is required",
    );
    required(
        errors,
        FieldKey::Medication(index, Frequency),
        &entry.frequency,
        "Frequency is required",
    );
    if entry.start_date.is_none() {
        errors.insert(FieldKey::Medication(index, StartDate), "Start date is required");
    }
    required(
        errors,
        FieldKey::Medication(index, PrescribingDoctor),
        &entry.prescribing_doctor,
        "Prescribing doctor is required",
    );
}

/// Validate the medications section (step 3 rules). The list may be empty;
/// every present entry must be fully filled in.
pub fn validate_medications(draft: &MedicationsDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (index, entry) in draft.medications.iter().enumerate() {
        validate_medication(index, entry, &mut errors);
    }
    errors
}

/// The confirmation-required message shown at step 4.
pub const CONFIRMATION_MESSAGE: &str = "You must confirm to proceed";

/// Validate the data gated by the current step. Step 4 is a plain boolean
/// check on the confirmation flag, not a schema run.
pub fn validate_step(state: &WizardState) -> ValidationErrors {
    match state.step {
        WizardStep::PersonalInfo => validate_personal_info(&state.personal_info),
        WizardStep::DiseaseHistory => validate_disease_history(&state.disease_history),
        WizardStep::Medications => validate_medications(&state.medications),
        WizardStep::Review => {
            let mut errors = ValidationErrors::new();
            if !state.final_confirmation {
                errors.insert(FieldKey::General, CONFIRMATION_MESSAGE);
            }
            errors
        }
    }
}

/// Validate the complete cross-section draft, for payload assembly.
pub fn validate_all(state: &WizardState) -> ValidationErrors {
    let mut errors = validate_personal_info(&state.personal_info);
    errors.extend(validate_disease_history(&state.disease_history));
    errors.extend(validate_medications(&state.medications));
    if !state.final_confirmation {
        errors.insert(FieldKey::General, CONFIRMATION_MESSAGE);
    }
    errors
}

/// Reconcile a fresh section validation result against the standing error
/// map after a partial edit.
///
/// If the section now passes entirely, everything is cleared. Otherwise
/// untouched fields keep their last-known error state; each touched field
/// gets fresh feedback: its entry is removed if it now passes, or
/// added/overwritten if it fails.
pub fn reconcile(
    fresh: ValidationErrors,
    touched: &[FieldKey],
    previous: &ValidationErrors,
) -> ValidationErrors {
    if fresh.is_empty() {
        return ValidationErrors::new();
    }
    let mut out = previous.clone();
    for key in touched {
        match fresh.get(*key) {
            Some(message) => out.insert(*key, message),
            None => {
                out.remove(*key);
            }
        }
    }
    out
}
