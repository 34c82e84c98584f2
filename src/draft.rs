//! In-progress draft sections and the patches that mutate them.
//!
//! A draft holds whatever the user has typed so far: required strings start
//! empty, dates start unset. Each `apply` merges a patch into its section
//! and reports the [`FieldKey`]s that were touched, which the session feeds
//! into error reconciliation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::DiseaseStage;
use crate::validate::{
    ContactField, DiseaseField, FieldKey, MedicationField, PersonalField, TestResultField,
};

/// Partially filled emergency contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContactDraft {
    pub full_name: String,
    pub relationship: String,
    pub primary_phone: String,
    pub secondary_phone: String,
}

/// Partially filled step-1 data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfoDraft {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub phone: String,
    pub emergency_contact: EmergencyContactDraft,
}

/// Partially filled test-result list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestResultDraft {
    pub test_type: String,
    pub date_conducted: Option<NaiveDate>,
    pub result: String,
    pub unit: String,
    pub lab_name: String,
}

/// Partially filled step-2 data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseHistoryDraft {
    pub primary_diagnosis: String,
    pub other_diagnosis: String,
    pub diagnosis_date: Option<NaiveDate>,
    pub disease_stage: Option<DiseaseStage>,
    pub secondary_conditions: Vec<String>,
    pub test_results: Vec<TestResultDraft>,
}

/// Partially filled medication list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationDraft {
    pub name: String,
    pub dosage: String,
    pub unit: String,
    pub frequency: String,
    pub timing_requirements: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub special_instructions: String,
    pub prescribing_doctor: String,
}

impl MedicationDraft {
    /// A fresh entry as appended by the "add medication" control. The unit
    /// is prefilled with the most common choice.
    pub fn blank() -> Self {
        Self {
            unit: "mg".to_string(),
            ..Default::default()
        }
    }
}

/// Partially filled step-3 data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicationsDraft {
    pub medications: Vec<MedicationDraft>,
}

/// Patch for [`EmergencyContactDraft`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EmergencyContactPatch {
    pub full_name: Option<String>,
    pub relationship: Option<String>,
    pub primary_phone: Option<String>,
    pub secondary_phone: Option<String>,
}

/// Patch for [`PersonalInfoDraft`].
#[derive(Debug, Clone, Default)]
pub struct PersonalInfoPatch {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub emergency_contact: Option<EmergencyContactPatch>,
}

/// Patch for [`DiseaseHistoryDraft`]. `test_results` replaces the whole
/// list when present; per-entry edits go through
/// [`DiseaseHistoryDraft::update_test_result`].
#[derive(Debug, Clone, Default)]
pub struct DiseaseHistoryPatch {
    pub primary_diagnosis: Option<String>,
    pub other_diagnosis: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub disease_stage: Option<DiseaseStage>,
    pub secondary_conditions: Option<Vec<String>>,
    pub test_results: Option<Vec<TestResultDraft>>,
}

/// Patch for one test-result entry.
#[derive(Debug, Clone, Default)]
pub struct TestResultPatch {
    pub test_type: Option<String>,
    pub date_conducted: Option<NaiveDate>,
    pub result: Option<String>,
    pub unit: Option<String>,
    pub lab_name: Option<String>,
}

/// Patch for [`MedicationsDraft`]. Replaces the whole list when present;
/// per-entry edits go through [`MedicationsDraft::update_medication`].
#[derive(Debug, Clone, Default)]
pub struct MedicationsPatch {
    pub medications: Option<Vec<MedicationDraft>>,
}

/// Patch for one medication entry.
#[derive(Debug, Clone, Default)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub frequency: Option<String>,
    pub timing_requirements: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub special_instructions: Option<String>,
    pub prescribing_doctor: Option<String>,
}

fn set_string(target: &mut String, value: Option<String>, key: FieldKey, touched: &mut Vec<FieldKey>) {
    if let Some(value) = value {
        *target = value;
        touched.push(key);
    }
}

impl PersonalInfoDraft {
    /// Shallow-merge `patch` into the draft, returning the touched keys.
    pub fn apply(&mut self, patch: PersonalInfoPatch) -> Vec<FieldKey> {
        use ContactField::*;
        use PersonalField::*;

        let mut touched = Vec::new();
        set_string(
            &mut self.first_name,
            patch.first_name,
            FieldKey::Personal(FirstName),
            &mut touched,
        );
        set_string(
            &mut self.middle_name,
            patch.middle_name,
            FieldKey::Personal(MiddleName),
            &mut touched,
        );
        set_string(
            &mut self.last_name,
            patch.last_name,
            FieldKey::Personal(LastName),
            &mut touched,
        );
        if let Some(date) = patch.date_of_birth {
            self.date_of_birth = Some(date);
            touched.push(FieldKey::Personal(DateOfBirth));
        }
        set_string(&mut self.email, patch.email, FieldKey::Personal(Email), &mut touched);
        set_string(&mut self.phone, patch.phone, FieldKey::Personal(Phone), &mut touched);

        if let Some(contact) = patch.emergency_contact {
            let target = &mut self.emergency_contact;
            set_string(
                &mut target.full_name,
                contact.full_name,
                FieldKey::EmergencyContact(FullName),
                &mut touched,
            );
            set_string(
                &mut target.relationship,
                contact.relationship,
                FieldKey::EmergencyContact(Relationship),
                &mut touched,
            );
            set_string(
                &mut target.primary_phone,
                contact.primary_phone,
                FieldKey::EmergencyContact(PrimaryPhone),
                &mut touched,
            );
            set_string(
                &mut target.secondary_phone,
                contact.secondary_phone,
                FieldKey::EmergencyContact(SecondaryPhone),
                &mut touched,
            );
        }

        touched
    }
}

impl TestResultDraft {
    fn apply(&mut self, index: usize, patch: TestResultPatch) -> Vec<FieldKey> {
        use TestResultField::*;

        let mut touched = Vec::new();
        set_string(
            &mut self.test_type,
            patch.test_type,
            FieldKey::TestResult(index, TestType),
            &mut touched,
        );
        if let Some(date) = patch.date_conducted {
            self.date_conducted = Some(date);
            touched.push(FieldKey::TestResult(index, DateConducted));
        }
        set_string(
            &mut self.result,
            patch.result,
            FieldKey::TestResult(index, Result),
            &mut touched,
        );
        set_string(
            &mut self.unit,
            patch.unit,
            FieldKey::TestResult(index, Unit),
            &mut touched,
        );
        set_string(
            &mut self.lab_name,
            patch.lab_name,
            FieldKey::TestResult(index, LabName),
            &mut touched,
        );
        touched
    }

    /// Touched keys for a wholesale list replacement: the fields that differ
    /// from `previous`, or the filled-in fields of a brand-new entry. Blank
    /// fields of appended entries stay untouched so they only surface errors
    /// at step-advance time.
    fn changed_keys(&self, index: usize, previous: Option<&TestResultDraft>) -> Vec<FieldKey> {
        use TestResultField::*;

        let mut keys = Vec::new();
        let blank = TestResultDraft::default();
        let prev = previous.unwrap_or(&blank);
        if self.test_type != prev.test_type {
            keys.push(FieldKey::TestResult(index, TestType));
        }
        if self.date_conducted != prev.date_conducted {
            keys.push(FieldKey::TestResult(index, DateConducted));
        }
        if self.result != prev.result {
            keys.push(FieldKey::TestResult(index, Result));
        }
        if self.unit != prev.unit {
            keys.push(FieldKey::TestResult(index, Unit));
        }
        if self.lab_name != prev.lab_name {
            keys.push(FieldKey::TestResult(index, LabName));
        }
        keys
    }
}

impl DiseaseHistoryDraft {
    /// Shallow-merge `patch` into the draft, returning the touched keys.
    pub fn apply(&mut self, patch: DiseaseHistoryPatch) -> Vec<FieldKey> {
        use DiseaseField::*;

        let mut touched = Vec::new();
        set_string(
            &mut self.primary_diagnosis,
            patch.primary_diagnosis,
            FieldKey::Disease(PrimaryDiagnosis),
            &mut touched,
        );
        set_string(
            &mut self.other_diagnosis,
            patch.other_diagnosis,
            FieldKey::Disease(OtherDiagnosis),
            &mut touched,
        );
        if let Some(date) = patch.diagnosis_date {
            self.diagnosis_date = Some(date);
            touched.push(FieldKey::Disease(DiagnosisDate));
        }
        if let Some(stage) = patch.disease_stage {
            self.disease_stage = Some(stage);
            touched.push(FieldKey::Disease(DiseaseStage));
        }
        if let Some(conditions) = patch.secondary_conditions {
            self.secondary_conditions = conditions;
            touched.push(FieldKey::Disease(SecondaryConditions));
        }
        if let Some(entries) = patch.test_results {
            for (index, entry) in entries.iter().enumerate() {
                touched.extend(entry.changed_keys(index, self.test_results.get(index)));
            }
            self.test_results = entries;
        }

        touched
    }

    /// Merge `patch` into the entry at `index`, returning the touched keys.
    /// Out-of-range indices are a no-op.
    pub fn update_test_result(&mut self, index: usize, patch: TestResultPatch) -> Vec<FieldKey> {
        match self.test_results.get_mut(index) {
            Some(entry) => entry.apply(index, patch),
            None => Vec::new(),
        }
    }

    /// Append a blank test result. Validation is deliberately not run; blank
    /// entries surface errors at step-advance time.
    pub fn add_test_result(&mut self) {
        self.test_results.push(TestResultDraft::default());
    }

    /// Remove the test result at `index`, if present.
    pub fn remove_test_result(&mut self, index: usize) {
        if index < self.test_results.len() {
            self.test_results.remove(index);
        }
    }
}

impl MedicationDraft {
    fn apply(&mut self, index: usize, patch: MedicationPatch) -> Vec<FieldKey> {
        use MedicationField::*;

        let mut touched = Vec::new();
        set_string(&mut self.name, patch.name, FieldKey::Medication(index, Name), &mut touched);
        set_string(
            &mut self.dosage,
            patch.dosage,
            FieldKey::Medication(index, Dosage),
            &mut touched,
        );
        set_string(&mut self.unit, patch.unit, FieldKey::Medication(index, Unit), &mut touched);
        set_string(
            &mut self.frequency,
            patch.frequency,
            FieldKey::Medication(index, Frequency),
            &mut touched,
        );
        if let Some(tags) = patch.timing_requirements {
            self.timing_requirements = tags;
            touched.push(FieldKey::Medication(index, TimingRequirements));
        }
        if let Some(date) = patch.start_date {
            self.start_date = Some(date);
            touched.push(FieldKey::Medication(index, StartDate));
        }
        set_string(
            &mut self.special_instructions,
            patch.special_instructions,
            FieldKey::Medication(index, SpecialInstructions),
            &mut touched,
        );
        set_string(
            &mut self.prescribing_doctor,
            patch.prescribing_doctor,
            FieldKey::Medication(index, PrescribingDoctor),
            &mut touched,
        );
        touched
    }

    fn changed_keys(&self, index: usize, previous: Option<&MedicationDraft>) -> Vec<FieldKey> {
        use MedicationField::*;

        let mut keys = Vec::new();
        let blank = MedicationDraft::blank();
        let prev = previous.unwrap_or(&blank);
        if self.name != prev.name {
            keys.push(FieldKey::Medication(index, Name));
        }
        if self.dosage != prev.dosage {
            keys.push(FieldKey::Medication(index, Dosage));
        }
        if self.unit != prev.unit {
            keys.push(FieldKey::Medication(index, Unit));
        }
        if self.frequency != prev.frequency {
            keys.push(FieldKey::Medication(index, Frequency));
        }
        if self.timing_requirements != prev.timing_requirements {
            keys.push(FieldKey::Medication(index, TimingRequirements));
        }
        if self.start_date != prev.start_date {
            keys.push(FieldKey::Medication(index, StartDate));
        }
        if self.special_instructions != prev.special_instructions {
            keys.push(FieldKey::Medication(index, SpecialInstructions));
        }
        if self.prescribing_doctor != prev.prescribing_doctor {
            keys.push(FieldKey::Medication(index, PrescribingDoctor));
        }
        keys
    }
}

impl MedicationsDraft {
    /// Shallow-merge `patch` into the draft, returning the touched keys.
    pub fn apply(&mut self, patch: MedicationsPatch) -> Vec<FieldKey> {
        let mut touched = Vec::new();
        if let Some(entries) = patch.medications {
            for (index, entry) in entries.iter().enumerate() {
                touched.extend(entry.changed_keys(index, self.medications.get(index)));
            }
            self.medications = entries;
        }
        touched
    }

    /// Merge `patch` into the entry at `index`, returning the touched keys.
    /// Out-of-range indices are a no-op.
    pub fn update_medication(&mut self, index: usize, patch: MedicationPatch) -> Vec<FieldKey> {
        match self.medications.get_mut(index) {
            Some(entry) => entry.apply(index, patch),
            None => Vec::new(),
        }
    }

    /// Append a blank medication entry. No validation is run.
    pub fn add_medication(&mut self) {
        self.medications.push(MedicationDraft::blank());
    }

    /// Remove the medication at `index`, if present.
    pub fn remove_medication(&mut self, index: usize) {
        if index < self.medications.len() {
            self.medications.remove(index);
        }
    }
}
