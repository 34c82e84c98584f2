//! Validated onboarding data models.
//!
//! These are the *complete* types: every required field is present. The
//! in-progress equivalents with partial data live in [`crate::draft`]; a
//! draft only becomes one of these types once it passes validation during
//! payload assembly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Clinical stage of the primary diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiseaseStage {
    Mild,
    Moderate,
    Severe,
    EndStage,
}

impl DiseaseStage {
    /// All stages in severity order, for pickers.
    pub const ALL: [DiseaseStage; 4] = [
        Self::Mild,
        Self::Moderate,
        Self::Severe,
        Self::EndStage,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::EndStage => "End-Stage",
        }
    }
}

impl std::fmt::Display for DiseaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::EndStage => "end-stage",
        };
        write!(f, "{s}")
    }
}

/// Who to call if something goes wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub full_name: String,
    pub relationship: String,
    /// Formatted as `(XXX) XXX-XXXX`.
    pub primary_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
}

/// Personal details collected in step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    /// Formatted as `(XXX) XXX-XXXX`.
    pub phone: String,
    pub emergency_contact: EmergencyContact,
}

/// A lab test result attached to the disease history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_type: String,
    pub date_conducted: NaiveDate,
    pub result: String,
    pub unit: String,
    pub lab_name: String,
}

/// Disease history collected in step 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseHistory {
    pub primary_diagnosis: String,
    /// Free-text diagnosis, used when `primary_diagnosis` is "Other".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_diagnosis: Option<String>,
    pub diagnosis_date: NaiveDate,
    pub disease_stage: DiseaseStage,
    pub secondary_conditions: Vec<String>,
    pub test_results: Vec<TestResult>,
}

/// A current medication collected in step 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub unit: String,
    pub frequency: String,
    pub timing_requirements: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub prescribing_doctor: String,
}

/// The fully assembled, validated submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingPayload {
    pub personal_info: PersonalInfo,
    pub disease_history: DiseaseHistory,
    pub medications: Vec<Medication>,
    pub final_confirmation: bool,
}

/// Picker option lists shown by the wizard screens.
pub mod options {
    pub const DIAGNOSES: &[&str] = &[
        "Hepatitis B",
        "Hepatitis C",
        "Non-alcoholic fatty liver disease (NAFLD)",
        "Alcoholic liver disease",
        "Cirrhosis",
        "Primary biliary cholangitis",
        "Primary sclerosing cholangitis",
        "Autoimmune hepatitis",
        "Wilson disease",
        "Hemochromatosis",
        "Alpha-1 antitrypsin deficiency",
        "Other",
    ];

    pub const SECONDARY_CONDITIONS: &[&str] = &[
        "Diabetes",
        "Hypertension",
        "Heart disease",
        "Kidney disease",
        "Obesity",
        "Depression",
        "Anxiety",
        "Osteoporosis",
    ];

    pub const MEDICATION_FREQUENCIES: &[&str] = &[
        "Once daily",
        "Twice daily",
        "Three times daily",
        "Four times daily",
        "Every other day",
        "Weekly",
        "As needed",
    ];

    pub const TIMING_REQUIREMENTS: &[&str] = &[
        "With food",
        "Empty stomach",
        "Before bed",
        "Morning only",
        "Evening only",
    ];

    pub const COMMON_MEDICATIONS: &[&str] = &[
        "Lactulose",
        "Rifaximin",
        "Spironolactone",
        "Furosemide",
        "Propranolol",
        "Ursodiol",
        "Vitamin D",
        "Vitamin B12",
        "Folic acid",
        "Iron supplements",
    ];

    pub const TEST_TYPES: &[&str] = &[
        "ALT (Alanine aminotransferase)",
        "AST (Aspartate aminotransferase)",
        "Bilirubin",
        "Albumin",
        "INR (International normalized ratio)",
        "Platelet count",
        "AFP (Alpha-fetoprotein)",
        "Hepatitis B surface antigen",
        "Hepatitis C antibody",
        "Liver biopsy",
    ];

    pub const RELATIONSHIPS: &[&str] = &[
        "Spouse",
        "Parent",
        "Child",
        "Sibling",
        "Friend",
        "Other family member",
        "Caregiver",
    ];
}
