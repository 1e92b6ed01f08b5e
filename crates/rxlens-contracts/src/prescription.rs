use serde::{Deserialize, Serialize};

/// Structured fields a model may extract from a prescription image.
///
/// Every field is optional: a field is present only when the model supplied
/// it with the right type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl PrescriptionDetails {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn has_patient_info(&self) -> bool {
        self.patient_name.is_some()
            || self.patient_age.is_some()
            || self.patient_gender.is_some()
            || self.patient_disease.is_some()
            || self.diagnosis_explanation.is_some()
    }
}

/// Result of one prescription analysis.
///
/// `raw_text` is always populated. When the model answer could not be
/// decoded, `details` is empty and `raw_text` holds the full answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionInfo {
    #[serde(flatten)]
    pub details: PrescriptionDetails,
    pub raw_text: String,
}

impl PrescriptionInfo {
    pub fn raw_only(raw_text: impl Into<String>) -> Self {
        Self {
            details: PrescriptionDetails::default(),
            raw_text: raw_text.into(),
        }
    }

    /// True when no structured field survived decoding.
    pub fn is_degraded(&self) -> bool {
        self.details.is_empty()
    }
}
