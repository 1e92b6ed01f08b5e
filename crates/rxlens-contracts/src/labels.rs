use crate::language::Language;

/// Display strings for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub title: &'static str,
    pub language_name: &'static str,
    pub patient_information: &'static str,
    pub name: &'static str,
    pub age: &'static str,
    pub gender: &'static str,
    pub diagnosis: &'static str,
    pub about_diagnosis: &'static str,
    pub medications: &'static str,
    pub dosage: &'static str,
    pub frequency: &'static str,
    pub duration: &'static str,
    pub how_to_take: &'static str,
    pub special_instructions: &'static str,
    pub doctor: &'static str,
    pub patient: &'static str,
    pub date: &'static str,
    pub raw_text: &'static str,
    pub history: &'static str,
    pub history_empty: &'static str,
    pub history_cleared: &'static str,
    pub api_key_missing: &'static str,
    pub api_key_saved: &'static str,
}

pub const ENGLISH: Labels = Labels {
    title: "Prescription Analysis",
    language_name: "English",
    patient_information: "Patient Information",
    name: "Name:",
    age: "Age:",
    gender: "Gender:",
    diagnosis: "Diagnosis:",
    about_diagnosis: "About this diagnosis:",
    medications: "Medications",
    dosage: "Dosage",
    frequency: "Frequency",
    duration: "Duration",
    how_to_take: "How to Take Your Medicine",
    special_instructions: "Special Instructions",
    doctor: "Doctor",
    patient: "Patient",
    date: "Date",
    raw_text: "View Raw Text",
    history: "Scan History",
    history_empty: "No previous scans",
    history_cleared: "History cleared",
    api_key_missing: "Please enter your OpenAI API key in settings",
    api_key_saved: "API key saved",
};

pub const HINDI: Labels = Labels {
    title: "प्रिस्क्रिप्शन विश्लेषण",
    language_name: "हिंदी",
    patient_information: "रोगी की जानकारी",
    name: "नाम:",
    age: "उम्र:",
    gender: "लिंग:",
    diagnosis: "निदान:",
    about_diagnosis: "इस निदान के बारे में:",
    medications: "दवाइयाँ",
    dosage: "खुराक",
    frequency: "आवृत्ति",
    duration: "अवधि",
    how_to_take: "दवा कैसे लें",
    special_instructions: "विशेष निर्देश",
    doctor: "डॉक्टर",
    patient: "रोगी",
    date: "तारीख",
    raw_text: "मूल टेक्स्ट देखें",
    history: "स्कैन इतिहास",
    history_empty: "कोई पिछला स्कैन नहीं",
    history_cleared: "इतिहास साफ़ किया गया",
    api_key_missing: "कृपया सेटिंग्स में अपनी OpenAI API कुंजी दर्ज करें",
    api_key_saved: "API कुंजी सहेजी गई",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::English => &ENGLISH,
            Language::Hindi => &HINDI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Labels;
    use crate::language::Language;

    #[test]
    fn picks_table_by_language() {
        assert_eq!(Labels::for_language(Language::English).dosage, "Dosage");
        assert_eq!(Labels::for_language(Language::Hindi).dosage, "खुराक");
        assert_eq!(
            Labels::for_language(Language::from_selector("tamil")).medications,
            "Medications"
        );
    }
}
