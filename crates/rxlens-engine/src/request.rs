use rxlens_contracts::Language;
use serde_json::{json, Value};

const SYSTEM_INSTRUCTION: &str = "You are a precise medical prescription analyzer. \
Extract detailed information from images of prescriptions. Include medications, dosage, \
frequency, duration, special instructions, doctor's name, patient's name, patient's age, \
patient's gender, patient's disease or diagnosis when visible, and date when visible. \
Also provide a brief explanation of what the diagnosis means in layman's terms and clear \
instructions on how to take the prescribed medications properly. Format the response as \
structured JSON that can be parsed by JavaScript.";

const SYSTEM_INSTRUCTION_TAIL: &str = "Focus on accuracy and completeness.";

const USER_INSTRUCTION: &str = "Analyze this prescription image and extract all relevant \
information. Return the results in JSON format with the following structure: \
{ medications: string[], dosage: string, frequency: string, duration: string, \
specialInstructions: string, doctorName: string, patientName: string, patientAge: string, \
patientGender: string, patientDisease: string, diagnosisExplanation: string, \
medicationInstructions: string, date: string, rawText: string }. For diagnosisExplanation, \
provide a brief, easy-to-understand explanation of what the diagnosis means. For \
medicationInstructions, provide clear instructions on how to take the medications properly, \
including any relevant precautions.";

pub fn system_instruction(language: Language) -> String {
    format!(
        "{SYSTEM_INSTRUCTION} Provide all text output in {} language. {SYSTEM_INSTRUCTION_TAIL}",
        language.instruction_name()
    )
}

pub fn user_instruction(language: Language) -> String {
    format!(
        "{USER_INSTRUCTION} Provide all text fields in {} language.",
        language.instruction_name()
    )
}

/// Chat-completions payload: system instruction, then a user turn carrying the
/// instruction text and the image as a data URI.
pub fn build_chat_request(model: &str, data_uri: &str, language: Language, max_tokens: u64) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": system_instruction(language),
            },
            {
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": user_instruction(language),
                    },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": data_uri,
                        },
                    },
                ],
            },
        ],
        "max_tokens": max_tokens,
    })
}

#[cfg(test)]
mod tests {
    use rxlens_contracts::Language;
    use serde_json::Value;

    use super::{build_chat_request, system_instruction, user_instruction};

    #[test]
    fn payload_matches_wire_shape() {
        let payload = build_chat_request(
            "gpt-4o",
            "data:image/png;base64,AAAA",
            Language::English,
            1500,
        );
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["max_tokens"], 1500);

        let messages = payload["messages"].as_array().cloned().unwrap_or_default();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"].is_string());
        assert_eq!(messages[1]["role"], "user");

        let parts = messages[1]["content"].as_array().cloned().unwrap_or_default();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], Value::String(user_instruction(Language::English)));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn hindi_selects_hindi_clauses() {
        assert!(system_instruction(Language::Hindi)
            .contains("Provide all text output in Hindi language."));
        assert!(user_instruction(Language::Hindi)
            .contains("Provide all text fields in Hindi language."));
        assert!(!user_instruction(Language::Hindi).contains("English"));
    }

    #[test]
    fn non_hindi_selectors_get_english_clauses() {
        for raw in ["english", "", "spanish", "HINDI ", "hindu"] {
            let language = Language::from_selector(raw);
            let expected_hindi = raw.trim().eq_ignore_ascii_case("hindi");
            let system = system_instruction(language);
            assert_eq!(system.contains("in Hindi language."), expected_hindi, "{raw}");
            assert_eq!(system.contains("in English language."), !expected_hindi, "{raw}");
        }
    }

    #[test]
    fn user_instruction_lists_every_field() {
        let text = user_instruction(Language::English);
        for field in [
            "medications: string[]",
            "dosage",
            "frequency",
            "duration",
            "specialInstructions",
            "doctorName",
            "patientName",
            "patientAge",
            "patientGender",
            "patientDisease",
            "diagnosisExplanation",
            "medicationInstructions",
            "date",
            "rawText",
        ] {
            assert!(text.contains(field), "{field}");
        }
    }
}
