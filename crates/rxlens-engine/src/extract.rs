use rxlens_contracts::{PrescriptionDetails, PrescriptionInfo};
use serde::Deserialize;

pub const FENCE_OPEN: &str = "```json\n";
pub const FENCE_CLOSE: &str = "\n```";

/// Shape the model is asked to answer with. `rawText` is tracked separately so
/// an omitted value can be filled from the answer itself.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecodedPrescription {
    #[serde(flatten)]
    details: PrescriptionDetails,
    #[serde(default)]
    raw_text: Option<String>,
}

/// Interior of the first ```` ```json ```` fenced block, if a complete one
/// exists.
///
/// The opening marker is ```` ```json ```` followed by a newline; the closing
/// marker is a newline followed by ```` ``` ````, searched after the opening
/// one. An unterminated fence yields `None`.
pub fn fenced_json(content: &str) -> Option<&str> {
    let start = content.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let rest = &content[start..];
    let end = rest.find(FENCE_CLOSE)?;
    Some(&rest[..end])
}

/// Converts the model's message content into a result. Never fails: content
/// that does not decode into the expected shape comes back as a raw-text-only
/// record holding the full content.
pub fn extract_prescription(content: &str) -> PrescriptionInfo {
    let candidate = fenced_json(content).unwrap_or(content);
    match serde_json::from_str::<DecodedPrescription>(candidate) {
        Ok(decoded) => PrescriptionInfo {
            details: decoded.details,
            raw_text: decoded.raw_text.unwrap_or_else(|| content.to_string()),
        },
        Err(err) => {
            tracing::debug!(error = %err, "model answer is not structured JSON; keeping raw text");
            PrescriptionInfo::raw_only(content)
        }
    }
}
