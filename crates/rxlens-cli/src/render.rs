use std::fmt::Write as _;

use chrono::Local;
use rxlens_contracts::labels::Labels;
use rxlens_contracts::{HistoryItem, PrescriptionInfo};

const SUMMARY_MAX_CHARS: usize = 60;

pub fn render_prescription(info: &PrescriptionInfo, labels: &Labels) -> String {
    let details = &info.details;
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", labels.title);

    if details.has_patient_info() {
        section(&mut out, labels.patient_information);
        for (label, value) in [
            (labels.name, &details.patient_name),
            (labels.age, &details.patient_age),
            (labels.gender, &details.patient_gender),
            (labels.diagnosis, &details.patient_disease),
        ] {
            if let Some(value) = non_empty(value) {
                let _ = writeln!(out, "  {label} {value}");
            }
        }
        if let Some(value) = non_empty(&details.diagnosis_explanation) {
            let _ = writeln!(out, "  {}", labels.about_diagnosis);
            indented(&mut out, value);
        }
    }

    let medications: Vec<&str> = details
        .medications
        .iter()
        .flatten()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if !medications.is_empty() {
        section(&mut out, labels.medications);
        for name in medications {
            let _ = writeln!(out, "  - {name}");
        }
    }

    for (label, value) in [
        (labels.dosage, &details.dosage),
        (labels.frequency, &details.frequency),
        (labels.duration, &details.duration),
        (labels.how_to_take, &details.medication_instructions),
        (labels.special_instructions, &details.special_instructions),
    ] {
        if let Some(value) = non_empty(value) {
            section(&mut out, label);
            indented(&mut out, value);
        }
    }

    let footer: Vec<String> = [
        (labels.doctor, &details.doctor_name),
        (labels.patient, &details.patient_name),
        (labels.date, &details.date),
    ]
    .into_iter()
    .filter_map(|(label, value)| non_empty(value).map(|value| format!("{label}: {value}")))
    .collect();
    if !footer.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", footer.join("  |  "));
    }

    if !info.raw_text.trim().is_empty() {
        section(&mut out, labels.raw_text);
        indented(&mut out, &info.raw_text);
    }
    out
}

/// One line per history entry: id, local date and time, short summary.
pub fn render_history_line(item: &HistoryItem) -> String {
    let local = item.timestamp.with_timezone(&Local);
    format!(
        "{}  {} {}  {}",
        item.id,
        local.format("%Y-%m-%d"),
        local.format("%H:%M:%S"),
        history_summary(&item.prescription_info)
    )
}

fn history_summary(info: &PrescriptionInfo) -> String {
    let names: Vec<&str> = info
        .details
        .medications
        .iter()
        .flatten()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    let summary = if !names.is_empty() {
        names.join(", ")
    } else {
        info
            .raw_text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    };
    clamp_text(&summary, SUMMARY_MAX_CHARS)
}

fn section(out: &mut String, heading: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{heading}");
}

fn indented(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "    {line}");
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn clamp_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use rxlens_contracts::labels::{ENGLISH, HINDI};
    use rxlens_contracts::{HistoryItem, PrescriptionDetails, PrescriptionInfo};

    use super::{render_history_line, render_prescription};

    fn full_info() -> PrescriptionInfo {
        PrescriptionInfo {
            details: PrescriptionDetails {
                medications: Some(vec!["Paracetamol".to_string(), " ".to_string()]),
                dosage: Some("500mg".to_string()),
                frequency: Some("Twice daily".to_string()),
                patient_name: Some("A. Sharma".to_string()),
                diagnosis_explanation: Some("Fever caused by infection".to_string()),
                doctor_name: Some("Dr. Rao".to_string()),
                special_instructions: Some("".to_string()),
                ..PrescriptionDetails::default()
            },
            raw_text: "Paracetamol 500mg BD".to_string(),
        }
    }

    #[test]
    fn english_rendering_lists_present_sections_only() {
        let text = render_prescription(&full_info(), &ENGLISH);
        assert!(text.starts_with("== Prescription Analysis =="));
        assert!(text.contains("Patient Information\n  Name: A. Sharma"));
        assert!(text.contains("About this diagnosis:\n    Fever caused by infection"));
        assert!(text.contains("Medications\n  - Paracetamol\n"));
        assert!(!text.contains("  - \n"));
        assert!(text.contains("Dosage\n    500mg"));
        assert!(text.contains("Frequency\n    Twice daily"));
        assert!(!text.contains("Duration"));
        assert!(!text.contains("Special Instructions"));
        assert!(text.contains("Doctor: Dr. Rao  |  Patient: A. Sharma"));
        assert!(text.contains("View Raw Text\n    Paracetamol 500mg BD"));
    }

    #[test]
    fn hindi_rendering_uses_hindi_labels() {
        let text = render_prescription(&full_info(), &HINDI);
        assert!(text.contains("रोगी की जानकारी"));
        assert!(text.contains("दवाइयाँ"));
        assert!(text.contains("खुराक"));
        assert!(!text.contains("Dosage"));
    }

    #[test]
    fn degraded_result_shows_only_raw_text() {
        let info = PrescriptionInfo::raw_only("Sorry, I cannot read this image.");
        let text = render_prescription(&info, &ENGLISH);
        assert_eq!(
            text,
            "== Prescription Analysis ==\n\nView Raw Text\n    Sorry, I cannot read this image.\n"
        );
    }

    #[test]
    fn history_line_summarizes_medications_or_raw_text() {
        let item = HistoryItem::new("a.jpg", full_info());
        let line = render_history_line(&item);
        assert!(line.starts_with(&item.id));
        assert!(line.ends_with("  Paracetamol"));

        let raw = HistoryItem::new("b.jpg", PrescriptionInfo::raw_only("\n  first line\nsecond"));
        assert!(render_history_line(&raw).ends_with("first line"));

        let long = HistoryItem::new("c.jpg", PrescriptionInfo::raw_only("x".repeat(80)));
        assert!(render_history_line(&long).ends_with(&format!("{}…", "x".repeat(60))));
    }
}
