pub mod events;
pub mod history;
pub mod labels;
pub mod language;
pub mod preferences;
pub mod prescription;

pub use history::{HistoryItem, HistoryStore};
pub use language::Language;
pub use preferences::{Preferences, PreferencesStore};
pub use prescription::{PrescriptionDetails, PrescriptionInfo};
