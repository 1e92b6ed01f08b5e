//! Prescription analysis pipeline: image → data URI → chat-completions call →
//! tolerant JSON extraction.

pub mod cancel;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod request;
pub mod source;
pub mod transport;

pub use cancel::{AnalysisSequencer, AnalysisTicket, CancellationToken};
pub use config::EngineConfig;
pub use error::{AcquisitionError, AnalysisError};
pub use extract::extract_prescription;
pub use pipeline::PrescriptionAnalyzer;
pub use source::{validate_for_upload, ImageBlob, MAX_UPLOAD_BYTES};
pub use transport::{HttpTransport, RawResponse, Transport};
