use std::time::Instant;

use rxlens_contracts::{Language, PrescriptionInfo};

use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::encoder::encode_data_uri;
use crate::error::AnalysisError;
use crate::extract::extract_prescription;
use crate::request::build_chat_request;
use crate::source::ImageBlob;
use crate::transport::{interpret_chat_response, HttpTransport, Transport};

/// Image + credential + language in, prescription out.
///
/// Holds no per-call state; every `analyze` is independent.
pub struct PrescriptionAnalyzer<T: Transport = HttpTransport> {
    config: EngineConfig,
    transport: T,
}

impl PrescriptionAnalyzer<HttpTransport> {
    pub fn with_http(config: EngineConfig) -> Result<Self, AnalysisError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> PrescriptionAnalyzer<T> {
    pub fn new(config: EngineConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Encoding and transport failures abort the call. A model answer that
    /// is not the expected JSON still succeeds, with only `raw_text` set.
    ///
    /// When `cancel` fires, the call stops at the next checkpoint (before
    /// encoding, before sending, after the response) with
    /// [`AnalysisError::Cancelled`].
    pub fn analyze(
        &self,
        blob: &ImageBlob,
        credential: &str,
        language: Language,
        cancel: Option<&CancellationToken>,
    ) -> Result<PrescriptionInfo, AnalysisError> {
        let span = tracing::info_span!(
            "analyze_prescription",
            language = %language,
            mime = %blob.mime_type(),
            image_bytes = blob.size(),
            model = %self.config.model,
        );
        let _entered = span.enter();
        let started = Instant::now();

        let result = self.run(blob, credential, language, cancel);
        match &result {
            Ok(info) if info.is_degraded() => tracing::warn!(
                elapsed_ms = %started.elapsed().as_millis(),
                raw_len = info.raw_text.len(),
                "model answer could not be decoded; returning raw text only"
            ),
            Ok(_) => tracing::info!(
                elapsed_ms = %started.elapsed().as_millis(),
                "prescription analyzed"
            ),
            Err(AnalysisError::Cancelled) => tracing::info!("analysis cancelled"),
            Err(err) => tracing::error!(kind = err.kind(), error = %err, "analysis failed"),
        }
        result
    }

    fn run(
        &self,
        blob: &ImageBlob,
        credential: &str,
        language: Language,
        cancel: Option<&CancellationToken>,
    ) -> Result<PrescriptionInfo, AnalysisError> {
        checkpoint(cancel)?;
        let data_uri = encode_data_uri(blob)?;
        let payload = build_chat_request(
            &self.config.model,
            &data_uri,
            language,
            self.config.max_tokens,
        );

        checkpoint(cancel)?;
        let endpoint = self.config.endpoint();
        tracing::debug!(%endpoint, payload_bytes = data_uri.len(), "sending analysis request");
        let response = self.transport.post_json(&endpoint, credential, &payload)?;
        checkpoint(cancel)?;

        let content = interpret_chat_response(response)?;
        Ok(extract_prescription(&content))
    }
}

fn checkpoint(cancel: Option<&CancellationToken>) -> Result<(), AnalysisError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(AnalysisError::Cancelled);
    }
    Ok(())
}
