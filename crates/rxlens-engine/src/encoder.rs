use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::AnalysisError;
use crate::source::ImageBlob;

/// Reads the blob and returns `data:<mime>;base64,<payload>`.
pub fn encode_data_uri(blob: &ImageBlob) -> Result<String, AnalysisError> {
    let mut bytes = Vec::with_capacity(blob.size() as usize);
    blob.open()
        .and_then(|mut reader| reader.read_to_end(&mut bytes))
        .map_err(AnalysisError::Encoding)?;
    Ok(format!(
        "data:{};base64,{}",
        blob.mime_type(),
        BASE64.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;

    use super::{encode_data_uri, BASE64};
    use crate::error::AnalysisError;
    use crate::source::ImageBlob;

    #[test]
    fn data_uri_round_trips_bytes() -> anyhow::Result<()> {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4099).collect();
        let blob = ImageBlob::from_bytes(bytes.clone(), "image/jpeg");
        let uri = encode_data_uri(&blob)?;

        let payload = uri
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap_or_default();
        assert!(uri.starts_with("data:"));
        assert_eq!(BASE64.decode(payload)?, bytes);
        Ok(())
    }

    #[test]
    fn empty_blob_encodes_to_empty_payload() -> anyhow::Result<()> {
        let blob = ImageBlob::from_bytes(Vec::new(), "image/png");
        assert_eq!(encode_data_uri(&blob)?, "data:image/png;base64,");
        Ok(())
    }

    #[test]
    fn unreadable_file_is_an_encoding_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("gone.png");
        std::fs::write(&path, b"png")?;
        let blob = ImageBlob::from_path(&path)?;
        std::fs::remove_file(&path)?;

        let err = encode_data_uri(&blob).err();
        assert!(matches!(err, Some(AnalysisError::Encoding(_))));
        Ok(())
    }
}
