use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::AcquisitionError;

/// Largest blob accepted for upload.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BlobSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// An image handed to the pipeline: a byte source plus its declared MIME type
/// and size. File-backed blobs are only read when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    mime_type: String,
    size: u64,
    source: BlobSource,
}

impl ImageBlob {
    /// MIME type is taken from the file extension; the file is stat'ed but not
    /// read.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let mime_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| UNKNOWN_MIME.to_string());
        Ok(Self {
            mime_type,
            size,
            source: BlobSource::File(path.to_path_buf()),
        })
    }

    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            source: BlobSource::Bytes(bytes),
        }
    }

    /// In-memory blob whose MIME type is guessed from its magic bytes.
    pub fn sniff(bytes: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| UNKNOWN_MIME.to_string());
        Self::from_bytes(bytes, mime_type)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads a file-backed blob into memory so later reads see the same
    /// bytes. The size is refreshed from what was actually read.
    pub fn load(self) -> io::Result<Self> {
        match self.source {
            BlobSource::Bytes(_) => Ok(self),
            BlobSource::File(path) => {
                let bytes = std::fs::read(&path)?;
                Ok(Self::from_bytes(bytes, self.mime_type))
            }
        }
    }

    /// File extension matching the MIME type, for storing a copy.
    pub fn extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }

    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match &self.source {
            BlobSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            BlobSource::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

/// Acquisition-side gate: image MIME types only, at most 5 MiB.
pub fn validate_for_upload(blob: &ImageBlob) -> Result<(), AcquisitionError> {
    if !blob.mime_type().starts_with("image/") {
        return Err(AcquisitionError::NotAnImage(blob.mime_type().to_string()));
    }
    if blob.size() > MAX_UPLOAD_BYTES {
        return Err(AcquisitionError::TooLarge {
            size: blob.size(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}
