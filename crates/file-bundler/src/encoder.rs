//! Content encoding: optional gzip, then optional base64

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::error::{BundleError, Result};

/// How file bytes are turned into bundle values.
///
/// Compression always runs first. Plain text combined with compression yields
/// opaque bytes, which the consumer must treat as such.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoding {
    /// Gzip the bytes at the best compression level
    pub compress: bool,
    /// Store the bytes directly instead of base64 encoding them
    pub plain_text: bool,
}

impl Encoding {
    pub fn encode(self, raw: Vec<u8>) -> Result<Vec<u8>> {
        let data = if self.compress { gzip(&raw)? } else { raw };

        if self.plain_text {
            Ok(data)
        } else {
            Ok(BASE64.encode(data).into_bytes())
        }
    }

    /// Reverse [`Encoding::encode`], reproducing the original file bytes
    pub fn decode(self, value: &[u8]) -> Result<Vec<u8>> {
        let data = if self.plain_text {
            value.to_vec()
        } else {
            BASE64
                .decode(value)
                .map_err(|e| BundleError::Decode(e.to_string()))?
        };

        if !self.compress {
            return Ok(data);
        }

        let mut decoded = Vec::new();
        GzDecoder::new(data.as_slice())
            .read_to_end(&mut decoded)
            .map_err(|e| BundleError::Decode(e.to_string()))?;
        Ok(decoded)
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).map_err(BundleError::Compress)?;
    encoder.finish().map_err(BundleError::Compress)
}
