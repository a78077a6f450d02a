//! Candidate images supplied by the upstream generation pipeline.
//!
//! A candidate is an id plus an immutable `H×W×C` pixel buffer. The buffer is
//! shared behind an `Arc` so assessment workers can read it without copying.

use std::fmt;
use std::sync::Arc;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CurationError;

/// Number of hex characters kept from the content digest.
const CONTENT_ID_LEN: usize = 16;

/// Stable identifier of a candidate image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Wraps a caller-supplied id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an id from the image shape and pixel content.
    pub fn from_content(pixels: &Array3<u8>) -> Self {
        let (height, width, channels) = pixels.dim();
        let mut hasher = Sha256::new();
        hasher.update((height as u64).to_le_bytes());
        hasher.update((width as u64).to_le_bytes());
        hasher.update((channels as u64).to_le_bytes());
        match pixels.as_slice() {
            Some(bytes) => hasher.update(bytes),
            None => {
                let bytes: Vec<u8> = pixels.iter().copied().collect();
                hasher.update(&bytes);
            }
        }
        let digest = hex::encode(hasher.finalize());
        Self(digest[..CONTENT_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One unit of generated content awaiting curation.
///
/// Pixels are laid out as `(height, width, channels)` with 8-bit samples.
/// The engine never mutates a candidate.
#[derive(Debug, Clone)]
pub struct CandidateImage {
    id: ImageId,
    pixels: Arc<Array3<u8>>,
}

impl CandidateImage {
    /// Creates a candidate whose id is derived from its content.
    pub fn new(pixels: Array3<u8>) -> Self {
        let id = ImageId::from_content(&pixels);
        Self {
            id,
            pixels: Arc::new(pixels),
        }
    }

    /// Creates a candidate with a caller-supplied id.
    pub fn with_id(id: impl Into<ImageId>, pixels: Array3<u8>) -> Self {
        Self {
            id: id.into(),
            pixels: Arc::new(pixels),
        }
    }

    /// Builds a candidate from a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `CurationError::InvalidImage` if the buffer length does not
    /// match `height * width * channels`.
    pub fn from_raw(
        id: Option<String>,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, CurationError> {
        let pixels = Array3::from_shape_vec((height, width, channels), data).map_err(|e| {
            CurationError::InvalidImage(format!(
                "buffer does not match shape {}x{}x{}: {}",
                height, width, channels, e
            ))
        })?;
        Ok(match id {
            Some(id) => Self::with_id(ImageId::new(id), pixels),
            None => Self::new(pixels),
        })
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// Returns a shared handle to the pixel buffer.
    pub fn shared_pixels(&self) -> Arc<Array3<u8>> {
        Arc::clone(&self.pixels)
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn channels(&self) -> usize {
        self.pixels.dim().2
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
