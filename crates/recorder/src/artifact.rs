//! Finalized recording artifacts.

use invigil_common::error::{InvigilError, InvigilResult};

/// An artifact must be strictly larger than this to be worth keeping.
/// At or below it the recording is a header stub with no usable video.
pub const MIN_VIABLE_ARTIFACT_BYTES: u64 = 100;

/// The finalized recording: every nonzero chunk concatenated in
/// arrival order, tagged with the negotiated container media type.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    media_type: String,
    chunk_count: usize,
}

impl Artifact {
    /// Concatenate collected chunks into an artifact, enforcing the
    /// viability threshold. Chunks must already be in arrival order
    /// with zero-length entries dropped.
    pub fn from_chunks(chunks: Vec<Vec<u8>>, media_type: &str) -> InvigilResult<Self> {
        let chunk_count = chunks.len();
        let bytes = chunks.concat();
        let size = bytes.len() as u64;

        if size <= MIN_VIABLE_ARTIFACT_BYTES {
            return Err(InvigilError::content_insufficient(size));
        }

        Ok(Self {
            bytes,
            media_type: media_type.to_string(),
            chunk_count,
        })
    }

    /// Total artifact size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Number of chunks that went into the artifact.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Container media type (e.g. `video/webm`).
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the raw bytes for delivery.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_preserves_order_and_size() {
        let chunks = vec![vec![1u8; 60], vec![2u8; 50], vec![3u8; 40]];
        let artifact = Artifact::from_chunks(chunks, "video/webm").unwrap();

        assert_eq!(artifact.size_bytes(), 150);
        assert_eq!(artifact.chunk_count(), 3);
        assert_eq!(&artifact.as_bytes()[..60], &[1u8; 60][..]);
        assert_eq!(&artifact.as_bytes()[60..110], &[2u8; 50][..]);
        assert_eq!(&artifact.as_bytes()[110..], &[3u8; 40][..]);
    }

    #[test]
    fn empty_chunk_sequence_is_insufficient() {
        let err = Artifact::from_chunks(vec![], "video/webm").unwrap_err();
        assert!(matches!(
            err,
            InvigilError::ContentInsufficient { size_bytes: 0 }
        ));
    }

    #[test]
    fn threshold_is_strict() {
        let at_threshold = Artifact::from_chunks(vec![vec![0u8; 100]], "video/webm");
        assert!(matches!(
            at_threshold,
            Err(InvigilError::ContentInsufficient { size_bytes: 100 })
        ));

        let just_over = Artifact::from_chunks(vec![vec![0u8; 101]], "video/webm").unwrap();
        assert_eq!(just_over.size_bytes(), 101);
    }
}
