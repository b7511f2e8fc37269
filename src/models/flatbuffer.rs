//! TFLite flatbuffer model deserializer.
//!
//! Performs the structural checks needed before a buffer may be handed to
//! an interpreter: minimum size, the `TFL3` file identifier, and a root
//! table offset that points inside the buffer. The parsed model owns a copy
//! of the plaintext, so it stays valid after the loader reuses its buffer.

use super::deserializer::ModelDeserializer;

/// File identifier stored at bytes 4..8 of every TFLite flatbuffer.
pub const TFLITE_FILE_IDENTIFIER: [u8; 4] = *b"TFL3";
/// Root offset (4 bytes) followed by the file identifier (4 bytes).
pub const MIN_FLATBUFFER_SIZE: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum FlatBufferError {
    #[error("Buffer too small for a flatbuffer: {0} bytes")]
    TooShort(usize),

    #[error("Unexpected file identifier: {0:?}")]
    BadIdentifier([u8; 4]),

    #[error("Root table offset {offset} outside buffer of {len} bytes")]
    RootOffsetOutOfBounds { offset: u32, len: usize },
}

/// A structurally validated TFLite model.
#[derive(Debug, Clone)]
pub struct TfliteModel {
    bytes: Vec<u8>,
    root_offset: u32,
}

impl TfliteModel {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn root_offset(&self) -> u32 {
        self.root_offset
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Deserializer for TFLite flatbuffer models.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfliteDeserializer;

impl ModelDeserializer for TfliteDeserializer {
    type Model = TfliteModel;
    type Error = FlatBufferError;

    fn deserialize(&self, bytes: &[u8]) -> Result<TfliteModel, FlatBufferError> {
        if bytes.len() < MIN_FLATBUFFER_SIZE {
            return Err(FlatBufferError::TooShort(bytes.len()));
        }

        let identifier = [bytes[4], bytes[5], bytes[6], bytes[7]];
        if identifier != TFLITE_FILE_IDENTIFIER {
            return Err(FlatBufferError::BadIdentifier(identifier));
        }

        let root_offset = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if root_offset as usize >= bytes.len() || (root_offset as usize) < MIN_FLATBUFFER_SIZE {
            return Err(FlatBufferError::RootOffsetOutOfBounds {
                offset: root_offset,
                len: bytes.len(),
            });
        }

        Ok(TfliteModel {
            bytes: bytes.to_vec(),
            root_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_model(len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        bytes[..4].copy_from_slice(&12u32.to_le_bytes());
        bytes[4..8].copy_from_slice(&TFLITE_FILE_IDENTIFIER);
        bytes
    }

    #[test]
    fn test_accepts_valid_header() {
        let model = TfliteDeserializer.deserialize(&minimal_model(64)).unwrap();
        assert_eq!(model.size_bytes(), 64);
        assert_eq!(model.root_offset(), 12);
        assert_eq!(&model.as_bytes()[4..8], b"TFL3");
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = TfliteDeserializer.deserialize(&[0u8; 7]);
        assert!(matches!(result, Err(FlatBufferError::TooShort(7))));
    }

    #[test]
    fn test_rejects_wrong_identifier() {
        let mut bytes = minimal_model(64);
        bytes[4..8].copy_from_slice(b"ONNX");
        let result = TfliteDeserializer.deserialize(&bytes);
        assert!(matches!(result, Err(FlatBufferError::BadIdentifier(id)) if &id == b"ONNX"));
    }

    #[test]
    fn test_rejects_root_offset_outside_buffer() {
        let mut bytes = minimal_model(32);
        bytes[..4].copy_from_slice(&32u32.to_le_bytes());
        let result = TfliteDeserializer.deserialize(&bytes);
        assert!(matches!(
            result,
            Err(FlatBufferError::RootOffsetOutOfBounds { offset: 32, len: 32 })
        ));
    }
}
