//! Boundary to the model deserializer.
//!
//! The loader hands a contiguous plaintext buffer to a deserializer and
//! gets back either a model or an opaque parse failure. Any
//! `Fn(&[u8]) -> Result<M, E>` closure is a deserializer.

/// Turns a plaintext model buffer into a parsed model.
pub trait ModelDeserializer: Send + Sync {
    type Model;
    type Error: std::error::Error + Send + Sync + 'static;

    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Model, Self::Error>;
}

impl<F, M, E> ModelDeserializer for F
where
    F: Fn(&[u8]) -> Result<M, E> + Send + Sync,
    E: std::error::Error + Send + Sync + 'static,
{
    type Model = M;
    type Error = E;

    fn deserialize(&self, bytes: &[u8]) -> Result<M, E> {
        self(bytes)
    }
}
