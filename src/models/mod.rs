//! Model loading from encrypted files.

pub mod deserializer;
pub mod flatbuffer;
pub mod loader;
pub mod loader_types;

pub use deserializer::ModelDeserializer;
pub use flatbuffer::{FlatBufferError, TfliteDeserializer, TfliteModel};
pub use loader::ProtectedModelLoader;
pub use loader_types::{LoadError, ParseCause};
