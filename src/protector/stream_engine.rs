//! Chunked AES-256-CBC stream encryption and decryption.
//!
//! Encryption streams from any reader to any writer so neither the
//! plaintext nor the ciphertext has to be resident. Decryption streams into
//! one contiguous in-memory buffer, appended strictly in file order.
//!
//! # Format
//! Raw CBC ciphertext with PKCS#7 padding. No header, no embedded IV, no
//! length field. Ciphertext length is always
//! `(plaintext_len / 16 + 1) * 16`.
//!
//! There is no authentication tag: damage in a non-final block yields
//! corrupted plaintext rather than an error.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use zeroize::Zeroize;

use super::cipher_session::CipherSession;
use super::cipher_types::{CipherError, Direction, BLOCK_SIZE, DEFAULT_CHUNK_SIZE};
use super::key_material::KeyMaterial;

/// Length of the ciphertext produced for `plaintext_len` bytes of input.
pub fn encrypted_len(plaintext_len: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (plaintext_len / block + 1) * block
}

/// Derive the encrypted-file path by replacing the final extension of
/// `input` with `extension` (or appending it when there is none).
pub fn encrypted_output_path(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

/// Stateless chunked stream cipher.
///
/// Holds no shared mutable state; every call opens its own session and
/// its own chunk buffers, so one engine may be used from many threads.
#[derive(Debug, Clone)]
pub struct StreamCipherEngine {
    chunk_size: usize,
}

impl StreamCipherEngine {
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Use a custom read chunk. Values below one cipher block are raised to it.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(BLOCK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Encrypt everything readable from `source` into `sink`.
    pub fn encrypt_stream<R, W>(
        &self,
        mut source: R,
        mut sink: W,
        material: &KeyMaterial,
    ) -> Result<(), CipherError>
    where
        R: Read,
        W: Write,
    {
        let mut session = CipherSession::new(Direction::Encrypt, material)?;
        let mut chunk = vec![0u8; self.chunk_size];
        let mut cipher_buf = Vec::with_capacity(self.chunk_size + BLOCK_SIZE);
        let mut written: u64 = 0;

        let result = (|| -> Result<(), CipherError> {
            loop {
                let n = read_chunk(&mut source, &mut chunk)?;
                if n == 0 {
                    break;
                }
                cipher_buf.clear();
                session.update(&chunk[..n], &mut cipher_buf)?;
                sink.write_all(&cipher_buf).map_err(CipherError::IoWrite)?;
                written += cipher_buf.len() as u64;
            }

            cipher_buf.clear();
            session.finalize(&mut cipher_buf)?;
            sink.write_all(&cipher_buf).map_err(CipherError::IoWrite)?;
            written += cipher_buf.len() as u64;
            sink.flush().map_err(CipherError::IoWrite)
        })();

        chunk.zeroize();
        cipher_buf.zeroize();
        session.close();

        match &result {
            Ok(()) => tracing::debug!(
                plaintext_bytes = session.consumed(),
                ciphertext_bytes = written,
                "Stream encrypted"
            ),
            Err(e) => tracing::debug!(error = %e, "Stream encryption aborted"),
        }
        result
    }

    /// Decrypt everything readable from `source` into a new buffer.
    pub fn decrypt_stream<R: Read>(
        &self,
        source: R,
        material: &KeyMaterial,
    ) -> Result<Vec<u8>, CipherError> {
        let mut plaintext = Vec::new();
        self.decrypt_stream_into(source, material, &mut plaintext)?;
        Ok(plaintext)
    }

    /// Decrypt `source`, appending the plaintext to `out`.
    ///
    /// On failure `out` is truncated back to its original length and the
    /// bytes that had been appended are wiped first. Returns the number of
    /// plaintext bytes appended.
    pub fn decrypt_stream_into<R: Read>(
        &self,
        mut source: R,
        material: &KeyMaterial,
        out: &mut Vec<u8>,
    ) -> Result<usize, CipherError> {
        let start = out.len();
        let mut session = CipherSession::new(Direction::Decrypt, material)?;
        let mut chunk = vec![0u8; self.chunk_size];

        let result = (|| -> Result<usize, CipherError> {
            loop {
                let n = read_chunk(&mut source, &mut chunk)?;
                if n == 0 {
                    break;
                }
                session.update(&chunk[..n], out)?;
            }
            session.finalize(out)
        })();

        chunk.zeroize();
        session.close();

        match result {
            Ok(_) => {
                let appended = out.len() - start;
                tracing::debug!(
                    ciphertext_bytes = session.consumed(),
                    plaintext_bytes = appended,
                    "Stream decrypted"
                );
                Ok(appended)
            }
            Err(e) => {
                out[start..].zeroize();
                out.truncate(start);
                tracing::debug!(error = %e, "Stream decryption aborted");
                Err(e)
            }
        }
    }

    /// Encrypt the file at `input` into a new file at `output`.
    ///
    /// The output file is closed on every path. A partially written output
    /// may remain on disk after a mid-stream failure. Fails with an
    /// `InvalidInput` write error, before anything is truncated, when
    /// `output` resolves to the same file as `input`.
    pub fn encrypt_file(
        &self,
        input: &Path,
        output: &Path,
        material: &KeyMaterial,
    ) -> Result<(), CipherError> {
        let source = File::open(input).map_err(CipherError::IoRead)?;
        if is_same_file(&source, input, output) {
            return Err(CipherError::IoWrite(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "output {} is the same file as input {}",
                    output.display(),
                    input.display()
                ),
            )));
        }
        let sink = File::create(output).map_err(CipherError::IoWrite)?;
        self.encrypt_stream(source, &sink, material)?;
        sink.sync_all().map_err(CipherError::IoWrite)?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            "Model file encrypted"
        );
        Ok(())
    }

    /// Decrypt the file at `path`, appending its plaintext to `out`.
    ///
    /// `out` is sized from the file length before decrypting so it never
    /// reallocates, and never leaves an unwiped plaintext copy behind, while
    /// the stream is in flight.
    pub fn decrypt_file_to_memory(
        &self,
        path: &Path,
        material: &KeyMaterial,
        out: &mut Vec<u8>,
    ) -> Result<usize, CipherError> {
        let source = File::open(path).map_err(CipherError::IoRead)?;
        let file_len = source.metadata().map_err(CipherError::IoRead)?.len();
        let needed = usize::try_from(file_len)
            .ok()
            .and_then(|len| len.checked_add(BLOCK_SIZE))
            .ok_or(CipherError::MalformedCiphertext { len: file_len })?;
        out.reserve_exact(needed);
        self.decrypt_stream_into(source, material, out)
    }
}

impl Default for StreamCipherEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `output` already exists and is the file `source` was opened from.
#[cfg(unix)]
fn is_same_file(source: &File, _input: &Path, output: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (source.metadata(), std::fs::metadata(output)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(_source: &File, input: &Path, output: &Path) -> bool {
    match (std::fs::canonicalize(input), std::fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Fill `buf` as far as the source allows.
///
/// Returns fewer than `buf.len()` bytes only at end of stream.
fn read_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize, CipherError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CipherError::IoRead(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "stream_engine_tests.rs"]
mod tests;
