//! Per-stream AES-256-CBC cipher session.
//!
//! A session wraps one CBC context bound to one key/IV pair and one
//! direction. Input may arrive in arbitrary slices; whole blocks are
//! transformed as soon as they are complete and the remainder is buffered
//! for the next call.
//!
//! # Security
//! - Decrypt sessions always hold back the last full block so PKCS#7
//!   padding is removed exactly once, at finalization.
//! - Buffered bytes are wiped on `close()` and on drop; the AES key
//!   schedule and chaining block are wiped by the `aes`/`cbc` contexts.

use cbc::cipher::block_padding::{Padding, Pkcs7};
use cbc::cipher::{Block, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

use super::cipher_types::{
    Aes256CbcDec, Aes256CbcEnc, CipherError, Direction, SessionState, BLOCK_SIZE,
};
use super::key_material::KeyMaterial;

enum CbcContext {
    Encrypt(Aes256CbcEnc),
    Decrypt(Aes256CbcDec),
}

/// One-shot streaming cipher context.
pub struct CipherSession {
    context: CbcContext,
    state: SessionState,
    pending: Block<Aes256CbcEnc>,
    pending_len: usize,
    consumed: u64,
}

impl CipherSession {
    /// Open a session for `direction` under `material`.
    pub fn new(direction: Direction, material: &KeyMaterial) -> Result<Self, CipherError> {
        if material.is_unset() {
            return Err(CipherError::UnsetKeyMaterial);
        }

        let key = material.key_bytes();
        let iv = material.iv_bytes();
        let context = match direction {
            Direction::Encrypt => CbcContext::Encrypt(
                Aes256CbcEnc::new_from_slices(key, iv)
                    .map_err(|e| CipherError::CipherInit(e.to_string()))?,
            ),
            Direction::Decrypt => CbcContext::Decrypt(
                Aes256CbcDec::new_from_slices(key, iv)
                    .map_err(|e| CipherError::CipherInit(e.to_string()))?,
            ),
        };

        tracing::trace!(direction = direction.as_str(), "Cipher session opened");
        Ok(Self {
            context,
            state: SessionState::Initialized,
            pending: Block::<Aes256CbcEnc>::default(),
            pending_len: 0,
            consumed: 0,
        })
    }

    pub fn direction(&self) -> Direction {
        match self.context {
            CbcContext::Encrypt(_) => Direction::Encrypt,
            CbcContext::Decrypt(_) => Direction::Decrypt,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Total input bytes fed through `update` so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Feed `input` and append every completed output block to `out`.
    ///
    /// Returns the number of bytes appended, which may be zero while a
    /// partial (or, when decrypting, held-back) block is buffered.
    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<usize, CipherError> {
        match self.state {
            SessionState::Initialized => self.state = SessionState::Updating,
            SessionState::Updating => {}
            other => return Err(CipherError::SessionReuse(other)),
        }

        let start = out.len();
        let hold_back = self.direction() == Direction::Decrypt;
        self.consumed += input.len() as u64;
        out.reserve(input.len() + BLOCK_SIZE);

        let mut rest = input;
        while !rest.is_empty() {
            if self.pending_len == BLOCK_SIZE {
                self.flush_pending(out);
            }
            let take = (BLOCK_SIZE - self.pending_len).min(rest.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&rest[..take]);
            self.pending_len += take;
            rest = &rest[take..];

            if self.pending_len == BLOCK_SIZE && !hold_back {
                self.flush_pending(out);
            }
        }

        Ok(out.len() - start)
    }

    /// Emit the final block: padding is added when encrypting, validated
    /// and stripped when decrypting.
    pub fn finalize(&mut self, out: &mut Vec<u8>) -> Result<usize, CipherError> {
        match self.state {
            SessionState::Initialized | SessionState::Updating => {}
            other => return Err(CipherError::SessionReuse(other)),
        }
        self.state = SessionState::Finalized;

        let start = out.len();
        let result = match self.direction() {
            Direction::Encrypt => self.finalize_encrypt(out),
            Direction::Decrypt => self.finalize_decrypt(out),
        };
        self.wipe_pending();

        result.map(|_| out.len() - start)
    }

    /// Wipe buffered bytes and mark the session closed. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.wipe_pending();
        self.state = SessionState::Closed;
        tracing::trace!(
            direction = self.direction().as_str(),
            consumed = self.consumed,
            "Cipher session closed"
        );
    }

    fn finalize_encrypt(&mut self, out: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.pending_len >= BLOCK_SIZE {
            return Err(CipherError::CipherFinalize(
                "full block left unprocessed before padding".to_string(),
            ));
        }
        Pkcs7::pad(&mut self.pending, self.pending_len);
        self.flush_pending(out);
        Ok(())
    }

    fn finalize_decrypt(&mut self, out: &mut Vec<u8>) -> Result<(), CipherError> {
        let block_len = BLOCK_SIZE as u64;
        if self.consumed == 0 || self.consumed % block_len != 0 || self.pending_len != BLOCK_SIZE {
            return Err(CipherError::MalformedCiphertext { len: self.consumed });
        }

        self.apply_block();
        let plain = Pkcs7::unpad(&self.pending).map_err(|_| CipherError::Padding)?;
        out.extend_from_slice(plain);
        Ok(())
    }

    fn apply_block(&mut self) {
        match &mut self.context {
            CbcContext::Encrypt(cipher) => cipher.encrypt_block_mut(&mut self.pending),
            CbcContext::Decrypt(cipher) => cipher.decrypt_block_mut(&mut self.pending),
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<u8>) {
        self.apply_block();
        out.extend_from_slice(&self.pending);
        self.pending_len = 0;
    }

    fn wipe_pending(&mut self) {
        self.pending.as_mut_slice().zeroize();
        self.pending_len = 0;
    }
}

impl Drop for CipherSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "cipher_session_tests.rs"]
mod tests;
