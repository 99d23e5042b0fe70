// SPDX-License-Identifier: Apache-2.0

//! Cryptographic random number generator interface.
//!
//! The curve arithmetic only ever consumes randomness -- for private key
//! generation and for the projective coordinate blinding countermeasure.
//! The generator itself is an external collaborator supplied by the TLS
//! layer.

use crate::CryptoError;
use core::convert;

/// Error type returned by [`RngCore::generate()`](RngCore::generate).
#[derive(Debug)]
pub enum RngGenerateError {
    /// A reseed is required before producing more random data.
    ReseedRequired,
    /// Some crypto primitive failed its operation.
    CryptoError(CryptoError),
}

impl convert::From<RngGenerateError> for CryptoError {
    fn from(value: RngGenerateError) -> Self {
        match value {
            RngGenerateError::ReseedRequired => CryptoError::RngFailure,
            RngGenerateError::CryptoError(e) => e,
        }
    }
}

/// Main functionality implemented by cryptographic random number generators.
pub trait RngCore {
    /// Fill `output` with random bytes.
    fn generate(&mut self, output: &mut [u8]) -> Result<(), RngGenerateError>;
}

#[cfg(test)]
pub(crate) struct TestRng {
    state: u64,
}

#[cfg(test)]
impl RngCore for TestRng {
    fn generate(&mut self, output: &mut [u8]) -> Result<(), RngGenerateError> {
        // splitmix64, good enough for deterministic tests.
        for b in output.iter_mut() {
            self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = self.state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            *b = (z ^ (z >> 31)) as u8;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_rng() -> TestRng {
    TestRng {
        state: 0x243f6a8885a308d3,
    }
}
