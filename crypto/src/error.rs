// SPDX-License-Identifier: Apache-2.0

//! Crypto related error type definitions.

use crate::utils_common;
use core::convert;

const CRYPTO_ERROR_CODE_MEMORY_ALLOCATION_FAILURE: isize = 1;
const CRYPTO_ERROR_CODE_INTERNAL: isize = 2;
const CRYPTO_ERROR_CODE_RNG_FAILURE: isize = 3;
const CRYPTO_ERROR_CODE_RANDOM_SAMPLING_RETRIES_EXCEEDED: isize = 4;
const CRYPTO_ERROR_CODE_BUFFER_TOO_SMALL: isize = 5;
const CRYPTO_ERROR_CODE_BAD_INPUT_DATA: isize = 6;
const CRYPTO_ERROR_CODE_FEATURE_UNAVAILABLE: isize = 7;
const CRYPTO_ERROR_CODE_INVALID_PARAMS: isize = 8;
const CRYPTO_ERROR_CODE_INVALID_POINT: isize = 9;
const CRYPTO_ERROR_CODE_INVALID_KEY: isize = 10;

/// Common error returned by the curve arithmetic primitives.
///
/// The variants are deliberately coarse: neither the discriminant nor the
/// time taken to produce it depends on secret values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// Memory allocation failure.
    MemoryAllocationFailure = CRYPTO_ERROR_CODE_MEMORY_ALLOCATION_FAILURE,
    /// Internal logic error.
    Internal = CRYPTO_ERROR_CODE_INTERNAL,
    /// Unspecified random number generator failure condition.
    RngFailure = CRYPTO_ERROR_CODE_RNG_FAILURE,
    /// Some probabilistic sampling algorithm exceeded the maximum number of
    /// retries.
    RandomSamplingRetriesExceeded = CRYPTO_ERROR_CODE_RANDOM_SAMPLING_RETRIES_EXCEEDED,
    /// An output buffer is too small to receive the result.
    BufferTooSmall = CRYPTO_ERROR_CODE_BUFFER_TOO_SMALL,
    /// Malformed input, e.g. a truncated or otherwise invalid wire encoding.
    BadInputData = CRYPTO_ERROR_CODE_BAD_INPUT_DATA,
    /// The input is well-formed, but requests something not supported, e.g.
    /// an unknown TLS curve identifier or a compressed point format.
    FeatureUnavailable = CRYPTO_ERROR_CODE_FEATURE_UNAVAILABLE,
    /// Request parameters are inconsistent, e.g. an operation invoked on a
    /// group of the wrong curve form.
    InvalidParams = CRYPTO_ERROR_CODE_INVALID_PARAMS,
    /// A point is not in the expected domain.
    InvalidPoint = CRYPTO_ERROR_CODE_INVALID_POINT,
    /// A private scalar is not in the expected domain.
    InvalidKey = CRYPTO_ERROR_CODE_INVALID_KEY,
}

impl convert::From<convert::Infallible> for CryptoError {
    fn from(value: convert::Infallible) -> Self {
        match value {}
    }
}

impl convert::From<utils_common::alloc::TryNewError> for CryptoError {
    fn from(value: utils_common::alloc::TryNewError) -> Self {
        match value {
            utils_common::alloc::TryNewError::MemoryAllocationFailure => CryptoError::MemoryAllocationFailure,
        }
    }
}
