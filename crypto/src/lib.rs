// SPDX-License-Identifier: Apache-2.0

//! Elliptic curve group arithmetic for TLS.
//!
//! Scalar multiplication on the short Weierstrass curves secp256r1 and
//! secp384r1 uses a fixed-comb method with SPA/DPA countermeasures; x-only
//! scalar multiplication on Curve25519 (feature `ecc_curve25519`) uses a
//! constant-time Montgomery ladder. The SEC1/RFC 8422 wire boundary and
//! key generation/validation sit on top.

#![no_std]

use ferrite_tls_utils_common as utils_common;

pub mod ecc;
mod error;
pub mod rng;

pub use error::*;
