// SPDX-License-Identifier: Apache-2.0

//! Elliptic curve group arithmetic.

pub mod curve;
mod field;
mod key;
#[cfg(feature = "ecc_curve25519")]
mod montgomery;
pub mod point_io;
mod weierstrass;

pub use key::*;
#[cfg(feature = "ecc_curve25519")]
pub use montgomery::{check_pubkey_x, XEccKey};
pub use weierstrass::{AffinePoint, CombTable, JacobianPoint};

extern crate alloc;

use crate::utils_common::{
    alloc::try_alloc_zeroizing_vec,
    zeroize::{self, Zeroizing},
};
use crate::CryptoError;
use alloc::vec::Vec;
use cmpa::{self, MpUIntCommon as _};

/// Point arithmetic on one [`Group`](curve::Group).
///
/// Never instantiated directly, but obtained through
/// [`Group::ops()`](curve::Group::ops).
pub struct GroupOps<'a> {
    grp: &'a curve::Group,
    field: field::FieldOps<'a>,
}

impl<'a> GroupOps<'a> {
    pub(crate) fn try_new(grp: &'a curve::Group) -> Result<Self, CryptoError> {
        let field = field::FieldOps::new(grp.p(), grp.bits(), grp.fast_mod());
        Ok(Self { grp, field })
    }

    /// Get the associated group.
    pub fn group(&self) -> &curve::Group {
        self.grp
    }

    #[cfg(test)]
    pub(crate) fn field(&self) -> &field::FieldOps<'a> {
        &self.field
    }

    /// Allocate a [`GroupOpsScratch`] instance suitable for use with this
    /// `GroupOps`.
    ///
    /// All temporaries of the point operations live in the scratch pool; the
    /// operations themselves never allocate. The pool's buffers are wiped on
    /// drop.
    pub fn try_alloc_scratch(&self) -> Result<GroupOpsScratch, CryptoError> {
        GroupOpsScratch::try_new(self.grp.p_len())
    }

    /// Validate that a scalar is usable as a multiplier or Weierstrass
    /// private key, i.e. `1 <= scalar < n` (SEC1 3.2).
    pub fn validate_scalar(&self, scalar: &[u8]) -> Result<(), CryptoError> {
        let s = cmpa::MpBigEndianUIntByteSlice::from_bytes(scalar);
        let n = cmpa::MpBigEndianUIntByteSlice::from_bytes(self.grp.n());
        if !s.len_is_compatible_with(self.grp.n_len())
            || cmpa::ct_is_zero_mp(&s).unwrap() != 0
            || cmpa::ct_geq_mp_mp(&s, &n).unwrap() != 0
        {
            return Err(CryptoError::InvalidKey);
        }
        Ok(())
    }
}

/// Scratch space for the temporaries of the point formulas.
pub(crate) struct PointOpsScratch {
    /// Double-width product buffer for the multiply-then-reduce path.
    pub wide: Zeroizing<Vec<u8>>,
    pub t0: Zeroizing<Vec<u8>>,
    pub t1: Zeroizing<Vec<u8>>,
    pub t2: Zeroizing<Vec<u8>>,
    pub t3: Zeroizing<Vec<u8>>,
    pub t4: Zeroizing<Vec<u8>>,
    pub t5: Zeroizing<Vec<u8>>,
    pub t6: Zeroizing<Vec<u8>>,
    pub t7: Zeroizing<Vec<u8>>,
    pub t8: Zeroizing<Vec<u8>>,
    /// Limb-typed scratch for the modular inversion.
    pub inv0: Zeroizing<Vec<cmpa::LimbType>>,
    pub inv1: Zeroizing<Vec<cmpa::LimbType>>,
}

impl PointOpsScratch {
    fn try_new(p_len: usize) -> Result<Self, CryptoError> {
        let inv_nlimbs = cmpa::MpMutNativeEndianUIntLimbsSlice::nlimbs_for_len(p_len);
        Ok(Self {
            wide: try_alloc_zeroizing_vec::<u8>(2 * p_len)?,
            t0: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t1: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t2: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t3: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t4: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t5: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t6: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t7: try_alloc_zeroizing_vec::<u8>(p_len)?,
            t8: try_alloc_zeroizing_vec::<u8>(p_len)?,
            inv0: try_alloc_zeroizing_vec::<cmpa::LimbType>(inv_nlimbs)?,
            inv1: try_alloc_zeroizing_vec::<cmpa::LimbType>(inv_nlimbs)?,
        })
    }
}

/// Scratch space for use by the arithmetic primitives implemented at
/// [`GroupOps`].
///
/// Acquired once per call chain via
/// [`GroupOps::try_alloc_scratch()`](GroupOps::try_alloc_scratch) and reused
/// by every operation, giving the temporaries a stack-like lifetime without
/// per-operation allocation.
pub struct GroupOpsScratch {
    /// Staging buffers for the constant-time comb table selection.
    pub(crate) sel_x: Zeroizing<Vec<u8>>,
    pub(crate) sel_y: Zeroizing<Vec<u8>>,
    /// Scalar-width working buffers.
    pub(crate) m0: Zeroizing<Vec<u8>>,
    pub(crate) m1: Zeroizing<Vec<u8>>,
    pub(crate) tmp: PointOpsScratch,
}

impl GroupOpsScratch {
    fn try_new(p_len: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            sel_x: try_alloc_zeroizing_vec::<u8>(p_len)?,
            sel_y: try_alloc_zeroizing_vec::<u8>(p_len)?,
            m0: try_alloc_zeroizing_vec::<u8>(p_len)?,
            m1: try_alloc_zeroizing_vec::<u8>(p_len)?,
            tmp: PointOpsScratch::try_new(p_len)?,
        })
    }
}

impl zeroize::ZeroizeOnDrop for GroupOpsScratch {}
