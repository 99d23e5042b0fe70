// SPDX-License-Identifier: Apache-2.0

//! x-only point arithmetic on Montgomery curves.
//!
//! Points are kept in projective x/z coordinates (`x = X/Z`, `Z = 0`
//! encoding infinity); the y coordinate never enters the computation.
//! Scalar multiplication is the Montgomery ladder ([Montgomery 1987],
//! see also [Curve25519] http://cr.yp.to/ecdh/curve25519-20060209.pdf),
//! with constant-time conditional swaps steering the ladder.

extern crate alloc;
use alloc::vec::Vec;

use super::curve::{self, CurveForm};
use super::field::{self, be_set_one};
use super::{GroupOps, GroupOpsScratch, PointOpsScratch};
use crate::rng::RngCore;
use crate::utils_common::{
    alloc::try_alloc_zeroizing_vec,
    zeroize::{self, Zeroizing},
};
use crate::CryptoError;
use cmpa::{self, MpMutUInt as _, MpUIntCommon as _};

/// A Montgomery curve point in projective x/z coordinates.
pub(crate) struct MxzPoint {
    x: Zeroizing<Vec<u8>>,
    z: Zeroizing<Vec<u8>>,
}

impl MxzPoint {
    fn try_new(p_len: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            x: try_alloc_zeroizing_vec::<u8>(p_len)?,
            z: try_alloc_zeroizing_vec::<u8>(p_len)?,
        })
    }
}

impl zeroize::ZeroizeOnDrop for MxzPoint {}

impl<'a> GroupOps<'a> {
    /// Normalize x/z coordinates: `X = X/Z`, `Z = 1`. Cost: 1M + 1I.
    fn normalize_mxz(&self, pt: &mut MxzPoint, tmp: &mut PointOpsScratch) -> Result<(), CryptoError> {
        tmp.t1.copy_from_slice(&pt.z);
        self.field
            .inv(&mut tmp.t0, &mut tmp.t1, [&mut tmp.inv0, &mut tmp.inv1])?;
        self.field.mul_assign(&mut pt.x, &tmp.t0, &mut tmp.wide);
        be_set_one(&mut pt.z);
        Ok(())
    }

    /// Randomize projective x/z coordinates, `(X, Z) -> (l X, l Z)` for
    /// random `1 < l < p` -- the x/z flavor of Coron's countermeasure.
    /// Cost: 2M.
    fn randomize_mxz(
        &self,
        pt: &mut MxzPoint,
        rng: &mut dyn RngCore,
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        self.field.rand_in_range(&mut tmp.t0, rng)?;
        self.field.mul_assign(&mut pt.x, &tmp.t0, &mut tmp.wide);
        self.field.mul_assign(&mut pt.z, &tmp.t0, &mut tmp.wide);
        Ok(())
    }

    /// Ladder step: `R <- 2R` and `S <- R + S`, with `d = x(R - S)`
    /// (mladd-1987-m,
    /// http://www.hyperelliptic.org/EFD/g1p/auto-montgom-xz.html).
    ///
    /// Cost: 5M + 4S.
    fn double_add_mxz(
        &self,
        r: &mut MxzPoint,
        s: &mut MxzPoint,
        d: &[u8],
        a24: &[u8],
        tmp: &mut PointOpsScratch,
    ) {
        // A = X_R + Z_R, AA = A^2, B = X_R - Z_R, BB = B^2, E = AA - BB
        tmp.t0.copy_from_slice(&r.x);
        self.field.add(&mut tmp.t0, &r.z);
        self.field.sqr(&mut tmp.t1, &tmp.t0, &mut tmp.wide);
        tmp.t2.copy_from_slice(&r.x);
        self.field.sub(&mut tmp.t2, &r.z);
        self.field.sqr(&mut tmp.t3, &tmp.t2, &mut tmp.wide);
        tmp.t4.copy_from_slice(&tmp.t1);
        self.field.sub(&mut tmp.t4, &tmp.t3);

        // C = X_S + Z_S, D = X_S - Z_S, DA = D*A, CB = C*B
        tmp.t5.copy_from_slice(&s.x);
        self.field.add(&mut tmp.t5, &s.z);
        tmp.t6.copy_from_slice(&s.x);
        self.field.sub(&mut tmp.t6, &s.z);
        self.field.mul(&mut tmp.t7, &tmp.t6, &tmp.t0, &mut tmp.wide);
        self.field.mul(&mut tmp.t8, &tmp.t5, &tmp.t2, &mut tmp.wide);

        // X_S = (DA + CB)^2, Z_S = d * (DA - CB)^2
        s.x.copy_from_slice(&tmp.t7);
        self.field.add(&mut s.x, &tmp.t8);
        self.field.sqr_assign(&mut s.x, &mut tmp.wide);
        s.z.copy_from_slice(&tmp.t7);
        self.field.sub(&mut s.z, &tmp.t8);
        self.field.sqr_assign(&mut s.z, &mut tmp.wide);
        self.field.mul_assign(&mut s.z, d, &mut tmp.wide);

        // X_R = AA * BB, Z_R = E * (BB + a24 * E)
        self.field.mul(&mut r.x, &tmp.t1, &tmp.t3, &mut tmp.wide);
        self.field.mul(&mut tmp.t5, a24, &tmp.t4, &mut tmp.wide);
        self.field.add(&mut tmp.t5, &tmp.t3);
        self.field.mul(&mut r.z, &tmp.t5, &tmp.t4, &mut tmp.wide);
    }

    /// Swap two ladder points iff `cond`, without leaking `cond`.
    fn cond_swap_mxz(
        &self,
        a: &mut MxzPoint,
        b: &mut MxzPoint,
        cond: cmpa::LimbChoice,
        tmp: &mut PointOpsScratch,
    ) {
        for (pa, pb) in [(&mut a.x, &mut b.x), (&mut a.z, &mut b.z)] {
            tmp.t0.copy_from_slice(pa);
            cmpa::MpMutBigEndianUIntByteSlice::from_bytes(pa)
                .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(pb), cond);
            cmpa::MpMutBigEndianUIntByteSlice::from_bytes(pb)
                .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t0), cond);
        }
    }

    /// x-only multiplication with the Montgomery ladder:
    /// `result_x = x(m * P)` for `point_x = x(P)`.
    ///
    /// Loop invariant: `R` is the result so far and `RP = R + P`; each bit
    /// of `m` conditionally swaps the pair around the combined
    /// double-and-add step. The number of iterations is the scalar's bit
    /// length, which is fixed for properly clamped scalars.
    ///
    /// With `rng` supplied, the starting point's projective coordinates are
    /// randomized; callers multiplying a secret scalar should pass one.
    pub fn point_mul_x(
        &self,
        result_x: &mut [u8],
        scalar: &[u8],
        point_x: &[u8],
        rng: Option<&mut dyn RngCore>,
        scratch: &mut GroupOpsScratch,
    ) -> Result<(), CryptoError> {
        let mont = self.grp.mont_params().ok_or(CryptoError::InvalidParams)?;
        let p_len = self.grp.p_len();
        let x_in = cmpa::MpBigEndianUIntByteSlice::from_bytes(point_x);
        if !x_in.len_is_compatible_with(p_len) {
            return Err(CryptoError::InvalidPoint);
        }
        if result_x.len() < p_len {
            return Err(CryptoError::BufferTooSmall);
        }

        // d = x(P), reduced; x(R - RP) stays x(P) for the whole ladder.
        let mut px = try_alloc_zeroizing_vec::<u8>(p_len)?;
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut px).copy_from(&x_in);
        self.field.reduce_once(&mut px, &mut scratch.tmp.t0);
        self.field.reduce_once(&mut px, &mut scratch.tmp.t0);

        // R = infinity in x/z coordinates, RP = P.
        let mut r = MxzPoint::try_new(p_len)?;
        be_set_one(&mut r.x);
        let mut rp = MxzPoint::try_new(p_len)?;
        rp.x.copy_from_slice(&px);
        be_set_one(&mut rp.z);

        if let Some(rng) = rng {
            self.randomize_mxz(&mut rp, rng, &mut scratch.tmp)?;
        }

        let (_, bitlen) = cmpa::ct_find_last_set_bit_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(scalar));
        for i in (0..bitlen).rev() {
            // if b: R = 2R + P else R = 2R, via safe conditional swaps
            let b = field::be_get_bit(scalar, i);
            let cond = cmpa::LimbChoice::new(b as cmpa::LimbType);
            self.cond_swap_mxz(&mut r, &mut rp, cond, &mut scratch.tmp);
            self.double_add_mxz(&mut r, &mut rp, &px, mont.a24, &mut scratch.tmp);
            self.cond_swap_mxz(&mut r, &mut rp, cond, &mut scratch.tmp);
        }

        self.normalize_mxz(&mut r, &mut scratch.tmp)?;
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(result_x)
            .copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&r.x));
        Ok(())
    }

    /// x coordinate of the group's generator.
    pub fn generator_x(&self) -> Result<&'static [u8], CryptoError> {
        let mont = self.grp.mont_params().ok_or(CryptoError::InvalidParams)?;
        Ok(mont.g_x)
    }
}

/// Check an x-only public key.
///
/// For Montgomery curves with x-only schemes there is nothing to verify
/// beyond the size ([Curve25519] p. 5): every 32-byte string is a valid
/// public key.
pub fn check_pubkey_x(grp: &curve::Group, x: &[u8]) -> Result<(), CryptoError> {
    if grp.form() != CurveForm::Montgomery {
        return Err(CryptoError::InvalidParams);
    }
    if !cmpa::MpBigEndianUIntByteSlice::from_bytes(x).len_is_compatible_with((grp.bits() + 7) / 8) {
        return Err(CryptoError::InvalidPoint);
    }
    Ok(())
}

/// Check an x25519-style clamped private scalar: the three low bits clear
/// and the top bit at exactly the curve's bit position.
pub(crate) fn check_clamped_scalar(grp: &curve::Group, d: &[u8]) -> Result<(), CryptoError> {
    let (is_nonzero, bitlen) =
        cmpa::ct_find_last_set_bit_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(d));
    if is_nonzero.unwrap() == 0
        || field::be_get_bit(d, 0) != 0
        || field::be_get_bit(d, 1) != 0
        || field::be_get_bit(d, 2) != 0
        || bitlen - 1 != grp.bits()
    {
        return Err(CryptoError::InvalidKey);
    }
    Ok(())
}

/// An x-only (Montgomery curve) key pair.
pub struct XEccKey {
    d: Zeroizing<Vec<u8>>,
    pub_x: Zeroizing<Vec<u8>>,
}

impl XEccKey {
    /// Generate a key pair: draw, clamp ([Curve25519] p. 5), derive the
    /// public x coordinate with a blinded ladder run and validate it.
    pub fn generate(
        ops: &GroupOps,
        rng: &mut dyn RngCore,
        scratch: &mut GroupOpsScratch,
    ) -> Result<Self, CryptoError> {
        let grp = ops.group();
        grp.mont_params().ok_or(CryptoError::InvalidParams)?;
        let p_len = grp.p_len();
        let bits = grp.bits();

        let mut d = try_alloc_zeroizing_vec::<u8>(p_len)?;
        let mut filled = false;
        for _ in 0..10 {
            rng.generate(&mut d).map_err(CryptoError::from)?;
            if cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&d)).unwrap() == 0 {
                filled = true;
                break;
            }
        }
        if !filled {
            return Err(CryptoError::RandomSamplingRetriesExceeded);
        }

        // Make the most significant bit sit at position `bits`.
        let (_, bitlen) = cmpa::ct_find_last_set_bit_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&d));
        let b = bitlen - 1;
        if b > bits {
            for _ in 0..(b - bits) {
                field::be_shr1(&mut d);
            }
        } else {
            field::be_set_bit(&mut d, bits, 1);
        }
        // And clear the last three.
        field::be_set_bit(&mut d, 0, 0);
        field::be_set_bit(&mut d, 1, 0);
        field::be_set_bit(&mut d, 2, 0);

        let mut pub_x = try_alloc_zeroizing_vec::<u8>(p_len)?;
        let g_x = ops.generator_x()?;
        ops.point_mul_x(&mut pub_x, &d, g_x, Some(rng), scratch)?;
        check_pubkey_x(grp, &pub_x)?;

        Ok(Self { d, pub_x })
    }

    /// Get the private scalar.
    pub fn get_d(&self) -> cmpa::MpBigEndianUIntByteSlice {
        cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.d)
    }

    /// The private scalar, big-endian.
    pub fn d(&self) -> &[u8] {
        &self.d
    }

    /// The public x coordinate, big-endian.
    pub fn pub_x(&self) -> &[u8] {
        &self.pub_x
    }
}

impl zeroize::ZeroizeOnDrop for XEccKey {}

#[cfg(test)]
use super::curve::{CurveId, Group};
#[cfg(test)]
use crate::rng::test_rng;

#[cfg(test)]
const X25519_BASE_X: [u8; 1] = cmpa::hexstr::bytes_from_hexstr_cnst::<1>("09");
// RFC 7748 5.2, first iteration of the iterated test: the clamped scalar
// decoded from 0x09 followed by 31 zero bytes, applied to u = 9. The
// expected output is given there little-endian; this is the same value
// big-endian.
#[cfg(test)]
const X25519_ITER1_SCALAR: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("4000000000000000000000000000000000000000000000000000000000000008");
#[cfg(test)]
const X25519_ITER1_RESULT: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("7930ae1103e8603c784b85b67bb897789f27b72b3e0b35a1bcd727627a8e2c42");

#[test]
fn test_ladder_kat_x25519() {
    let grp = Group::new(CurveId::Curve25519).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();

    let mut result = [0u8; 32];
    ops.point_mul_x(&mut result, &X25519_ITER1_SCALAR, &X25519_BASE_X, None, &mut scratch)
        .unwrap();
    assert_eq!(result, X25519_ITER1_RESULT);

    // Randomized coordinates must not change the result.
    let mut rng = test_rng();
    ops.point_mul_x(
        &mut result,
        &X25519_ITER1_SCALAR,
        &X25519_BASE_X,
        Some(&mut rng),
        &mut scratch,
    )
    .unwrap();
    assert_eq!(result, X25519_ITER1_RESULT);
}

#[test]
fn test_ladder_dh_agreement_x25519() {
    let grp = Group::new(CurveId::Curve25519).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let mut rng = test_rng();

    let alice = XEccKey::generate(&ops, &mut rng, &mut scratch).unwrap();
    let bob = XEccKey::generate(&ops, &mut rng, &mut scratch).unwrap();

    let mut z_alice = [0u8; 32];
    ops.point_mul_x(&mut z_alice, alice.d(), bob.pub_x(), Some(&mut rng), &mut scratch)
        .unwrap();
    let mut z_bob = [0u8; 32];
    ops.point_mul_x(&mut z_bob, bob.d(), alice.pub_x(), Some(&mut rng), &mut scratch)
        .unwrap();
    assert_eq!(z_alice, z_bob);
}

#[test]
fn test_keygen_clamping_x25519() {
    let grp = Group::new(CurveId::Curve25519).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let mut rng = test_rng();

    let key = XEccKey::generate(&ops, &mut rng, &mut scratch).unwrap();
    check_clamped_scalar(&grp, key.d()).unwrap();
    check_pubkey_x(&grp, key.pub_x()).unwrap();

    // A scalar with a low bit set is rejected.
    let mut bad = [0u8; 32];
    bad.copy_from_slice(key.d());
    field::be_set_bit(&mut bad, 0, 1);
    assert!(matches!(
        check_clamped_scalar(&grp, &bad),
        Err(CryptoError::InvalidKey)
    ));
}
