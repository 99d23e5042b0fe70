// SPDX-License-Identifier: Apache-2.0

//! Point arithmetic on short Weierstrass curves.
//!
//! Internally everything runs in Jacobian coordinates (affine map
//! `(X/Z^2, Y/Z^3)`, `Z = 0` encoding the point at infinity). Scalar
//! multiplication uses a fixed comb with the SPA countermeasures from
//! Hedabou/Pinel/Beneteau ("A comb method to render ECC resistant against
//! Side Channel Attacks", ePrint 2004/342): no zero digits, all digits odd,
//! whole-table constant-time selection. Coron's projective coordinate
//! randomization is available as the DPA countermeasure.
//!
//! References for the formulas:
//! - dbl-1998-cmo-2 and madd-2008-g,
//!   http://www.hyperelliptic.org/EFD/g1p/auto-shortw-jacobian.html
//! - GECC = Hankerson, Menezes, Vanstone, Guide to Elliptic Curve
//!   Cryptography (3.2.1, 3.22, 3.44).

extern crate alloc;
use alloc::vec::Vec;

use super::curve::{self, CoeffA, CurveForm};
use super::field::{self, be_set_one};
use super::{GroupOps, GroupOpsScratch, PointOpsScratch};
use crate::rng::RngCore;
use crate::utils_common::{
    alloc::{box_try_new, try_alloc_zeroizing_vec},
    zeroize::{self, Zeroizing},
};
use crate::CryptoError;
use cmpa::{self, MpMutUInt as _, MpUIntCommon as _};

const ECP_MAX_BITS: usize = 384;
/// Upper bound on the comb digit count, `d = ceil(bits / w)` with `w >= 2`.
const COMB_MAX_D: usize = (ECP_MAX_BITS + 1) / 2;
/// Largest supported comb window width.
const COMB_MAX_W: u8 = 7;

/// A point on a short Weierstrass curve in affine coordinates.
///
/// Construction guarantees both coordinates are in `[0, p)`; "Z = 1" is
/// carried by the type, so an `AffinePoint` is always normalized. It is not
/// guaranteed to satisfy the curve equation -- use
/// [`check_pubkey()`](super::check_pubkey) for that.
pub struct AffinePoint {
    pub(crate) x: Zeroizing<Vec<u8>>,
    pub(crate) y: Zeroizing<Vec<u8>>,
}

impl AffinePoint {
    /// Create an `AffinePoint` from "plain" big-endian coordinates.
    ///
    /// Verifies `x, y < p`, but does not check the curve equation.
    pub fn try_from_plain_coordinates(
        x: &cmpa::MpBigEndianUIntByteSlice,
        y: &cmpa::MpBigEndianUIntByteSlice,
        grp: &curve::Group,
    ) -> Result<Self, CryptoError> {
        let p = cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.p());
        if !x.len_is_compatible_with(grp.p_len())
            || !y.len_is_compatible_with(grp.p_len())
            || cmpa::ct_geq_mp_mp(x, &p).unwrap() != 0
            || cmpa::ct_geq_mp_mp(y, &p).unwrap() != 0
        {
            return Err(CryptoError::InvalidPoint);
        }
        Self::try_from_coords_unchecked(x, y, grp.p_len())
    }

    pub(crate) fn try_from_coords_unchecked(
        x: &cmpa::MpBigEndianUIntByteSlice,
        y: &cmpa::MpBigEndianUIntByteSlice,
        p_len: usize,
    ) -> Result<Self, CryptoError> {
        let mut x_buf = try_alloc_zeroizing_vec::<u8>(p_len)?;
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut x_buf).copy_from(x);
        let mut y_buf = try_alloc_zeroizing_vec::<u8>(p_len)?;
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut y_buf).copy_from(y);
        Ok(Self { x: x_buf, y: y_buf })
    }

    /// The affine x coordinate, big-endian, `p_len` bytes.
    pub fn x(&self) -> &[u8] {
        &self.x
    }

    /// The affine y coordinate, big-endian, `p_len` bytes.
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// Copy the coordinates out in "plain" big-endian format.
    pub fn to_plain_coordinates(
        &self,
        result_x: &mut cmpa::MpMutBigEndianUIntByteSlice,
        result_y: Option<&mut cmpa::MpMutBigEndianUIntByteSlice>,
    ) {
        result_x.copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.x));
        if let Some(result_y) = result_y {
            result_y.copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.y));
        }
    }

    pub fn try_clone(&self) -> Result<Self, CryptoError> {
        Self::try_from_coords_unchecked(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.x),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.y),
            self.x.len(),
        )
    }
}

impl zeroize::ZeroizeOnDrop for AffinePoint {}

/// A point on a short Weierstrass curve in Jacobian coordinates.
///
/// `Z = 0` encodes the point at infinity.
pub struct JacobianPoint {
    pub(crate) x: Zeroizing<Vec<u8>>,
    pub(crate) y: Zeroizing<Vec<u8>>,
    pub(crate) z: Zeroizing<Vec<u8>>,
}

impl JacobianPoint {
    pub(crate) fn try_new(p_len: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            x: try_alloc_zeroizing_vec::<u8>(p_len)?,
            y: try_alloc_zeroizing_vec::<u8>(p_len)?,
            z: try_alloc_zeroizing_vec::<u8>(p_len)?,
        })
    }

    pub(crate) fn try_from_affine(pt: &AffinePoint) -> Result<Self, CryptoError> {
        let mut this = Self::try_new(pt.x.len())?;
        this.x.copy_from_slice(&pt.x);
        this.y.copy_from_slice(&pt.y);
        be_set_one(&mut this.z);
        Ok(this)
    }

    pub(crate) fn copy_from(&mut self, src: &JacobianPoint) {
        self.x.copy_from_slice(&src.x);
        self.y.copy_from_slice(&src.y);
        self.z.copy_from_slice(&src.z);
    }

    /// Set to the point at infinity.
    pub(crate) fn set_zero(&mut self) {
        be_set_one(&mut self.x);
        be_set_one(&mut self.y);
        self.z.fill(0);
    }

    /// Whether this is the point at infinity.
    pub fn is_zero(&self) -> bool {
        cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.z)).unwrap() != 0
    }
}

impl zeroize::ZeroizeOnDrop for JacobianPoint {}

/// Precomputed table for the comb method.
///
/// For `i = i_{w-1} ... i_1 i_0` in binary,
/// `pts[i] = i_{w-1} * 2^{(w-1)d} * P + ... + i_1 * 2^d * P + P`.
/// All entries are affine (batch-normalized after construction) and have a
/// non-zero y coordinate.
pub struct CombTable {
    pub(crate) w: u8,
    pub(crate) d: usize,
    pub(crate) pts: Vec<AffinePoint>,
}

impl zeroize::ZeroizeOnDrop for CombTable {}

/// Compute the comb representation of the (odd) scalar `m`.
///
/// Classical comb (GECC 3.44) followed by the odd-digit transform: a sweep
/// forces every `x[1..=d]` odd, carrying the adjustment into the next digit
/// and recording it in the previous digit's sign bit. On return the low
/// seven bits of each `x[i]` hold an odd digit and bit 7 holds the sign.
///
/// `x` must have length `d + 1`; `m` must be odd with a bit length of at
/// most `w * d`, otherwise the representation is incorrect.
fn comb_fixed(x: &mut [u8], d: usize, w: u8, m: &[u8]) {
    debug_assert_eq!(x.len(), d + 1);
    debug_assert!((2..=COMB_MAX_W).contains(&w));
    debug_assert_eq!(field::be_get_bit(m, 0), 1);

    x.fill(0);

    // First get the classical comb values (except for x[d] = 0).
    for i in 0..d {
        for j in 0..w {
            x[i] |= field::be_get_bit(m, i + d * j as usize) << j;
        }
    }

    // Now make sure x[1] .. x[d] are odd.
    let mut c = 0u8;
    for i in 1..=d {
        // Add the carry and update it.
        let cc = x[i] & c;
        x[i] ^= c;
        c = cc;

        // Adjust if needed, avoiding branches.
        let adjust = 1 - (x[i] & 0x01);
        c |= x[i] & (x[i - 1] * adjust);
        x[i] ^= x[i - 1] * adjust;
        x[i - 1] |= adjust << 7;
    }
}

impl<'a> GroupOps<'a> {
    /// The group's generator in affine coordinates.
    pub fn generator(&self) -> Result<AffinePoint, CryptoError> {
        let sw = self.grp.sw_params().ok_or(CryptoError::InvalidParams)?;
        AffinePoint::try_from_coords_unchecked(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(sw.g_x),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(sw.g_y),
            self.grp.p_len(),
        )
    }

    /// Normalize Jacobian coordinates so that `Z == 0 || Z == 1`
    /// (GECC 3.2.1). Cost: 1I + 3M + 1S.
    pub(crate) fn normalize_jac(
        &self,
        pt: &mut JacobianPoint,
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        if pt.is_zero() {
            return Ok(());
        }

        // Zi = 1/Z, ZZi = 1/Z^2
        tmp.t1.copy_from_slice(&pt.z);
        self.field
            .inv(&mut tmp.t0, &mut tmp.t1, [&mut tmp.inv0, &mut tmp.inv1])?;
        self.field.sqr(&mut tmp.t2, &tmp.t0, &mut tmp.wide);

        // X = X / Z^2, Y = Y / Z^3
        self.field.mul_assign(&mut pt.x, &tmp.t2, &mut tmp.wide);
        self.field.mul_assign(&mut pt.y, &tmp.t2, &mut tmp.wide);
        self.field.mul_assign(&mut pt.y, &tmp.t0, &mut tmp.wide);

        be_set_one(&mut pt.z);

        Ok(())
    }

    /// Normalize the Jacobian coordinates of the points selected by `idx`,
    /// using Montgomery's trick to perform only one inversion mod p
    /// (Cohen, "A Course in Computational Algebraic Number Theory",
    /// 10.3.4).
    ///
    /// Fails if one of the points is zero; this never happens for the comb
    /// precomputation, see the choice of `w` in `mul_comb()`.
    ///
    /// Cost: 1I + (6t - 3)M + 1S.
    pub(crate) fn normalize_jac_many(
        &self,
        pts: &mut [JacobianPoint],
        idx: &[usize],
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        let t_len = idx.len();
        debug_assert!(t_len >= 1);
        let p_len = self.grp.p_len();

        // c[k] = Z_0 * ... * Z_k
        let mut c = Vec::new();
        c.try_reserve_exact(t_len)
            .map_err(|_| CryptoError::MemoryAllocationFailure)?;
        for _ in 0..t_len {
            c.push(try_alloc_zeroizing_vec::<u8>(p_len)?);
        }
        c[0].copy_from_slice(&pts[idx[0]].z);
        for k in 1..t_len {
            let (head, tail) = c.split_at_mut(k);
            self.field
                .mul(&mut tail[0], &head[k - 1], &pts[idx[k]].z, &mut tmp.wide);
        }

        // u = 1 / (Z_0 * ... * Z_{t-1}) mod p
        tmp.t1.copy_from_slice(&c[t_len - 1]);
        self.field
            .inv(&mut tmp.t0, &mut tmp.t1, [&mut tmp.inv0, &mut tmp.inv1])?;

        for k in (0..t_len).rev() {
            // Zi = 1 / Z_k, u = 1 / (Z_0 * ... * Z_{k-1})
            if k == 0 {
                tmp.t2.copy_from_slice(&tmp.t0);
            } else {
                self.field.mul(&mut tmp.t2, &tmp.t0, &c[k - 1], &mut tmp.wide);
                self.field
                    .mul_assign(&mut tmp.t0, &pts[idx[k]].z, &mut tmp.wide);
            }

            // Proceed as in normalize_jac().
            self.field.sqr(&mut tmp.t3, &tmp.t2, &mut tmp.wide);
            self.field
                .mul_assign(&mut pts[idx[k]].x, &tmp.t3, &mut tmp.wide);
            self.field
                .mul_assign(&mut pts[idx[k]].y, &tmp.t3, &mut tmp.wide);
            self.field
                .mul_assign(&mut pts[idx[k]].y, &tmp.t2, &mut tmp.wide);
            be_set_one(&mut pts[idx[k]].z);
        }

        Ok(())
    }

    /// Conditionally negate an affine y coordinate without leaking `inv`:
    /// `y <- p - y` iff `inv == 1` and `y != 0`.
    pub(crate) fn safe_invert_y(&self, y: &mut [u8], inv: u8, tmp: &mut PointOpsScratch) {
        // -y mod p = p - y unless y == 0.
        tmp.t0.copy_from_slice(self.field.p_bytes());
        cmpa::ct_sub_mp_mp(
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut tmp.t0),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(y),
        );
        let nonzero = cmpa::ct_eq_l_l(
            cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(y)).unwrap(),
            0,
        );
        let invert = cmpa::LimbChoice::new((inv & 1) as cmpa::LimbType) & nonzero;
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(y)
            .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t0), invert);
    }

    /// Conditional point negation, `Q -> -Q = (X, -Y, Z)`, without leaking
    /// `inv`.
    pub(crate) fn safe_invert_jac(&self, pt: &mut JacobianPoint, inv: u8, tmp: &mut PointOpsScratch) {
        self.safe_invert_y(&mut pt.y, inv, tmp);
    }

    /// Point doubling `R <- 2R`, Jacobian coordinates (dbl-1998-cmo-2).
    ///
    /// The formula variations trading a MUL for a SQR aren't useful as the
    /// MPI engine doesn't distinguish squaring. The `a = -3` branch is the
    /// standard NIST-curve optimization.
    ///
    /// Cost: 4M + 4S (a = -3), 4M + 6S otherwise.
    pub(crate) fn double_jac(
        &self,
        r: &mut JacobianPoint,
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        let sw = self.grp.sw_params().ok_or(CryptoError::Internal)?;

        match sw.a {
            CoeffA::MinusThree => {
                // M = 3 * (X + Z^2) * (X - Z^2)
                self.field.sqr(&mut tmp.t1, &r.z, &mut tmp.wide);
                tmp.t2.copy_from_slice(&r.x);
                self.field.add(&mut tmp.t2, &tmp.t1);
                tmp.t3.copy_from_slice(&r.x);
                self.field.sub(&mut tmp.t3, &tmp.t1);
                self.field.mul(&mut tmp.t1, &tmp.t2, &tmp.t3, &mut tmp.wide);
                tmp.t0.copy_from_slice(&tmp.t1);
                self.field.add(&mut tmp.t0, &tmp.t1);
                self.field.add(&mut tmp.t0, &tmp.t1);
            }
            CoeffA::Value(a) => {
                // M = 3 * X^2 + A * Z^4
                self.field.sqr(&mut tmp.t1, &r.x, &mut tmp.wide);
                tmp.t0.copy_from_slice(&tmp.t1);
                self.field.add(&mut tmp.t0, &tmp.t1);
                self.field.add(&mut tmp.t0, &tmp.t1);
                self.field.sqr(&mut tmp.t2, &r.z, &mut tmp.wide);
                self.field.sqr_assign(&mut tmp.t2, &mut tmp.wide);
                self.field.mul(&mut tmp.t3, a, &tmp.t2, &mut tmp.wide);
                self.field.add(&mut tmp.t0, &tmp.t3);
            }
        }

        // S = 4 * X * Y^2
        self.field.sqr(&mut tmp.t2, &r.y, &mut tmp.wide);
        self.field.dbl(&mut tmp.t2, &mut tmp.t4);
        self.field.mul(&mut tmp.t1, &r.x, &tmp.t2, &mut tmp.wide);
        self.field.dbl(&mut tmp.t1, &mut tmp.t4);

        // U = 8 * Y^4
        self.field.sqr(&mut tmp.t3, &tmp.t2, &mut tmp.wide);
        self.field.dbl(&mut tmp.t3, &mut tmp.t4);

        // T = M^2 - 2 * S
        self.field.sqr(&mut tmp.t2, &tmp.t0, &mut tmp.wide);
        self.field.sub(&mut tmp.t2, &tmp.t1);
        self.field.sub(&mut tmp.t2, &tmp.t1);

        // S = M * (S - T) - U
        self.field.sub(&mut tmp.t1, &tmp.t2);
        self.field.mul(&mut tmp.t4, &tmp.t1, &tmp.t0, &mut tmp.wide);
        self.field.sub(&mut tmp.t4, &tmp.t3);

        // U = 2 * Y * Z
        self.field.mul(&mut tmp.t5, &r.y, &r.z, &mut tmp.wide);
        self.field.dbl(&mut tmp.t5, &mut tmp.t6);

        r.x.copy_from_slice(&tmp.t2);
        r.y.copy_from_slice(&tmp.t4);
        r.z.copy_from_slice(&tmp.t5);

        Ok(())
    }

    /// Mixed addition `R <- R + Q` with `Q` affine (madd-2008-g,
    /// GECC 3.22).
    ///
    /// The special cases (R zero, R == Q, R == -Q) are handled explicitly.
    /// None of them can fire as an intermediate step of the comb loop: all
    /// values there are multiples of the base point with factors below the
    /// group order, R an even and Q an odd multiple, so these branches do
    /// not depend on secret data there.
    ///
    /// Cost: 8M + 3S.
    pub(crate) fn add_mixed_jac(
        &self,
        r: &mut JacobianPoint,
        qx: &[u8],
        qy: &[u8],
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        if r.is_zero() {
            r.x.copy_from_slice(qx);
            r.y.copy_from_slice(qy);
            be_set_one(&mut r.z);
            return Ok(());
        }

        // T1 = Qx * Z^2 - X, T2 = Qy * Z^3 - Y
        self.field.sqr(&mut tmp.t0, &r.z, &mut tmp.wide);
        self.field.mul(&mut tmp.t1, &tmp.t0, &r.z, &mut tmp.wide);
        self.field.mul_assign(&mut tmp.t0, qx, &mut tmp.wide);
        self.field.mul_assign(&mut tmp.t1, qy, &mut tmp.wide);
        self.field.sub(&mut tmp.t0, &r.x);
        self.field.sub(&mut tmp.t1, &r.y);

        let t1_zero =
            cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t0)).unwrap() != 0;
        let t2_zero =
            cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t1)).unwrap() != 0;
        if t1_zero {
            if t2_zero {
                // R == Q
                return self.double_jac(r, tmp);
            }
            // R == -Q
            r.set_zero();
            return Ok(());
        }

        // Z' = Z * T1
        self.field.mul(&mut tmp.t6, &r.z, &tmp.t0, &mut tmp.wide);

        // T3 = X * T1^2, T4 = T1^3
        self.field.sqr(&mut tmp.t2, &tmp.t0, &mut tmp.wide);
        self.field.mul(&mut tmp.t3, &tmp.t2, &tmp.t0, &mut tmp.wide);
        self.field.mul_assign(&mut tmp.t2, &r.x, &mut tmp.wide);

        // X' = T2^2 - 2 * T3 - T4
        tmp.t0.copy_from_slice(&tmp.t2);
        self.field.dbl(&mut tmp.t0, &mut tmp.t5);
        self.field.sqr(&mut tmp.t4, &tmp.t1, &mut tmp.wide);
        self.field.sub(&mut tmp.t4, &tmp.t0);
        self.field.sub(&mut tmp.t4, &tmp.t3);

        // Y' = T2 * (T3 - X') - T4 * Y
        self.field.sub(&mut tmp.t2, &tmp.t4);
        self.field.mul_assign(&mut tmp.t2, &tmp.t1, &mut tmp.wide);
        self.field.mul_assign(&mut tmp.t3, &r.y, &mut tmp.wide);
        self.field.sub(&mut tmp.t2, &tmp.t3);

        r.x.copy_from_slice(&tmp.t4);
        r.y.copy_from_slice(&tmp.t2);
        r.z.copy_from_slice(&tmp.t6);

        Ok(())
    }

    /// Randomize Jacobian coordinates, `(X, Y, Z) -> (l^2 X, l^3 Y, l Z)`
    /// for random `1 < l < p` -- the reverse of normalization.
    ///
    /// Coron's DPA countermeasure ("Resistance against Differential Power
    /// Analysis for Elliptic Curve Cryptosystems", CHES 1999).
    pub(crate) fn randomize_jac(
        &self,
        pt: &mut JacobianPoint,
        rng: &mut dyn RngCore,
        tmp: &mut PointOpsScratch,
    ) -> Result<(), CryptoError> {
        self.field.rand_in_range(&mut tmp.t0, rng)?;

        // Z = l * Z
        self.field.mul(&mut tmp.t1, &pt.z, &tmp.t0, &mut tmp.wide);
        pt.z.copy_from_slice(&tmp.t1);

        // X = l^2 * X
        self.field.sqr(&mut tmp.t1, &tmp.t0, &mut tmp.wide);
        self.field.mul(&mut tmp.t2, &pt.x, &tmp.t1, &mut tmp.wide);
        pt.x.copy_from_slice(&tmp.t2);

        // Y = l^3 * Y
        self.field.mul_assign(&mut tmp.t1, &tmp.t0, &mut tmp.wide);
        self.field.mul(&mut tmp.t2, &pt.y, &tmp.t1, &mut tmp.wide);
        pt.y.copy_from_slice(&tmp.t2);

        Ok(())
    }

    /// Precompute the comb table for base point `(g_x, g_y)`.
    ///
    /// Cost: d(w-1) doublings, 2^(w-1) - w additions and two batch
    /// normalizations.
    pub(crate) fn precompute_comb(
        &self,
        g_x: &[u8],
        g_y: &[u8],
        w: u8,
        d: usize,
        scratch: &mut GroupOpsScratch,
    ) -> Result<CombTable, CryptoError> {
        debug_assert!((2..=COMB_MAX_W).contains(&w));
        debug_assert!(d <= COMB_MAX_D);
        let p_len = self.grp.p_len();
        let pre_len = 1usize << (w - 1);

        let mut t = Vec::new();
        t.try_reserve_exact(pre_len)
            .map_err(|_| CryptoError::MemoryAllocationFailure)?;
        for _ in 0..pre_len {
            t.push(JacobianPoint::try_new(p_len)?);
        }
        let mut idx: Vec<usize> = Vec::new();
        idx.try_reserve_exact(pre_len)
            .map_err(|_| CryptoError::MemoryAllocationFailure)?;

        // T[0] = P and T[2^{k-1}] = 2^{dk} P for k = 1 .. w-1.
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut t[0].x)
            .copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(g_x));
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut t[0].y)
            .copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(g_y));
        be_set_one(&mut t[0].z);

        let mut i = 1;
        while i < pre_len {
            {
                let (lo, hi) = t.split_at_mut(i);
                hi[0].copy_from(&lo[i >> 1]);
            }
            for _ in 0..d {
                self.double_jac(&mut t[i], &mut scratch.tmp)?;
            }
            idx.push(i);
            i <<= 1;
        }
        self.normalize_jac_many(&mut t, &idx, &mut scratch.tmp)?;

        // Compute the remaining entries using the minimal number of
        // additions; T[2^k] must only be updated after its last use.
        idx.clear();
        let mut i = 1;
        while i < pre_len {
            scratch.sel_x.copy_from_slice(&t[i].x);
            scratch.sel_y.copy_from_slice(&t[i].y);
            for j in (0..i).rev() {
                {
                    let (lo, hi) = t.split_at_mut(i);
                    hi[j].copy_from(&lo[j]);
                }
                self.add_mixed_jac(&mut t[i + j], &scratch.sel_x, &scratch.sel_y, &mut scratch.tmp)?;
                idx.push(i + j);
            }
            i <<= 1;
        }
        self.normalize_jac_many(&mut t, &idx, &mut scratch.tmp)?;

        let mut pts = Vec::new();
        pts.try_reserve_exact(pre_len)
            .map_err(|_| CryptoError::MemoryAllocationFailure)?;
        for pt in t {
            let JacobianPoint { x, y, z } = pt;
            drop(z);
            pts.push(AffinePoint { x, y });
        }

        Ok(CombTable { w, d, pts })
    }

    /// Select `(out_x, out_y) = sign(digit) * pts[abs(digit) / 2]`.
    ///
    /// Reads the whole table with conditional assignments to thwart
    /// cache-based timing attacks, then applies the sign bit.
    fn select_comb(
        &self,
        out_x: &mut [u8],
        out_y: &mut [u8],
        table: &CombTable,
        digit: u8,
        tmp: &mut PointOpsScratch,
    ) {
        let ii = (digit & 0x7f) >> 1;
        for (j, pt) in table.pts.iter().enumerate() {
            let cond = cmpa::ct_eq_l_l(j as cmpa::LimbType, ii as cmpa::LimbType);
            cmpa::MpMutBigEndianUIntByteSlice::from_bytes(out_x)
                .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&pt.x), cond);
            cmpa::MpMutBigEndianUIntByteSlice::from_bytes(out_y)
                .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&pt.y), cond);
        }
        self.safe_invert_y(out_y, digit >> 7, tmp);
    }

    /// Core loop of the comb method (GECC 3.44): `R = sum over the comb
    /// digits`, one doubling and one mixed addition per digit.
    fn mul_comb_core(
        &self,
        r: &mut JacobianPoint,
        table: &CombTable,
        digits: &[u8],
        rng: Option<&mut dyn RngCore>,
        scratch: &mut GroupOpsScratch,
    ) -> Result<(), CryptoError> {
        let d = table.d;
        debug_assert_eq!(digits.len(), d + 1);

        // Start with a non-zero point and randomize its coordinates.
        self.select_comb(&mut r.x, &mut r.y, table, digits[d], &mut scratch.tmp);
        be_set_one(&mut r.z);
        if let Some(rng) = rng {
            self.randomize_jac(r, rng, &mut scratch.tmp)?;
        }

        for i in (0..d).rev() {
            self.double_jac(r, &mut scratch.tmp)?;
            self.select_comb(&mut scratch.sel_x, &mut scratch.sel_y, table, digits[i], &mut scratch.tmp);
            self.add_mixed_jac(r, &scratch.sel_x, &scratch.sel_y, &mut scratch.tmp)?;
        }

        Ok(())
    }

    /// Get (building and caching on first use) the widened comb table for
    /// the group's generator.
    fn cached_generator_table(
        &self,
        w: u8,
        scratch: &mut GroupOpsScratch,
    ) -> Result<&'a CombTable, CryptoError> {
        let cell = self.grp.cached_comb();
        if let Some(table) = cell.get() {
            return Ok(table);
        }

        let sw = self.grp.sw_params().ok_or(CryptoError::Internal)?;
        let d = (self.grp.bits() + w as usize - 1) / w as usize;
        let table = self.precompute_comb(sw.g_x, sw.g_y, w, d, scratch)?;
        let table = box_try_new(table).map_err(CryptoError::from)?;
        // A racing initialization may have won; use whatever landed in the
        // latch.
        let _ = cell.set(table);
        cell.get().ok_or(CryptoError::Internal)
    }

    /// Multiplication using the comb method.
    ///
    /// The scalar is first replaced by `m` or `n - m`, whichever is odd
    /// (constant-time selection), so that the comb representation has no
    /// zero digits; the final result is conditionally negated to
    /// compensate.
    fn mul_comb(
        &self,
        scalar: &[u8],
        point: &AffinePoint,
        rng: Option<&mut dyn RngCore>,
        scratch: &mut GroupOpsScratch,
    ) -> Result<AffinePoint, CryptoError> {
        let grp = self.grp;
        let sw = grp.sw_params().ok_or(CryptoError::InvalidParams)?;

        // The odd-scalar substitution below requires an odd group order.
        if field::be_get_bit(grp.n(), 0) != 1 {
            return Err(CryptoError::InvalidParams);
        }

        // Minimize d*w + 2^(w-1) for the curve size; if P == G, widen by
        // one: the table is cached with the group and amortizes over many
        // handshakes.
        let mut w: u8 = if grp.bits() == 384 { 5 } else { 4 };
        let p_eq_g = (cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&point.x),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(sw.g_x),
        ) & cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&point.y),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(sw.g_y),
        ))
        .unwrap()
            != 0;

        let transient;
        let table: &CombTable = if p_eq_g {
            w += 1;
            self.cached_generator_table(w, scratch)?
        } else {
            let d = (grp.bits() + w as usize - 1) / w as usize;
            transient = self.precompute_comb(&point.x, &point.y, w, d, scratch)?;
            &transient
        };

        // M = m if m is odd, else n - m, using the fact that
        // m * P = -(n - m) * P. Constant-time selection.
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.m0)
            .copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(scalar));
        {
            let mut m1 = cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.m1);
            m1.copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.n()));
            cmpa::ct_sub_mp_mp(&mut m1, &cmpa::MpBigEndianUIntByteSlice::from_bytes(&scratch.m0));
        }
        let m_even = cmpa::ct_eq_l_l(field::be_get_bit(&scratch.m0, 0) as cmpa::LimbType, 0);
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.m0)
            .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&scratch.m1), m_even);

        // Go for comb multiplication, R = M * P.
        let mut digits = Zeroizing::from([0u8; COMB_MAX_D + 1]);
        comb_fixed(&mut digits[..table.d + 1], table.d, table.w, &scratch.m0);
        let mut r = JacobianPoint::try_new(grp.p_len())?;
        self.mul_comb_core(&mut r, table, &digits[..table.d + 1], rng, scratch)?;

        // Now get m * P from M * P and normalize it.
        self.safe_invert_jac(&mut r, m_even.select(0, 1) as u8, &mut scratch.tmp);
        self.normalize_jac(&mut r, &mut scratch.tmp)?;

        // 1 <= m < n and P of order n cannot produce the identity.
        if r.is_zero() {
            return Err(CryptoError::Internal);
        }
        let JacobianPoint { x, y, .. } = r;
        Ok(AffinePoint { x, y })
    }

    /// Multiplication `R = m * P`.
    ///
    /// Executes the exact same sequence of base field operations for any
    /// valid `m` and avoids branches and table indices depending on its
    /// value. With `rng` supplied, intermediate results are additionally
    /// randomized to blunt differential side channel attacks; callers
    /// multiplying a secret scalar should pass one.
    ///
    /// `m` must be in `[1, n)`.
    pub fn point_mul(
        &self,
        scalar: &[u8],
        point: &AffinePoint,
        rng: Option<&mut dyn RngCore>,
        scratch: &mut GroupOpsScratch,
    ) -> Result<AffinePoint, CryptoError> {
        match self.grp.form() {
            CurveForm::ShortWeierstrass => {
                self.validate_scalar(scalar)?;
                self.mul_comb(scalar, point, rng, scratch)
            }
            CurveForm::Montgomery => Err(CryptoError::InvalidParams),
        }
    }

    /// Multiplication of the group generator, `R = m * G`.
    pub fn point_mul_g(
        &self,
        scalar: &[u8],
        rng: Option<&mut dyn RngCore>,
        scratch: &mut GroupOpsScratch,
    ) -> Result<AffinePoint, CryptoError> {
        let g = self.generator()?;
        self.point_mul(scalar, &g, rng, scratch)
    }

    /// Addition `R = P + Q`; `None` is the point at infinity.
    pub fn point_add(
        &self,
        p: &AffinePoint,
        q: &AffinePoint,
        scratch: &mut GroupOpsScratch,
    ) -> Result<Option<AffinePoint>, CryptoError> {
        self.grp.sw_params().ok_or(CryptoError::InvalidParams)?;
        let mut r = JacobianPoint::try_from_affine(p)?;
        self.add_mixed_jac(&mut r, &q.x, &q.y, &mut scratch.tmp)?;
        self.normalize_jac(&mut r, &mut scratch.tmp)?;
        if r.is_zero() {
            return Ok(None);
        }
        let JacobianPoint { x, y, .. } = r;
        Ok(Some(AffinePoint { x, y }))
    }

    /// `R = m * P` with shortcuts for `m == 1` and `m == n - 1`.
    /// NOT constant-time.
    fn mul_shortcuts(
        &self,
        m: &[u8],
        point: &AffinePoint,
        scratch: &mut GroupOpsScratch,
    ) -> Result<AffinePoint, CryptoError> {
        let mv = cmpa::MpBigEndianUIntByteSlice::from_bytes(m);

        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.m0).set_to_u8(1);
        if cmpa::ct_eq_mp_mp(&mv, &cmpa::MpBigEndianUIntByteSlice::from_bytes(&scratch.m0)).unwrap() != 0 {
            return point.try_clone();
        }

        {
            let mut nm1 = cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.m1);
            nm1.copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(self.grp.n()));
            cmpa::ct_sub_mp_l(&mut nm1, 1);
        }
        if cmpa::ct_eq_mp_mp(&mv, &cmpa::MpBigEndianUIntByteSlice::from_bytes(&scratch.m1)).unwrap() != 0 {
            // m = -1 mod n: negate the y coordinate.
            let mut r = point.try_clone()?;
            if cmpa::ct_is_zero_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(&r.y)).unwrap() == 0 {
                scratch.tmp.t0.copy_from_slice(self.field.p_bytes());
                cmpa::ct_sub_mp_mp(
                    &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut scratch.tmp.t0),
                    &cmpa::MpBigEndianUIntByteSlice::from_bytes(&r.y),
                );
                r.y.copy_from_slice(&scratch.tmp.t0);
            }
            return Ok(r);
        }

        self.point_mul(m, point, None, scratch)
    }

    /// Linear combination `R = m * G + n * Q`; `None` is the point at
    /// infinity.
    ///
    /// In contrast to [`point_mul()`](Self::point_mul) this does NOT run in
    /// constant time -- it takes shortcut paths for `m` or `n` in
    /// `{1, n - 1}`. It must only be used with public scalars, which is the
    /// case for its purpose, ECDSA signature verification.
    pub fn point_muladd(
        &self,
        m: &[u8],
        n: &[u8],
        q: &AffinePoint,
        scratch: &mut GroupOpsScratch,
    ) -> Result<Option<AffinePoint>, CryptoError> {
        self.grp.sw_params().ok_or(CryptoError::InvalidParams)?;
        let g = self.generator()?;
        let mg = self.mul_shortcuts(m, &g, scratch)?;
        let nq = self.mul_shortcuts(n, q, scratch)?;
        self.point_add(&mg, &nq, scratch)
    }

    /// Whether an affine point satisfies the curve equation
    /// `Y^2 = X^3 + A*X + B (mod p)`, with the `A = -3` fast path.
    pub fn point_is_on_curve(
        &self,
        point: &AffinePoint,
        scratch: &mut GroupOpsScratch,
    ) -> Result<bool, CryptoError> {
        let sw = self.grp.sw_params().ok_or(CryptoError::InvalidParams)?;
        let tmp = &mut scratch.tmp;

        // YY = Y^2, RHS = X * (X^2 + A) + B
        self.field.sqr(&mut tmp.t0, &point.y, &mut tmp.wide);
        self.field.sqr(&mut tmp.t1, &point.x, &mut tmp.wide);
        match sw.a {
            CoeffA::MinusThree => {
                cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut tmp.t2).set_to_u8(3);
                self.field.sub(&mut tmp.t1, &tmp.t2);
            }
            CoeffA::Value(a) => {
                self.field.add(&mut tmp.t1, a);
            }
        }
        self.field.mul_assign(&mut tmp.t1, &point.x, &mut tmp.wide);
        self.field.add(&mut tmp.t1, sw.b);

        Ok(cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t0),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&tmp.t1),
        )
        .unwrap()
            != 0)
    }
}

#[cfg(test)]
use super::curve::{CurveId, Group};
#[cfg(test)]
use crate::rng::test_rng;
#[cfg(test)]
use crate::utils_common::alloc::try_alloc_vec;

#[cfg(all(test, feature = "ecc_nist_p256"))]
const P256_2G_X: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("7cf27b188d034f7e8a52380304b51ac3c08969e277f21b35a60b48fc47669978");
#[cfg(all(test, feature = "ecc_nist_p256"))]
const P256_2G_Y: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("07775510db8ed040293d9ac69f7430dbba7dade63ce982299e04b79d227873d1");

#[cfg(all(test, feature = "ecc_nist_p384"))]
const P384_2G_X: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "08d999057ba3d2d969260045c55b97f089025959a6f434d651d207d19fb96e9e\
     4fe0e86ebe0e64f85b96a9c75295df61",
);
#[cfg(all(test, feature = "ecc_nist_p384"))]
const P384_2G_Y: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "8e80f1fa5b1b3cedb7bfe8dffd6dba74b275d875bc6cc43e904e505f256ab425\
     5ffd43e94d39e22d61501e700a940e80",
);

#[cfg(test)]
fn test_scalar_bytes(grp: &Group, v: u8) -> Zeroizing<Vec<u8>> {
    let mut m = try_alloc_zeroizing_vec::<u8>(grp.n_len()).unwrap();
    let last = m.len() - 1;
    m[last] = v;
    m
}

#[cfg(test)]
fn test_mul_one_and_two_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    // 1 * G == G
    let one = test_scalar_bytes(&grp, 1);
    let r = ops.point_mul(&one, &g, None, &mut scratch).unwrap();
    assert_eq!(r.x(), g.x());
    assert_eq!(r.y(), g.y());

    // 2 * G == G + G (which takes the doubling branch)
    let two = test_scalar_bytes(&grp, 2);
    let r2 = ops.point_mul(&two, &g, None, &mut scratch).unwrap();
    let sum = ops.point_add(&g, &g, &mut scratch).unwrap().unwrap();
    assert_eq!(r2.x(), sum.x());
    assert_eq!(r2.y(), sum.y());

    // The non-generator path (transient table) agrees: 2*(2G) == 4*G.
    let four = test_scalar_bytes(&grp, 4);
    let r4 = ops.point_mul(&four, &g, None, &mut scratch).unwrap();
    let r2x2 = ops.point_mul(&two, &r2, None, &mut scratch).unwrap();
    assert_eq!(r4.x(), r2x2.x());
    assert_eq!(r4.y(), r2x2.y());

    // And blinding does not change the result.
    let mut rng = test_rng();
    let r2_blinded = ops.point_mul(&two, &g, Some(&mut rng), &mut scratch).unwrap();
    assert_eq!(r2_blinded.x(), r2.x());
    assert_eq!(r2_blinded.y(), r2.y());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_mul_one_and_two_nist_p256() {
    test_mul_one_and_two_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_mul_one_and_two_nist_p384() {
    test_mul_one_and_two_common(CurveId::Secp384r1)
}

#[cfg(all(test, feature = "ecc_nist_p256"))]
#[test]
fn test_mul_kat_nist_p256() {
    let grp = Group::new(CurveId::Secp256r1).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();
    let two = test_scalar_bytes(&grp, 2);
    let r = ops.point_mul(&two, &g, None, &mut scratch).unwrap();
    assert_eq!(r.x(), &P256_2G_X);
    assert_eq!(r.y(), &P256_2G_Y);
}

#[cfg(all(test, feature = "ecc_nist_p384"))]
#[test]
fn test_mul_kat_nist_p384() {
    let grp = Group::new(CurveId::Secp384r1).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();
    let two = test_scalar_bytes(&grp, 2);
    let r = ops.point_mul(&two, &g, None, &mut scratch).unwrap();
    assert_eq!(r.x(), &P384_2G_X);
    assert_eq!(r.y(), &P384_2G_Y);
}

#[cfg(test)]
fn test_add_special_cases_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    // P + (-P) is the point at infinity.
    let mut neg_g = g.try_clone().unwrap();
    {
        let mut y = try_alloc_vec::<u8>(grp.p_len()).unwrap();
        y.copy_from_slice(grp.p());
        cmpa::ct_sub_mp_mp(
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut y),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&g.y),
        );
        neg_g.y.copy_from_slice(&y);
    }
    assert!(ops.point_add(&g, &neg_g, &mut scratch).unwrap().is_none());

    // 0 + Q == Q through the mixed-add zero branch.
    let mut r = JacobianPoint::try_new(grp.p_len()).unwrap();
    r.set_zero();
    assert!(r.is_zero());
    ops.add_mixed_jac(&mut r, &g.x, &g.y, &mut scratch.tmp).unwrap();
    ops.normalize_jac(&mut r, &mut scratch.tmp).unwrap();
    assert_eq!(&r.x[..], g.x());
    assert_eq!(&r.y[..], g.y());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_add_special_cases_nist_p256() {
    test_add_special_cases_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_add_special_cases_nist_p384() {
    test_add_special_cases_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_mul_linearity_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    let k1 = test_scalar_bytes(&grp, 0x5b);
    let k2 = test_scalar_bytes(&grp, 0xa7);
    let mut k_sum = try_alloc_zeroizing_vec::<u8>(grp.n_len()).unwrap();
    k_sum.copy_from_slice(&k1);
    cmpa::ct_add_mod_mp_mp(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut k_sum),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&k2),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.n()),
    )
    .unwrap();

    let lhs = ops.point_mul(&k_sum, &g, None, &mut scratch).unwrap();
    let r1 = ops.point_mul(&k1, &g, None, &mut scratch).unwrap();
    let r2 = ops.point_mul(&k2, &g, None, &mut scratch).unwrap();
    let rhs = ops.point_add(&r1, &r2, &mut scratch).unwrap().unwrap();
    assert_eq!(lhs.x(), rhs.x());
    assert_eq!(lhs.y(), rhs.y());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_mul_linearity_nist_p256() {
    test_mul_linearity_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_mul_linearity_nist_p384() {
    test_mul_linearity_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_mul_on_curve_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();
    assert!(ops.point_is_on_curve(&g, &mut scratch).unwrap());

    let k = test_scalar_bytes(&grp, 0xe3);
    let r = ops.point_mul(&k, &g, None, &mut scratch).unwrap();
    assert!(ops.point_is_on_curve(&r, &mut scratch).unwrap());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_mul_on_curve_nist_p256() {
    test_mul_on_curve_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_mul_on_curve_nist_p384() {
    test_mul_on_curve_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_batch_normalize_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let mut rng = test_rng();
    let g = ops.generator().unwrap();

    // Three de-normalized multiples of G.
    let mut pts = Vec::new();
    for _ in 0..3 {
        let mut pt = JacobianPoint::try_from_affine(&g).unwrap();
        ops.double_jac(&mut pt, &mut scratch.tmp).unwrap();
        ops.randomize_jac(&mut pt, &mut rng, &mut scratch.tmp).unwrap();
        pts.push(pt);
    }
    // One more doubling on the last to de-duplicate them.
    ops.double_jac(&mut pts[1], &mut scratch.tmp).unwrap();
    ops.double_jac(&mut pts[2], &mut scratch.tmp).unwrap();
    ops.double_jac(&mut pts[2], &mut scratch.tmp).unwrap();

    let mut expected = Vec::new();
    for pt in pts.iter() {
        let mut copy = JacobianPoint::try_new(grp.p_len()).unwrap();
        copy.copy_from(pt);
        ops.normalize_jac(&mut copy, &mut scratch.tmp).unwrap();
        expected.push(copy);
    }

    ops.normalize_jac_many(&mut pts, &[0, 1, 2], &mut scratch.tmp).unwrap();
    for (pt, exp) in pts.iter().zip(expected.iter()) {
        assert_eq!(&pt.x[..], &exp.x[..]);
        assert_eq!(&pt.y[..], &exp.y[..]);
        assert_eq!(&pt.z[..], &exp.z[..]);
    }
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_batch_normalize_nist_p256() {
    test_batch_normalize_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_batch_normalize_nist_p384() {
    test_batch_normalize_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_comb_recoding_common(curve_id: CurveId) {
    // Reconstructing sum_i sign_i * digit_i over the comb alphabet must
    // reproduce the recoded scalar.
    let grp = Group::new(curve_id).unwrap();
    let w: u8 = if grp.bits() == 384 { 5 } else { 4 };
    let d = (grp.bits() + w as usize - 1) / w as usize;

    // An odd scalar with structure across all windows.
    let mut m = try_alloc_vec::<u8>(grp.n_len()).unwrap();
    let mut rng = test_rng();
    crate::rng::RngCore::generate(&mut rng, &mut m).unwrap();
    let last = m.len() - 1;
    m[last] |= 1;
    // Keep it below n by clearing the top byte.
    m[0] = 0;

    let mut digits = [0u8; COMB_MAX_D + 1];
    comb_fixed(&mut digits[..d + 1], d, w, &m);

    let mut acc_pos = try_alloc_vec::<u8>(2 * grp.n_len()).unwrap();
    let mut acc_neg = try_alloc_vec::<u8>(2 * grp.n_len()).unwrap();
    for (i, digit) in digits[..d + 1].iter().enumerate() {
        let sign = digit >> 7;
        let mag = digit & 0x7f;
        for j in 0..w as usize {
            if (mag >> j) & 1 != 0 {
                let acc = if sign != 0 { &mut acc_neg } else { &mut acc_pos };
                let mut bit = try_alloc_vec::<u8>(2 * grp.n_len()).unwrap();
                field::be_set_bit(&mut bit, i + d * j, 1);
                cmpa::ct_add_mp_mp(
                    &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(acc),
                    &cmpa::MpBigEndianUIntByteSlice::from_bytes(&bit),
                );
            }
        }
    }
    cmpa::ct_sub_mp_mp(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut acc_pos),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&acc_neg),
    );
    assert_ne!(
        cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&acc_pos),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&m)
        )
        .unwrap(),
        0
    );
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_comb_recoding_nist_p256() {
    test_comb_recoding_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_comb_recoding_nist_p384() {
    test_comb_recoding_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_muladd_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    // m*G + n*G == (m + n)*G
    let m = test_scalar_bytes(&grp, 0x2d);
    let n = test_scalar_bytes(&grp, 0x31);
    let sum = test_scalar_bytes(&grp, 0x2d + 0x31);
    let lhs = ops.point_muladd(&m, &n, &g, &mut scratch).unwrap().unwrap();
    let rhs = ops.point_mul(&sum, &g, None, &mut scratch).unwrap();
    assert_eq!(lhs.x(), rhs.x());
    assert_eq!(lhs.y(), rhs.y());

    // The m == 1 shortcut: 1*G + 1*G == 2*G.
    let one = test_scalar_bytes(&grp, 1);
    let two = test_scalar_bytes(&grp, 2);
    let lhs = ops.point_muladd(&one, &one, &g, &mut scratch).unwrap().unwrap();
    let rhs = ops.point_mul(&two, &g, None, &mut scratch).unwrap();
    assert_eq!(lhs.x(), rhs.x());

    // The m == n - 1 shortcut: (n-1)*G + 1*G is the identity.
    let mut n_minus_1 = try_alloc_zeroizing_vec::<u8>(grp.n_len()).unwrap();
    n_minus_1.copy_from_slice(grp.n());
    cmpa::ct_sub_mp_l(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut n_minus_1),
        1,
    );
    assert!(ops
        .point_muladd(&n_minus_1, &one, &g, &mut scratch)
        .unwrap()
        .is_none());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_muladd_nist_p256() {
    test_muladd_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_muladd_nist_p384() {
    test_muladd_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_mul_trace_independent_of_scalar_common(curve_id: CurveId) {
    // The sequence of base field multiplications must not depend on the
    // scalar: compare operation counts for two very different scalars.
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    // Warm the cached generator table so both runs take the same path.
    let one = test_scalar_bytes(&grp, 1);
    ops.point_mul(&one, &g, None, &mut scratch).unwrap();

    let k1 = test_scalar_bytes(&grp, 2);
    let mut k2 = try_alloc_zeroizing_vec::<u8>(grp.n_len()).unwrap();
    k2.copy_from_slice(grp.n());
    cmpa::ct_sub_mp_l(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut k2),
        2,
    );

    ops.field().reset_mul_count();
    ops.point_mul(&k1, &g, None, &mut scratch).unwrap();
    let count1 = ops.field().mul_count();

    ops.field().reset_mul_count();
    ops.point_mul(&k2, &g, None, &mut scratch).unwrap();
    let count2 = ops.field().mul_count();

    assert_eq!(count1, count2);
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_mul_trace_independent_of_scalar_nist_p256() {
    test_mul_trace_independent_of_scalar_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_mul_trace_independent_of_scalar_nist_p384() {
    test_mul_trace_independent_of_scalar_common(CurveId::Secp384r1)
}
