// SPDX-License-Identifier: Apache-2.0

//! Modular arithmetic on the curve's base field.
//!
//! All field elements are fully reduced big-endian byte buffers of the
//! prime's width. Multiplication runs the generic `cmpa` multiplier into a
//! double-width scratch buffer and then the curve's fast reduction
//! (FIPS 186-4, D.2: the NIST primes are sums/differences of few powers of
//! 2^32, so a double-width value reduces with word shuffling instead of
//! division).

use crate::rng::RngCore;
use crate::CryptoError;
use cmpa::{self, MpMutUInt as _};

/// Modular arithmetic for one curve's base field.
///
/// The spec-level contract: every public operation returns results in
/// `[0, p)`, and the sequence of executed word operations does not depend on
/// the values involved.
pub(crate) struct FieldOps<'a> {
    p: &'a [u8],
    nbits: usize,
    fast_mod: fn(&mut [u8]),
    #[cfg(test)]
    mul_count: core::cell::Cell<usize>,
}

impl<'a> FieldOps<'a> {
    pub fn new(p: &'a [u8], nbits: usize, fast_mod: fn(&mut [u8])) -> Self {
        Self {
            p,
            nbits,
            fast_mod,
            #[cfg(test)]
            mul_count: core::cell::Cell::new(0),
        }
    }

    pub fn p(&self) -> cmpa::MpBigEndianUIntByteSlice<'a> {
        cmpa::MpBigEndianUIntByteSlice::from_bytes(self.p)
    }

    pub fn p_bytes(&self) -> &'a [u8] {
        self.p
    }

    pub fn p_len(&self) -> usize {
        self.p.len()
    }

    #[allow(unused)]
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    #[cfg(test)]
    pub fn reset_mul_count(&self) {
        self.mul_count.set(0);
    }

    #[cfg(test)]
    pub fn mul_count(&self) -> usize {
        self.mul_count.get()
    }

    fn count_mul(&self) {
        #[cfg(test)]
        self.mul_count.set(self.mul_count.get() + 1);
    }

    fn mul_into_wide(&self, op0: &[u8], op1: &[u8], wide: &mut [u8]) {
        debug_assert_eq!(wide.len(), 2 * self.p_len());
        let mut w = cmpa::MpMutBigEndianUIntByteSlice::from_bytes(wide);
        w.copy_from(&cmpa::MpBigEndianUIntByteSlice::from_bytes(op0));
        cmpa::ct_mul_trunc_mp_mp(
            &mut w,
            self.p_len(),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(op1),
        );
        self.count_mul();
    }

    /// `result = op0 * op1 mod p`.
    pub fn mul(&self, result: &mut [u8], op0: &[u8], op1: &[u8], wide: &mut [u8]) {
        self.mul_into_wide(op0, op1, wide);
        (self.fast_mod)(wide);
        result.copy_from_slice(&wide[self.p_len()..]);
    }

    /// `op0 = op0 * op1 mod p`.
    pub fn mul_assign(&self, op0: &mut [u8], op1: &[u8], wide: &mut [u8]) {
        self.mul_into_wide(op0, op1, wide);
        (self.fast_mod)(wide);
        op0.copy_from_slice(&wide[self.p_len()..]);
    }

    /// `result = op0^2 mod p`.
    ///
    /// The MPI engine does not distinguish squaring from multiplication, so
    /// this shares the multiplier; it stays a separate entry point because
    /// the point formulas are written in terms of it.
    pub fn sqr(&self, result: &mut [u8], op0: &[u8], wide: &mut [u8]) {
        self.mul(result, op0, op0, wide);
    }

    /// `op0 = op0^2 mod p`.
    pub fn sqr_assign(&self, op0: &mut [u8], wide: &mut [u8]) {
        self.mul_into_wide(op0, op0, wide);
        (self.fast_mod)(wide);
        op0.copy_from_slice(&wide[self.p_len()..]);
    }

    /// `op0 = op0 + op1 mod p`. Both operands must already be in `[0, p)`.
    pub fn add(&self, op0: &mut [u8], op1: &[u8]) {
        cmpa::ct_add_mod_mp_mp(
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(op0),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(op1),
            &self.p(),
        )
        .unwrap();
    }

    /// `op0 = op0 - op1 mod p`. Both operands must already be in `[0, p)`.
    pub fn sub(&self, op0: &mut [u8], op1: &[u8]) {
        cmpa::ct_sub_mod_mp_mp(
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(op0),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(op1),
            &self.p(),
        )
        .unwrap();
    }

    /// `op0 = 2 * op0 mod p`.
    pub fn dbl(&self, op0: &mut [u8], tmp: &mut [u8]) {
        tmp.copy_from_slice(op0);
        self.add(op0, tmp);
    }

    /// Bring a value in `[0, 2p)` into `[0, p)` with one conditional
    /// subtraction.
    pub fn reduce_once(&self, op0: &mut [u8], tmp: &mut [u8]) {
        tmp.copy_from_slice(op0);
        {
            let mut t = cmpa::MpMutBigEndianUIntByteSlice::from_bytes(tmp);
            cmpa::ct_sub_mp_mp(&mut t, &self.p());
        }
        let ge = cmpa::ct_geq_mp_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(op0), &self.p());
        cmpa::MpMutBigEndianUIntByteSlice::from_bytes(op0)
            .copy_from_cond(&cmpa::MpBigEndianUIntByteSlice::from_bytes(tmp), ge);
    }

    /// `result = op^(-1) mod p`. `op` is destroyed.
    ///
    /// Fails with [`CryptoError::InvalidPoint`] when `op` and `p` are not
    /// coprime, i.e. when `op` is zero mod the prime -- the callers translate
    /// that into their point-at-infinity handling.
    pub fn inv(
        &self,
        result: &mut [u8],
        op: &mut [u8],
        scratch: [&mut [cmpa::LimbType]; 2],
    ) -> Result<(), CryptoError> {
        match cmpa::ct_inv_mod_odd_mp_mp(
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(result),
            &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(op),
            &self.p(),
            scratch,
        ) {
            Ok(()) => Ok(()),
            Err(cmpa::CtInvModOddMpMpError::OperandsNotCoprime) => Err(CryptoError::InvalidPoint),
            Err(_) => Err(CryptoError::Internal),
        }
    }

    /// Sample a uniform `l` with `1 < l < p`, the blinding factor for the
    /// projective coordinate randomization.
    ///
    /// Mirrors the generation loop from RFC 6979-style scalar sampling:
    /// draw, shift into range, retry. Gives up after 10 attempts.
    pub fn rand_in_range(&self, l: &mut [u8], rng: &mut dyn RngCore) -> Result<(), CryptoError> {
        debug_assert_eq!(l.len(), self.p_len());
        for _ in 0..10 {
            rng.generate(l).map_err(CryptoError::from)?;
            while cmpa::ct_geq_mp_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(l), &self.p()).unwrap() != 0 {
                be_shr1(l);
            }
            let (is_nonzero, bitlen) =
                cmpa::ct_find_last_set_bit_mp(&cmpa::MpBigEndianUIntByteSlice::from_bytes(l));
            if is_nonzero.unwrap() != 0 && bitlen >= 2 {
                return Ok(());
            }
        }
        Err(CryptoError::RandomSamplingRetriesExceeded)
    }
}

/// Read bit `pos` of a big-endian buffer; out-of-range positions read as 0.
pub(crate) fn be_get_bit(buf: &[u8], pos: usize) -> u8 {
    let byte = pos / 8;
    if byte >= buf.len() {
        return 0;
    }
    (buf[buf.len() - 1 - byte] >> (pos % 8)) & 1
}

/// Set or clear bit `pos` of a big-endian buffer.
pub(crate) fn be_set_bit(buf: &mut [u8], pos: usize, val: u8) {
    let byte = pos / 8;
    debug_assert!(byte < buf.len());
    let idx = buf.len() - 1 - byte;
    let mask = 1u8 << (pos % 8);
    buf[idx] = (buf[idx] & !mask) | (if val != 0 { mask } else { 0 });
}

/// Shift a big-endian buffer right by one bit.
pub(crate) fn be_shr1(buf: &mut [u8]) {
    let mut carry = 0u8;
    for b in buf.iter_mut() {
        let next = *b & 1;
        *b = (*b >> 1) | (carry << 7);
        carry = next;
    }
}

/// Set a big-endian buffer to the value 1.
pub(crate) fn be_set_one(buf: &mut [u8]) {
    buf.fill(0);
    let last = buf.len() - 1;
    buf[last] = 1;
}

// The fast reductions below work on the double-width product as an array of
// 32-bit words, least significant first; a[i] is the coefficient of 2^(32i).

fn load_words<const W: usize>(wide: &[u8]) -> [u32; W] {
    debug_assert_eq!(wide.len(), 4 * W);
    let mut a = [0u32; W];
    for (i, chunk) in wide.rchunks_exact(4).enumerate() {
        a[i] = u32::from_be_bytes(chunk.try_into().unwrap());
    }
    a
}

fn store_result(wide: &mut [u8], w: &[u32]) {
    let len = wide.len();
    wide[..len - 4 * w.len()].fill(0);
    for (i, word) in w.iter().enumerate() {
        let hi = len - 4 * i;
        wide[hi - 4..hi].copy_from_slice(&word.to_be_bytes());
    }
}

/// Add `c * r` into `w`, returning the overflow out of the top word.
fn fold_carry<const N: usize>(w: &mut [u32; N], c: u64, r: &[u32; N]) -> u64 {
    let mut carry = 0u64;
    for i in 0..N {
        let v = w[i] as u64 + c * (r[i] as u64) + carry;
        w[i] = v as u32;
        carry = v >> 32;
    }
    carry
}

/// Subtract `p` from `w` iff the result would not underflow, branch-free.
fn cond_sub<const N: usize>(w: &mut [u32; N], p: &[u32; N]) {
    let mut t = [0u32; N];
    let mut borrow = 0i64;
    for i in 0..N {
        let v = w[i] as i64 - p[i] as i64 - borrow;
        t[i] = v as u32;
        borrow = (v >> 32) & 1;
    }
    let mask = 0u32.wrapping_sub((borrow == 0) as u32);
    for i in 0..N {
        w[i] = (t[i] & mask) | (w[i] & !mask);
    }
}

/// Common tail of the NIST reductions: propagate the signed per-word sums
/// (biased by `8p`, so the total is non-negative), fold the carry above
/// 2^(32N) back in via `2^(32N) mod p = r`, and do the final conditional
/// subtraction.
fn finish_nist_reduction<const N: usize>(
    wide: &mut [u8],
    acc: &[i64; N],
    p_words: &[u32; N],
    r_words: &[u32; N],
) {
    let mut w = [0u32; N];
    let mut carry = 0i64;
    for i in 0..N {
        let v = acc[i] + carry;
        w[i] = v as u32;
        carry = v >> 32;
    }
    debug_assert!(carry >= 0);
    let mut c = carry as u64;
    // After the first fold the carry is at most 1, after the third it is
    // provably gone.
    for _ in 0..3 {
        c = fold_carry(&mut w, c, r_words);
    }
    debug_assert_eq!(c, 0);
    cond_sub(&mut w, p_words);
    store_result(wide, &w);
}

const P256_WORDS: [u32; 8] = [
    0xffffffff, 0xffffffff, 0xffffffff, 0x00000000, 0x00000000, 0x00000000, 0x00000001, 0xffffffff,
];
// 2^256 mod p256
const P256_R_WORDS: [u32; 8] = [
    0x00000001, 0x00000000, 0x00000000, 0xffffffff, 0xffffffff, 0xffffffff, 0xfffffffe, 0x00000000,
];

/// Fast reduction modulo the NIST P-256 prime, FIPS 186-4 D.2.3.
///
/// `wide` holds a 512-bit non-negative value (a product of two reduced
/// elements); on return its low half holds the fully reduced result and the
/// high half is cleared.
pub(crate) fn reduce_p256(wide: &mut [u8]) {
    let a: [u32; 16] = load_words(wide);
    let a = |i: usize| a[i] as i64;

    // t + 8p; the bias keeps the signed sum non-negative throughout.
    let mut acc = [0i64; 8];
    for i in 0..8 {
        acc[i] = a(i) + ((P256_WORDS[i] as i64) << 3);
    }
    // 2*s1 = 2*( 0, 0, 0, a11, a12, a13, a14, a15 )
    acc[3] += 2 * a(11);
    acc[4] += 2 * a(12);
    acc[5] += 2 * a(13);
    acc[6] += 2 * a(14);
    acc[7] += 2 * a(15);
    // 2*s2 = 2*( 0, 0, 0, a12, a13, a14, a15, 0 )
    acc[3] += 2 * a(12);
    acc[4] += 2 * a(13);
    acc[5] += 2 * a(14);
    acc[6] += 2 * a(15);
    // s3 = ( a8, a9, a10, 0, 0, 0, a14, a15 )
    acc[0] += a(8);
    acc[1] += a(9);
    acc[2] += a(10);
    acc[6] += a(14);
    acc[7] += a(15);
    // s4 = ( a9, a10, a11, a13, a14, a15, a13, a8 )
    acc[0] += a(9);
    acc[1] += a(10);
    acc[2] += a(11);
    acc[3] += a(13);
    acc[4] += a(14);
    acc[5] += a(15);
    acc[6] += a(13);
    acc[7] += a(8);
    // d1 = ( a11, a12, a13, 0, 0, 0, a8, a10 )
    acc[0] -= a(11);
    acc[1] -= a(12);
    acc[2] -= a(13);
    acc[6] -= a(8);
    acc[7] -= a(10);
    // d2 = ( a12, a13, a14, a15, 0, 0, a9, a11 )
    acc[0] -= a(12);
    acc[1] -= a(13);
    acc[2] -= a(14);
    acc[3] -= a(15);
    acc[6] -= a(9);
    acc[7] -= a(11);
    // d3 = ( a13, a14, a15, a8, a9, a10, 0, a12 )
    acc[0] -= a(13);
    acc[1] -= a(14);
    acc[2] -= a(15);
    acc[3] -= a(8);
    acc[4] -= a(9);
    acc[5] -= a(10);
    acc[7] -= a(12);
    // d4 = ( a14, a15, 0, a9, a10, a11, 0, a13 )
    acc[0] -= a(14);
    acc[1] -= a(15);
    acc[3] -= a(9);
    acc[4] -= a(10);
    acc[5] -= a(11);
    acc[7] -= a(13);

    finish_nist_reduction(wide, &acc, &P256_WORDS, &P256_R_WORDS);
}

const P384_WORDS: [u32; 12] = [
    0xffffffff, 0x00000000, 0x00000000, 0xffffffff, 0xfffffffe, 0xffffffff, 0xffffffff, 0xffffffff,
    0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff,
];
// 2^384 mod p384
const P384_R_WORDS: [u32; 12] = [
    0x00000001, 0xffffffff, 0xffffffff, 0x00000000, 0x00000001, 0x00000000, 0x00000000, 0x00000000,
    0x00000000, 0x00000000, 0x00000000, 0x00000000,
];

/// Fast reduction modulo the NIST P-384 prime, FIPS 186-4 D.2.4.
pub(crate) fn reduce_p384(wide: &mut [u8]) {
    let a: [u32; 24] = load_words(wide);
    let a = |i: usize| a[i] as i64;

    // t + 8p
    let mut acc = [0i64; 12];
    for i in 0..12 {
        acc[i] = a(i) + ((P384_WORDS[i] as i64) << 3);
    }
    // 2*s1 = 2*( 0, 0, 0, 0, a21, a22, a23, 0, 0, 0, 0, 0 )
    acc[4] += 2 * a(21);
    acc[5] += 2 * a(22);
    acc[6] += 2 * a(23);
    // s2 = ( a12, a13, ..., a23 )
    for j in 0..12 {
        acc[j] += a(12 + j);
    }
    // s3 = ( a21, a22, a23, a12, a13, ..., a20 )
    acc[0] += a(21);
    acc[1] += a(22);
    acc[2] += a(23);
    for j in 3..12 {
        acc[j] += a(9 + j);
    }
    // s4 = ( 0, a23, 0, a20, a12, a13, ..., a19 )
    acc[1] += a(23);
    acc[3] += a(20);
    for j in 4..12 {
        acc[j] += a(8 + j);
    }
    // s5 = ( 0, 0, 0, 0, a20, a21, a22, a23, 0, 0, 0, 0 )
    acc[4] += a(20);
    acc[5] += a(21);
    acc[6] += a(22);
    acc[7] += a(23);
    // s6 = ( a20, 0, 0, a21, a22, a23, 0, 0, 0, 0, 0, 0 )
    acc[0] += a(20);
    acc[3] += a(21);
    acc[4] += a(22);
    acc[5] += a(23);
    // d1 = ( a23, a12, a13, ..., a22 )
    acc[0] -= a(23);
    for j in 1..12 {
        acc[j] -= a(11 + j);
    }
    // d2 = ( 0, a20, a21, a22, a23, 0, 0, 0, 0, 0, 0, 0 )
    acc[1] -= a(20);
    acc[2] -= a(21);
    acc[3] -= a(22);
    acc[4] -= a(23);
    // d3 = ( 0, 0, 0, a23, a23, 0, 0, 0, 0, 0, 0, 0 )
    acc[3] -= a(23);
    acc[4] -= a(23);

    finish_nist_reduction(wide, &acc, &P384_WORDS, &P384_R_WORDS);
}

#[cfg(feature = "ecc_curve25519")]
const P25519_WORDS: [u32; 8] = [
    0xffffffed, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff, 0xffffffff, 0x7fffffff,
];

/// Fast reduction modulo 2^255 - 19.
///
/// `2^256 = 38 (mod p)`, so the high half folds in with one small
/// multiplication, and the spare top bit with a multiple of 19.
#[cfg(feature = "ecc_curve25519")]
pub(crate) fn reduce_p25519(wide: &mut [u8]) {
    let a: [u32; 16] = load_words(wide);

    let mut w = [0u32; 8];
    let mut carry = 0u64;
    for i in 0..8 {
        let v = a[i] as u64 + 38 * (a[8 + i] as u64) + carry;
        w[i] = v as u32;
        carry = v >> 32;
    }
    // Fold the overflow above 2^256 back in, twice; the second pass cannot
    // overflow again.
    let mut c = carry * 38;
    for _ in 0..2 {
        for word in w.iter_mut() {
            let v = *word as u64 + c;
            *word = v as u32;
            c = v >> 32;
        }
        c *= 38;
    }
    debug_assert_eq!(c, 0);
    // Fold bit 255: 2^255 = 19 (mod p).
    let top = (w[7] >> 31) as u64;
    w[7] &= 0x7fffffff;
    c = top * 19;
    for word in w.iter_mut() {
        let v = *word as u64 + c;
        *word = v as u32;
        c = v >> 32;
    }
    cond_sub(&mut w, &P25519_WORDS);
    store_result(wide, &w);
}

#[cfg(test)]
extern crate alloc;
#[cfg(test)]
use crate::utils_common::alloc::try_alloc_vec;

#[cfg(test)]
fn test_field_ops(grp: &super::curve::Group) -> (FieldOps<'_>, alloc::vec::Vec<u8>) {
    let wide = try_alloc_vec::<u8>(2 * grp.p_len()).unwrap();
    (FieldOps::new(grp.p(), grp.bits(), grp.fast_mod()), wide)
}

#[cfg(test)]
fn test_reduction_kats_common(curve_id: super::curve::CurveId) {
    let grp = super::curve::Group::new(curve_id).unwrap();
    let (field, mut wide) = test_field_ops(&grp);
    let p_len = grp.p_len();

    // (p - 1)^2 = 1 (mod p)
    let mut p_minus_1 = try_alloc_vec::<u8>(p_len).unwrap();
    p_minus_1.copy_from_slice(grp.p());
    cmpa::ct_sub_mp_l(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut p_minus_1),
        1,
    );
    let mut r = try_alloc_vec::<u8>(p_len).unwrap();
    field.sqr(&mut r, &p_minus_1, &mut wide);
    let mut one = try_alloc_vec::<u8>(p_len).unwrap();
    be_set_one(&mut one);
    assert_ne!(
        cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&r),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&one)
        )
        .unwrap(),
        0
    );

    // (p - 1) * (p - 2) = 2 (mod p)
    let mut p_minus_2 = try_alloc_vec::<u8>(p_len).unwrap();
    p_minus_2.copy_from_slice(&p_minus_1);
    cmpa::ct_sub_mp_l(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut p_minus_2),
        1,
    );
    field.mul(&mut r, &p_minus_1, &p_minus_2, &mut wide);
    let mut two = try_alloc_vec::<u8>(p_len).unwrap();
    let last = p_len - 1;
    two[last] = 2;
    assert_ne!(
        cmpa::ct_eq_mp_mp(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&r),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(&two)
        )
        .unwrap(),
        0
    );

    // 2 * 2 = 4, and sqr agrees with mul
    field.mul(&mut r, &two, &two, &mut wide);
    let mut four = try_alloc_vec::<u8>(p_len).unwrap();
    four[last] = 4;
    assert_eq!(&r, &four);
    field.sqr(&mut r, &two, &mut wide);
    assert_eq!(&r, &four);

    // Inversion round trip: (2^-1) * 2 = 1
    let mut two_copy = try_alloc_vec::<u8>(p_len).unwrap();
    two_copy.copy_from_slice(&two);
    let mut inv = try_alloc_vec::<u8>(p_len).unwrap();
    let mut s0 = try_alloc_vec::<cmpa::LimbType>(
        cmpa::MpMutNativeEndianUIntLimbsSlice::nlimbs_for_len(p_len),
    )
    .unwrap();
    let mut s1 = try_alloc_vec::<cmpa::LimbType>(
        cmpa::MpMutNativeEndianUIntLimbsSlice::nlimbs_for_len(p_len),
    )
    .unwrap();
    field
        .inv(&mut inv, &mut two_copy, [&mut s0, &mut s1])
        .unwrap();
    field.mul_assign(&mut inv, &two, &mut wide);
    assert_eq!(&inv, &one);
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_reduction_kats_nist_p256() {
    test_reduction_kats_common(super::curve::CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_reduction_kats_nist_p384() {
    test_reduction_kats_common(super::curve::CurveId::Secp384r1)
}

#[cfg(feature = "ecc_curve25519")]
#[test]
fn test_reduction_kats_curve25519() {
    test_reduction_kats_common(super::curve::CurveId::Curve25519)
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_reduce_p256_radix() {
    // 2^256 reduces to the precomputed radix residue.
    let mut wide = try_alloc_vec::<u8>(64).unwrap();
    wide[31] = 1; // word a8
    reduce_p256(&mut wide);
    let expected = cmpa::hexstr::bytes_from_hexstr_cnst::<32>(
        "00000000fffffffeffffffffffffffffffffffff000000000000000000000001",
    );
    assert_eq!(&wide[32..], &expected);
    assert!(wide[..32].iter().all(|b| *b == 0));
}

#[test]
fn test_be_bit_helpers() {
    let mut buf = [0u8; 4];
    be_set_bit(&mut buf, 0, 1);
    assert_eq!(buf, [0, 0, 0, 1]);
    assert_eq!(be_get_bit(&buf, 0), 1);
    be_set_bit(&mut buf, 9, 1);
    assert_eq!(buf, [0, 0, 2, 1]);
    assert_eq!(be_get_bit(&buf, 9), 1);
    assert_eq!(be_get_bit(&buf, 200), 0);
    be_shr1(&mut buf);
    assert_eq!(buf, [0, 0, 1, 0]);
    be_set_bit(&mut buf, 8, 0);
    assert_eq!(buf, [0, 0, 0, 0]);
}
