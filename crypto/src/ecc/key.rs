// SPDX-License-Identifier: Apache-2.0

//! ECC key pairs: generation and validation.

extern crate alloc;
use alloc::vec::Vec;

use super::curve::{self, CurveForm};
use super::field;
use super::weierstrass::AffinePoint;
use super::{GroupOps, GroupOpsScratch};
use crate::rng::RngCore;
use crate::utils_common::{
    alloc::try_alloc_zeroizing_vec,
    zeroize::{self, Zeroizing},
};
use crate::CryptoError;

/// ECC public key.
///
/// Usually not instantiated directly, but obtained through [`EccKey`] or by
/// reading a wire encoding via
/// [`point_io`](super::point_io).
pub struct EccPublicKey {
    curve_id: curve::CurveId,
    point: AffinePoint,
}

impl EccPublicKey {
    /// Get the point's associated curve id.
    pub fn get_curve_id(&self) -> curve::CurveId {
        self.curve_id
    }

    pub fn get_point(&self) -> &AffinePoint {
        &self.point
    }
}

impl zeroize::ZeroizeOnDrop for EccPublicKey {}

/// ECC private key.
pub struct EccPrivateKey {
    d: Zeroizing<Vec<u8>>,
}

impl EccPrivateKey {
    /// Get the private scalar.
    pub fn get_d(&self) -> cmpa::MpBigEndianUIntByteSlice {
        cmpa::MpBigEndianUIntByteSlice::from_bytes(&self.d)
    }

    /// The private scalar, big-endian.
    pub fn d(&self) -> &[u8] {
        &self.d
    }
}

impl zeroize::ZeroizeOnDrop for EccPrivateKey {}

/// ECC key with mandatory public and optional private part.
pub struct EccKey {
    pub_key: EccPublicKey,
    priv_key: Option<EccPrivateKey>,
}

impl EccKey {
    /// Generate a new random key pair on a short Weierstrass group.
    ///
    /// The private scalar is rejection-sampled into `[1, n)` following the
    /// procedure of RFC 6979: draw `ceil(bits/8)` bytes, keep the leftmost
    /// `bits` bits, retry while out of range. Each try fails with
    /// probability at most 1/2, so the 10-try bound fails with probability
    /// below 2^-10 only for a broken generator. The public point is derived
    /// with a blinded multiplication and validated before use.
    ///
    /// Montgomery groups use [`XEccKey`](super::XEccKey) instead.
    pub fn generate(
        ops: &GroupOps,
        rng: &mut dyn RngCore,
        scratch: &mut GroupOpsScratch,
    ) -> Result<Self, CryptoError> {
        let grp = ops.group();
        if grp.form() != CurveForm::ShortWeierstrass {
            return Err(CryptoError::InvalidParams);
        }
        let n_size = (grp.bits() + 7) / 8;
        let n = cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.n());

        let mut d = try_alloc_zeroizing_vec::<u8>(grp.n_len())?;
        let mut in_range = false;
        for _ in 0..10 {
            rng.generate(&mut d[grp.n_len() - n_size..])
                .map_err(CryptoError::from)?;
            for _ in 0..(8 * n_size - grp.bits()) {
                field::be_shr1(&mut d);
            }

            let dv = cmpa::MpBigEndianUIntByteSlice::from_bytes(&d);
            if cmpa::ct_is_zero_mp(&dv).unwrap() == 0 && cmpa::ct_lt_mp_mp(&dv, &n).unwrap() != 0 {
                in_range = true;
                break;
            }
        }
        if !in_range {
            return Err(CryptoError::RandomSamplingRetriesExceeded);
        }

        let point = ops.point_mul_g(&d, Some(rng), scratch)?;
        check_pubkey(ops, &point, scratch)?;

        Ok(Self {
            pub_key: EccPublicKey {
                curve_id: grp.id(),
                point,
            },
            priv_key: Some(EccPrivateKey { d }),
        })
    }

    /// Get the public key.
    pub fn pub_key(&self) -> &EccPublicKey {
        &self.pub_key
    }

    /// Get the private key.
    pub fn priv_key(&self) -> Option<&EccPrivateKey> {
        self.priv_key.as_ref()
    }

    /// Take the public key.
    pub fn take_public(self) -> EccPublicKey {
        self.pub_key
    }
}

impl zeroize::ZeroizeOnDrop for EccKey {}

/// Check that a point is valid as a public key (SEC1 3.2.3.1).
///
/// [`AffinePoint`] construction already guarantees normalized coordinates
/// in `[0, p)`; what remains is the curve equation. The check does not
/// verify that the point is a multiple of `G` -- that is not required for
/// the NIST groups, whose cofactor is 1.
///
/// Montgomery x-only keys are checked with
/// [`check_pubkey_x()`](super::check_pubkey_x) instead.
pub fn check_pubkey(
    ops: &GroupOps,
    point: &AffinePoint,
    scratch: &mut GroupOpsScratch,
) -> Result<(), CryptoError> {
    if ops.group().form() != CurveForm::ShortWeierstrass {
        return Err(CryptoError::InvalidParams);
    }
    if !ops.point_is_on_curve(point, scratch)? {
        return Err(CryptoError::InvalidPoint);
    }
    Ok(())
}

/// Check that a scalar is valid as a private key: `1 <= d < n` for short
/// Weierstrass groups (SEC1 3.2), the clamping shape for Montgomery ones.
pub fn check_privkey(ops: &GroupOps, d: &[u8]) -> Result<(), CryptoError> {
    match ops.group().form() {
        CurveForm::ShortWeierstrass => ops.validate_scalar(d),
        CurveForm::Montgomery => {
            #[cfg(feature = "ecc_curve25519")]
            {
                super::montgomery::check_clamped_scalar(ops.group(), d)
            }
            #[cfg(not(feature = "ecc_curve25519"))]
            {
                let _ = d;
                Err(CryptoError::InvalidParams)
            }
        }
    }
}

#[cfg(test)]
use super::curve::{CurveId, Group};
#[cfg(test)]
use crate::rng::test_rng;

#[cfg(test)]
fn test_keygen_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let mut rng = test_rng();

    let key = EccKey::generate(&ops, &mut rng, &mut scratch).unwrap();
    check_privkey(&ops, key.priv_key().unwrap().d()).unwrap();
    check_pubkey(&ops, key.pub_key().get_point(), &mut scratch).unwrap();
    assert_eq!(key.pub_key().get_curve_id(), curve_id);
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_keygen_nist_p256() {
    test_keygen_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_keygen_nist_p384() {
    test_keygen_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_check_pubkey_rejects_off_curve_common(curve_id: CurveId) {
    use cmpa::MpMutUInt as _;

    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let g = ops.generator().unwrap();

    // Nudge the y coordinate off the curve.
    let mut bad_y = crate::utils_common::alloc::try_alloc_vec::<u8>(grp.p_len()).unwrap();
    bad_y.copy_from_slice(g.y());
    let mut one = crate::utils_common::alloc::try_alloc_vec::<u8>(grp.p_len()).unwrap();
    cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut one).set_to_u8(1);
    cmpa::ct_add_mod_mp_mp(
        &mut cmpa::MpMutBigEndianUIntByteSlice::from_bytes(&mut bad_y),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&one),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.p()),
    )
    .unwrap();

    let bad = AffinePoint::try_from_plain_coordinates(
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(g.x()),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&bad_y),
        &grp,
    )
    .unwrap();
    assert!(matches!(
        check_pubkey(&ops, &bad, &mut scratch),
        Err(CryptoError::InvalidPoint)
    ));

    // A coordinate at or above p is rejected at construction.
    assert!(matches!(
        AffinePoint::try_from_plain_coordinates(
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(g.x()),
            &cmpa::MpBigEndianUIntByteSlice::from_bytes(grp.p()),
            &grp,
        ),
        Err(CryptoError::InvalidPoint)
    ));
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_check_pubkey_rejects_off_curve_nist_p256() {
    test_check_pubkey_rejects_off_curve_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_check_pubkey_rejects_off_curve_nist_p384() {
    test_check_pubkey_rejects_off_curve_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_check_privkey_range_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();

    let zero = [0u8];
    assert!(matches!(
        check_privkey(&ops, &zero),
        Err(CryptoError::InvalidKey)
    ));
    assert!(matches!(
        check_privkey(&ops, grp.n()),
        Err(CryptoError::InvalidKey)
    ));
    let one = [1u8];
    check_privkey(&ops, &one).unwrap();
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_check_privkey_range_nist_p256() {
    test_check_privkey_range_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_check_privkey_range_nist_p384() {
    test_check_privkey_range_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_ecdh_agreement_common(curve_id: CurveId) {
    // Pairwise key establishment: both parties must arrive at the same
    // shared point.
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let mut scratch = ops.try_alloc_scratch().unwrap();
    let mut rng = test_rng();

    let alice = EccKey::generate(&ops, &mut rng, &mut scratch).unwrap();
    let bob = EccKey::generate(&ops, &mut rng, &mut scratch).unwrap();

    let z_alice = ops
        .point_mul(
            alice.priv_key().unwrap().d(),
            bob.pub_key().get_point(),
            Some(&mut rng),
            &mut scratch,
        )
        .unwrap();
    let z_bob = ops
        .point_mul(
            bob.priv_key().unwrap().d(),
            alice.pub_key().get_point(),
            Some(&mut rng),
            &mut scratch,
        )
        .unwrap();
    assert_eq!(z_alice.x(), z_bob.x());
    assert_eq!(z_alice.y(), z_bob.y());
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_ecdh_agreement_nist_p256() {
    test_ecdh_agreement_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_ecdh_agreement_nist_p384() {
    test_ecdh_agreement_common(CurveId::Secp384r1)
}
