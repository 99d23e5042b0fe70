// SPDX-License-Identifier: Apache-2.0

//! Curve registry and domain parameters.
//!
//! The registered curves are the ones a TLS stack actually negotiates
//! (RFC 8422): secp256r1 and secp384r1, with Curve25519 available behind the
//! `ecc_curve25519` feature. Parameters are carried as big-endian byte
//! strings and interpreted through the `cmpa` multi-precision views.

use super::{field, weierstrass::CombTable, GroupOps};
use crate::CryptoError;
use once_cell::race::OnceBox;

#[cfg(feature = "ecc_nist_p256")]
const NIST_P256_P: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
#[cfg(feature = "ecc_nist_p256")]
const NIST_P256_N: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");
#[cfg(feature = "ecc_nist_p256")]
const NIST_P256_B: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b");
#[cfg(feature = "ecc_nist_p256")]
const NIST_P256_G_X: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
#[cfg(feature = "ecc_nist_p256")]
const NIST_P256_G_Y: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");

#[cfg(feature = "ecc_nist_p384")]
const NIST_P384_P: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe\
     ffffffff0000000000000000ffffffff",
);
#[cfg(feature = "ecc_nist_p384")]
const NIST_P384_N: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf\
     581a0db248b0a77aecec196accc52973",
);
#[cfg(feature = "ecc_nist_p384")]
const NIST_P384_B: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875a\
     c656398d8a2ed19d2a85c8edd3ec2aef",
);
#[cfg(feature = "ecc_nist_p384")]
const NIST_P384_G_X: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a38\
     5502f25dbf55296c3a545e3872760ab7",
);
#[cfg(feature = "ecc_nist_p384")]
const NIST_P384_G_Y: [u8; 48] = cmpa::hexstr::bytes_from_hexstr_cnst::<48>(
    "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c0\
     0a60b1ce1d7e819d7a431d7c90ea0e5f",
);

#[cfg(feature = "ecc_curve25519")]
const CURVE25519_P: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffed");
#[cfg(feature = "ecc_curve25519")]
const CURVE25519_N: [u8; 32] =
    cmpa::hexstr::bytes_from_hexstr_cnst::<32>("1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed");
// (A + 2) / 4, the constant the x/z ladder step actually consumes.
#[cfg(feature = "ecc_curve25519")]
const CURVE25519_A24: [u8; 3] = cmpa::hexstr::bytes_from_hexstr_cnst::<3>("01db42");
#[cfg(feature = "ecc_curve25519")]
const CURVE25519_G_X: [u8; 1] = cmpa::hexstr::bytes_from_hexstr_cnst::<1>("09");

/// Internal identifier of a registered curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveId {
    /// NIST P-256, TLS NamedCurve 23.
    Secp256r1,
    /// NIST P-384, TLS NamedCurve 24.
    Secp384r1,
    /// Curve25519 (x-only), TLS NamedCurve 29. Requires the
    /// `ecc_curve25519` feature.
    Curve25519,
}

/// Form of the curve equation, which selects the point representation and
/// the scalar multiplication algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveForm {
    /// `y^2 = x^3 + a*x + b`; Jacobian coordinates, comb multiplication.
    ShortWeierstrass,
    /// `y^2 = x^3 + a*x^2 + x`; x/z coordinates, Montgomery ladder.
    Montgomery,
}

/// The short Weierstrass coefficient `a`.
///
/// All NIST prime curves use `a = -3`, for which the point doubling formula
/// has a cheaper branch; the general case carries the coefficient value.
#[derive(Clone, Copy, Debug)]
pub enum CoeffA {
    /// `a = p - 3`, enabling the `M = 3(X + Z^2)(X - Z^2)` doubling path.
    MinusThree,
    /// Any other coefficient, big-endian.
    Value(&'static [u8]),
}

pub(crate) struct SwCurveParams {
    pub a: CoeffA,
    pub b: &'static [u8],
    pub g_x: &'static [u8],
    pub g_y: &'static [u8],
}

#[cfg(feature = "ecc_curve25519")]
pub(crate) struct MontCurveParams {
    /// `(A + 2) / 4`, big-endian.
    pub a24: &'static [u8],
    pub g_x: &'static [u8],
}

pub(crate) enum CurveParams {
    ShortWeierstrass(SwCurveParams),
    #[cfg(feature = "ecc_curve25519")]
    Montgomery(MontCurveParams),
}

/// Registry entry tying an internal [`CurveId`] to its TLS NamedCurve
/// identifier (RFC 8422 5.1.1).
pub struct CurveInfo {
    pub id: CurveId,
    pub tls_id: u16,
    pub bits: u16,
    pub name: &'static str,
}

#[cfg(feature = "ecc_nist_p256")]
const SECP256R1_INFO: CurveInfo = CurveInfo {
    id: CurveId::Secp256r1,
    tls_id: 23,
    bits: 256,
    name: "secp256r1",
};

#[cfg(feature = "ecc_nist_p384")]
const SECP384R1_INFO: CurveInfo = CurveInfo {
    id: CurveId::Secp384r1,
    tls_id: 24,
    bits: 384,
    name: "secp384r1",
};

#[cfg(feature = "ecc_curve25519")]
const X25519_INFO: CurveInfo = CurveInfo {
    id: CurveId::Curve25519,
    tls_id: 29,
    bits: 254,
    name: "x25519",
};

/// Get the curve info for an internal identifier.
pub fn curve_info_from_id(id: CurveId) -> Option<&'static CurveInfo> {
    #[cfg(feature = "ecc_nist_p256")]
    if id == CurveId::Secp256r1 {
        return Some(&SECP256R1_INFO);
    }
    #[cfg(feature = "ecc_nist_p384")]
    if id == CurveId::Secp384r1 {
        return Some(&SECP384R1_INFO);
    }
    #[cfg(feature = "ecc_curve25519")]
    if id == CurveId::Curve25519 {
        return Some(&X25519_INFO);
    }
    let _ = id;
    None
}

/// Get the curve info for a TLS NamedCurve identifier.
pub fn curve_info_from_tls_id(tls_id: u16) -> Option<&'static CurveInfo> {
    #[cfg(feature = "ecc_nist_p256")]
    if tls_id == SECP256R1_INFO.tls_id {
        return Some(&SECP256R1_INFO);
    }
    #[cfg(feature = "ecc_nist_p384")]
    if tls_id == SECP384R1_INFO.tls_id {
        return Some(&SECP384R1_INFO);
    }
    #[cfg(feature = "ecc_curve25519")]
    if tls_id == X25519_INFO.tls_id {
        return Some(&X25519_INFO);
    }
    let _ = tls_id;
    None
}

/// Curves the TLS layer advertises by default, most common one first.
///
/// Curve25519 is kept out of the preset even when compiled in; it is
/// negotiated through a separate key exchange path.
#[cfg(all(feature = "ecc_nist_p256", feature = "ecc_nist_p384"))]
pub const PRESET_CURVES: &[CurveId] = &[CurveId::Secp256r1, CurveId::Secp384r1];
#[cfg(all(feature = "ecc_nist_p256", not(feature = "ecc_nist_p384")))]
pub const PRESET_CURVES: &[CurveId] = &[CurveId::Secp256r1];
#[cfg(all(not(feature = "ecc_nist_p256"), feature = "ecc_nist_p384"))]
pub const PRESET_CURVES: &[CurveId] = &[CurveId::Secp384r1];
#[cfg(all(not(feature = "ecc_nist_p256"), not(feature = "ecc_nist_p384")))]
pub const PRESET_CURVES: &[CurveId] = &[];

/// Domain parameters of one curve plus the group-lifetime state attached to
/// them.
///
/// A `Group` is immutable after [`new()`](Self::new) apart from the lazily
/// built, latch-guarded comb table for the generator, and may be shared
/// across threads for reading.
pub struct Group {
    id: CurveId,
    p: &'static [u8],
    n: &'static [u8],
    bits: usize,
    params: CurveParams,
    fast_mod: fn(&mut [u8]),
    cached_comb: OnceBox<CombTable>,
}

impl Group {
    /// Load the domain parameters for `id`.
    pub fn new(id: CurveId) -> Result<Self, CryptoError> {
        match id {
            #[cfg(feature = "ecc_nist_p256")]
            CurveId::Secp256r1 => Ok(Self {
                id,
                p: &NIST_P256_P,
                n: &NIST_P256_N,
                bits: 256,
                params: CurveParams::ShortWeierstrass(SwCurveParams {
                    a: CoeffA::MinusThree,
                    b: &NIST_P256_B,
                    g_x: &NIST_P256_G_X,
                    g_y: &NIST_P256_G_Y,
                }),
                fast_mod: field::reduce_p256,
                cached_comb: OnceBox::new(),
            }),
            #[cfg(feature = "ecc_nist_p384")]
            CurveId::Secp384r1 => Ok(Self {
                id,
                p: &NIST_P384_P,
                n: &NIST_P384_N,
                bits: 384,
                params: CurveParams::ShortWeierstrass(SwCurveParams {
                    a: CoeffA::MinusThree,
                    b: &NIST_P384_B,
                    g_x: &NIST_P384_G_X,
                    g_y: &NIST_P384_G_Y,
                }),
                fast_mod: field::reduce_p384,
                cached_comb: OnceBox::new(),
            }),
            #[cfg(feature = "ecc_curve25519")]
            CurveId::Curve25519 => Ok(Self {
                id,
                p: &CURVE25519_P,
                n: &CURVE25519_N,
                // One-based position of the clamped scalar's fixed top bit.
                bits: 254,
                params: CurveParams::Montgomery(MontCurveParams {
                    a24: &CURVE25519_A24,
                    g_x: &CURVE25519_G_X,
                }),
                fast_mod: field::reduce_p25519,
                cached_comb: OnceBox::new(),
            }),
            #[allow(unreachable_patterns)]
            _ => Err(CryptoError::FeatureUnavailable),
        }
    }

    /// Get the [`GroupOps`] for the group.
    pub fn ops(&self) -> Result<GroupOps<'_>, CryptoError> {
        GroupOps::try_new(self)
    }

    /// The curve's internal identifier.
    pub fn id(&self) -> CurveId {
        self.id
    }

    /// The form of the curve equation.
    pub fn form(&self) -> CurveForm {
        match &self.params {
            CurveParams::ShortWeierstrass(_) => CurveForm::ShortWeierstrass,
            #[cfg(feature = "ecc_curve25519")]
            CurveParams::Montgomery(_) => CurveForm::Montgomery,
        }
    }

    /// The field prime, big-endian.
    pub fn p(&self) -> &'static [u8] {
        self.p
    }

    /// The order of the base point, big-endian.
    pub fn n(&self) -> &'static [u8] {
        self.n
    }

    /// The curve's bit size.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Length of a serialized field element in bytes.
    pub fn p_len(&self) -> usize {
        self.p.len()
    }

    /// Length of a serialized scalar in bytes.
    pub fn n_len(&self) -> usize {
        self.n.len()
    }

    pub(crate) fn params(&self) -> &CurveParams {
        &self.params
    }

    pub(crate) fn sw_params(&self) -> Option<&SwCurveParams> {
        match &self.params {
            CurveParams::ShortWeierstrass(sw) => Some(sw),
            #[cfg(feature = "ecc_curve25519")]
            _ => None,
        }
    }

    #[cfg(feature = "ecc_curve25519")]
    pub(crate) fn mont_params(&self) -> Option<&MontCurveParams> {
        match &self.params {
            CurveParams::Montgomery(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn fast_mod(&self) -> fn(&mut [u8]) {
        self.fast_mod
    }

    pub(crate) fn cached_comb(&self) -> &OnceBox<CombTable> {
        &self.cached_comb
    }
}

#[test]
fn test_curve_registry_lookups() {
    #[cfg(feature = "ecc_nist_p256")]
    {
        let info = curve_info_from_id(CurveId::Secp256r1).unwrap();
        assert_eq!(info.tls_id, 23);
        assert_eq!(info.bits, 256);
        assert_eq!(info.name, "secp256r1");
        assert_eq!(curve_info_from_tls_id(23).unwrap().id, CurveId::Secp256r1);
    }
    #[cfg(feature = "ecc_nist_p384")]
    {
        let info = curve_info_from_id(CurveId::Secp384r1).unwrap();
        assert_eq!(info.tls_id, 24);
        assert_eq!(curve_info_from_tls_id(24).unwrap().id, CurveId::Secp384r1);
    }
    #[cfg(feature = "ecc_curve25519")]
    assert_eq!(curve_info_from_tls_id(29).unwrap().id, CurveId::Curve25519);

    assert!(curve_info_from_tls_id(0x9999).is_none());
}

#[cfg(all(feature = "ecc_nist_p256", feature = "ecc_nist_p384"))]
#[test]
fn test_preset_order() {
    // secp256r1 leads as the most commonly negotiated curve.
    assert_eq!(PRESET_CURVES[0], CurveId::Secp256r1);
    assert_eq!(PRESET_CURVES[1], CurveId::Secp384r1);
}

#[test]
fn test_group_load() {
    #[cfg(feature = "ecc_nist_p256")]
    {
        let grp = Group::new(CurveId::Secp256r1).unwrap();
        assert_eq!(grp.form(), CurveForm::ShortWeierstrass);
        assert_eq!(grp.p_len(), 32);
        assert_eq!(grp.bits(), 256);
    }
    #[cfg(feature = "ecc_curve25519")]
    {
        let grp = Group::new(CurveId::Curve25519).unwrap();
        assert_eq!(grp.form(), CurveForm::Montgomery);
        assert_eq!(grp.p_len(), 32);
        assert_eq!(grp.bits(), 254);
    }
}
