// SPDX-License-Identifier: Apache-2.0

//! Point and group wire encodings.
//!
//! SEC1 2.3.3/2.3.4 uncompressed point format plus the TLS framings from
//! RFC 8422 5.4: the length-prefixed `ECPoint` and the named-curve
//! `ECParameters`. Uncompressed is the only point format RFC 8422 permits.

use super::curve::{self, CurveForm};
use super::weierstrass::AffinePoint;
use crate::CryptoError;

/// `ECCurveType.named_curve`; the only curve type in RFC 8422.
pub const TLS_EC_CURVE_TYPE_NAMED_CURVE: u8 = 0x03;

/// Export a point into unsigned binary data (SEC1 2.3.3).
///
/// `None` is the point at infinity, which encodes as the single byte
/// `0x00`; everything else becomes `0x04 || X || Y` at fixed width.
/// Returns the number of bytes written.
pub fn point_write_binary(
    grp: &curve::Group,
    pt: Option<&AffinePoint>,
    buf: &mut [u8],
) -> Result<usize, CryptoError> {
    if grp.form() != CurveForm::ShortWeierstrass {
        return Err(CryptoError::InvalidParams);
    }

    let pt = match pt {
        None => {
            if buf.is_empty() {
                return Err(CryptoError::BufferTooSmall);
            }
            buf[0] = 0x00;
            return Ok(1);
        }
        Some(pt) => pt,
    };

    let plen = grp.p_len();
    let olen = 2 * plen + 1;
    if buf.len() < olen {
        return Err(CryptoError::BufferTooSmall);
    }

    buf[0] = 0x04;
    buf[1..1 + plen].copy_from_slice(pt.x());
    buf[1 + plen..olen].copy_from_slice(pt.y());

    Ok(olen)
}

/// Import a point from unsigned binary data (SEC1 2.3.4).
///
/// The coordinates are range-checked against the field prime; the curve
/// equation is not verified here, use
/// [`check_pubkey()`](super::check_pubkey) on untrusted points.
pub fn point_read_binary(
    grp: &curve::Group,
    buf: &[u8],
) -> Result<Option<AffinePoint>, CryptoError> {
    if grp.form() != CurveForm::ShortWeierstrass {
        return Err(CryptoError::InvalidParams);
    }
    if buf.is_empty() {
        return Err(CryptoError::BadInputData);
    }

    if buf[0] == 0x00 {
        if buf.len() == 1 {
            return Ok(None);
        }
        return Err(CryptoError::BadInputData);
    }

    if buf[0] != 0x04 {
        // Compressed and hybrid forms exist, but are not supported.
        return Err(CryptoError::FeatureUnavailable);
    }

    let plen = grp.p_len();
    if buf.len() != 2 * plen + 1 {
        return Err(CryptoError::BadInputData);
    }

    AffinePoint::try_from_plain_coordinates(
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&buf[1..1 + plen]),
        &cmpa::MpBigEndianUIntByteSlice::from_bytes(&buf[1 + plen..]),
        grp,
    )
    .map(Some)
}

/// Import a point from a TLS `ECPoint` record (RFC 8422 5.4):
/// a one-byte length followed by the SEC1 encoding.
///
/// Returns the point and the number of bytes consumed.
pub fn tls_read_point(
    grp: &curve::Group,
    buf: &[u8],
) -> Result<(Option<AffinePoint>, usize), CryptoError> {
    // At least the length byte and one data byte.
    if buf.len() < 2 {
        return Err(CryptoError::BadInputData);
    }

    let data_len = buf[0] as usize;
    if data_len < 1 || data_len > buf.len() - 1 {
        return Err(CryptoError::BadInputData);
    }

    let pt = point_read_binary(grp, &buf[1..1 + data_len])?;
    Ok((pt, 1 + data_len))
}

/// Export a point as a TLS `ECPoint` record (RFC 8422 5.4).
///
/// Returns the number of bytes written.
pub fn tls_write_point(
    grp: &curve::Group,
    pt: Option<&AffinePoint>,
    buf: &mut [u8],
) -> Result<usize, CryptoError> {
    // One byte for our length prefix.
    if buf.is_empty() {
        return Err(CryptoError::BufferTooSmall);
    }
    let (prefix, rest) = buf.split_at_mut(1);
    let olen = point_write_binary(grp, pt, rest)?;
    debug_assert!(olen <= 255);
    prefix[0] = olen as u8;
    Ok(olen + 1)
}

/// Set up a group from a TLS `ECParameters` record (RFC 8422 5.4):
/// the `named_curve` type byte followed by the 16-bit NamedCurve id.
///
/// Returns the group and the number of bytes consumed.
pub fn tls_read_group(buf: &[u8]) -> Result<(curve::Group, usize), CryptoError> {
    if buf.len() < 3 {
        return Err(CryptoError::BadInputData);
    }

    if buf[0] != TLS_EC_CURVE_TYPE_NAMED_CURVE {
        return Err(CryptoError::BadInputData);
    }

    let tls_id = u16::from_be_bytes([buf[1], buf[2]]);
    let info = curve::curve_info_from_tls_id(tls_id).ok_or(CryptoError::FeatureUnavailable)?;
    let grp = curve::Group::new(info.id)?;
    Ok((grp, 3))
}

/// Write the TLS `ECParameters` record corresponding to a group
/// (RFC 8422 5.4). Returns the number of bytes written.
pub fn tls_write_group(grp: &curve::Group, buf: &mut [u8]) -> Result<usize, CryptoError> {
    let info = curve::curve_info_from_id(grp.id()).ok_or(CryptoError::InvalidParams)?;

    if buf.len() < 3 {
        return Err(CryptoError::BufferTooSmall);
    }

    buf[0] = TLS_EC_CURVE_TYPE_NAMED_CURVE;
    buf[1..3].copy_from_slice(&info.tls_id.to_be_bytes());
    Ok(3)
}

#[cfg(test)]
use super::curve::{CurveId, Group};

#[cfg(test)]
fn test_point_binary_round_trip_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let g = ops.generator().unwrap();
    let plen = grp.p_len();

    let mut buf = [0u8; 2 * 48 + 1];
    let olen = point_write_binary(&grp, Some(&g), &mut buf).unwrap();
    assert_eq!(olen, 2 * plen + 1);
    assert_eq!(buf[0], 0x04);
    let decoded = point_read_binary(&grp, &buf[..olen]).unwrap().unwrap();
    assert_eq!(decoded.x(), g.x());
    assert_eq!(decoded.y(), g.y());

    // The point at infinity is the single byte 0x00.
    let olen = point_write_binary(&grp, None, &mut buf).unwrap();
    assert_eq!(olen, 1);
    assert_eq!(buf[0], 0x00);
    assert!(point_read_binary(&grp, &buf[..1]).unwrap().is_none());

    // Truncations and unknown forms are rejected.
    assert!(matches!(
        point_read_binary(&grp, &[]),
        Err(CryptoError::BadInputData)
    ));
    buf[0] = 0x04;
    assert!(matches!(
        point_read_binary(&grp, &buf[..2 * plen]),
        Err(CryptoError::BadInputData)
    ));
    buf[0] = 0x02;
    assert!(matches!(
        point_read_binary(&grp, &buf[..plen + 1]),
        Err(CryptoError::FeatureUnavailable)
    ));

    // Output buffers that are too small are reported as such.
    let mut small = [0u8; 16];
    assert!(matches!(
        point_write_binary(&grp, Some(&g), &mut small),
        Err(CryptoError::BufferTooSmall)
    ));
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_point_binary_round_trip_nist_p256() {
    test_point_binary_round_trip_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_point_binary_round_trip_nist_p384() {
    test_point_binary_round_trip_common(CurveId::Secp384r1)
}

#[cfg(test)]
fn test_tls_point_framing_common(curve_id: CurveId) {
    let grp = Group::new(curve_id).unwrap();
    let ops = grp.ops().unwrap();
    let g = ops.generator().unwrap();
    let plen = grp.p_len();

    let mut buf = [0u8; 2 * 48 + 2];
    let olen = tls_write_point(&grp, Some(&g), &mut buf).unwrap();
    assert_eq!(olen, 2 * plen + 2);
    assert_eq!(buf[0] as usize, 2 * plen + 1);

    let (decoded, consumed) = tls_read_point(&grp, &buf[..olen]).unwrap();
    assert_eq!(consumed, olen);
    let decoded = decoded.unwrap();
    assert_eq!(decoded.x(), g.x());
    assert_eq!(decoded.y(), g.y());

    // A length prefix running past the buffer is rejected.
    assert!(matches!(
        tls_read_point(&grp, &buf[..olen - 1]),
        Err(CryptoError::BadInputData)
    ));
    assert!(matches!(tls_read_point(&grp, &buf[..1]), Err(CryptoError::BadInputData)));
}

#[cfg(feature = "ecc_nist_p256")]
#[test]
fn test_tls_point_framing_nist_p256() {
    test_tls_point_framing_common(CurveId::Secp256r1)
}

#[cfg(feature = "ecc_nist_p384")]
#[test]
fn test_tls_point_framing_nist_p384() {
    test_tls_point_framing_common(CurveId::Secp384r1)
}

#[cfg(any(feature = "ecc_nist_p256", feature = "ecc_nist_p384"))]
#[test]
fn test_tls_group_framing() {
    #[cfg(feature = "ecc_nist_p256")]
    let (grp, tls_id) = (Group::new(CurveId::Secp256r1).unwrap(), 23u16);
    #[cfg(not(feature = "ecc_nist_p256"))]
    let (grp, tls_id) = (Group::new(CurveId::Secp384r1).unwrap(), 24u16);

    let mut buf = [0u8; 3];
    assert_eq!(tls_write_group(&grp, &mut buf).unwrap(), 3);
    assert_eq!(buf[0], TLS_EC_CURVE_TYPE_NAMED_CURVE);
    assert_eq!(u16::from_be_bytes([buf[1], buf[2]]), tls_id);

    let (decoded, consumed) = tls_read_group(&buf).unwrap();
    assert_eq!(consumed, 3);
    assert_eq!(decoded.id(), grp.id());

    // Unknown curve type byte and unknown NamedCurve ids.
    let bad_type = [0x01, 0x00, 23];
    assert!(matches!(tls_read_group(&bad_type), Err(CryptoError::BadInputData)));
    let unknown_curve = [TLS_EC_CURVE_TYPE_NAMED_CURVE, 0x99, 0x99];
    assert!(matches!(
        tls_read_group(&unknown_curve),
        Err(CryptoError::FeatureUnavailable)
    ));

    let mut small = [0u8; 2];
    assert!(matches!(
        tls_write_group(&grp, &mut small),
        Err(CryptoError::BufferTooSmall)
    ));
}
