//! Revocation-list types shared by the resign pipeline.
//!
//! The pipeline runs [`decode`] → [`verify`] → [`reconcile`] → [`builder`], each
//! stage consuming the previous stage's output.

pub mod builder;
pub mod decode;
pub mod reconcile;
pub mod verify;

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use time::OffsetDateTime;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

use crate::cert::params::ExtensionParam;
use crate::error::CrlKitError;

pub type Result<T> = std::result::Result<T, CrlKitError>;

/// One revoked certificate as listed in a CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedCertificate {
    pub serial_number: SerialNumber,
    pub revocation_time: OffsetDateTime,
    /// Per-entry extensions (reason code, invalidity date, ...).
    pub extensions: Vec<ExtensionParam>,
}

impl RevokedCertificate {
    pub fn new(serial_number: SerialNumber, revocation_time: OffsetDateTime) -> Self {
        Self {
            serial_number,
            revocation_time,
            extensions: Vec::new(),
        }
    }

    /// The serial's integer value.
    pub fn canonical_serial(&self) -> CanonicalSerial {
        CanonicalSerial::from(&self.serial_number)
    }
}

/// A decoded CRL together with what is needed to authenticate it.
#[derive(Debug, Clone)]
pub struct InputRevocationList {
    /// Position of the CRL in the caller's input.
    pub index: usize,
    /// Issuer name the signer claims.
    pub issuer: Name,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    /// Value of the CRL Number extension, if present.
    pub crl_number: Option<BigUint>,
    pub revoked: Vec<RevokedCertificate>,
    /// Exact DER of `tbsCertList` as received.
    pub tbs_der: Vec<u8>,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature: Vec<u8>,
}

/// Arbitrary-precision value of a certificate serial number.
///
/// Two serials are the same certificate when their integer values match,
/// regardless of how the DER bytes were laid out. Displays as decimal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalSerial(BigInt);

impl From<&SerialNumber> for CanonicalSerial {
    fn from(serial: &SerialNumber) -> Self {
        CanonicalSerial(BigInt::from_signed_bytes_be(serial.as_bytes()))
    }
}

impl From<u64> for CanonicalSerial {
    fn from(value: u64) -> Self {
        CanonicalSerial(BigInt::from(value))
    }
}

impl FromStr for CanonicalSerial {
    type Err = CrlKitError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<BigInt>()
            .map(CanonicalSerial)
            .map_err(|e| CrlKitError::InvalidInput(format!("invalid serial {s}: {e}")))
    }
}

impl fmt::Display for CanonicalSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a DER serial number from an unsigned value.
pub fn serial_from_u64(value: u64) -> Result<SerialNumber> {
    Ok(SerialNumber::new(&value.to_be_bytes())?)
}

/// Encodes a timestamp the way RFC 5280 requires: UTCTime through 2049,
/// GeneralizedTime from 2050 on. Sub-second precision is dropped.
pub fn to_x509_time(at: OffsetDateTime) -> Result<Time> {
    let at = truncate_to_seconds(at);
    if at.year() < 2050 {
        Ok(Time::UtcTime(der::asn1::UtcTime::from_system_time(at.into())?))
    } else {
        Ok(Time::GeneralTime(der::asn1::GeneralizedTime::from_system_time(at.into())?))
    }
}

pub fn from_x509_time(time: &Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}

pub(crate) fn truncate_to_seconds(at: OffsetDateTime) -> OffsetDateTime {
    at.replace_nanosecond(0).unwrap_or(at)
}
