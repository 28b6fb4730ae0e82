use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{OctetString, Uint},
    oid::ObjectIdentifier,
};
use num_bigint::BigUint;

use crate::error::CrlKitError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use crlkit::cert::extensions::{CrlNumber, ToAndFromX509Extension};
/// use num_bigint::BigUint;
/// let number = CrlNumber(BigUint::from(42u32));
/// let encoded = number.to_x509_extension_value().unwrap();
/// let decoded = CrlNumber::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(number, decoded);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError>
    where
        Self: Sized;
}

fn uint_from_biguint(value: &BigUint) -> Result<Uint, CrlKitError> {
    Ok(Uint::new(&value.to_bytes_be())?)
}

/// Represents the CRL Number extension (RFC 5280 §5.2.3).
///
/// A non-critical, monotonically intended sequence number of a CRL issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlNumber(pub BigUint);

impl ToAndFromX509Extension for CrlNumber {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlNumber::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let number = x509_cert::ext::pkix::CrlNumber(uint_from_biguint(&self.0)?);
        Ok(number.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError> {
        let number = x509_cert::ext::pkix::CrlNumber::from_der(extension)?;
        Ok(Self(BigUint::from_bytes_be(number.0.as_bytes())))
    }
}

/// Represents the Delta CRL Indicator extension (RFC 5280 §5.2.4).
///
/// Marks a CRL as a delta against the complete CRL whose number is the
/// wrapped base number. Always critical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaCrlIndicator(pub BigUint);

impl ToAndFromX509Extension for DeltaCrlIndicator {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BaseCrlNumber::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let base = x509_cert::ext::pkix::BaseCrlNumber(uint_from_biguint(&self.0)?);
        Ok(base.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError> {
        let base = x509_cert::ext::pkix::BaseCrlNumber::from_der(extension)?;
        Ok(Self(BigUint::from_bytes_be(base.0.as_bytes())))
    }
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CrlKitError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    pub fn allows_crl_signing(&self) -> bool {
        self.0.contains(KeyUsages::CRLSign)
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` form is produced; it links a CRL to the issuer key
/// that signed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CrlKitError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CrlKitError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}
