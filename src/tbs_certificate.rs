use crate::error::CrlKitError;
use der::flagset::FlagSet;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{BasicConstraints, KeyUsage, KeyUsages, SubjectKeyIdentifier};
use crate::cert::params::{DistinguishedName, ExtensionParam, IssuerParams};
use crate::crl::to_x509_time;
use crate::key::{KeyPair, PublicKey};

/// Represents the "To Be Signed" (TBS) portion of a self-signed issuer
/// certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `subject` - Subject and issuer name (the certificate is self-signed).
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub subject: DistinguishedName,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Lays out a CA certificate for `key` that may sign CRLs.
    ///
    /// Adds Basic Constraints (CA), Subject Key Identifier and a Key Usage
    /// carrying `keyCertSign` plus `cRLSign` when `params.crl_sign` is set.
    pub fn for_issuer(
        params: &IssuerParams,
        key: &KeyPair,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<Self, CrlKitError> {
        let spki = key.as_spki()?;
        let key_id = <sha1::Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());

        let mut key_usage_flags: FlagSet<KeyUsages> = KeyUsages::KeyCertSign.into();
        if params.crl_sign {
            key_usage_flags |= KeyUsages::CRLSign;
        }

        let mut extensions = vec![
            ExtensionParam::from_extension(
                BasicConstraints {
                    is_ca: true,
                    max_path_length: None,
                },
                true,
            )?,
            ExtensionParam::from_extension(SubjectKeyIdentifier(key_id.to_vec()), false)?,
            ExtensionParam::from_extension(KeyUsage(key_usage_flags), true)?,
        ];
        extensions.extend(params.extensions.iter().cloned());

        Ok(Self {
            serial_number: params.serial_number.clone(),
            signature_algorithm,
            subject: params.subject.clone(),
            not_before: params.validity.not_before,
            not_after: params.validity.not_after,
            subject_public_key: PublicKey::from_key_pair(key),
            extensions,
        })
    }

    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, CrlKitError> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>, _>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        };

        let name = self.subject.as_x509_name()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(self.serial_number.as_slice())?,
            signature: self.signature_algorithm.to_algorithm_identifier()?,
            issuer: name.clone(),
            validity,
            subject: name,
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}
