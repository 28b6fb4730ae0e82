pub mod extensions;
pub mod params;

use crate::error::CrlKitError;
pub type Result<T> = std::result::Result<T, CrlKitError>;
use const_oid::ObjectIdentifier;
use der::{DecodePem, Encode, EncodePem};
use extensions::{KeyUsage, SubjectKeyIdentifier, ToAndFromX509Extension};
use params::{ExtensionParam, IssuerParams};
use sha1::Sha1;
use x509_cert::certificate::CertificateInner;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::key::{KeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;

/// Represents the supported signature algorithms for revocation lists.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-384 with RSA encryption (PKCS#1 v1.5).
    Sha384WithRSA,
    /// SHA-512 with RSA encryption (PKCS#1 v1.5).
    Sha512WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Pure Ed25519.
    Ed25519,
}

impl SignatureAlgorithm {
    /// The algorithm an issuer signs revocation lists with unless told otherwise.
    pub fn default_for(key: &KeyPair) -> Self {
        match key {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
            KeyPair::EcdsaP384 { .. } => SignatureAlgorithm::Sha384WithECDSA,
            KeyPair::Ed25519 { .. } => SignatureAlgorithm::Ed25519,
        }
    }

    /// Maps a declared signature algorithm OID back to a known algorithm.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        use const_oid::db::{rfc5912, rfc8410};
        match *oid {
            rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha256WithRSA),
            rfc5912::SHA_384_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha384WithRSA),
            rfc5912::SHA_512_WITH_RSA_ENCRYPTION => Some(SignatureAlgorithm::Sha512WithRSA),
            rfc5912::ECDSA_WITH_SHA_256 => Some(SignatureAlgorithm::Sha256WithECDSA),
            rfc5912::ECDSA_WITH_SHA_384 => Some(SignatureAlgorithm::Sha384WithECDSA),
            rfc5912::ECDSA_WITH_SHA_512 => Some(SignatureAlgorithm::Sha512WithECDSA),
            rfc8410::ID_ED_25519 => Some(SignatureAlgorithm::Ed25519),
            _ => None,
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        use const_oid::db::{rfc5912, rfc8410};
        match self {
            SignatureAlgorithm::Sha256WithRSA => rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithECDSA => rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithECDSA => rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => rfc8410::ID_ED_25519,
        }
    }

    pub fn is_ecdsa(&self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Sha256WithECDSA
                | SignatureAlgorithm::Sha384WithECDSA
                | SignatureAlgorithm::Sha512WithECDSA
        )
    }

    fn is_rsa(&self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::Sha256WithRSA
                | SignatureAlgorithm::Sha384WithRSA
                | SignatureAlgorithm::Sha512WithRSA
        )
    }

    /// Builds the `AlgorithmIdentifier` written into a signed structure.
    ///
    /// RSA identifiers carry an explicit NULL parameter (RFC 4055); ECDSA and
    /// Ed25519 identifiers carry none.
    pub fn to_algorithm_identifier(&self) -> Result<AlgorithmIdentifierOwned> {
        let parameters = if self.is_rsa() {
            Some(der::Any::new(der::Tag::Null, Vec::<u8>::new())?)
        } else {
            None
        };
        Ok(AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters,
        })
    }
}

/// Represents an X.509 issuer certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM
/// formats and to read the parts a revocation list depends on.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Parses a PEM-encoded certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Self {
            inner: CertificateInner::from_pem(pem.as_bytes())?,
        })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CrlKitError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(der::pem::LineEnding::LF)
            .map_err(|e| CrlKitError::EncodingError(e.to_string()))
    }

    /// The subject name, which becomes the issuer name of a CRL.
    pub fn subject(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    /// The public key the certificate binds.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .collect()
    }

    fn find_extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(|ext| ext.to_extension::<E>())
            .transpose()
    }

    /// Identifier that CRLs signed by this certificate's key refer back to.
    ///
    /// Uses the Subject Key Identifier extension when present, otherwise the
    /// SHA-1 of the subject public key bits (RFC 5280 §4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        if let Some(ski) = self.find_extension::<SubjectKeyIdentifier>()? {
            return Ok(ski.0);
        }
        let spki = &self.inner.tbs_certificate.subject_public_key_info;
        Ok(<Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes()).to_vec())
    }

    /// Whether the certificate's key may sign revocation lists.
    ///
    /// A certificate without a Key Usage extension is not treated as a CRL
    /// signer.
    pub fn allows_crl_signing(&self) -> Result<bool> {
        Ok(self
            .find_extension::<KeyUsage>()?
            .is_some_and(|ku| ku.allows_crl_signing()))
    }

    /// Creates a new self-signed issuer certificate able to sign CRLs.
    ///
    /// # Arguments
    /// * `params` - Subject, validity and key usage of the issuer.
    /// * `key` - The key pair the certificate binds and is signed with.
    pub fn new_self_signed(params: &IssuerParams, key: &KeyPair) -> Result<Self> {
        let signature_algorithm = SignatureAlgorithm::default_for(key);
        let tbs_cert = TbsCertificate::for_issuer(params, key, signature_algorithm)?;
        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;

        let signature = key.sign_data(
            &signature_algorithm,
            &tbs_cert_inner.to_der()?,
            &mut rand_core::OsRng,
        )?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.to_algorithm_identifier()?,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use params::DistinguishedName;

    fn issuer_params(crl_sign: bool) -> IssuerParams {
        IssuerParams::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("Partition CA".to_string())
                    .build(),
            )
            .crl_sign(crl_sign)
            .build()
    }

    #[test]
    fn test_self_signed_issuer_pem_round_trip() {
        let key = KeyPair::generate_ecdsa_p256();
        let cert = Certificate::new_self_signed(&issuer_params(true), &key).unwrap();
        let reparsed = Certificate::from_pem(&cert.to_pem().unwrap()).unwrap();
        assert_eq!(reparsed.to_der().unwrap(), cert.to_der().unwrap());
        assert!(reparsed.allows_crl_signing().unwrap());
    }

    #[test]
    fn test_key_identifier_is_hash_of_public_key_bits() {
        let key = KeyPair::generate_ed25519();
        let cert = Certificate::new_self_signed(&issuer_params(true), &key).unwrap();
        let spki = key.as_spki().unwrap();
        let expected = <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());
        assert_eq!(cert.key_identifier().unwrap(), expected.to_vec());
    }

    #[test]
    fn test_issuer_without_crl_sign() {
        let key = KeyPair::generate_ecdsa_p384();
        let cert = Certificate::new_self_signed(&issuer_params(false), &key).unwrap();
        assert!(!cert.allows_crl_signing().unwrap());
    }

    #[test]
    fn test_signature_algorithm_oid_round_trip() {
        for alg in [
            SignatureAlgorithm::Sha256WithRSA,
            SignatureAlgorithm::Sha384WithRSA,
            SignatureAlgorithm::Sha512WithRSA,
            SignatureAlgorithm::Sha256WithECDSA,
            SignatureAlgorithm::Sha384WithECDSA,
            SignatureAlgorithm::Sha512WithECDSA,
            SignatureAlgorithm::Ed25519,
        ] {
            assert_eq!(SignatureAlgorithm::from_oid(&alg.oid()), Some(alg));
        }
    }
}
