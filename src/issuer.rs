use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

use crate::cert::params::IssuerParams;
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::CrlKitError;
use crate::key::KeyPair;

/// Reference value that selects the configured default issuer.
pub const DEFAULT_ISSUER_REF: &str = "default";

/// Represents an entity capable of signing revocation lists.
///
/// The CRL builder only needs these three things from an issuer, so tests and
/// callers can supply their own holders of key material.
pub trait Issuer {
    /// Returns the issuer's certificate.
    fn certificate(&self) -> &Certificate;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the algorithm revocation lists are signed with.
    fn revocation_signature_algorithm(&self) -> SignatureAlgorithm;
}

/// Certificate, private key and declared CRL signature algorithm of an
/// issuer, as handed out by an [`IssuerResolver`].
#[derive(Debug, Clone)]
pub struct IssuerMaterial {
    pub certificate: Certificate,
    pub key: KeyPair,
    pub revocation_signature_algorithm: SignatureAlgorithm,
}

impl IssuerMaterial {
    /// Pairs a certificate with its key, signing CRLs with the key's default
    /// algorithm.
    pub fn new(certificate: Certificate, key: KeyPair) -> Self {
        let revocation_signature_algorithm = SignatureAlgorithm::default_for(&key);
        Self {
            certificate,
            key,
            revocation_signature_algorithm,
        }
    }

    /// Generates a self-signed issuer certificate for `key`.
    pub fn self_signed(params: &IssuerParams, key: KeyPair) -> Result<Self, CrlKitError> {
        let certificate = Certificate::new_self_signed(params, &key)?;
        Ok(Self::new(certificate, key))
    }

    pub fn with_revocation_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.revocation_signature_algorithm = algorithm;
        self
    }
}

impl Issuer for IssuerMaterial {
    fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn revocation_signature_algorithm(&self) -> SignatureAlgorithm {
        self.revocation_signature_algorithm
    }
}

/// Which issuer a request addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssuerRef {
    /// The configured default issuer.
    Default,
    /// An issuer identifier or name.
    Named(String),
}

impl IssuerRef {
    /// Interprets a request's issuer reference.
    ///
    /// # Errors
    /// `InvalidInput` when the reference is blank.
    pub fn parse(reference: &str) -> Result<Self, CrlKitError> {
        match reference.trim() {
            "" => Err(CrlKitError::InvalidInput(
                "issuer_ref parameter cannot be blank".to_string(),
            )),
            DEFAULT_ISSUER_REF => Ok(IssuerRef::Default),
            named => Ok(IssuerRef::Named(named.to_string())),
        }
    }
}

impl fmt::Display for IssuerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuerRef::Default => f.write_str(DEFAULT_ISSUER_REF),
            IssuerRef::Named(name) => f.write_str(name),
        }
    }
}

/// What the resolved key material is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IssuerUsage {
    CrlSigning,
}

/// Maps an issuer reference to key material.
///
/// Implementations typically read from storage and may block on I/O.
#[async_trait]
pub trait IssuerResolver: Send + Sync {
    async fn resolve(
        &self,
        issuer_ref: &IssuerRef,
        usage: IssuerUsage,
    ) -> Result<Arc<IssuerMaterial>, CrlKitError>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Resolver over a fixed set of issuers, keyed by identifier and name.
#[derive(Debug, Default)]
pub struct InMemoryIssuers {
    issuers: HashMap<String, Arc<IssuerMaterial>>,
    names: HashMap<String, String>,
    default_id: Option<String>,
}

impl InMemoryIssuers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an issuer. The first issuer added becomes the default.
    pub fn insert(&mut self, id: &str, name: Option<&str>, material: IssuerMaterial) {
        if let Some(name) = name {
            self.names.insert(name.to_string(), id.to_string());
        }
        self.issuers.insert(id.to_string(), Arc::new(material));
        if self.default_id.is_none() {
            self.default_id = Some(id.to_string());
        }
    }

    pub fn set_default(&mut self, id: &str) {
        self.default_id = Some(id.to_string());
    }

    fn lookup(&self, issuer_ref: &IssuerRef) -> Option<&Arc<IssuerMaterial>> {
        let id = match issuer_ref {
            IssuerRef::Default => self.default_id.as_deref()?,
            IssuerRef::Named(reference) => {
                if self.issuers.contains_key(reference) {
                    reference.as_str()
                } else {
                    self.names.get(reference)?.as_str()
                }
            }
        };
        self.issuers.get(id)
    }
}

#[async_trait]
impl IssuerResolver for InMemoryIssuers {
    async fn resolve(
        &self,
        issuer_ref: &IssuerRef,
        usage: IssuerUsage,
    ) -> Result<Arc<IssuerMaterial>, CrlKitError> {
        let material = self
            .lookup(issuer_ref)
            .ok_or_else(|| CrlKitError::IssuerResolution(format!("unable to find issuer {issuer_ref}")))?;

        let permitted = match usage {
            IssuerUsage::CrlSigning => material.certificate.allows_crl_signing()?,
        };
        if !permitted {
            return Err(CrlKitError::IssuerResolution(format!(
                "issuer {issuer_ref} is not allowed to sign CRLs"
            )));
        }

        debug!(%issuer_ref, ?usage, "resolved issuer");
        Ok(Arc::clone(material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;

    fn material(crl_sign: bool) -> IssuerMaterial {
        let params = IssuerParams::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("Resolver CA".to_string())
                    .build(),
            )
            .crl_sign(crl_sign)
            .build();
        IssuerMaterial::self_signed(&params, KeyPair::generate_ecdsa_p256()).unwrap()
    }

    #[test]
    fn test_issuer_ref_parsing() {
        assert_eq!(IssuerRef::parse("default").unwrap(), IssuerRef::Default);
        assert_eq!(
            IssuerRef::parse("partition-a").unwrap(),
            IssuerRef::Named("partition-a".to_string())
        );
        assert!(matches!(
            IssuerRef::parse("  "),
            Err(CrlKitError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_id_name_and_default() {
        let mut issuers = InMemoryIssuers::new();
        issuers.insert("5f1c", Some("root"), material(true));

        for reference in ["default", "5f1c", "root"] {
            let issuer_ref = IssuerRef::parse(reference).unwrap();
            assert!(
                issuers
                    .resolve(&issuer_ref, IssuerUsage::CrlSigning)
                    .await
                    .is_ok()
            );
        }

        let mut second = material(true);
        second.revocation_signature_algorithm = SignatureAlgorithm::Sha384WithECDSA;
        issuers.insert("7a2e", None, second);
        issuers.set_default("7a2e");
        let resolved = issuers
            .resolve(&IssuerRef::Default, IssuerUsage::CrlSigning)
            .await
            .unwrap();
        assert_eq!(
            resolved.revocation_signature_algorithm,
            SignatureAlgorithm::Sha384WithECDSA
        );

        let missing = IssuerRef::parse("nope").unwrap();
        assert!(matches!(
            issuers.resolve(&missing, IssuerUsage::CrlSigning).await,
            Err(CrlKitError::IssuerResolution(_))
        ));
    }

    #[tokio::test]
    async fn test_issuer_without_crl_sign_is_refused() {
        let mut issuers = InMemoryIssuers::new();
        issuers.insert("a", None, material(false));
        assert!(matches!(
            issuers
                .resolve(&IssuerRef::Default, IssuerUsage::CrlSigning)
                .await,
            Err(CrlKitError::IssuerResolution(_))
        ));
    }
}
