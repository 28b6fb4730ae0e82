//! Construction and signing of a new revocation list.

use bon::Builder;
use der::Encode;
use num_bigint::BigUint;
use rand_core::CryptoRngCore;
use time::OffsetDateTime;
use tracing::debug;
use x509_cert::Version;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};

use super::{Result, RevokedCertificate, to_x509_time};
use crate::cert::extensions::{AuthorityKeyIdentifier, CrlNumber, DeltaCrlIndicator};
use crate::cert::params::ExtensionParam;
use crate::error::CrlKitError;
use crate::issuer::Issuer;

/// Template of a revocation list before it is signed.
///
/// # Fields
/// * `revoked` - Entries to list, in the order they are emitted.
/// * `crl_number` - Value of the CRL Number extension.
/// * `delta_crl_base_number` - When set, a critical Delta CRL Indicator
///   carrying this base number is added.
/// * `this_update` - Issue time.
/// * `next_update` - Time by which the next CRL will be issued.
#[derive(Debug, Clone, Builder)]
pub struct CrlBuilder {
    #[builder(default)]
    pub revoked: Vec<RevokedCertificate>,
    pub crl_number: u64,
    pub delta_crl_base_number: Option<u64>,
    pub this_update: OffsetDateTime,
    pub next_update: OffsetDateTime,
}

impl CrlBuilder {
    /// CRL-level extensions: Authority Key Identifier, CRL Number and the
    /// optional Delta CRL Indicator, in that order.
    pub fn extensions(&self, issuer: &impl Issuer) -> Result<Vec<ExtensionParam>> {
        let key_identifier = issuer
            .certificate()
            .key_identifier()
            .map_err(|e| CrlKitError::Extension(e.to_string()))?;

        let mut extensions = vec![
            ExtensionParam::from_extension(AuthorityKeyIdentifier { key_identifier }, false)?,
            ExtensionParam::from_extension(CrlNumber(BigUint::from(self.crl_number)), false)?,
        ];

        if let Some(base) = self.delta_crl_base_number {
            extensions.push(ExtensionParam::from_extension(
                DeltaCrlIndicator(BigUint::from(base)),
                true,
            )?);
        }
        Ok(extensions)
    }

    /// Lays out the `tbsCertList` that `issuer` will sign.
    pub fn to_tbs_cert_list(&self, issuer: &impl Issuer) -> Result<TbsCertList> {
        let encoding = |e: CrlKitError| CrlKitError::Signing(e.to_string());

        let crl_extensions = self
            .extensions(issuer)?
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        let revoked = self
            .revoked
            .iter()
            .map(|entry| -> Result<RevokedCert> {
                let entry_extensions = entry
                    .extensions
                    .iter()
                    .map(ExtensionParam::to_x509)
                    .collect::<Result<Vec<_>>>()?;
                Ok(RevokedCert {
                    serial_number: entry.serial_number.clone(),
                    revocation_date: to_x509_time(entry.revocation_time).map_err(encoding)?,
                    crl_entry_extensions: (!entry_extensions.is_empty())
                        .then_some(entry_extensions),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertList {
            version: Version::V2,
            signature: issuer
                .revocation_signature_algorithm()
                .to_algorithm_identifier()
                .map_err(encoding)?,
            issuer: issuer.certificate().subject().clone(),
            this_update: to_x509_time(self.this_update).map_err(encoding)?,
            next_update: Some(to_x509_time(self.next_update).map_err(encoding)?),
            revoked_certificates: (!revoked.is_empty()).then_some(revoked),
            crl_extensions: Some(crl_extensions),
        })
    }

    /// Signs the template with the issuer's key and returns the DER encoding
    /// of the new CRL.
    ///
    /// # Errors
    /// `CrlKitError::Extension` when an extension cannot be encoded and
    /// `CrlKitError::Signing` when the issuer may not sign CRLs, its key does
    /// not fit the declared algorithm, or signing fails. Both are internal
    /// failures, not caller mistakes.
    pub fn sign(&self, issuer: &impl Issuer, rng: &mut impl CryptoRngCore) -> Result<Vec<u8>> {
        let signing_err = |e: der::Error| CrlKitError::Signing(e.to_string());

        if !issuer
            .certificate()
            .allows_crl_signing()
            .map_err(|e| CrlKitError::Signing(e.to_string()))?
        {
            return Err(CrlKitError::Signing(
                "issuer must have the crlSign key usage bit set".to_string(),
            ));
        }

        let algorithm = issuer.revocation_signature_algorithm();
        let tbs_cert_list = self.to_tbs_cert_list(issuer)?;
        let tbs_der = tbs_cert_list.to_der().map_err(signing_err)?;
        let signature = issuer.signing_key().sign_data(&algorithm, &tbs_der, rng)?;

        let crl = CertificateList {
            signature_algorithm: tbs_cert_list.signature.clone(),
            tbs_cert_list,
            signature: der::asn1::BitString::from_bytes(&signature).map_err(signing_err)?,
        };

        debug!(
            crl_number = self.crl_number,
            delta_base = ?self.delta_crl_base_number,
            entries = self.revoked.len(),
            ?algorithm,
            "signed CRL"
        );
        crl.to_der().map_err(signing_err)
    }
}
