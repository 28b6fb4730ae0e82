//! Authenticates decoded CRLs against the issuer's key.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{InputRevocationList, Result};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::error::CrlKitError;
use crate::key::PublicKey;

/// Checks that every CRL was signed by the key in `issuer`.
///
/// Each CRL is verified with the algorithm it declares itself. This is all or
/// nothing: the first CRL that fails (unknown algorithm, algorithm that does
/// not fit the issuer key, or a bad signature) aborts with its index, and
/// none of the CRLs may be used.
pub fn verify_crls_from_issuer(
    issuer: &Certificate,
    crls: &[InputRevocationList],
    cancel: &CancellationToken,
) -> Result<()> {
    let public_key = issuer
        .public_key()
        .map_err(|e| CrlKitError::IssuerKey(e.to_string()))?;
    for crl in crls {
        if cancel.is_cancelled() {
            return Err(CrlKitError::Cancelled);
        }
        verify_crl(&public_key, crl)?;
    }
    Ok(())
}

/// Verifies one CRL's signature with `public_key`.
pub fn verify_crl(public_key: &PublicKey, crl: &InputRevocationList) -> Result<()> {
    let index = crl.index;
    let Some(algorithm) = SignatureAlgorithm::from_oid(&crl.signature_algorithm.oid) else {
        warn!(index, oid = %crl.signature_algorithm.oid, "unsupported CRL signature algorithm");
        return Err(CrlKitError::SignatureMismatch { index });
    };

    if !public_key.verify(&algorithm, &crl.tbs_der, &crl.signature) {
        warn!(index, ?algorithm, "CRL signature does not verify against issuer");
        return Err(CrlKitError::SignatureMismatch { index });
    }

    debug!(index, ?algorithm, "CRL signature verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::{DistinguishedName, IssuerParams};
    use crate::key::KeyPair;

    #[test]
    fn undecodable_issuer_key_is_internal() {
        let params = IssuerParams::builder()
            .subject(
                DistinguishedName::builder()
                    .common_name("Broken CA".to_string())
                    .build(),
            )
            .build();
        let mut issuer = Certificate::new_self_signed(&params, &KeyPair::generate_ed25519()).unwrap();
        issuer.inner.tbs_certificate.subject_public_key_info.algorithm.oid =
            const_oid::ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");

        let err = verify_crls_from_issuer(&issuer, &[], &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, CrlKitError::IssuerKey(_)));
        assert!(err.is_internal());
    }
}
