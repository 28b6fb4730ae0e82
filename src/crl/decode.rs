//! Turns caller-supplied PEM text into [`InputRevocationList`]s.

use der::asn1::{AnyRef, BitString};
use der::{Decode, Encode, Sequence};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use x509_cert::crl::CertificateList;
use x509_cert::spki::AlgorithmIdentifierOwned;

use super::{InputRevocationList, Result, RevokedCertificate, from_x509_time};
use crate::cert::extensions::{CrlNumber, ToAndFromX509Extension};
use crate::cert::params::ExtensionParam;
use crate::error::CrlKitError;
use crate::pem_utils;

/// `CertificateList` with the TBS part left undecoded, so the exact signed
/// bytes can be recovered.
#[derive(Sequence)]
struct SignedCrlRef<'a> {
    tbs_cert_list: AnyRef<'a>,
    signature_algorithm: AlgorithmIdentifierOwned,
    signature: BitString,
}

/// Decodes every string in `raw_crls`, keeping input order.
///
/// Each string must hold exactly one PEM block. Errors carry the index of the
/// offending string. `cancel` is checked before each CRL.
pub fn decode_pem_crls<S: AsRef<str>>(
    raw_crls: &[S],
    cancel: &CancellationToken,
) -> Result<Vec<InputRevocationList>> {
    raw_crls
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            if cancel.is_cancelled() {
                return Err(CrlKitError::Cancelled);
            }
            decode_pem_crl(index, raw.as_ref())
        })
        .collect()
}

/// Decodes a single PEM-wrapped CRL found at position `index` of the input.
pub fn decode_pem_crl(index: usize, raw: &str) -> Result<InputRevocationList> {
    let block = pem_utils::parse_single_block(raw)
        .map_err(|reason| CrlKitError::Decode { index, reason })?;
    let crl = decode_der_crl(index, block.contents())?;
    debug!(
        index,
        label = block.tag(),
        entries = crl.revoked.len(),
        "decoded CRL"
    );
    Ok(crl)
}

/// Parses a DER `CertificateList`.
pub fn decode_der_crl(index: usize, der: &[u8]) -> Result<InputRevocationList> {
    let parse_err = |reason: String| CrlKitError::Parse { index, reason };

    let signed = SignedCrlRef::from_der(der).map_err(|e| parse_err(e.to_string()))?;
    let crl = CertificateList::from_der(der).map_err(|e| parse_err(e.to_string()))?;

    if crl.tbs_cert_list.signature != crl.signature_algorithm {
        return Err(parse_err(
            "inner and outer signature algorithm identifiers don't match".to_string(),
        ));
    }

    let tbs_der = signed
        .tbs_cert_list
        .to_der()
        .map_err(|e| parse_err(e.to_string()))?;

    let crl_extensions: Vec<ExtensionParam> = crl
        .tbs_cert_list
        .crl_extensions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(ExtensionParam::from_x509)
        .collect();

    let crl_number = crl_extensions
        .iter()
        .find(|ext| ext.oid == CrlNumber::OID)
        .map(|ext| ext.to_extension::<CrlNumber>())
        .transpose()
        .map_err(|e| parse_err(e.to_string()))?
        .map(|number| number.0);

    let revoked = crl
        .tbs_cert_list
        .revoked_certificates
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|entry| RevokedCertificate {
            serial_number: entry.serial_number.clone(),
            revocation_time: from_x509_time(&entry.revocation_date),
            extensions: entry
                .crl_entry_extensions
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(ExtensionParam::from_x509)
                .collect(),
        })
        .collect();

    Ok(InputRevocationList {
        index,
        issuer: crl.tbs_cert_list.issuer.clone(),
        this_update: from_x509_time(&crl.tbs_cert_list.this_update),
        next_update: crl.tbs_cert_list.next_update.as_ref().map(from_x509_time),
        crl_number,
        revoked,
        tbs_der,
        signature_algorithm: signed.signature_algorithm,
        signature: signed.signature.raw_bytes().to_vec(),
    })
}
