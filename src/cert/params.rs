use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::RdnSequence;

use super::extensions::ToAndFromX509Extension;
use crate::error::CrlKitError;

/// Parameters for bootstrapping a self-signed CRL-signing issuer.
///
/// # Fields
/// * `subject` - The distinguished name of the issuer.
/// * `validity` - Validity window of the issuer certificate.
/// * `serial_number` - Big-endian serial of the issuer certificate.
/// * `crl_sign` - Whether the Key Usage extension grants `cRLSign`.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct IssuerParams {
    pub subject: DistinguishedName,
    #[builder(default = Validity::for_days(365))]
    pub validity: Validity,
    #[builder(default = vec![1])]
    pub serial_number: Vec<u8>,
    #[builder(default = true)]
    pub crl_sign: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name of an issuer.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Only the attributes that are set are emitted.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName, CrlKitError> {
        use core::str::FromStr;
        let mut parts = vec![format!("CN={}", self.common_name)];
        let optional = [
            ("OU", &self.organization_unit),
            ("O", &self.organization),
            ("L", &self.locality),
            ("ST", &self.state),
            ("C", &self.country),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                parts.push(format!("{key}={value}"));
            }
        }
        RdnSequence::from_str(&parts.join(","))
            .map_err(|e| CrlKitError::InvalidInput(format!("invalid distinguished name: {e}")))
    }

    /// Reads the common name back out of an X.509 name.
    ///
    /// Attributes other than CN are not recovered.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let common_name = x509dn
            .0
            .iter()
            .flat_map(|rdn| rdn.0.iter())
            .find(|attr| attr.oid == const_oid::db::rfc4519::CN)
            .map(|attr| String::from_utf8_lossy(attr.value.value()).into_owned())
            .unwrap_or_default();

        DistinguishedName {
            common_name,
            ..Default::default()
        }
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Errors
    /// `CrlKitError::Extension` if the value cannot be DER-encoded.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CrlKitError> {
        let value = extension
            .to_x509_extension_value()
            .map_err(|e| CrlKitError::Extension(format!("{}: {e}", E::OID)))?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CrlKitError> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn from_x509(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension, CrlKitError> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())
                .map_err(|e| CrlKitError::Extension(e.to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinguished_name_round_trip_keeps_common_name() {
        let dn = DistinguishedName::builder()
            .common_name("Partition CA".to_string())
            .organization("Example Corp".to_string())
            .build();
        let x509 = dn.as_x509_name().unwrap();
        assert!(x509.to_string().contains("CN=Partition CA"));
        assert_eq!(
            DistinguishedName::from_x509_name(&x509).common_name,
            "Partition CA"
        );
    }
}
