use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::CrlKitError;
use crate::pem_utils::der_to_pem;

/// Default output format of a resigned CRL.
pub const DEFAULT_FORMAT: &str = "pem";

/// PEM label of a revocation list.
pub const CRL_PEM_LABEL: &str = "X509 CRL";

/// Output encoding of a resigned CRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrlFormat {
    /// One `X509 CRL` PEM block.
    #[default]
    Pem,
    /// DER bytes in standard padded base64.
    Der,
}

impl CrlFormat {
    /// Serializes signed CRL bytes into the response string.
    pub fn encode(&self, der: &[u8]) -> String {
        match self {
            CrlFormat::Pem => der_to_pem(der, CRL_PEM_LABEL),
            CrlFormat::Der => STANDARD.encode(der),
        }
    }
}

impl FromStr for CrlFormat {
    type Err = CrlKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pem" => Ok(CrlFormat::Pem),
            "der" => Ok(CrlFormat::Der),
            _ => Err(CrlKitError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for CrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrlFormat::Pem => f.write_str("pem"),
            CrlFormat::Der => f.write_str("der"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_case_insensitive() {
        assert_eq!("PEM".parse::<CrlFormat>().unwrap(), CrlFormat::Pem);
        assert_eq!("Der".parse::<CrlFormat>().unwrap(), CrlFormat::Der);
        let err = "xml".parse::<CrlFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown format value of xml");
    }

    #[test]
    fn test_encode() {
        let der = [0x30, 0x03, 0x02, 0x01, 0x05];
        assert_eq!(CrlFormat::Der.encode(&der), "MAMCAQU=");

        let pem = CrlFormat::Pem.encode(&der);
        assert!(pem.starts_with("-----BEGIN X509 CRL-----\n"));
        assert!(pem.ends_with("-----END X509 CRL-----\n"));
        assert!(!pem.contains('\r'));
    }
}
