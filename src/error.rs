//! use crlkit::error::CrlKitError;

use serde::Serialize;
use thiserror::Error;

/// Represents errors that can occur in the CrlKit library.
///
/// Variants fall in two groups. Validation errors describe a bad request and
/// are safe to show to the caller. Internal errors ([`CrlKitError::Extension`],
/// [`CrlKitError::Signing`], [`CrlKitError::RsaError`] and
/// [`CrlKitError::IssuerKey`]) point at an environment or key-material defect
/// and are reported opaquely; see
/// [`CrlKitError::is_internal`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrlKitError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested output format is neither `pem` nor `der`.
    #[error("unknown format value of {0}")]
    UnknownFormat(String),

    /// The `next_update` duration could not be parsed.
    #[error("invalid value for next_update: {0}")]
    InvalidDuration(String),

    /// A supplied CRL string did not hold exactly one PEM block.
    #[error("failed decoding crl {index}: {reason}")]
    Decode { index: usize, reason: String },

    /// A supplied CRL block did not hold a valid revocation list.
    #[error("failed decoding crl {index}: {reason}")]
    Parse { index: usize, reason: String },

    /// A supplied CRL was not signed by the requested issuer's key.
    #[error("CRL index: {index} was not signed by requested issuer")]
    SignatureMismatch { index: usize },

    /// The issuer reference could not be resolved to key material.
    #[error("failed to resolve issuer issuer_ref: {0}")]
    IssuerResolution(String),

    /// The caller went away before the operation finished.
    #[error("operation cancelled")]
    Cancelled,

    /// An extension of the new CRL could not be encoded.
    #[error("could not create crl extension: {0}")]
    Extension(String),

    /// The new CRL could not be signed with the issuer key.
    #[error("error creating new CRL: {0}")]
    Signing(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// The issuer's own key material could not be used.
    #[error("unusable issuer key: {0}")]
    IssuerKey(String),
}

impl CrlKitError {
    /// Returns `true` for failures that are not the caller's fault.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CrlKitError::Extension(_)
                | CrlKitError::Signing(_)
                | CrlKitError::RsaError(_)
                | CrlKitError::IssuerKey(_)
        )
    }

    /// Builds the body shown to the caller.
    ///
    /// Internal errors are replaced by an opaque message so implementation
    /// details never leak into a response.
    pub fn to_error_response(&self) -> ErrorResponse {
        let error = if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        };
        ErrorResponse { error }
    }
}

/// Caller-facing error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<der::Error> for CrlKitError {
    /// Converts a `der::Error` into a `CrlKitError`.
    fn from(err: der::Error) -> Self {
        CrlKitError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CrlKitError {
    fn from(err: pem::PemError) -> Self {
        CrlKitError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CrlKitError {
    fn from(err: rsa::Error) -> Self {
        CrlKitError::RsaError(err.to_string())
    }
}
