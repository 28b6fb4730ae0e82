//! # CrlKit - Merging and Re-signing Certificate Revocation Lists
//!
//! CrlKit takes several X.509 certificate revocation lists that were each
//! signed by the same issuer key, for example by separate partitions of a
//! distributed CA, checks that every one of them really came from that key,
//! merges their revoked entries and signs one fresh CRL with the issuer key.
//! It is built entirely with rustcrypto libraries.
//!
//! ## Supported Key Types
//!
//! - **RSA**: PKCS#1 v1.5 with SHA-256, SHA-384 or SHA-512
//! - **ECDSA**: P-256 and P-384 curves, with SHA-256, SHA-384 or SHA-512
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! ## Pipeline
//!
//! 1. [`crl::decode`] turns each PEM string into an
//!    [`InputRevocationList`](crl::InputRevocationList).
//! 2. [`crl::verify`] checks each signature against the issuer's public key.
//! 3. [`crl::reconcile`] merges the entries, keeping the earliest revocation
//!    time per serial and recording a warning when times disagree.
//! 4. [`crl::builder`] lays out and signs the new CRL.
//! 5. [`format`] encodes it as PEM or base64 DER.
//!
//! Any failure aborts the whole operation; no partial CRL is ever produced.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crlkit::{
//!     cert::params::{DistinguishedName, IssuerParams},
//!     issuer::{InMemoryIssuers, IssuerMaterial, SystemClock},
//!     key::KeyPair,
//!     resign::{ResignRequest, resign_crls},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(crl_a: String, crl_b: String) -> Result<(), crlkit::error::CrlKitError> {
//! let params = IssuerParams::builder()
//!     .subject(
//!         DistinguishedName::builder()
//!             .common_name("Example CA".to_string())
//!             .build(),
//!     )
//!     .build();
//! let issuer = IssuerMaterial::self_signed(&params, KeyPair::generate_ecdsa_p256())?;
//!
//! let mut issuers = InMemoryIssuers::new();
//! issuers.insert("example-ca", Some("Example CA"), issuer);
//!
//! let request = ResignRequest::builder()
//!     .crl_number(5)
//!     .next_update("1h")
//!     .crls(vec![crl_a, crl_b])
//!     .build();
//!
//! let response = resign_crls(&issuers, &SystemClock, &request, &CancellationToken::new()).await?;
//! println!("{}", response.crl);
//! for warning in response.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is a [`CrlKitError`](error::CrlKitError). Validation errors
//! carry a message meant for the caller; internal errors are reported
//! opaquely:
//!
//! ```rust
//! use crlkit::error::CrlKitError;
//!
//! let err = CrlKitError::SignatureMismatch { index: 1 };
//! assert_eq!(err.to_error_response().error, "CRL index: 1 was not signed by requested issuer");
//!
//! let err = CrlKitError::Signing("hsm unavailable".to_string());
//! assert_eq!(err.to_error_response().error, "internal error");
//! ```
//!
//! ## Module Organization
//!
//! - [`resign`]: Request validation and the end-to-end operation
//! - [`crl`]: Decoding, verification, reconciliation and signing of CRLs
//! - [`issuer`]: Issuer material, resolution and clocks
//! - [`cert`]: Issuer certificates, signature algorithms and extensions
//! - [`key`]: Key generation, signing and verification
//! - [`format`]: Output encodings
//! - [`duration`]: Duration strings such as `"72h"`
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure used to bootstrap issuers
//! - [`pem_utils`]: PEM helpers

pub mod cert;
pub mod crl;
pub mod duration;
pub mod error;
pub mod format;
pub mod issuer;
pub mod key;
pub mod pem_utils;
pub mod resign;
pub mod tbs_certificate;
