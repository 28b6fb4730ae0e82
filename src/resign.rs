//! The resign operation: authenticate CRLs from one issuer, merge them and
//! sign the result.
//!
//! [`resign_crls`] is the entry point for request handlers. It validates the
//! request before doing any cryptographic work, looks the issuer up through an
//! [`IssuerResolver`] and then hands over to [`Resigner`], which runs the
//! pipeline against issuer material the caller already holds.

use bon::Builder;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::crl::builder::CrlBuilder;
use crate::crl::decode::decode_pem_crls;
use crate::crl::reconcile::reconcile;
use crate::crl::verify::verify_crls_from_issuer;
use crate::crl::{InputRevocationList, truncate_to_seconds};
use crate::duration::{DEFAULT_NEXT_UPDATE, parse_duration};
use crate::error::CrlKitError;
use crate::format::{CrlFormat, DEFAULT_FORMAT};
use crate::issuer::{
    Clock, DEFAULT_ISSUER_REF, IssuerMaterial, IssuerRef, IssuerResolver, IssuerUsage,
};

pub type Result<T> = std::result::Result<T, CrlKitError>;

/// Delta base number meaning "not a delta CRL".
pub const NO_DELTA_BASE: i64 = -1;

fn default_issuer_ref() -> String {
    DEFAULT_ISSUER_REF.to_string()
}

fn default_delta_crl_base_number() -> i64 {
    NO_DELTA_BASE
}

fn default_next_update() -> String {
    DEFAULT_NEXT_UPDATE.to_string()
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

/// A resign request as received from the caller.
///
/// # Fields
/// * `issuer_ref` - Issuer identifier or name, `"default"` for the default issuer.
/// * `crl_number` - CRL Number of the new CRL.
/// * `delta_crl_base_number` - Base CRL number of a delta CRL, or -1.
/// * `next_update` - Offset of `nextUpdate` from now, e.g. `"72h"`.
/// * `crls` - PEM-encoded CRLs, one block per string.
/// * `format` - `"pem"` or `"der"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
pub struct ResignRequest {
    #[serde(default = "default_issuer_ref")]
    #[builder(default = default_issuer_ref(), into)]
    pub issuer_ref: String,
    pub crl_number: i64,
    #[serde(default = "default_delta_crl_base_number")]
    #[builder(default = NO_DELTA_BASE)]
    pub delta_crl_base_number: i64,
    #[serde(default = "default_next_update")]
    #[builder(default = default_next_update(), into)]
    pub next_update: String,
    pub crls: Vec<String>,
    #[serde(default = "default_format")]
    #[builder(default = default_format(), into)]
    pub format: String,
}

/// A request whose parameters have all been checked and parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub issuer_ref: IssuerRef,
    pub crl_number: u64,
    pub delta_crl_base_number: Option<u64>,
    pub next_update: Duration,
    pub crls: Vec<String>,
    pub format: CrlFormat,
}

impl ResignRequest {
    /// Checks the request parameters, in this order: format, next_update,
    /// crl_number, delta_crl_base_number, issuer_ref.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let format = self.format.parse::<CrlFormat>()?;

        let next_update = parse_duration(&self.next_update)?;
        // CRL times carry whole seconds.
        if next_update < Duration::SECOND {
            return Err(CrlKitError::InvalidDuration(format!(
                "{} must be at least 1s",
                self.next_update
            )));
        }

        let crl_number = u64::try_from(self.crl_number).map_err(|_| {
            CrlKitError::InvalidInput("crl_number must be a non-negative integer".to_string())
        })?;

        let delta_crl_base_number = match self.delta_crl_base_number {
            NO_DELTA_BASE => None,
            base => Some(u64::try_from(base).map_err(|_| {
                CrlKitError::InvalidInput(
                    "delta_crl_base_number must be -1 or a non-negative integer".to_string(),
                )
            })?),
        };

        let issuer_ref = IssuerRef::parse(&self.issuer_ref)?;

        Ok(ValidatedRequest {
            issuer_ref,
            crl_number,
            delta_crl_base_number,
            next_update,
            crls: self.crls.clone(),
            format,
        })
    }
}

/// Successful result of a resign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResignResponse {
    /// PEM text or base64 DER, per the requested format.
    pub crl: String,
    /// One entry per serial whose revocation times disagreed.
    pub warnings: Vec<String>,
}

/// Runs the resign pipeline with issuer material already in hand.
pub struct Resigner<'a> {
    issuer: &'a IssuerMaterial,
    cancel: CancellationToken,
}

impl<'a> Resigner<'a> {
    pub fn new(issuer: &'a IssuerMaterial) -> Self {
        Self {
            issuer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Decodes, verifies, merges and re-signs the request's CRLs.
    pub fn resign(&self, request: &ValidatedRequest, now: OffsetDateTime) -> Result<ResignResponse> {
        let crls = decode_pem_crls(&request.crls, &self.cancel)?;
        self.resign_decoded(request, &crls, now)
    }

    /// Same as [`Resigner::resign`] for CRLs that were decoded already.
    pub fn resign_decoded(
        &self,
        request: &ValidatedRequest,
        crls: &[InputRevocationList],
        now: OffsetDateTime,
    ) -> Result<ResignResponse> {
        verify_crls_from_issuer(&self.issuer.certificate, crls, &self.cancel)?;

        let (revoked, warnings) = reconcile(crls).into_parts();
        debug!(
            inputs = crls.len(),
            entries = revoked.len(),
            conflicts = warnings.len(),
            "reconciled revocation entries"
        );

        if self.cancel.is_cancelled() {
            return Err(CrlKitError::Cancelled);
        }

        let this_update = truncate_to_seconds(now);
        let next_update = this_update
            .checked_add(request.next_update)
            .ok_or_else(|| {
                CrlKitError::InvalidDuration(format!(
                    "{} is out of range",
                    request.next_update
                ))
            })?;

        let der = CrlBuilder::builder()
            .revoked(revoked)
            .crl_number(request.crl_number)
            .maybe_delta_crl_base_number(request.delta_crl_base_number)
            .this_update(this_update)
            .next_update(next_update)
            .build()
            .sign(self.issuer, &mut OsRng)?;

        Ok(ResignResponse {
            crl: request.format.encode(&der),
            warnings,
        })
    }
}

/// Resigns the CRLs of `request` under the issuer it references.
///
/// Nothing is resolved or verified until every request parameter is valid.
/// Cancelling `cancel` aborts the operation at the next check with
/// [`CrlKitError::Cancelled`].
pub async fn resign_crls(
    resolver: &dyn IssuerResolver,
    clock: &dyn Clock,
    request: &ResignRequest,
    cancel: &CancellationToken,
) -> Result<ResignResponse> {
    let result = run(resolver, clock, request, cancel).await;
    match &result {
        Ok(response) => info!(
            issuer_ref = %request.issuer_ref,
            crl_number = request.crl_number,
            inputs = request.crls.len(),
            warnings = response.warnings.len(),
            "resigned CRLs"
        ),
        Err(e) if e.is_internal() => error!(issuer_ref = %request.issuer_ref, error = %e, "resign failed"),
        Err(e) => debug!(issuer_ref = %request.issuer_ref, error = %e, "resign rejected"),
    }
    result
}

async fn run(
    resolver: &dyn IssuerResolver,
    clock: &dyn Clock,
    request: &ResignRequest,
    cancel: &CancellationToken,
) -> Result<ResignResponse> {
    let validated = request.validate()?;
    let crls = decode_pem_crls(&validated.crls, cancel)?;

    let issuer = tokio::select! {
        _ = cancel.cancelled() => return Err(CrlKitError::Cancelled),
        resolved = resolver.resolve(&validated.issuer_ref, IssuerUsage::CrlSigning) => resolved?,
    };

    Resigner::new(&issuer)
        .with_cancellation(cancel.clone())
        .resign_decoded(&validated, &crls, clock.now())
}
