#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use crlkit::cert::params::{DistinguishedName, IssuerParams};
use crlkit::crl::builder::CrlBuilder;
use crlkit::crl::{RevokedCertificate, serial_from_u64};
use crlkit::error::CrlKitError;
use crlkit::format::CrlFormat;
use crlkit::issuer::{InMemoryIssuers, Issuer, IssuerMaterial, IssuerRef, IssuerResolver, IssuerUsage};
use crlkit::key::KeyPair;
use time::OffsetDateTime;

pub const CA_NAME: &str = "myca.local";

pub fn issuer_params(crl_sign: bool) -> IssuerParams {
    IssuerParams::builder()
        .subject(
            DistinguishedName::builder()
                .common_name(CA_NAME.to_string())
                .build(),
        )
        .crl_sign(crl_sign)
        .build()
}

pub fn generate_issuer(key: KeyPair) -> IssuerMaterial {
    IssuerMaterial::self_signed(&issuer_params(true), key).unwrap()
}

pub fn generate_ca() -> IssuerMaterial {
    generate_issuer(KeyPair::generate_ecdsa_p256())
}

pub fn revoked(serial: u64, at: OffsetDateTime) -> RevokedCertificate {
    RevokedCertificate::new(serial_from_u64(serial).unwrap(), at)
}

/// Signs a partition CRL holding `entries` and returns it as PEM.
pub fn signed_crl(issuer: &impl Issuer, crl_number: u64, entries: Vec<RevokedCertificate>) -> String {
    let now = OffsetDateTime::now_utc();
    let der = CrlBuilder::builder()
        .revoked(entries)
        .crl_number(crl_number)
        .this_update(now)
        .next_update(now + time::Duration::days(1))
        .build()
        .sign(issuer, &mut rand_core::OsRng)
        .unwrap();
    CrlFormat::Pem.encode(&der)
}

pub fn resolver_for(issuer: IssuerMaterial) -> InMemoryIssuers {
    let mut issuers = InMemoryIssuers::new();
    issuers.insert("issuer-1", Some(CA_NAME), issuer);
    issuers
}

/// Resolver that records how often it was asked.
pub struct CountingResolver {
    pub inner: InMemoryIssuers,
    pub calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(inner: InMemoryIssuers) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssuerResolver for CountingResolver {
    async fn resolve(
        &self,
        issuer_ref: &IssuerRef,
        usage: IssuerUsage,
    ) -> Result<Arc<IssuerMaterial>, CrlKitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(issuer_ref, usage).await
    }
}

/// Resolver whose storage never answers.
pub struct StalledResolver;

#[async_trait]
impl IssuerResolver for StalledResolver {
    async fn resolve(
        &self,
        _issuer_ref: &IssuerRef,
        _usage: IssuerUsage,
    ) -> Result<Arc<IssuerMaterial>, CrlKitError> {
        std::future::pending().await
    }
}
