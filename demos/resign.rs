use crlkit::cert::params::{DistinguishedName, IssuerParams};
use crlkit::crl::builder::CrlBuilder;
use crlkit::crl::{RevokedCertificate, serial_from_u64};
use crlkit::error::CrlKitError;
use crlkit::format::CrlFormat;
use crlkit::issuer::{InMemoryIssuers, IssuerMaterial, SystemClock};
use crlkit::key::KeyPair;
use crlkit::resign::{ResignRequest, resign_crls};
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;

/// Signs a CRL the way one partition of a distributed CA would.
fn partition_crl(
    issuer: &IssuerMaterial,
    revoked: &[(u64, OffsetDateTime)],
) -> Result<String, CrlKitError> {
    let now = OffsetDateTime::now_utc();
    let revoked = revoked
        .iter()
        .map(|(serial, at)| Ok(RevokedCertificate::new(serial_from_u64(*serial)?, *at)))
        .collect::<Result<Vec<_>, CrlKitError>>()?;

    let der = CrlBuilder::builder()
        .revoked(revoked)
        .crl_number(1)
        .this_update(now)
        .next_update(now + Duration::days(1))
        .build()
        .sign(issuer, &mut rand_core::OsRng)?;
    Ok(CrlFormat::Pem.encode(&der))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CrlKitError> {
    let params = IssuerParams::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("My Test CA".to_string())
                .organization("Example Corp".to_string())
                .build(),
        )
        .build();
    let issuer = IssuerMaterial::self_signed(&params, KeyPair::generate_ecdsa_p256())?;
    println!("Issuer certificate:\n{}", issuer.certificate.to_pem()?);

    let earlier = OffsetDateTime::now_utc() - Duration::hours(6);
    let later = earlier + Duration::hours(2);
    let crl_a = partition_crl(&issuer, &[(100, earlier), (12345, later)])?;
    let crl_b = partition_crl(&issuer, &[(100, earlier), (200, later), (12345, earlier)])?;

    let mut issuers = InMemoryIssuers::new();
    issuers.insert("issuer-1", Some("my-test-ca"), issuer);

    let request = ResignRequest::builder()
        .crl_number(5)
        .next_update("1h")
        .crls(vec![crl_a, crl_b])
        .build();

    match resign_crls(&issuers, &SystemClock, &request, &CancellationToken::new()).await {
        Ok(response) => {
            println!("Resigned CRL:\n{}", response.crl);
            for warning in &response.warnings {
                println!("warning: {warning}");
            }
        }
        Err(e) => println!("{}", e.to_error_response().error),
    }
    Ok(())
}
