mod util;

use crlkit::issuer::{FixedClock, IssuerMaterial};
use crlkit::key::KeyPair;
use crlkit::resign::{ResignRequest, ResignResponse, resign_crls};
use regex::Regex;
use std::fs;
use std::process::Command;
use time::{Duration, OffsetDateTime};
use tokio_util::sync::CancellationToken;

async fn resign_two_partitions(issuer: &IssuerMaterial, delta_base: i64) -> ResignResponse {
    let t = OffsetDateTime::now_utc() - Duration::days(1);
    let crls = vec![
        util::signed_crl(issuer, 1, vec![util::revoked(100, t)]),
        util::signed_crl(
            issuer,
            1,
            vec![util::revoked(100, t), util::revoked(200, t + Duration::hours(1))],
        ),
    ];
    let request = ResignRequest::builder()
        .crl_number(5)
        .delta_crl_base_number(delta_base)
        .next_update("1h")
        .crls(crls)
        .build();

    let resolver = util::resolver_for(issuer.clone());
    resign_crls(
        &resolver,
        &FixedClock(OffsetDateTime::now_utc()),
        &request,
        &CancellationToken::new(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_openssl_cli_reads_and_verifies_crl() {
    let issuer = util::generate_ca();
    let response = resign_two_partitions(&issuer, 4).await;

    let crl_path = "/tmp/crlkit_test_resigned.crl.pem";
    let ca_path = "/tmp/crlkit_test_issuer.pem";
    fs::write(crl_path, &response.crl).expect("Failed to write CRL");
    fs::write(ca_path, issuer.certificate.to_pem().unwrap()).expect("Failed to write issuer");

    let output = Command::new("openssl")
        .arg("crl")
        .arg("-in")
        .arg(crl_path)
        .arg("-CAfile")
        .arg(ca_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(output_text.contains("verify OK"), "CRL signature did not verify");
    assert!(
        output_text.contains("Version 2 (0x1)"),
        "Version field is incorrect"
    );
    let issuer_line = Regex::new(r"Issuer: .*CN\s?=\s?myca\.local").unwrap();
    assert!(issuer_line.is_match(&output_text), "Issuer field is incorrect");
    assert!(
        output_text.contains("Signature Algorithm: ecdsa-with-SHA256"),
        "Signature Algorithm field is incorrect"
    );
    assert!(
        output_text.contains("X509v3 Authority Key Identifier"),
        "Missing Authority Key Identifier"
    );
    assert!(
        output_text.contains("X509v3 Delta CRL Indicator: critical"),
        "Missing Delta CRL Indicator"
    );

    let crl_number = Regex::new(r"X509v3 CRL Number:\s*\n\s*5\b").unwrap();
    assert!(crl_number.is_match(&output_text), "CRL Number is incorrect");

    let serials = Regex::new(r"Serial Number: ([0-9A-F]+)").unwrap();
    let listed: Vec<&str> = serials
        .captures_iter(&output_text)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect();
    assert_eq!(listed, vec!["64", "C8"], "Revoked serials are incorrect");

    let next_update = Regex::new(r"Next Update: .+").unwrap();
    assert!(
        next_update.is_match(&output_text),
        "Missing or incorrect Next Update field"
    );

    fs::remove_file(crl_path).expect("Failed to remove test CRL");
    fs::remove_file(ca_path).expect("Failed to remove test issuer");
}

#[tokio::test]
async fn test_openssl_crate_verifies_crl() {
    use openssl::x509::{X509, X509Crl};

    let issuers = [
        util::generate_issuer(KeyPair::generate_rsa(2048).unwrap()),
        util::generate_issuer(KeyPair::generate_ecdsa_p256()),
        util::generate_issuer(KeyPair::generate_ecdsa_p384()),
        util::generate_issuer(KeyPair::generate_ed25519()),
    ];

    for issuer in issuers {
        let response = resign_two_partitions(&issuer, -1).await;

        let crl = X509Crl::from_pem(response.crl.as_bytes()).expect("Failed to parse CRL");
        let ca = X509::from_pem(issuer.certificate.to_pem().unwrap().as_bytes())
            .expect("Failed to parse issuer");

        assert!(
            crl.verify(&ca.public_key().unwrap()).unwrap(),
            "CRL signature should verify with the issuer key"
        );

        let issuer_cn = crl
            .issuer_name()
            .entries_by_nid(openssl::nid::Nid::COMMONNAME)
            .next()
            .unwrap()
            .data()
            .as_utf8()
            .unwrap();
        assert_eq!(issuer_cn.to_string(), util::CA_NAME, "Issuer CN mismatch");

        let revoked = crl.get_revoked().expect("CRL should list revoked certificates");
        let serials: Vec<String> = revoked
            .iter()
            .map(|entry| entry.serial_number().to_bn().unwrap().to_dec_str().unwrap().to_string())
            .collect();
        assert_eq!(serials, vec!["100", "200"]);
        assert!(crl.next_update().is_some(), "nextUpdate should be present");
    }
}
