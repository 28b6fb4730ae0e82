use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ed25519_dalek::{
    Signer as Ed25519Signer, SigningKey as Ed25519SigningKey, Verifier as Ed25519Verifier,
    VerifyingKey as Ed25519VerifyingKey,
};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::DecodePublicKey;
use rand_core::CryptoRngCore;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::CrlKitError;

pub type Result<T> = std::result::Result<T, CrlKitError>;

/// Supported key types for signing revocation lists.
#[derive(Debug, Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    Ed25519 {
        signing_key: Ed25519SigningKey,
    },
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P384SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        KeyPair::EcdsaP384 {
            signing_key,
            verifying_key,
        }
    }

    /// Generate an Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = Ed25519SigningKey::generate(&mut rng);
        KeyPair::Ed25519 { signing_key }
    }

    /// The SubjectPublicKeyInfo of the public half.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        PublicKey::from_key_pair(self).to_spki()
    }

    /// Signs `data` with `algorithm`.
    ///
    /// ECDSA signatures are returned DER-encoded, as X.509 expects. RSA signing
    /// draws blinding randomness from `rng`; the other schemes are
    /// deterministic.
    pub fn sign_data(
        &self,
        algorithm: &SignatureAlgorithm,
        data: &[u8],
        rng: &mut impl CryptoRngCore,
    ) -> Result<Vec<u8>> {
        match (self, algorithm) {
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha256WithRSA) => {
                let key = rsa::pkcs1v15::SigningKey::<Sha256>::new(*private.clone());
                rsa_sign(&key, data, rng)
            }
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha384WithRSA) => {
                let key = rsa::pkcs1v15::SigningKey::<Sha384>::new(*private.clone());
                rsa_sign(&key, data, rng)
            }
            (KeyPair::Rsa { private, .. }, SignatureAlgorithm::Sha512WithRSA) => {
                let key = rsa::pkcs1v15::SigningKey::<Sha512>::new(*private.clone());
                rsa_sign(&key, data, rng)
            }
            (KeyPair::EcdsaP256 { signing_key, .. }, alg) if alg.is_ecdsa() => {
                let prehash = ecdsa_prehash(alg, data)?;
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(&prehash)
                    .map_err(|e| CrlKitError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (KeyPair::EcdsaP384 { signing_key, .. }, alg) if alg.is_ecdsa() => {
                let prehash = ecdsa_prehash(alg, data)?;
                let signature: p384::ecdsa::Signature = signing_key
                    .sign_prehash(&prehash)
                    .map_err(|e| CrlKitError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (KeyPair::Ed25519 { signing_key }, SignatureAlgorithm::Ed25519) => {
                let signature = signing_key
                    .try_sign(data)
                    .map_err(|e| CrlKitError::Signing(e.to_string()))?;
                Ok(signature.to_bytes().to_vec())
            }
            (key, alg) => Err(CrlKitError::Signing(format!(
                "{alg:?} cannot be used with a {} key",
                key.kind()
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => "RSA",
            KeyPair::EcdsaP256 { .. } => "P-256",
            KeyPair::EcdsaP384 { .. } => "P-384",
            KeyPair::Ed25519 { .. } => "Ed25519",
        }
    }
}

fn rsa_sign<K>(key: &K, data: &[u8], rng: &mut impl CryptoRngCore) -> Result<Vec<u8>>
where
    K: RandomizedSigner<rsa::pkcs1v15::Signature>,
{
    let signature = key
        .try_sign_with_rng(rng, data)
        .map_err(|e| CrlKitError::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

fn ecdsa_prehash(algorithm: &SignatureAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
    match algorithm {
        SignatureAlgorithm::Sha256WithECDSA => Ok(Sha256::digest(data).to_vec()),
        SignatureAlgorithm::Sha384WithECDSA => Ok(Sha384::digest(data).to_vec()),
        SignatureAlgorithm::Sha512WithECDSA => Ok(Sha512::digest(data).to_vec()),
        other => Err(CrlKitError::InvalidInput(format!(
            "{other:?} is not an ECDSA algorithm"
        ))),
    }
}

/// Public half of a [`KeyPair`], or a key recovered from a certificate.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        match key_pair {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
            KeyPair::EcdsaP384 { verifying_key, .. } => PublicKey::EcdsaP384(*verifying_key),
            KeyPair::Ed25519 { signing_key } => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    /// Recovers a public key from a certificate's SubjectPublicKeyInfo.
    ///
    /// # Errors
    /// `DecodingError` when the algorithm or curve is not supported or the key
    /// bits are malformed.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use der::Encode;
        let der = spki.to_der()?;
        let unsupported = || CrlKitError::DecodingError("Unsupported public key type".to_string());
        let decode_err = |e: pkcs8::spki::Error| CrlKitError::DecodingError(e.to_string());

        match spki.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => {
                Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der).map_err(decode_err)?))
            }
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .ok_or_else(unsupported)?
                    .decode_as::<const_oid::ObjectIdentifier>()?;
                match curve {
                    const_oid::db::rfc5912::SECP_256_R_1 => Ok(PublicKey::EcdsaP256(
                        P256VerifyingKey::from_public_key_der(&der).map_err(decode_err)?,
                    )),
                    const_oid::db::rfc5912::SECP_384_R_1 => Ok(PublicKey::EcdsaP384(
                        P384VerifyingKey::from_public_key_der(&der).map_err(decode_err)?,
                    )),
                    _ => Err(unsupported()),
                }
            }
            const_oid::db::rfc8410::ID_ED_25519 => Ok(PublicKey::Ed25519(
                Ed25519VerifyingKey::from_public_key_der(&der).map_err(decode_err)?,
            )),
            _ => Err(unsupported()),
        }
    }

    /// Encodes the key as a SubjectPublicKeyInfo.
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let encoded = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone()),
            PublicKey::EcdsaP256(verifying_key) => SubjectPublicKeyInfoOwned::from_key(*verifying_key),
            PublicKey::EcdsaP384(verifying_key) => SubjectPublicKeyInfoOwned::from_key(*verifying_key),
            PublicKey::Ed25519(verifying_key) => SubjectPublicKeyInfoOwned::from_key(*verifying_key),
        };
        encoded.map_err(|e| CrlKitError::EncodingError(e.to_string()))
    }

    /// Checks `signature` over `data` under `algorithm`.
    ///
    /// Returns `false` for a bad signature, a malformed signature encoding or
    /// an algorithm that does not fit this key.
    pub fn verify(&self, algorithm: &SignatureAlgorithm, data: &[u8], signature: &[u8]) -> bool {
        match (self, algorithm) {
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha256WithRSA) => {
                rsa_verify(rsa::pkcs1v15::VerifyingKey::<Sha256>::new(public.clone()), data, signature)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha384WithRSA) => {
                rsa_verify(rsa::pkcs1v15::VerifyingKey::<Sha384>::new(public.clone()), data, signature)
            }
            (PublicKey::Rsa(public), SignatureAlgorithm::Sha512WithRSA) => {
                rsa_verify(rsa::pkcs1v15::VerifyingKey::<Sha512>::new(public.clone()), data, signature)
            }
            (PublicKey::EcdsaP256(verifying_key), alg) if alg.is_ecdsa() => {
                let (Ok(prehash), Ok(signature)) = (
                    ecdsa_prehash(alg, data),
                    p256::ecdsa::Signature::from_der(signature),
                ) else {
                    return false;
                };
                verifying_key.verify_prehash(&prehash, &signature).is_ok()
            }
            (PublicKey::EcdsaP384(verifying_key), alg) if alg.is_ecdsa() => {
                let (Ok(prehash), Ok(signature)) = (
                    ecdsa_prehash(alg, data),
                    p384::ecdsa::Signature::from_der(signature),
                ) else {
                    return false;
                };
                verifying_key.verify_prehash(&prehash, &signature).is_ok()
            }
            (PublicKey::Ed25519(verifying_key), SignatureAlgorithm::Ed25519) => {
                match ed25519_dalek::Signature::from_slice(signature) {
                    Ok(signature) => verifying_key.verify(data, &signature).is_ok(),
                    Err(_) => false,
                }
            }
            _ => false,
        }
    }
}

fn rsa_verify<K>(key: K, data: &[u8], signature: &[u8]) -> bool
where
    K: Verifier<rsa::pkcs1v15::Signature>,
{
    match rsa::pkcs1v15::Signature::try_from(signature) {
        Ok(signature) => key.verify(data, &signature).is_ok(),
        Err(_) => false,
    }
}
