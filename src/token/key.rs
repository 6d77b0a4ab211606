// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key material.
//!
//! A [`SigningKey`] is derived once at startup from a configured secret and
//! shared read-only (behind an `Arc`) by every component that signs or
//! verifies tokens.
//!
//! ## Key Stretching
//!
//! HMAC algorithms declare a minimum key length. A configured secret is
//! turned into a key of exactly that length:
//!
//! - shorter secrets are repeated byte-by-byte and cut at the required length
//! - longer secrets are cut at the required length
//!
//! Bytes past the required length are ignored and add no entropy: two
//! secrets sharing their first 32 bytes give the same HS256 key.
//!
//! This is part of the wire-compatible configuration contract: any other
//! service verifying our tokens must derive its key the same way.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Sha256, Sha384, Sha512};

use super::error::TokenError;

/// HMAC algorithm used to sign tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// HMAC-SHA256
    #[default]
    HS256,
    /// HMAC-SHA384
    HS384,
    /// HMAC-SHA512
    HS512,
}

impl Algorithm {
    /// Name used in the token header `alg` field.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
        }
    }

    /// Minimum key length in bytes (the digest output size).
    pub fn required_key_len(&self) -> usize {
        match self {
            Algorithm::HS256 => 32,
            Algorithm::HS384 => 48,
            Algorithm::HS512 => 64,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(TokenError::Configuration(format!(
                "unsupported signing algorithm '{other}' (expected HS256, HS384 or HS512)"
            ))),
        }
    }
}

/// Immutable symmetric key bound to one algorithm.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    algorithm: Algorithm,
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Generate a random key from the OS RNG.
    ///
    /// Used for the CSRF key when no CSRF secret is configured: challenges
    /// live for seconds, so a key that changes on restart is acceptable.
    pub fn random(algorithm: Algorithm) -> Self {
        let mut bytes = vec![0u8; algorithm.required_key_len()];
        OsRng.fill_bytes(&mut bytes);
        Self { algorithm, bytes }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Compute the MAC of `data` under this key.
    pub(crate) fn sign(&self, data: &[u8]) -> Result<Vec<u8>, TokenError> {
        fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, TokenError> {
            let mut mac = <M as Mac>::new_from_slice(key)
                .map_err(|_| TokenError::Configuration("invalid HMAC key length".to_string()))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }

        match self.algorithm {
            Algorithm::HS256 => mac::<Hmac<Sha256>>(&self.bytes, data),
            Algorithm::HS384 => mac::<Hmac<Sha384>>(&self.bytes, data),
            Algorithm::HS512 => mac::<Hmac<Sha512>>(&self.bytes, data),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a signing key from a configured secret.
///
/// Fails with [`TokenError::Configuration`] when the secret is empty.
pub fn derive_key(secret: &str, algorithm: Algorithm) -> Result<SigningKey, TokenError> {
    let secret = secret.as_bytes();
    if secret.is_empty() {
        return Err(TokenError::Configuration(
            "signing secret must not be empty".to_string(),
        ));
    }

    let required = algorithm.required_key_len();
    let bytes: Vec<u8> = secret.iter().copied().cycle().take(required).collect();

    Ok(SigningKey { algorithm, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let a = derive_key("s3cret", Algorithm::HS256).unwrap();
        let b = derive_key("s3cret", Algorithm::HS256).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn derived_length_matches_algorithm() {
        for alg in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            for secret in ["k", "short-secret", &"x".repeat(100)] {
                let key = derive_key(secret, alg).unwrap();
                assert_eq!(key.as_bytes().len(), alg.required_key_len());
            }
        }
    }

    #[test]
    fn short_secret_is_repeated() {
        let key = derive_key("abc", Algorithm::HS256).unwrap();
        assert_eq!(key.as_bytes(), b"abcabcabcabcabcabcabcabcabcabcab");
    }

    #[test]
    fn long_secret_keeps_its_prefix() {
        let secret = "k".repeat(40);
        let key = derive_key(&secret, Algorithm::HS256).unwrap();
        assert_eq!(key.as_bytes(), "k".repeat(32).as_bytes());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let err = derive_key("", Algorithm::HS512).unwrap_err();
        assert!(matches!(err, TokenError::Configuration(_)));
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("hs384".parse::<Algorithm>().unwrap(), Algorithm::HS384);
        assert!("RS256".parse::<Algorithm>().is_err());
    }

    #[test]
    fn debug_output_redacts_key_bytes() {
        let key = derive_key("topsecretvalue", Algorithm::HS256).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn random_keys_differ() {
        let a = SigningKey::random(Algorithm::HS256);
        let b = SigningKey::random(Algorithm::HS256);
        assert_eq!(a.as_bytes().len(), 32);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn mac_length_follows_digest() {
        let key = derive_key("k", Algorithm::HS512).unwrap();
        assert_eq!(key.sign(b"payload").unwrap().len(), 64);
    }
}
