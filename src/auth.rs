// Re-exported types for public API convenience
/// The [`Signer`] trait from alloy for signing operations.
pub use alloy::signers::Signer;
/// Local wallet signer for signing with a private key.
pub use alloy::signers::local::LocalSigner;
use async_trait::async_trait;
/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
/// UUID type used for API keys.
pub use uuid::Uuid;

use crate::Result;

/// Type alias for API keys, which are UUIDs.
pub type ApiKey = Uuid;

/// The credential triple used to authenticate to the Polymarket API.
///
/// Returned by [`crate::clob::Client::create_or_derive_api_key`] and friends. The REST client
/// uses it to sign L2 requests, and the user feed channel embeds it in its subscribe frame.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(alias = "apiKey")]
    pub(crate) key: ApiKey,
    pub(crate) secret: SecretString,
    pub(crate) passphrase: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(key: Uuid, secret: String, passphrase: String) -> Self {
        Self {
            key,
            secret: SecretString::from(secret),
            passphrase: SecretString::from(passphrase),
        }
    }

    /// Returns the API key.
    #[must_use]
    pub fn key(&self) -> ApiKey {
        self.key
    }

    /// Returns the secret.
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Returns the passphrase.
    #[must_use]
    pub fn passphrase(&self) -> &SecretString {
        &self.passphrase
    }
}

/// Source of [`Credentials`] for authenticated feeds.
///
/// The feed asks for credentials on every fresh connect and on every reconnect, so an
/// implementation may hand out short-lived triples. A fixed [`Credentials`] value is itself a
/// provider; [`crate::clob::SignerCredentials`] derives a triple from a signing key.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials>;
}

#[async_trait]
impl CredentialProvider for Credentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

/// Each client can exist in one state at a time, i.e. [`state::Unauthenticated`] or
/// [`state::Authenticated`].
pub mod state {
    use crate::auth::Credentials;
    use crate::types::Address;

    /// The initial state of the client
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    pub struct Unauthenticated;

    /// The elevated state of the client, reached through
    /// [`crate::clob::client::AuthenticationBuilder::authenticate`].
    #[non_exhaustive]
    #[derive(Clone, Debug)]
    #[cfg_attr(
        not(feature = "clob"),
        expect(dead_code, reason = "Fields used by clob module when feature enabled")
    )]
    pub struct Authenticated {
        /// The signer's address that created the credentials
        pub(crate) address: Address,
        /// Signs each request through the L2 `POLY_SIGNATURE` header.
        pub(crate) credentials: Credentials,
    }

    /// The clob state can only be [`Unauthenticated`] or [`Authenticated`].
    pub trait State: sealed::Sealed {}

    impl State for Unauthenticated {}
    impl sealed::Sealed for Unauthenticated {}

    impl State for Authenticated {}
    impl sealed::Sealed for Authenticated {}

    mod sealed {
        pub trait Sealed {}
    }
}

/// Header names and assembly shared by both signing levels.
#[cfg(feature = "clob")]
mod headers {
    use reqwest::header::{HeaderMap, HeaderValue};

    use crate::Result;

    pub(crate) const POLY_ADDRESS: &str = "POLY_ADDRESS";
    pub(crate) const POLY_API_KEY: &str = "POLY_API_KEY";
    pub(crate) const POLY_NONCE: &str = "POLY_NONCE";
    pub(crate) const POLY_PASSPHRASE: &str = "POLY_PASSPHRASE";
    pub(crate) const POLY_SIGNATURE: &str = "POLY_SIGNATURE";
    pub(crate) const POLY_TIMESTAMP: &str = "POLY_TIMESTAMP";

    pub(crate) fn build<const N: usize>(pairs: [(&'static str, String); N]) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(N);
        for (name, value) in pairs {
            map.insert(name, HeaderValue::try_from(value)?);
        }
        Ok(map)
    }
}

/// Level 1: an EIP712 attestation signed by the wallet, used to create or derive
/// [`Credentials`].
#[cfg(feature = "clob")]
pub(crate) mod l1 {
    use std::borrow::Cow;

    use alloy::core::sol;
    use alloy::dyn_abi::Eip712Domain;
    use alloy::hex::ToHexExt as _;
    use alloy::primitives::{ChainId, U256};
    use alloy::signers::Signer;
    use alloy::sol_types::SolStruct as _;
    use reqwest::header::HeaderMap;

    use super::headers::{self, POLY_ADDRESS, POLY_NONCE, POLY_SIGNATURE, POLY_TIMESTAMP};
    use crate::{Result, Timestamp};

    const ATTESTATION: &str = "This message attests that I control the given wallet";

    sol! {
        #[non_exhaustive]
        struct ClobAuth {
            address address;
            string  timestamp;
            uint256 nonce;
            string  message;
        }
    }

    fn domain(chain_id: ChainId) -> Eip712Domain {
        Eip712Domain {
            name: Some(Cow::Borrowed("ClobAuthDomain")),
            version: Some(Cow::Borrowed("1")),
            chain_id: Some(U256::from(chain_id)),
            ..Eip712Domain::default()
        }
    }

    /// A missing `nonce` signs as `0`.
    pub(crate) async fn create_headers<S: Signer>(
        signer: &S,
        chain_id: ChainId,
        timestamp: Timestamp,
        nonce: Option<u32>,
    ) -> Result<HeaderMap> {
        let nonce = nonce.unwrap_or_default();
        let attestation = ClobAuth {
            address: signer.address(),
            timestamp: timestamp.to_string(),
            nonce: U256::from(nonce),
            message: ATTESTATION.to_owned(),
        };

        let signature = signer
            .sign_hash(&attestation.eip712_signing_hash(&domain(chain_id)))
            .await?;

        headers::build([
            (POLY_ADDRESS, signer.address().encode_hex_with_prefix()),
            (POLY_NONCE, nonce.to_string()),
            (POLY_SIGNATURE, signature.to_string()),
            (POLY_TIMESTAMP, timestamp.to_string()),
        ])
    }
}

/// Level 2: an HMAC of each request, keyed with the [`Credentials`] secret.
#[cfg(feature = "clob")]
pub(crate) mod l2 {
    use alloy::hex::ToHexExt as _;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE;
    use hmac::{Hmac, Mac as _};
    use reqwest::header::HeaderMap;
    use reqwest::{Body, Request};
    use secrecy::{ExposeSecret as _, SecretString};
    use sha2::Sha256;

    use super::headers::{
        self, POLY_ADDRESS, POLY_API_KEY, POLY_PASSPHRASE, POLY_SIGNATURE, POLY_TIMESTAMP,
    };
    use crate::auth::state::Authenticated;
    use crate::{Result, Timestamp};

    pub(crate) fn create_headers(
        state: &Authenticated,
        request: &Request,
        timestamp: Timestamp,
    ) -> Result<HeaderMap> {
        let Authenticated {
            address,
            credentials,
        } = state;
        let signature = sign(&credentials.secret, &signing_payload(request, timestamp))?;

        headers::build([
            (POLY_ADDRESS, address.encode_hex_with_prefix()),
            (POLY_API_KEY, credentials.key.to_string()),
            (
                POLY_PASSPHRASE,
                credentials.passphrase.expose_secret().to_owned(),
            ),
            (POLY_SIGNATURE, signature),
            (POLY_TIMESTAMP, timestamp.to_string()),
        ])
    }

    /// `{timestamp}{METHOD}{path}{body}`. The query string is not signed, and single quotes in
    /// the body are signed as double quotes.
    pub(super) fn signing_payload(request: &Request, timestamp: Timestamp) -> String {
        let body = request
            .body()
            .and_then(Body::as_bytes)
            .map(|bytes| String::from_utf8_lossy(bytes).replace('\'', "\""))
            .unwrap_or_default();

        format!(
            "{timestamp}{}{}{body}",
            request.method(),
            request.url().path()
        )
    }

    pub(super) fn sign(secret: &SecretString, payload: &str) -> Result<String> {
        let key = URL_SAFE.decode(secret.expose_secret())?;
        let mut mac = Hmac::<Sha256>::new_from_slice(&key)?;
        mac.update(payload.as_bytes());

        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }
}
