//! Request authorization for the X API.
//!
//! The usual setup is the four OAuth 1.0a user-context secrets (`X_API_KEY`,
//! `X_API_SECRET`, `X_ACCESS_TOKEN`, `X_ACCESS_TOKEN_SECRET`); each request is
//! signed with HMAC-SHA1. An OAuth 2.0 user token is accepted as an
//! alternative and sent as a bearer token.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use itertools::Itertools;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::RequestBuilder;
use reqwest::header::AUTHORIZATION;
use sha1::Sha1;
use urlencoding::encode;

/// OAuth 1.0a consumer and access-token secrets.
#[derive(Clone)]
pub struct OAuth1Keys {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl std::fmt::Debug for OAuth1Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Keys")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

/// How requests to X are authorized.
#[derive(Debug, Clone)]
pub enum XCredentials {
    OAuth1(OAuth1Keys),
    Bearer(String),
}

impl XCredentials {
    /// Pick credentials from the configured values.
    ///
    /// All four OAuth 1.0a values win; otherwise a bearer token is used if one
    /// is set. Empty strings count as unset.
    pub fn resolve(
        api_key: Option<&str>,
        api_secret: Option<&str>,
        access_token: Option<&str>,
        access_token_secret: Option<&str>,
        bearer_token: Option<&str>,
    ) -> Option<Self> {
        let set = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        match (
            set(api_key),
            set(api_secret),
            set(access_token),
            set(access_token_secret),
        ) {
            (Some(consumer_key), Some(consumer_secret), Some(token), Some(token_secret)) => {
                Some(Self::OAuth1(OAuth1Keys {
                    consumer_key,
                    consumer_secret,
                    token,
                    token_secret,
                }))
            }
            _ => set(bearer_token).map(Self::Bearer),
        }
    }

    /// Attach the `Authorization` header for `method url` to `request`.
    pub fn authorize(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &str,
    ) -> Result<RequestBuilder, InvalidLength> {
        Ok(match self {
            Self::Bearer(token) => request.bearer_auth(token),
            Self::OAuth1(keys) => request.header(AUTHORIZATION, keys.authorization(method, url)?),
        })
    }
}

impl OAuth1Keys {
    /// `Authorization` header value for a request without query or form
    /// parameters, with a fresh nonce and timestamp.
    pub fn authorization(&self, method: &str, url: &str) -> Result<String, InvalidLength> {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = Utc::now().timestamp().to_string();
        self.authorization_with(method, url, &nonce, &timestamp)
    }

    fn authorization_with(
        &self,
        method: &str,
        url: &str,
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, InvalidLength> {
        let oauth = [
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.token.as_str()),
            ("oauth_version", "1.0"),
        ];
        let signature = signature(method, url, &oauth, &self.consumer_secret, &self.token_secret)?;
        let fields = oauth
            .iter()
            .copied()
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!(r#"{}="{}""#, encode(k), encode(v)))
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

/// HMAC-SHA1 signature over the OAuth 1.0a signature base string.
///
/// `params` holds every oauth, query and form parameter of the request; JSON
/// and multipart bodies are not signed.
pub fn signature(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, InvalidLength> {
    let normalized = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .sorted()
        .map(|(k, v)| format!("{k}={v}"))
        .join("&");
    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&normalized)
    );
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
