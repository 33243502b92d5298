//! Request signing for the Wolfram|Alpha mobile endpoint
//!
//! The mobile endpoint does not take a secret per request. Instead every
//! request carries `sig`, an MD5 over a fixed salt followed by the sorted
//! `key+value` pairs of the encoded query string. The pair extraction is a
//! naive split on `&` then `=`, and any fragment that does not split into
//! exactly two non-empty parts is silently left out of the signature. The
//! provider computes the same thing on its side, so that quirk is part of the
//! wire contract and must not be tightened here.

use md5::{Digest, Md5};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{WolframError, WolframResult};
use crate::params::Query;

/// Bytes left as-is by form encoding: alphanumerics and `_ . - ~`
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

const APPID_KEY: &str = "appid";
const INPUT_KEY: &str = "input";
const SIG_KEY: &str = "sig";

/// Provider endpoints that accept signed queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Query,
    ValidateQuery,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Query => "/v2/query.jsp",
            Endpoint::ValidateQuery => "/v2/validatequery.jsp",
        }
    }
}

/// A fully assembled, signed request
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    /// `https://host/path` without the query string
    pub base_url: String,
    /// Wire-order parameters, `sig` last
    pub params: Vec<(String, String)>,
    /// The complete URL to GET
    pub url: String,
}

impl SignedRequest {
    pub fn signature(&self) -> &str {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == SIG_KEY)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Signs queries with a fixed client identifier and salt
#[derive(Clone)]
pub struct RequestSigner {
    host: String,
    app_id: String,
    sig_salt: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("host", &self.host)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(
        host: impl Into<String>,
        app_id: impl Into<String>,
        sig_salt: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            app_id: app_id.into(),
            sig_salt: sig_salt.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(&config.host, &config.app_id, &config.sig_salt)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Sign a query for the given endpoint
    ///
    /// Wire order is `appid`, `input`, caller parameters in insertion order,
    /// then `sig`. Caller-supplied `appid` and `sig` are ignored.
    pub fn sign(&self, endpoint: Endpoint, query: &Query) -> SignedRequest {
        let mut pairs = Vec::with_capacity(query.params().len() + 3);
        pairs.push((APPID_KEY.to_string(), self.app_id.clone()));
        pairs.push((INPUT_KEY.to_string(), query.input().to_string()));
        for (key, value) in query.params().iter() {
            if key == APPID_KEY || key == SIG_KEY || key == INPUT_KEY {
                continue;
            }
            pairs.push((key.to_string(), value.to_string()));
        }

        let base_url = format!("https://{}{}", self.host, endpoint.path());
        self.finish(base_url, pairs)
    }

    /// Sign a pre-built URL whose query string may not be properly encoded
    ///
    /// Each `&`-separated fragment is split on `=` and decoded; fragments
    /// without exactly two non-empty parts are dropped before signing. A value
    /// with a literal `&` or `=` is therefore corrupted or lost.
    pub fn sign_url(&self, raw_url: &str) -> WolframResult<SignedRequest> {
        let parsed = Url::parse(raw_url)
            .map_err(|e| WolframError::InvalidInput(format!("invalid URL '{}': {}", raw_url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| WolframError::InvalidInput(format!("URL has no host: {}", raw_url)))?;
        let authority = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let base_url = format!("{}://{}{}", parsed.scheme(), authority, parsed.path());

        let mut pairs = vec![(APPID_KEY.to_string(), self.app_id.clone())];
        for (key, value) in split_pairs(parsed.query().unwrap_or_default()) {
            let key = form_decode(key);
            let value = form_decode(value);
            if key == APPID_KEY || key == SIG_KEY {
                continue;
            }
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => pairs.push((key, value)),
            }
        }

        Ok(self.finish(base_url, pairs))
    }

    /// Compute the signature for an already encoded query string
    pub fn compute_signature(&self, encoded_query: &str) -> String {
        let mut base = self.sig_salt.clone();
        for (key, value) in signature_pairs(encoded_query) {
            base.push_str(key);
            base.push_str(value);
        }
        hex::encode_upper(Md5::digest(base.as_bytes()))
    }

    fn finish(&self, base_url: String, mut pairs: Vec<(String, String)>) -> SignedRequest {
        let signature = self.compute_signature(&encode_pairs(&pairs));
        pairs.push((SIG_KEY.to_string(), signature));
        let url = format!("{}?{}", base_url, encode_pairs(&pairs));

        tracing::debug!(base_url = %base_url, params = pairs.len(), "signed request");

        SignedRequest {
            base_url,
            params: pairs,
            url,
        }
    }
}

/// Form-encode one component (space becomes `+`)
pub fn form_encode(value: &str) -> String {
    utf8_percent_encode(value, FORM_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

fn form_decode(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Encode `key=value` pairs joined by `&`
pub fn encode_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k.as_ref()), form_encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Split on `&` then `=`, keeping only fragments with exactly two non-empty parts
fn split_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query.split('&').filter_map(|fragment| {
        let mut parts = fragment.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.is_empty() && !value.is_empty() => {
                Some((key, value))
            }
            _ => None,
        }
    })
}

/// Pairs that participate in the signature, sorted by key (stable, byte-wise)
pub fn signature_pairs(encoded_query: &str) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = split_pairs(encoded_query).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
}
