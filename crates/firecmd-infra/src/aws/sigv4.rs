//! AWS Signature Version 4 request signing.
//!
//! Only what the managed services here need: header-based signing of a
//! request with a fully buffered body.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::credentials::AwsCredentials;
use super::AwsRequestError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The parts of a request covered by the signature.
pub struct SigningInput<'a> {
    pub method: &'a str,
    pub url: &'a Url,
    /// Extra headers to sign, e.g. `content-type`.
    pub headers: &'a [(&'a str, &'a str)],
    pub body: &'a [u8],
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AwsRequestError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| AwsRequestError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the signing key for one day, region and service.
pub fn signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, AwsRequestError> {
    let k_date = hmac_sha256(format!("AWS4{secret_access_key}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Path with every segment URI-encoded, as received. An already encoded
/// segment is encoded again.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (urlencoding::encode(&k).into_owned(), urlencoding::encode(&v).into_owned()))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn host_header(url: &Url) -> Result<String, AwsRequestError> {
    let host = url
        .host_str()
        .ok_or_else(|| AwsRequestError::InvalidUrl(format!("no host in {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Sign a request. Returns the headers to add: `x-amz-date`, the session
/// token when present, and `authorization`.
pub fn sign(
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    input: &SigningInput<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<(String, String)>, AwsRequestError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    headers.insert("host".to_string(), host_header(input.url)?);
    headers.insert("x-amz-date".to_string(), amz_date.clone());
    if let Some(token) = credentials.session_token() {
        headers.insert("x-amz-security-token".to_string(), token.to_string());
    }
    for (name, value) in input.headers {
        headers.insert(name.to_lowercase(), value.trim().to_string());
    }

    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String = headers.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
    let payload_hash = hex::encode(Sha256::digest(input.body));

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        input.method,
        canonical_uri(input.url),
        canonical_query(input.url),
        canonical_headers,
        signed_headers,
        payload_hash
    );

    let scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(credentials.secret_access_key(), &date, region, service)?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let mut out = vec![("x-amz-date".to_string(), amz_date)];
    if let Some(token) = credentials.session_token() {
        out.push(("x-amz-security-token".to_string(), token.to_string()));
    }
    out.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id()
        ),
    ));
    Ok(out)
}
