//! Response status handling shared by registry requests.

use crate::error::EnrichError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Return the response unchanged on success.
///
/// 429 maps to [`EnrichError::RateLimited`] (with the `Retry-After` seconds,
/// 60 when absent), any other non-success status to [`EnrichError::Api`].
/// 404 is left to the caller, which reads it as "no entry".
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, EnrichError> {
    if resp.status() == 429 {
        return Err(EnrichError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        return Err(EnrichError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
pub(crate) fn mock_response(status: u16, retry_after: Option<&str>, body: &str) -> reqwest::Response {
    let mut builder = ::http::Response::builder().status(status);
    if let Some(value) = retry_after {
        builder = builder.header("Retry-After", value);
    }
    reqwest::Response::from(builder.body(body.to_string()).unwrap())
}
