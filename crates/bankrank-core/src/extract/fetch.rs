use std::time::Duration;

use crate::error::{EtlError, EtlResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Issues the single bounded-timeout GET for the source page. No retries:
/// a transport failure or non-2xx status aborts the run.
pub(crate) fn fetch_page(url: &str, timeout: Duration) -> EtlResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|error| EtlError::network(format!("HTTP client setup failed: {error}")))?;

    let response = client
        .get(url)
        .send()
        .map_err(|error| EtlError::network(format!("GET {url} failed: {error}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::network(format!("GET {url} returned HTTP {status}")));
    }

    response
        .text()
        .map_err(|error| EtlError::network(format!("reading body of {url} failed: {error}")))
}
