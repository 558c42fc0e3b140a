//! HTTP fetch of the source page.

use std::time::Duration;

use crate::error::ScraperError;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

/// Build the client used for page fetches. `timeout_secs` bounds the whole
/// request including the body read.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the TLS backend cannot be initialised.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ScraperError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch the page body at `url`. One attempt, no retry.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] on network failure or timeout, and
/// [`ScraperError::UnexpectedStatus`] for any non-2xx response.
pub async fn fetch_html(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
) -> Result<String, ScraperError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT, ACCEPT_HTML)
        .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    tracing::debug!(url, bytes = body.len(), "fetched source page");
    Ok(body)
}
