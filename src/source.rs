//! Published range list retrieval.
//!
//! The provider publishes one newline-delimited list of CIDR blocks per
//! protocol family. A failed fetch is not fatal: it is logged and yields no
//! ranges, so the family simply ends up with an empty shortlist.

use crate::error::PipelineError;
use colored::Colorize;
use std::time::Duration;

/// Fetch the range list at `url`, returning one entry per non-blank line.
///
/// Transport errors, timeouts and non-2xx statuses are logged and produce an
/// empty list. There is a single attempt, without retries.
pub async fn fetch_ranges(url: &str, timeout: Duration) -> Vec<String> {
    match try_fetch_ranges(url, timeout).await {
        Ok(lines) => {
            log::info!("Fetched {} ranges from {url}", lines.len());
            lines
        }
        Err(e) => {
            log::error!("{failed} {e}", failed = "fetch failed".on_red());
            Vec::new()
        }
    }
}

/// Fallible form of [`fetch_ranges`].
pub async fn try_fetch_ranges(url: &str, timeout: Duration) -> Result<Vec<String>, PipelineError> {
    log::debug!("GET {url}", url = url.on_blue());

    let fetch_error = |e: reqwest::Error| PipelineError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(fetch_error)?;
    let response = client.get(url).send().await.map_err(fetch_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(fetch_error)?;
    log::trace!("body.len()={} from {url}", body.len());
    Ok(split_range_lines(&body))
}

/// Split a range list body into trimmed lines, dropping blanks and `#` comments.
pub fn split_range_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{refused_url, serve_text, silent_addr};

    #[test]
    fn test_split_range_lines() {
        let body = "173.245.48.0/20\r\n\n  103.21.244.0/22  \n# comment\n104.16.0.0/13";
        assert_eq!(
            split_range_lines(body),
            vec!["173.245.48.0/20", "103.21.244.0/22", "104.16.0.0/13"]
        );
        assert!(split_range_lines("").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ranges_ok() {
        let url = serve_text("200 OK", "2400:cb00::/32\n2606:4700::/32\n").await;
        let lines = fetch_ranges(&url, Duration::from_secs(5)).await;
        assert_eq!(lines, vec!["2400:cb00::/32", "2606:4700::/32"]);
    }

    #[tokio::test]
    async fn test_fetch_ranges_bad_status_is_empty() {
        let url = serve_text("503 Service Unavailable", "try later").await;
        let err = try_fetch_ranges(&url, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Status { status: 503, .. }));
        assert!(fetch_ranges(&url, Duration::from_secs(5)).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ranges_refused_is_empty() {
        let url = refused_url().await;
        let err = try_fetch_ranges(&url, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Fetch { .. }));
        assert!(fetch_ranges(&url, Duration::from_secs(5)).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ranges_timeout_is_empty() {
        let url = format!("http://{}/ips", silent_addr().await);
        let timeout = Duration::from_millis(300);
        let err = try_fetch_ranges(&url, timeout).await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch { .. }), "got: {err}");
        assert!(fetch_ranges(&url, timeout).await.is_empty());
    }
}
