// Utility functions
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Classifies an error as worth retrying. Parse failures and not-found
/// outcomes are terminal; only network-level trouble is transient.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Retries an async operation with exponential backoff and a little jitter.
/// Non-transient errors return immediately; the last transient error is
/// returned once `attempts` is exhausted.
pub async fn retry<F, Fut, T, E>(attempts: u32, base_delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + Retryable,
{
    let mut delay = base_delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_transient() || attempt >= attempts => return Err(e),
            Err(e) => {
                warn!("attempt {}/{} failed: {}; retrying", attempt, attempts, e);
                let jitter = rand::rng().random_range(0..=delay.as_millis() as u64 / 4);
                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                delay *= 2;
                attempt += 1;
            }
        }
    }
}

/// Reduces a social profile URL to its last non-empty path segment, e.g.
/// "https://instagram.com/bluecafe/" -> "bluecafe". Plain handles pass through.
pub fn handle_from_url(url_or_handle: &str) -> Option<String> {
    let s = url_or_handle.trim();
    if s.is_empty() {
        return None;
    }
    if !s.starts_with("http") {
        return Some(s.to_string());
    }
    let without_scheme = s.splitn(2, "://").nth(1).unwrap_or(s);
    let path = without_scheme.splitn(2, '/').nth(1).unwrap_or("");
    path.split('/')
        .filter(|p| !p.is_empty())
        .last()
        .map(|p| p.split('?').next().unwrap_or(p).to_string())
        .filter(|p| !p.is_empty())
}
