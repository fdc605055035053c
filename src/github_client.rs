use crate::config::Config;
use crate::error::{LeaderboardError, Result};
use crate::pagination::PageSource;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Clone)]
pub struct GithubClient {
    client: Arc<reqwest::Client>,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("contributor-leaderboard"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| LeaderboardError::Config("token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let base_url = config.api_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| LeaderboardError::Transport {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
            retries: config.retries,
            retry_delay: config.retry_delay,
        })
    }

    async fn get_once(&self, url: &str, page: u32, per_page: usize) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(&[("per_page", per_page.to_string()), ("page", page.to_string())])
            .send()
            .await
            .map_err(|source| LeaderboardError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if let Some(remaining) = header_str(&response, RATE_LIMIT_REMAINING) {
            debug!(url, page, remaining, "rate limit budget");
        }

        // GitHub answers 204 for the contributors of an empty repository.
        if status == StatusCode::NO_CONTENT {
            return Ok("[]".to_string());
        }

        if !status.is_success() {
            if is_rate_limited(&response) {
                warn!(url, "rate limit exhausted, a token raises the request quota");
            }
            return Err(LeaderboardError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|source| LeaderboardError::Transport {
                url: url.to_string(),
                source,
            })
    }
}

impl PageSource for GithubClient {
    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn fetch_page(&self, path: &str, page: u32, per_page: usize) -> Result<String> {
        let url = self.url_for(path);
        let mut attempt = 0;
        loop {
            match self.get_once(&url, page, per_page).await {
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    warn!(url = %url, page, attempt, error = %e, "retrying request");
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn is_rate_limited(response: &Response) -> bool {
    matches!(
        response.status(),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) && header_str(response, RATE_LIMIT_REMAINING) == Some("0")
}
