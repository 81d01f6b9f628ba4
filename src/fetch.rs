use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use ureq::ResponseExt;

use crate::config::Config;
use crate::error::Result;

/// Content fetched from a page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Final URL after redirects
    pub url: String,
    /// Raw response body
    pub body: String,
}

/// Retrieves a target resource
///
/// The scheduler only talks to this trait, so checks can run against
/// anything that produces a page body.
pub trait Fetcher {
    fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<PageContent>;
}

/// Fetch over HTTP using a pooled ureq agent
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, user_agent: user_agent.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.request_timeout_secs), config.user_agent.clone())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, headers: &HashMap<String, String>) -> Result<PageContent> {
        let mut request = self.agent.get(url).header("User-Agent", &self.user_agent);

        // Custom headers win over the default User-Agent
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.call()?;
        let status = response.status().as_u16();
        let final_url = response.get_uri().to_string();
        let body = response.into_body().read_to_string()?;
        debug!(url = %final_url, status, bytes = body.len(), "fetched page");

        Ok(PageContent { url: final_url, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_uses_user_agent() {
        let mut config = Config::default();
        config.user_agent = "probe/1.0".into();
        let fetcher = HttpFetcher::from_config(&config);
        assert_eq!(fetcher.user_agent, "probe/1.0");
    }

    #[test]
    fn test_unreachable_host_is_an_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2), "test");
        // Port 9 on localhost (discard) is closed in test environments
        let result = fetcher.fetch("http://127.0.0.1:9/", &HashMap::new());
        assert!(result.is_err());
    }
}
