//! Signed screenshot URLs
//!
//! The rendering service authenticates requests with an MD5 token over the
//! shared secret and the query string. The token is a capability, not a
//! security boundary.

use crate::config::ScreenshotConfig;

use super::error::PipelineError;

#[derive(Debug, Clone)]
pub struct ScreenshotSigner {
    config: ScreenshotConfig,
}

impl ScreenshotSigner {
    pub fn new(config: ScreenshotConfig) -> Self {
        Self { config }
    }

    /// `url={target}&delay={delay}`, with the target embedded verbatim
    pub fn query_string(&self, target: &str) -> String {
        format!("url={}&delay={}", target, self.config.delay_secs)
    }

    /// `{api_url}{api_key}/{md5(secret ‖ query)}/image?{query}`
    pub fn sign(&self, target: &str) -> Result<String, PipelineError> {
        self.check_config()?;

        if target.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "Screenshot target URL is required".to_string(),
            ));
        }

        let query = self.query_string(target);
        let hash = format!("{:x}", md5::compute(format!("{}{}", self.config.secret, query)));

        Ok(format!(
            "{}{}/{}/image?{}",
            self.config.api_url, self.config.api_key, hash, query
        ))
    }

    fn check_config(&self) -> Result<(), PipelineError> {
        let missing = [
            ("TECHULUS_API_URL", &self.config.api_url),
            ("TECHULUS_API_KEY", &self.config.api_key),
            ("TECHULUS_SECRET", &self.config.secret),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((name, _)) => Err(PipelineError::Config(format!("{} is not configured", name))),
            None => Ok(()),
        }
    }
}
