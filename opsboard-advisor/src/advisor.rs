//! Claude Messages API client for cleanup recommendations.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use opsboard_core::error::{OpsboardError, Result};
use opsboard_core::types::DirectoryUser;

/// Default API base URL.
const DEFAULT_API_URL: &str = "https://api.anthropic.com";
/// Default model.
const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Token budget for the account analysis.
const ANALYZE_MAX_TOKENS: u32 = 2000;
/// Token budget for free-form questions.
const ASK_MAX_TOKENS: u32 = 1500;

/// Advisor configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// API key (advisory endpoints fail without one)
    pub api_key: Option<String>,
    /// API base URL
    pub api_url: String,
    /// Model to use
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout_seconds: 60,
        }
    }
}

impl AdvisorConfig {
    /// Creates a configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Returns true when the API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Result of an account analysis.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    /// Full advisory text.
    pub response: String,
    /// Lines recommending an action on a specific account.
    pub recommendations: Vec<String>,
}

/// AI advisory client.
pub struct Advisor {
    config: AdvisorConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default = "Vec::new")]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl Advisor {
    /// Creates an advisor with the given configuration.
    pub fn with_config(config: AdvisorConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Analyzes directory accounts for cleanup candidates.
    #[instrument(skip(self, users), fields(count = users.len()))]
    pub async fn analyze_users(&self, users: &[DirectoryUser]) -> Result<Analysis> {
        let mut summary = String::new();
        for user in users {
            let last_sign_in = user
                .last_sign_in
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "Never".into());
            let _ = writeln!(
                summary,
                "- {} | {} | enabled: {} | last sign-in: {} | license: {}",
                user.email,
                user.display_name,
                user.account_enabled,
                last_sign_in,
                user.license_type.as_deref().unwrap_or("none"),
            );
        }

        let prompt = format!(
            "Analyze the following directory accounts and identify which should be \
             considered for cleanup (disabling or deletion).\n\n\
             Accounts:\n{summary}\n\
             Please identify:\n\
             1. Accounts that have never signed in\n\
             2. Accounts with no sign-in for over 90 days\n\
             3. Disabled accounts that still hold licenses\n\
             4. Any other anomalies\n\n\
             Provide specific recommendations for each account that should be \
             cleaned up, including the action to take (disable or delete) and the \
             reason."
        );

        let response = self.complete(&prompt, ANALYZE_MAX_TOKENS).await?;
        let recommendations = parse_recommendations(&response);

        debug!(
            recommendations = recommendations.len(),
            "Account analysis complete"
        );

        Ok(Analysis {
            response,
            recommendations,
        })
    }

    /// Answers a free-form administrative question, optionally with context.
    #[instrument(skip(self, question, context))]
    pub async fn ask(
        &self,
        question: &str,
        context: Option<&serde_json::Value>,
    ) -> Result<String> {
        let prompt = match context {
            Some(context) => format!("Context: {context}\n\nQuestion: {question}"),
            None => question.to_string(),
        };

        self.complete(&prompt, ASK_MAX_TOKENS).await
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| OpsboardError::Config("advisor API key not configured".into()))?;

        let body = json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.config.api_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpsboardError::request("advisor", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                "advisor",
                format!("messages endpoint returned {status}: {text}"),
            ));
        }

        let message: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OpsboardError::response("advisor", e))?;

        message
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| OpsboardError::response("advisor", "response carried no content"))
    }
}

/// Extracts the lines that recommend an action on a specific account.
///
/// A recommendation line names an action (disable/delete/remove/cleanup) and
/// at least one mail address.
fn parse_recommendations(response: &str) -> Vec<String> {
    const ACTION_WORDS: [&str; 4] = ["disable", "delete", "remove", "cleanup"];

    response
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            ACTION_WORDS.iter().any(|word| lower.contains(word))
                && line.split_whitespace().any(looks_like_email)
        })
        .map(|line| line.trim().to_string())
        .collect()
}

fn looks_like_email(token: &str) -> bool {
    let token =
        token.trim_matches(|c: char| !(c.is_alphanumeric() || "@.-_".contains(c)));
    match token.split_once('@') {
        Some((local, host)) => !local.is_empty() && host.contains('.'),
        None => false,
    }
}
