//! Identity directory client (Microsoft Graph).
//!
//! Acquires app-only tokens via the client-credentials flow, then queries
//! and mutates user accounts. The token is cached until shortly before it
//! expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use opsboard_core::error::{OpsboardError, Result};
use opsboard_core::traits::Provider;
use opsboard_core::types::{DirectoryUser, DomainRecord, NewUser, Record, SOURCE_DIRECTORY};

/// Default token authority.
const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
/// Default Graph endpoint.
const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";
/// Default OAuth scope for app-only Graph access.
const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// User properties requested from the directory, sign-in activity included.
const USER_SELECT: &str =
    "id,displayName,mail,userPrincipalName,accountEnabled,department,assignedLicenses,signInActivity";

/// Directory client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Tenant (directory) ID
    pub tenant_id: String,
    /// Application (client) ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Token authority base URL
    pub authority_url: String,
    /// Graph API base URL
    pub graph_url: String,
    /// OAuth scope
    pub scope: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority_url: DEFAULT_AUTHORITY_URL.into(),
            graph_url: DEFAULT_GRAPH_URL.into(),
            scope: DEFAULT_SCOPE.into(),
            timeout_seconds: 30,
        }
    }
}

impl DirectoryConfig {
    /// Creates a configuration with the given tenant credentials.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Default::default()
        }
    }

    /// Returns true when all required credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.tenant_id.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Cached bearer token.
struct CachedToken {
    access_token: String,
    acquired_at: Instant,
    expires_in: u64,
}

impl CachedToken {
    /// Stale one minute early so in-flight requests never carry a token that
    /// expires mid-call.
    fn is_stale(&self) -> bool {
        self.acquired_at.elapsed() >= Duration::from_secs(self.expires_in.saturating_sub(60))
    }
}

/// Identity directory client.
pub struct GraphDirectory {
    config: DirectoryConfig,
    http_client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct GraphPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Deserialize)]
struct GraphUser {
    id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    mail: Option<String>,
    #[serde(rename = "userPrincipalName")]
    user_principal_name: Option<String>,
    #[serde(rename = "accountEnabled")]
    account_enabled: Option<bool>,
    department: Option<String>,
    #[serde(rename = "assignedLicenses", default)]
    assigned_licenses: Vec<serde_json::Value>,
    #[serde(rename = "signInActivity")]
    sign_in_activity: Option<SignInActivity>,
}

#[derive(Deserialize)]
struct SignInActivity {
    #[serde(rename = "lastSignInDateTime")]
    last_sign_in_date_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
struct GraphDomain {
    id: String,
    #[serde(rename = "isVerified", default)]
    is_verified: bool,
}

impl GraphUser {
    fn into_user(self) -> DirectoryUser {
        let email = self
            .mail
            .or(self.user_principal_name)
            .unwrap_or_default();
        let domain = email
            .split_once('@')
            .map(|(_, d)| d.to_string())
            .unwrap_or_default();

        // Any assigned license reports as the standard tier; the directory
        // does not expose SKU names in the $select projection.
        let license_type = if self.assigned_licenses.is_empty() {
            None
        } else {
            Some("Business Standard".to_string())
        };

        DirectoryUser {
            id: self.id,
            email,
            display_name: self.display_name.unwrap_or_default(),
            domain,
            last_sign_in: self.sign_in_activity.and_then(|a| a.last_sign_in_date_time),
            account_enabled: self.account_enabled.unwrap_or(false),
            license_type,
            department: self.department,
            manager: None, // requires a per-user expansion call
        }
    }
}

impl GraphDirectory {
    /// Creates a directory client with the given configuration.
    pub fn with_config(config: DirectoryConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
            token: RwLock::new(None),
        }
    }

    /// Returns true when the directory credentials are present.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Returns a valid bearer token, acquiring a fresh one when the cached
    /// token is absent or stale.
    async fn access_token(&self) -> Result<String> {
        if !self.config.is_configured() {
            return Err(OpsboardError::Config(
                "directory credentials are not configured".into(),
            ));
        }

        if let Some(token) = self.token.read().as_ref() {
            if !token.is_stale() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.config.authority_url, self.config.tenant_id
        );
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http_client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIRECTORY, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::auth(
                SOURCE_DIRECTORY,
                format!("token endpoint returned {status}: {text}"),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OpsboardError::response(SOURCE_DIRECTORY, e))?;

        debug!(expires_in = token.expires_in, "Acquired directory token");

        let access_token = token.access_token.clone();
        *self.token.write() = Some(CachedToken {
            access_token: token.access_token,
            acquired_at: Instant::now(),
            expires_in: token.expires_in,
        });

        Ok(access_token)
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIRECTORY, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                SOURCE_DIRECTORY,
                format!("{url} returned {status}: {text}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| OpsboardError::response(SOURCE_DIRECTORY, e))
    }

    /// Lists user accounts, optionally filtered by mail domain.
    ///
    /// Follows `@odata.nextLink` pagination until the directory is
    /// exhausted. The domain filter is applied client-side so its semantics
    /// match the aggregator's.
    #[instrument(skip(self))]
    pub async fn get_users(&self, domain: Option<&str>) -> Result<Vec<DirectoryUser>> {
        let token = self.access_token().await?;

        let mut url = format!("{}/users?$select={}", self.config.graph_url, USER_SELECT);
        let mut users = Vec::new();

        loop {
            let page: GraphPage<GraphUser> = self.get_page(&url, &token).await?;

            for raw in page.value {
                let user = raw.into_user();
                if let Some(wanted) = domain {
                    if user.domain != wanted {
                        continue;
                    }
                }
                users.push(user);
            }

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = users.len(), "Listed directory users");
        Ok(users)
    }

    /// Lists verified domains.
    #[instrument(skip(self))]
    pub async fn get_domains(&self) -> Result<Vec<DomainRecord>> {
        let token = self.access_token().await?;

        let url = format!("{}/domains", self.config.graph_url);
        let page: GraphPage<GraphDomain> = self.get_page(&url, &token).await?;

        let domains: Vec<DomainRecord> = page
            .value
            .into_iter()
            .filter(|d| d.is_verified)
            .map(|d| DomainRecord {
                name: d.id.clone(),
                id: d.id,
                is_verified: true,
            })
            .collect();

        debug!(count = domains.len(), "Listed verified domains");
        Ok(domains)
    }

    /// Creates a user account with a generated temporary password that must
    /// be changed at first sign-in.
    #[instrument(skip(self, request), fields(username = %request.username, domain = %request.domain))]
    pub async fn create_user(&self, request: &NewUser) -> Result<DirectoryUser> {
        if request.username.trim().is_empty() || request.username.contains('@') {
            return Err(OpsboardError::Validation(
                "username must be a non-empty mailbox local part".into(),
            ));
        }
        if request.domain.trim().is_empty() {
            return Err(OpsboardError::Validation("domain must not be empty".into()));
        }

        let token = self.access_token().await?;
        let principal = format!("{}@{}", request.username, request.domain);

        let (given_name, surname) = match request.full_name.trim().split_once(' ') {
            Some((given, rest)) => (given.to_string(), rest.to_string()),
            None => (request.full_name.trim().to_string(), String::new()),
        };

        let mut body = json!({
            "accountEnabled": true,
            "displayName": request.full_name,
            "mailNickname": request.username,
            "userPrincipalName": principal,
            "givenName": given_name,
            "surname": surname,
            "passwordProfile": {
                "forceChangePasswordNextSignIn": true,
                "password": generate_temp_password(),
            },
        });
        if let Some(department) = &request.department {
            body["department"] = json!(department);
        }

        let response = self
            .http_client
            .post(format!("{}/users", self.config.graph_url))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIRECTORY, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                SOURCE_DIRECTORY,
                format!("user creation returned {status}: {text}"),
            ));
        }

        #[derive(Deserialize)]
        struct CreatedUser {
            id: String,
            #[serde(rename = "userPrincipalName")]
            user_principal_name: Option<String>,
            #[serde(rename = "displayName")]
            display_name: Option<String>,
        }

        let created: CreatedUser = response
            .json()
            .await
            .map_err(|e| OpsboardError::response(SOURCE_DIRECTORY, e))?;

        info!(id = %created.id, principal = %principal, "Created directory user");

        // TODO: assign the requested license via /users/{id}/assignLicense;
        // the tier is recorded as requested until then.
        Ok(DirectoryUser {
            id: created.id,
            email: created.user_principal_name.unwrap_or(principal),
            display_name: created.display_name.unwrap_or_else(|| request.full_name.clone()),
            domain: request.domain.clone(),
            last_sign_in: None,
            account_enabled: true,
            license_type: Some(request.license_type.clone()),
            department: request.department.clone(),
            manager: request.manager_email.clone(),
        })
    }

    /// Disables a user account.
    #[instrument(skip(self))]
    pub async fn disable_user(&self, user_id: &str) -> Result<()> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .patch(format!("{}/users/{}", self.config.graph_url, user_id))
            .bearer_auth(&token)
            .json(&json!({ "accountEnabled": false }))
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIRECTORY, e))?;

        self.check_mutation_status(response, user_id).await?;
        info!(user_id, "Disabled directory user");
        Ok(())
    }

    /// Permanently deletes a user account.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .delete(format!("{}/users/{}", self.config.graph_url, user_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| OpsboardError::request(SOURCE_DIRECTORY, e))?;

        self.check_mutation_status(response, user_id).await?;
        info!(user_id, "Deleted directory user");
        Ok(())
    }

    async fn check_mutation_status(&self, response: reqwest::Response, user_id: &str) -> Result<()> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(OpsboardError::UserNotFound(user_id.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpsboardError::request(
                SOURCE_DIRECTORY,
                format!("mutation returned {status}: {text}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for GraphDirectory {
    fn name(&self) -> &'static str {
        SOURCE_DIRECTORY
    }

    async fn fetch(&self, domain: Option<&str>) -> Result<Vec<Record>> {
        let users = self.get_users(domain).await?;
        Ok(users.into_iter().map(Record::from).collect())
    }
}

/// Generates a 16-character temporary password.
///
/// The directory rejects passwords missing a character class, so the tail is
/// patched to guarantee an uppercase letter, a lowercase letter, and a digit.
fn generate_temp_password() -> String {
    use rand::Rng;

    const ALPHABET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const DIGITS: &[u8] = b"0123456789";

    let mut rng = rand::thread_rng();
    let mut password: Vec<u8> = (0..16)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect();

    let len = password.len();
    if !password.iter().any(|b| b.is_ascii_uppercase()) {
        password[len - 1] = UPPER[rng.gen_range(0..UPPER.len())];
    }
    if !password.iter().any(|b| b.is_ascii_lowercase()) {
        password[len - 2] = LOWER[rng.gen_range(0..LOWER.len())];
    }
    if !password.iter().any(|b| b.is_ascii_digit()) {
        password[len - 3] = DIGITS[rng.gen_range(0..DIGITS.len())];
    }

    password.iter().map(|&b| b as char).collect()
}
