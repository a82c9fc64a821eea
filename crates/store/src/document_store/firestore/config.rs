use std::time::Duration;

/// Production Firestore REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Connection settings for a Firestore collection.
///
/// Credentials are optional: a web API key (sent as the `key` query
/// parameter), an OAuth bearer token, or neither (emulator / open rules).
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub timeout: Duration,
    /// Documents requested per list page.
    pub page_size: u32,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: "(default)".to_string(),
            collection: collection.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
            timeout: Duration::from_secs(10),
            page_size: 300,
        }
    }

    /// Point at a local emulator (`host:port`). The emulator accepts the
    /// `owner` token and bypasses security rules with it.
    pub fn with_emulator(mut self, host: &str) -> Self {
        self.base_url = format!("http://{}/v1", host.trim_end_matches('/'));
        self.bearer_token = Some("owner".to_string());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{base}/projects/{project}/databases/{database}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }
}
