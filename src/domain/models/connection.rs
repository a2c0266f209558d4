/// Region used when none is configured; MinIO ignores it but request signing needs one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Settings needed to reach the backing object store
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConnection {
    /// `host:port`, or a full URL with scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_tls: bool,
    pub region: String,
}

impl StoreConnection {
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            use_tls: false,
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Endpoint as a URL. A bare `host:port` gets its scheme from `use_tls`.
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            let scheme = if self.use_tls { "https" } else { "http" };
            format!("{}://{}", scheme, endpoint)
        }
    }

    /// Whether requests will go out over plain HTTP
    pub fn allows_http(&self) -> bool {
        self.endpoint_url().starts_with("http://")
    }
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("region", &self.region)
            .finish()
    }
}
