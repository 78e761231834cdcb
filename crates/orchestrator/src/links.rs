use url::form_urlencoded::byte_serialize;

pub const DEFAULT_WARP_BASE_URL: &str = "https://devnet.usewarp.to";
pub const DEFAULT_EXPLORER_URL: &str = "https://devnet-explorer.multiversx.com";
pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Builds shareable warp links, explorer links and QR image URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_url: String,
    explorer_url: String,
    qr_service_url: String,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_WARP_BASE_URL, DEFAULT_EXPLORER_URL)
    }
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>, explorer_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_slash(base_url.into()),
            explorer_url: trim_slash(explorer_url.into()),
            qr_service_url: DEFAULT_QR_SERVICE_URL.to_string(),
        }
    }

    pub fn with_qr_service(mut self, qr_service_url: impl Into<String>) -> Self {
        self.qr_service_url = qr_service_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/hash%3A<hash>`
    pub fn hash_link(&self, tx_hash: &str) -> String {
        format!("{}/hash%3A{}", self.base_url, tx_hash)
    }

    /// `<base>/<alias>`, percent-encoded
    pub fn alias_link(&self, alias: &str) -> String {
        format!("{}/{}", self.base_url, encode(alias))
    }

    pub fn explorer_link(&self, tx_hash: &str) -> String {
        format!("{}/transactions/{}", self.explorer_url, tx_hash)
    }

    /// URL of a 200x200 QR image encoding `link`
    pub fn qr_code_url(&self, link: &str) -> String {
        format!("{}?size=200x200&data={}", self.qr_service_url, encode(link))
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
