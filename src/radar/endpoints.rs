//! URL endpoint constants for the BlackBerry Radar API.

/// OAuth client identifier registered for this integration. Used as both the
/// issuer and the subject of the signed assertion. Override with
/// `--client-id` / `RADAR_CLIENT_ID` when running against another tenant.
pub const DEFAULT_CLIENT_ID: &str = "74d61af0-b906-434c-b6e7-8c00acbd575e";

/// JWT-bearer grant type as registered with IANA.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Base URL for asset/label resources, without trailing slash.
    pub api_base: String,
    /// Token endpoint for the JWT-bearer grant.
    pub token: String,
    /// Issuer URL used as the assertion audience.
    pub audience: String,
}

impl Endpoints {
    pub fn production() -> Self {
        Self {
            api_base: "https://api.radar.blackberry.com/1".into(),
            token: "https://oauth2.radar.blackberry.com/1/token".into(),
            audience: "https://oauth2.radar.blackberry.com".into(),
        }
    }

    pub fn assets(&self) -> String {
        format!("{}/assets", self.api_base)
    }

    pub fn labels(&self, asset_id: &str) -> String {
        format!("{}/assets/{}/labels", self.api_base, asset_id)
    }

    pub fn label(&self, asset_id: &str, label_id: &str) -> String {
        format!("{}/assets/{}/labels/{}", self.api_base, asset_id, label_id)
    }
}
