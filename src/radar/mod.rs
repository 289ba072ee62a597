//! Token-scoped client for the BlackBerry Radar asset/label API.
//!
//! Every call follows the same shape: issue the request with the current
//! bearer token; on 401/403 refresh a token of the scope appropriate to the
//! operation and retry exactly once; on any other failure log the full
//! exchange and absorb the error so the run can continue with the next
//! asset or label.

pub mod assertion;
pub mod endpoints;
pub mod error;
pub mod responses;
pub mod transport;

use std::collections::HashMap;
use std::path::Path;

use serde_json::json;

use self::assertion::{AssertionSigner, Es256Signer};
use self::endpoints::{Endpoints, JWT_BEARER_GRANT};
use self::error::RadarError;
use self::responses::{Asset, LabelPage, TokenResponse};
use self::transport::{
    describe_exchange, ApiRequest, FixtureTransport, HttpTransport, Method, Transport,
};
use crate::types::TestLevel;

/// Access-token scope. Reads and writes use independently scoped tokens so a
/// read-only test level never holds a credential that could mutate anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Read,
    Write,
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Read => "read",
            Scope::Write => "write",
        }
    }
}

pub struct RadarClient {
    live: Box<dyn Transport>,
    canned: Box<dyn Transport>,
    signer: Option<Box<dyn AssertionSigner>>,
    endpoints: Endpoints,
    can_read: bool,
    can_write: bool,
    /// Current bearer token; replaced on demand by the retry path. Never
    /// persisted across runs.
    token: Option<String>,
}

impl RadarClient {
    /// Build a production client. Parses the private key up front so an
    /// unusable key aborts the run before any network call; `full-test`
    /// needs no key since it never leaves the fixture transport.
    pub fn new(
        key_path: &Path,
        client_id: &str,
        test_level: TestLevel,
    ) -> Result<Self, RadarError> {
        let endpoints = Endpoints::production();
        let signer: Option<Box<dyn AssertionSigner>> =
            if test_level.can_read() || test_level.can_write() {
                Some(Box::new(Es256Signer::from_pem_file(
                    key_path,
                    client_id,
                    &endpoints.audience,
                )?))
            } else {
                None
            };
        Ok(Self::with_transports(
            Box::new(HttpTransport::new()?),
            Box::new(FixtureTransport),
            signer,
            endpoints,
            test_level.can_read(),
            test_level.can_write(),
        ))
    }

    pub(crate) fn with_transports(
        live: Box<dyn Transport>,
        canned: Box<dyn Transport>,
        signer: Option<Box<dyn AssertionSigner>>,
        endpoints: Endpoints,
        can_read: bool,
        can_write: bool,
    ) -> Self {
        Self {
            live,
            canned,
            signer,
            endpoints,
            can_read,
            can_write,
            token: None,
        }
    }

    pub fn can_write(&self) -> bool {
        self.can_write
    }

    fn allows(&self, scope: Scope) -> bool {
        match scope {
            Scope::Read => self.can_read,
            Scope::Write => self.can_write,
        }
    }

    fn transport_for(&self, scope: Scope) -> &dyn Transport {
        if self.allows(scope) {
            self.live.as_ref()
        } else {
            self.canned.as_ref()
        }
    }

    /// Request a bearer token for `scope` via the JWT-bearer grant.
    ///
    /// Returns `None` when the endpoint refuses the grant; subsequent calls
    /// then go out without a token and report their own auth failure.
    pub async fn request_token(&self, scope: Scope) -> Result<Option<String>, RadarError> {
        tracing::debug!(scope = scope.as_str(), "Generating a new access token");

        let request = if self.allows(scope) {
            let signer = self.signer.as_ref().ok_or(RadarError::MissingSigner)?;
            let assertion = signer.sign()?;
            ApiRequest {
                method: Method::Post,
                url: self.endpoints.token.clone(),
                bearer: None,
                body: Some(json!({
                    "grant_type": JWT_BEARER_GRANT,
                    "assertion": assertion,
                    "scope": format!("modules:read assets:{}", scope.as_str()),
                })),
            }
        } else {
            tracing::info!(
                scope = scope.as_str(),
                "Scope disabled by test level, using canned token response"
            );
            ApiRequest {
                method: Method::Post,
                url: self.endpoints.token.clone(),
                bearer: None,
                body: None,
            }
        };

        let response = self.transport_for(scope).execute(&request).await?;
        if response.status == 200 {
            let token: TokenResponse = serde_json::from_str(&response.body)?;
            tracing::debug!(
                "Access token successfully generated:\n{}",
                describe_exchange(&request, &response)
            );
            Ok(Some(token.access_token))
        } else {
            tracing::error!(
                "Unable to generate access token:\n{}",
                describe_exchange(&request, &response)
            );
            Ok(None)
        }
    }

    async fn refresh_token(&mut self, scope: Scope) -> Result<(), RadarError> {
        self.token = self.request_token(scope).await?;
        Ok(())
    }

    /// `GET /assets` → map of asset id to asset identifier (equipment
    /// number). Any failure after the single auth retry yields an empty map.
    pub async fn list_assets(&mut self) -> Result<HashMap<String, String>, RadarError> {
        tracing::debug!("Retrieving assets");
        let mut retried = false;
        loop {
            let request = ApiRequest {
                method: Method::Get,
                url: self.endpoints.assets(),
                bearer: self.token.clone(),
                body: None,
            };
            let response = self.transport_for(Scope::Read).execute(&request).await?;
            match response.status {
                200 => {
                    let assets: Vec<Asset> = serde_json::from_str(&response.body)?;
                    tracing::debug!(
                        "Assets retrieved successfully:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(assets
                        .into_iter()
                        .map(|a| (a.id, a.identifier))
                        .collect());
                }
                401 | 403 if !retried => {
                    tracing::debug!(
                        status = response.status,
                        "Auth failure retrieving assets, refreshing read token"
                    );
                    self.refresh_token(Scope::Read).await?;
                    retried = true;
                }
                _ => {
                    tracing::error!(
                        "Failed to retrieve assets:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(HashMap::new());
                }
            }
        }
    }

    /// `GET /assets/{id}/labels` → map of label name to label id.
    pub async fn list_labels(
        &mut self,
        asset_id: &str,
    ) -> Result<HashMap<String, String>, RadarError> {
        tracing::debug!(asset_id, "Retrieving asset labels");
        let mut retried = false;
        loop {
            let request = ApiRequest {
                method: Method::Get,
                url: self.endpoints.labels(asset_id),
                bearer: self.token.clone(),
                body: None,
            };
            let response = self.transport_for(Scope::Read).execute(&request).await?;
            match response.status {
                200 => {
                    let page: LabelPage = serde_json::from_str(&response.body)?;
                    tracing::debug!(
                        "Asset labels retrieved successfully:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(page
                        .items
                        .into_iter()
                        .map(|item| (item.name, item.id))
                        .collect());
                }
                401 | 403 if !retried => {
                    tracing::debug!(
                        status = response.status,
                        "Auth failure retrieving labels, refreshing read token"
                    );
                    self.refresh_token(Scope::Read).await?;
                    retried = true;
                }
                _ => {
                    tracing::error!(
                        "Failed to retrieve asset labels:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(HashMap::new());
                }
            }
        }
    }

    /// `POST /assets/{id}/labels`. A 409 means the label already exists on
    /// the asset; that is a quiet no-op, not an error.
    pub async fn add_label(
        &mut self,
        asset_id: &str,
        label: &str,
    ) -> Result<bool, RadarError> {
        tracing::debug!(asset_id, label, "Adding label");
        let mut retried = false;
        loop {
            let request = ApiRequest {
                method: Method::Post,
                url: self.endpoints.labels(asset_id),
                bearer: self.token.clone(),
                body: Some(json!({ "name": label })),
            };
            let response = self.transport_for(Scope::Write).execute(&request).await?;
            match response.status {
                201 => {
                    tracing::debug!(
                        "Label added successfully:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(true);
                }
                409 => {
                    tracing::debug!(asset_id, label, "Label already exists");
                    return Ok(false);
                }
                401 | 403 if !retried => {
                    tracing::debug!(
                        status = response.status,
                        "Auth failure adding label, refreshing write token"
                    );
                    self.refresh_token(Scope::Write).await?;
                    retried = true;
                }
                _ => {
                    tracing::error!(
                        "Failed to create label:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(false);
                }
            }
        }
    }

    /// `DELETE /assets/{id}/labels/{label_id}`.
    pub async fn delete_label(
        &mut self,
        asset_id: &str,
        label_id: &str,
    ) -> Result<bool, RadarError> {
        tracing::debug!(asset_id, label_id, "Deleting label");
        let mut retried = false;
        loop {
            let request = ApiRequest {
                method: Method::Delete,
                url: self.endpoints.label(asset_id, label_id),
                bearer: self.token.clone(),
                body: None,
            };
            let response = self.transport_for(Scope::Write).execute(&request).await?;
            match response.status {
                204 => {
                    tracing::debug!(
                        "Label deleted successfully:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(true);
                }
                401 | 403 if !retried => {
                    tracing::debug!(
                        status = response.status,
                        "Auth failure deleting label, refreshing write token"
                    );
                    self.refresh_token(Scope::Write).await?;
                    retried = true;
                }
                _ => {
                    tracing::error!(
                        "Failed to delete label:\n{}",
                        describe_exchange(&request, &response)
                    );
                    return Ok(false);
                }
            }
        }
    }
}
