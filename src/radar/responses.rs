//! Serde models for the subset of Radar API payloads this job consumes.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// One entry of `GET /assets`. Assets are read-only from this system's
/// perspective; only the stable id and the human-meaningful identifier
/// (equipment number) are used.
#[derive(Debug, Deserialize)]
pub struct Asset {
    pub id: String,
    pub identifier: String,
}

/// `GET /assets/{id}/labels` response page.
#[derive(Debug, Deserialize)]
pub struct LabelPage {
    pub items: Vec<LabelItem>,
}

#[derive(Debug, Deserialize)]
pub struct LabelItem {
    pub id: String,
    pub name: String,
}
