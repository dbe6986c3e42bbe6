use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::MapConfig;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("kakao api key is not configured")]
    MissingKey,

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// One address candidate returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressInfo {
    pub address: String,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Deserialize)]
struct KeywordSearchResponse {
    #[serde(default)]
    documents: Vec<KeywordDocument>,
}

#[derive(Debug, Deserialize)]
struct KeywordDocument {
    #[serde(default)]
    road_address_name: String,
    #[serde(default)]
    place_name: String,
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
}

/// Client for the Kakao local keyword search API
#[derive(Clone)]
pub struct KakaoMapClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl KakaoMapClient {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.kakao_api_key.clone(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<AddressInfo>, MapError> {
        if self.api_key.is_empty() {
            return Err(MapError::MissingKey);
        }

        let response: KeywordSearchResponse = self
            .http
            .get(format!("{}/v2/local/search/keyword.json", self.base_url))
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[("query", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("Kakao search for {:?} returned {} documents", query, response.documents.len());
        Ok(into_addresses(response))
    }
}

/// Keep only documents with a road address
fn into_addresses(response: KeywordSearchResponse) -> Vec<AddressInfo> {
    response
        .documents
        .into_iter()
        .filter(|doc| !doc.road_address_name.is_empty())
        .map(|doc| AddressInfo {
            address: format!("{} {}", doc.road_address_name, doc.place_name),
            x: doc.x,
            y: doc.y,
        })
        .collect()
}
