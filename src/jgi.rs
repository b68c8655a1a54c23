use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Endpoints;
use crate::domain::TaxonOid;
use crate::error::PortalError;

pub const RESTORE_API_VERSION: &str = "2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreReceipt {
    pub status: u16,
    pub body: Value,
}

pub trait PortalClient: Send + Sync {
    /// Fetches the search document for one taxon.
    fn search(&self, taxon: &TaxonOid) -> Result<Value, PortalError>;

    /// Asks the portal to restore archived files so they can be downloaded.
    fn request_archived_files(
        &self,
        ids: &[String],
        token: &str,
        send_mail: bool,
    ) -> Result<RestoreReceipt, PortalError>;
}

#[derive(Debug, Serialize)]
struct RestoreRequest<'a> {
    ids: &'a [String],
    send_mail: bool,
    api_version: &'static str,
}

#[derive(Clone)]
pub struct JgiHttpClient {
    client: Client,
    endpoints: Endpoints,
}

impl JgiHttpClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, PortalError> {
        let mut headers = HeaderMap::new();
        // The portal rejects requests without a browser-like agent.
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!(
                "Mozilla/5.0 (compatible; jgi-fetch/{})",
                env!("CARGO_PKG_VERSION")
            ))
            .map_err(|err| PortalError::SearchHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PortalError::SearchHttp(err.to_string()))?;

        Ok(Self { client, endpoints })
    }
}

impl PortalClient for JgiHttpClient {
    fn search(&self, taxon: &TaxonOid) -> Result<Value, PortalError> {
        let response = self
            .client
            .get(&self.endpoints.search_url)
            .query(&[("q", taxon.as_str())])
            .send()
            .map_err(|err| PortalError::SearchHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "portal search failed".to_string());
            return Err(PortalError::SearchStatus { status, message });
        }
        response
            .json()
            .map_err(|err| PortalError::SearchHttp(err.to_string()))
    }

    fn request_archived_files(
        &self,
        ids: &[String],
        token: &str,
        send_mail: bool,
    ) -> Result<RestoreReceipt, PortalError> {
        let authorization = HeaderValue::from_str(token.trim())
            .map_err(|err| PortalError::RestoreHttp(err.to_string()))?;
        let body = RestoreRequest {
            ids,
            send_mail,
            api_version: RESTORE_API_VERSION,
        };
        let response = self
            .client
            .post(&self.endpoints.restore_url)
            .header(AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .map_err(|err| PortalError::RestoreHttp(err.to_string()))?;

        let status = response.status().as_u16();
        let success = response.status().is_success();
        let text = response
            .text()
            .map_err(|err| PortalError::RestoreHttp(err.to_string()))?;
        if !success {
            return Err(PortalError::RestoreStatus {
                status,
                message: text,
            });
        }
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(RestoreReceipt { status, body })
    }
}
