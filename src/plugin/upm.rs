//! Universal Plugin Manager access: inventory, upload and install-status endpoints.

use std::collections::HashMap;
use std::path::Path;

use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

use crate::model::credentials::Credentials;
use crate::msg::{Msg, Observer};
use crate::plugin::error::FetchFailure;
use crate::plugin::http::{self, HttpError};
use crate::plugin::job::InstallJobStatus;

const UPM_TOKEN_HEADER: &str = "upm-token";
const PLUGINS_PATH: &str = "/rest/plugins/1.0/";

/// Installed plugin versions keyed by plugin key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledState {
    versions: HashMap<String, String>,
}

impl InstalledState {
    pub fn version_of(&self, key: &str) -> Option<&str> {
        self.versions.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InstalledState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        // later duplicates overwrite earlier ones
        Self {
            versions: iter
                .into_iter()
                .map(|(key, version)| (key.into(), version.into()))
                .collect(),
        }
    }
}

/// Opaque upload authorisation issued alongside each inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One inventory snapshot and the token issued with it.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub state: InstalledState,
    pub token: Option<SessionToken>,
}

/// Reply to an artifact upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Status-check link, usually relative to the application's base URL.
    pub status_link: Option<String>,
}

/// The target application's plugin manager.
pub trait PluginHost {
    fn inventory(&self) -> Result<Inventory, FetchFailure>;

    fn upload(
        &self,
        artifact: &Path,
        token: Option<&SessionToken>,
    ) -> Result<UploadReceipt, HttpError>;

    fn install_status(&self, status_url: &Url) -> Result<InstallJobStatus, HttpError>;
}

/// Read the current inventory, treating any failure as "nothing installed".
///
/// The fallback is intentional: reconciliation keeps going and attempts every
/// install instead of halting, at the cost of masking an outage. The failure is
/// still reported to `observer`.
pub fn fetch_state(
    host: &dyn PluginHost,
    observer: &dyn Observer,
) -> (InstalledState, Option<SessionToken>) {
    match host.inventory() {
        Ok(inventory) => {
            observer.notify(Msg::InventoryRead {
                plugins: inventory.state.len(),
                has_token: inventory.token.is_some(),
            });
            (inventory.state, inventory.token)
        }
        Err(err) => {
            observer.notify(Msg::InventoryUnavailable {
                reason: err.to_string(),
            });
            (InstalledState::default(), None)
        }
    }
}

/// Resolve a status link from an upload reply against the application base URL.
pub fn resolve_status_link(base_url: &str, link: &str) -> Result<Url, url::ParseError> {
    Url::parse(base_url)?.join(link)
}

#[derive(Debug, Deserialize)]
struct PluginListing {
    #[serde(default)]
    plugins: Vec<PluginRecord>,
}

#[derive(Debug, Deserialize)]
struct PluginRecord {
    key: String,
    version: String,
}

impl PluginListing {
    fn into_state(self) -> InstalledState {
        self.plugins
            .into_iter()
            .map(|plugin| (plugin.key, plugin.version))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadReply {
    #[serde(default)]
    links: UploadLinks,
}

#[derive(Debug, Default, Deserialize)]
struct UploadLinks {
    alternate: Option<String>,
}

/// Blocking UPM REST client authenticated with basic auth.
pub struct UpmClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl UpmClient {
    pub fn new(http: Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn plugins_endpoint(&self) -> String {
        format!("{}{PLUGINS_PATH}", self.base_url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    fn read_inventory(&self) -> Result<Inventory, HttpError> {
        let response = self.authed(self.http.get(self.plugins_endpoint())).send()?;
        let token = response
            .headers()
            .get(UPM_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(SessionToken::new);
        let listing: PluginListing = http::read_json(response)?;

        Ok(Inventory {
            state: listing.into_state(),
            token,
        })
    }
}

impl PluginHost for UpmClient {
    fn inventory(&self) -> Result<Inventory, FetchFailure> {
        Ok(self.read_inventory()?)
    }

    fn upload(
        &self,
        artifact: &Path,
        token: Option<&SessionToken>,
    ) -> Result<UploadReceipt, HttpError> {
        let form = Form::new()
            .file("plugin", artifact)
            .map_err(|source| HttpError::Attach {
                path: artifact.to_path_buf(),
                source,
            })?;

        let mut request = self
            .authed(self.http.post(self.plugins_endpoint()))
            .header(ACCEPT, "application/json")
            .multipart(form);
        if let Some(token) = token {
            request = request.query(&[("token", token.as_str())]);
        }

        let reply: UploadReply = http::read_json(request.send()?)?;
        Ok(UploadReceipt {
            status_link: reply.links.alternate,
        })
    }

    fn install_status(&self, status_url: &Url) -> Result<InstallJobStatus, HttpError> {
        let response = self.authed(self.http.get(status_url.clone())).send()?;
        http::read_json(response)
    }
}
