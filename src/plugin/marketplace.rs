//! Atlassian Marketplace version listing and artifact download.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_DISPOSITION;
use serde::Deserialize;

use crate::plugin::artifact::{Artifact, ArtifactSource};
use crate::plugin::http::{self, HttpError};

/// Records requested per listing page.
pub const PAGE_SIZE: usize = 50;

/// One marketplace version of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketplaceVersionRecord {
    /// Version label, e.g. `1.4.1`.
    pub name: Option<String>,
    /// Binary artifact link.
    pub download_href: Option<String>,
}

/// Paged access to a plugin's version listing.
pub trait VersionSource {
    fn fetch_page(
        &self,
        key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MarketplaceVersionRecord>, HttpError>;
}

/// Resolves (key, version) pairs to download links. Nothing is cached.
pub struct MarketplaceClient<'a> {
    source: &'a dyn VersionSource,
}

impl<'a> MarketplaceClient<'a> {
    pub fn new(source: &'a dyn VersionSource) -> Self {
        Self { source }
    }

    /// Every version record of `key`, in listing order.
    ///
    /// Paging stops at the first empty page only; a short page is followed by
    /// one more request.
    pub fn all_versions(&self, key: &str) -> Result<Vec<MarketplaceVersionRecord>, HttpError> {
        let mut versions = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.source.fetch_page(key, offset, PAGE_SIZE)?;
            if page.is_empty() {
                break;
            }
            versions.extend(page);
            offset += PAGE_SIZE;
        }
        Ok(versions)
    }

    /// Download link of the first record named exactly `version`.
    pub fn resolve_download_url(
        &self,
        key: &str,
        version: &str,
    ) -> Result<Option<String>, HttpError> {
        let versions = self.all_versions(key)?;
        Ok(versions
            .into_iter()
            .find(|record| record.name.as_deref() == Some(version))
            .and_then(|record| record.download_href))
    }
}

#[derive(Debug, Default, Deserialize)]
struct VersionsPage {
    #[serde(rename = "_embedded", default)]
    embedded: VersionsEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct VersionsEmbedded {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    name: Option<String>,
    #[serde(rename = "_embedded", default)]
    embedded: Option<VersionEmbedded>,
}

#[derive(Debug, Deserialize)]
struct VersionEmbedded {
    artifact: Option<ArtifactEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtifactEntry {
    #[serde(rename = "_links")]
    links: Option<ArtifactLinks>,
}

#[derive(Debug, Deserialize)]
struct ArtifactLinks {
    binary: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: Option<String>,
}

impl From<VersionEntry> for MarketplaceVersionRecord {
    fn from(entry: VersionEntry) -> Self {
        let download_href = entry
            .embedded
            .and_then(|embedded| embedded.artifact)
            .and_then(|artifact| artifact.links)
            .and_then(|links| links.binary)
            .and_then(|binary| binary.href);

        Self {
            name: entry.name,
            download_href,
        }
    }
}

fn parse_page(url: &str, body: &[u8]) -> Result<Vec<MarketplaceVersionRecord>, HttpError> {
    let page: VersionsPage = http::decode(url, body)?;
    Ok(page
        .embedded
        .versions
        .into_iter()
        .map(MarketplaceVersionRecord::from)
        .collect())
}

/// Blocking client for the public marketplace REST API. Unauthenticated.
pub struct MarketplaceHttp {
    http: Client,
    base_url: String,
}

impl MarketplaceHttp {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn versions_endpoint(&self, key: &str) -> String {
        format!("{}/rest/2/addons/{key}/versions/", self.base_url)
    }
}

impl VersionSource for MarketplaceHttp {
    fn fetch_page(
        &self,
        key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<MarketplaceVersionRecord>, HttpError> {
        let response = self
            .http
            .get(self.versions_endpoint(key))
            .query(&[("offset", offset), ("limit", limit)])
            .send()?;
        let response = http::ensure_success(response)?;
        let url = response.url().to_string();
        let body = response.bytes()?;
        parse_page(&url, &body)
    }
}

impl ArtifactSource for MarketplaceHttp {
    fn download(&self, url: &str) -> Result<Artifact, HttpError> {
        let response = http::ensure_success(self.http.get(url).send()?)?;
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes()?.to_vec();

        Ok(Artifact {
            bytes,
            content_disposition,
        })
    }
}
