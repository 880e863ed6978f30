use std::path::Path;

use crate::msg::{Msg, Observer};
use crate::plugin::artifact::{self, ArtifactSource};
use crate::plugin::error::InstallError;
use crate::plugin::job::{self, Clock};
use crate::plugin::manifest::TargetEntry;
use crate::plugin::marketplace::MarketplaceClient;
use crate::plugin::upm::{self, PluginHost, SessionToken};

/// Downloads one plugin version, uploads it, and waits for the install job.
pub struct PluginInstaller<'a> {
    pub host: &'a dyn PluginHost,
    pub marketplace: MarketplaceClient<'a>,
    pub artifacts: &'a dyn ArtifactSource,
    pub clock: &'a dyn Clock,
    pub observer: &'a dyn Observer,
    /// Base URL of the target application; status links resolve against it.
    pub base_url: &'a str,
}

impl PluginInstaller<'_> {
    pub fn install(
        &self,
        entry: &TargetEntry,
        token: Option<&SessionToken>,
        scratch: &Path,
    ) -> Result<(), InstallError> {
        let key = entry.key.as_str();
        self.observer.notify(Msg::InstallStarted {
            key: key.to_string(),
            version: entry.version.clone(),
        });

        self.observer.notify(Msg::ResolvingDownload { key: key.to_string() });
        let download_url = self
            .marketplace
            .resolve_download_url(key, &entry.version)
            .map_err(|source| InstallError::Marketplace {
                key: key.to_string(),
                source,
            })?
            .ok_or_else(|| InstallError::AddonNotFound {
                key: key.to_string(),
                version: entry.version.clone(),
            })?;

        self.observer.notify(Msg::Downloading {
            url: download_url.clone(),
        });
        let downloaded = self
            .artifacts
            .download(&download_url)
            .map_err(|source| InstallError::Download {
                url: download_url.clone(),
                source,
            })?;
        let path = artifact::save(&downloaded, &download_url, scratch)?;
        self.observer.notify(Msg::ArtifactSaved { path: path.clone() });

        self.observer.notify(Msg::Uploading { key: key.to_string() });
        let receipt = self
            .host
            .upload(&path, token)
            .map_err(|source| InstallError::Upload {
                key: key.to_string(),
                source,
            })?;

        let link = receipt
            .status_link
            .ok_or_else(|| InstallError::MissingStatusLink { key: key.to_string() })?;
        let status_url = upm::resolve_status_link(self.base_url, &link)
            .map_err(|source| InstallError::StatusLink { link, source })?;

        job::wait_for_completion(self.host, self.clock, self.observer, &status_url).map_err(
            |source| InstallError::StatusPoll {
                key: key.to_string(),
                source,
            },
        )?;

        self.observer.notify(Msg::Installed { key: key.to_string() });
        Ok(())
    }
}
