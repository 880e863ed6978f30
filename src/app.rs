use anyhow::{Context, Result};

use crate::model::config::AppConfig;
use crate::model::credentials::Credentials;
use crate::msg::TracingObserver;
use crate::plugin::Reconciler;
use crate::plugin::http;
use crate::plugin::installer::PluginInstaller;
use crate::plugin::job::SystemClock;
use crate::plugin::manifest::Manifest;
use crate::plugin::marketplace::{MarketplaceClient, MarketplaceHttp};
use crate::plugin::reconciler::RunSummary;
use crate::plugin::upm::UpmClient;

/// One reconciliation run: settings plus the two input files.
pub struct App {
    pub config: AppConfig,
    pub manifest: Manifest,
    pub credentials: Credentials,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let manifest = Manifest::load(&config.manifest_path())?;
        let credentials = Credentials::load(&config.credentials_path())?;

        Ok(Self {
            config,
            manifest,
            credentials,
        })
    }

    pub fn run(self) -> Result<RunSummary> {
        let client = http::build_client(
            self.config.http.connect_timeout(),
            self.config.http.request_timeout(),
        )
        .context("building HTTP client")?;

        let host = UpmClient::new(client.clone(), &self.manifest.url, self.credentials);
        let marketplace = MarketplaceHttp::new(client, &self.config.marketplace.url);
        let observer = TracingObserver;
        let clock = SystemClock;

        let installer = PluginInstaller {
            host: &host,
            marketplace: MarketplaceClient::new(&marketplace),
            artifacts: &marketplace,
            clock: &clock,
            observer: &observer,
            base_url: &self.manifest.url,
        };

        tracing::info!(
            target = %self.manifest.url,
            entries = self.manifest.config.len(),
            "reconciling plugins"
        );

        let summary = Reconciler::new(&host, installer, &observer)
            .with_scratch_root(self.config.scratch_root())
            .run(&self.manifest)?;
        Ok(summary)
    }
}
