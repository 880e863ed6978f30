use std::path::PathBuf;

use tempfile::TempDir;

use crate::msg::{Msg, Observer};
use crate::plugin::error::InstallError;
use crate::plugin::installer::PluginInstaller;
use crate::plugin::manifest::{Manifest, TargetEntry};
use crate::plugin::upm::{self, InstalledState, PluginHost};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub installed: usize,
}

/// Drives the target application towards a [`Manifest`], one entry at a time.
pub struct Reconciler<'a> {
    host: &'a dyn PluginHost,
    installer: PluginInstaller<'a>,
    observer: &'a dyn Observer,
    scratch_root: Option<PathBuf>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        host: &'a dyn PluginHost,
        installer: PluginInstaller<'a>,
        observer: &'a dyn Observer,
    ) -> Self {
        Self {
            host,
            installer,
            observer,
            scratch_root: None,
        }
    }

    /// Create the run's scratch directory under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Reconcile every entry in manifest order. The first failure aborts the run.
    pub fn run(&self, manifest: &Manifest) -> Result<RunSummary, InstallError> {
        // Removed when dropped, whichever way this function returns.
        let scratch = self.scratch_dir()?;
        let mut summary = RunSummary::default();

        for entry in &manifest.config {
            let (state, token) = upm::fetch_state(self.host, self.observer);
            summary.checked += 1;

            self.observer.notify(Msg::CheckingPlugin {
                key: entry.key.clone(),
            });
            if !needs_install(&state, entry) {
                self.observer.notify(Msg::AlreadySatisfied {
                    key: entry.key.clone(),
                    version: entry.version.clone(),
                });
                continue;
            }

            self.installer.install(entry, token.as_ref(), scratch.path())?;
            summary.installed += 1;
        }

        self.observer.notify(Msg::RunFinished {
            checked: summary.checked,
            installed: summary.installed,
        });
        Ok(summary)
    }

    fn scratch_dir(&self) -> Result<TempDir, InstallError> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("addon-sync-");
            builder
        };

        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(InstallError::Scratch)
    }
}

/// An absent key counts as installed at version `""`.
pub fn needs_install(state: &InstalledState, entry: &TargetEntry) -> bool {
    state.version_of(&entry.key).unwrap_or("") != entry.version
}
