use std::path::PathBuf;

/// Progress reports emitted by the reconciliation workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Inventory query failed; the run continues as if nothing were installed.
    InventoryUnavailable { reason: String },
    InventoryRead { plugins: usize, has_token: bool },
    CheckingPlugin { key: String },
    AlreadySatisfied { key: String, version: String },
    InstallStarted { key: String, version: String },
    ResolvingDownload { key: String },
    Downloading { url: String },
    ArtifactSaved { path: PathBuf },
    Uploading { key: String },
    /// Install job still running; `percent` is progress × 100.
    InstallPending { percent: f64 },
    Installed { key: String },
    RunFinished { checked: usize, installed: usize },
}

/// Sink for [`Msg`] values, injected into every workflow component.
pub trait Observer {
    fn notify(&self, msg: Msg);
}

/// Forwards every message to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, msg: Msg) {
        match msg {
            Msg::InventoryUnavailable { reason } => {
                tracing::warn!(
                    %reason,
                    "plugin inventory unavailable, treating every plugin as not installed"
                );
            }
            Msg::InventoryRead { plugins, has_token } => {
                tracing::debug!(plugins, has_token, "plugin inventory read");
            }
            Msg::CheckingPlugin { key } => tracing::info!(%key, "checking plugin"),
            Msg::AlreadySatisfied { key, version } => {
                tracing::info!(%key, %version, "plugin already at desired version");
            }
            Msg::InstallStarted { key, version } => {
                tracing::info!(%key, %version, "trying to install plugin");
            }
            Msg::ResolvingDownload { key } => tracing::info!(%key, "looking for download URL"),
            Msg::Downloading { url } => tracing::info!(%url, "downloading addon from marketplace"),
            Msg::ArtifactSaved { path } => {
                tracing::info!(path = %path.display(), "download complete, uploading to UPM");
            }
            Msg::Uploading { key } => tracing::debug!(%key, "uploading artifact"),
            Msg::InstallPending { percent } => {
                tracing::info!(
                    progress = percent,
                    "plugin install not done yet, progress: {percent}%"
                );
            }
            Msg::Installed { key } => tracing::info!(%key, "plugin was successfully installed"),
            Msg::RunFinished { checked, installed } => {
                tracing::info!(checked, installed, "reconciliation finished");
            }
        }
    }
}
