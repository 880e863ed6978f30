//! In-memory stand-ins for the UPM host and the artifact CDN.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::plugin::artifact::{Artifact, ArtifactSource};
use crate::plugin::error::FetchFailure;
use crate::plugin::http::HttpError;
use crate::plugin::job::InstallJobStatus;
use crate::plugin::upm::{InstalledState, Inventory, PluginHost, SessionToken, UploadReceipt};

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: PathBuf,
    pub token: Option<SessionToken>,
    pub bytes: Vec<u8>,
}

/// Scripted plugin manager. Every inventory call issues a fresh `token-N`.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub installed: Vec<(String, String)>,
    pub inventory_down: bool,
    pub upload_status: Option<u16>,
    pub status_link: Option<String>,
    /// Pending replies served before each job reports done.
    pub pending_polls: usize,
    pub inventory_calls: Cell<usize>,
    pub uploads: RefCell<Vec<RecordedUpload>>,
    pub polled: RefCell<Vec<Url>>,
    polls_this_job: Cell<usize>,
}

impl FakeHost {
    pub fn with_installed(installed: &[(&str, &str)]) -> Self {
        Self {
            installed: installed
                .iter()
                .map(|(key, version)| (key.to_string(), version.to_string()))
                .collect(),
            status_link: Some("/rest/plugins/1.0/pending/1".to_string()),
            ..Self::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.borrow().len()
    }
}

impl PluginHost for FakeHost {
    fn inventory(&self) -> Result<Inventory, FetchFailure> {
        self.inventory_calls.set(self.inventory_calls.get() + 1);
        if self.inventory_down {
            return Err(FetchFailure(HttpError::Status {
                status: 502,
                url: "https://jira.example.com/rest/plugins/1.0/".to_string(),
                body: "Bad Gateway".to_string(),
            }));
        }

        Ok(Inventory {
            state: self.installed.iter().cloned().collect::<InstalledState>(),
            token: Some(SessionToken::new(format!("token-{}", self.inventory_calls.get()))),
        })
    }

    fn upload(
        &self,
        artifact: &Path,
        token: Option<&SessionToken>,
    ) -> Result<UploadReceipt, HttpError> {
        self.uploads.borrow_mut().push(RecordedUpload {
            path: artifact.to_path_buf(),
            token: token.cloned(),
            bytes: fs::read(artifact).unwrap_or_default(),
        });

        if let Some(status) = self.upload_status {
            return Err(HttpError::Status {
                status,
                url: "https://jira.example.com/rest/plugins/1.0/".to_string(),
                body: "upload rejected".to_string(),
            });
        }

        self.polls_this_job.set(0);
        Ok(UploadReceipt {
            status_link: self.status_link.clone(),
        })
    }

    fn install_status(&self, status_url: &Url) -> Result<InstallJobStatus, HttpError> {
        self.polled.borrow_mut().push(status_url.clone());
        let polls = self.polls_this_job.get() + 1;
        self.polls_this_job.set(polls);

        if polls > self.pending_polls {
            Ok(InstallJobStatus {
                done: true,
                progress: 1.0,
            })
        } else {
            Ok(InstallJobStatus {
                done: false,
                progress: polls as f64 / (self.pending_polls + 1) as f64,
            })
        }
    }
}

/// Serves `jar:<url>` as the body of every download and records the URLs.
#[derive(Debug, Default)]
pub struct FakeArtifacts {
    pub downloads: RefCell<Vec<String>>,
}

impl ArtifactSource for FakeArtifacts {
    fn download(&self, url: &str) -> Result<Artifact, HttpError> {
        self.downloads.borrow_mut().push(url.to_string());
        Ok(Artifact {
            bytes: format!("jar:{url}").into_bytes(),
            content_disposition: None,
        })
    }
}
