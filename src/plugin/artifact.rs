use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::plugin::error::InstallError;
use crate::plugin::http::HttpError;

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="(.+)""#).expect("valid filename regex"));

/// A downloaded plugin binary.
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
}

/// Where plugin binaries are downloaded from.
pub trait ArtifactSource {
    fn download(&self, url: &str) -> Result<Artifact, HttpError>;
}

/// File name for an artifact fetched from `url`.
///
/// Uses the quoted `filename="..."` of the Content-Disposition header when
/// present, otherwise the last path segment of the URL. Only the final path
/// component is kept.
pub fn file_name(url: &str, content_disposition: Option<&str>) -> Option<String> {
    let from_header = content_disposition
        .and_then(|header| FILENAME_RE.captures(header))
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str());

    let raw = match from_header {
        Some(name) => name,
        None => url.rsplit('/').next().unwrap_or_default(),
    };

    Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Write `artifact` into `dir`, naming it after the download.
pub fn save(artifact: &Artifact, url: &str, dir: &Path) -> Result<PathBuf, InstallError> {
    let name = file_name(url, artifact.content_disposition.as_deref()).ok_or_else(|| {
        InstallError::ArtifactName {
            url: url.to_string(),
        }
    })?;
    let path = dir.join(name);

    fs::write(&path, &artifact.bytes).map_err(|source| InstallError::SaveArtifact {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
