//! Response checking and JSON decoding shared by the UPM and marketplace clients.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Transport-level failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },
    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to attach {}: {source}", .path.display())]
    Attach {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const BODY_SNIPPET_LEN: usize = 512;

pub fn build_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, HttpError> {
    Ok(Client::builder()
        .user_agent(concat!("addon-sync/", env!("CARGO_PKG_VERSION")))
        // UPM binds the upload token to the session that issued it
        .cookie_store(true)
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()?)
}

/// Turn a non-2xx response into [`HttpError::Status`], keeping a snippet of the body.
pub fn ensure_success(response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let mut body = response.text().unwrap_or_default();
    if body.len() > BODY_SNIPPET_LEN {
        let mut cut = BODY_SNIPPET_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }

    Err(HttpError::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

pub fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, HttpError> {
    let response = ensure_success(response)?;
    let url = response.url().to_string();
    let body = response.bytes()?;
    decode(&url, &body)
}

pub fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice(body).map_err(|source| HttpError::Decode {
        url: url.to_string(),
        source,
    })
}
