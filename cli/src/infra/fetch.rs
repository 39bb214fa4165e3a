//! HTTP script download: implements the `ScriptFetcher` port.

use std::io::Read;

use anyhow::Result;

use crate::application::ports::ScriptFetcher;
use crate::domain::error::StageError;
use crate::infra::blocking;

/// Scripts are small; anything larger is refused.
const MAX_SCRIPT_BYTES: u64 = 4 * 1024 * 1024;

/// `ureq` fetcher; requests run on the blocking pool.
pub struct HttpFetcher;

impl ScriptFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url.to_string();
        blocking("fetch", move || get(&url)).await
    }
}

fn get(url: &str) -> Result<Vec<u8>> {
    let failed = |detail: String| StageError::FetchFailed {
        url: url.to_string(),
        detail,
    };
    let resp = match ureq::get(url).set("User-Agent", "zeek-installer").call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, _)) => return Err(failed(format!("HTTP {code}")).into()),
        Err(e) => return Err(failed(e.to_string()).into()),
    };
    let mut body = Vec::new();
    resp.into_reader()
        .take(MAX_SCRIPT_BYTES)
        .read_to_end(&mut body)
        .map_err(|e| failed(e.to_string()))?;
    tracing::debug!(url, bytes = body.len(), "fetched script");
    Ok(body)
}
