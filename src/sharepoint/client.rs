//! SharePoint REST client for downloading source files and uploading pages

use crate::config::FunctionConfig;
use crate::error::{Error, Result};
use crate::sharepoint::auth::{acquire_token, AccessToken};
use crate::sharepoint::location::{PageDestination, SharePointFile};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// Downloaded source document held in a scoped temporary file
#[derive(Debug)]
pub struct SourceDocument {
    /// Deleted when dropped
    pub path: TempPath,
    pub size: u64,
}

/// Authenticated client bound to one invocation
pub struct SharePointClient {
    http: reqwest::Client,
    token: AccessToken,
    drive_id: String,
    max_download_bytes: u64,
    temp_dir: PathBuf,
}

impl SharePointClient {
    /// Build the HTTP client and authenticate against the identity platform
    pub async fn connect(config: &FunctionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(Error::HttpRequest)?;

        let token = acquire_token(&http, config).await?;

        Ok(Self {
            http,
            token,
            drive_id: config.drive_id.clone(),
            max_download_bytes: config.max_download_bytes,
            temp_dir: config.temp_dir.clone(),
        })
    }

    /// Download the file into a temporary file.
    ///
    /// The response status is checked before any byte is written, and the
    /// body is streamed with incremental size checking.
    pub async fn download(&self, file: &SharePointFile) -> Result<SourceDocument> {
        let url = download_url(file);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Download {
                url,
                status: response.status().as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_download_bytes {
                return Err(Error::DownloadTooLarge {
                    size: content_length,
                    max_size: self.max_download_bytes,
                });
            }
        }

        let (std_file, path) = tempfile::Builder::new()
            .prefix("source-")
            .suffix(".pdf")
            .tempfile_in(&self.temp_dir)?
            .into_parts();
        let mut out = tokio::fs::File::from_std(std_file);

        let mut size: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::HttpRequest)?;
            size += chunk.len() as u64;
            if size > self.max_download_bytes {
                return Err(Error::DownloadTooLarge {
                    size,
                    max_size: self.max_download_bytes,
                });
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        drop(out);

        tracing::debug!(size, path = %path.display(), "Source document downloaded");

        Ok(SourceDocument { path, size })
    }

    /// Upload one page. Any non-success status is fatal for the invocation.
    pub async fn upload_page(
        &self,
        file: &SharePointFile,
        page: u32,
        destination: &PageDestination,
        body: Vec<u8>,
    ) -> Result<()> {
        let url = upload_url(file, &self.drive_id, destination);
        let response = self
            .http
            .put(&url)
            .bearer_auth(self.token.secret())
            .header(CONTENT_TYPE, "application/pdf")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upload {
                page,
                destination: destination.path(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

/// REST endpoint returning the raw bytes of a file
pub fn download_url(file: &SharePointFile) -> String {
    format!(
        "{}/_api/web/GetFileByServerRelativeUrl('/{}')/$value",
        file.site_url, file.file_path
    )
}

/// Drive endpoint that creates or replaces a file at the destination path
pub fn upload_url(
    file: &SharePointFile,
    drive_id: &str,
    destination: &PageDestination,
) -> String {
    format!(
        "{}/_api/v2.0/drives/{}/root:/{}:/content",
        file.site_url,
        drive_id,
        destination.path()
    )
}
