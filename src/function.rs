//! The SplitAndUpload function
//!
//! One invocation runs strictly in sequence: resolve the URI, authenticate,
//! download, then split and upload one page at a time. The first failure
//! aborts the invocation; temporary files are released on every path.

use crate::config::FunctionConfig;
use crate::error::{Error, Result};
use crate::pdf::split_pages;
use crate::sharepoint::{resolve_uri, SharePointClient};
use tracing::Instrument;

/// Outcome of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    /// Pages in the source document
    pub page_count: u32,
    /// Drive-relative paths of the uploaded pages, in upload order
    pub uploaded: Vec<String>,
}

impl SplitSummary {
    /// Response body reported to the caller
    pub fn message(&self) -> String {
        format!(
            "{} pages split and saved successfully to SharePoint.",
            self.page_count
        )
    }
}

/// Build the configuration from `lookup`, then split and upload `uri`.
///
/// Configuration is checked before any network call is made.
pub async fn handle_invocation<F>(lookup: F, uri: &str) -> Result<SplitSummary>
where
    F: Fn(&str) -> Option<String>,
{
    let config = FunctionConfig::from_lookup(lookup)?;
    split_and_upload(&config, uri).await
}

/// Split the PDF at `uri` into single pages and upload each next to it
pub async fn split_and_upload(config: &FunctionConfig, uri: &str) -> Result<SplitSummary> {
    let invocation_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("invocation", id = %invocation_id);
    run(config, uri).instrument(span).await
}

async fn run(config: &FunctionConfig, uri: &str) -> Result<SplitSummary> {
    let file = resolve_uri(uri)?;
    tracing::info!(site_url = %file.site_url, file_path = %file.file_path, "Resolved source file");

    let client = SharePointClient::connect(config).await?;
    let source = client.download(&file).await?;

    let mut pages = split_pages(&source.path, &config.temp_dir).await?;
    let page_count = pages.page_count();
    tracing::info!(page_count, size = source.size, "Source document parsed");

    let mut uploaded = Vec::with_capacity(page_count as usize);
    while let Some(page) = pages.next_page().await {
        let page = page?;
        let destination = file.page_destination(page.index, page_count);
        tracing::info!(
            page = page.page_number(),
            file_name = %destination.file_name,
            "Saving page"
        );

        let body = page.read().await?;
        client
            .upload_page(&file, page.page_number(), &destination, body)
            .await?;
        uploaded.push(destination.path());

        let page_number = page.page_number();
        if let Err(e) = page.close() {
            tracing::warn!(page = page_number, error = %e, "Failed to delete page temp file");
        }
    }

    if uploaded.len() != page_count as usize {
        return Err(Error::QpdfError {
            reason: format!(
                "Split stopped after {} of {} pages",
                uploaded.len(),
                page_count
            ),
        });
    }

    if let Err(e) = source.path.close() {
        tracing::warn!(error = %e, "Failed to delete source temp file");
    }

    Ok(SplitSummary {
        page_count,
        uploaded,
    })
}
