//! Lazy page splitting
//!
//! The source document is parsed once on a blocking worker. Pages are
//! written to their own temporary files and handed over through a channel
//! with room for one page. The worker holds at most two pages the consumer
//! has not taken yet (one queued, one being written) and stops as soon as
//! the consumer goes away.

use crate::error::{Error, Result};
use crate::pdf::QpdfWrapper;
use qpdf::QPdf;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::sync::{mpsc, oneshot};

/// A single-page PDF in a scoped temporary file
#[derive(Debug)]
pub struct PageDocument {
    /// 0-based index in the source document
    pub index: u32,
    /// Deleted when dropped
    pub path: TempPath,
}

impl PageDocument {
    /// 1-based page number
    pub fn page_number(&self) -> u32 {
        self.index + 1
    }

    /// Read the page bytes
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Delete the temporary file, reporting failures instead of ignoring them
    pub fn close(self) -> std::io::Result<()> {
        self.path.close()
    }
}

/// Pages of a parsed source document, consumed once in ascending order
#[derive(Debug)]
pub struct PageSplit {
    page_count: u32,
    pages: mpsc::Receiver<Result<PageDocument>>,
}

impl PageSplit {
    /// Total pages in the source document
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Next page, or `None` once every page was produced.
    /// An error ends the sequence.
    pub async fn next_page(&mut self) -> Option<Result<PageDocument>> {
        self.pages.recv().await
    }
}

/// Parse the PDF at `source` and start producing single-page documents
/// whose temporary files live in `temp_dir`
pub async fn split_pages(source: &Path, temp_dir: &Path) -> Result<PageSplit> {
    let source = source.to_path_buf();
    let temp_dir = temp_dir.to_path_buf();
    let (ready_tx, ready_rx) = oneshot::channel();
    let (page_tx, page_rx) = mpsc::channel(1);

    tokio::task::spawn_blocking(move || produce_pages(source, temp_dir, ready_tx, page_tx));

    let page_count = ready_rx.await.map_err(|_| Error::QpdfError {
        reason: "Split worker stopped before reading the document".to_string(),
    })??;

    Ok(PageSplit {
        page_count,
        pages: page_rx,
    })
}

fn produce_pages(
    source: PathBuf,
    temp_dir: PathBuf,
    ready: oneshot::Sender<Result<u32>>,
    pages: mpsc::Sender<Result<PageDocument>>,
) {
    let (document, page_count) = match open_source(&source) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(page_count)).is_err() {
        return;
    }

    for index in 0..page_count {
        let page = write_page(&document, index, &temp_dir);
        let failed = page.is_err();
        if pages.blocking_send(page).is_err() || failed {
            return;
        }
    }
}

fn open_source(source: &Path) -> Result<(QPdf, u32)> {
    let data = std::fs::read(source)?;
    let document = QpdfWrapper::open(&data)?;
    let page_count = QpdfWrapper::page_count(&document)?;
    Ok((document, page_count))
}

fn write_page(document: &QPdf, index: u32, temp_dir: &Path) -> Result<PageDocument> {
    let bytes = QpdfWrapper::extract_page(document, index)?;

    let mut file = tempfile::Builder::new()
        .prefix("page-")
        .suffix(".pdf")
        .tempfile_in(temp_dir)?;
    file.write_all(&bytes)?;
    file.flush()?;

    Ok(PageDocument {
        index,
        path: file.into_temp_path(),
    })
}
