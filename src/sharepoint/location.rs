//! SharePoint file locations and derived page destinations

use crate::error::{Error, Result};

/// A file addressed on a SharePoint site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePointFile {
    /// `scheme://host[:port]` of the site collection
    pub site_url: String,
    /// Server-relative path without leading or trailing slashes
    pub file_path: String,
}

/// Where a single page is uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDestination {
    /// Directory of the source file, with a trailing slash unless at the root
    pub directory: String,
    /// `{stem}_part_{page_count}_{page_number}{ext}`
    pub file_name: String,
}

impl PageDestination {
    /// Drive-relative path of the uploaded page
    pub fn path(&self) -> String {
        format!("{}{}", self.directory, self.file_name)
    }
}

/// Split an absolute URI into the site URL and the server-relative file path.
///
/// Percent-encoding in the path is kept as the URL parser yields it.
pub fn resolve_uri(uri: &str) -> Result<SharePointFile> {
    let invalid = |reason: &str| Error::InvalidUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    let parsed = url::Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;
    let host = parsed.host_str().ok_or_else(|| invalid("URI has no host"))?;

    let site_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    };

    let file_path = parsed.path().trim_matches('/').to_string();
    if file_path.is_empty() {
        return Err(invalid("URI does not address a file"));
    }

    Ok(SharePointFile {
        site_url,
        file_path,
    })
}

impl SharePointFile {
    /// Final path segment of the file
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(self.file_path.as_str())
    }

    /// Directory part of the path including its trailing slash
    pub fn directory(&self) -> &str {
        &self.file_path[..self.file_path.len() - self.file_name().len()]
    }

    /// Destination of the page at `page_index` (0-based) out of `page_count`
    pub fn page_destination(&self, page_index: u32, page_count: u32) -> PageDestination {
        let (stem, ext) = split_extension(self.file_name());
        PageDestination {
            directory: self.directory().to_string(),
            file_name: format!("{}_part_{}_{}{}", stem, page_count, page_index + 1, ext),
        }
    }
}

/// Split a file name into stem and extension.
///
/// The extension starts at the last dot. Leading dots belong to the stem,
/// so `.profile` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let lead = name.len() - name.trim_start_matches('.').len();
    match name[lead..].rfind('.') {
        Some(dot) => name.split_at(lead + dot),
        None => (name, ""),
    }
}
