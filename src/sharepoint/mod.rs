//! SharePoint access: URI resolution, authentication, download and upload

pub mod auth;
pub mod client;
pub mod location;

pub use auth::{acquire_token, AccessToken};
pub use client::{download_url, upload_url, SharePointClient, SourceDocument};
pub use location::{resolve_uri, split_extension, PageDestination, SharePointFile};
