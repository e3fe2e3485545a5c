//! SharePoint PDF splitter
//!
//! An Azure Functions custom handler that downloads a PDF from a SharePoint
//! document library, splits it into single-page PDFs and uploads each page
//! back next to the source file:
//! - `sharepoint`: URI resolution, client-credentials auth, download and upload
//! - `pdf`: lazy page splitting with qpdf
//! - `function`: the sequential SplitAndUpload flow
//! - `server`: the HTTP surface the Functions host forwards requests to

pub mod config;
pub mod error;
pub mod function;
pub mod pdf;
pub mod server;
pub mod sharepoint;

pub use config::{FunctionConfig, LogFormat, ServerConfig};
pub use error::{Error, Result};
pub use function::{handle_invocation, split_and_upload, SplitSummary};
pub use server::{create_router, run_server, AppState, FUNCTION_ROUTE};
