//! Shared test helpers: generated PDFs and an in-process fake of the
//! identity platform and SharePoint endpoints.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub const TOKEN: &str = "test-access-token";
pub const DRIVE_ID: &str = "b!test-drive";
pub const SOURCE_PATH: &str = "sites/team/docs/report.pdf";

/// Build a well-formed PDF with `page_count` pages, each showing its number.
pub fn sample_pdf(page_count: usize) -> Vec<u8> {
    build_pdf(page_count, false)
}

/// Like [`sample_pdf`], but `/MediaBox`, `/Resources` and `/Rotate` are set
/// only on the `/Pages` node and inherited by every page.
pub fn sample_pdf_with_inherited_attributes(page_count: usize) -> Vec<u8> {
    build_pdf(page_count, true)
}

fn build_pdf(page_count: usize, inherited: bool) -> Vec<u8> {
    const PAGE_ATTRIBUTES: &str =
        "/MediaBox [0 0 612 792] /Resources << /Font << /F1 3 0 R >> >>";
    const TREE_ATTRIBUTES: &str =
        "/MediaBox [0 0 300 400] /Resources << /Font << /F1 3 0 R >> >> /Rotate 90";

    let mut objects: Vec<String> = Vec::new();
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} {}>>",
        kids.join(" "),
        page_count,
        if inherited { format!("{} ", TREE_ATTRIBUTES) } else { String::new() }
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    for i in 0..page_count {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R {}/Contents {} 0 R >>",
            if inherited { String::new() } else { format!("{} ", PAGE_ATTRIBUTES) },
            5 + 2 * i
        ));
        let content = format!("BT /F1 24 Tf 72 700 Td (Page {}) Tj ET", i + 1);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

/// Decoded content stream of the only page in `pdf`
pub fn single_page_text(pdf: &[u8]) -> String {
    let document = qpdf::QPdf::read_from_memory(pdf).unwrap();
    assert_eq!(document.get_num_pages().unwrap(), 1);
    let page = document.get_page(0).unwrap();
    let content = page.get_page_content_data().unwrap();
    String::from_utf8_lossy(&content).into_owned()
}

/// How the fake endpoints respond
#[derive(Clone)]
pub struct Behavior {
    pub token_status: u16,
    pub download_status: u16,
    pub source: Vec<u8>,
    /// 1-based upload number that gets a 500
    pub fail_upload: Option<usize>,
    /// Token endpoint answers 200 with a body that is not a token
    pub malformed_token: bool,
}

impl Behavior {
    pub fn serving(source: Vec<u8>) -> Self {
        Self {
            token_status: 200,
            download_status: 200,
            source,
            fail_upload: None,
            malformed_token: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: String,
    pub body: Vec<u8>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub token_requests: Vec<String>,
    pub downloads: Vec<String>,
    pub uploads: Vec<RecordedUpload>,
}

impl Recorded {
    pub fn network_calls(&self) -> usize {
        self.token_requests.len() + self.downloads.len() + self.uploads.len()
    }
}

pub struct FakeState {
    behavior: Behavior,
    recorded: Mutex<Recorded>,
}

/// Fake identity platform and SharePoint site on a random local port
pub struct FakeSharePoint {
    pub base_url: String,
    state: Arc<FakeState>,
    _shutdown: oneshot::Sender<()>,
}

impl FakeSharePoint {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(FakeState {
            behavior,
            recorded: Mutex::new(Recorded::default()),
        });

        let router = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", addr.port()),
            state,
            _shutdown: shutdown_tx,
        }
    }

    /// URI of the source document on the fake site
    pub fn source_uri(&self) -> String {
        format!("{}/{}", self.base_url, SOURCE_PATH)
    }

    pub fn recorded(&self) -> Recorded {
        self.state.recorded.lock().unwrap().clone()
    }

    /// Complete function configuration pointing at this fake
    pub fn settings(&self, temp_dir: &Path) -> HashMap<String, String> {
        [
            ("TenantId", "test-tenant".to_string()),
            ("ClientId", "test-client".to_string()),
            ("ClientSecret", "test-secret".to_string()),
            ("DriveId", DRIVE_ID.to_string()),
            ("AuthorityHost", self.base_url.clone()),
            ("HttpTimeoutSecs", "10".to_string()),
            ("TempDir", temp_dir.display().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Turn a settings map into a configuration lookup
pub fn lookup(
    settings: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
    move |name: &str| settings.get(name).cloned()
}

/// Wait until every temporary file in `dir` has been removed
pub async fn assert_temp_dir_drains(dir: &Path) {
    for _ in 0..100 {
        if std::fs::read_dir(dir).unwrap().next().is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let left: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    panic!("temporary files left behind: {:?}", left);
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let authorized =
        header(AUTHORIZATION).as_deref() == Some(format!("Bearer {}", TOKEN).as_str());
    let behavior = &state.behavior;

    if method == Method::POST && path.ends_with("/oauth2/v2.0/token") {
        state
            .recorded
            .lock()
            .unwrap()
            .token_requests
            .push(String::from_utf8_lossy(&body).into_owned());
        if behavior.token_status != 200 {
            return (status(behavior.token_status), r#"{"error":"invalid_client"}"#)
                .into_response();
        }
        if behavior.malformed_token {
            return (StatusCode::OK, "<html>Sign in</html>").into_response();
        }
        return Json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": TOKEN,
        }))
        .into_response();
    }

    if method == Method::GET && path.starts_with("/_api/web/GetFileByServerRelativeUrl(") {
        state.recorded.lock().unwrap().downloads.push(path);
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        if behavior.download_status != 200 {
            return (
                status(behavior.download_status),
                r#"{"error":{"code":"-2130575338, Microsoft.SharePoint.SPException"}}"#,
            )
                .into_response();
        }
        return (StatusCode::OK, behavior.source.clone()).into_response();
    }

    let upload_prefix = format!("/_api/v2.0/drives/{}/root:/", DRIVE_ID);
    if method == Method::PUT {
        if let Some(destination) = path
            .strip_prefix(&upload_prefix)
            .and_then(|rest| rest.strip_suffix(":/content"))
        {
            let mut recorded = state.recorded.lock().unwrap();
            recorded.uploads.push(RecordedUpload {
                path: destination.to_string(),
                body: body.to_vec(),
                authorization: header(AUTHORIZATION),
                content_type: header(CONTENT_TYPE),
            });
            if behavior.fail_upload == Some(recorded.uploads.len()) {
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            return (
                StatusCode::CREATED,
                Json(serde_json::json!({ "name": destination })),
            )
                .into_response();
        }
    }

    StatusCode::NOT_FOUND.into_response()
}
