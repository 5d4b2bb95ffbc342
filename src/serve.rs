//! HTTP server for the interactive page
//!
//! `burstweb --data bursts.csv` → loads the dataset, starts the server, opens the browser.
//!
//! Requests are handled one at a time against the immutable [`AppContext`].

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::page;
use crate::resolver::{self, HoverEvent};
use log::{debug, error, info, warn};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, Server};

/// Largest request body read; interaction payloads are a few dozen bytes.
const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(msg: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(msg.into()) }
    }
}

/// New `src` for the spike image. `None` leaves the current image in place.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ImageUpdate {
    pub src: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct HoverParams {
    point: Option<usize>,
}

/// A fully-formed response, independent of the transport.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body: body.into_bytes() }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status: 200, content_type: "application/json", body },
            Err(e) => Self::internal(e.to_string()),
        }
    }

    fn api_not_found(path: &str) -> Self {
        let mut reply = Self::json(&ApiResponse::<()>::failure(format!("unknown endpoint {}", path)));
        reply.status = 404;
        reply
    }

    fn not_found() -> Self {
        Self { status: 404, content_type: "text/plain", body: b"Not found".to_vec() }
    }

    fn internal(msg: String) -> Self {
        error!("Internal error: {}", msg);
        Self { status: 500, content_type: "text/plain", body: b"Internal server error".to_vec() }
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

/// Bind, open the browser and serve until the process is stopped.
pub fn start(ctx: &AppContext) -> Result<()> {
    let config = ctx.config();
    let addr = config.addr();
    let server = Server::http(&addr).map_err(|e| Error::Server(e.to_string()))?;

    let url = format!("http://{}", addr.replace("0.0.0.0", "localhost"));
    info!("Serving {} spikes from {}", ctx.dataset().len(), ctx.dataset().source().display());
    info!("Images from {}", config.image_dir().display());
    info!("Listening on {}", url);

    if config.open_browser {
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser: {}", e);
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, ctx) {
            error!("Request failed: {}", e);
        }
    }

    Ok(())
}

fn handle_request(mut request: Request, ctx: &AppContext) -> Result<()> {
    let method = request.method().clone();
    let url = request.url().to_string();

    // A body that can't be read is treated like a malformed one: no update.
    let mut body = Vec::new();
    if method == Method::Post {
        if let Err(e) = request.as_reader().take(MAX_BODY_BYTES).read_to_end(&mut body) {
            warn!("Could not read request body: {}", e);
            body.clear();
        }
    }

    let reply = route(ctx, &method, &url, &body);
    debug!("{} {} → {}", method, url, reply.status);

    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    request.respond(response)?;
    Ok(())
}

/// Dispatch a request. Pure with respect to the context, so it can be driven
/// directly from tests.
pub fn route(ctx: &AppContext, method: &Method, url: &str, body: &[u8]) -> Reply {
    let mut parts = url.splitn(2, '?');
    let path = parts.next().unwrap_or("/");
    let query = parts.next().unwrap_or("");

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => match page::render(ctx) {
            Ok(html) => Reply::html(html),
            Err(e) => Reply::internal(e.to_string()),
        },

        (&Method::Get, "/api/figure") => Reply::json(&ApiResponse::success(ctx.figure())),

        (&Method::Get, "/api/start") => Reply::json(&ApiResponse::success(ImageUpdate {
            src: Some(ctx.starting_image().to_string()),
        })),

        // Query form: /api/hover?point=N
        (&Method::Get, "/api/hover") => {
            let params: HoverParams = serde_urlencoded::from_str(query).unwrap_or_default();
            let event = params.point.map(HoverEvent::at);
            hover_reply(ctx, event.as_ref())
        }

        // Body form: the chart's event payload
        (&Method::Post, "/api/hover") => {
            let event = resolver::parse_event(body);
            hover_reply(ctx, event.as_ref())
        }

        (_, path) if path.starts_with("/api/") => Reply::api_not_found(path),

        (&Method::Get, path) => serve_static(ctx, path),

        _ => Reply::not_found(),
    }
}

fn hover_reply(ctx: &AppContext, event: Option<&HoverEvent>) -> Reply {
    let src = match resolver::resolve(ctx.points(), event) {
        Ok(Some(pic)) => {
            debug!("pointNumber {:?} → {}", event.and_then(HoverEvent::point_number), pic);
            Some(pic.to_string())
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Ignoring interaction: {}", e);
            None
        }
    };
    Reply::json(&ApiResponse::success(ImageUpdate { src }))
}

fn serve_static(ctx: &AppContext, path: &str) -> Reply {
    // Browsers escape spaces and non-ASCII characters in image URLs.
    let decoded = match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => return Reply::not_found(),
    };
    let clean = decoded.trim_start_matches('/');
    if clean.is_empty() || clean.contains("..") || clean.contains('\\') || clean.contains('\0') {
        return Reply::not_found();
    }

    let file_path = ctx.config().image_dir().join(clean);
    match fs::read(&file_path) {
        Ok(body) => Reply { status: 200, content_type: content_type_for(clean), body },
        Err(_) => {
            debug!("No static file at {}", file_path.display());
            Reply::not_found()
        }
    }
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "css" => "text/css",
        "js" => "application/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Config;
    use crate::dataset::Dataset;
    use serde_json::Value;

    const CSV: &str = "\
sample,isi,amp,SIZE,COLOR,PIC
10,0.120,85.5,10,0,spike_a.png
11,0.004,60.1,20,0.1,spike_b.png
12,0.005,42.0,20,0.25, spike_c.png
13,0.006,30.7,20,0.45,spike_d.png
4591,0.350,90.2,10,0,spike_4591.png
";

    fn context_with(config: Config) -> AppContext {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        AppContext::from_dataset(config, ds).unwrap()
    }

    fn context() -> AppContext {
        context_with(Config::default())
    }

    fn src_of(reply: &Reply) -> Value {
        let json: Value = serde_json::from_str(reply.body_str()).unwrap();
        assert_eq!(json["ok"], true);
        json["data"]["src"].clone()
    }

    // ==========================================================================
    // PAGE AND FIGURE
    // ==========================================================================

    #[test]
    fn test_index_page() {
        let reply = route(&context(), &Method::Get, "/", b"");
        assert_eq!(reply.status, 200);
        assert!(reply.content_type.starts_with("text/html"));
        assert!(reply.body_str().contains("spike_4591.png"));
    }

    #[test]
    fn test_figure_endpoint() {
        let reply = route(&context(), &Method::Get, "/api/figure", b"");
        let json: Value = serde_json::from_str(reply.body_str()).unwrap();
        assert_eq!(json["data"]["data"][0]["text"][4], "spike_4591.png");
        assert_eq!(json["data"]["layout"]["xaxis"]["type"], "log");
    }

    #[test]
    fn test_start_endpoint() {
        let reply = route(&context(), &Method::Get, "/api/start", b"");
        assert_eq!(src_of(&reply), "spike_4591.png");
    }

    // ==========================================================================
    // HOVER
    // ==========================================================================

    #[test]
    fn test_post_hover_resolves_trimmed_pic() {
        let reply = route(&context(), &Method::Post, "/api/hover", br#"{"points":[{"pointNumber":2}]}"#);
        assert_eq!(src_of(&reply), "spike_c.png");
    }

    #[test]
    fn test_get_hover_query() {
        let reply = route(&context(), &Method::Get, "/api/hover?point=1", b"");
        assert_eq!(src_of(&reply), "spike_b.png");
    }

    #[test]
    fn test_hover_without_index_is_no_update() {
        let ctx = context();
        assert_eq!(src_of(&route(&ctx, &Method::Get, "/api/hover", b"")), Value::Null);
        assert_eq!(src_of(&route(&ctx, &Method::Post, "/api/hover", b"")), Value::Null);
        assert_eq!(src_of(&route(&ctx, &Method::Post, "/api/hover", br#"{"points":[]}"#)), Value::Null);
        assert_eq!(src_of(&route(&ctx, &Method::Get, "/api/hover?point=abc", b"")), Value::Null);
    }

    #[test]
    fn test_hover_body_not_utf8_is_no_update() {
        let reply = route(&context(), &Method::Post, "/api/hover", b"{\"points\":[\xff]}");
        assert_eq!(reply.status, 200);
        assert_eq!(src_of(&reply), Value::Null);
    }

    #[test]
    fn test_hover_reads_first_point_only() {
        let body = br#"{"points":[{"pointNumber":1},{"pointNumber":"x"}]}"#;
        assert_eq!(src_of(&route(&context(), &Method::Post, "/api/hover", body)), "spike_b.png");
    }

    #[test]
    fn test_hover_out_of_range_is_no_update() {
        let reply = route(&context(), &Method::Post, "/api/hover", br#"{"points":[{"pointNumber":5}]}"#);
        assert_eq!(reply.status, 200);
        assert_eq!(src_of(&reply), Value::Null);
    }

    // ==========================================================================
    // STATIC IMAGES
    // ==========================================================================

    #[test]
    fn test_serves_image_from_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("spike_a.png"), b"\x89PNG").unwrap();
        let ctx = context_with(Config {
            image_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });

        let reply = route(&ctx, &Method::Get, "/spike_a.png", b"");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(reply.body, b"\x89PNG");

        assert_eq!(route(&ctx, &Method::Get, "/missing.png", b"").status, 404);
    }

    #[test]
    fn test_serves_percent_encoded_image_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("spike 4591.png"), b"\x89PNG").unwrap();
        fs::write(dir.path().join("spike_µ.png"), b"\x89PNG").unwrap();
        let ctx = context_with(Config {
            image_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });

        assert_eq!(route(&ctx, &Method::Get, "/spike%204591.png", b"").status, 200);
        assert_eq!(route(&ctx, &Method::Get, "/spike_%C2%B5.png", b"").status, 200);
        assert_eq!(route(&ctx, &Method::Get, "/spike%FF.png", b"").status, 404);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let ctx = context();
        assert_eq!(route(&ctx, &Method::Get, "/../bursts.csv", b"").status, 404);
        assert_eq!(route(&ctx, &Method::Get, "/a\\b.png", b"").status, 404);
        assert_eq!(route(&ctx, &Method::Get, "/%2e%2e/bursts.csv", b"").status, 404);
        assert_eq!(route(&ctx, &Method::Get, "/a%5Cb.png", b"").status, 404);
    }

    #[test]
    fn test_unknown_api_endpoint_reports_error() {
        let reply = route(&context(), &Method::Delete, "/api/hover", b"");
        assert_eq!(reply.status, 404);
        let json: Value = serde_json::from_str(reply.body_str()).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "unknown endpoint /api/hover");

        assert_eq!(route(&context(), &Method::Get, "/api/nothing", b"").status, 404);
    }

    #[test]
    fn test_unknown_method_not_found() {
        assert_eq!(route(&context(), &Method::Put, "/spike_a.png", b"").status, 404);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("dir/b.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
