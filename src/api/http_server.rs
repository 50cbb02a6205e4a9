// HTTP transport for the API: a tiny_http accept loop on a dedicated thread.
// Each request gets its own worker thread so a delayed demo reply never
// blocks the cancel endpoint that is supposed to interrupt it.

use std::io::Read;
use std::thread;
use tiny_http::{Header, Response, Server};
use tokio::runtime::Handle;
use tracing::{error, info};

use super::handlers::{self, AppState};

/// Request bodies over this size are refused outright.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Start the HTTP server on its own thread and return immediately.
///
/// `admin_token` guards every `/admin` route; an empty or missing token
/// leaves them open, which is the expected setup for local development.
pub fn start_http_server(
    state: AppState,
    rt: Handle,
    bind_addr: String,
    admin_token: Option<String>,
) {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(server) => {
                let auth = admin_token
                    .as_deref()
                    .map_or(false, |t| !t.trim().is_empty());
                info!(
                    "API listening on http://{} (admin auth {})",
                    bind_addr,
                    if auth { "enabled" } else { "disabled" }
                );
                server
            }
            Err(e) => {
                error!("Failed to bind {}: {}", bind_addr, e);
                return;
            }
        };

        for request in server.incoming_requests() {
            let state = state.clone();
            let rt = rt.clone();
            let admin_token = admin_token.clone();
            thread::spawn(move || handle_request(request, state, rt, admin_token));
        }
    });
}

fn handle_request(
    mut request: tiny_http::Request,
    state: AppState,
    rt: Handle,
    admin_token: Option<String>,
) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (url.clone(), String::new()),
    };

    if path.starts_with("/admin") && !is_authorized(&request, admin_token.as_deref()) {
        respond_json(request, 401, serde_json::json!({ "error": "unauthorized" }));
        return;
    }

    let body = if method == "POST" {
        match read_request_body(&mut request) {
            Ok(body) => body,
            Err((status, body)) => {
                respond_json(request, status, body);
                return;
            }
        }
    } else {
        String::new()
    };

    let (status, body) = rt.block_on(handlers::route(&state, &method, &path, &query, &body));
    respond_json(request, status, body);
}

/// `/admin` requests must carry `Authorization: Bearer <token>`. No
/// configured token means the check always passes.
fn is_authorized(request: &tiny_http::Request, expected: Option<&str>) -> bool {
    let expected = match expected {
        Some(token) if !token.trim().is_empty() => token,
        _ => return true,
    };

    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str() == format!("Bearer {expected}"))
        .unwrap_or(false)
}

/// Read a request body with the size cap applied. The error form is ready to
/// send back as-is.
fn read_request_body(
    request: &mut tiny_http::Request,
) -> Result<String, (u16, serde_json::Value)> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if reader.read_to_string(&mut body).is_err() {
        return Err((400, serde_json::json!({ "error": "bad_request" })));
    }
    if body.len() > MAX_BODY_BYTES {
        return Err((413, serde_json::json!({ "error": "payload_too_large" })));
    }
    Ok(body)
}

fn json_content_type() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid")
}

fn respond_json(request: tiny_http::Request, status: u16, body: serde_json::Value) {
    let response = Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(json_content_type());
    if let Err(e) = request.respond(response) {
        error!("Failed to send response: {}", e);
    }
}
