// The api module adapts HTTP traffic onto the core services.
// Routing and the server loop live in `http_server.rs`; the per-endpoint
// logic lives in `handlers.rs`.

#[path = "handlers.rs"]
pub mod handlers;

#[path = "http_server.rs"]
pub mod http_server;
