//! Development server.
//!
//! A small `tiny_http` loop that answers requests in three stages:
//!
//! 1. Compiled page routes (exact match against the current snapshot)
//! 2. Static files under the output directory
//! 3. `index.html` for directory requests, then 404
//!
//! Pages are rendered from the in-memory snapshot, never from disk, so
//! a rebuild triggered by the watcher is visible on the next request
//! without a restart.

use crate::{
    config::{RsxConfig, cfg},
    compiler, log,
    watch::watch_for_changes,
};
use anyhow::{Context, Result};
use std::{
    borrow::Cow,
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server};

/// Ports to probe past the configured one before giving up.
const MAX_PORT_RETRIES: u16 = 10;

/// Start the development server.
///
/// Binds the configured interface and port (probing upward on
/// conflict), spawns the watcher thread when enabled, and blocks on the
/// request loop until Ctrl+C unblocks it.
pub fn serve_project() -> Result<()> {
    let config = cfg();
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface {}", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!(
        "serve";
        "serving {} at http://{addr}",
        config.build.output.display()
    );
    log!("serve"; "pages from {}", config.build.pages.display());

    if config.serve.watch {
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes() {
                log!("watch"; "{err:#}");
            }
        });
    }

    for request in server.incoming_requests() {
        // cfg() per request so a hot-reloaded rsx.toml takes effect
        if let Err(err) = handle_request(request, &cfg()) {
            log!("serve"; "request error: {err:#}");
        }
    }

    Ok(())
}

/// Bind a port, probing upward when the requested one is taken.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => continue,
            Err(err) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {max_retries} attempts (ports {base_port}-{port}): {err}"
                ));
            }
        }
    }
    unreachable!()
}

fn handle_request(request: Request, config: &RsxConfig) -> Result<()> {
    let url_path = urlencoding::decode(request.url())
        .map(Cow::into_owned)
        .unwrap_or_else(|_| request.url().to_string());

    // Strip the query string before resolving, e.g. "/about?t=123"
    let uri = url_path.split('?').next().unwrap_or(&url_path);

    // Compiled page routes take priority over anything on disk
    if let Some(page) = compiler::resolve(uri) {
        return serve_html(request, compiler::render_body(&page));
    }

    let request_path = uri.trim_matches('/');
    if !is_safe_path(request_path) {
        return serve_not_found(request);
    }
    let local_path = config.build.output.join(request_path);

    if local_path.is_file() {
        return serve_file(request, &local_path);
    }

    if local_path.is_dir() {
        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return serve_file(request, &index_path);
        }
    }

    serve_not_found(request)
}

/// Reject request paths that climb out of the output directory.
fn is_safe_path(request_path: &str) -> bool {
    !Path::new(request_path)
        .components()
        .any(|component| matches!(component, Component::ParentDir))
}

fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", guess_content_type(path)).unwrap());
    request.respond(response)?;
    Ok(())
}

fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::from_string("404 Not Found")
        .with_status_code(404)
        .with_header(Header::from_bytes("Content-Type", "text/plain").unwrap());
    request.respond(response)?;
    Ok(())
}

/// MIME type from file extension, `application/octet-stream` fallback.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json" | "map") => "application/json; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
