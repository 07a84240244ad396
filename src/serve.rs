//! Development server.
//!
//! A lightweight HTTP server for local preview, built on `tiny_http`:
//!
//! - Static file serving from the build output directory
//! - Automatic `index.html` resolution for directories
//! - Directory listing for directories without an index
//! - File watching and incremental rebuild (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Serve requests          Rebuild changes
//!          └───────────┬───────────┘
//!                      ▼
//!             config.build.output
//! ```

use crate::{
    config::{SiteConfig, cfg},
    log,
    utils::signal,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Directory listing page (embedded at compile time)
const DIRECTORY_TEMPLATE: &str = include_str!("embed/directory.html");

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the output directory until Ctrl+C.
///
/// Binds to the configured interface and port (moving up on conflicts),
/// starts the watcher thread when enabled, then handles requests on the
/// current thread.
pub fn serve_site() -> Result<()> {
    let c = cfg();
    let (server, addr) = try_bind_port(c.serve.ip()?, c.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    signal::on_interrupt(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    });

    log!("serve"; "http://{}", addr);

    if c.serve.watch {
        std::thread::spawn(|| {
            if let Err(err) = watch_for_changes_blocking() {
                log!("watch"; "{err:#}");
            }
        });
    }

    for request in server.incoming_requests() {
        // Fresh config per request to pick up hot reloads
        if let Err(e) = handle_request(request, &cfg()) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Resolve a request path against the output root.
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(std::path::PathBuf),
    Listing(std::path::PathBuf),
    NotFound,
}

/// Resolution order:
/// 1. exact file
/// 2. `<path>.html` (pretty URLs: `/posts/hello` → `posts/hello.html`)
/// 3. directory `index.html`
/// 4. directory listing
fn resolve(serve_root: &Path, url: &str) -> Resolved {
    let url_path = urlencoding::decode(url)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path
    let path_without_query = url_path.split(['?', '#']).next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');
    if request_path.split('/').any(|seg| seg == "..") {
        return Resolved::NotFound;
    }

    let local_path = serve_root.join(request_path);
    if local_path.is_file() {
        return Resolved::File(local_path);
    }

    let html = local_path.with_extension("html");
    if !request_path.is_empty() && html.is_file() {
        return Resolved::File(html);
    }

    if local_path.is_dir() {
        let index = local_path.join("index.html");
        if index.is_file() {
            return Resolved::File(index);
        }
        return Resolved::Listing(local_path);
    }

    Resolved::NotFound
}

fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    let serve_root = &config.build.output;

    match resolve(serve_root, request.url()) {
        Resolved::File(path) => serve_file(request, &path),
        Resolved::Listing(dir) => {
            let request_path = dir
                .strip_prefix(serve_root)
                .unwrap_or(&dir)
                .to_string_lossy()
                .replace('\\', "/");
            match generate_directory_listing(&dir, &request_path) {
                Ok(listing) => serve_html(request, listing),
                Err(_) => serve_not_found(request),
            }
        }
        Resolved::NotFound => serve_not_found(request),
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type_header(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header value {value}"))
}

fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content).with_header(content_type_header(guess_content_type(path))?);
    request.respond(response)?;
    Ok(())
}

fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content).with_header(content_type_header("text/html; charset=utf-8")?);
    request.respond(response)?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    const BODY: &str = "404 Not Found";
    let response = Response::new(
        StatusCode(404),
        vec![content_type_header("text/plain; charset=utf-8")?],
        Cursor::new(BODY),
        Some(BODY.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

// ============================================================================
// Directory Listing
// ============================================================================

/// HTML listing of directories and `.html` pages, hidden entries excluded.
fn generate_directory_listing(dir_path: &Path, request_path: &str) -> std::io::Result<String> {
    let mut entries: Vec<_> = fs::read_dir(dir_path)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            (!name.starts_with('.') && (is_dir || name.ends_with(".html"))).then_some((name, is_dir))
        })
        .collect();
    entries.sort();

    let items: Vec<_> = entries
        .iter()
        .map(|(name, is_dir)| {
            let icon = if *is_dir { "📁" } else { "📄" };
            let href = if request_path.is_empty() {
                format!("/{name}")
            } else {
                format!("/{request_path}/{name}")
            };
            format!(r#"<li><span class="icon">{icon}</span><a href="{href}">{name}</a></li>"#)
        })
        .collect();

    let parent_link = if request_path.is_empty() {
        String::new()
    } else {
        let parent = Path::new(request_path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(r#"<li class="parent"><span class="icon">📂</span><a href="/{parent}">..</a></li>"#)
    };

    #[allow(clippy::literal_string_with_formatting_args)]
    // These are template placeholders, not format args
    Ok(DIRECTORY_TEMPLATE
        .replace("{path}", request_path)
        .replace("{parent_link}", &parent_link)
        .replace("{entries}", &items.join("\n    ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("posts")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("posts/hello.html"), "hello").unwrap();
        fs::write(root.join("docs/index.html"), "docs").unwrap();
        dir
    }

    #[test]
    fn test_resolve() {
        let dir = site();
        let root = dir.path();

        assert_eq!(resolve(root, "/"), Resolved::File(root.join("index.html")));
        assert_eq!(resolve(root, "/posts/hello.html"), Resolved::File(root.join("posts/hello.html")));
        assert_eq!(resolve(root, "/posts/hello"), Resolved::File(root.join("posts/hello.html")));
        assert_eq!(resolve(root, "/docs/?t=1"), Resolved::File(root.join("docs/index.html")));
        assert_eq!(resolve(root, "/posts"), Resolved::Listing(root.join("posts")));
        assert_eq!(resolve(root, "/missing"), Resolved::NotFound);
        assert_eq!(resolve(root, "/../secret"), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_decodes_url() {
        let dir = site();
        fs::write(dir.path().join("my page.html"), "x").unwrap();
        assert_eq!(
            resolve(dir.path(), "/my%20page.html"),
            Resolved::File(dir.path().join("my page.html"))
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("a.woff2")), "font/woff2");
        assert_eq!(guess_content_type(Path::new("a.bin")), "application/octet-stream");
    }

    #[test]
    fn test_directory_listing() {
        let dir = site();
        fs::write(dir.path().join("posts/.hidden.html"), "").unwrap();
        fs::write(dir.path().join("posts/data.json"), "").unwrap();

        let html = generate_directory_listing(&dir.path().join("posts"), "posts").unwrap();

        assert!(html.contains("Index of /posts"));
        assert!(html.contains(r#"<a href="/posts/hello.html">hello.html</a>"#));
        assert!(html.contains(r#"<a href="/">..</a>"#));
        assert!(!html.contains(".hidden"));
        assert!(!html.contains("data.json"));
    }
}
