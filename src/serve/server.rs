// src/serve/server.rs

//! Minimal HTTP/1.1 preview server.
//!
//! Serves files from the generated site directory, injects the live-reload
//! client into HTML pages and keeps one server-sent-events stream open per
//! browser tab. One request per connection (`Connection: close`), except
//! for the event stream which stays open until the client goes away or the
//! server shuts down.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::serve::reload::LiveReload;

/// Server-sent-events endpoint carrying `reload` and `stream` events.
pub const EVENTS_PATH: &str = "/__sitedag/events";
/// Live-reload client script, injected into every HTML page.
pub const CLIENT_SCRIPT_PATH: &str = "/__sitedag/client.js";

const CLIENT_SCRIPT: &str = include_str!("client.js");
const MAX_HEADER_LINES: usize = 100;

/// Preview server for one site directory.
pub struct PreviewServer {
    site_dir: PathBuf,
    hub: Arc<LiveReload>,
}

struct ServerContext {
    site_dir: PathBuf,
    hub: Arc<LiveReload>,
    body_close: Regex,
}

impl PreviewServer {
    pub fn new(site_dir: impl Into<PathBuf>, hub: Arc<LiveReload>) -> Self {
        Self {
            site_dir: site_dir.into(),
            hub,
        }
    }

    /// Bind `addr` and start serving in the background.
    pub async fn start(self, addr: &str) -> Result<PreviewHandle> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding preview server to {addr}"))?;
        let local_addr = listener.local_addr()?;

        let ctx = Arc::new(ServerContext {
            site_dir: self.site_dir,
            hub: self.hub,
            body_close: Regex::new(r"(?i)</body\s*>")?,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, ctx, shutdown_rx));

        info!(addr = %local_addr, "preview server listening on http://{local_addr}/");

        Ok(PreviewHandle {
            addr: local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Running preview server. Dropping the handle also stops it, but only
/// [`PreviewHandle::shutdown`] waits for the accept loop to finish.
pub struct PreviewHandle {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl PreviewHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Stop accepting connections and close every open event stream.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            warn!("preview server task ended abnormally: {err}");
        }
        info!(addr = %self.addr, "preview server stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ctx = Arc::clone(&ctx);
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &ctx, shutdown).await {
                            debug!(%peer, "preview connection ended: {err:#}");
                        }
                    });
                }
                Err(err) => warn!("failed to accept preview connection: {err}"),
            },
        }
    }
    debug!("preview accept loop finished");
}

async fn handle_connection(
    stream: TcpStream,
    ctx: &ServerContext,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(());
    }
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line.trim_end().is_empty() {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");
    let path = target.split(['?', '#']).next().unwrap_or("/");
    debug!(%method, %path, "preview request");

    if method != "GET" {
        return respond(&mut writer, "405 Method Not Allowed", "text/plain", b"Method Not Allowed")
            .await;
    }

    match path {
        EVENTS_PATH => serve_events(reader, writer, &ctx.hub, shutdown).await,
        CLIENT_SCRIPT_PATH => {
            respond(
                &mut writer,
                "200 OK",
                "application/javascript",
                CLIENT_SCRIPT.as_bytes(),
            )
            .await
        }
        _ => serve_file(&mut writer, ctx, path).await,
    }
}

async fn serve_events<R, W>(
    mut reader: R,
    mut writer: W,
    hub: &LiveReload,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    // Subscribe before answering so nothing sent after the client sees the
    // response head is missed.
    let mut rx = hub.subscribe();
    debug!(clients = hub.client_count(), "preview client connected");

    writer
        .write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/event-stream\r\n\
              Cache-Control: no-cache\r\n\
              Connection: keep-alive\r\n\
              \r\n\
              : connected\n\n",
        )
        .await?;
    writer.flush().await?;

    // Clients never send on an event stream; EOF means the tab went away.
    let mut scratch = [0u8; 64];
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            read = reader.read(&mut scratch) => match read {
                Ok(0) | Err(_) => {
                    debug!("preview client disconnected");
                    break;
                }
                Ok(_) => {}
            },
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    writer.write_all(msg.to_sse().as_bytes()).await?;
                    writer.flush().await?;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "preview client lagged; skipping messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

async fn serve_file<W>(writer: &mut W, ctx: &ServerContext, url_path: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let file = match resolve_path(&ctx.site_dir, url_path) {
        Some(Resolved::File(file)) => file,
        Some(Resolved::AddSlash) => return redirect(writer, &format!("{url_path}/")).await,
        None => return respond(writer, "404 Not Found", "text/plain", b"Not Found").await,
    };

    let body = match tokio::fs::read(&file).await {
        Ok(body) => body,
        Err(err) => {
            debug!(path = ?file, "preview file unreadable: {err}");
            return respond(writer, "404 Not Found", "text/plain", b"Not Found").await;
        }
    };

    let content_type = content_type_for(&file);
    if content_type.starts_with("text/html") {
        let html = inject_client_script(&ctx.body_close, &String::from_utf8_lossy(&body));
        respond(writer, "200 OK", content_type, html.as_bytes()).await
    } else {
        respond(writer, "200 OK", content_type, &body).await
    }
}

async fn respond<W>(writer: &mut W, status: &str, content_type: &str, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

async fn redirect<W>(writer: &mut W, location: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!(
        "HTTP/1.1 301 Moved Permanently\r\n\
         Location: {location}\r\n\
         Content-Length: 0\r\n\
         Connection: close\r\n\
         \r\n"
    );
    writer.write_all(header.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(PathBuf),
    /// A directory with an index, requested without its trailing slash.
    /// Relative links on the page only resolve against the slashed URL.
    AddSlash,
}

/// Map a URL path onto a file below `site_dir`.
///
/// Directories resolve to their `index.html`; extensionless paths fall back
/// to `<path>.html`. Paths escaping `site_dir` resolve to nothing.
fn resolve_path(site_dir: &Path, url_path: &str) -> Option<Resolved> {
    let decoded = percent_decode(url_path)?;

    let mut rel = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let full = site_dir.join(&rel);
    if full.is_dir() {
        let index = full.join("index.html");
        if !index.is_file() {
            return None;
        }
        if !url_path.ends_with('/') && !rel.as_os_str().is_empty() {
            return Some(Resolved::AddSlash);
        }
        return Some(Resolved::File(index));
    }
    if full.is_file() {
        return Some(Resolved::File(full));
    }
    if rel.extension().is_none() && !rel.as_os_str().is_empty() {
        let html = full.with_extension("html");
        return html.is_file().then_some(Resolved::File(html));
    }
    None
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Insert the client script tag before the last `</body>`, or append it
/// when the page has none.
fn inject_client_script(body_close: &Regex, html: &str) -> String {
    let tag = format!("<script src=\"{CLIENT_SCRIPT_PATH}\"></script>");
    match body_close.find_iter(html).last() {
        Some(m) => format!("{}{}{}", &html[..m.start()], tag, &html[m.start()..]),
        None => format!("{html}{tag}"),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "ttf" => "font/ttf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
