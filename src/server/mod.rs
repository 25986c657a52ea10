//! Development server with live reload and periodic regeneration
//!
//! The site is regenerated every `revalidate` seconds and whenever the
//! static directory or `_config.yml` changes. Post pages that were never
//! generated are built on first request: the visitor gets the loading page,
//! which refreshes itself until the post exists.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::generate::repository;
use crate::content::validate_uid;
use crate::generator::{self, GenerateReport, Generator};
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// How the server is started
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub ip: String,
    pub port: u16,
    /// Watch files and push reloads to connected browsers
    pub watch: bool,
    pub open: bool,
    /// Serve content from a fixture file instead of the content API
    pub fixtures: Option<PathBuf>,
}

/// Server state
pub struct ServerState {
    base_dir: PathBuf,
    fixtures: Option<PathBuf>,
    generator: RwLock<Arc<Generator>>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
    /// Post uids currently generated on demand
    in_flight: Mutex<HashSet<String>>,
    /// Post uids the content API does not know, until the next regeneration
    missing: Mutex<HashSet<String>>,
}

impl ServerState {
    /// Build the state for the blog rooted at `blog.base_dir`
    pub fn new(blog: &Blog, fixtures: Option<PathBuf>, live_reload: bool) -> Result<Self> {
        let repo = repository(blog, fixtures.as_deref())?;
        let generator = Generator::new(blog, repo)?;
        let (reload_tx, _) = broadcast::channel::<()>(16);

        Ok(Self {
            base_dir: blog.base_dir.clone(),
            fixtures,
            generator: RwLock::new(Arc::new(generator)),
            reload_tx,
            live_reload,
            in_flight: Mutex::new(HashSet::new()),
            missing: Mutex::new(HashSet::new()),
        })
    }

    async fn generator(&self) -> Arc<Generator> {
        self.generator.read().await.clone()
    }

    /// Reload the configuration, regenerate everything and notify clients
    ///
    /// A fresh repository is built each time so the content API's latest
    /// release is picked up.
    pub async fn regenerate(&self) -> Result<GenerateReport> {
        let blog = Blog::new(&self.base_dir)?;
        let repo = repository(&blog, self.fixtures.as_deref())?;
        let generator = Arc::new(Generator::new(&blog, repo)?);

        let report = generator.generate().await?;

        *self.generator.write().await = generator;
        lock(&self.missing).clear();
        let _ = self.reload_tx.send(());
        Ok(report)
    }
}

/// Recover the guard of a poisoned lock; the sets stay consistent either way
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Build the router serving the public directory
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(blog: &Blog, options: ServerOptions) -> Result<()> {
    let state = Arc::new(ServerState::new(
        blog,
        options.fixtures.clone(),
        options.watch,
    )?);

    // Generate first
    tracing::info!("Generating static files...");
    state.generator().await.generate().await?;

    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if options.ip == "localhost" {
        "127.0.0.1"
    } else {
        options.ip.as_str()
    };
    let addr: SocketAddr = format!("{}:{}", bind_ip, options.port).parse()?;

    let url = format!("http://{}:{}", options.ip, options.port);
    println!("Server running at {}", url);
    if options.watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    // Open browser if requested
    if options.open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let revalidate = blog.config.revalidate;
    if revalidate > 0 {
        tokio::spawn(revalidate_loop(state.clone(), Duration::from_secs(revalidate)));
    }

    // Start file watcher if watch mode is enabled
    if options.watch {
        let watched = vec![blog.static_dir.clone(), blog.config_path()];
        let handle = tokio::runtime::Handle::current();
        let watch_state = state.clone();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_regenerate(watched, watch_state, handle) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Regenerate the site on a fixed period
async fn revalidate_loop(state: Arc<ServerState>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; the site was just generated
    interval.tick().await;

    loop {
        interval.tick().await;
        tracing::info!("Revalidating content...");
        match state.regenerate().await {
            Ok(report) => tracing::info!(
                "Revalidated {} posts in {:.2?}",
                report.posts,
                report.elapsed
            ),
            Err(e) => tracing::error!("Revalidation failed, keeping previous pages: {}", e),
        }
    }
}

/// Watch for file changes and regenerate; blocks the calling thread
fn watch_and_regenerate(
    paths: Vec<PathBuf>,
    state: Arc<ServerState>,
    handle: tokio::runtime::Handle,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    for path in &paths {
        if !path.exists() {
            continue;
        }
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        debouncer.watcher().watch(path, mode)?;
        tracing::debug!("Watching: {:?}", path);
    }

    // Handle file change events
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Filter out irrelevant events (like .git, .DS_Store, etc.)
                let relevant_events: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".git")
                            && !path_str.contains(".DS_Store")
                            && !path_str.ends_with('~')
                    })
                    .collect();

                if relevant_events.is_empty() {
                    continue;
                }

                for event in &relevant_events {
                    tracing::info!("File changed: {}", event.path.display());
                }

                tracing::info!("Regenerating...");
                match handle.block_on(state.regenerate()) {
                    Ok(_) => tracing::info!("Regenerated successfully"),
                    Err(e) => tracing::error!("Generation failed: {}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            // Wait for reload signal
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            // Handle incoming messages (ping/pong)
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Fallback handler that serves files and injects live reload script
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let generator = state.generator().await;
    let public_dir = generator.blog().public_dir.clone();
    let path = request.uri().path();

    if let Some(uid) = post_uid(path) {
        if validate_uid(uid).is_err() {
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }
        if !generator.post_output_path(uid).exists() {
            let uid = uid.to_string();
            return on_demand_post(state, generator, uid);
        }
    }

    // Determine the file path
    let file_path = if path == "/" {
        public_dir.join("index.html")
    } else {
        let clean_path = path.trim_start_matches('/');
        let candidate = public_dir.join(clean_path);

        // If it's a directory, look for index.html
        if candidate.is_dir() {
            candidate.join("index.html")
        } else if candidate.exists() {
            candidate
        } else {
            // Try adding .html extension
            let with_html = public_dir.join(format!("{}.html", clean_path));
            if with_html.exists() {
                with_html
            } else {
                candidate
            }
        }
    };

    // Check if it's an HTML file that needs live reload injection
    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html && state.live_reload {
        // Read and inject live reload script
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => Html(inject_live_reload(&content)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    } else {
        // Serve static file using tower-http
        let mut service = ServeDir::new(&public_dir).append_index_html_on_directories(true);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

/// Answer a request for a post that has not been generated yet
fn on_demand_post(state: Arc<ServerState>, generator: Arc<Generator>, uid: String) -> Response {
    if lock(&state.missing).contains(&uid) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    if lock(&state.in_flight).insert(uid.clone()) {
        tracing::info!("Generating post on demand: {}", uid);
        let task_state = state.clone();
        let task_generator = generator.clone();

        tokio::spawn(async move {
            match task_generator.generate_post(&uid).await {
                Ok(path) => tracing::debug!("Generated on demand: {:?}", path),
                Err(e) if generator::is_not_found(&e) => {
                    tracing::info!("No post with uid {}", uid);
                    lock(&task_state.missing).insert(uid.clone());
                }
                Err(e) => tracing::error!("On-demand generation of {} failed: {}", uid, e),
            }
            lock(&task_state.in_flight).remove(&uid);
        });
    }

    match generator.render_loading() {
        Ok(html) if state.live_reload => Html(inject_live_reload(&html)).into_response(),
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render loading page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// The uid of a `/post/<uid>/` request path
fn post_uid(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/post/")?;
    let uid = rest.strip_suffix("/index.html").unwrap_or(rest);
    let uid = uid.strip_suffix('/').unwrap_or(uid);
    (!uid.is_empty() && !uid.contains('/')).then_some(uid)
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        // If no </body> tag, append to end
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
