//! HTTP server rendering every view on request

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::generator::Generator;
use crate::sitemap::SitemapEntry;
use crate::GhostFront;

/// Server state
struct ServerState {
    generator: Generator,
}

/// Build the router for a site
pub fn router(site: &GhostFront) -> Result<Router> {
    let state = Arc::new(ServerState {
        generator: Generator::new(site)?,
    });

    Ok(Router::new()
        .route("/", get(index_handler))
        .route("/posts/:slug", get(post_handler))
        .route("/page/:slug", get(page_handler))
        .route("/tag/:slug", get(tag_handler))
        .route("/sitemap.xml", get(sitemap_xml_handler))
        .route("/api/__sitemap__/urls", get(sitemap_urls_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the server
pub async fn start(site: &GhostFront, ip: &str, port: u16) -> Result<()> {
    let app = router(site)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.generator.render_index().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_error(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    let rendered = state.generator.render_post(&slug).await;
    respond(&state, rendered, uri.path()).await
}

async fn page_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    let rendered = state.generator.render_page(&slug).await;
    respond(&state, rendered, uri.path()).await
}

async fn tag_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    let rendered = state.generator.render_tag(&slug).await;
    respond(&state, rendered, uri.path()).await
}

async fn sitemap_xml_handler(State(state): State<Arc<ServerState>>) -> Response {
    let xml = state.generator.render_sitemap().await;
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

async fn sitemap_urls_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<SitemapEntry>> {
    Json(state.generator.sitemap_entries().await)
}

async fn fallback_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    not_found(&state, uri.path()).await
}

async fn respond(state: &ServerState, rendered: Result<Option<String>>, path: &str) -> Response {
    match rendered {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(state, path).await,
        Err(e) => render_error(e),
    }
}

async fn not_found(state: &ServerState, path: &str) -> Response {
    match state.generator.render_not_found(path).await {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => render_error(e),
    }
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Render failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
