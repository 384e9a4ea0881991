//! HTTP endpoints: OIDC login, launch, health

use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use url::Url;

use crate::{
    Error, LtiTool, Result,
    launch::InboundRequest,
    message::{ContentItem, LaunchMessage, deep_linking::LinkItem},
    router::{RouteParams, RouteTable},
};

/// What a launch route handler receives
pub struct LaunchContext {
    /// The tool that accepted the launch
    pub tool: Arc<LtiTool>,
    /// The validated launch
    pub message: LaunchMessage,
}

/// Routes dispatched on the path of a launch's `target_link_uri`
pub type LaunchRoutes = RouteTable<LaunchContext, Response>;

/// Shared application state
pub struct AppState {
    /// Tool runtime
    pub tool: Arc<LtiTool>,
    /// Post-launch routes
    pub routes: Arc<LaunchRoutes>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/login", get(login_query_handler).post(login_form_handler))
        .route("/launch", post(launch_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "signing_key": state.tool.trust().has_signing_key(),
        "routes": state.routes.len(),
    }))
}

async fn login_query_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    login(&state, jar, params)
}

async fn login_form_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    login(&state, jar, params)
}

fn login(state: &AppState, jar: CookieJar, params: HashMap<String, String>) -> Response {
    let request = InboundRequest::new(params, jar.clone());
    match state.tool.initiate_login(&request) {
        Ok(redirect) => (
            StatusCode::FOUND,
            redirect.apply_cookies(jar),
            [(LOCATION, redirect.location.to_string())],
        )
            .into_response(),
        Err(e @ (Error::Validation(_) | Error::Config(_))) => {
            warn!(error = %e, "OIDC login rejected");
            (
                StatusCode::BAD_REQUEST,
                format!("OIDC login validation failure: {e}"),
            )
                .into_response()
        }
        Err(e) => (e.status_code(), e.to_string()).into_response(),
    }
}

async fn launch_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let request = InboundRequest::new(params, jar);
    let message = match state.tool.accept_launch(&request).await {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Launch rejected");
            return (e.status_code(), e.to_string()).into_response();
        }
    };

    let path = message
        .target_link_uri
        .as_deref()
        .and_then(|uri| Url::parse(uri).ok())
        .map(|url| url.path().to_string())
        .unwrap_or_default();

    let ctx = LaunchContext {
        tool: Arc::clone(&state.tool),
        message,
    };

    state
        .routes
        .dispatch(&path, &ctx)
        .unwrap_or_else(|| Json(&ctx.message).into_response())
}

/// Routes served by the bundled demo tool
pub fn demo_routes() -> Result<LaunchRoutes> {
    let mut routes = LaunchRoutes::new();
    routes.define_route("/deep-link", deep_link_picker)?;
    routes.define_route("/assignments/:assignment_id", assignment_page)?;
    Ok(routes)
}

fn assignment_page(ctx: &LaunchContext, params: Option<RouteParams>) -> Response {
    let assignment = params
        .as_ref()
        .and_then(|p| p.get("assignment_id"))
        .map_or("unknown", String::as_str);
    Json(json!({
        "assignment": assignment,
        "user": ctx.message.subject(),
        "roles": ctx.message.roles,
        "grade_services": ctx.message.ags_endpoint.is_some(),
        "line_item": ctx
            .tool
            .ags(&ctx.message)
            .ok()
            .and_then(|ags| ags.line_item_url().map(str::to_string)),
        "roster": ctx.message.nrps_endpoint.is_some(),
    }))
    .into_response()
}

fn deep_link_picker(ctx: &LaunchContext, _params: Option<RouteParams>) -> Response {
    let item = ContentItem::Link(LinkItem {
        url: ctx.tool.config().launch_url.clone(),
        title: Some("LTI tool".to_string()),
        ..LinkItem::default()
    });

    match ctx
        .tool
        .deep_linking_response_html(&ctx.message, vec![item])
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(error = %e, "Deep linking response failed");
            (e.status_code(), e.to_string()).into_response()
        }
    }
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(tool: Arc<LtiTool>, routes: LaunchRoutes) -> Result<()> {
    let addr = format!("{}:{}", tool.config().server.host, tool.config().server.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, routes = routes.len(), "LTI tool listening");

    let app = create_router(Arc::new(AppState {
        tool,
        routes: Arc::new(routes),
    }));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
