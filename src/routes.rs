// Router assembly: public endpoints, JWT-protected API, global layers

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::resources::{ResourceDef, RESOURCES};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(currency_routes())
        .merge(resource_routes())
        .merge(workflow_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected)
        .fallback(route_not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(protected::auth::whoami))
}

fn currency_routes() -> Router<AppState> {
    use protected::currency;

    Router::new()
        .route("/api/currency/rates", get(currency::rates))
        .route("/api/currency/convert", post(currency::convert))
}

/// list/create on the collection, get/update/delete on the record
fn resource_routes() -> Router<AppState> {
    RESOURCES
        .iter()
        .copied()
        .fold(Router::new(), |router, def| router.merge(resource_router(def)))
}

fn resource_router(def: &'static ResourceDef) -> Router<AppState> {
    use protected::resources;

    let mut record: MethodRouter<AppState> = get(resources::get).patch(resources::update).put(resources::update);
    if def.allow_delete {
        record = record.delete(resources::delete);
    }

    Router::new()
        .route(&format!("/api/{}", def.segment), get(resources::list).post(resources::create))
        .route(&format!("/api/{}/:id", def.segment), record)
        .layer(Extension(def))
}

fn workflow_routes() -> Router<AppState> {
    use protected::{integrations, invoices, leave, probations, reconciliations, referrals};

    Router::new()
        // Reconciliation
        .route("/api/reconciliations/:id/summary", get(reconciliations::summary))
        .route("/api/reconciliations/:id/auto-match", post(reconciliations::auto_match))
        .route("/api/reconciliations/:id/match", post(reconciliations::manual_match))
        .route("/api/reconciliations/:id/unmatch", post(reconciliations::unmatch))
        .route("/api/reconciliations/:id/complete", post(reconciliations::complete))
        .route("/api/reconciliations/:id/cancel", post(reconciliations::cancel))
        // Leave
        .route("/api/leave-requests/:id/approve", post(leave::approve))
        .route("/api/leave-requests/:id/reject", post(leave::reject))
        .route("/api/leave-requests/:id/cancel", post(leave::cancel))
        .route("/api/leave-balances/:id/summary", get(leave::balance))
        // Probation
        .route("/api/probations/:id/extend", post(probations::extend))
        .route("/api/probations/:id/complete", post(probations::complete))
        // Invoices
        .route("/api/invoices/:id/send", post(invoices::send))
        .route("/api/invoices/:id/payments", post(invoices::record_payment))
        .route("/api/invoices/:id/void", post(invoices::void))
        // Referrals
        .route("/api/referrals/:id/accept", post(referrals::accept))
        .route("/api/referrals/:id/decline", post(referrals::decline))
        .route("/api/referrals/:id/mark-paid", post(referrals::mark_paid))
        // Integrations
        .route("/api/integrations/:id/connect", post(integrations::connect))
        .route("/api/integrations/:id/callback", post(integrations::callback))
        .route("/api/integrations/:id/disconnect", post(integrations::disconnect))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
