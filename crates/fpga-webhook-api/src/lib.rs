//! fpga-webhook-api — HTTP surface of the FPGA admission webhook.
//!
//! Serves pod admission reviews and lets reconcilers (or an operator)
//! register and unregister functions and regions per namespace.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/pods` | AdmissionReview for pods (fail-closed) |
//! | PUT | `/api/v1/namespaces/:ns/acceleratorfunctions/:name` | Register/update a function |
//! | DELETE | `/api/v1/namespaces/:ns/acceleratorfunctions/:name` | Unregister a function |
//! | PUT | `/api/v1/namespaces/:ns/fpgaregions/:name` | Register/update a region |
//! | DELETE | `/api/v1/namespaces/:ns/fpgaregions/:name` | Unregister a region |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use fpga_patcher::PatcherManager;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<PatcherManager>,
}

/// Build the complete webhook router.
pub fn build_router(manager: Arc<PatcherManager>) -> Router {
    let state = ApiState { manager };

    let registry_routes = Router::new()
        .route(
            "/namespaces/{ns}/acceleratorfunctions/{name}",
            put(handlers::put_function).delete(handlers::delete_function),
        )
        .route(
            "/namespaces/{ns}/fpgaregions/{name}",
            put(handlers::put_region).delete(handlers::delete_region),
        )
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", registry_routes)
        .route("/pods", post(handlers::admit_pod).with_state(state))
        .route("/healthz", get(handlers::healthz))
}
