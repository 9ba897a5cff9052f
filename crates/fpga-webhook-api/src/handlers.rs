//! Webhook and registry-sync handlers.
//!
//! Admission answers are AdmissionReview documents; registry-sync answers
//! use the `{success, data, error}` envelope.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use fpga_core::naming::virtual_resource_name;
use fpga_core::{AcceleratorFunction, FpgaRegion, Mode};
use fpga_patcher::PatcherError;
use fpga_patcher::admission::{self, AdmissionReview};
use tracing::{info, warn};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// What a virtual resource resolves to after registration.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Registration {
    pub namespace: String,
    pub resource: String,
    pub resolves_to: String,
    pub mode: Mode,
}

fn registration(state: &ApiState, ns: &str, name: &str) -> Option<Registration> {
    let resource = virtual_resource_name(name);
    let (resolves_to, mode) = state.manager.patcher(ns).resolve(&resource)?;
    Some(Registration {
        namespace: ns.to_string(),
        resource,
        resolves_to,
        mode,
    })
}

// ── Admission ──────────────────────────────────────────────────

/// POST /pods
pub async fn admit_pod(
    State(state): State<ApiState>,
    Json(review): Json<AdmissionReview>,
) -> Json<AdmissionReview> {
    Json(admission::review(&state.manager, review))
}

// ── Accelerator functions ──────────────────────────────────────

/// PUT /api/v1/namespaces/:ns/acceleratorfunctions/:name
pub async fn put_function(
    State(state): State<ApiState>,
    Path((ns, name)): Path<(String, String)>,
    Json(mut function): Json<AcceleratorFunction>,
) -> impl IntoResponse {
    function.metadata.name = Some(name.clone());
    function.metadata.namespace = Some(ns.clone());

    match state.manager.patcher(&ns).add_function(&function) {
        Ok(()) => {
            info!(%ns, %name, mode = %function.spec.mode, "accelerator function synced");
            match registration(&state, &ns, &name) {
                Some(reg) => ApiResponse::ok(reg).into_response(),
                // Removed concurrently between add and lookup.
                None => error_response("function not found", StatusCode::NOT_FOUND).into_response(),
            }
        }
        Err(e @ PatcherError::DeviceTypeResolution { .. }) => {
            warn!(%ns, %name, error = %e, "accelerator function rejected");
            error_response(&e.to_string(), StatusCode::UNPROCESSABLE_ENTITY).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /api/v1/namespaces/:ns/acceleratorfunctions/:name
pub async fn delete_function(
    State(state): State<ApiState>,
    Path((ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    state.manager.patcher(&ns).remove_function(&name);
    info!(%ns, %name, "accelerator function unsynced");
    ApiResponse::ok("deleted")
}

// ── Regions ────────────────────────────────────────────────────

/// PUT /api/v1/namespaces/:ns/fpgaregions/:name
pub async fn put_region(
    State(state): State<ApiState>,
    Path((ns, name)): Path<(String, String)>,
    Json(mut region): Json<FpgaRegion>,
) -> impl IntoResponse {
    region.metadata.name = Some(name.clone());
    region.metadata.namespace = Some(ns.clone());

    state.manager.patcher(&ns).add_region(&region);
    info!(%ns, %name, "fpga region synced");
    match registration(&state, &ns, &name) {
        Some(reg) => ApiResponse::ok(reg).into_response(),
        None => error_response("region not found", StatusCode::NOT_FOUND).into_response(),
    }
}

/// DELETE /api/v1/namespaces/:ns/fpgaregions/:name
pub async fn delete_region(
    State(state): State<ApiState>,
    Path((ns, name)): Path<(String, String)>,
) -> impl IntoResponse {
    state.manager.patcher(&ns).remove_region(&name);
    info!(%ns, %name, "fpga region unsynced");
    ApiResponse::ok("deleted")
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
