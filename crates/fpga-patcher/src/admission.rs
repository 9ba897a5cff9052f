//! `admission.k8s.io/v1` AdmissionReview handling for pods.
//!
//! Only the fields the pod mutator needs are modelled. The review is
//! fail-closed: anything that cannot be patched is denied.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::manager::PatcherManager;

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_KIND: &str = "AdmissionReview";
pub const PATCH_TYPE_JSON: &str = "JSONPatch";

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_FORBIDDEN: u16 = 403;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupVersionResource {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn pods() -> Self {
        Self {
            group: String::new(),
            version: "v1".to_string(),
            resource: "pods".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub resource: GroupVersionResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
    /// Base64 of the JSON Patch document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl AdmissionResponse {
    pub fn allowed(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: true,
            status: None,
            patch_type: None,
            patch: None,
        }
    }

    pub fn denied(uid: &str, code: u16, message: String) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: false,
            status: Some(Status { code, message }),
            patch_type: None,
            patch: None,
        }
    }

    fn patched(uid: &str, patch: &[u8]) -> Self {
        Self {
            patch_type: Some(PATCH_TYPE_JSON.to_string()),
            patch: Some(STANDARD.encode(patch)),
            ..Self::allowed(uid)
        }
    }
}

impl AdmissionReview {
    pub fn from_response(response: AdmissionResponse) -> Self {
        Self {
            api_version: ADMISSION_API_VERSION.to_string(),
            kind: ADMISSION_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// Answer an AdmissionReview for a pod.
pub fn review(manager: &PatcherManager, review: AdmissionReview) -> AdmissionReview {
    let Some(request) = review.request else {
        warn!("admission review without request");
        return AdmissionReview::from_response(AdmissionResponse::denied(
            "",
            STATUS_BAD_REQUEST,
            "admission review carries no request".to_string(),
        ));
    };
    AdmissionReview::from_response(mutate(manager, &request))
}

fn mutate(manager: &PatcherManager, request: &AdmissionRequest) -> AdmissionResponse {
    let uid = request.uid.as_str();

    if request.resource != GroupVersionResource::pods() {
        warn!(%uid, resource = ?request.resource, "unexpected resource type");
        return AdmissionResponse::denied(
            uid,
            STATUS_BAD_REQUEST,
            format!("unexpected resource type {:?}", request.resource),
        );
    }

    let pod: Pod = match request.object.clone().map(serde_json::from_value).transpose() {
        Ok(Some(pod)) => pod,
        Ok(None) => {
            return AdmissionResponse::denied(uid, STATUS_BAD_REQUEST, "request carries no pod".to_string());
        }
        Err(e) => {
            warn!(%uid, error = %e, "unable to decode pod");
            return AdmissionResponse::denied(uid, STATUS_BAD_REQUEST, format!("unable to decode pod: {e}"));
        }
    };

    let namespace = request
        .namespace
        .as_deref()
        .or(pod.metadata.namespace.as_deref())
        .unwrap_or("default");

    let patch = match manager.mutate_pod(namespace, &pod) {
        Ok(patch) => patch,
        Err(e) => {
            warn!(%uid, %namespace, error = %e, "pod denied");
            return AdmissionResponse::denied(uid, STATUS_FORBIDDEN, e.to_string());
        }
    };

    if patch.0.is_empty() {
        return AdmissionResponse::allowed(uid);
    }

    match serde_json::to_vec(&patch) {
        Ok(bytes) => {
            info!(%uid, %namespace, ops = patch.0.len(), "pod patched");
            AdmissionResponse::patched(uid, &bytes)
        }
        Err(e) => AdmissionResponse::denied(uid, STATUS_FORBIDDEN, format!("unable to serialize patch: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpga_core::FpgaRegion;
    use serde_json::json;

    const INTERFACE_ID: &str = "ce48969398f05f33946d560708be108a";

    fn manager() -> PatcherManager {
        let manager = PatcherManager::new();
        manager
            .patcher("default")
            .add_region(&FpgaRegion::new("arria10", INTERFACE_ID));
        manager
    }

    fn pod_review(resource_name: &str) -> AdmissionReview {
        serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "namespace": "default",
                "operation": "CREATE",
                "object": {
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "test"},
                    "spec": {
                        "containers": [{
                            "name": "c",
                            "image": "busybox",
                            "resources": {
                                "limits": {resource_name: "1"},
                                "requests": {resource_name: "1"}
                            }
                        }]
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn mapped_resource_is_patched() {
        let out = review(&manager(), pod_review("fpga.intel.com/arria10"));
        let response = out.response.unwrap();
        assert!(response.allowed);
        assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(response.patch_type.as_deref(), Some("JSONPatch"));

        let patch: Value = serde_json::from_slice(&STANDARD.decode(response.patch.unwrap()).unwrap()).unwrap();
        assert_eq!(patch.as_array().unwrap().len(), 4);
        assert_eq!(
            patch[2]["path"],
            format!("/spec/containers/0/resources/limits/fpga.intel.com~1region-{INTERFACE_ID}")
        );
    }

    #[test]
    fn unknown_resource_is_denied() {
        let response = review(&manager(), pod_review("fpga.intel.com/unknown-resource"))
            .response
            .unwrap();
        assert!(!response.allowed);
        assert!(response.patch.is_none());
        let status = response.status.unwrap();
        assert_eq!(status.code, 403);
        assert!(status.message.contains("no such resource"));
    }

    #[test]
    fn untouched_pod_is_allowed_without_patch() {
        let response = review(&manager(), pod_review("cpu")).response.unwrap();
        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[test]
    fn other_resources_are_rejected() {
        let mut input = pod_review("fpga.intel.com/arria10");
        input.request.as_mut().unwrap().resource.resource = "deployments".to_string();
        let response = review(&manager(), input).response.unwrap();
        assert!(!response.allowed);
        assert_eq!(response.status.unwrap().code, 400);
    }

    #[test]
    fn missing_request_is_rejected() {
        let input = AdmissionReview {
            api_version: ADMISSION_API_VERSION.to_string(),
            kind: ADMISSION_KIND.to_string(),
            request: None,
            response: None,
        };
        let response = review(&manager(), input).response.unwrap();
        assert!(!response.allowed);
    }

    #[test]
    fn response_wire_format() {
        let out = AdmissionReview::from_response(AdmissionResponse::allowed("abc"));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({
                "apiVersion": "admission.k8s.io/v1",
                "kind": "AdmissionReview",
                "response": {"uid": "abc", "allowed": true}
            })
        );
    }
}
