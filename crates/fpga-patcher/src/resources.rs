//! Container inspection: governed resource requests and env sanitizing.

use std::collections::BTreeMap;

use fpga_core::naming::{is_governed, is_reserved_env};
use k8s_openapi::api::core::v1::{Container, EnvVar};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::error::{PatcherError, PatcherResult};
use crate::quantity::parse_integral;

/// Env variables of `container` without the ones reserved for the CRI hook.
///
/// Users must not be able to smuggle programming instructions to the hook,
/// so reserved names are dropped before anything is merged back.
pub fn sanitized_env(container: &Container) -> Vec<EnvVar> {
    container
        .env
        .iter()
        .flatten()
        .filter(|var| !is_reserved_env(&var.name))
        .cloned()
        .collect()
}

/// Governed resources requested by `container`, keyed by name.
///
/// Extended resources cannot be overcommitted: every governed name must
/// appear in both `limits` and `requests` with the same whole quantity.
pub fn requested_resources(container: &Container) -> PatcherResult<BTreeMap<String, i64>> {
    let Some(resources) = &container.resources else {
        return Ok(BTreeMap::new());
    };
    let empty = BTreeMap::new();
    let limits = resources.limits.as_ref().unwrap_or(&empty);
    let requests = resources.requests.as_ref().unwrap_or(&empty);

    if let Some(name) = requests
        .keys()
        .find(|name| is_governed(name) && !limits.contains_key(*name))
    {
        return Err(PatcherError::ResourceMismatch(name.clone()));
    }

    let mut requested = BTreeMap::new();
    for (name, limit) in limits.iter().filter(|(name, _)| is_governed(name)) {
        let request = requests
            .get(name)
            .ok_or_else(|| PatcherError::ResourceMismatch(name.clone()))?;

        let limit = whole_quantity(name, limit)?;
        if whole_quantity(name, request)? != limit {
            return Err(PatcherError::ResourceMismatch(name.clone()));
        }
        requested.insert(name.clone(), limit);
    }

    Ok(requested)
}

fn whole_quantity(resource: &str, quantity: &Quantity) -> PatcherResult<i64> {
    parse_integral(&quantity.0).ok_or_else(|| PatcherError::NonIntegralQuantity {
        resource: resource.to_string(),
        quantity: quantity.0.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ResourceRequirements;

    fn container(limits: &[(&str, &str)], requests: &[(&str, &str)]) -> Container {
        let to_map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
                .collect::<BTreeMap<_, _>>()
        };
        Container {
            name: "test".to_string(),
            resources: Some(ResourceRequirements {
                limits: Some(to_map(limits)),
                requests: Some(to_map(requests)),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn env(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn ungoverned_resources_are_ignored() {
        let c = container(
            &[("cpu", "500m"), ("fpga.intel.com/arria10", "1")],
            &[("cpu", "250m"), ("fpga.intel.com/arria10", "1")],
        );
        let requested = requested_resources(&c).unwrap();
        assert_eq!(requested.len(), 1);
        assert_eq!(requested["fpga.intel.com/arria10"], 1);
    }

    #[test]
    fn no_resources_section() {
        let c = Container {
            name: "bare".to_string(),
            ..Default::default()
        };
        assert!(requested_resources(&c).unwrap().is_empty());
    }

    #[test]
    fn equal_quantities_in_different_notation() {
        let c = container(
            &[("fpga.intel.com/arria10", "2")],
            &[("fpga.intel.com/arria10", "2000m")],
        );
        assert_eq!(requested_resources(&c).unwrap()["fpga.intel.com/arria10"], 2);
    }

    #[test]
    fn request_without_limit_fails() {
        let c = container(&[], &[("fpga.intel.com/arria10", "1")]);
        let err = requested_resources(&c).unwrap_err();
        assert!(matches!(err, PatcherError::ResourceMismatch(ref name) if name == "fpga.intel.com/arria10"));
    }

    #[test]
    fn limit_without_request_fails() {
        let c = container(&[("fpga.intel.com/arria10", "1")], &[]);
        assert!(matches!(
            requested_resources(&c),
            Err(PatcherError::ResourceMismatch(_))
        ));
    }

    #[test]
    fn different_quantities_fail() {
        let c = container(
            &[("fpga.intel.com/arria10", "2")],
            &[("fpga.intel.com/arria10", "1")],
        );
        assert!(matches!(
            requested_resources(&c),
            Err(PatcherError::ResourceMismatch(_))
        ));
    }

    #[test]
    fn fractional_quantity_fails() {
        let c = container(
            &[("fpga.intel.com/arria10", "500m")],
            &[("fpga.intel.com/arria10", "500m")],
        );
        let err = requested_resources(&c).unwrap_err();
        assert!(matches!(
            err,
            PatcherError::NonIntegralQuantity { ref quantity, .. } if quantity == "500m"
        ));
    }

    #[test]
    fn reserved_env_is_dropped() {
        let mut c = container(&[], &[]);
        c.env = Some(vec![
            env("FPGA_REGION_1", "smuggled"),
            env("HOME", "/root"),
            env("FPGA_AFU_1", "smuggled"),
            env("LANG", "C"),
        ]);
        let names: Vec<_> = sanitized_env(&c).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["HOME", "LANG"]);
        // The caller's container is untouched.
        assert_eq!(c.env.as_ref().unwrap().len(), 4);
    }
}
