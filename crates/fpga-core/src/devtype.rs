//! Device-type resolution for accelerator functions.
//!
//! Extended resource names are limited to 63 characters after the
//! namespace, too short for a 32-character interface id plus a 32-character
//! AFU id. The device type keeps the first three characters of each id for
//! readability and appends the unpadded URL-safe base64 of both decoded
//! ids, interface bytes first.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

const ID_PREFIX_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum DevTypeError {
    #[error("failed to decode {id:?}: {source}")]
    InvalidHex {
        id: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("id {0:?} is shorter than 3 characters")]
    TooShort(String),
}

fn decode_id(id: &str) -> Result<Vec<u8>, DevTypeError> {
    if id.len() < ID_PREFIX_LEN {
        return Err(DevTypeError::TooShort(id.to_string()));
    }
    hex::decode(id).map_err(|source| DevTypeError::InvalidHex {
        id: id.to_string(),
        source,
    })
}

/// Device type the FPGA plugin advertises for an AFU, without namespace.
pub fn afu_dev_type(interface_id: &str, afu_id: &str) -> Result<String, DevTypeError> {
    let interface = decode_id(interface_id)?;
    let afu = decode_id(afu_id)?;

    Ok(format!(
        "af-{}.{}.{}",
        &interface_id[..ID_PREFIX_LEN],
        &afu_id[..ID_PREFIX_LEN],
        URL_SAFE_NO_PAD.encode([interface, afu].concat())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_dev_types() {
        assert_eq!(
            afu_dev_type("bfac4d851ee856fe8c95865ce1bbaa2d", "f7df405cbd7acf7222f144b0b93acd18")
                .unwrap(),
            "af-bfa.f7d.v6xNhR7oVv6MlYZc4buqLfffQFy9es9yIvFEsLk6zRg"
        );
        assert_eq!(
            afu_dev_type("69528db6eb31577a8c3668f9faa081f6", "d8424dc4a4a3c413f89e433683f9040b")
                .unwrap(),
            "af-695.d84.aVKNtusxV3qMNmj5-qCB9thCTcSko8QT-J5DNoP5BAs"
        );
        assert_eq!(
            afu_dev_type("ce48969398f05f33946d560708be108a", "f7df405cbd7acf7222f144b0b93acd18")
                .unwrap(),
            "af-ce4.f7d.zkiWk5jwXzOUbVYHCL4QivffQFy9es9yIvFEsLk6zRg"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let a = afu_dev_type("ce48969398f05f33946d560708be108a", "f7df405cbd7acf7222f144b0b93acd18");
        let b = afu_dev_type("ce48969398f05f33946d560708be108a", "f7df405cbd7acf7222f144b0b93acd18");
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn dev_type_fits_resource_name_limit() {
        let dev_type =
            afu_dev_type("ce48969398f05f33946d560708be108a", "f7df405cbd7acf7222f144b0b93acd18")
                .unwrap();
        assert!(dev_type.len() <= 63);
    }

    #[test]
    fn invalid_hex_fails() {
        let err = afu_dev_type("not-hex", "f7df405cbd7acf7222f144b0b93acd18").unwrap_err();
        assert!(matches!(err, DevTypeError::InvalidHex { ref id, .. } if id == "not-hex"));

        let err = afu_dev_type("ce48969398f05f33946d560708be108a", "abc").unwrap_err();
        assert!(matches!(err, DevTypeError::InvalidHex { .. }));
    }

    #[test]
    fn short_id_fails() {
        let err = afu_dev_type("ab", "f7df405cbd7acf7222f144b0b93acd18").unwrap_err();
        assert!(matches!(err, DevTypeError::TooShort(_)));

        let err = afu_dev_type("", "").unwrap_err();
        assert!(matches!(err, DevTypeError::TooShort(_)));

        // Odd length is still reported as too short, not as bad hex.
        let err = afu_dev_type("a", "f7df405cbd7acf7222f144b0b93acd18").unwrap_err();
        assert!(matches!(err, DevTypeError::TooShort(ref id) if id == "a"));
        let err = afu_dev_type("ce48969398f05f33946d560708be108a", "f7").unwrap_err();
        assert!(matches!(err, DevTypeError::TooShort(ref id) if id == "f7"));
    }
}
