//! # parcelbase-rest
//!
//! The real backend client: [`RestStore`] speaks the platform's REST data
//! API (`/rest/v1/<table>` with `field=eq.value`-style filters) and
//! [`RestBlobStore`] its object storage API (`/storage/v1/object/...`).
//!
//! Every response is mapped onto the shared error taxonomy so the resilience
//! layer can classify it: 401/403 become `PermissionDenied`, 404/406 become
//! `NotFound`, client timeouts become `Timeout`, connection failures become
//! `Network`, anything else `Storage`.

pub mod blob;
pub mod store;

pub use blob::RestBlobStore;
pub use store::RestStore;

use parcelbase_core::CoreError;

/// Identifies this client to the backend.
const CLIENT_INFO: &str = "parcelbase/0.1.0";

fn transport_error(error: &reqwest::Error) -> CoreError {
    if error.is_timeout() {
        CoreError::timeout("request timed out")
    } else if error.is_connect() {
        CoreError::network(error.to_string())
    } else {
        CoreError::network(error.to_string())
    }
}

fn auth_headers(api_key: &str) -> Result<reqwest::header::HeaderMap, CoreError> {
    use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

    let mut headers = HeaderMap::new();
    let key_value = HeaderValue::from_str(api_key)
        .map_err(|_| CoreError::configuration("api key contains invalid header characters"))?;
    headers.insert("apikey", key_value);
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| CoreError::configuration("api key contains invalid header characters"))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert("x-client-info", HeaderValue::from_static(CLIENT_INFO));
    Ok(headers)
}
