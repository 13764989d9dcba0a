//! Signaling room addresses.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

use super::signal::PeerRole;

// ============================================================================
// Constants
// ============================================================================

/// Path segments leading to a signaling room.
const SIGNALING_PATH: [&str; 2] = ["ws", "signaling"];

// ============================================================================
// Functions
// ============================================================================

/// Builds the WebSocket URL of a consultation's signaling room.
///
/// The room lives at `{base}/ws/signaling/{consultation_id}/{role}`. An
/// `http`/`https` base is mapped to `ws`/`wss`; any path on the base is
/// kept as a prefix, query and fragment are dropped.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if the base is not a URL, uses another
/// scheme, or the consultation id is blank.
///
/// # Example
///
/// ```
/// use resilient_channel::{PeerRole, signaling_endpoint};
///
/// let url = signaling_endpoint("https://api.example.com", "c-17", PeerRole::Doctor)?;
/// assert_eq!(url, "wss://api.example.com/ws/signaling/c-17/doctor");
/// # Ok::<(), resilient_channel::Error>(())
/// ```
pub fn signaling_endpoint(base: &str, consultation_id: &str, role: PeerRole) -> Result<String> {
    let mut url = Url::parse(base).map_err(|e| Error::invalid_endpoint(base, e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::invalid_endpoint(
                base,
                format!("unsupported scheme '{other}'"),
            ));
        }
    };

    let consultation_id = consultation_id.trim();
    if consultation_id.is_empty() {
        return Err(Error::invalid_endpoint(base, "consultation id is empty"));
    }

    url.set_scheme(scheme)
        .map_err(|()| Error::invalid_endpoint(base, "cannot switch to a WebSocket scheme"))?;
    url.set_query(None);
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|()| Error::invalid_endpoint(base, "base cannot carry a path"))?
        .pop_if_empty()
        .extend(SIGNALING_PATH)
        .extend([consultation_id, role.as_str()]);

    Ok(url.into())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_maps_to_ws() {
        let url = signaling_endpoint("http://localhost:8000", "42", PeerRole::Patient)
            .expect("valid base");
        assert_eq!(url, "ws://localhost:8000/ws/signaling/42/patient");
    }

    #[test]
    fn test_https_maps_to_wss() {
        let url = signaling_endpoint("https://api.example.com/", "42", PeerRole::Doctor)
            .expect("valid base");
        assert_eq!(url, "wss://api.example.com/ws/signaling/42/doctor");
    }

    #[test]
    fn test_base_path_is_kept_and_query_dropped() {
        let url = signaling_endpoint("wss://example.com/api/?token=x#top", "7", PeerRole::Doctor)
            .expect("valid base");
        assert_eq!(url, "wss://example.com/api/ws/signaling/7/doctor");
    }

    #[test]
    fn test_consultation_id_is_escaped() {
        let url = signaling_endpoint("http://localhost", "a b/c", PeerRole::Patient)
            .expect("valid base");
        assert_eq!(url, "ws://localhost/ws/signaling/a%20b%2Fc/patient");
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = signaling_endpoint("ftp://example.com", "42", PeerRole::Doctor).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_rejects_blank_id() {
        let err = signaling_endpoint("http://localhost", "  ", PeerRole::Doctor).unwrap_err();
        assert!(err.to_string().contains("consultation id is empty"));
    }

    #[test]
    fn test_rejects_malformed_base() {
        let err = signaling_endpoint("localhost:8000", "42", PeerRole::Doctor).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }
}
