//! Signaling message types.
//!
//! Messages exchanged through the signaling relay while two peers negotiate
//! a call. The relay forwards every message to the other peer in the room
//! and announces arrivals on its own.
//!
//! # Format
//!
//! ```json
//! { "type": "offer", "sdp": "v=0..." }
//! { "type": "ice-candidate", "candidate": { "candidate": "...", "sdpMid": "0", "sdpMLineIndex": 0 } }
//! { "type": "user-joined", "userType": "doctor", "totalUsers": 2 }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::Payload;

// ============================================================================
// PeerRole
// ============================================================================

/// Which side of a consultation a peer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    /// The consulting doctor.
    Doctor,
    /// The patient.
    Patient,
}

impl PeerRole {
    /// Returns the role as used in URLs and messages.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
        }
    }

    /// Returns the role on the other side of the call.
    #[inline]
    #[must_use]
    pub const fn counterpart(&self) -> Self {
        match self {
            Self::Doctor => Self::Patient,
            Self::Patient => Self::Doctor,
        }
    }
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeerRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "doctor" => Ok(Self::Doctor),
            "patient" => Ok(Self::Patient),
            other => Err(Error::config(format!(
                "unknown peer role '{other}', expected doctor or patient"
            ))),
        }
    }
}

// ============================================================================
// IceCandidate
// ============================================================================

/// ICE candidate as produced by the browser's `RTCIceCandidate.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// Candidate line.
    pub candidate: String,

    /// Media stream identification tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    /// Index of the media description.
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
}

// ============================================================================
// SignalMessage
// ============================================================================

/// A message on the signaling channel, keyed by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// Session description offer.
    Offer {
        /// SDP text.
        sdp: String,
    },

    /// Session description answer.
    Answer {
        /// SDP text.
        sdp: String,
    },

    /// Trickled ICE candidate.
    IceCandidate {
        /// The candidate.
        candidate: IceCandidate,
    },

    /// Relay announcement: a peer entered the room.
    #[serde(rename_all = "camelCase")]
    UserJoined {
        /// Role of the peer that joined.
        user_type: PeerRole,
        /// Peers now in the room.
        total_users: u32,
    },

    /// Relay announcement: a peer left the room.
    #[serde(rename_all = "camelCase")]
    UserLeft {
        /// Role of the peer that left.
        user_type: PeerRole,
    },
}

impl SignalMessage {
    /// Parses a signaling message from an inbound payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload is not a known message.
    pub fn from_payload(payload: &Payload) -> Result<Self> {
        let message = match payload {
            Payload::Text(text) => serde_json::from_str(text)?,
            Payload::Binary(bytes) => serde_json::from_slice(bytes)?,
        };
        Ok(message)
    }

    /// Returns the wire `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
        }
    }

    /// Returns `true` for messages sent by the relay itself.
    #[inline]
    #[must_use]
    pub const fn is_presence(&self) -> bool {
        matches!(self, Self::UserJoined { .. } | Self::UserLeft { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_offer_wire_format() {
        let message = SignalMessage::Offer { sdp: "v=0".into() };
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value, json!({ "type": "offer", "sdp": "v=0" }));
    }

    #[test]
    fn test_ice_candidate_wire_format() {
        let message = SignalMessage::IceCandidate {
            candidate: IceCandidate {
                candidate: "candidate:1 1 udp 2122260223 10.0.0.2 54321 typ host".into(),
                sdp_mid: Some("0".into()),
                sdp_m_line_index: Some(0),
            },
        };
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "ice-candidate",
                "candidate": {
                    "candidate": "candidate:1 1 udp 2122260223 10.0.0.2 54321 typ host",
                    "sdpMid": "0",
                    "sdpMLineIndex": 0
                }
            })
        );
    }

    #[test]
    fn test_ice_candidate_optional_fields() {
        let payload = Payload::from(r#"{"type":"ice-candidate","candidate":{"candidate":"c"}}"#);
        let message = SignalMessage::from_payload(&payload).expect("parse");
        assert_eq!(
            message,
            SignalMessage::IceCandidate {
                candidate: IceCandidate {
                    candidate: "c".into(),
                    sdp_mid: None,
                    sdp_m_line_index: None,
                }
            }
        );
    }

    #[test]
    fn test_parse_relay_announcement() {
        let payload = Payload::from(r#"{"type":"user-joined","userType":"patient","totalUsers":2}"#);
        let message = SignalMessage::from_payload(&payload).expect("parse");

        assert_eq!(
            message,
            SignalMessage::UserJoined {
                user_type: PeerRole::Patient,
                total_users: 2
            }
        );
        assert!(message.is_presence());
        assert_eq!(message.kind(), "user-joined");
    }

    #[test]
    fn test_parse_binary_frame() {
        let payload = Payload::Binary(br#"{"type":"answer","sdp":"v=0"}"#.to_vec());
        let message = SignalMessage::from_payload(&payload).expect("parse");
        assert_eq!(message, SignalMessage::Answer { sdp: "v=0".into() });
        assert!(!message.is_presence());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let payload = Payload::from(r#"{"type":"hang-up"}"#);
        let err = SignalMessage::from_payload(&payload).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_peer_role_round_trips_through_str() {
        assert_eq!("doctor".parse::<PeerRole>().ok(), Some(PeerRole::Doctor));
        assert_eq!(PeerRole::Patient.to_string(), "patient");
        assert_eq!(PeerRole::Doctor.counterpart(), PeerRole::Patient);
        assert!("nurse".parse::<PeerRole>().is_err());
    }
}
