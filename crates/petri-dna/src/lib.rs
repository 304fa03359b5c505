//! Compact, shareable encoding of a simulation setup.
//!
//! A [`PatternDescriptor`] captures the active model, its parameter map,
//! the initial condition, and an optional keyframe list. [`encode`] packs
//! it into a URL-safe token (compact JSON with single-letter keys,
//! base64url without padding); [`decode`] reverses it. Decode failures are
//! recoverable: callers treat them as "no descriptor present".
//!
//! # Example
//!
//! ```
//! use petri_core::{InitialCondition, ReactionModel};
//! use petri_dna::{PatternDescriptor, decode, encode};
//!
//! let descriptor = PatternDescriptor {
//!     model: ReactionModel::Schnakenberg,
//!     params: ReactionModel::Schnakenberg.defaults(),
//!     initial_condition: InitialCondition::Noise,
//!     keyframes: Vec::new(),
//! };
//! let token = encode(&descriptor);
//! assert_eq!(decode(&token).unwrap().model, ReactionModel::Schnakenberg);
//! ```

mod timeline;

pub use timeline::{Easing, Keyframe, interpolate};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use petri_core::{InitialCondition, ModelParams, ReactionModel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`decode`]. Never fatal to the caller: fall back to the
/// default state on any of these.
#[derive(Debug, Error)]
pub enum DnaError {
    /// Token is not valid base64url.
    #[error("descriptor token is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not the expected JSON shape.
    #[error("descriptor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Everything needed to reproduce a configuration (not the grid contents).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDescriptor {
    /// Active reaction model.
    pub model: ReactionModel,
    /// Parameter map for that model.
    pub params: ModelParams,
    /// Initial condition the grid was seeded with.
    pub initial_condition: InitialCondition,
    /// Optional parameter trajectory.
    pub keyframes: Vec<Keyframe>,
}

/// Wire form: single-letter keys keep tokens short, and models and
/// initial conditions travel as small integers from the fixed id tables.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    m: u8,
    p: ModelParams,
    ic: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    kf: Option<Vec<KeyframePayload>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyframePayload {
    t: f32,
    m: u8,
    p: ModelParams,
    e: u8,
}

/// Serializes a descriptor to a URL-safe token.
pub fn encode(descriptor: &PatternDescriptor) -> String {
    let payload = Payload {
        m: descriptor.model.id(),
        p: descriptor.params.clone(),
        ic: descriptor.initial_condition.id(),
        kf: if descriptor.keyframes.is_empty() {
            None
        } else {
            Some(
                descriptor
                    .keyframes
                    .iter()
                    .map(|kf| KeyframePayload {
                        t: (kf.time * 100.0).round() / 100.0,
                        m: kf.model.id(),
                        p: kf.params.clone(),
                        e: match kf.easing {
                            Easing::EaseInOut => 1,
                            Easing::Linear => 0,
                        },
                    })
                    .collect(),
            )
        },
    };

    // Payload serialization cannot fail: the tree is plain maps and numbers.
    let json = serde_json::to_vec(&payload).expect("descriptor payload is always serializable");
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a token back into a descriptor.
///
/// Unknown model or initial-condition ids fall back to the defaults;
/// structurally broken tokens are an error the caller should log and
/// ignore.
pub fn decode(token: &str) -> Result<PatternDescriptor, DnaError> {
    let json = URL_SAFE_NO_PAD.decode(token.trim())?;
    let payload: Payload = serde_json::from_slice(&json)?;

    let model = ReactionModel::from_id(payload.m);
    let keyframes = payload
        .kf
        .unwrap_or_default()
        .into_iter()
        .map(|kf| Keyframe {
            time: kf.t,
            // A keyframe with an unknown model inherits the descriptor's.
            model: if kf.m <= 3 { ReactionModel::from_id(kf.m) } else { model },
            params: kf.p,
            easing: if kf.e == 1 { Easing::EaseInOut } else { Easing::Linear },
        })
        .collect();

    Ok(PatternDescriptor {
        model,
        params: payload.p,
        initial_condition: InitialCondition::from_id(payload.ic),
        keyframes,
    })
}

/// Decode that logs and swallows failures, for hosts reading untrusted
/// input such as a URL fragment.
pub fn decode_or_none(token: &str) -> Option<PatternDescriptor> {
    match decode(token) {
        Ok(descriptor) => Some(descriptor),
        Err(err) => {
            tracing::warn!("failed to decode pattern descriptor: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> PatternDescriptor {
        PatternDescriptor {
            model: ReactionModel::Schnakenberg,
            params: ReactionModel::Schnakenberg.defaults(),
            initial_condition: InitialCondition::Noise,
            keyframes: Vec::new(),
        }
    }

    #[test]
    fn test_round_trip() {
        let original = descriptor();
        let decoded = decode(&encode(&original)).unwrap();

        assert_eq!(decoded.model, original.model);
        assert_eq!(decoded.initial_condition, original.initial_condition);
        for spec in original.model.param_specs() {
            let a = original.params.get(spec.key, f32::NAN);
            let b = decoded.params.get(spec.key, f32::NAN);
            assert!((a - b).abs() < 1e-6, "{} drifted: {a} vs {b}", spec.key);
        }
    }

    #[test]
    fn test_round_trip_with_keyframes() {
        let mut original = descriptor();
        original.keyframes = vec![
            Keyframe {
                time: 0.0,
                model: ReactionModel::Schnakenberg,
                params: ReactionModel::Schnakenberg.defaults(),
                easing: Easing::Linear,
            },
            Keyframe {
                time: 5.125,
                model: ReactionModel::GrayScott,
                params: ReactionModel::GrayScott.defaults(),
                easing: Easing::EaseInOut,
            },
        ];

        let decoded = decode(&encode(&original)).unwrap();
        assert_eq!(decoded.keyframes.len(), 2);
        assert_eq!(decoded.keyframes[1].model, ReactionModel::GrayScott);
        assert_eq!(decoded.keyframes[1].easing, Easing::EaseInOut);
        // Keyframe times are rounded to two decimals on the wire.
        assert!((decoded.keyframes[1].time - 5.13).abs() < 1e-6);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode(&descriptor());
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_garbage_is_an_error_not_a_panic() {
        assert!(decode("!!!not-a-token!!!").is_err());
        assert!(decode("").is_err());
        // Valid base64, junk payload
        let junk = URL_SAFE_NO_PAD.encode(b"[1, 2, 3]");
        assert!(decode(&junk).is_err());
        assert!(decode_or_none(&junk).is_none());
    }

    #[test]
    fn test_unknown_ids_fall_back() {
        let json = br#"{"m":42,"p":{},"ic":42}"#;
        let token = URL_SAFE_NO_PAD.encode(json);
        let decoded = decode(&token).unwrap();

        assert_eq!(decoded.model, ReactionModel::GrayScott);
        assert_eq!(decoded.initial_condition, InitialCondition::Center);
    }

    #[test]
    fn test_empty_keyframes_omitted_from_wire() {
        let token = encode(&descriptor());
        let json = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let text = String::from_utf8(json).unwrap();
        assert!(!text.contains("\"kf\""));
    }
}
