//! Keyframed parameter trajectories.

use petri_core::{ModelParams, ReactionModel};
use serde::{Deserialize, Serialize};

/// Easing applied over a keyframe bracket, keyed on the later keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Constant-rate interpolation.
    #[default]
    Linear,
    /// Quadratic ease-in-out.
    EaseInOut,
}

impl Easing {
    /// Remaps a normalized phase t in [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// One point on a parameter trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Timeline position in seconds.
    pub time: f32,
    /// Model active at this keyframe.
    pub model: ReactionModel,
    /// Parameter values at this keyframe.
    pub params: ModelParams,
    /// Easing into this keyframe from the previous one.
    pub easing: Easing,
}

/// Evaluates a time-sorted keyframe list at `time`.
///
/// Returns the model and a parameter map interpolated between the
/// bracketing keyframes. Parameters present on only one side of the
/// bracket default to 0 on the missing side. Out-of-range times clamp to
/// the nearest endpoint's exact values. Returns `None` for an empty list.
pub fn interpolate(keyframes: &[Keyframe], time: f32) -> Option<(ReactionModel, ModelParams)> {
    let first = keyframes.first()?;
    if keyframes.len() == 1 {
        return Some((first.model, first.params.clone()));
    }

    let mut before = first;
    let mut after = keyframes.last().unwrap();
    for pair in keyframes.windows(2) {
        if time >= pair[0].time && time <= pair[1].time {
            before = &pair[0];
            after = &pair[1];
            break;
        }
    }

    if time <= before.time {
        return Some((before.model, before.params.clone()));
    }
    if time >= after.time {
        return Some((after.model, after.params.clone()));
    }

    let range = after.time - before.time;
    let phase = if range > 0.0 {
        (time - before.time) / range
    } else {
        0.0
    };
    let t = after.easing.apply(phase);

    let mut params = ModelParams::new();
    let keys: std::collections::BTreeSet<&str> = before
        .params
        .iter()
        .map(|(k, _)| k)
        .chain(after.params.iter().map(|(k, _)| k))
        .collect();
    for key in keys {
        let a = before.params.get(key, 0.0);
        let b = after.params.get(key, 0.0);
        params.set(key, a + (b - a) * t);
    }

    Some((after.model, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kf(time: f32, feed: f32, easing: Easing) -> Keyframe {
        let mut params = ModelParams::new();
        params.set("F", feed);
        Keyframe {
            time,
            model: ReactionModel::GrayScott,
            params,
            easing,
        }
    }

    #[test]
    fn test_empty_list_is_none() {
        assert!(interpolate(&[], 1.0).is_none());
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let frames = [kf(2.0, 0.04, Easing::Linear)];
        for time in [0.0, 2.0, 10.0] {
            let (_, params) = interpolate(&frames, time).unwrap();
            assert_eq!(params.get("F", 0.0), 0.04);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let frames = [kf(0.0, 0.02, Easing::Linear), kf(10.0, 0.06, Easing::Linear)];
        let (_, params) = interpolate(&frames, 5.0).unwrap();
        assert!((params.get("F", 0.0) - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_clamps_to_exact_endpoints() {
        let frames = [kf(1.0, 0.02, Easing::Linear), kf(2.0, 0.06, Easing::Linear)];

        let (_, before) = interpolate(&frames, 0.0).unwrap();
        assert_eq!(before.get("F", 0.0), 0.02);

        let (_, after) = interpolate(&frames, 99.0).unwrap();
        assert_eq!(after.get("F", 0.0), 0.06);
    }

    #[test]
    fn test_ease_in_out_midpoint_matches_linear() {
        let frames = [kf(0.0, 0.0, Easing::Linear), kf(1.0, 1.0, Easing::EaseInOut)];

        // Ease-in-out crosses linear at the midpoint and lags before it.
        let (_, mid) = interpolate(&frames, 0.5).unwrap();
        assert!((mid.get("F", 0.0) - 0.5).abs() < 1e-6);

        let (_, early) = interpolate(&frames, 0.25).unwrap();
        assert!(early.get("F", 0.0) < 0.25);
    }

    #[test]
    fn test_easing_keyed_on_later_keyframe() {
        // The earlier keyframe's easing tag is irrelevant inside a bracket.
        let frames = [kf(0.0, 0.0, Easing::EaseInOut), kf(1.0, 1.0, Easing::Linear)];
        let (_, params) = interpolate(&frames, 0.25).unwrap();
        assert!((params.get("F", 0.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_one_sided_params_default_to_zero() {
        let mut a = ModelParams::new();
        a.set("F", 0.04);
        let mut b = ModelParams::new();
        b.set("k", 0.06);

        let frames = [
            Keyframe {
                time: 0.0,
                model: ReactionModel::GrayScott,
                params: a,
                easing: Easing::Linear,
            },
            Keyframe {
                time: 1.0,
                model: ReactionModel::GrayScott,
                params: b,
                easing: Easing::Linear,
            },
        ];

        let (_, params) = interpolate(&frames, 0.5).unwrap();
        assert!((params.get("F", -1.0) - 0.02).abs() < 1e-6);
        assert!((params.get("k", -1.0) - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_bracket_returns_later_model() {
        let mut frames = [kf(0.0, 0.0, Easing::Linear), kf(1.0, 1.0, Easing::Linear)];
        frames[1].model = ReactionModel::Brusselator;

        let (model, _) = interpolate(&frames, 0.5).unwrap();
        assert_eq!(model, ReactionModel::Brusselator);
    }

    #[test]
    fn test_multiple_brackets_picks_surrounding_pair() {
        let frames = [
            kf(0.0, 0.0, Easing::Linear),
            kf(1.0, 1.0, Easing::Linear),
            kf(2.0, 0.0, Easing::Linear),
        ];

        let (_, params) = interpolate(&frames, 1.5).unwrap();
        assert!((params.get("F", -1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_easing_endpoints_fixed() {
        assert_eq!(Easing::EaseInOut.apply(0.0), 0.0);
        assert_eq!(Easing::EaseInOut.apply(1.0), 1.0);
        assert_eq!(Easing::Linear.apply(0.3), 0.3);
    }
}
