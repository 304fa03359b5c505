//! Reaction models: kinetics functions and parameter schemas.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The supported reaction-diffusion systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReactionModel {
    /// Gray-Scott feed/kill chemistry. Channels clamp to [0, 1].
    #[default]
    GrayScott,
    /// FitzHugh-Nagumo excitable medium.
    FitzHughNagumo,
    /// Schnakenberg autocatalytic system.
    Schnakenberg,
    /// Brusselator oscillating system.
    Brusselator,
}

impl ReactionModel {
    /// All models, in id order.
    pub const ALL: [ReactionModel; 4] = [
        ReactionModel::GrayScott,
        ReactionModel::FitzHughNagumo,
        ReactionModel::Schnakenberg,
        ReactionModel::Brusselator,
    ];

    /// Stable small-integer id, used by the descriptor codec.
    pub fn id(&self) -> u8 {
        match self {
            ReactionModel::GrayScott => 0,
            ReactionModel::FitzHughNagumo => 1,
            ReactionModel::Schnakenberg => 2,
            ReactionModel::Brusselator => 3,
        }
    }

    /// Looks a model up by id. Unknown ids fall back to the default model.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => ReactionModel::FitzHughNagumo,
            2 => ReactionModel::Schnakenberg,
            3 => ReactionModel::Brusselator,
            _ => ReactionModel::GrayScott,
        }
    }

    /// Human-readable display name.
    pub fn name(&self) -> &'static str {
        match self {
            ReactionModel::GrayScott => "Gray-Scott",
            ReactionModel::FitzHughNagumo => "FitzHugh-Nagumo",
            ReactionModel::Schnakenberg => "Schnakenberg",
            ReactionModel::Brusselator => "Brusselator",
        }
    }

    /// Parameter schema: key, label, range, step and default per knob.
    pub fn param_specs(&self) -> &'static [ParamSpec] {
        const GRAY_SCOTT: [ParamSpec; 5] = [
            ParamSpec::new("F", "Feed Rate (F)", 0.01, 0.1, 0.001, 0.037),
            ParamSpec::new("k", "Kill Rate (k)", 0.03, 0.07, 0.001, 0.06),
            ParamSpec::new("Du", "Diffusion U", 0.05, 0.4, 0.005, 0.21),
            ParamSpec::new("Dv", "Diffusion V", 0.02, 0.2, 0.005, 0.105),
            ParamSpec::new("dt", "Time Step", 0.5, 2.0, 0.1, 1.0),
        ];
        const FITZHUGH_NAGUMO: [ParamSpec; 6] = [
            ParamSpec::new("a", "a", -0.5, 1.0, 0.01, 0.5),
            ParamSpec::new("b", "b", 0.0, 2.0, 0.01, 0.8),
            ParamSpec::new("epsilon", "Epsilon", 0.001, 0.1, 0.001, 0.01),
            ParamSpec::new("Du", "Diffusion U", 0.05, 1.0, 0.01, 0.2),
            ParamSpec::new("Dv", "Diffusion V", 0.0, 1.0, 0.01, 0.0),
            ParamSpec::new("dt", "Time Step", 0.01, 1.0, 0.01, 0.1),
        ];
        const SCHNAKENBERG: [ParamSpec; 5] = [
            ParamSpec::new("a", "a", 0.0, 0.5, 0.005, 0.1),
            ParamSpec::new("b", "b", 0.5, 2.0, 0.01, 0.9),
            ParamSpec::new("Du", "Diffusion U", 0.05, 1.0, 0.01, 0.5),
            ParamSpec::new("Dv", "Diffusion V", 0.01, 0.5, 0.005, 0.1),
            ParamSpec::new("dt", "Time Step", 0.001, 0.1, 0.001, 0.01),
        ];
        const BRUSSELATOR: [ParamSpec; 5] = [
            ParamSpec::new("a", "a", 0.5, 5.0, 0.1, 1.0),
            ParamSpec::new("b", "b", 1.0, 5.0, 0.1, 3.0),
            ParamSpec::new("Du", "Diffusion U", 0.1, 2.0, 0.01, 0.5),
            ParamSpec::new("Dv", "Diffusion V", 0.01, 1.0, 0.005, 0.1),
            ParamSpec::new("dt", "Time Step", 0.001, 0.05, 0.001, 0.005),
        ];

        match self {
            ReactionModel::GrayScott => &GRAY_SCOTT,
            ReactionModel::FitzHughNagumo => &FITZHUGH_NAGUMO,
            ReactionModel::Schnakenberg => &SCHNAKENBERG,
            ReactionModel::Brusselator => &BRUSSELATOR,
        }
    }

    /// Default parameter map for this model.
    pub fn defaults(&self) -> ModelParams {
        let mut params = ModelParams::new();
        for spec in self.param_specs() {
            params.set(spec.key, spec.default);
        }
        params
    }

    /// Resolves a parameter map into per-model kinetics.
    ///
    /// Missing keys resolve to the schema default; unknown keys are ignored.
    pub fn kinetics(&self, params: &ModelParams) -> Kinetics {
        match self {
            ReactionModel::GrayScott => Kinetics::GrayScott {
                feed: self.resolve(params, "F"),
                kill: self.resolve(params, "k"),
                du: self.resolve(params, "Du"),
                dv: self.resolve(params, "Dv"),
            },
            ReactionModel::FitzHughNagumo => Kinetics::FitzHughNagumo {
                a: self.resolve(params, "a"),
                b: self.resolve(params, "b"),
                epsilon: self.resolve(params, "epsilon"),
                du: self.resolve(params, "Du"),
                dv: self.resolve(params, "Dv"),
            },
            ReactionModel::Schnakenberg => Kinetics::Schnakenberg {
                a: self.resolve(params, "a"),
                b: self.resolve(params, "b"),
                du: self.resolve(params, "Du"),
                dv: self.resolve(params, "Dv"),
            },
            ReactionModel::Brusselator => Kinetics::Brusselator {
                a: self.resolve(params, "a"),
                b: self.resolve(params, "b"),
                du: self.resolve(params, "Du"),
                dv: self.resolve(params, "Dv"),
            },
        }
    }

    /// Resolves the integration time step.
    pub fn dt(&self, params: &ModelParams) -> f32 {
        self.resolve(params, "dt")
    }

    fn resolve(&self, params: &ModelParams, key: &str) -> f32 {
        let default = self
            .param_specs()
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.default)
            .unwrap_or(0.0);
        params.get(key, default)
    }
}

/// Schema entry for one named parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter key as used in [`ModelParams`].
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Minimum sensible value.
    pub min: f32,
    /// Maximum sensible value.
    pub max: f32,
    /// Slider step.
    pub step: f32,
    /// Default value when the key is absent.
    pub default: f32,
}

impl ParamSpec {
    const fn new(
        key: &'static str,
        label: &'static str,
        min: f32,
        max: f32,
        step: f32,
        default: f32,
    ) -> Self {
        Self {
            key,
            label,
            min,
            max,
            step,
            default,
        }
    }
}

/// Named scalar knobs for the active reaction system.
///
/// A thin map from parameter key to value. Lookups for missing keys return
/// the caller-supplied default, never an error; unknown keys are carried
/// but ignored by the models.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModelParams(BTreeMap<String, f32>);

impl ModelParams {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `default` if absent.
    pub fn get(&self, key: &str, default: f32) -> f32 {
        self.0.get(key).copied().unwrap_or(default)
    }

    /// Sets a parameter value.
    pub fn set(&mut self, key: &str, value: f32) {
        self.0.insert(key.to_string(), value);
    }

    /// Returns true if the map holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over (key, value) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, f32)> for ModelParams {
    fn from_iter<T: IntoIterator<Item = (String, f32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolved per-model kinetics.
///
/// Computes `(du, dv)` from the local concentrations and the discrete
/// Laplacians. Pure: one evaluation has no state and no randomness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kinetics {
    /// `du = Du*lap_u - u*v^2 + F*(1-u)`, `dv = Dv*lap_v + u*v^2 - (F+k)*v`.
    GrayScott { feed: f32, kill: f32, du: f32, dv: f32 },
    /// `du = u - u^3/3 - v + Du*lap_u`, `dv = eps*(u + a - b*v) + Dv*lap_v`.
    FitzHughNagumo {
        a: f32,
        b: f32,
        epsilon: f32,
        du: f32,
        dv: f32,
    },
    /// `du = a - u + u^2*v + Du*lap_u`, `dv = b - u^2*v + Dv*lap_v`.
    Schnakenberg { a: f32, b: f32, du: f32, dv: f32 },
    /// `du = a - (b+1)*u + u^2*v + Du*lap_u`, `dv = b*u - u^2*v + Dv*lap_v`.
    Brusselator { a: f32, b: f32, du: f32, dv: f32 },
}

impl Kinetics {
    /// Rate of change for both channels at one cell.
    #[inline]
    pub fn rates(&self, u: f32, v: f32, lap_u: f32, lap_v: f32) -> (f32, f32) {
        match *self {
            Kinetics::GrayScott { feed, kill, du, dv } => {
                let uvv = u * v * v;
                (
                    du * lap_u - uvv + feed * (1.0 - u),
                    dv * lap_v + uvv - (feed + kill) * v,
                )
            }
            Kinetics::FitzHughNagumo {
                a,
                b,
                epsilon,
                du,
                dv,
            } => (
                u - (u * u * u) / 3.0 - v + du * lap_u,
                epsilon * (u + a - b * v) + dv * lap_v,
            ),
            Kinetics::Schnakenberg { a, b, du, dv } => {
                let u2v = u * u * v;
                (a - u + u2v + du * lap_u, b - u2v + dv * lap_v)
            }
            Kinetics::Brusselator { a, b, du, dv } => {
                let u2v = u * u * v;
                (a - (b + 1.0) * u + u2v + du * lap_u, b * u - u2v + dv * lap_v)
            }
        }
    }

    /// True if this model clamps both channels to [0, 1] after each step.
    ///
    /// Only Gray-Scott clamps; the other systems may legitimately go
    /// negative or unbounded, which risks divergence at large `dt` (see
    /// DESIGN.md).
    pub fn clamps_unit(&self) -> bool {
        matches!(self, Kinetics::GrayScott { .. })
    }

    /// The model this kinetics was resolved from.
    pub fn model(&self) -> ReactionModel {
        match self {
            Kinetics::GrayScott { .. } => ReactionModel::GrayScott,
            Kinetics::FitzHughNagumo { .. } => ReactionModel::FitzHughNagumo,
            Kinetics::Schnakenberg { .. } => ReactionModel::Schnakenberg,
            Kinetics::Brusselator { .. } => ReactionModel::Brusselator,
        }
    }
}
