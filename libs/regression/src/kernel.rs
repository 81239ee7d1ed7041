//! Kernel weight functions
//!
//! Every kernel is a pure function of a normalised distance `x`. Kernels with
//! compact support return zero outside it. Names are matched case-insensitively and
//! anything unrecognised resolves to [`Kernel::Laplace`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;
use tracing::warn;

/// Substitute for `x == 0` in the sinc kernel
const SINC_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kernel {
    Gaussian,
    Triangular,
    Tent,
    Epanechnikov,
    Quartic,
    Logistic,
    LogLogistic,
    Cosine,
    Sinc,
    #[default]
    Laplace,
    Exponential,
    Silverman,
    Cauchy,
    Wave,
    Parabolic,
    Power,
    Morters,
}

impl Kernel {
    pub const ALL: [Kernel; 17] = [
        Kernel::Gaussian,
        Kernel::Triangular,
        Kernel::Tent,
        Kernel::Epanechnikov,
        Kernel::Quartic,
        Kernel::Logistic,
        Kernel::LogLogistic,
        Kernel::Cosine,
        Kernel::Sinc,
        Kernel::Laplace,
        Kernel::Exponential,
        Kernel::Silverman,
        Kernel::Cauchy,
        Kernel::Wave,
        Kernel::Parabolic,
        Kernel::Power,
        Kernel::Morters,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Kernel::Gaussian => "gaussian",
            Kernel::Triangular => "triangular",
            Kernel::Tent => "tent",
            Kernel::Epanechnikov => "epanechnikov",
            Kernel::Quartic => "quartic",
            Kernel::Logistic => "logistic",
            Kernel::LogLogistic => "loglogistic",
            Kernel::Cosine => "cosine",
            Kernel::Sinc => "sinc",
            Kernel::Laplace => "laplace",
            Kernel::Exponential => "exponential",
            Kernel::Silverman => "silverman",
            Kernel::Cauchy => "cauchy",
            Kernel::Wave => "wave",
            Kernel::Parabolic => "parabolic",
            Kernel::Power => "power",
            Kernel::Morters => "morters",
        }
    }

    /// Strict lookup by name, `None` when unrecognised
    pub fn lookup(name: &str) -> Option<Kernel> {
        let wanted = name.trim().to_lowercase();
        Kernel::ALL.into_iter().find(|k| k.name() == wanted)
    }

    /// Lookup by name, falling back to laplace for unknown names
    pub fn from_name(name: &str) -> Kernel {
        match Kernel::lookup(name) {
            Some(kernel) => kernel,
            None => {
                warn!("Unknown kernel '{}', falling back to laplace", name);
                Kernel::Laplace
            }
        }
    }

    /// Weight at normalised distance `x`
    pub fn weight(self, x: f64) -> f64 {
        let ax = x.abs();
        match self {
            Kernel::Gaussian => (-x * x / 2.0).exp() / (2.0 * PI).sqrt(),
            Kernel::Triangular | Kernel::Tent => {
                if ax <= 1.0 {
                    1.0 - ax
                } else {
                    0.0
                }
            }
            Kernel::Epanechnikov => {
                if ax <= 1.0 {
                    0.75 * (1.0 - x * x)
                } else {
                    0.0
                }
            }
            Kernel::Quartic => {
                if ax <= 1.0 {
                    15.0 / 16.0 * (1.0 - x * x).powi(2)
                } else {
                    0.0
                }
            }
            Kernel::Logistic => 1.0 / (x.exp() + 2.0 + (-x).exp()),
            Kernel::LogLogistic => 1.0 / (1.0 + ax).powi(2),
            Kernel::Cosine => {
                if ax <= 1.0 {
                    FRAC_PI_4 * (FRAC_PI_2 * x).cos()
                } else {
                    0.0
                }
            }
            Kernel::Sinc => {
                let x = if x == 0.0 { SINC_EPSILON } else { x };
                (PI * x).sin() / (PI * x)
            }
            Kernel::Laplace => 0.5 * (-ax).exp(),
            Kernel::Exponential => (-ax).exp(),
            Kernel::Silverman => {
                if ax <= 0.5 {
                    0.5 * (-x / 2.0).exp() * (x / 2.0 + FRAC_PI_4).sin()
                } else {
                    0.0
                }
            }
            Kernel::Cauchy => 1.0 / (PI * (1.0 + x * x)),
            Kernel::Wave => {
                if ax <= 1.0 {
                    (1.0 - ax) * (PI * x).cos()
                } else {
                    0.0
                }
            }
            Kernel::Parabolic => {
                if ax <= 1.0 {
                    1.0 - x * x
                } else {
                    0.0
                }
            }
            Kernel::Power => {
                if ax <= 1.0 {
                    (1.0 - ax.powi(3)).powi(3)
                } else {
                    0.0
                }
            }
            Kernel::Morters => {
                if ax <= PI {
                    (1.0 + x.cos()) / (2.0 * PI)
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Kernel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Kernel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Kernel::from_name(&name))
    }
}
