use crate::errors::NumpressError;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use std::str::FromStr;

/// The three MS-Numpress compression strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// Linear prediction of each value from the two before it.
    Linear,
    /// Rounded non-negative integers ("pic").
    PositiveInteger,
    /// Logarithm scaled to an unsigned short ("slof").
    ShortLogarithmicFloat,
}

impl CompressionMode {
    pub const ALL: [CompressionMode; 3] = [
        CompressionMode::Linear,
        CompressionMode::PositiveInteger,
        CompressionMode::ShortLogarithmicFloat,
    ];

    /// The PSI-MS controlled vocabulary accession used to tag binary
    /// arrays compressed with this mode in mzML.
    pub fn cv_accession(&self) -> &'static str {
        match self {
            Self::Linear => "MS:1002312",
            Self::PositiveInteger => "MS:1002313",
            Self::ShortLogarithmicFloat => "MS:1002314",
        }
    }

    pub fn cv_name(&self) -> &'static str {
        match self {
            Self::Linear => "MS-Numpress linear prediction compression",
            Self::PositiveInteger => "MS-Numpress positive integer compression",
            Self::ShortLogarithmicFloat => "MS-Numpress short logarithmic float compression",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::PositiveInteger => "pic",
            Self::ShortLogarithmicFloat => "slof",
        }
    }

    /// Whether the payload starts with a fixed point header.
    pub fn uses_fixed_point(&self) -> bool {
        !matches!(self, Self::PositiveInteger)
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for CompressionMode {
    type Err = NumpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_ascii_lowercase().replace(['-', ' '], "_");
        for mode in Self::ALL {
            if trimmed == mode.cv_accession() || trimmed.eq_ignore_ascii_case(mode.cv_name()) {
                return Ok(mode);
            }
        }
        match normalized.as_str() {
            "linear" => Ok(Self::Linear),
            "pic" | "positive_integer" => Ok(Self::PositiveInteger),
            "slof" | "short_logarithmic_float" => Ok(Self::ShortLogarithmicFloat),
            _ => Err(NumpressError::InvalidMode {
                name: s.to_string(),
            }),
        }
    }
}

/// Everything `encode` needs besides the values themselves.
///
/// Partial JSON is accepted, missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumpressConfig {
    pub mode: CompressionMode,
    /// Derive the fixed point from the data instead of using `fixed_point`.
    pub estimate_fixed_point: bool,
    /// Scale used when `estimate_fixed_point` is false. Ignored by
    /// [`CompressionMode::PositiveInteger`].
    pub fixed_point: f64,
    /// zlib the numpress bytes before base64 encoding them.
    pub apply_secondary_compression: bool,
    /// Maximum relative deviation allowed after a round trip. `None`
    /// skips the check.
    pub error_tolerance: Option<f64>,
    /// Target absolute accuracy for [`CompressionMode::Linear`] when the
    /// fixed point is estimated.
    pub linear_mass_accuracy: Option<f64>,
}

impl Default for NumpressConfig {
    fn default() -> Self {
        Self {
            mode: CompressionMode::Linear,
            estimate_fixed_point: true,
            fixed_point: 10000.0,
            apply_secondary_compression: false,
            error_tolerance: None,
            linear_mass_accuracy: None,
        }
    }
}

impl NumpressConfig {
    pub fn new(mode: CompressionMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_fixed_point(mut self, fixed_point: f64) -> Self {
        self.estimate_fixed_point = false;
        self.fixed_point = fixed_point;
        self
    }

    pub fn with_secondary_compression(mut self, apply: bool) -> Self {
        self.apply_secondary_compression = apply;
        self
    }
}
