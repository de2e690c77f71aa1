use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Contrast phase the caller wants the image to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Local contrast boost (CLAHE on luminance).
    #[default]
    Arterial,
    /// Gaussian softening.
    Venous,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Arterial => "arterial",
            Phase::Venous => "venous",
        }
    }

    /// Parses the optional `phase` form field. An absent field means arterial,
    /// a present but empty one is rejected.
    pub fn parse_field(value: Option<&str>) -> Result<Self, DomainError> {
        match value {
            None => Ok(Phase::default()),
            Some(raw) => raw.parse(),
        }
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    // 大文字小文字は区別する ("Arterial" は不正)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arterial" => Ok(Phase::Arterial),
            "venous" => Ok(Phase::Venous),
            other => Err(DomainError::InvalidPhase(other.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
