use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// The two genders a PuppyLove participant can register with. Stored and serialized as `M` / `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
pub enum Gender {
    M,
    F,
}

#[derive(Debug, Clone, Error)]
#[error("PuppyLove can only be enabled if your gender is Male or Female. Got '{0}'")]
pub struct GenderParseError(pub String);

impl FromStr for Gender {
    type Err = GenderParseError;

    /// Accepts both the single-letter and the long form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Self::M),
            "f" | "female" => Ok(Self::F),
            _ => Err(GenderParseError(s.to_string())),
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::M => write!(f, "M"),
            Gender::F => write!(f, "F"),
        }
    }
}
