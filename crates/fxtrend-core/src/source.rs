use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical provider identifiers used in metadata, cache keys and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    Frankfurter,
    ExchangerateHost,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Frankfurter, Self::ExchangerateHost];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Frankfurter => "frankfurter",
            Self::ExchangerateHost => "exchangerate-host",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "frankfurter" => Ok(Self::Frankfurter),
            "exchangerate-host" | "exchangerate.host" | "exchangerate_host" => {
                Ok(Self::ExchangerateHost)
            }
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
