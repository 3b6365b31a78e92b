use std::fmt::{Display, Formatter};

use fxtrend_core::{EnvelopeMeta, ProviderId, ValidationError};
use serde::Serialize;
use uuid::Uuid;

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Per-command metadata collected while the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub request_id: RequestId,
    pub source: ProviderId,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(source: ProviderId, latency_ms: u64, cache_hit: bool) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            source,
            latency_ms,
            cache_hit,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn into_envelope_meta(self) -> Result<EnvelopeMeta, ValidationError> {
        let mut meta = EnvelopeMeta::new(
            self.request_id.to_string(),
            vec![self.source],
            self.latency_ms,
            self.cache_hit,
        )?;

        for warning in self.warnings {
            meta.push_warning(warning);
        }

        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
    }

    #[test]
    fn envelope_meta_carries_source_and_warnings() {
        let mut metadata = Metadata::new(ProviderId::Frankfurter, 42, false);
        metadata.push_warning("single observation");

        let meta = metadata.into_envelope_meta().expect("valid meta");
        assert_eq!(meta.source_chain, vec![ProviderId::Frankfurter]);
        assert_eq!(meta.latency_ms, 42);
        assert_eq!(meta.warnings, vec![String::from("single observation")]);
        assert_eq!(meta.request_id.len(), 36);
    }
}
