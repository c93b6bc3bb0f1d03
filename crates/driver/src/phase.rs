//! Acquisition phase

use contracts::SchemaMask;

/// Acquisition phase
///
/// Unit vectors are only ever published while bootstrapping; streaming
/// channels only while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Minimal schema, waiting for the unit-vector image
    #[default]
    Bootstrapping,
    /// Requested schema
    Streaming,
}

impl Phase {
    /// Schema mask the grabber must be opened with in this phase
    pub fn mask(self, requested: SchemaMask) -> SchemaMask {
        match self {
            Phase::Bootstrapping => SchemaMask::UNIT_VECTORS,
            Phase::Streaming => requested,
        }
    }

    /// Metric label
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Bootstrapping => "bootstrapping",
            Phase::Streaming => "streaming",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_mask() {
        let requested = SchemaMask::IMG_CART | SchemaMask::IMG_RDIS;
        assert_eq!(Phase::Bootstrapping.mask(requested), SchemaMask::UNIT_VECTORS);
        assert_eq!(Phase::Streaming.mask(requested), requested);
    }
}
