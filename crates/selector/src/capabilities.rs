use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Which optional forecasting backends this process can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub seasonal: bool,
    pub gradient_boosted: bool,
}

impl Capabilities {
    /// Inspect the build for available backends.
    ///
    /// The seasonal backend is present when the `seasonal` feature is
    /// compiled in. No gradient-boosted regressor ships with the crate; one
    /// becomes available only when a caller registers it with the engine.
    pub fn detect() -> Self {
        let capabilities = Self {
            seasonal: cfg!(feature = "seasonal"),
            gradient_boosted: false,
        };
        info!(
            seasonal = capabilities.seasonal,
            gradient_boosted = capabilities.gradient_boosted,
            "Detected forecasting capabilities"
        );
        capabilities
    }

    /// Process-wide capabilities, detected on first use.
    pub fn global() -> &'static Capabilities {
        static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();
        CAPABILITIES.get_or_init(Self::detect)
    }

    /// Only the always-available techniques.
    pub fn baseline() -> Self {
        Self {
            seasonal: false,
            gradient_boosted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_matches_build() {
        let detected = Capabilities::detect();
        assert_eq!(detected.seasonal, cfg!(feature = "seasonal"));
        assert!(!detected.gradient_boosted);
    }

    #[test]
    fn test_global_is_stable() {
        let first = Capabilities::global();
        let second = Capabilities::global();
        assert!(std::ptr::eq(first, second));
        assert_eq!(*first, Capabilities::detect());
    }
}
