//! Runtime bloom parameters

use harbor_core::{HarborError, Result};
use serde::{Deserialize, Serialize};

/// Lowest exposure accepted from config or reached by the controls
pub const MIN_EXPOSURE: f32 = 0.05;

/// Controls read by the composite pass each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomParameters {
    /// Add the blurred image to the sharp one before tonemapping
    pub bloom_enabled: bool,
    pub exposure: f32,
    /// Number of single-direction blur passes per frame
    pub blur_iterations: u32,
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            bloom_enabled: true,
            exposure: 1.0,
            blur_iterations: 10,
        }
    }
}

impl BloomParameters {
    pub fn validate(&self) -> Result<()> {
        if !self.exposure.is_finite() || self.exposure < MIN_EXPOSURE {
            return Err(HarborError::ValueOutOfRange {
                field: "exposure".into(),
                min: f64::from(MIN_EXPOSURE),
                max: f64::from(f32::MAX),
                value: f64::from(self.exposure),
            });
        }
        if self.blur_iterations == 0 {
            return Err(HarborError::ValidationError(
                "blur_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn toggle_bloom(&mut self) -> bool {
        self.bloom_enabled = !self.bloom_enabled;
        self.bloom_enabled
    }

    /// Shift exposure by `delta`, never going below [`MIN_EXPOSURE`]
    pub fn adjust_exposure(&mut self, delta: f32) -> f32 {
        self.exposure = (self.exposure + delta).max(MIN_EXPOSURE);
        self.exposure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = BloomParameters::default();
        assert!(params.bloom_enabled);
        assert_eq!(params.exposure, 1.0);
        assert_eq!(params.blur_iterations, 10);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params: BloomParameters = toml::from_str("exposure = 2.5").unwrap();
        assert_eq!(params.exposure, 2.5);
        assert!(params.bloom_enabled);
        assert_eq!(params.blur_iterations, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let params = BloomParameters {
            exposure: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(HarborError::ValueOutOfRange { .. })
        ));

        let params = BloomParameters {
            blur_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(HarborError::ValidationError(_))
        ));
    }

    #[test]
    fn test_exposure_clamped() {
        let mut params = BloomParameters::default();
        params.adjust_exposure(-5.0);
        assert_eq!(params.exposure, MIN_EXPOSURE);
        params.adjust_exposure(0.45);
        assert!((params.exposure - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_valid_exposure_survives_adjustment() {
        let mut params = BloomParameters {
            exposure: 0.01,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        params.exposure = MIN_EXPOSURE;
        assert!(params.validate().is_ok());
        // Lowering from the floor stays put; raising moves up from it
        assert_eq!(params.adjust_exposure(-0.01), MIN_EXPOSURE);
        assert!(params.adjust_exposure(0.01) > MIN_EXPOSURE);
    }

    #[test]
    fn test_toggle_bloom() {
        let mut params = BloomParameters::default();
        assert!(!params.toggle_bloom());
        assert!(params.toggle_bloom());
    }
}
