//! Session configuration passed into the controller at construction

use pdf_signing::constants::{
    DEFAULT_SCALE, DEFAULT_SIGNATURE_WIDTH, MAX_SCALE, MIN_SCALE, SCALE_STEP,
};
use pdf_signing::{CaptureSettings, Result, SignError, ViewerKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Zoom behaviour of the document view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerPreferences {
    pub initial_scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_step: f64,
}

impl Default for ViewerPreferences {
    fn default() -> Self {
        Self {
            initial_scale: DEFAULT_SCALE,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            scale_step: SCALE_STEP,
        }
    }
}

impl ViewerPreferences {
    /// Clamp a requested scale into the configured range
    pub fn clamp(&self, scale: f64) -> f64 {
        scale.max(self.min_scale).min(self.max_scale)
    }
}

/// Everything a signing session needs to know up front.
///
/// There is no process-wide state: preferences and the access token live
/// here and are scoped to the session that owns the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub viewer: ViewerKind,
    pub preferences: ViewerPreferences,
    /// Signature width in native page units; height follows the raster
    pub signature_width: f64,
    pub capture: CaptureSettings,
    /// Passed to the document store on every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewer: ViewerKind::default(),
            preferences: ViewerPreferences::default(),
            signature_width: DEFAULT_SIGNATURE_WIDTH,
            capture: CaptureSettings::default(),
            access_token: None,
        }
    }
}

impl SessionConfig {
    pub fn new(viewer: ViewerKind) -> Self {
        Self {
            viewer,
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Load configuration from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| SignError::input(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SignError::input(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let prefs = &self.preferences;
        if !(prefs.min_scale > 0.0 && prefs.max_scale.is_finite()) {
            return Err(SignError::input("Scale bounds must be positive"));
        }
        if prefs.min_scale > prefs.max_scale {
            return Err(SignError::input("Minimum scale must not exceed maximum scale"));
        }
        if !(prefs.initial_scale >= prefs.min_scale && prefs.initial_scale <= prefs.max_scale) {
            return Err(SignError::input("Initial scale must lie within the scale bounds"));
        }
        if !(prefs.scale_step.is_finite() && prefs.scale_step > 0.0) {
            return Err(SignError::input("Zoom step must be positive"));
        }
        if !(self.signature_width.is_finite() && self.signature_width > 0.0) {
            return Err(SignError::input("Signature width must be positive"));
        }
        if self.capture.canvas_width == 0 || self.capture.canvas_height == 0 {
            return Err(SignError::input("Signature canvas must not be empty"));
        }
        Ok(())
    }
}
