use pdf_signing::{ReasonCode, ViewerKind};
use pdf_signing_session::*;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = SessionConfig::default();
    assert_eq!(config.viewer, ViewerKind::Overlay);
    assert_eq!(config.signature_width, 150.0);
    assert_eq!(config.preferences.initial_scale, 1.0);
    assert_eq!(config.preferences.min_scale, 0.5);
    assert_eq!(config.preferences.max_scale, 2.0);
    assert_eq!(config.preferences.scale_step, 0.25);
    assert_eq!(config.capture.canvas_width, 500);
    assert_eq!(config.capture.canvas_height, 160);
    assert!(config.access_token.is_none());
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_save_and_load_config() {
    let temp = NamedTempFile::new().unwrap();
    let config = SessionConfig::new(ViewerKind::Interactive).with_access_token("token-123");

    config.save(temp.path()).await.unwrap();
    let loaded = SessionConfig::load(temp.path()).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let temp = NamedTempFile::new().unwrap();
    let json = r#"{ "viewer": "interactive", "preferences": { "max_scale": 3.0 } }"#;
    tokio::fs::write(temp.path(), json).await.unwrap();

    let loaded = SessionConfig::load(temp.path()).await.unwrap();
    assert_eq!(loaded.viewer, ViewerKind::Interactive);
    assert_eq!(loaded.preferences.max_scale, 3.0);
    assert_eq!(loaded.preferences.min_scale, 0.5);
    assert_eq!(loaded.signature_width, 150.0);
}

#[tokio::test]
async fn test_malformed_config_is_rejected() {
    let temp = NamedTempFile::new().unwrap();
    tokio::fs::write(temp.path(), "{ not json").await.unwrap();

    let err = SessionConfig::load(temp.path()).await.unwrap_err();
    assert_eq!(err.code(), ReasonCode::Input);
    assert!(err.to_string().starts_with("Failed to parse config"));
}

#[test]
fn test_validate_rejects_bad_values() {
    let inverted = SessionConfig {
        preferences: ViewerPreferences {
            min_scale: 2.0,
            max_scale: 1.0,
            ..ViewerPreferences::default()
        },
        ..SessionConfig::default()
    };
    assert!(inverted.validate().is_err());

    let zero_scale = SessionConfig {
        preferences: ViewerPreferences {
            min_scale: 0.0,
            ..ViewerPreferences::default()
        },
        ..SessionConfig::default()
    };
    assert!(zero_scale.validate().is_err());

    let negative_width = SessionConfig {
        signature_width: -10.0,
        ..SessionConfig::default()
    };
    assert_eq!(
        negative_width.validate().unwrap_err().code(),
        ReasonCode::Input
    );
}

#[test]
fn test_validate_requires_initial_scale_in_bounds() {
    for initial_scale in [0.0, 0.25, 3.0, f64::NAN] {
        let config = SessionConfig {
            preferences: ViewerPreferences {
                initial_scale,
                ..ViewerPreferences::default()
            },
            ..SessionConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().code(),
            ReasonCode::Input,
            "initial scale {initial_scale} should be rejected"
        );
    }

    let infinite_max = SessionConfig {
        preferences: ViewerPreferences {
            max_scale: f64::INFINITY,
            ..ViewerPreferences::default()
        },
        ..SessionConfig::default()
    };
    assert!(infinite_max.validate().is_err());
}

#[test]
fn test_clamp_scale() {
    let prefs = ViewerPreferences::default();
    assert_eq!(prefs.clamp(5.0), 2.0);
    assert_eq!(prefs.clamp(0.1), 0.5);
    assert_eq!(prefs.clamp(1.75), 1.75);
}
