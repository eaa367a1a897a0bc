//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site root and is a sparse overlay on the stock defaults: override only
//! what differs.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_path = ""                    # URL prefix when hosted under a sub-path ("/Bia")
//! manifest_path = "data.json"       # Content manifest, relative to the site root
//! placeholder_image = "imagens/placeholder.png"
//!
//! [gallery]
//! batch_size = 12                   # Tiles revealed per scroll step
//! root_margin_px = 500              # Reveal the next batch this far before the end
//!
//! [i18n]
//! default_locale = "pt"             # Used when the URL carries no locale
//! fallback_locale = "pt"            # Used for missing translations and titles
//! storage_key = "preferredLanguage"
//!
//! [consent]
//! cookie_name = "cookie-consent"
//! expiry_days = 365
//! privacy_policy_href = "privacy-policy.html"
//!
//! [analytics]
//! measurement_id = ""               # Empty = analytics never loads
//!
//! [lightbox]
//! watermark = ""                    # Text laid over opened images; empty = none
//!
//! [includes]
//! directory = "includes"            # Header/footer fragments, relative to the site root
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// URL prefix prepended to site-absolute asset paths.
    pub base_path: String,
    /// Manifest location relative to the site root.
    pub manifest_path: String,
    /// Image shown when a tile's preview fails to load.
    pub placeholder_image: String,
    pub gallery: GalleryConfig,
    pub i18n: I18nConfig,
    pub consent: ConsentConfig,
    pub analytics: AnalyticsConfig,
    pub lightbox: LightboxConfig,
    pub includes: IncludesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            manifest_path: "data.json".to_string(),
            placeholder_image: "imagens/placeholder.png".to_string(),
            gallery: GalleryConfig::default(),
            i18n: I18nConfig::default(),
            consent: ConsentConfig::default(),
            analytics: AnalyticsConfig::default(),
            lightbox: LightboxConfig::default(),
            includes: IncludesConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gallery.batch_size == 0 {
            return Err(ConfigError::Validation(
                "gallery.batch_size must be greater than 0".into(),
            ));
        }
        if self.consent.expiry_days == 0 {
            return Err(ConfigError::Validation(
                "consent.expiry_days must be greater than 0".into(),
            ));
        }
        if self.consent.cookie_name.is_empty()
            || self
                .consent
                .cookie_name
                .contains(|c: char| c.is_whitespace() || c == ';' || c == '=')
        {
            return Err(ConfigError::Validation(
                "consent.cookie_name must be a non-empty token without ';', '=' or spaces".into(),
            ));
        }
        if self.manifest_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest_path must not be empty".into(),
            ));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "base_path must be empty or start with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Prefix a site-absolute path with the base path: `/Bia/imagens/x.png`.
    pub fn site_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_path.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of the tile fallback image.
    pub fn placeholder_url(&self) -> String {
        self.site_url(&self.placeholder_image)
    }
}

/// Gallery batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Tiles rendered per reveal step.
    pub batch_size: usize,
    /// Viewport margin (px) at which the next batch is revealed.
    pub root_margin_px: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            batch_size: 12,
            root_margin_px: 500,
        }
    }
}

/// Language settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I18nConfig {
    pub default_locale: Locale,
    pub fallback_locale: Locale,
    /// `localStorage` key holding the preferred language.
    pub storage_key: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::Pt,
            fallback_locale: Locale::Pt,
            storage_key: "preferredLanguage".to_string(),
        }
    }
}

/// Cookie consent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsentConfig {
    pub cookie_name: String,
    pub expiry_days: u32,
    pub privacy_policy_href: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            cookie_name: "cookie-consent".to_string(),
            expiry_days: 365,
            privacy_policy_href: "privacy-policy.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Analytics property id (`G-XXXXXXX`). Empty disables loading.
    pub measurement_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Watermark text over opened images. Empty = none.
    pub watermark: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncludesConfig {
    /// Directory of header/footer fragments, relative to the site root.
    pub directory: String,
}

impl Default for IncludesConfig {
    fn default() -> Self {
        Self {
            directory: "includes".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    log::debug!("loaded config from {}", root.display());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Vitrine Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# URL prefix when the site is hosted under a sub-path, e.g. "/Bia".
base_path = ""

# Content manifest, relative to the site root.
manifest_path = "data.json"

# Image shown when a gallery tile fails to load, relative to the site root.
placeholder_image = "imagens/placeholder.png"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Tiles revealed per scroll step.
batch_size = 12

# Reveal the next batch when the last tile is this many pixels from the viewport.
root_margin_px = 500

# ---------------------------------------------------------------------------
# Languages (pt, en, es)
# ---------------------------------------------------------------------------
[i18n]
# Language used when the URL has no /pt/, /en/ or /es/ segment.
default_locale = "pt"

# Language consulted for missing translations and titles.
fallback_locale = "pt"

# localStorage key remembering the visitor's language.
storage_key = "preferredLanguage"

# ---------------------------------------------------------------------------
# Cookie consent
# ---------------------------------------------------------------------------
[consent]
cookie_name = "cookie-consent"

# Days until the consent cookie expires and the banner is shown again.
expiry_days = 365

privacy_policy_href = "privacy-policy.html"

# ---------------------------------------------------------------------------
# Analytics (loaded only after consent)
# ---------------------------------------------------------------------------
[analytics]
# Property id such as "G-XXXXXXXXXX". Leave empty to disable.
measurement_id = ""

# ---------------------------------------------------------------------------
# Lightbox
# ---------------------------------------------------------------------------
[lightbox]
# Text laid over opened images. Leave empty for none.
watermark = ""

# ---------------------------------------------------------------------------
# Header/footer fragments
# ---------------------------------------------------------------------------
[includes]
directory = "includes"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.gallery.batch_size, 12);
        assert_eq!(config.gallery.root_margin_px, 500);
        assert_eq!(config.consent.cookie_name, "cookie-consent");
        assert_eq!(config.consent.expiry_days, 365);
        assert_eq!(config.i18n.default_locale, Locale::Pt);
        assert_eq!(config.manifest_path, "data.json");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[gallery]
batch_size = 6
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.gallery.batch_size, 6);
        // Default values preserved
        assert_eq!(config.gallery.root_margin_px, 500);
        assert_eq!(config.consent.expiry_days, 365);
    }

    #[test]
    fn parse_locales() {
        let toml = r#"
[i18n]
default_locale = "en"
fallback_locale = "es"
"#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.i18n.default_locale, Locale::En);
        assert_eq!(config.i18n.fallback_locale, Locale::Es);
    }

    #[test]
    fn unsupported_locale_rejected() {
        let toml = r#"
[i18n]
default_locale = "fr"
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn site_url_joins_base_path() {
        let mut config = SiteConfig::default();
        assert_eq!(config.placeholder_url(), "/imagens/placeholder.png");
        config.base_path = "/Bia/".to_string();
        assert_eq!(config.site_url("/data.json"), "/Bia/data.json");
        assert_eq!(config.placeholder_url(), "/Bia/imagens/placeholder.png");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.gallery.batch_size, 12);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
base_path = "/Bia"

[analytics]
measurement_id = "G-TEST"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.base_path, "/Bia");
        assert_eq!(config.analytics.measurement_id, "G-TEST");
        assert_eq!(config.gallery.batch_size, 12);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[gallery]
batch_size = 12
root_margin_px = 500
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[gallery]
batch_size = 24
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let gallery = merged.get("gallery").unwrap();
        assert_eq!(gallery.get("batch_size").unwrap().as_integer(), Some(24));
        assert_eq!(gallery.get("root_margin_px").unwrap().as_integer(), Some(500));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"base_path = """#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"base_path = "/x""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("base_path").unwrap().as_str(), Some("/x"));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[gallery]
batch = 12
"#;
        let result: Result<SiteConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[galery]\nbatch_size = 1\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_batch_size() {
        let mut config = SiteConfig::default();
        config.gallery.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn validate_zero_expiry() {
        let mut config = SiteConfig::default();
        config.consent.expiry_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_cookie_name_tokens() {
        let mut config = SiteConfig::default();
        config.consent.cookie_name = "bad name".into();
        assert!(config.validate().is_err());
        config.consent.cookie_name = "a=b".into();
        assert!(config.validate().is_err());
        config.consent.cookie_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_base_path_must_be_absolute() {
        let mut config = SiteConfig::default();
        config.base_path = "Bia".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[gallery]\nbatch_size = 0\n").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.gallery.batch_size, 12);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.gallery.batch_size, defaults.gallery.batch_size);
        assert_eq!(config.gallery.root_margin_px, defaults.gallery.root_margin_px);
        assert_eq!(config.consent.cookie_name, defaults.consent.cookie_name);
        assert_eq!(config.i18n.storage_key, defaults.i18n.storage_key);
        assert_eq!(config.includes.directory, defaults.includes.directory);
        assert_eq!(config.placeholder_image, defaults.placeholder_image);
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in [
            "[gallery]",
            "[i18n]",
            "[consent]",
            "[analytics]",
            "[lightbox]",
            "[includes]",
        ] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for key in ["gallery", "i18n", "consent", "analytics", "lightbox", "includes"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn fixture_site_config_overrides_defaults() {
        let tmp = crate::test_helpers::setup_fixtures();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.gallery.batch_size, 4);
        assert_eq!(config.gallery.root_margin_px, 500);
        assert_eq!(config.analytics.measurement_id, "G-FIXTURE1");
        assert_eq!(config.lightbox.watermark, "© Ana Ribeiro");
    }
}
