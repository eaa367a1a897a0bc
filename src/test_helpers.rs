//! Shared test utilities for the vitrine test suite.
//!
//! Provides fixture setup, manifest builders and a fixed clock so that
//! controller tests can assert on exact cookie and event contents.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = load_fixture_manifest(tmp.path());
//! assert_eq!(manifest.items(Category::Designs).len(), 3);
//!
//! let l = lang(Locale::En);
//! assert_eq!(l.translate("close"), "Close");
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use tempfile::TempDir;

use crate::config::I18nConfig;
use crate::i18n::LanguageContext;
use crate::manifest::{ContentItem, Manifest};
use crate::types::{Category, Locale, Orientation};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Parse `data.json` of a fixture site.
pub fn load_fixture_manifest(root: &Path) -> Manifest {
    let json = std::fs::read_to_string(root.join("data.json")).unwrap();
    Manifest::parse(&json).unwrap()
}

// =========================================================================
// Builders
// =========================================================================

/// Language context with stock i18n settings.
pub fn lang(locale: Locale) -> LanguageContext {
    LanguageContext::new(locale, &I18nConfig::default())
}

/// A manifest with `n` photos titled `Foto 0` … `Foto n-1`, alternating
/// horizontal and vertical.
pub fn manifest_with_photos(n: usize) -> Manifest {
    let items: Vec<ContentItem> = (0..n)
        .map(|i| {
            let orientation = if i % 2 == 0 {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            ContentItem::new(format!("/Fotografias/foto-{i}.jpg"))
                .with_title("pt", format!("Foto {i}"))
                .with_orientation(orientation)
        })
        .collect();
    let json = format!(
        r#"{{"{}":{}}}"#,
        Category::Fotografias.key(),
        serde_json::to_string(&items).unwrap()
    );
    Manifest::parse(&json).unwrap()
}

/// 2024-05-01T12:00:00Z, usable as a consent clock.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}
