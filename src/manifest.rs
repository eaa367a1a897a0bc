//! The content manifest (`data.json`).
//!
//! The manifest is produced by the asset export job and read once per page
//! load. Its canonical shape is keyed by category:
//!
//! ```json
//! {
//!   "fotografias": [
//!     { "url": "https://cdn/Fotografias/Praia.jpg",
//!       "titles": { "pt": "Praia", "en": "Beach" },
//!       "orientation": "horizontal" }
//!   ],
//!   "videos": [
//!     { "url": "https://cdn/Vídeos/clip.mp4",
//!       "thumbnail_url": "https://cdn/Thumbnails/clip.jpg",
//!       "titles": { "pt": "Clip" } }
//!   ],
//!   "carousel": [ { "url": "...", "titles": {...}, "descriptions": {...} } ],
//!   "covers": [ { "name": "Fotografias", "url": "..." } ]
//! }
//! ```
//!
//! Older exports are flat objects keyed by filename, where each value is an
//! item and the category is recovered from the storage folder in its URL
//! (see [`Category::from_url`]). Both shapes are accepted.
//!
//! ## Soft validation
//!
//! Parsing only fails when the document is not JSON or its root is not an
//! object. Individual entries that don't match the schema (not an object,
//! missing or empty `url`, unknown orientation) are skipped and reported in
//! [`Manifest::skipped`], so one bad export row never blanks a gallery.

use crate::naming;
use crate::types::{Category, Locale, Orientation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest root must be a JSON object")]
    NotAnObject,
}

/// One media item of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub url: String,
    /// Title per locale code. Codes outside the supported set are kept.
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Original filename, present in some exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ContentItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            titles: BTreeMap::new(),
            orientation: None,
            thumbnail_url: None,
            name: None,
        }
    }

    pub fn with_title(mut self, locale: &str, title: impl Into<String>) -> Self {
        self.titles.insert(locale.to_string(), title.into());
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Resolve the display title for `locale`.
    ///
    /// First non-empty of: the locale's title, the fallback locale's title,
    /// any other title, the title encoded in the URL filename.
    pub fn title(&self, locale: Locale, fallback: Locale) -> String {
        let lookup = |l: Locale| {
            self.titles
                .get(l.code())
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
        };
        lookup(locale)
            .or_else(|| lookup(fallback))
            .or_else(|| self.titles.values().map(|t| t.trim()).find(|t| !t.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| naming::title_from_url(&self.url, locale))
    }

    /// URL shown in the grid: videos preview their thumbnail when one exists.
    pub fn preview_url(&self, category: Category) -> &str {
        match category {
            Category::Videos => self
                .thumbnail_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .unwrap_or(&self.url),
            _ => &self.url,
        }
    }
}

/// A home-page carousel slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselSlide {
    pub url: String,
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

impl CarouselSlide {
    pub fn title(&self, locale: Locale, fallback: Locale) -> String {
        localized(&self.titles, locale, fallback)
    }

    pub fn description(&self, locale: Locale, fallback: Locale) -> String {
        localized(&self.descriptions, locale, fallback)
    }
}

/// Cover image for a section card on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cover {
    pub name: String,
    pub url: String,
}

fn localized(map: &BTreeMap<String, String>, locale: Locale, fallback: Locale) -> String {
    map.get(locale.code())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| map.get(fallback.code()))
        .cloned()
        .unwrap_or_default()
}

/// Why an entry was dropped while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Location in the document, e.g. `fotografias[3]` or `IMG_01.jpg`.
    pub location: String,
    pub reason: String,
}

/// Parsed manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: BTreeMap<Category, Vec<ContentItem>>,
    pub carousel: Vec<CarouselSlide>,
    pub covers: Vec<Cover>,
    pub skipped: Vec<SkippedEntry>,
}

impl Manifest {
    /// Parse a manifest document, skipping malformed entries.
    pub fn parse(json: &str) -> Result<Manifest, ManifestError> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(root) = root else {
            return Err(ManifestError::NotAnObject);
        };

        let mut manifest = Manifest::default();
        for (key, value) in root {
            if let Some(category) = Category::from_key(&key) {
                manifest.parse_category(category, &key, value);
            } else if key == "carousel" {
                manifest.carousel = parse_list(&key, value, &mut manifest.skipped);
            } else if key == "covers" {
                manifest.covers = parse_list(&key, value, &mut manifest.skipped);
            } else if value.get("url").is_some() {
                manifest.parse_flat_entry(&key, value);
            } else {
                log::debug!("ignoring unknown manifest key '{key}'");
            }
        }
        for (category, items) in &manifest.items {
            log::debug!("manifest: {} {category} item(s)", items.len());
        }
        Ok(manifest)
    }

    fn parse_category(&mut self, category: Category, key: &str, value: serde_json::Value) {
        let serde_json::Value::Array(entries) = value else {
            self.skip(key.to_string(), "category value is not an array");
            return;
        };
        for (idx, entry) in entries.into_iter().enumerate() {
            let location = format!("{key}[{idx}]");
            if let Some(item) = self.parse_item(location, entry) {
                self.items.entry(category).or_default().push(item);
            }
        }
    }

    fn parse_flat_entry(&mut self, key: &str, value: serde_json::Value) {
        let Some(item) = self.parse_item(key.to_string(), value) else {
            return;
        };
        match Category::from_url(&item.url) {
            Some(category) => self.items.entry(category).or_default().push(item),
            None => self.skip(key.to_string(), "URL is outside every category folder"),
        }
    }

    fn parse_item(&mut self, location: String, entry: serde_json::Value) -> Option<ContentItem> {
        match serde_json::from_value::<ContentItem>(entry) {
            Ok(item) if item.url.trim().is_empty() => {
                self.skip(location, "empty url");
                None
            }
            Ok(item) => Some(item),
            Err(e) => {
                self.skip(location, &e.to_string());
                None
            }
        }
    }

    fn skip(&mut self, location: String, reason: &str) {
        log::warn!("skipping manifest entry {location}: {reason}");
        self.skipped.push(SkippedEntry {
            location,
            reason: reason.to_string(),
        });
    }

    /// All valid items of a category, in manifest order.
    pub fn items(&self, category: Category) -> &[ContentItem] {
        self.items.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items of a category, optionally restricted to one orientation.
    ///
    /// Items without an orientation never match an orientation filter.
    pub fn filter(&self, category: Category, orientation: Option<Orientation>) -> Vec<ContentItem> {
        self.items(category)
            .iter()
            .filter(|item| orientation.is_none() || item.orientation == orientation)
            .cloned()
            .collect()
    }

    /// Cover whose name mentions `needle` (case-insensitive).
    pub fn cover(&self, needle: &str) -> Option<&Cover> {
        let needle = needle.to_lowercase();
        self.covers
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
    }

    /// Number of valid items across all categories.
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
    skipped: &mut Vec<SkippedEntry>,
) -> Vec<T> {
    let serde_json::Value::Array(entries) = value else {
        log::warn!("skipping manifest entry {key}: not an array");
        skipped.push(SkippedEntry {
            location: key.to_string(),
            reason: "not an array".to_string(),
        });
        return Vec::new();
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("skipping manifest entry {key}[{idx}]: {e}");
                skipped.push(SkippedEntry {
                    location: format!("{key}[{idx}]"),
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}
