//! Shared vocabulary used by every controller.
//!
//! These enums appear in the manifest JSON, in the config file, on the
//! command line and in rendered markup, so their string forms are fixed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A site language. The site ships Portuguese, English and Spanish pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Pt,
    En,
    Es,
}

impl Locale {
    /// Every supported locale, in switcher order.
    pub const ALL: [Locale; 3] = [Locale::Pt, Locale::En, Locale::Es];

    /// Two-letter code used in URL paths and manifest title maps.
    pub fn code(self) -> &'static str {
        match self {
            Locale::Pt => "pt",
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// Parse a two-letter code. Case-insensitive; anything else is `None`.
    pub fn from_code(code: &str) -> Option<Locale> {
        Locale::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Flag-icon code shown next to the language in the switcher.
    pub fn flag(self) -> &'static str {
        match self {
            Locale::Pt => "pt",
            Locale::En => "gb",
            Locale::Es => "es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s).ok_or_else(|| format!("unsupported locale '{s}' (expected pt, en or es)"))
    }
}

/// A gallery category, i.e. a top-level key of the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fotografias,
    Videos,
    Designs,
    Apresentacoes,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Fotografias,
        Category::Videos,
        Category::Designs,
        Category::Apresentacoes,
    ];

    /// Manifest key for this category.
    pub fn key(self) -> &'static str {
        match self {
            Category::Fotografias => "fotografias",
            Category::Videos => "videos",
            Category::Designs => "designs",
            Category::Apresentacoes => "apresentacoes",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Prefix of the tile CSS class (`photo` → `photo-item`, `photo-overlay`).
    pub fn tile_class(self) -> &'static str {
        match self {
            Category::Fotografias => "photo",
            Category::Videos => "video",
            Category::Designs => "design",
            Category::Apresentacoes => "presentation",
        }
    }

    /// Translation key naming the category in messages.
    pub fn label_key(self) -> &'static str {
        match self {
            Category::Fotografias => "photos",
            Category::Videos => "videos",
            Category::Designs => "designs",
            Category::Apresentacoes => "presentations",
        }
    }

    /// How items of this category are displayed when opened.
    pub fn media_kind(self) -> MediaKind {
        match self {
            Category::Videos => MediaKind::Video,
            Category::Apresentacoes => MediaKind::Embed,
            Category::Fotografias | Category::Designs => MediaKind::Image,
        }
    }

    /// Storage folder segment that identifies the category inside an asset URL.
    ///
    /// Used to classify entries of flat, filename-keyed manifests.
    pub fn url_folder(self) -> &'static str {
        match self {
            Category::Fotografias => "/Fotografias/",
            Category::Videos => "/Vídeos/",
            Category::Designs => "/Designs/",
            Category::Apresentacoes => "/Apresenta",
        }
    }

    /// Classify an asset URL by its storage folder.
    pub fn from_url(url: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| url.contains(c.url_folder()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_key(&s.to_lowercase()).ok_or_else(|| {
            format!("unknown category '{s}' (expected fotografias, videos, designs or apresentacoes)")
        })
    }
}

/// Frame orientation of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Horizontal => "horizontal",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "horizontal" | "h" => Ok(Orientation::Horizontal),
            "vertical" | "v" => Ok(Orientation::Vertical),
            _ => Err(format!("unknown orientation '{s}' (expected horizontal or vertical)")),
        }
    }
}

/// How a media item is presented when opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Embedded document frame (presentations).
    Embed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_codes_roundtrip() {
        for locale in Locale::ALL {
            assert_eq!(Locale::from_code(locale.code()), Some(locale));
        }
        assert_eq!(Locale::from_code("EN"), Some(Locale::En));
        assert_eq!(Locale::from_code("fr"), None);
    }

    #[test]
    fn locale_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Es).unwrap(), "\"es\"");
    }

    #[test]
    fn category_classifies_urls_by_folder() {
        assert_eq!(
            Category::from_url("https://cdn.example/Fotografias/praia.jpg"),
            Some(Category::Fotografias)
        );
        assert_eq!(
            Category::from_url("https://cdn.example/Vídeos/clip.mp4"),
            Some(Category::Videos)
        );
        assert_eq!(
            Category::from_url("https://cdn.example/Apresentações/deck.pdf"),
            Some(Category::Apresentacoes)
        );
        assert_eq!(Category::from_url("https://cdn.example/other/x.jpg"), None);
    }

    #[test]
    fn category_tile_classes() {
        assert_eq!(Category::Fotografias.tile_class(), "photo");
        assert_eq!(Category::Videos.tile_class(), "video");
        assert_eq!(Category::Designs.tile_class(), "design");
    }

    #[test]
    fn orientation_parses_short_forms() {
        assert_eq!("h".parse::<Orientation>(), Ok(Orientation::Horizontal));
        assert_eq!("Vertical".parse::<Orientation>(), Ok(Orientation::Vertical));
        assert!("diagonal".parse::<Orientation>().is_err());
    }
}
