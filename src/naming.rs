//! Title parsing for the `pt_en_es.ext` asset naming convention.
//!
//! Uploaded assets carry their localized titles in the filename, one title
//! per locale separated by underscores, in `pt`, `en`, `es` order. Missing
//! translations fall back to the first (Portuguese) title:
//!
//! - `Praia_Beach_Playa.jpg` → pt "Praia", en "Beach", es "Playa"
//! - `Praia_Beach.jpg` → pt "Praia", en "Beach", es "Praia"
//! - `Praia.jpg` → "Praia" in every locale
//!
//! The manifest normally carries explicit titles; these parsed names are the
//! last resort when an entry has none.

use crate::types::Locale;

/// Titles derived from an asset filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTitles {
    pub pt: String,
    pub en: String,
    pub es: String,
}

impl ParsedTitles {
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Pt => &self.pt,
            Locale::En => &self.en,
            Locale::Es => &self.es,
        }
    }
}

/// Parse a filename (with or without extension) into per-locale titles.
pub fn parse_titles(filename: &str) -> ParsedTitles {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => filename,
    };
    let parts: Vec<&str> = stem.split('_').map(str::trim).collect();
    let first = parts.first().copied().unwrap_or(stem);
    let pick = |idx: usize| {
        parts
            .get(idx)
            .copied()
            .filter(|p| !p.is_empty())
            .unwrap_or(first)
            .to_string()
    };
    ParsedTitles {
        pt: first.to_string(),
        en: pick(1),
        es: pick(2),
    }
}

/// Last path segment of a URL, percent-decoded, without query or fragment.
///
/// `https://cdn/Fotografias/Praia%20Azul_Blue%20Beach.jpg?v=2` →
/// `Praia Azul_Blue Beach.jpg`
pub fn url_filename(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);
    percent_decode(last)
}

/// Localized title for an asset URL, following the naming convention.
pub fn title_from_url(url: &str, locale: Locale) -> String {
    let filename = url_filename(url);
    parse_titles(&filename).get(locale).to_string()
}

/// Decode `%XX` escapes. Invalid escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_titles() {
        let t = parse_titles("Praia_Beach_Playa.jpg");
        assert_eq!(t.pt, "Praia");
        assert_eq!(t.en, "Beach");
        assert_eq!(t.es, "Playa");
    }

    #[test]
    fn missing_translations_fall_back_to_first() {
        let t = parse_titles("Praia_Beach.jpg");
        assert_eq!(t.es, "Praia");

        let t = parse_titles("Praia.jpg");
        assert_eq!(t.en, "Praia");
        assert_eq!(t.es, "Praia");
    }

    #[test]
    fn empty_segment_falls_back_to_first() {
        let t = parse_titles("Praia__Playa.jpg");
        assert_eq!(t.en, "Praia");
        assert_eq!(t.es, "Playa");
    }

    #[test]
    fn titles_are_trimmed() {
        let t = parse_titles("Praia _ Beach .png");
        assert_eq!(t.pt, "Praia");
        assert_eq!(t.en, "Beach");
    }

    #[test]
    fn no_extension() {
        let t = parse_titles("Retrato_Portrait");
        assert_eq!(t.en, "Portrait");
    }

    #[test]
    fn dotfile_keeps_whole_name() {
        let t = parse_titles(".hidden");
        assert_eq!(t.pt, ".hidden");
    }

    #[test]
    fn url_filename_strips_path_and_query() {
        assert_eq!(
            url_filename("https://cdn.example/Fotografias/Praia%20Azul_Blue%20Beach.jpg?v=2"),
            "Praia Azul_Blue Beach.jpg"
        );
        assert_eq!(url_filename("a.jpg"), "a.jpg");
    }

    #[test]
    fn url_filename_keeps_invalid_escapes() {
        assert_eq!(url_filename("/x/100%_done.jpg"), "100%_done.jpg");
        assert_eq!(url_filename("/x/end%2"), "end%2");
    }

    #[test]
    fn url_filename_decodes_utf8() {
        assert_eq!(url_filename("/V%C3%ADdeos/a.mp4"), "a.mp4");
        assert_eq!(url_filename("/x/Cora%C3%A7%C3%A3o.jpg"), "Coração.jpg");
    }

    #[test]
    fn title_from_url_per_locale() {
        let url = "https://cdn.example/Designs/Cartaz_Poster_Cartel.png";
        assert_eq!(title_from_url(url, Locale::Pt), "Cartaz");
        assert_eq!(title_from_url(url, Locale::En), "Poster");
        assert_eq!(title_from_url(url, Locale::Es), "Cartel");
    }
}
