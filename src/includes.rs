//! Shared header and footer injection.
//!
//! Pages carry empty `header-placeholder` / `footer-placeholder` elements;
//! the fragments live in the includes directory under a per-locale file
//! name. The footer and header are fetched independently. Only a header
//! that actually landed in the page emits `headerLoaded`, which is what
//! the menu and language switcher wait for.

use crate::config::IncludesConfig;
use crate::source::AssetSource;
use crate::surface::{EventBus, SiteEvent, Surface};
use crate::types::Locale;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

pub const HEADER_PLACEHOLDER: &str = "header-placeholder";
pub const FOOTER_PLACEHOLDER: &str = "footer-placeholder";

/// Fragment file names for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentFiles {
    pub header: &'static str,
    pub footer: &'static str,
}

pub fn fragment_files(locale: Locale) -> FragmentFiles {
    match locale {
        Locale::Pt => FragmentFiles {
            header: "cabecalho.html",
            footer: "rodape.html",
        },
        Locale::En => FragmentFiles {
            header: "header.html",
            footer: "footer.html",
        },
        Locale::Es => FragmentFiles {
            header: "cabecera.html",
            footer: "pie-de-pagina.html",
        },
    }
}

/// What happened to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    Injected,
    NoPlaceholder,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeReport {
    pub header: Injection,
    pub footer: Injection,
}

/// Inject the locale's header and footer fragments into the page.
pub fn inject_includes(
    surface: &mut dyn Surface,
    source: &dyn AssetSource,
    config: &IncludesConfig,
    locale: Locale,
    bus: &mut EventBus,
) -> IncludeReport {
    let files = fragment_files(locale);
    let dir = config.directory.trim_matches('/');

    let footer = inject(surface, source, FOOTER_PLACEHOLDER, &format!("{dir}/{}", files.footer));
    let header = inject(surface, source, HEADER_PLACEHOLDER, &format!("{dir}/{}", files.header));
    if header == Injection::Injected {
        bus.dispatch(SiteEvent::HeaderLoaded);
    }
    IncludeReport { header, footer }
}

fn inject(surface: &mut dyn Surface, source: &dyn AssetSource, placeholder: &str, path: &str) -> Injection {
    if !surface.has_container(placeholder) {
        log::warn!("placeholder '{placeholder}' not found, skipping {path}");
        return Injection::NoPlaceholder;
    }
    match source.fetch(path) {
        Ok(html) => {
            surface.set_html(placeholder, &html);
            Injection::Injected
        }
        Err(e) => {
            log::error!("error loading {placeholder} from {path}: {e}");
            Injection::Failed(e.to_string())
        }
    }
}

// ============================================================================
// On-disk audit
// ============================================================================

/// Presence of one expected fragment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentStatus {
    pub locale: Locale,
    pub file: &'static str,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentAudit {
    /// Includes directory relative to the site root.
    pub directory: String,
    pub expected: Vec<FragmentStatus>,
    /// `.html` files in the directory no locale refers to.
    pub unreferenced: Vec<String>,
}

impl FragmentAudit {
    pub fn missing(&self) -> impl Iterator<Item = &FragmentStatus> {
        self.expected.iter().filter(|f| !f.present)
    }
}

/// Check the includes directory under `site_root` for every locale's
/// header and footer.
pub fn audit_fragments(site_root: &Path, config: &IncludesConfig) -> FragmentAudit {
    let directory = config.directory.trim_matches('/').to_string();
    let dir = site_root.join(&directory);
    let found: BTreeSet<String> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".html"))
        .collect();

    let expected: Vec<FragmentStatus> = Locale::ALL
        .into_iter()
        .flat_map(|locale| {
            let files = fragment_files(locale);
            [files.header, files.footer].map(|file| FragmentStatus {
                locale,
                file,
                present: found.contains(file),
            })
        })
        .collect();
    let unreferenced = found
        .iter()
        .filter(|name| !expected.iter().any(|f| f.file == name.as_str()))
        .cloned()
        .collect();

    FragmentAudit {
        directory,
        expected,
        unreferenced,
    }
}
