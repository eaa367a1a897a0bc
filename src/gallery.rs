//! Infinite-scroll gallery loader.
//!
//! Loading a gallery into a container happens in two steps so that the
//! manifest fetch can suspend in between:
//!
//! 1. [`GalleryLoader::begin`] detaches whatever the container was showing,
//!    applies the orientation class, shows the loading message and hands out
//!    a [`Ticket`].
//! 2. [`GalleryLoader::complete`] takes the ticket and the fetch result. A
//!    ticket superseded by a later `begin` on the same container is ignored,
//!    so a slow fetch can never overwrite a newer one.
//!
//! [`GalleryLoader::load`] runs both steps against a synchronous
//! [`AssetSource`].
//!
//! The filtered items are revealed in batches. After each batch the last
//! tile is watched by the container's viewport trigger; when the host
//! reports that tile intersecting ([`GalleryLoader::on_intersect`]) the
//! tile is unwatched and the next batch is appended. Once every item is on
//! the page the trigger is disconnected.
//!
//! Presentations are the exception: they are few and heavy, so every one is
//! rendered immediately as an embedded frame with no trigger.

use crate::config::SiteConfig;
use crate::i18n::LanguageContext;
use crate::lightbox::LightboxItem;
use crate::manifest::{ContentItem, Manifest, ManifestError};
use crate::source::{AssetSource, FetchError};
use crate::surface::{Message, MessageKind, NodeId, Surface, Tile, TriggerId};
use crate::types::{Category, Orientation};
use std::collections::HashMap;
use thiserror::Error;

/// Container class applied while a horizontal filter is active.
pub const HORIZONTAL_CLASS: &str = "horizontal-gallery";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch manifest: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ManifestError),
}

/// Fetch and parse the site manifest.
pub fn fetch_manifest(source: &dyn AssetSource, path: &str) -> Result<Manifest, LoadError> {
    let body = source.fetch(path)?;
    Ok(Manifest::parse(&body)?)
}

/// Proof of a pending load for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    container: String,
    generation: u64,
}

impl Ticket {
    pub fn container(&self) -> &str {
        &self.container
    }
}

/// A gallery placeholder on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryTarget {
    pub container: &'static str,
    pub category: Category,
    pub orientation: Option<Orientation>,
}

/// Gallery shown by each page, keyed by the Portuguese page file.
const PAGE_GALLERIES: &[(&str, GalleryTarget)] = &[
    (
        "fotos-horizontais.html",
        GalleryTarget {
            container: "photo-h-gallery",
            category: Category::Fotografias,
            orientation: Some(Orientation::Horizontal),
        },
    ),
    (
        "fotos-verticais.html",
        GalleryTarget {
            container: "photo-v-gallery",
            category: Category::Fotografias,
            orientation: Some(Orientation::Vertical),
        },
    ),
    (
        "videos-horizontais.html",
        GalleryTarget {
            container: "video-h-gallery",
            category: Category::Videos,
            orientation: Some(Orientation::Horizontal),
        },
    ),
    (
        "videos-verticais.html",
        GalleryTarget {
            container: "video-v-gallery",
            category: Category::Videos,
            orientation: Some(Orientation::Vertical),
        },
    ),
    (
        "designs.html",
        GalleryTarget {
            container: "design-gallery",
            category: Category::Designs,
            orientation: None,
        },
    ),
    (
        "apresentacoes.html",
        GalleryTarget {
            container: "presentation-gallery",
            category: Category::Apresentacoes,
            orientation: None,
        },
    ),
];

/// The gallery a page hosts, from its page key (see [`crate::i18n::page_key`]).
pub fn gallery_for_page(page_key: &str) -> Option<GalleryTarget> {
    PAGE_GALLERIES
        .iter()
        .find(|(key, _)| *key == page_key)
        .map(|(_, target)| *target)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Ready,
    Failed,
}

/// Per-container gallery state.
#[derive(Debug)]
struct GalleryState {
    generation: u64,
    category: Category,
    orientation: Option<Orientation>,
    phase: Phase,
    items: Vec<ContentItem>,
    cursor: usize,
    batches: usize,
    trigger: Option<TriggerId>,
}

/// Read-only view of a container's gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryStatus {
    pub category: Category,
    pub orientation: Option<Orientation>,
    pub total: usize,
    pub shown: usize,
    /// Reveal steps performed so far.
    pub batches: usize,
    pub loading: bool,
    pub failed: bool,
}

impl GalleryStatus {
    pub fn is_complete(&self) -> bool {
        !self.loading && self.shown == self.total
    }
}

#[derive(Debug)]
pub struct GalleryLoader {
    batch_size: usize,
    root_margin_px: u32,
    placeholder_url: String,
    manifest_path: String,
    next_generation: u64,
    states: HashMap<String, GalleryState>,
}

impl GalleryLoader {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            batch_size: config.gallery.batch_size.max(1),
            root_margin_px: config.gallery.root_margin_px,
            placeholder_url: config.placeholder_url(),
            manifest_path: config.manifest_path.clone(),
            next_generation: 0,
            states: HashMap::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start loading `category` into `container`.
    ///
    /// Returns `None` when the page has no such container.
    pub fn begin(
        &mut self,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
        container: &str,
        category: Category,
        orientation: Option<Orientation>,
    ) -> Option<Ticket> {
        if !surface.has_container(container) {
            log::warn!("gallery container '{container}' not found, skipping");
            return None;
        }
        if let Some(trigger) = self.states.get_mut(container).and_then(|s| s.trigger.take()) {
            surface.disconnect(trigger);
        }

        surface.set_container_class(
            container,
            HORIZONTAL_CLASS,
            orientation == Some(Orientation::Horizontal),
        );
        let loading_key = match category {
            Category::Apresentacoes => "loading_presentations",
            _ => "loading_content",
        };
        surface.show_message(container, Message::new(MessageKind::Loading, lang.translate(loading_key)));

        self.next_generation += 1;
        let generation = self.next_generation;
        self.states.insert(
            container.to_string(),
            GalleryState {
                generation,
                category,
                orientation,
                phase: Phase::Loading,
                items: Vec::new(),
                cursor: 0,
                batches: 0,
                trigger: None,
            },
        );
        Some(Ticket {
            container: container.to_string(),
            generation,
        })
    }

    /// Finish a load with the manifest fetch result.
    ///
    /// Returns `false` when the ticket was superseded and the result dropped.
    pub fn complete(
        &mut self,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
        ticket: Ticket,
        result: Result<&Manifest, LoadError>,
    ) -> bool {
        let Some(state) = self
            .states
            .get_mut(&ticket.container)
            .filter(|s| s.generation == ticket.generation && s.phase == Phase::Loading)
        else {
            log::debug!("ignoring stale gallery load for '{}'", ticket.container);
            return false;
        };
        let container = ticket.container.as_str();
        let type_name = lang.translate(state.category.label_key());

        let manifest = match result {
            Ok(manifest) => manifest,
            Err(e) => {
                log::error!("error loading {} into '{container}': {e}", state.category);
                state.phase = Phase::Failed;
                surface.show_message(
                    container,
                    Message::new(
                        MessageKind::Error,
                        lang.translate_with("error_loading_content", &[("type", &type_name)]),
                    ),
                );
                return true;
            }
        };

        state.items = manifest.filter(state.category, state.orientation);
        state.phase = Phase::Ready;
        surface.clear(container);

        if state.items.is_empty() {
            let text = match state.category {
                Category::Apresentacoes => lang.translate("no_presentations_found"),
                _ => lang.translate_with("no_content_found", &[("type", &type_name)]),
            };
            surface.show_message(container, Message::new(MessageKind::Empty, text));
            return true;
        }

        if state.category == Category::Apresentacoes {
            let count = state.items.len();
            self.render_range(surface, lang, container, count);
        } else {
            self.render_range(surface, lang, container, self.batch_size);
        }
        true
    }

    /// Fetch the manifest from `source` and load it into `container`.
    pub fn load(
        &mut self,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
        source: &dyn AssetSource,
        container: &str,
        category: Category,
        orientation: Option<Orientation>,
    ) -> bool {
        let Some(ticket) = self.begin(surface, lang, container, category, orientation) else {
            return false;
        };
        match fetch_manifest(source, &self.manifest_path) {
            Ok(manifest) => self.complete(surface, lang, ticket, Ok(&manifest)),
            Err(e) => self.complete(surface, lang, ticket, Err(e)),
        }
    }

    /// Viewport callback: `node`, watched by `trigger`, came into range.
    ///
    /// Returns `true` when a batch was revealed.
    pub fn on_intersect(
        &mut self,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
        trigger: TriggerId,
        node: NodeId,
    ) -> bool {
        let Some(container) = self
            .states
            .iter()
            .find(|(_, s)| s.trigger == Some(trigger))
            .map(|(id, _)| id.clone())
        else {
            log::debug!("intersection from detached trigger {trigger:?}");
            return false;
        };
        surface.unobserve(trigger, node);
        self.render_range(surface, lang, &container, self.batch_size)
    }

    /// Append up to `count` more items, then watch the last tile or finish.
    fn render_range(
        &mut self,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
        container: &str,
        count: usize,
    ) -> bool {
        let Some(state) = self.states.get_mut(container) else {
            return false;
        };
        let end = (state.cursor + count).min(state.items.len());
        if state.cursor >= end {
            if let Some(trigger) = state.trigger.take() {
                surface.disconnect(trigger);
            }
            return false;
        }

        let mut last = None;
        for index in state.cursor..end {
            let item = &state.items[index];
            let tile = Tile {
                category: state.category,
                index,
                title: item.title(lang.current(), lang.fallback()),
                preview_url: item.preview_url(state.category).to_string(),
                target_url: item.url.clone(),
                fallback_url: self.placeholder_url.clone(),
                orientation: item.orientation,
            };
            last = Some(surface.append_tile(container, tile));
        }
        state.cursor = end;
        state.batches += 1;
        log::debug!(
            "'{container}': revealed {}/{} {} items",
            state.cursor,
            state.items.len(),
            state.category
        );

        if state.cursor < state.items.len() {
            let trigger = match state.trigger {
                Some(trigger) => trigger,
                None => {
                    let trigger = surface.create_trigger(self.root_margin_px);
                    state.trigger = Some(trigger);
                    trigger
                }
            };
            if let Some(node) = last {
                surface.observe(trigger, node);
            }
        } else if let Some(trigger) = state.trigger.take() {
            surface.disconnect(trigger);
        }
        true
    }

    pub fn status(&self, container: &str) -> Option<GalleryStatus> {
        self.states.get(container).map(|s| GalleryStatus {
            category: s.category,
            orientation: s.orientation,
            total: s.items.len(),
            shown: s.cursor,
            batches: s.batches,
            loading: s.phase == Phase::Loading,
            failed: s.phase == Phase::Failed,
        })
    }

    /// The trigger currently attached to a container, if any.
    pub fn trigger(&self, container: &str) -> Option<TriggerId> {
        self.states.get(container).and_then(|s| s.trigger)
    }

    /// The container's full filtered list as a lightbox sequence.
    pub fn lightbox_sequence(&self, container: &str, lang: &LanguageContext) -> Vec<LightboxItem> {
        self.states
            .get(container)
            .map(|s| {
                s.items
                    .iter()
                    .map(|item| LightboxItem::from_content(item, s.category, lang))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::surface::MemorySurface;
    use crate::test_helpers::{lang, manifest_with_photos};
    use crate::types::Locale;
    use proptest::prelude::*;

    const C: &str = "photo-h-gallery";

    fn loader(batch_size: usize) -> GalleryLoader {
        let mut config = SiteConfig::default();
        config.gallery.batch_size = batch_size;
        GalleryLoader::new(&config)
    }

    /// Scroll to the bottom until nothing more is revealed.
    fn drain(loader: &mut GalleryLoader, s: &mut MemorySurface, l: &LanguageContext) -> Vec<usize> {
        let mut sizes = Vec::new();
        loop {
            let pending = s.pending_intersections();
            let Some(&(trigger, node)) = pending.first() else {
                break;
            };
            let before = s.tiles(C).len();
            loader.on_intersect(&mut *s, l, trigger, node);
            sizes.push(s.tiles(C).len() - before);
        }
        sizes
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn missing_container_is_skipped() {
        let mut s = MemorySurface::new();
        let mut g = loader(12);
        assert!(g.begin(&mut s, &lang(Locale::Pt), C, Category::Fotografias, None).is_none());
    }

    #[test]
    fn begin_shows_loading_and_orientation_class() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::En);
        g.begin(&mut s, &l, C, Category::Fotografias, Some(Orientation::Horizontal));
        assert!(s.has_class(C, HORIZONTAL_CLASS));
        assert_eq!(s.message(C).unwrap().text, "Loading content...");
        assert!(g.status(C).unwrap().loading);

        g.begin(&mut s, &l, C, Category::Fotografias, Some(Orientation::Vertical));
        assert!(!s.has_class(C, HORIZONTAL_CLASS));
    }

    #[test]
    fn first_batch_and_trigger() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let m = manifest_with_photos(30);
        let ticket = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        assert!(g.complete(&mut s, &l, ticket, Ok(&m)));

        assert_eq!(s.tiles(C).len(), 12);
        assert!(s.message(C).is_none());
        let trigger = g.trigger(C).unwrap();
        assert_eq!(s.root_margin(trigger), Some(500));
        assert_eq!(s.observed(trigger).len(), 1);

        let sizes = drain(&mut g, &mut s, &l);
        assert_eq!(sizes, vec![12, 6]);
        assert!(g.status(C).unwrap().is_complete());
        assert!(!s.is_connected(trigger));
        assert_eq!(s.disconnect_count(trigger), 1);
    }

    #[test]
    fn single_batch_needs_no_trigger() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let m = manifest_with_photos(5);
        let ticket = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        g.complete(&mut s, &l, ticket, Ok(&m));
        assert_eq!(s.tiles(C).len(), 5);
        assert!(g.trigger(C).is_none());
        assert!(s.pending_intersections().is_empty());
    }

    #[test]
    fn empty_result_shows_translated_message() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::En);
        let m = manifest_with_photos(0);
        let ticket = g.begin(&mut s, &l, C, Category::Designs, None).unwrap();
        g.complete(&mut s, &l, ticket, Ok(&m));
        let msg = s.message(C).unwrap();
        assert_eq!(msg.kind, MessageKind::Empty);
        assert_eq!(msg.text, "No content for 'Designs' found.");
    }

    #[test]
    fn fetch_failure_shows_error_only() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let source = MemorySource::new().with_failure("data.json", "500 Internal Server Error");
        g.load(&mut s, &l, &source, C, Category::Videos, None);
        assert_eq!(s.children(C).len(), 1);
        let msg = s.message(C).unwrap();
        assert_eq!(msg.kind, MessageKind::Error);
        assert!(msg.text.contains("Vídeos"));
        assert!(g.status(C).unwrap().failed);
    }

    #[test]
    fn malformed_manifest_is_a_load_error() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let source = MemorySource::new().with("data.json", "[1, 2");
        g.load(&mut s, &l, &source, C, Category::Fotografias, None);
        assert_eq!(s.message(C).unwrap().kind, MessageKind::Error);
    }

    #[test]
    fn tiles_carry_titles_classes_and_fallback() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut config = SiteConfig::default();
        config.base_path = "/Bia".into();
        let mut g = GalleryLoader::new(&config);
        let l = lang(Locale::Es);
        let json = r#"{"videos":[{"url":"/Vídeos/praia_beach_playa.mp4","thumbnail_url":"/t.jpg","orientation":"vertical"}]}"#;
        let source = MemorySource::new().with("data.json", json);
        g.load(&mut s, &l, &source, C, Category::Videos, None);

        let tiles = s.tiles(C);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].title, "playa");
        assert_eq!(tiles[0].preview_url, "/t.jpg");
        assert_eq!(tiles[0].target_url, "/Vídeos/praia_beach_playa.mp4");
        assert_eq!(tiles[0].fallback_url, "/Bia/imagens/placeholder.png");
        assert_eq!(tiles[0].classes(), vec!["video-item", "orientation-vertical"]);
    }

    #[test]
    fn presentations_render_unbatched() {
        let presentations = "presentation-gallery";
        let mut s = MemorySurface::with_containers(&[presentations]);
        let mut g = loader(2);
        let l = lang(Locale::Pt);
        let items: Vec<_> = (0..5)
            .map(|i| format!(r#"{{"url":"/Apresentacoes/p{i}.pdf","titles":{{"pt":"P{i}"}}}}"#))
            .collect();
        let json = format!(r#"{{"apresentacoes":[{}]}}"#, items.join(","));
        let source = MemorySource::new().with("data.json", json);
        g.load(&mut s, &l, &source, presentations, Category::Apresentacoes, None);
        assert_eq!(s.tiles(presentations).len(), 5);
        assert!(g.trigger(presentations).is_none());
        assert_eq!(g.status(presentations).unwrap().batches, 1);
    }

    #[test]
    fn no_presentations_message() {
        let presentations = "presentation-gallery";
        let mut s = MemorySurface::with_containers(&[presentations]);
        let mut g = loader(12);
        let l = lang(Locale::En);
        let source = MemorySource::new().with("data.json", "{}");
        g.load(&mut s, &l, &source, presentations, Category::Apresentacoes, None);
        assert_eq!(s.message(presentations).unwrap().text, "No presentations found.");
    }

    // =========================================================================
    // Re-loading and superseded fetches
    // =========================================================================

    #[test]
    fn reload_detaches_previous_trigger_once() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(4);
        let l = lang(Locale::Pt);
        let m = manifest_with_photos(20);

        let t1 = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        g.complete(&mut s, &l, t1, Ok(&m));
        let first = g.trigger(C).unwrap();

        let t2 = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        assert_eq!(s.disconnect_count(first), 1);
        g.complete(&mut s, &l, t2, Ok(&m));
        assert_eq!(s.disconnect_count(first), 1);
        assert_eq!(s.tiles(C).len(), 4);

        // The old trigger no longer drives rendering.
        assert!(!g.on_intersect(&mut s, &l, first, NodeId(1)));
        assert_eq!(s.tiles(C).len(), 4);
    }

    #[test]
    fn superseded_completion_is_ignored() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let old = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        let new = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();

        assert!(g.complete(&mut s, &l, new, Ok(&manifest_with_photos(3))));
        assert!(!g.complete(&mut s, &l, old, Ok(&manifest_with_photos(9))));
        assert_eq!(s.tiles(C).len(), 3);
    }

    #[test]
    fn ticket_is_single_use() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(12);
        let l = lang(Locale::Pt);
        let m = manifest_with_photos(3);
        let ticket = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        assert!(g.complete(&mut s, &l, ticket.clone(), Ok(&m)));
        assert!(!g.complete(&mut s, &l, ticket, Ok(&m)));
        assert_eq!(s.tiles(C).len(), 3);
    }

    #[test]
    fn lightbox_sequence_covers_unrevealed_items() {
        let mut s = MemorySurface::with_containers(&[C]);
        let mut g = loader(2);
        let l = lang(Locale::Pt);
        let ticket = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
        g.complete(&mut s, &l, ticket, Ok(&manifest_with_photos(5)));
        let seq = g.lightbox_sequence(C, &l);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq[4].title, "Foto 4");
    }

    #[test]
    fn page_galleries() {
        let target = gallery_for_page("fotos-verticais.html").unwrap();
        assert_eq!(target.container, "photo-v-gallery");
        assert_eq!(target.orientation, Some(Orientation::Vertical));
        assert_eq!(
            gallery_for_page("apresentacoes.html").unwrap().category,
            Category::Apresentacoes
        );
        assert!(gallery_for_page("index.html").is_none());
    }

    proptest! {
        #[test]
        fn reveal_steps_match_batch_arithmetic(n in 0usize..120, b in 1usize..25) {
            let mut s = MemorySurface::with_containers(&[C]);
            let mut g = loader(b);
            let l = lang(Locale::Pt);
            let ticket = g.begin(&mut s, &l, C, Category::Fotografias, None).unwrap();
            g.complete(&mut s, &l, ticket, Ok(&manifest_with_photos(n)));

            let mut sizes = vec![s.tiles(C).len()];
            sizes.extend(drain(&mut g, &mut s, &l));
            if n == 0 {
                sizes.clear();
            }

            prop_assert_eq!(sizes.len(), n.div_ceil(b));
            let mut remaining = n;
            for size in sizes {
                prop_assert_eq!(size, b.min(remaining));
                remaining -= size;
            }
            prop_assert_eq!(remaining, 0);
            prop_assert_eq!(g.status(C).unwrap().batches, n.div_ceil(b));
        }
    }
}
