//! # Vitrine
//!
//! The interactive layer of a static, multilingual portfolio site: lazy
//! gallery loading, a media lightbox, cookie consent, consent-gated
//! analytics, language switching and shared header/footer injection.
//!
//! # Architecture: Controllers Over a Surface
//!
//! Every controller talks to the page through the [`surface::Surface`]
//! trait and to assets through [`source::AssetSource`]. Nothing reaches for
//! global state; the language, the cookie jar and the event bus are passed
//! in explicitly, bundled per page view in [`page::PageSession`].
//!
//! ```text
//! data.json ──fetch──▶ manifest ──filter──▶ gallery ──batches──▶ surface
//!                                              │
//!                                   tile click ▼
//!                                          lightbox ──overlay──▶ surface
//!
//! cookie jar ◀──commit── consent ──cookieConsentChanged──▶ event bus ──▶ analytics
//! ```
//!
//! [`surface::MemorySurface`] records everything a controller does, which is
//! what the tests assert against and what `vitrine preview` renders to HTML.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`page`] | One page view: wires the controllers to a surface, jar and bus |
//! | [`gallery`] | Category/orientation filtering, batched reveal, stale-load protection |
//! | [`lightbox`] | Modal viewer for images, videos and embeds with keyboard navigation |
//! | [`consent`] | Cookie consent state machine, banner and settings modal |
//! | [`analytics`] | Consent-gated gtag calls, cookie cleanup and engagement tracking |
//! | [`i18n`] | Locale resolution, translation tables, localized page links |
//! | [`includes`] | Per-locale header/footer injection and on-disk fragment audit |
//! | [`manifest`] | `data.json` parsing, both category-keyed and flat layouts |
//! | [`naming`] | Titles from `pt_en_es` media file names |
//! | [`surface`] | The page seam, its in-memory implementation and the event bus |
//! | [`storage`] | Cookie jar and key-value store seams |
//! | [`source`] | Asset fetch seam over a directory or memory |
//! | [`render`] | Maud rendering of surface contents for previews |
//! | [`config`] | `config.toml` loading, validation and merging over stock defaults |
//! | [`types`] | Locale, category, orientation and media kind |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Async Fetch as Begin/Complete
//!
//! A gallery load is split into [`gallery::GalleryLoader::begin`], which hands
//! out a ticket, and [`gallery::GalleryLoader::complete`]. Starting another
//! load on the same container invalidates the older ticket, so a slow
//! response can never overwrite a newer one.
//!
//! ## Consent Is a Broadcast
//!
//! The consent manager never calls analytics directly. It writes the cookie
//! and dispatches `cookieConsentChanged`; any listener (analytics today,
//! marketing tags tomorrow) reacts on its own. Analytics records its gtag
//! calls and requested cookie deletions instead of executing them, so the
//! host decides how to run them.

pub mod analytics;
pub mod config;
pub mod consent;
pub mod gallery;
pub mod i18n;
pub mod includes;
pub mod lightbox;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod page;
pub mod render;
pub mod source;
pub mod storage;
pub mod surface;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
