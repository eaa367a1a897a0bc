//! One loaded page and the controllers attached to it.
//!
//! [`PageSession`] is the explicit context every controller receives its
//! collaborators from: the resolved language, the rendering surface, the
//! cookie jar and the event bus. A host creates one per page view, calls
//! [`boot`](PageSession::boot) once the document is ready, then forwards
//! user interaction to the session methods.

use crate::analytics::{AnalyticsGate, url_host};
use crate::config::SiteConfig;
use crate::consent::{ConsentHost, ConsentManager, ConsentState};
use crate::gallery::{GalleryLoader, GalleryTarget, gallery_for_page};
use crate::i18n::{LanguageContext, page_key};
use crate::includes::{IncludeReport, inject_includes};
use crate::lightbox::Lightbox;
use crate::source::AssetSource;
use crate::storage::{CookieJar, KeyValueStore};
use crate::surface::{EventBus, MemorySurface, Surface};
use crate::types::Category;
use std::cell::RefCell;
use std::rc::Rc;

/// What [`PageSession::boot`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct BootReport {
    pub includes: IncludeReport,
    pub consent: ConsentState,
    /// The page's gallery, when it has one and its container exists.
    pub gallery: Option<GalleryTarget>,
}

pub struct PageSession<S, J> {
    config: SiteConfig,
    path: String,
    pub lang: LanguageContext,
    pub surface: S,
    pub jar: J,
    pub bus: EventBus,
    pub gallery: GalleryLoader,
    pub lightbox: Lightbox,
    pub consent: ConsentManager,
    pub analytics: Rc<RefCell<AnalyticsGate>>,
}

/// Split a page address into its host (absolute URLs only) and path.
fn split_page_url(url: &str) -> (Option<&str>, &str) {
    let Some(host) = url_host(url) else {
        return (None, url);
    };
    let after_scheme = url.split_once("//").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find(['/', '?', '#'])
        .map_or("/", |start| &after_scheme[start..]);
    (Some(host), path)
}

impl<S: Surface, J: CookieJar> PageSession<S, J> {
    /// Open a page at `url`: a site path (`/en/designs.html`) or an absolute
    /// URL. Only an absolute URL tells analytics the page host, which scopes
    /// cookie deletion and external-link detection.
    pub fn new(
        config: SiteConfig,
        url: &str,
        store: &mut dyn KeyValueStore,
        surface: S,
        jar: J,
    ) -> Self {
        let (host, path) = split_page_url(url);
        let lang = LanguageContext::resolve(path, &config.i18n, store);
        let consent = ConsentManager::new(&config.consent);
        let mut gate = AnalyticsGate::new(&config.analytics, consent.preferences(&jar).as_ref());
        if let Some(host) = host {
            gate = gate.with_hostname(host);
        }
        let analytics = Rc::new(RefCell::new(gate));
        let mut bus = EventBus::new();
        bus.subscribe(analytics.clone());
        Self {
            gallery: GalleryLoader::new(&config),
            lightbox: Lightbox::new(&config.lightbox, &lang),
            path: path.to_string(),
            config,
            lang,
            surface,
            jar,
            bus,
            consent,
            analytics,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Inject includes, evaluate consent and load the page's gallery.
    pub fn boot(&mut self, source: &dyn AssetSource) -> BootReport {
        let includes = inject_includes(
            &mut self.surface,
            source,
            &self.config.includes,
            self.lang.current(),
            &mut self.bus,
        );
        let consent = self.consent.evaluate(&self.jar, &mut self.surface, &self.lang);

        let gallery = gallery_for_page(page_key(&self.path)).filter(|target| {
            self.gallery.load(
                &mut self.surface,
                &self.lang,
                source,
                target.container,
                target.category,
                target.orientation,
            )
        });
        BootReport {
            includes,
            consent,
            gallery,
        }
    }

    /// Open the lightbox on tile `index` of `container`, browsing the whole
    /// filtered list. Presentation tiles are already embedded and do not open.
    pub fn activate_tile(&mut self, container: &str, index: usize) -> bool {
        let Some(status) = self.gallery.status(container) else {
            return false;
        };
        if status.category == Category::Apresentacoes || index >= status.total {
            return false;
        }
        let sequence = self.gallery.lightbox_sequence(container, &self.lang);
        self.lightbox.open_sequence(&mut self.surface, sequence, index);
        true
    }

    pub fn accept_all(&mut self) {
        let host = ConsentHost {
            jar: &mut self.jar,
            surface: &mut self.surface,
            bus: &mut self.bus,
        };
        self.consent.accept_all(host);
        self.flush_analytics_cookies();
    }

    pub fn accept_necessary(&mut self) {
        let host = ConsentHost {
            jar: &mut self.jar,
            surface: &mut self.surface,
            bus: &mut self.bus,
        };
        self.consent.accept_necessary(host);
        self.flush_analytics_cookies();
    }

    pub fn save_custom(&mut self, analytics: bool, marketing: bool) {
        let host = ConsentHost {
            jar: &mut self.jar,
            surface: &mut self.surface,
            bus: &mut self.bus,
        };
        self.consent.save_custom(host, analytics, marketing);
        self.flush_analytics_cookies();
    }

    /// Forget the stored choice and show the banner again.
    pub fn revoke_consent(&mut self) {
        let host = ConsentHost {
            jar: &mut self.jar,
            surface: &mut self.surface,
            bus: &mut self.bus,
        };
        self.consent.revoke(host, &self.lang);
        self.flush_analytics_cookies();
    }

    pub fn show_consent_settings(&mut self) {
        self.consent
            .show_settings(&self.jar, &mut self.surface, &self.lang);
    }

    /// Switch the page language. Already rendered text is not re-translated.
    pub fn set_language(&mut self, code: &str, store: &mut dyn KeyValueStore) -> bool {
        if !self.lang.set_language(code, store) {
            return false;
        }
        self.lightbox.close(&mut self.surface);
        self.lightbox = Lightbox::new(&self.config.lightbox, &self.lang);
        true
    }

    fn flush_analytics_cookies(&mut self) {
        let removals = self.analytics.borrow_mut().take_cookie_removals();
        for cookie in removals {
            self.jar.set(cookie);
        }
    }
}

impl<J: CookieJar> PageSession<MemorySurface, J> {
    /// Simulate scrolling to the bottom `batches` times. Returns the number
    /// of batches actually revealed.
    pub fn reveal_batches(&mut self, batches: usize) -> usize {
        let mut revealed = 0;
        while revealed < batches {
            let Some(&(trigger, node)) = self.surface.pending_intersections().first() else {
                break;
            };
            if !self
                .gallery
                .on_intersect(&mut self.surface, &self.lang, trigger, node)
            {
                break;
            }
            revealed += 1;
        }
        revealed
    }
}
