//! HTML rendering of surface contents.
//!
//! Markup mirrors the class names the site stylesheet targets, so a snapshot
//! written by `vitrine preview` can be dropped next to the real pages and
//! styled the same way.

use crate::i18n::SwitcherLink;
use crate::surface::{
    BannerView, LightboxView, MemorySurface, Message, MessageKind, Node, Panel, PanelKind,
    SettingsView, Tile,
};
use crate::types::{Category, Locale, MediaKind};
use maud::{DOCTYPE, Markup, html};

// ============================================================================
// Gallery
// ============================================================================

pub fn render_message(message: &Message) -> Markup {
    let class = match message.kind {
        MessageKind::Loading => "gallery-message loading",
        MessageKind::Empty => "gallery-message empty",
        MessageKind::Error => "gallery-message error",
    };
    html! {
        p class=(class) { (message.text) }
    }
}

/// A gallery tile. Presentations embed the document instead of previewing it.
pub fn render_tile(tile: &Tile) -> Markup {
    let classes = tile.classes().join(" ");
    if tile.category == Category::Apresentacoes {
        return html! {
            div class=(classes) {
                h3 { (tile.title) }
                iframe src=(tile.target_url) title=(tile.title) loading="lazy" allowfullscreen {}
            }
        };
    }
    let onerror = format!("this.onerror=null;this.src='{}'", tile.fallback_url);
    html! {
        div class=(classes) data-index=(tile.index) data-src=(tile.target_url) {
            div.image-container {
                img src=(tile.preview_url) alt=(tile.title) loading="lazy" onerror=(onerror);
                @if tile.media_kind() == MediaKind::Video {
                    i.fas.fa-play.video-play-icon {}
                }
            }
            div class={ (tile.category.tile_class()) "-overlay" } {
                h3 { (tile.title) }
            }
        }
    }
}

fn render_node(node: &Node) -> Markup {
    match node {
        Node::Message(message) => render_message(message),
        Node::Tile(_, tile) => render_tile(tile),
        Node::Html(fragment) => html! { (maud::PreEscaped(fragment)) },
    }
}

/// A container and everything currently in it.
pub fn render_container(surface: &MemorySurface, id: &str) -> Markup {
    let classes = surface.container_classes(id).join(" ");
    html! {
        div id=(id) class=[(!classes.is_empty()).then_some(classes)] {
            @for node in surface.children(id) {
                (render_node(node))
            }
        }
    }
}

// ============================================================================
// Lightbox
// ============================================================================

pub fn render_lightbox(view: &LightboxView) -> Markup {
    html! {
        div.lightbox-overlay.active {
            div.lightbox-content {
                @match view.kind {
                    MediaKind::Video => {
                        video playsinline autoplay controls {
                            source src=(view.url) type=[view.mime.as_deref()];
                        }
                    }
                    MediaKind::Embed => {
                        iframe src=(view.url) title=(view.title) allowfullscreen {}
                    }
                    MediaKind::Image => {
                        img src=(view.url) alt=(view.title);
                        @if let Some(watermark) = &view.watermark {
                            div.watermark { (watermark) }
                        }
                    }
                }
                @if let Some((index, len)) = view.position {
                    button.lightbox-prev aria-label="previous" { "‹" }
                    span.lightbox-counter { (index + 1) " / " (len) }
                    button.lightbox-next aria-label="next" { "›" }
                }
                button.lightbox-close aria-label=(view.close_label) { "×" }
            }
        }
    }
}

// ============================================================================
// Consent
// ============================================================================

pub fn render_banner(view: &BannerView) -> Markup {
    html! {
        div.cookie-consent-banner.show {
            div.cookie-consent-content {
                div.cookie-consent-text {
                    h3 { (view.title) }
                    p { (view.message) }
                }
                div.cookie-consent-actions {
                    button.cookie-btn.cookie-btn-settings { (view.settings_label) }
                    button.cookie-btn.cookie-btn-necessary { (view.necessary_label) }
                    button.cookie-btn.cookie-btn-accept { (view.accept_all_label) }
                }
            }
        }
    }
}

pub fn render_settings(view: &SettingsView) -> Markup {
    html! {
        div.cookie-settings-modal.show {
            div.cookie-settings-overlay {}
            div.cookie-settings-content {
                div.cookie-settings-header {
                    h3 { (view.title) }
                    button.cookie-settings-close { "×" }
                }
                div.cookie-settings-body {
                    @for toggle in &view.toggles {
                        div.cookie-category {
                            div.cookie-category-header {
                                label.cookie-switch {
                                    input type="checkbox" id=(toggle.id)
                                        checked[toggle.checked] disabled[toggle.locked];
                                    span.cookie-slider {}
                                }
                                h4 { (toggle.label) }
                            }
                            p { (toggle.description) }
                        }
                    }
                }
                div.cookie-settings-footer {
                    a.cookie-privacy-link href=(view.privacy_href) { (view.privacy_label) }
                    button.cookie-btn.cookie-btn-save { (view.save_label) }
                }
            }
        }
    }
}

fn render_panel(panel: &Panel) -> Markup {
    match panel {
        Panel::ConsentBanner(view) => render_banner(view),
        Panel::ConsentSettings(view) => render_settings(view),
    }
}

// ============================================================================
// Language switcher and preview page
// ============================================================================

pub fn render_switcher(links: &[SwitcherLink]) -> Markup {
    html! {
        div.language-dropdown {
            @for link in links {
                a.lang-option.active[link.active] href=(link.href) data-lang=(link.locale.code()) {
                    span class={ "fi fi-" (link.flag) } {}
                    span { (link.label) }
                }
            }
        }
    }
}

/// Everything a static preview page shows.
pub struct PreviewPage<'a> {
    pub title: &'a str,
    pub locale: Locale,
    pub switcher: &'a [SwitcherLink],
    pub surface: &'a MemorySurface,
    pub containers: &'a [&'a str],
    /// Footer line, e.g. "24 / 57".
    pub status: Option<String>,
}

const PREVIEW_CSS: &str = "body{font-family:sans-serif;margin:2rem}\
.horizontal-gallery,[id$=-gallery]{display:grid;grid-template-columns:repeat(auto-fill,minmax(220px,1fr));gap:1rem}\
.image-container img{width:100%;display:block}\
.gallery-message.error{color:red}.gallery-message{text-align:center}";

pub fn render_preview(page: &PreviewPage<'_>) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(page.locale.code()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                style { (PREVIEW_CSS) }
            }
            body {
                (render_switcher(page.switcher))
                main {
                    @for id in page.containers {
                        (render_container(page.surface, id))
                    }
                }
                @if let Some(status) = &page.status {
                    footer.preview-status { (status) }
                }
                @if let Some(view) = page.surface.overlay() {
                    (render_lightbox(view))
                }
                @for kind in [PanelKind::ConsentBanner, PanelKind::ConsentSettings] {
                    @if let Some(panel) = page.surface.panel(kind) {
                        (render_panel(panel))
                    }
                }
            }
        }
    }
}
