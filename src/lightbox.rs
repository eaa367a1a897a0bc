//! Full-screen media viewer.
//!
//! The viewer is either [`Closed`](LightboxState::Closed) or
//! [`Open`](LightboxState::Open). An open viewer shows one item of a
//! sequence: a single item opened on its own is a sequence of one, a gallery
//! tile opens the gallery's filtered list at the tile's index.
//!
//! While open the page scroll is locked. Closing releases any attached video
//! player and always unlocks the scroll, even when the viewer was already
//! closed. Navigation wraps around both ends of the sequence.

use crate::config::LightboxConfig;
use crate::i18n::LanguageContext;
use crate::manifest::ContentItem;
use crate::naming::url_filename;
use crate::surface::{LightboxView, PlayerId, Surface};
use crate::types::{Category, MediaKind};

/// Something the viewer can display.
#[derive(Debug, Clone, PartialEq)]
pub struct LightboxItem {
    pub kind: MediaKind,
    pub url: String,
    pub title: String,
}

impl LightboxItem {
    pub fn new(kind: MediaKind, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            title: title.into(),
        }
    }

    /// The viewer item for a manifest entry, titled in the page language.
    pub fn from_content(item: &ContentItem, category: Category, lang: &LanguageContext) -> Self {
        Self::new(
            category.media_kind(),
            item.url.clone(),
            item.title(lang.current(), lang.fallback()),
        )
    }
}

/// `video/<ext>` from the URL's file extension, lowercased.
pub fn video_mime(url: &str) -> String {
    let name = url_filename(url);
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    format!("video/{ext}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightboxState {
    Closed,
    Open {
        items: Vec<LightboxItem>,
        index: usize,
        player: Option<PlayerId>,
    },
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Key {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Where a pointer click landed inside the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dimmed area around the content.
    Backdrop,
    Content,
    CloseButton,
    NextButton,
    PrevButton,
}

#[derive(Debug)]
pub struct Lightbox {
    state: LightboxState,
    watermark: Option<String>,
    close_label: String,
}

impl Lightbox {
    pub fn new(config: &LightboxConfig, lang: &LanguageContext) -> Self {
        let watermark = Some(config.watermark.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string);
        Self {
            state: LightboxState::Closed,
            watermark,
            close_label: lang.translate("close"),
        }
    }

    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LightboxState::Open { .. })
    }

    pub fn current(&self) -> Option<&LightboxItem> {
        match &self.state {
            LightboxState::Open { items, index, .. } => items.get(*index),
            LightboxState::Closed => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match &self.state {
            LightboxState::Open { index, .. } => Some(*index),
            LightboxState::Closed => None,
        }
    }

    /// Show a single item.
    pub fn open(&mut self, surface: &mut dyn Surface, item: LightboxItem) {
        self.open_sequence(surface, vec![item], 0);
    }

    /// Show `items[index]` with navigation over `items`.
    ///
    /// An empty sequence leaves the viewer closed; an out-of-range index is
    /// clamped to the last item.
    pub fn open_sequence(&mut self, surface: &mut dyn Surface, items: Vec<LightboxItem>, index: usize) {
        self.close(surface);
        if items.is_empty() {
            log::warn!("lightbox opened with an empty sequence");
            return;
        }
        let index = index.min(items.len() - 1);
        surface.set_scroll_locked(true);
        self.state = LightboxState::Open {
            items,
            index,
            player: None,
        };
        self.present(surface);
    }

    /// Close the viewer. Safe to call in any state.
    pub fn close(&mut self, surface: &mut dyn Surface) {
        if let LightboxState::Open { player, .. } = std::mem::replace(&mut self.state, LightboxState::Closed) {
            if let Some(player) = player {
                surface.release_player(player);
            }
            surface.remove_overlay();
        }
        surface.set_scroll_locked(false);
    }

    pub fn next(&mut self, surface: &mut dyn Surface) {
        self.step(surface, 1);
    }

    pub fn prev(&mut self, surface: &mut dyn Surface) {
        self.step(surface, -1);
    }

    /// React to a key press. Returns `true` when the key was consumed.
    pub fn handle_key(&mut self, surface: &mut dyn Surface, key: Key) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Escape => self.close(surface),
            Key::ArrowRight if self.is_sequence() => self.next(surface),
            Key::ArrowLeft if self.is_sequence() => self.prev(surface),
            _ => return false,
        }
        true
    }

    /// React to a click inside the viewer.
    pub fn handle_click(&mut self, surface: &mut dyn Surface, target: ClickTarget) {
        if !self.is_open() {
            return;
        }
        match target {
            ClickTarget::Backdrop | ClickTarget::CloseButton => self.close(surface),
            ClickTarget::NextButton => self.next(surface),
            ClickTarget::PrevButton => self.prev(surface),
            ClickTarget::Content => {}
        }
    }

    fn is_sequence(&self) -> bool {
        matches!(&self.state, LightboxState::Open { items, .. } if items.len() > 1)
    }

    fn step(&mut self, surface: &mut dyn Surface, delta: isize) {
        let LightboxState::Open { items, index, player } = &mut self.state else {
            return;
        };
        let len = items.len() as isize;
        *index = (*index as isize + delta).rem_euclid(len) as usize;
        if let Some(player) = player.take() {
            surface.release_player(player);
        }
        self.present(surface);
    }

    fn present(&mut self, surface: &mut dyn Surface) {
        let LightboxState::Open { items, index, player } = &mut self.state else {
            return;
        };
        let item = &items[*index];
        let view = LightboxView {
            kind: item.kind,
            url: item.url.clone(),
            title: item.title.clone(),
            mime: (item.kind == MediaKind::Video).then(|| video_mime(&item.url)),
            watermark: match item.kind {
                MediaKind::Image => self.watermark.clone(),
                _ => None,
            },
            close_label: self.close_label.clone(),
            position: (items.len() > 1).then_some((*index, items.len())),
        };
        surface.show_overlay(view);
        if item.kind == MediaKind::Video {
            *player = Some(surface.attach_player(&item.url));
        }
    }
}
