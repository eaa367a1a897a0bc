//! Rendering surface and page events.
//!
//! Controllers ([`GalleryLoader`](crate::gallery::GalleryLoader),
//! [`Lightbox`](crate::lightbox::Lightbox),
//! [`ConsentManager`](crate::consent::ConsentManager),
//! [`inject_includes`](crate::includes::inject_includes)) describe what the
//! page should show through the [`Surface`] trait instead of manipulating a
//! document. A browser binding implements it over the DOM; [`MemorySurface`]
//! implements it over plain data so the controllers can be driven and
//! inspected in tests and rendered to static HTML by the CLI.
//!
//! Viewport triggers model intersection observers: a trigger watches nodes
//! and the host calls back into the owning controller when one of them comes
//! within `root_margin_px` of the viewport.
//!
//! Page-level notifications (`cookieConsentChanged`, `headerLoaded`) travel
//! over an [`EventBus`]; listeners subscribe once and react only to events.

use crate::consent::ConsentChange;
use crate::types::{Category, MediaKind, Orientation};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

/// A rendered node inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// A viewport-proximity trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u64);

/// An embedded video player instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Loading,
    Empty,
    Error,
}

/// A status line replacing a container's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// One gallery tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub category: Category,
    /// Position in the container's filtered sequence.
    pub index: usize,
    pub title: String,
    /// Image shown in the grid.
    pub preview_url: String,
    /// Media opened on activation (or embedded, for presentations).
    pub target_url: String,
    /// Image swapped in when `preview_url` fails to load.
    pub fallback_url: String,
    pub orientation: Option<Orientation>,
}

impl Tile {
    /// CSS classes of the tile element.
    pub fn classes(&self) -> Vec<String> {
        let mut classes = vec![format!("{}-item", self.category.tile_class())];
        if let Some(o) = self.orientation {
            classes.push(format!("orientation-{o}"));
        }
        classes
    }

    pub fn media_kind(&self) -> MediaKind {
        self.category.media_kind()
    }
}

/// What the lightbox overlay displays.
#[derive(Debug, Clone, PartialEq)]
pub struct LightboxView {
    pub kind: MediaKind,
    pub url: String,
    pub title: String,
    /// `video/<ext>` for videos.
    pub mime: Option<String>,
    pub watermark: Option<String>,
    pub close_label: String,
    /// `(index, len)` when browsing a sequence.
    pub position: Option<(usize, usize)>,
}

/// Consent banner contents.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerView {
    pub title: String,
    pub message: String,
    pub settings_label: String,
    pub necessary_label: String,
    pub accept_all_label: String,
}

/// One toggle of the consent settings modal.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentToggle {
    pub id: &'static str,
    pub label: String,
    pub description: String,
    pub checked: bool,
    pub locked: bool,
}

/// Consent settings modal contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView {
    pub title: String,
    pub toggles: Vec<ConsentToggle>,
    pub privacy_label: String,
    pub privacy_href: String,
    pub save_label: String,
}

/// Floating page panels other than the lightbox.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    ConsentBanner(BannerView),
    ConsentSettings(SettingsView),
}

impl Panel {
    pub fn kind(&self) -> PanelKind {
        match self {
            Panel::ConsentBanner(_) => PanelKind::ConsentBanner,
            Panel::ConsentSettings(_) => PanelKind::ConsentSettings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    ConsentBanner,
    ConsentSettings,
}

/// Everything a controller may do to the page.
pub trait Surface {
    fn has_container(&self, id: &str) -> bool;
    fn set_container_class(&mut self, id: &str, class: &str, enabled: bool);
    /// Remove every child of the container.
    fn clear(&mut self, id: &str);
    /// Replace the container's contents with a status line.
    fn show_message(&mut self, id: &str, message: Message);
    fn append_tile(&mut self, id: &str, tile: Tile) -> NodeId;
    /// Replace the container's contents with trusted markup.
    fn set_html(&mut self, id: &str, html: &str);

    fn create_trigger(&mut self, root_margin_px: u32) -> TriggerId;
    fn observe(&mut self, trigger: TriggerId, node: NodeId);
    fn unobserve(&mut self, trigger: TriggerId, node: NodeId);
    /// Stop the trigger and forget every node it watches.
    fn disconnect(&mut self, trigger: TriggerId);

    fn set_scroll_locked(&mut self, locked: bool);
    fn show_overlay(&mut self, view: LightboxView);
    fn remove_overlay(&mut self);
    fn attach_player(&mut self, url: &str) -> PlayerId;
    fn release_player(&mut self, player: PlayerId);

    fn show_panel(&mut self, panel: Panel);
    fn hide_panel(&mut self, kind: PanelKind);
}

/// A child of a [`MemorySurface`] container.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Message(Message),
    Tile(NodeId, Tile),
    Html(String),
}

#[derive(Debug, Default, Clone)]
struct Container {
    classes: BTreeSet<String>,
    children: Vec<Node>,
}

#[derive(Debug, Clone)]
struct TriggerRecord {
    root_margin_px: u32,
    observed: Vec<NodeId>,
    connected: bool,
    disconnects: usize,
}

/// In-memory page used by tests and the static preview.
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    containers: HashMap<String, Container>,
    triggers: HashMap<TriggerId, TriggerRecord>,
    next_id: u64,
    scroll_locked: bool,
    overlay: Option<LightboxView>,
    players: BTreeSet<PlayerId>,
    panels: Vec<Panel>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page with the given placeholder containers.
    pub fn with_containers(ids: &[&str]) -> Self {
        let mut surface = Self::new();
        for id in ids {
            surface.add_container(id);
        }
        surface
    }

    pub fn add_container(&mut self, id: &str) {
        self.containers.entry(id.to_string()).or_default();
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        let container = self.containers.get_mut(id);
        if container.is_none() {
            log::warn!("container '{id}' not found");
        }
        container
    }

    pub fn children(&self, id: &str) -> &[Node] {
        self.containers
            .get(id)
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn tiles(&self, id: &str) -> Vec<&Tile> {
        self.children(id)
            .iter()
            .filter_map(|n| match n {
                Node::Tile(_, tile) => Some(tile),
                _ => None,
            })
            .collect()
    }

    pub fn tile_titles(&self, id: &str) -> Vec<&str> {
        self.tiles(id).into_iter().map(|t| t.title.as_str()).collect()
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.children(id).iter().find_map(|n| match n {
            Node::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn html(&self, id: &str) -> Option<&str> {
        self.children(id).iter().find_map(|n| match n {
            Node::Html(h) => Some(h.as_str()),
            _ => None,
        })
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.containers
            .get(id)
            .is_some_and(|c| c.classes.contains(class))
    }

    pub fn container_classes(&self, id: &str) -> Vec<&str> {
        self.containers
            .get(id)
            .map(|c| c.classes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Nodes currently watched by a connected trigger.
    pub fn observed(&self, trigger: TriggerId) -> Vec<NodeId> {
        self.triggers
            .get(&trigger)
            .filter(|t| t.connected)
            .map(|t| t.observed.clone())
            .unwrap_or_default()
    }

    pub fn is_connected(&self, trigger: TriggerId) -> bool {
        self.triggers.get(&trigger).is_some_and(|t| t.connected)
    }

    pub fn disconnect_count(&self, trigger: TriggerId) -> usize {
        self.triggers.get(&trigger).map_or(0, |t| t.disconnects)
    }

    pub fn root_margin(&self, trigger: TriggerId) -> Option<u32> {
        self.triggers.get(&trigger).map(|t| t.root_margin_px)
    }

    /// Every `(trigger, node)` pair that would fire if the visitor scrolled
    /// to the end of the page, in trigger order.
    pub fn pending_intersections(&self) -> Vec<(TriggerId, NodeId)> {
        let mut pending: Vec<_> = self
            .triggers
            .iter()
            .filter(|(_, t)| t.connected)
            .flat_map(|(id, t)| t.observed.iter().map(move |n| (*id, *n)))
            .collect();
        pending.sort();
        pending
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn overlay(&self) -> Option<&LightboxView> {
        self.overlay.as_ref()
    }

    pub fn live_players(&self) -> usize {
        self.players.len()
    }

    pub fn panel(&self, kind: PanelKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.kind() == kind)
    }
}

impl Surface for MemorySurface {
    fn has_container(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    fn set_container_class(&mut self, id: &str, class: &str, enabled: bool) {
        if let Some(c) = self.container_mut(id) {
            if enabled {
                c.classes.insert(class.to_string());
            } else {
                c.classes.remove(class);
            }
        }
    }

    fn clear(&mut self, id: &str) {
        if let Some(c) = self.container_mut(id) {
            c.children.clear();
        }
    }

    fn show_message(&mut self, id: &str, message: Message) {
        if let Some(c) = self.container_mut(id) {
            c.children = vec![Node::Message(message)];
        }
    }

    fn append_tile(&mut self, id: &str, tile: Tile) -> NodeId {
        let node = NodeId(self.next());
        if let Some(c) = self.container_mut(id) {
            c.children.push(Node::Tile(node, tile));
        }
        node
    }

    fn set_html(&mut self, id: &str, html: &str) {
        if let Some(c) = self.container_mut(id) {
            c.children = vec![Node::Html(html.to_string())];
        }
    }

    fn create_trigger(&mut self, root_margin_px: u32) -> TriggerId {
        let id = TriggerId(self.next());
        self.triggers.insert(
            id,
            TriggerRecord {
                root_margin_px,
                observed: Vec::new(),
                connected: true,
                disconnects: 0,
            },
        );
        id
    }

    fn observe(&mut self, trigger: TriggerId, node: NodeId) {
        if let Some(t) = self.triggers.get_mut(&trigger) {
            t.connected = true;
            if !t.observed.contains(&node) {
                t.observed.push(node);
            }
        }
    }

    fn unobserve(&mut self, trigger: TriggerId, node: NodeId) {
        if let Some(t) = self.triggers.get_mut(&trigger) {
            t.observed.retain(|n| *n != node);
        }
    }

    fn disconnect(&mut self, trigger: TriggerId) {
        if let Some(t) = self.triggers.get_mut(&trigger) {
            t.observed.clear();
            t.connected = false;
            t.disconnects += 1;
        }
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }

    fn show_overlay(&mut self, view: LightboxView) {
        self.overlay = Some(view);
    }

    fn remove_overlay(&mut self) {
        self.overlay = None;
    }

    fn attach_player(&mut self, _url: &str) -> PlayerId {
        let id = PlayerId(self.next());
        self.players.insert(id);
        id
    }

    fn release_player(&mut self, player: PlayerId) {
        self.players.remove(&player);
    }

    fn show_panel(&mut self, panel: Panel) {
        self.panels.retain(|p| p.kind() != panel.kind());
        self.panels.push(panel);
    }

    fn hide_panel(&mut self, kind: PanelKind) {
        self.panels.retain(|p| p.kind() != kind);
    }
}

// ============================================================================
// Page events
// ============================================================================

/// Document-level custom events.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteEvent {
    /// `cookieConsentChanged`, detail `{type, preferences}`.
    CookieConsentChanged(ConsentChange),
    /// `headerLoaded`, no payload: the shared header is in the document.
    HeaderLoaded,
}

impl SiteEvent {
    /// DOM event name.
    pub fn name(&self) -> &'static str {
        match self {
            SiteEvent::CookieConsentChanged(_) => "cookieConsentChanged",
            SiteEvent::HeaderLoaded => "headerLoaded",
        }
    }
}

pub trait EventListener {
    fn on_event(&mut self, event: &SiteEvent);
}

/// Synchronous dispatcher for [`SiteEvent`]s.
///
/// Listeners run in subscription order. A listener must not dispatch from
/// inside its own handler.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Rc<RefCell<dyn EventListener>>>,
    /// Dispatched events, kept for inspection until drained.
    history: Vec<SiteEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Rc<RefCell<dyn EventListener>>) {
        self.listeners.push(listener);
    }

    pub fn dispatch(&mut self, event: SiteEvent) {
        log::debug!("dispatching {}", event.name());
        for listener in &self.listeners {
            listener.borrow_mut().on_event(&event);
        }
        self.history.push(event);
    }

    /// Every event dispatched since the bus was created or last drained.
    ///
    /// Kept for tests and previews; it grows with each dispatch, so a
    /// long-lived host should drain it with [`take_history`](Self::take_history).
    pub fn history(&self) -> &[SiteEvent] {
        &self.history
    }

    /// Drain the recorded events.
    pub fn take_history(&mut self) -> Vec<SiteEvent> {
        std::mem::take(&mut self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(category: Category, orientation: Option<Orientation>) -> Tile {
        Tile {
            category,
            index: 0,
            title: "T".into(),
            preview_url: "p.jpg".into(),
            target_url: "t.jpg".into(),
            fallback_url: "/placeholder.png".into(),
            orientation,
        }
    }

    #[test]
    fn tile_classes() {
        let t = tile(Category::Fotografias, Some(Orientation::Vertical));
        assert_eq!(t.classes(), vec!["photo-item", "orientation-vertical"]);
        let t = tile(Category::Videos, None);
        assert_eq!(t.classes(), vec!["video-item"]);
    }

    #[test]
    fn message_replaces_contents() {
        let mut s = MemorySurface::with_containers(&["g"]);
        s.append_tile("g", tile(Category::Designs, None));
        s.show_message("g", Message::new(MessageKind::Loading, "..."));
        assert_eq!(s.children("g").len(), 1);
        assert_eq!(s.message("g").unwrap().kind, MessageKind::Loading);
        assert!(s.tiles("g").is_empty());
    }

    #[test]
    fn missing_container_is_ignored() {
        let mut s = MemorySurface::new();
        assert!(!s.has_container("ghost"));
        s.append_tile("ghost", tile(Category::Designs, None));
        assert!(s.tiles("ghost").is_empty());
    }

    #[test]
    fn trigger_lifecycle() {
        let mut s = MemorySurface::with_containers(&["g"]);
        let trigger = s.create_trigger(500);
        let node = s.append_tile("g", tile(Category::Designs, None));
        s.observe(trigger, node);
        assert_eq!(s.observed(trigger), vec![node]);
        assert_eq!(s.pending_intersections(), vec![(trigger, node)]);
        assert_eq!(s.root_margin(trigger), Some(500));

        s.disconnect(trigger);
        assert!(s.observed(trigger).is_empty());
        assert!(!s.is_connected(trigger));
        assert_eq!(s.disconnect_count(trigger), 1);
    }

    #[test]
    fn panels_replace_same_kind() {
        let mut s = MemorySurface::new();
        let banner = BannerView {
            title: "a".into(),
            message: "b".into(),
            settings_label: "c".into(),
            necessary_label: "d".into(),
            accept_all_label: "e".into(),
        };
        s.show_panel(Panel::ConsentBanner(banner.clone()));
        s.show_panel(Panel::ConsentBanner(banner));
        assert!(s.panel(PanelKind::ConsentBanner).is_some());
        s.hide_panel(PanelKind::ConsentBanner);
        assert!(s.panel(PanelKind::ConsentBanner).is_none());
    }

    struct Counter(usize);

    impl EventListener for Counter {
        fn on_event(&mut self, event: &SiteEvent) {
            if *event == SiteEvent::HeaderLoaded {
                self.0 += 1;
            }
        }
    }

    #[test]
    fn event_bus_delivers_to_listeners() {
        let counter = Rc::new(RefCell::new(Counter(0)));
        let mut bus = EventBus::new();
        bus.subscribe(counter.clone());
        bus.dispatch(SiteEvent::HeaderLoaded);
        bus.dispatch(SiteEvent::HeaderLoaded);
        assert_eq!(counter.borrow().0, 2);
        assert_eq!(bus.history().len(), 2);
        assert_eq!(bus.history()[0].name(), "headerLoaded");
    }

    #[test]
    fn take_history_drains_recorded_events() {
        let mut bus = EventBus::new();
        bus.dispatch(SiteEvent::HeaderLoaded);
        assert_eq!(bus.take_history(), vec![SiteEvent::HeaderLoaded]);
        assert!(bus.history().is_empty());
        bus.dispatch(SiteEvent::HeaderLoaded);
        assert_eq!(bus.history().len(), 1);
    }
}
