//! Cookie consent.
//!
//! The visitor's choice lives in one cookie holding the serialized
//! [`ConsentPreferences`]. [`ConsentManager`] derives the current
//! [`ConsentState`] from that cookie, shows the banner while nothing has been
//! chosen, and on every transition rewrites the cookie and dispatches a
//! `cookieConsentChanged` event. Anything that depends on consent (see
//! [`crate::analytics`]) listens for that event instead of reading the
//! cookie on its own schedule.
//!
//! A cookie that cannot be parsed counts as no choice at all.

use crate::config::ConsentConfig;
use crate::i18n::LanguageContext;
use crate::storage::{CookieJar, SameSite, SetCookie};
use crate::surface::{
    BannerView, ConsentToggle, EventBus, Panel, PanelKind, SettingsView, SiteEvent, Surface,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsentError {
    #[error("invalid consent cookie: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the visitor agreed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    /// Always `true`: necessary cookies cannot be refused.
    pub necessary: bool,
    pub analytics: bool,
    pub marketing: bool,
    /// When the choice was made, as epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ConsentPreferences {
    pub fn all(timestamp: DateTime<Utc>) -> Self {
        Self::custom(true, true, timestamp)
    }

    pub fn necessary_only(timestamp: DateTime<Utc>) -> Self {
        Self::custom(false, false, timestamp)
    }

    pub fn custom(analytics: bool, marketing: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            necessary: true,
            analytics,
            marketing,
            timestamp,
        }
    }

    /// Cookie value.
    pub fn encode(&self) -> Result<String, ConsentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a cookie value. `necessary` is forced on.
    pub fn decode(value: &str) -> Result<Self, ConsentError> {
        let mut prefs: ConsentPreferences = serde_json::from_str(value)?;
        prefs.necessary = true;
        Ok(prefs)
    }

    pub fn allows(&self, category: CookieCategory) -> bool {
        match category {
            CookieCategory::Necessary => self.necessary,
            CookieCategory::Analytics => self.analytics,
            CookieCategory::Marketing => self.marketing,
        }
    }

    pub fn state(&self) -> ConsentState {
        match (self.analytics, self.marketing) {
            (true, true) => ConsentState::All,
            (false, false) => ConsentState::NecessaryOnly,
            _ => ConsentState::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieCategory {
    Necessary,
    Analytics,
    Marketing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    Unset,
    NecessaryOnly,
    Custom,
    All,
}

/// The `type` of a `cookieConsentChanged` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentKind {
    All,
    Necessary,
    Custom,
    Revoked,
}

/// Detail of a `cookieConsentChanged` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentChange {
    #[serde(rename = "type")]
    pub kind: ConsentKind,
    pub preferences: ConsentPreferences,
}

/// Everything a consent transition touches.
pub struct ConsentHost<'a> {
    pub jar: &'a mut dyn CookieJar,
    pub surface: &'a mut dyn Surface,
    pub bus: &'a mut EventBus,
}

pub struct ConsentManager {
    cookie_name: String,
    expiry: Duration,
    privacy_href: String,
    clock: fn() -> DateTime<Utc>,
    state: ConsentState,
}

impl ConsentManager {
    pub fn new(config: &ConsentConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            expiry: Duration::days(i64::from(config.expiry_days)),
            privacy_href: config.privacy_policy_href.clone(),
            clock: Utc::now,
            state: ConsentState::Unset,
        }
    }

    /// Replace the time source used for timestamps and cookie expiry.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// State as of the last evaluation or transition.
    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Stored preferences, if the cookie is present and valid.
    pub fn preferences(&self, jar: &dyn CookieJar) -> Option<ConsentPreferences> {
        let raw = jar.get(&self.cookie_name)?;
        match ConsentPreferences::decode(&raw) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                log::warn!("ignoring cookie '{}': {e}", self.cookie_name);
                None
            }
        }
    }

    pub fn is_accepted(&self, jar: &dyn CookieJar, category: CookieCategory) -> bool {
        self.preferences(jar).is_some_and(|p| p.allows(category))
    }

    /// Read the cookie, update the state and show the banner if unset.
    pub fn evaluate(
        &mut self,
        jar: &dyn CookieJar,
        surface: &mut dyn Surface,
        lang: &LanguageContext,
    ) -> ConsentState {
        self.state = self
            .preferences(jar)
            .map_or(ConsentState::Unset, |p| p.state());
        if self.state == ConsentState::Unset {
            surface.show_panel(Panel::ConsentBanner(banner_view(lang)));
        }
        self.state
    }

    pub fn accept_all(&mut self, host: ConsentHost<'_>) {
        let prefs = ConsentPreferences::all((self.clock)());
        self.commit(host, ConsentKind::All, prefs);
    }

    pub fn accept_necessary(&mut self, host: ConsentHost<'_>) {
        let prefs = ConsentPreferences::necessary_only((self.clock)());
        self.commit(host, ConsentKind::Necessary, prefs);
    }

    /// Save the toggles of the settings modal.
    pub fn save_custom(&mut self, host: ConsentHost<'_>, analytics: bool, marketing: bool) {
        let prefs = ConsentPreferences::custom(analytics, marketing, (self.clock)());
        self.commit(host, ConsentKind::Custom, prefs);
    }

    /// Forget the choice: clear the cookie, tell listeners everything
    /// optional is now denied and ask again.
    pub fn revoke(&mut self, host: ConsentHost<'_>, lang: &LanguageContext) {
        host.jar.set(SetCookie::removal(&self.cookie_name));
        self.state = ConsentState::Unset;
        host.surface.hide_panel(PanelKind::ConsentSettings);
        host.bus.dispatch(SiteEvent::CookieConsentChanged(ConsentChange {
            kind: ConsentKind::Revoked,
            preferences: ConsentPreferences::necessary_only((self.clock)()),
        }));
        host.surface
            .show_panel(Panel::ConsentBanner(banner_view(lang)));
    }

    /// Open the settings modal with the toggles reflecting stored choices.
    pub fn show_settings(&self, jar: &dyn CookieJar, surface: &mut dyn Surface, lang: &LanguageContext) {
        let prefs = self.preferences(jar);
        let checked = |c| prefs.as_ref().is_some_and(|p| p.allows(c));
        let toggle = |id, key: &str, category, locked| ConsentToggle {
            id,
            label: lang.translate(key),
            description: lang.translate(&format!("{key}_desc")),
            checked: locked || checked(category),
            locked,
        };
        surface.show_panel(Panel::ConsentSettings(SettingsView {
            title: lang.translate("consent_settings"),
            toggles: vec![
                toggle("necessary-cookies", "consent_necessary", CookieCategory::Necessary, true),
                toggle("analytics-cookies", "consent_analytics", CookieCategory::Analytics, false),
                toggle("marketing-cookies", "consent_marketing", CookieCategory::Marketing, false),
            ],
            privacy_label: lang.translate("privacy_policy"),
            privacy_href: self.privacy_href.clone(),
            save_label: lang.translate("consent_save"),
        }));
    }

    pub fn close_settings(&self, surface: &mut dyn Surface) {
        surface.hide_panel(PanelKind::ConsentSettings);
    }

    fn commit(&mut self, host: ConsentHost<'_>, kind: ConsentKind, prefs: ConsentPreferences) {
        let value = match prefs.encode() {
            Ok(value) => value,
            Err(e) => {
                log::error!("could not encode consent preferences: {e}");
                return;
            }
        };
        host.jar.set(SetCookie {
            name: self.cookie_name.clone(),
            value,
            expires: prefs.timestamp + self.expiry,
            path: "/".to_string(),
            domain: None,
            same_site: Some(SameSite::Lax),
        });
        self.state = prefs.state();
        host.surface.hide_panel(PanelKind::ConsentSettings);
        host.surface.hide_panel(PanelKind::ConsentBanner);
        log::info!("cookie consent changed: {kind:?}");
        host.bus.dispatch(SiteEvent::CookieConsentChanged(ConsentChange {
            kind,
            preferences: prefs,
        }));
    }
}

fn banner_view(lang: &LanguageContext) -> BannerView {
    BannerView {
        title: lang.translate("consent_title"),
        message: lang.translate("consent_message"),
        settings_label: lang.translate("consent_settings"),
        necessary_label: lang.translate("consent_accept_necessary"),
        accept_all_label: lang.translate("consent_accept_all"),
    }
}
