//! Consent-gated analytics.
//!
//! [`AnalyticsGate`] mirrors what a `gtag.js` integration does on the page,
//! but records the calls instead of executing them: the host forwards
//! [`AnalyticsGate::calls`] to the real `gtag` and applies
//! [`AnalyticsGate::take_cookie_removals`] to `document.cookie`.
//!
//! The gate only changes its mind in response to `cookieConsentChanged`
//! events (and one look at the stored preferences when it is created).
//! Every tracking helper is a no-op until analytics consent is granted.

use crate::config::AnalyticsConfig;
use crate::consent::ConsentPreferences;
use crate::storage::SetCookie;
use crate::surface::{EventListener, SiteEvent};
use serde::Serialize;
use serde_json::{Value, json};

/// Scroll depths reported once each, in percent.
pub const SCROLL_THRESHOLDS: [u32; 4] = [25, 50, 75, 90];
/// Time-on-page marks reported once each, in seconds.
pub const TIME_THRESHOLDS: [u64; 4] = [30, 60, 120, 300];

const DOWNLOAD_EXTENSIONS: [&str; 9] = [
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar",
];

/// Portfolio sections whose page views are reported.
const PORTFOLIO_SECTIONS: [&str; 4] = ["presentations", "designs", "photos", "videos"];

/// One `gtag(command, target, params)` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GtagCall {
    pub command: String,
    pub target: String,
    pub params: Value,
}

impl GtagCall {
    pub fn new(command: &str, target: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.to_string(),
            target: target.into(),
            params,
        }
    }

    /// JavaScript source of the call.
    pub fn to_js(&self) -> String {
        let target = Value::String(self.target.clone());
        if self.params.is_null() {
            format!("gtag('{}', {target});", self.command)
        } else {
            format!("gtag('{}', {target}, {});", self.command, self.params)
        }
    }
}

/// Snapshot for debugging, shaped like the page's status object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStatus {
    pub is_loaded: bool,
    pub consent_given: bool,
    pub measurement_id: String,
}

/// Kind of an outbound link click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    External,
    Download,
    Internal,
}

#[derive(Debug, Clone)]
pub struct AnalyticsGate {
    measurement_id: String,
    hostname: Option<String>,
    loaded: bool,
    consent_given: bool,
    calls: Vec<GtagCall>,
    cookie_removals: Vec<SetCookie>,
    scroll_max: u32,
    scroll_passed: Vec<u32>,
    time_passed: Vec<u64>,
}

impl AnalyticsGate {
    /// Create the gate and load immediately if `existing` already allows
    /// analytics.
    pub fn new(config: &AnalyticsConfig, existing: Option<&ConsentPreferences>) -> Self {
        let mut gate = Self {
            measurement_id: config.measurement_id.trim().to_string(),
            hostname: None,
            loaded: false,
            consent_given: false,
            calls: Vec::new(),
            cookie_removals: Vec::new(),
            scroll_max: 0,
            scroll_passed: Vec::new(),
            time_passed: Vec::new(),
        };
        if existing.is_some_and(|p| p.analytics) {
            gate.grant();
        }
        gate
    }

    /// Page host name, used for external-link detection and to scope cookie
    /// removals.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn consent_given(&self) -> bool {
        self.consent_given
    }

    /// Every gtag call issued so far.
    pub fn calls(&self) -> &[GtagCall] {
        &self.calls
    }

    /// Cookie deletions requested since the last call.
    pub fn take_cookie_removals(&mut self) -> Vec<SetCookie> {
        std::mem::take(&mut self.cookie_removals)
    }

    pub fn status(&self) -> AnalyticsStatus {
        AnalyticsStatus {
            is_loaded: self.loaded,
            consent_given: self.consent_given,
            measurement_id: self.measurement_id.clone(),
        }
    }

    fn active(&self) -> bool {
        self.loaded && self.consent_given
    }

    fn gtag(&mut self, command: &str, target: impl Into<String>, params: Value) {
        self.calls.push(GtagCall::new(command, target, params));
    }

    fn grant(&mut self) {
        if self.measurement_id.is_empty() {
            log::info!("analytics consent granted but no measurement id configured");
            return;
        }
        if self.loaded {
            if !self.consent_given {
                self.gtag("consent", "update", json!({ "analytics_storage": "granted" }));
                self.consent_given = true;
            }
            return;
        }
        self.gtag("js", chrono::Utc::now().to_rfc3339(), Value::Null);
        self.gtag(
            "consent",
            "default",
            json!({ "analytics_storage": "granted", "ad_storage": "denied" }),
        );
        let id = self.measurement_id.clone();
        self.gtag(
            "config",
            id,
            json!({
                "anonymize_ip": true,
                "respect_dnt": true,
                "allow_google_signals": false,
                "allow_ad_personalization_signals": false,
            }),
        );
        self.loaded = true;
        self.consent_given = true;
        log::info!("analytics loaded with consent");
    }

    fn deny(&mut self) {
        if !self.loaded || !self.consent_given {
            return;
        }
        self.gtag("consent", "update", json!({ "analytics_storage": "denied" }));
        self.cookie_removals = self
            .analytics_cookie_names()
            .iter()
            .flat_map(|name| self.removals_for(name))
            .collect();
        self.consent_given = false;
        log::info!("analytics disabled");
    }

    /// Names of the cookies analytics may have set.
    pub fn analytics_cookie_names(&self) -> Vec<String> {
        let id = &self.measurement_id;
        vec![
            "_ga".to_string(),
            format!("_ga_{}", id.strip_prefix("G-").unwrap_or(id)),
            "_gid".to_string(),
            "_gat".to_string(),
            format!("_gat_gtag_{id}"),
            "__utma".to_string(),
            "__utmb".to_string(),
            "__utmc".to_string(),
            "__utmt".to_string(),
            "__utmz".to_string(),
        ]
    }

    fn removals_for(&self, name: &str) -> Vec<SetCookie> {
        let mut removals = vec![SetCookie::removal(name)];
        if let Some(host) = &self.hostname {
            removals.push(SetCookie::removal(name).with_domain(host.clone()));
            removals.push(SetCookie::removal(name).with_domain(format!(".{host}")));
        }
        removals
    }

    // ------------------------------------------------------------------------
    // Tracking helpers
    // ------------------------------------------------------------------------

    /// Custom event with `event_category`/`event_label`/`value` defaults.
    pub fn track_event(&mut self, name: &str, params: Value) {
        if !self.active() {
            return;
        }
        let mut merged = json!({ "event_category": "custom", "event_label": "", "value": 0 });
        if let (Some(base), Value::Object(extra)) = (merged.as_object_mut(), params) {
            for (k, v) in extra {
                let key = match k.as_str() {
                    "category" => "event_category".to_string(),
                    "label" => "event_label".to_string(),
                    _ => k.clone(),
                };
                base.insert(key, v);
            }
        }
        self.gtag("event", name, merged);
    }

    pub fn track_page_view(&mut self, path: &str) {
        if !self.active() {
            return;
        }
        let id = self.measurement_id.clone();
        self.gtag("config", id, json!({ "page_path": path }));
    }

    /// Report a portfolio section view when `path` belongs to one.
    pub fn track_portfolio_view(&mut self, path: &str) {
        for section in PORTFOLIO_SECTIONS {
            if path.contains(section) {
                self.track_event(
                    "portfolio_view",
                    json!({ "category": "portfolio", "label": section }),
                );
            }
        }
    }

    pub fn classify_link(&self, href: &str) -> LinkKind {
        if is_download_link(href) {
            LinkKind::Download
        } else if self
            .hostname
            .as_deref()
            .is_some_and(|host| is_external_link(href, host))
        {
            LinkKind::External
        } else {
            LinkKind::Internal
        }
    }

    /// Report a click on a link. External and download links are reported
    /// independently, like two separate click listeners would.
    pub fn track_link_click(&mut self, href: &str) {
        if !self.active() {
            return;
        }
        if self
            .hostname
            .as_deref()
            .is_some_and(|host| is_external_link(href, host))
        {
            self.gtag(
                "event",
                "click",
                json!({ "event_category": "external_link", "event_label": href, "transport_type": "beacon" }),
            );
        }
        if is_download_link(href) {
            self.gtag(
                "event",
                "file_download",
                json!({ "event_category": "download", "event_label": href, "transport_type": "beacon" }),
            );
        }
    }

    /// Scroll position update, as a percentage of the scrollable height.
    pub fn on_scroll(&mut self, percent: u32) {
        if !self.active() || percent <= self.scroll_max {
            return;
        }
        self.scroll_max = percent;
        for threshold in SCROLL_THRESHOLDS {
            if percent >= threshold && !self.scroll_passed.contains(&threshold) {
                self.scroll_passed.push(threshold);
                self.gtag(
                    "event",
                    "scroll",
                    json!({ "event_category": "engagement", "event_label": format!("{threshold}%"), "value": threshold }),
                );
            }
        }
    }

    /// Periodic time-on-page update, in whole seconds since load.
    pub fn on_time_elapsed(&mut self, seconds: u64) {
        if !self.active() {
            return;
        }
        for threshold in TIME_THRESHOLDS {
            if seconds >= threshold && !self.time_passed.contains(&threshold) {
                self.time_passed.push(threshold);
                self.gtag(
                    "event",
                    "timing_complete",
                    json!({ "event_category": "engagement", "name": "time_on_page", "value": threshold }),
                );
            }
        }
    }
}

impl EventListener for AnalyticsGate {
    fn on_event(&mut self, event: &SiteEvent) {
        let SiteEvent::CookieConsentChanged(change) = event else {
            return;
        };
        if change.preferences.analytics {
            self.grant();
        } else {
            self.deny();
        }
    }
}

/// Host of an absolute `http(s)://` or protocol-relative URL.
pub fn url_host(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("//"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);
    (!host.is_empty()).then_some(host)
}

/// Whether `url` points to a host other than `page_host`. Relative URLs are
/// never external.
pub fn is_external_link(url: &str, page_host: &str) -> bool {
    url_host(url).is_some_and(|host| !host.eq_ignore_ascii_case(page_host))
}

/// Whether `url` mentions a document or archive extension.
pub fn is_download_link(url: &str) -> bool {
    let url = url.to_lowercase();
    DOWNLOAD_EXTENSIONS.iter().any(|ext| url.contains(ext))
}
