//! Browser storage seams: `localStorage` and `document.cookie`.
//!
//! Controllers never touch storage directly; they are handed a
//! [`KeyValueStore`] or a [`CookieJar`]. The in-memory implementations
//! here back the tests and the CLI preview.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// String key/value storage with `localStorage` semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }
}

/// A cookie write, rendered the way `document.cookie = ...` expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub path: String,
    pub domain: Option<String>,
    pub same_site: Option<SameSite>,
}

impl SetCookie {
    /// An expired, empty cookie: writing it deletes `name`.
    pub fn removal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            expires: DateTime::<Utc>::UNIX_EPOCH,
            path: "/".to_string(),
            domain: None,
            same_site: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn is_removal(&self) -> bool {
        self.expires <= DateTime::<Utc>::UNIX_EPOCH
    }

    /// `name=value;expires=<http-date>;path=/;SameSite=Lax`
    pub fn to_header(&self) -> String {
        let mut header = format!(
            "{}={};expires={};path={}",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.path
        );
        if let Some(domain) = &self.domain {
            header.push_str(";domain=");
            header.push_str(domain);
        }
        if let Some(same_site) = self.same_site {
            header.push_str(";SameSite=");
            header.push_str(same_site.as_str());
        }
        header
    }
}

/// Cookie access with `document.cookie` semantics.
pub trait CookieJar {
    /// Current value of `name`, if set and not expired.
    fn get(&self, name: &str) -> Option<String>;
    /// Write a cookie. An expired cookie deletes the name.
    fn set(&mut self, cookie: SetCookie);
}

/// Extract one cookie from a `document.cookie` style string (`a=1; b=2`).
pub fn find_cookie(cookie_string: &str, name: &str) -> Option<String> {
    cookie_string
        .split(';')
        .map(str::trim_start)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(str::to_string)
}

/// In-memory jar that also records every write it received.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    values: HashMap<String, String>,
    writes: Vec<SetCookie>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the jar from a `document.cookie` style string.
    pub fn from_cookie_string(cookies: &str) -> Self {
        let values = cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values,
            writes: Vec::new(),
        }
    }

    /// Every write in order, as received.
    pub fn writes(&self) -> &[SetCookie] {
        &self.writes
    }

    /// The jar contents as a `document.cookie` style string, sorted by name.
    pub fn cookie_string(&self) -> String {
        let mut pairs: Vec<_> = self.values.iter().collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, cookie: SetCookie) {
        if cookie.is_removal() {
            self.values.remove(&cookie.name);
        } else {
            self.values.insert(cookie.name.clone(), cookie.value.clone());
        }
        self.writes.push(cookie);
    }
}
