//! # Sessions
//! Per-session selected-countries state, keyed by a cookie value.
//!
//! The store is the only shared mutable state in the service. Every toggle
//! runs with the store lock held for the whole read-modify-write, so two
//! requests on the same session can never interleave a toggle.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "news_session";

/// Insertion-ordered set of country names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectedCountries(Vec<String>);

impl SelectedCountries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `country` if absent, remove it if present. Returns `true` when
    /// the country is selected afterwards.
    pub fn toggle(&mut self, country: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|c| c == country) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(country.to_string());
            true
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.0.iter().any(|c| c == country)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectedCountries {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut out = Self::new();
        for c in iter {
            let c = c.into();
            if !out.contains(&c) {
                out.0.push(c);
            }
        }
        out
    }
}

/// Idle sessions older than this are dropped.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Upper bound on live sessions; the least recently used one goes first.
const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    countries: SelectedCountries,
    touched: Instant,
}

/// In-memory session store.
///
/// Only sessions with at least one selected country are kept. Entries idle
/// for longer than the TTL are swept whenever a new session is inserted, and
/// the store never holds more than `max_sessions` entries.
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock cannot leave a half-applied toggle.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn is_live(&self, touched: Instant, now: Instant) -> bool {
        now.saturating_duration_since(touched) < self.ttl
    }

    /// Toggle `country` for session `id` and return the resulting selection.
    pub fn toggle(&self, id: &str, country: &str) -> SelectedCountries {
        self.toggle_at(id, country, Instant::now())
    }

    fn toggle_at(&self, id: &str, country: &str, now: Instant) -> SelectedCountries {
        let mut map = self.lock();
        if !map.contains_key(id) {
            self.make_room(&mut map, now);
        }
        let entry = map.entry(id.to_string()).or_insert_with(|| Entry {
            countries: SelectedCountries::new(),
            touched: now,
        });
        if !self.is_live(entry.touched, now) {
            entry.countries = SelectedCountries::new();
        }
        entry.touched = now;
        entry.countries.toggle(country);
        let selected = entry.countries.clone();

        if selected.is_empty() {
            map.remove(id);
        }
        selected
    }

    /// Copy of the session's selection (empty for unknown or expired
    /// sessions). Reading counts as activity.
    pub fn snapshot(&self, id: &str) -> SelectedCountries {
        self.snapshot_at(id, Instant::now())
    }

    fn snapshot_at(&self, id: &str, now: Instant) -> SelectedCountries {
        let mut map = self.lock();
        match map.get_mut(id) {
            Some(entry) if self.is_live(entry.touched, now) => {
                entry.touched = now;
                return entry.countries.clone();
            }
            Some(_) => {}
            None => return SelectedCountries::new(),
        }
        map.remove(id);
        SelectedCountries::new()
    }

    /// Sweep expired entries, then evict least recently used ones until a
    /// new entry fits under the cap.
    fn make_room(&self, map: &mut HashMap<String, Entry>, now: Instant) {
        let before = map.len();
        map.retain(|_, e| self.is_live(e.touched, now));
        while map.len() >= self.max_sessions {
            let oldest = map
                .iter()
                .min_by_key(|(_, e)| e.touched)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => map.remove(&k),
                None => break,
            };
        }
        let evicted = before - map.len();
        if evicted > 0 {
            tracing::debug!(evicted, live = map.len(), "sessions evicted");
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Fresh random session id (UUID v4, hyphenated).
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Short SHA-256 fingerprint of a session id, safe to put in logs.
pub fn session_fingerprint(id: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(id.as_bytes()));
    digest[..12].to_string()
}

/// Pull the session id out of a raw `Cookie` header value.
pub fn session_id_from_cookie(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == SESSION_COOKIE && is_valid_session_id(v)).then(|| v.to_string())
    })
}

/// Hyphenated UUID form only, as issued by [`new_session_id`].
fn is_valid_session_id(v: &str) -> bool {
    v.len() == 36 && Uuid::parse_str(v).is_ok()
}
