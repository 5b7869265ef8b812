//! Cookie and session-storage bridge.
//!
//! The hosting page's cookies and session storage are ambient shared
//! resources. This module wraps them behind small traits so the core never
//! touches globals directly, and gives each well-known storage key a typed
//! record with an explicit merge-not-replace contract.
//!
//! Merge writes are read-modify-write with no locking of their own; the
//! service routes all merge writes to a given key through one call path so
//! they never race. That single-writer discipline is an open constraint,
//! not a guaranteed invariant, should the embedding ever parallelize.

use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SessionError};
use crate::plan::{AcqSources, PaymentPlan};

// ═══════════════════════════════════════════════════════════════════════
// Well-Known Names
// ═══════════════════════════════════════════════════════════════════════

/// Cookie holding the session ticket id.
pub const COOKIE_TICKET_ID: &str = "TicketId";
/// Cookie holding the encrypted ticket.
pub const COOKIE_ENC_TICKET: &str = "encTicket";
/// Cookie holding the SSO id.
pub const COOKIE_SSO_ID: &str = "ssoid";
/// Cookie holding the one-time token refreshed by the entitlement endpoint.
pub const COOKIE_ONE_TIME_TOKEN: &str = "OTR";

/// All session cookies cleared on logout, in clearing order.
pub const SESSION_COOKIES: [&str; 4] = [
    COOKIE_TICKET_ID,
    COOKIE_ENC_TICKET,
    COOKIE_SSO_ID,
    COOKIE_ONE_TIME_TOKEN,
];

/// Session-storage key for the selected payment plan.
pub const KEY_SELECTED_PLAN: &str = "et_plans_selectedPlan";
/// Session-storage key for the GA dimension merge-map.
pub const KEY_GA_EVENTS: &str = "updateGAEvents";
/// Session-storage key for the Comscore dimension merge-map.
pub const KEY_CS_EVENTS: &str = "updateCSEvents";
/// Session-storage key for acquisition attribution.
pub const KEY_ACQ_SOURCES: &str = "acqSourcesData";

/// Session-storage keys removed on logout.
pub const LOGOUT_STORAGE_KEYS: [&str; 4] =
    [KEY_SELECTED_PLAN, KEY_GA_EVENTS, KEY_CS_EVENTS, KEY_ACQ_SOURCES];

// ═══════════════════════════════════════════════════════════════════════
// Cookies
// ═══════════════════════════════════════════════════════════════════════

/// A domain-scoped cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie is scoped to.
    pub domain: String,
}

impl Cookie {
    /// Create a cookie.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
        }
    }
}

/// Access to the hosting page's cookies.
pub trait CookieJar: Send + Sync {
    /// Read a cookie value by name.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie.
    fn set(&self, cookie: Cookie);

    /// Expire a cookie on the given domain.
    fn remove(&self, name: &str, domain: &str);
}

/// Write a cookie only when its value actually changed.
///
/// Returns `true` if a write happened. Avoids redundant cookie writes on
/// every login check.
pub fn set_cookie_if_changed(jar: &dyn CookieJar, cookie: Cookie) -> bool {
    if jar.get(&cookie.name).as_deref() == Some(cookie.value.as_str()) {
        return false;
    }
    jar.set(cookie);
    true
}

/// In-memory cookie jar.
///
/// Used in tests and non-browser embeddings.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    cookies: Arc<Mutex<HashMap<String, Cookie>>>,
    writes: Arc<std::sync::atomic::AtomicUsize>,
}

impl MemoryCookieJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cookies currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Whether the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total writes performed, for asserting write avoidance.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .lock()
            .ok()
            .and_then(|c| c.get(name).map(|cookie| cookie.value.clone()))
    }

    fn set(&self, cookie: Cookie) {
        if let Ok(mut cookies) = self.cookies.lock() {
            self.writes
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            cookies.insert(cookie.name.clone(), cookie);
        }
    }

    fn remove(&self, name: &str, domain: &str) {
        if let Ok(mut cookies) = self.cookies.lock() {
            // Only expire a cookie scoped to the requested domain
            if cookies.get(name).is_some_and(|c| c.domain == domain) {
                cookies.remove(name);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session Storage
// ═══════════════════════════════════════════════════════════════════════

/// Access to the hosting page's session storage.
pub trait StorageArea: Send + Sync {
    /// Read the raw string under `key`.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Write the raw string under `key`.
    fn set_raw(&self, key: &str, value: String);

    /// Remove `key`.
    fn remove(&self, key: &str);
}

/// Typed helpers over a [`StorageArea`].
///
/// These give every well-known key an explicit record type and make the
/// merge-not-replace semantic a contract instead of an implicit loop.
pub trait StorageAreaExt: StorageArea {
    /// Read and deserialize the record under `key`.
    ///
    /// A missing key yields `Ok(None)`; a present-but-corrupt value is a
    /// [`SessionError::Serialization`].
    ///
    /// # Errors
    ///
    /// Returns an error when the stored JSON does not deserialize into `T`.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| SessionError::Serialization(e.to_string())),
        }
    }

    /// Serialize and write the record under `key`, replacing any previous
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` fails to serialize.
    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.set_raw(key, raw);
        Ok(())
    }

    /// Merge `patch` into the JSON object stored under `key`.
    ///
    /// Keys present in `patch` overwrite; keys absent from `patch` survive.
    /// A missing or corrupt stored value is treated as an empty object, so
    /// a merge never fails because of what was there before.
    ///
    /// # Errors
    ///
    /// Returns an error when `patch` fails to serialize, or serializes to
    /// something other than a JSON object.
    fn merge_update<T: Serialize>(&self, key: &str, patch: &T) -> Result<()> {
        let patch_value = serde_json::to_value(patch)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let serde_json::Value::Object(patch_map) = patch_value else {
            return Err(SessionError::Serialization(format!(
                "merge_update target for {key} must be a JSON object"
            )));
        };

        let mut current = self
            .get_raw(key)
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .and_then(|v| match v {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();

        for (k, v) in patch_map {
            current.insert(k, v);
        }

        let raw = serde_json::to_string(&serde_json::Value::Object(current))
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.set_raw(key, raw);
        Ok(())
    }

    /// The persisted selected plan, if any.
    ///
    /// A corrupt record reads as `None` rather than failing the caller;
    /// the next selection overwrites it.
    fn selected_plan(&self) -> Option<PaymentPlan> {
        self.read(KEY_SELECTED_PLAN).ok().flatten()
    }

    /// Merge the selected plan into the persisted record.
    ///
    /// Fields set by an earlier persist (such as `checkReferer`) survive
    /// unless the new plan sets them.
    ///
    /// # Errors
    ///
    /// Returns an error when the plan fails to serialize.
    fn persist_selected_plan(&self, plan: &PaymentPlan) -> Result<()> {
        self.merge_update(KEY_SELECTED_PLAN, plan)
    }

    /// Flip the `checkReferer` flag on the persisted plan without touching
    /// the rest of the record.
    ///
    /// # Errors
    ///
    /// Returns an error when the patch fails to serialize.
    fn mark_selected_plan_check_referer(&self, check_referer: bool) -> Result<()> {
        let mut patch = serde_json::Map::new();
        patch.insert(
            "checkReferer".to_string(),
            serde_json::Value::Bool(check_referer),
        );
        self.merge_update(KEY_SELECTED_PLAN, &patch)
    }

    /// The persisted acquisition attribution, if any.
    fn acq_sources(&self) -> Option<AcqSources> {
        self.read(KEY_ACQ_SOURCES).ok().flatten()
    }
}

impl<S: StorageArea + ?Sized> StorageAreaExt for S {}

/// In-memory session storage.
///
/// Used in tests and non-browser embeddings.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageArea {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorageArea {
    /// Create an empty storage area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently present.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl StorageArea for MemoryStorageArea {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok().and_then(|e| e.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can unwrap
mod tests {
    use super::*;

    #[test]
    fn set_cookie_if_changed_skips_redundant_writes() {
        let jar = MemoryCookieJar::new();

        assert!(set_cookie_if_changed(
            &jar,
            Cookie::new(COOKIE_TICKET_ID, "t1", ".example.com")
        ));
        assert!(!set_cookie_if_changed(
            &jar,
            Cookie::new(COOKIE_TICKET_ID, "t1", ".example.com")
        ));
        assert!(set_cookie_if_changed(
            &jar,
            Cookie::new(COOKIE_TICKET_ID, "t2", ".example.com")
        ));
    }

    #[test]
    fn remove_is_domain_scoped() {
        let jar = MemoryCookieJar::new();
        jar.set(Cookie::new(COOKIE_SSO_ID, "123", ".example.com"));

        jar.remove(COOKIE_SSO_ID, ".other.com");
        assert_eq!(jar.get(COOKIE_SSO_ID), Some("123".to_string()));

        jar.remove(COOKIE_SSO_ID, ".example.com");
        assert_eq!(jar.get(COOKIE_SSO_ID), None);
    }

    #[test]
    fn merge_preserves_fields_absent_from_patch() {
        let storage = MemoryStorageArea::new();

        let plan = PaymentPlan::new("A");
        storage.persist_selected_plan(&plan).unwrap();

        storage.mark_selected_plan_check_referer(true).unwrap();

        let read_back = storage.selected_plan().unwrap();
        assert_eq!(read_back.plan_code, "A");
        assert!(read_back.check_referer);
    }

    #[test]
    fn merge_overwrites_patched_fields_only() {
        let storage = MemoryStorageArea::new();

        let mut first = PaymentPlan::new("A");
        first.deal_code = Some("FEST".to_string());
        storage.persist_selected_plan(&first).unwrap();

        let mut second = PaymentPlan::new("B");
        second.deal_code = None;
        storage.persist_selected_plan(&second).unwrap();

        let read_back = storage.selected_plan().unwrap();
        assert_eq!(read_back.plan_code, "B");
        // Unset fields are absent from the patch, so the earlier value survives
        assert_eq!(read_back.deal_code, Some("FEST".to_string()));
    }

    #[test]
    fn fresh_plan_persist_does_not_clear_check_referer() {
        let storage = MemoryStorageArea::new();

        storage.persist_selected_plan(&PaymentPlan::new("A")).unwrap();
        storage.mark_selected_plan_check_referer(true).unwrap();

        // A new selection merges over the record without unsetting the flag
        storage.persist_selected_plan(&PaymentPlan::new("B")).unwrap();
        let read_back = storage.selected_plan().unwrap();
        assert_eq!(read_back.plan_code, "B");
        assert!(read_back.check_referer);

        // Clearing goes through the explicit patch
        storage.mark_selected_plan_check_referer(false).unwrap();
        assert!(!storage.selected_plan().unwrap().check_referer);
    }

    #[test]
    fn corrupt_plan_record_reads_as_none() {
        let storage = MemoryStorageArea::new();
        storage.set_raw(KEY_SELECTED_PLAN, "not-json".to_string());
        assert!(storage.selected_plan().is_none());
    }

    #[test]
    fn merge_into_ga_events_accumulates_keys() {
        let storage = MemoryStorageArea::new();

        let mut first = std::collections::BTreeMap::new();
        first.insert("dimension1", "loggedout");
        storage.merge_update(KEY_GA_EVENTS, &first).unwrap();

        let mut second = std::collections::BTreeMap::new();
        second.insert("dimension2", "trial");
        storage.merge_update(KEY_GA_EVENTS, &second).unwrap();

        let map: std::collections::BTreeMap<String, String> =
            storage.read(KEY_GA_EVENTS).unwrap().unwrap();
        assert_eq!(map.get("dimension1"), Some(&"loggedout".to_string()));
        assert_eq!(map.get("dimension2"), Some(&"trial".to_string()));
    }
}
