//! Tests for the keyed map resource

use beaver_domain::error::Error;
use beaver_infrastructure::resource::{CachedMapResource, KeyState, MapKey};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Server-side driver table and the requests made against it
#[derive(Clone, Default)]
struct Backend {
    rows: Arc<Mutex<Vec<(String, u32)>>>,
    requests: Arc<Mutex<Vec<MapKey<String>>>>,
    /// Holds full loads until released
    gate: Option<Arc<Notify>>,
}

impl Backend {
    fn with_rows(rows: &[(&str, u32)]) -> Self {
        let backend = Self::default();
        backend.set_rows(rows);
        backend
    }

    fn gated(rows: &[(&str, u32)]) -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::with_rows(rows)
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn set_rows(&self, rows: &[(&str, u32)]) {
        *self.rows.lock().unwrap() = rows.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    }

    fn requests(&self) -> Vec<MapKey<String>> {
        self.requests.lock().unwrap().clone()
    }

    fn resource(&self) -> CachedMapResource<String, u32> {
        let backend = self.clone();
        CachedMapResource::from_fn("drivers", move |key: MapKey<String>| {
            let backend = backend.clone();
            async move {
                backend.requests.lock().unwrap().push(key.clone());
                if let (MapKey::All, Some(gate)) = (&key, &backend.gate) {
                    gate.notified().await;
                }
                let rows = backend.rows.lock().unwrap().clone();
                Ok::<_, Error>(match key {
                    MapKey::All => rows,
                    MapKey::Key(id) => rows.into_iter().filter(|(k, _)| *k == id).collect(),
                })
            }
        })
    }
}

fn key(id: &str) -> String {
    id.to_string()
}

fn sorted_keys(resource: &CachedMapResource<String, u32>) -> Vec<String> {
    let mut keys = resource.keys();
    keys.sort();
    keys
}

#[tokio::test]
async fn test_load_all_distinguishes_absent_from_unknown() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();

    assert_eq!(drivers.lookup(&key("c")), KeyState::NotLoaded);

    let all = drivers.load_all().await.unwrap();

    assert_eq!(all.len(), 2);
    assert!(drivers.is_all_loaded());
    assert!(drivers.has(&key("a")));
    assert!(!drivers.has(&key("c")));
    assert_eq!(drivers.lookup(&key("c")), KeyState::Absent);
}

#[tokio::test]
async fn test_full_load_covers_single_keys() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    assert_eq!(drivers.load(key("a")).await.unwrap(), Some(1));
    assert_eq!(drivers.load(key("missing")).await.unwrap(), None);
    assert_eq!(backend.requests(), vec![MapKey::All]);
    assert!(drivers.status(&MapKey::Key(key("a"))).loaded);
}

#[tokio::test]
async fn test_full_reload_evicts_entries_missing_from_response() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    backend.set_rows(&[("a", 10)]);
    let all = drivers.refresh_all().await.unwrap();

    assert_eq!(all.get("a"), Some(&10));
    assert_eq!(sorted_keys(&drivers), vec!["a"]);
    assert_eq!(drivers.lookup(&key("b")), KeyState::Absent);
}

#[tokio::test]
async fn test_keyed_load_merges_and_records_absence() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();

    assert_eq!(drivers.load(key("b")).await.unwrap(), Some(2));
    assert_eq!(drivers.load(key("x")).await.unwrap(), None);

    assert_eq!(sorted_keys(&drivers), vec!["b"]);
    assert_eq!(drivers.lookup(&key("x")), KeyState::Absent);
    assert_eq!(drivers.lookup(&key("a")), KeyState::NotLoaded);
    assert!(!drivers.is_all_loaded());
}

#[tokio::test]
async fn test_keyed_reload_evicts_removed_entry() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    backend.set_rows(&[("a", 1)]);
    assert_eq!(drivers.refresh(key("b")).await.unwrap(), None);

    assert_eq!(sorted_keys(&drivers), vec!["a"]);
}

#[tokio::test]
async fn test_marking_one_key_refetches_only_that_key() {
    let backend = Backend::with_rows(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    drivers.mark_outdated(key("a"));
    assert_eq!(drivers.get(&key("a")), Some(1));

    backend.set_rows(&[("a", 5), ("b", 6)]);
    assert_eq!(drivers.load(key("a")).await.unwrap(), Some(5));
    drivers.load_all().await.unwrap();

    assert_eq!(backend.requests(), vec![MapKey::All, MapKey::Key(key("a"))]);
    assert_eq!(drivers.get(&key("b")), Some(2));
}

#[tokio::test]
async fn test_mark_all_outdated_refetches_everything() {
    let backend = Backend::with_rows(&[("a", 1)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    drivers.mark_all_outdated();
    assert!(drivers.status(&MapKey::Key(key("a"))).outdated);

    drivers.load(key("a")).await.unwrap();
    drivers.load_all().await.unwrap();

    assert_eq!(
        backend.requests(),
        vec![MapKey::All, MapKey::Key(key("a")), MapKey::All]
    );
}

#[tokio::test]
async fn test_local_changes() {
    let backend = Backend::with_rows(&[("a", 1)]);
    let drivers = backend.resource();
    drivers.load_all().await.unwrap();

    drivers.set(key("z"), 26);
    assert_eq!(drivers.load(key("z")).await.unwrap(), Some(26));
    assert_eq!(drivers.len(), 2);

    assert_eq!(drivers.delete(&key("a")), Some(1));
    assert_eq!(drivers.lookup(&key("a")), KeyState::NotLoaded);
    assert!(!drivers.status(&MapKey::Key(key("a"))).loaded);

    assert_eq!(drivers.load(key("a")).await.unwrap(), Some(1));
    assert_eq!(
        backend.requests(),
        vec![MapKey::All, MapKey::Key(key("a"))]
    );
}

#[tokio::test]
async fn test_failed_full_load_keeps_previous_entries() {
    let backend = Backend::with_rows(&[("a", 1)]);
    let fail = Arc::new(Mutex::new(false));
    let drivers = {
        let backend = backend.clone();
        let fail = Arc::clone(&fail);
        CachedMapResource::from_fn("drivers", move |_key: MapKey<String>| {
            let rows = backend.rows.lock().unwrap().clone();
            let fail = *fail.lock().unwrap();
            async move {
                if fail {
                    return Err(Error::transport("offline"));
                }
                Ok(rows)
            }
        })
    };
    drivers.load_all().await.unwrap();

    *fail.lock().unwrap() = true;
    assert!(drivers.refresh_all().await.is_err());

    assert_eq!(drivers.get(&key("a")), Some(1));
    assert!(drivers.status(&MapKey::All).last_error.is_some());
}

#[tokio::test]
async fn test_mark_during_full_load_survives_the_load() {
    let backend = Backend::gated(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();

    let (all, ()) = tokio::join!(drivers.load_all(), async {
        tokio::task::yield_now().await;
        assert!(drivers.status(&MapKey::All).loading);
        drivers.mark_outdated(key("a"));
        assert!(!drivers.status(&MapKey::Key(key("a"))).loading);
        backend.release();
    });
    assert_eq!(all.unwrap().len(), 2);

    let status = drivers.status(&MapKey::Key(key("a")));
    assert!(!status.loading);
    assert!(status.loaded);
    assert!(status.outdated);
    assert!(!drivers.status(&MapKey::Key(key("b"))).outdated);

    backend.set_rows(&[("a", 7), ("b", 2)]);
    assert_eq!(drivers.load(key("a")).await.unwrap(), Some(7));
    assert!(!drivers.status(&MapKey::Key(key("a"))).outdated);
    assert_eq!(backend.requests(), vec![MapKey::All, MapKey::Key(key("a"))]);
}

#[tokio::test]
async fn test_keyed_load_during_full_load() {
    let backend = Backend::gated(&[("a", 1), ("b", 2)]);
    let drivers = backend.resource();

    let (all, b) = tokio::join!(drivers.load_all(), async {
        tokio::task::yield_now().await;
        let b = drivers.load(key("b")).await;
        backend.release();
        b
    });

    assert_eq!(all.unwrap().len(), 2);
    assert_eq!(b.unwrap(), Some(2));
    for id in ["a", "b"] {
        let status = drivers.status(&MapKey::Key(key(id)));
        assert!(!status.loading);
        assert!(!status.outdated);
    }
    assert!(!drivers.status(&MapKey::All).loading);
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_local_set_during_full_load_is_replaced() {
    let backend = Backend::gated(&[("a", 1)]);
    let drivers = backend.resource();

    let (all, ()) = tokio::join!(drivers.load_all(), async {
        tokio::task::yield_now().await;
        drivers.set(key("z"), 26);
        backend.release();
    });

    assert_eq!(sorted_keys(&drivers), vec!["a"]);
    assert!(!all.unwrap().contains_key("z"));
    assert_eq!(drivers.lookup(&key("z")), KeyState::Absent);
    let status = drivers.status(&MapKey::Key(key("z")));
    assert!(!status.loading);
    assert!(!status.outdated);
}
