//! Tests for the single-flight cache through data and singleton resources

use beaver_domain::error::{Error, Result};
use beaver_infrastructure::resource::{CachedDataResource, ResourceEvent, SingletonResource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Resource returning `"<key>#<call number>"` after `delay`
fn counting_resource(
    delay: Duration,
) -> (CachedDataResource<String, String>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let resource = CachedDataResource::from_fn("users", move |key: String| {
        let counter = Arc::clone(&counter);
        async move {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(delay).await;
            Ok::<_, Error>(format!("{key}#{call}"))
        }
    });
    (resource, calls)
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_share_one_fetch() {
    let (resource, calls) = counting_resource(Duration::from_millis(50));

    let (first, second, third) = tokio::join!(
        resource.load("alice".to_string()),
        resource.load("alice".to_string()),
        resource.load("alice".to_string()),
    );

    assert_eq!(first.unwrap(), "alice#1");
    assert_eq!(second.unwrap(), "alice#1");
    assert_eq!(third.unwrap(), "alice#1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_different_keys_fetch_independently() {
    let (resource, calls) = counting_resource(Duration::from_millis(10));

    let (alice, bob) = tokio::join!(
        resource.load("alice".to_string()),
        resource.load("bob".to_string()),
    );

    assert_eq!(alice.unwrap(), "alice#1");
    assert!(bob.unwrap().starts_with("bob#"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_mark_during_fetch_forces_next_fetch() {
    let (resource, calls) = counting_resource(Duration::from_millis(50));
    let alice = "alice".to_string();

    let (first, ()) = tokio::join!(resource.load(alice.clone()), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        resource.mark_outdated(&alice);
    });

    assert_eq!(first.unwrap(), "alice#1");
    let status = resource.status(&alice);
    assert!(status.outdated);
    assert!(!status.loading);
    assert_eq!(resource.load(alice).await.unwrap(), "alice#2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fresh_entry_is_not_fetched_again() {
    let (resource, calls) = counting_resource(Duration::ZERO);

    resource.load("alice".to_string()).await.unwrap();
    let again = resource.load("alice".to_string()).await.unwrap();

    assert_eq!(again, "alice#1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_outdated_entry_stays_readable_until_refetched() {
    let (resource, calls) = counting_resource(Duration::ZERO);
    resource.load("alice".to_string()).await.unwrap();

    resource.mark_outdated(&"alice".to_string());

    assert_eq!(resource.get(&"alice".to_string()).as_deref(), Some("alice#1"));
    assert!(resource.status(&"alice".to_string()).outdated);

    let reloaded = resource.load("alice".to_string()).await.unwrap();
    assert_eq!(reloaded, "alice#2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!resource.status(&"alice".to_string()).outdated);
}

#[tokio::test]
async fn test_mark_all_outdated_covers_every_entry() {
    let (resource, calls) = counting_resource(Duration::ZERO);
    resource.load("alice".to_string()).await.unwrap();
    resource.load("bob".to_string()).await.unwrap();

    resource.mark_all_outdated();
    resource.load("alice".to_string()).await.unwrap();
    resource.load("bob".to_string()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_refresh_always_fetches() {
    let (resource, calls) = counting_resource(Duration::ZERO);
    resource.load("alice".to_string()).await.unwrap();

    let refreshed = resource.refresh("alice".to_string()).await.unwrap();

    assert_eq!(refreshed, "alice#2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_reaches_every_waiter_and_retry_succeeds() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let resource = CachedDataResource::from_fn("connections", move |key: u32| {
        let counter = Arc::clone(&counter);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(Error::transport("connection refused"));
            }
            Ok(key * 10)
        }
    });

    let (first, second) = tokio::join!(resource.load(7), resource.load(7));

    for result in [first, second] {
        match result.unwrap_err() {
            Error::ResourceLoad {
                resource,
                key,
                source,
            } => {
                assert_eq!(resource, "connections");
                assert_eq!(key, "7");
                assert!(matches!(*source, Error::Transport { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let status = resource.status(&7);
    assert!(!status.loaded);
    assert!(!status.loading);
    assert!(status.last_error.is_some());

    assert_eq!(resource.load(7).await.unwrap(), 70);
    assert!(resource.status(&7).last_error.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_completes_after_caller_gives_up() {
    let (resource, calls) = counting_resource(Duration::from_millis(100));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), resource.load("alice".to_string())).await;
    assert!(abandoned.is_err());
    assert!(resource.status(&"alice".to_string()).loading);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(resource.get(&"alice".to_string()).as_deref(), Some("alice#1"));
    assert_eq!(resource.load("alice".to_string()).await.unwrap(), "alice#1");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_loader_becomes_an_error() {
    let resource = CachedDataResource::from_fn("explosive", |key: String| async move {
        if key == "boom" {
            panic!("loader exploded");
        }
        Ok::<_, Error>(key.len())
    });

    let err = resource.load("boom".to_string()).await.unwrap_err();

    match err {
        Error::ResourceLoad { source, .. } => {
            assert!(source.to_string().contains("loader exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(resource.load("fine".to_string()).await.unwrap(), 4);
}

#[tokio::test]
async fn test_set_and_delete_work_locally() {
    let (resource, calls) = counting_resource(Duration::ZERO);

    resource.set("carol".to_string(), "local".to_string());
    assert_eq!(resource.load("carol".to_string()).await.unwrap(), "local");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(
        resource.delete(&"carol".to_string()).as_deref(),
        Some("local")
    );
    assert!(!resource.has(&"carol".to_string()));
    assert_eq!(resource.load("carol".to_string()).await.unwrap(), "carol#1");
}

#[tokio::test]
async fn test_subscribers_see_entry_changes() {
    let (resource, _calls) = counting_resource(Duration::ZERO);
    let mut events = resource.subscribe();

    resource.load("alice".to_string()).await.unwrap();
    resource.mark_outdated(&"alice".to_string());
    resource.set("alice".to_string(), "edited".to_string());
    resource.delete(&"alice".to_string());

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.key(), "alice");
        seen.push(match event {
            ResourceEvent::Loaded(_) => "loaded",
            ResourceEvent::Failed { .. } => "failed",
            ResourceEvent::Outdated(_) => "outdated",
            ResourceEvent::Updated(_) => "updated",
            ResourceEvent::Deleted(_) => "deleted",
        });
    }
    assert_eq!(seen, vec!["loaded", "outdated", "updated", "deleted"]);
}

#[tokio::test]
async fn test_singleton_loads_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let config = SingletonResource::from_fn("serverConfig", move || {
        let counter = Arc::clone(&counter);
        async move { Result::Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
    });

    assert!(!config.is_loaded());
    assert_eq!(config.load().await.unwrap(), 1);
    assert_eq!(config.load().await.unwrap(), 1);
    assert_eq!(config.data(), Some(1));

    config.mark_outdated();
    assert_eq!(config.data(), Some(1));
    assert_eq!(config.load().await.unwrap(), 2);

    assert_eq!(config.refresh().await.unwrap(), 3);

    config.set(42);
    assert_eq!(config.load().await.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(config.status().loaded);
}
