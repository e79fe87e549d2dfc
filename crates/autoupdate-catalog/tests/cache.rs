//! Catalog cache behavior against a scripted HTTP client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use autoupdate_catalog::{CacheConfig, CacheError, CatalogCache, LICENSES_DIR};
use autoupdate_fetch::{FetchError, MockHttpClient, MockRoute, NetworkAccess};
use bytes::Bytes;
use tempfile::tempdir;
use url::Url;

fn open(dir: &Path, client: &MockHttpClient) -> Arc<CatalogCache<MockHttpClient>> {
    let config = CacheConfig::default().cache_dir(dir);
    Arc::new(CatalogCache::open(&config, NetworkAccess::new(client.clone())).unwrap())
}

fn remote(path: &str) -> Url {
    Url::parse(&format!("http://updates.example.org/{path}")).unwrap()
}

fn leftovers(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with('.'))
        .collect()
}

#[tokio::test]
async fn test_open_creates_layout() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("nested").join("cache");
    let cache = open(&root, &MockHttpClient::new());

    assert!(root.is_dir());
    assert!(root.join(LICENSES_DIR).is_dir());
    assert_eq!(cache.licenses_dir(), cache.root().join(LICENSES_DIR));
}

#[tokio::test]
async fn test_refresh_then_resolve() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.serve(remote("release.json").as_str(), "{\"items\":[]}");
    let cache = open(dir.path(), &client);

    assert_eq!(cache.cached_url("release").await.unwrap(), None);

    let url = cache.refresh("release", &remote("release.json")).await.unwrap();
    assert_eq!(url.scheme(), "file");
    assert_eq!(cache.cached_url("release").await.unwrap(), Some(url.clone()));

    let path = url.to_file_path().unwrap();
    assert_eq!(path, cache.root().join("release"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), "{\"items\":[]}");
    assert!(leftovers(cache.root()).is_empty());
}

#[tokio::test]
async fn test_empty_cached_file_is_absent() {
    let dir = tempdir().unwrap();
    let cache = open(dir.path(), &MockHttpClient::new());
    std::fs::write(cache.root().join("release"), b"").unwrap();

    assert_eq!(cache.cached_url("release").await.unwrap(), None);
    let read = cache.read_cached("release", |_| ()).await.unwrap();
    assert!(read.is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_catalog() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.serve(remote("release.json").as_str(), "version one");
    let cache = open(dir.path(), &client);
    cache.refresh("release", &remote("release.json")).await.unwrap();

    client.route(remote("release.json").as_str(), MockRoute::Status(503));
    let err = cache
        .refresh("release", &remote("release.json"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Fetch { source: FetchError::Status { status: 503, .. }, .. }
    ));

    let path = cache.catalog_path("release").unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "version one");
    assert!(leftovers(cache.root()).is_empty());
}

#[tokio::test]
async fn test_truncated_download_is_rejected() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.route(
        remote("release.json").as_str(),
        MockRoute::Body {
            chunks:         vec![Bytes::from(vec![b'x'; 50])],
            content_length: Some(100),
        },
    );
    let cache = open(dir.path(), &client);

    let err = cache
        .refresh("release", &remote("release.json"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Fetch { source: FetchError::Truncated { expected: 100, actual: 50, .. }, .. }
    ));
    assert_eq!(cache.cached_url("release").await.unwrap(), None);
    assert!(leftovers(cache.root()).is_empty());
}

#[tokio::test]
async fn test_empty_download_is_rejected() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.serve(remote("release.json").as_str(), Bytes::new());
    let cache = open(dir.path(), &client);

    let err = cache
        .refresh("release", &remote("release.json"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Fetch { source: FetchError::EmptyBody { .. }, .. }
    ));
}

#[tokio::test]
async fn test_refresh_times_out() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.route(remote("slow.json").as_str(), MockRoute::Stall);
    let config = CacheConfig {
        timeout_ms: 50,
        ..CacheConfig::default().cache_dir(dir.path())
    };
    let cache = CatalogCache::open(&config, NetworkAccess::new(client)).unwrap();

    let err = cache.refresh("slow", &remote("slow.json")).await.unwrap_err();
    match err {
        CacheError::Fetch { name, source } => {
            assert_eq!(name, "slow");
            assert!(source.is_timeout());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_refresh_follows_redirect() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.redirect(remote("latest.json").as_str(), "/2024/release.json");
    client.serve(remote("2024/release.json").as_str(), "redirected");
    let cache = open(dir.path(), &client);

    let url = cache.refresh("release", &remote("latest.json")).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(url.to_file_path().unwrap()).unwrap(),
        "redirected"
    );
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let dir = tempdir().unwrap();
    let cache = open(dir.path(), &MockHttpClient::new());

    for name in ["", "..", "../outside", "a/b", ".staging", LICENSES_DIR] {
        let err = cache.refresh(name, &remote("x")).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidName(_)), "{name:?}");
    }
}

#[tokio::test]
async fn test_entries_lists_catalogs_only() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.serve(remote("a.json").as_str(), "aaaa");
    client.serve(remote("b.json").as_str(), "bb");
    let cache = open(dir.path(), &client);

    cache.refresh("beta", &remote("b.json")).await.unwrap();
    cache.refresh("alpha", &remote("a.json")).await.unwrap();
    cache.store_license("apache-2.0", Some("text")).await.unwrap();

    let entries = cache.entries().await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta"]);
    assert!(entries.iter().all(|e| e.exists));
    assert_eq!(entries[0].size, 4);
    assert_eq!(entries[1].size, 2);

    let missing = cache.entry("gamma").await.unwrap();
    assert!(!missing.exists);
    assert_eq!(missing.size, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_of_one_catalog_never_mix() {
    const WRITERS: u8 = 8;
    const SIZE: usize = 64 * 1024;

    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    for writer in 0..WRITERS {
        let chunks: Vec<Bytes> = vec![writer; SIZE]
            .chunks(4096)
            .map(Bytes::copy_from_slice)
            .collect();
        client.route(
            remote(&format!("w{writer}")).as_str(),
            MockRoute::Delayed(
                Duration::from_millis(u64::from(writer) * 3),
                Box::new(MockRoute::Body {
                    chunks,
                    content_length: Some(SIZE as u64),
                }),
            ),
        );
    }
    let cache = open(dir.path(), &client);

    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            for _ in 0..200 {
                let seen = cache
                    .read_cached("shared", |path| std::fs::read(path).unwrap())
                    .await
                    .unwrap();
                if let Some(data) = seen {
                    assert_eq!(data.len(), SIZE, "reader saw a partial catalog");
                    assert!(data.iter().all(|b| *b == data[0]), "reader saw mixed writes");
                }
                tokio::task::yield_now().await;
            }
        })
    };

    let writers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.refresh("shared", &remote(&format!("w{writer}"))).await })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }
    reader.await.unwrap();

    let data = std::fs::read(cache.catalog_path("shared").unwrap()).unwrap();
    assert_eq!(data.len(), SIZE);
    assert!(data[0] < WRITERS);
    assert!(data.iter().all(|b| *b == data[0]));
    assert!(leftovers(cache.root()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distinct_catalogs_do_not_wait_for_each_other() {
    let dir = tempdir().unwrap();
    let client = MockHttpClient::new();
    client.serve(remote("a.json").as_str(), "a");
    client.serve(remote("b.json").as_str(), "b");
    let cache = open(dir.path(), &client);
    cache.refresh("a", &remote("a.json")).await.unwrap();

    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let holder = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            cache
                .read_cached("a", move |_| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
                .await
                .unwrap()
        })
    };
    tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
        .await
        .unwrap();

    let (url_a, url_b) = tokio::time::timeout(Duration::from_secs(5), async {
        let b = cache.refresh("b", &remote("b.json")).await.unwrap();
        let a = cache.catalog_path("a").unwrap();
        (a, b)
    })
    .await
    .expect("catalog b must not wait for the lock on catalog a");
    assert_eq!(std::fs::read_to_string(url_b.to_file_path().unwrap()).unwrap(), "b");
    assert_eq!(std::fs::read_to_string(url_a).unwrap(), "a");

    release_tx.send(()).unwrap();
    assert!(holder.await.unwrap().is_some());
}
