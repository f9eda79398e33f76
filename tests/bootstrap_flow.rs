mod common;

use cineview::categories::CategoryCache;
use cineview::error::{CatalogError, Category};
use common::{genre, ids, movies, Call, GatedCatalog, Reply};

const BOOTSTRAP_CALLS: [Call; 4] = [Call::Trending, Call::Popular, Call::TopRated, Call::Genres];

fn success(call: Call) -> Reply {
    match call {
        Call::Trending => Reply::Movies(movies(1..=3)),
        Call::Popular => Reply::Movies(movies(10..=12)),
        Call::TopRated => Reply::Movies(movies(20..=22)),
        Call::Genres => Reply::Genres(vec![genre(28, "Action"), genre(35, "Comedy")]),
        other => panic!("not a bootstrap call: {:?}", other),
    }
}

fn permutations(items: &[Call]) -> Vec<Vec<Call>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (i, first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, *first);
            out.push(tail);
        }
    }
    out
}

#[tokio::test]
async fn loading_clears_only_after_the_last_fetch_in_every_order() {
    let orders = permutations(&BOOTSTRAP_CALLS);
    assert_eq!(orders.len(), 24);

    for order in orders {
        let api = GatedCatalog::new();
        let cache = CategoryCache::new(api.clone());
        let mut rx = cache.subscribe();
        assert!(cache.snapshot().loading());

        for (k, call) in order.iter().enumerate() {
            api.resolve(*call, success(*call)).await;
            let state = rx
                .wait_for(|s| s.settled_count() == k + 1)
                .await
                .unwrap()
                .clone();
            let last = k + 1 == BOOTSTRAP_CALLS.len();
            assert_eq!(state.loading(), !last, "order {:?} after {:?}", order, call);
            if !last {
                assert!(state.trending().is_empty(), "lists leaked early in {:?}", order);
                assert!(state.genres().is_empty());
            }
        }

        let state = cache.snapshot();
        assert!(state.error().is_none());
        assert_eq!(ids(&state.trending()), vec![1, 2, 3]);
        assert_eq!(ids(&state.popular()), vec![10, 11, 12]);
        assert_eq!(ids(&state.top_rated()), vec![20, 21, 22]);
        assert_eq!(state.genres().len(), 2);
    }
}

#[tokio::test]
async fn first_failure_owns_the_error_slot() {
    let api = GatedCatalog::new();
    let cache = CategoryCache::new(api.clone());
    let mut rx = cache.subscribe();

    api.resolve(Call::Popular, Reply::Fail("popular down".into()))
        .await;
    let state = rx.wait_for(|s| s.settled_count() == 1).await.unwrap().clone();
    assert!(state.loading());
    assert_eq!(
        state.error(),
        Some(&CatalogError::Bootstrap {
            category: Category::Popular,
            message: "popular down".into(),
        })
    );

    api.resolve(Call::TopRated, Reply::Fail("top rated down".into()))
        .await;
    api.resolve(Call::Trending, success(Call::Trending)).await;
    api.resolve(Call::Genres, success(Call::Genres)).await;

    let state = rx.wait_for(|s| !s.loading()).await.unwrap().clone();
    let err = state.error().expect("error kept");
    assert_eq!(err.kind(), "bootstrap");
    assert!(err.to_string().contains("popular"), "got {}", err);
    assert!(state.popular().is_empty());
    assert_eq!(ids(&state.trending()), vec![1, 2, 3]);
}

#[tokio::test]
async fn retry_reruns_the_whole_bundle() {
    let api = GatedCatalog::new();
    let cache = CategoryCache::new(api.clone());
    let mut rx = cache.subscribe();

    api.resolve(Call::Trending, Reply::Fail("boom".into())).await;
    for call in [Call::Popular, Call::TopRated, Call::Genres] {
        api.resolve(call, success(call)).await;
    }
    rx.wait_for(|s| !s.loading()).await.unwrap();
    assert!(cache.snapshot().error().is_some());
    let first_generation = cache.snapshot().generation();

    cache.retry();
    let state = cache.snapshot();
    assert!(state.loading());
    assert!(state.error().is_none());
    assert!(state.popular().is_empty());
    assert_eq!(state.generation(), first_generation + 1);

    for call in BOOTSTRAP_CALLS {
        api.wait_for_call_count(call, 2).await;
        api.resolve(call, success(call)).await;
    }
    let state = rx.wait_for(|s| !s.loading()).await.unwrap().clone();
    assert!(state.error().is_none());
    assert_eq!(ids(&state.trending()), vec![1, 2, 3]);
    for call in BOOTSTRAP_CALLS {
        assert_eq!(api.call_count(call), 2);
    }
}

#[tokio::test]
async fn category_lists_are_capped_to_one_page() {
    let api = GatedCatalog::new();
    let cache = CategoryCache::new(api.clone());
    let mut rx = cache.subscribe();

    api.resolve(Call::Trending, Reply::Movies(movies(1..=30)))
        .await;
    for call in [Call::Popular, Call::TopRated, Call::Genres] {
        api.resolve(call, success(call)).await;
    }
    let state = rx.wait_for(|s| !s.loading()).await.unwrap().clone();
    assert_eq!(state.trending().len(), 20);
    assert_eq!(ids(&state.featured(5)), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn dropping_the_cache_stops_the_bootstrap() {
    let api = GatedCatalog::new();
    let cache = CategoryCache::new(api.clone());
    let mut rx = cache.subscribe();
    api.wait_for_call(Call::Trending).await;

    drop(cache);
    assert!(rx.changed().await.is_err());
}
