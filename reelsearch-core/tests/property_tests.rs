use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use reelsearch_core::{
    movie_descriptor, Gateway, MemoryStore, Movie, ScoredRecord, VectorStore, MOVIE_COLLECTION,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn movie_strategy() -> impl Strategy<Value = Vec<Movie>> {
    proptest::collection::vec(("[a-z]{1,8}( [a-z]{1,8}){0,4}", 1990i32..2024), 0..40).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (text, year))| Movie {
                    title: format!("Movie {}", i),
                    overview: text,
                    vote_average: 5.0,
                    genre_ids: vec![],
                    release_date: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
                    tmdb_id: i as i64,
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn test_ensure_collection_twice_is_one(batch in 1usize..10) {
        runtime().block_on(async {
            let gw = Gateway::new(MemoryStore::new()).with_batch_size(batch);
            let first = gw.ensure_collection(&movie_descriptor()).await.unwrap();
            let second = gw.ensure_collection(&movie_descriptor()).await.unwrap();
            prop_assert!(first);
            prop_assert!(!second);
            prop_assert!(gw.store().collection_exists(MOVIE_COLLECTION).await.unwrap());
            Ok(())
        })?;
    }

    #[test]
    fn test_import_twice_equals_once(movies in movie_strategy(), batch in 1usize..16) {
        runtime().block_on(async {
            let gw = Gateway::new(MemoryStore::new()).with_batch_size(batch);
            gw.ensure_collection(&movie_descriptor()).await.unwrap();

            let first = gw.import_if_empty(MOVIE_COLLECTION, &movies).await.unwrap();
            let after_once = gw.count(MOVIE_COLLECTION).await.unwrap();
            prop_assert_eq!(first.inserted, movies.len());
            prop_assert_eq!(after_once, movies.len() as u64);

            let second = gw.import_if_empty(MOVIE_COLLECTION, &movies).await.unwrap();
            let after_twice = gw.count(MOVIE_COLLECTION).await.unwrap();
            prop_assert_eq!(after_twice, after_once);
            if !movies.is_empty() {
                prop_assert_eq!(second.inserted, 0);
                prop_assert!(second.skipped());
            }
            Ok(())
        })?;
    }

    #[test]
    fn test_search_bounded_and_sorted(
        movies in movie_strategy(),
        query in "[a-z]{0,8}( [a-z]{1,8}){0,3}",
        limit in 0usize..12,
    ) {
        runtime().block_on(async {
            let gw = Gateway::new(MemoryStore::new());
            gw.ensure_collection(&movie_descriptor()).await.unwrap();
            gw.import_if_empty(MOVIE_COLLECTION, &movies).await.unwrap();

            let results: Vec<ScoredRecord<Movie>> =
                gw.search(MOVIE_COLLECTION, &query, limit).await.unwrap();
            prop_assert!(results.len() <= limit);
            prop_assert!(results.len() <= movies.len());
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            Ok(())
        })?;
    }
}
