mod support;

use std::sync::atomic::Ordering;

use citadel::application::characters::CharacterFilter;
use citadel::cache::{CHARACTERS_PREFIX, CacheStore, character_query_key};
use citadel::domain::characters::{CharacterUpdate, FieldPatch, NewCharacter};
use citadel::domain::entities::OriginRecord;
use support::{Harness, QUERY_TTL, character};

fn rick_filter() -> CharacterFilter {
    CharacterFilter {
        name: Some("Rick".to_string()),
        limit: Some(20),
        offset: Some(0),
        ..Default::default()
    }
}

fn seeded() -> Harness {
    Harness::new([
        character(1, "Rick Sanchez"),
        character(2, "Morty Smith"),
        character(3, "Evil Rick"),
    ])
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let harness = seeded();

    let first = harness.service.search(&rick_filter()).await.unwrap();
    let second = harness.service.search(&rick_filter()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![1, 3]
    );
    assert_eq!(harness.characters.queries().len(), 1);

    let sets = harness.cache.sets();
    assert_eq!(sets.len(), 1);
    assert!(sets[0].0.starts_with(CHARACTERS_PREFIX));
    assert_eq!(sets[0].1, QUERY_TTL);
}

#[tokio::test]
async fn miss_reaches_store_with_substring_pattern() {
    let harness = seeded();

    harness.service.search(&rick_filter()).await.unwrap();

    let queries = harness.characters.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].predicates.len(), 1);
    assert_eq!(queries[0].predicates[0].column.as_str(), "name");
    assert_eq!(queries[0].predicates[0].pattern, "%Rick%");
    assert_eq!(queries[0].limit, 20);
}

#[tokio::test]
async fn empty_result_is_cached_too() {
    let harness = seeded();
    let filter = CharacterFilter {
        name: Some("Birdperson".to_string()),
        ..Default::default()
    };

    assert!(harness.service.search(&filter).await.unwrap().is_empty());
    assert!(harness.service.search(&filter).await.unwrap().is_empty());
    assert_eq!(harness.characters.queries().len(), 1);
}

#[tokio::test]
async fn unreadable_cache_falls_back_to_store() {
    let harness = seeded();
    harness.cache.fail_get.store(true, Ordering::SeqCst);

    let records = harness.service.search(&rick_filter()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(harness.characters.queries().len(), 1);
}

#[tokio::test]
async fn failed_cache_write_still_returns_results() {
    let harness = seeded();
    harness.cache.fail_set.store(true, Ordering::SeqCst);

    let records = harness.service.search(&rick_filter()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(harness.cache.sets().len(), 1);
    assert_eq!(harness.cache.len(), 0);
}

#[tokio::test]
async fn corrupt_cached_payload_is_treated_as_miss() {
    let harness = seeded();
    let key = character_query_key(&rick_filter()).unwrap();
    harness.cache.put_raw(&key, "not json").await;

    let records = harness.service.search(&rick_filter()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(harness.characters.queries().len(), 1);
}

#[tokio::test]
async fn store_failure_propagates() {
    let harness = seeded();
    harness.characters.set_failing(true);

    assert!(harness.service.search(&rick_filter()).await.is_err());
    assert!(harness.cache.sets().is_empty());
}

#[tokio::test]
async fn create_invalidates_cached_queries() {
    let harness = seeded();
    harness.service.search(&rick_filter()).await.unwrap();
    assert_eq!(harness.cache.len(), 1);

    let created = harness
        .service
        .create(NewCharacter {
            name: "Rick Prime".to_string(),
            origin: Some("Earth (C-137)".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.origin.as_deref(), Some("Earth (C-137)"));
    assert!(created.origin_id.is_some());
    assert_eq!(harness.cache.deleted_prefixes(), vec![CHARACTERS_PREFIX]);
    assert_eq!(harness.cache.len(), 0);

    let records = harness.service.search(&rick_filter()).await.unwrap();
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn update_of_missing_character_leaves_cache_alone() {
    let harness = seeded();

    let updated = harness
        .service
        .update(
            99,
            CharacterUpdate {
                status: FieldPatch::Set("Dead".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.is_none());
    assert!(harness.cache.deleted_prefixes().is_empty());
}

#[tokio::test]
async fn update_invalidates_and_resolves_origin() {
    let harness = Harness::with_origins(
        [character(1, "Rick Sanchez")],
        vec![OriginRecord {
            id: 7,
            name: "Citadel of Ricks".to_string(),
        }],
    );

    let updated = harness
        .service
        .update(
            1,
            CharacterUpdate {
                origin: FieldPatch::Set("Citadel of Ricks".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("character exists");

    assert_eq!(updated.origin.as_deref(), Some("Citadel of Ricks"));
    assert_eq!(updated.origin_id, Some(7));
    assert_eq!(harness.origins.lookups(), 1);
    assert_eq!(harness.cache.deleted_prefixes(), vec![CHARACTERS_PREFIX]);
}

#[tokio::test]
async fn update_creates_missing_origin() {
    let harness = Harness::new([character(5, "Squanchy")]);
    assert!(harness.origins.origins().is_empty());

    let updated = harness
        .service
        .update(
            5,
            CharacterUpdate {
                origin: FieldPatch::Set("Earth".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("character exists");

    let origins = harness.origins.origins();
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0].name, "Earth");
    assert_eq!(updated.origin.as_deref(), Some("Earth"));
    assert_eq!(updated.origin_id, Some(origins[0].id));
    assert_eq!(harness.characters.row(5).unwrap().origin_id, Some(origins[0].id));
    assert_eq!(harness.cache.deleted_prefixes(), vec![CHARACTERS_PREFIX]);
}

#[tokio::test]
async fn clearing_origin_drops_name_and_reference() {
    let mut rick = character(1, "Rick Sanchez");
    rick.origin = Some("Earth (C-137)".to_string());
    rick.origin_id = Some(3);
    let harness = Harness::new([rick]);

    let updated = harness
        .service
        .update(
            1,
            CharacterUpdate {
                origin: FieldPatch::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("character exists");

    assert_eq!(updated.origin, None);
    assert_eq!(updated.origin_id, None);
    assert_eq!(harness.origins.lookups(), 0);
}

#[tokio::test]
async fn remove_invalidates_only_when_a_row_was_deleted() {
    let harness = seeded();

    assert!(!harness.service.remove(42).await.unwrap());
    assert!(harness.cache.deleted_prefixes().is_empty());

    assert!(harness.service.remove(2).await.unwrap());
    assert_eq!(harness.cache.deleted_prefixes(), vec![CHARACTERS_PREFIX]);
    assert!(harness.characters.row(2).is_none());
}

#[tokio::test]
async fn failed_invalidation_does_not_fail_the_write() {
    let harness = seeded();
    harness.cache.fail_delete.store(true, Ordering::SeqCst);

    assert!(harness.service.remove(1).await.unwrap());
}

#[tokio::test]
async fn get_by_id_bypasses_cache() {
    let harness = seeded();

    let found = harness.service.get_by_id(2).await.unwrap();

    assert_eq!(found.map(|c| c.name), Some("Morty Smith".to_string()));
    assert_eq!(harness.cache.gets(), 0);
    assert!(harness.service.get_by_id(404).await.unwrap().is_none());
}

#[tokio::test]
async fn invalidation_ignores_unrelated_keys() {
    let harness = seeded();
    harness.cache.put_raw("episodes:{}", "[]").await;
    harness.service.search(&rick_filter()).await.unwrap();

    harness.service.remove(3).await.unwrap();

    assert_eq!(harness.cache.len(), 1);
    assert_eq!(
        harness.cache.get("episodes:{}").await.unwrap().as_deref(),
        Some("[]")
    );
}
