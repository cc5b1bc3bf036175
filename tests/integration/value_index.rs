#![allow(missing_docs)]

use valindex::index::{
    BalancedTree, Direction, IndexKind, LookupCache, NodeStore, QueryDescriptor, ValueIndex,
    ValueIndexes,
};
use valindex::{DuplicatePolicy, IndexError, IndexOptions, Payload, Result};

fn keys_of(index: &ValueIndex, descriptor: QueryDescriptor) -> Vec<String> {
    index
        .scan(descriptor)
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
        .collect()
}

#[test]
fn bulk_insert_then_lookup_every_token() -> Result<()> {
    let mut index = ValueIndex::new(&IndexOptions::default())?;
    for i in 0..4000u32 {
        index.insert(format!("keyAdd{i}").as_bytes(), i, u64::from(i) + 5000)?;
    }
    for i in 0..4000u32 {
        assert_eq!(
            index.lookup(format!("keyAdd{i}").as_bytes()),
            Some(Payload::new(i, u64::from(i) + 5000))
        );
    }
    index.tree().validate()?;
    // default capacity is smaller than the token count
    let stats = index.stats();
    assert_eq!(stats.entries, 4000);
    assert_eq!(stats.cached, 1024);
    assert_eq!(stats.cache.evictions, 4000 - 1024);
    Ok(())
}

#[test]
fn cache_update_keeps_latest_payload() {
    let mut cache = LookupCache::with_options(&IndexOptions::default()).expect("cache");
    cache.add(b"keyUpdate", 9, 11);
    cache.add(b"keyUpdate", 10, 12);
    assert_eq!(cache.get(b"keyUpdate"), Some(Payload::new(10, 12)));
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_delete_forgets_entry() {
    let mut cache = LookupCache::with_options(&IndexOptions::default()).expect("cache");
    cache.add(b"keyDelete", 10, 12);
    cache.delete(b"keyDelete");
    assert_eq!(cache.get(b"keyDelete"), None);
}

#[test]
fn prefix_scan_excludes_neighbouring_tokens() -> Result<()> {
    let mut index = ValueIndex::new(&IndexOptions::default())?;
    for (i, token) in ["ab", "abc", "abd", "b"].iter().enumerate() {
        index.insert(token.as_bytes(), 1, i as u64)?;
    }
    assert_eq!(
        keys_of(&index, QueryDescriptor::prefix("ab")),
        vec!["ab", "abc", "abd"]
    );
    Ok(())
}

#[test]
fn range_scans_follow_direction() -> Result<()> {
    let mut index = ValueIndex::new(&IndexOptions::default())?;
    for token in ["2019", "2020", "2021", "2022", "2023"] {
        index.insert(token.as_bytes(), 1, 0)?;
    }
    assert_eq!(
        keys_of(&index, QueryDescriptor::range("2021", Direction::Ascending)),
        vec!["2021", "2022", "2023"]
    );
    assert_eq!(
        keys_of(&index, QueryDescriptor::range("2021x", Direction::Descending)),
        vec!["2021", "2020", "2019"]
    );
    Ok(())
}

#[test]
fn session_flow_probes_cache_before_tree() -> Result<()> {
    let options = IndexOptions::new().with_cache_capacity(2);
    let mut index = ValueIndex::new(&options)?;
    index.insert(b"hot", 3, 30)?;
    index.insert(b"cold", 1, 10)?;

    for _ in 0..5 {
        assert_eq!(index.lookup(b"hot"), Some(Payload::new(3, 30)));
    }
    let stats = index.cache_mut().take_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);

    // a stale entry removed by the caller is reloaded from the tree
    index.cache_mut().delete(b"hot");
    assert_eq!(index.lookup(b"hot"), Some(Payload::new(3, 30)));
    assert_eq!(index.cache().stats().misses, 1);
    Ok(())
}

#[test]
fn registry_routes_by_kind() -> Result<()> {
    let mut indexes = ValueIndexes::new(&IndexOptions::default())?;
    indexes
        .get_mut(IndexKind::Attribute)
        .insert_token(b"en-US", 4, 400)?;
    assert_eq!(indexes.get_mut(IndexKind::Text).lookup_token(b"en-US"), None);
    assert_eq!(
        indexes.get_mut(IndexKind::Attribute).lookup_token(b"en-US"),
        Some(Payload::new(4, 400))
    );
    let hits = indexes
        .get(IndexKind::Attribute)
        .scan_tokens(QueryDescriptor::prefix("en"))
        .count();
    assert_eq!(hits, 1);
    Ok(())
}

#[test]
fn zero_capacity_is_a_config_error() {
    let options = IndexOptions::new().with_cache_capacity(0);
    assert!(matches!(ValueIndex::new(&options), Err(IndexError::Config(_))));
    assert!(matches!(ValueIndexes::new(&options), Err(IndexError::Config(_))));
}

#[test]
fn reloaded_arena_keeps_answering_queries() -> Result<()> {
    let mut tree = BalancedTree::new();
    for token in ["pear", "apple", "fig", "kiwi", "plum", "date"] {
        tree.insert(token.as_bytes(), token.len() as u32, 7)?;
    }
    let json = serde_json::to_vec(tree.store()).expect("serialize");
    let store: NodeStore = serde_json::from_slice(&json).expect("deserialize");
    let reloaded = BalancedTree::from_store(store, DuplicatePolicy::Reject)?;

    let mut index = ValueIndex::from_tree(reloaded, &IndexOptions::default())?;
    assert_eq!(index.lookup(b"kiwi"), Some(Payload::new(4, 7)));
    assert!(matches!(
        index.insert(b"kiwi", 1, 1),
        Err(IndexError::DuplicateKey)
    ));
    index.insert(b"banana", 6, 8)?;
    assert_eq!(
        keys_of(&index, QueryDescriptor::ascending_from("")),
        vec!["apple", "banana", "date", "fig", "kiwi", "pear", "plum"]
    );
    index.tree().validate()
}
