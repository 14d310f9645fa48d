//! Search ranking, recency bumps and combined metadata queries

use crate::common::*;

fn library() -> DocumentStore<MemoryPersistence> {
    let (mut store, _disk) = store();
    let docs = [
        ("doc://rust", "rust is fast; rust is safe; rust", "lang", "en"),
        ("doc://go", "go is simple and rust is not go", "lang", "en"),
        ("doc://fr", "le rust est rapide", "lang", "fr"),
        ("doc://img", "", "kind", "image"),
    ];
    for (name, text, field, value) in docs {
        let k = key(name);
        if text.is_empty() {
            store.put_binary(&k, vec![0x89, b'P', b'N', b'G']).unwrap();
        } else {
            store.put_text(&k, text).unwrap();
        }
        store.set_metadata(&k, field, value).unwrap();
    }
    store
}

#[test]
fn test_keyword_ranking_descending() {
    let mut store = library();
    let hits = store.search("Rust").unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://rust", "doc://fr", "doc://go"]);
}

#[test]
fn test_prefix_ranking_ascending() {
    let mut store = library();
    // rust occurs once in fr and go, three times in rust
    let hits = store.search_by_prefix("ru").unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://fr", "doc://go", "doc://rust"]);
}

#[test]
fn test_binary_documents_only_match_metadata() {
    let mut store = library();
    assert!(store.search("png").unwrap().is_empty());
    let hits = store.search_by_metadata(&filter(&[("kind", "image")])).unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://img"]);
}

#[test]
fn test_metadata_filter_requires_every_field() {
    let mut store = library();
    store.set_metadata(&key("doc://go"), "level", "beginner").unwrap();
    let hits = store
        .search_by_metadata(&filter(&[("lang", "en"), ("level", "beginner")]))
        .unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://go"]);
    assert!(store
        .search_by_metadata(&filter(&[("lang", "EN")]))
        .unwrap()
        .is_empty());
}

#[test]
fn test_combined_keyword_and_metadata() {
    let mut store = library();
    let hits = store
        .search_by_keyword_and_metadata("rust", &filter(&[("lang", "en")]))
        .unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://rust", "doc://go"]);

    let hits = store
        .search_by_prefix_and_metadata("ra", &filter(&[("lang", "fr")]))
        .unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://fr"]);
}

#[test]
fn test_search_over_spilled_documents() {
    let mut store = library();
    store.set_max_document_count(1).unwrap();
    assert_eq!(store.document_count(), 1);

    let hits = store.search("rust").unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(store.document_count(), 1);
    assert_consistent(&store);

    let en = store.search_by_metadata(&filter(&[("lang", "en")])).unwrap();
    assert_eq!(en.len(), 2);
    assert_eq!(store.document_count(), 1);
    assert_consistent(&store);
}

#[test]
fn test_search_is_a_touch() {
    let mut store = library();
    store.search("rapide").unwrap();
    store.set_max_document_count(1).unwrap();
    assert_eq!(store.resident_keys(), vec![key("doc://fr")]);
}

#[test]
fn test_delete_all_with_metadata_then_undo() {
    let mut store = library();
    let deleted = store.delete_all_with_metadata(&filter(&[("lang", "en")])).unwrap();
    assert_eq!(deleted.len(), 2);
    assert!(store.search("go").unwrap().is_empty());

    store.undo().unwrap();
    assert_eq!(store.search("go").unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_invalid_queries() {
    let mut store = library();
    assert!(matches!(store.search(""), Err(StoreError::InvalidArgument { .. })));
    assert!(matches!(
        store.delete_all_with_prefix("  "),
        Err(StoreError::InvalidArgument { .. })
    ));
    assert!(matches!(
        store.search_by_keyword_and_metadata("rust", &MetadataFilter::new()),
        Err(StoreError::InvalidArgument { .. })
    ));
    assert!(matches!(
        store.delete_all_with_metadata(&filter(&[(" ", "x")])),
        Err(StoreError::InvalidArgument { .. })
    ));
}
