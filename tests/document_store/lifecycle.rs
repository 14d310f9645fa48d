//! Put/get/delete across the absent, resident and spilled states

use crate::common::*;

#[test]
fn test_sample_scenario() {
    let (mut store, disk) = store();
    let u1 = key("u1");
    store.put_text(&u1, "the cat sat on the mat").unwrap();

    assert_eq!(keys_of(&store.search("cat").unwrap()), vec!["u1"]);
    assert_eq!(keys_of(&store.search_by_prefix("ma").unwrap()), vec!["u1"]);

    store.set_max_document_bytes(1).unwrap();
    assert!(!store.is_resident(&u1));
    assert!(disk.contains(&u1));

    assert_eq!(
        text_of(&mut store, &u1).as_deref(),
        Some("the cat sat on the mat")
    );
    assert_consistent(&store);
}

#[test]
fn test_round_trip_across_spill() {
    let (mut store, _disk) = store();
    let text_key = key("doc://text");
    let bin_key = key("doc://bin");
    store.put_text(&text_key, "alpha beta").unwrap();
    store.put_binary(&bin_key, vec![0, 1, 2, 254, 255]).unwrap();
    store.set_metadata(&text_key, "author", "ann").unwrap();

    store.move_to_disk(&text_key).unwrap();
    store.move_to_disk(&bin_key).unwrap();
    assert_eq!(store.document_count(), 0);
    assert_eq!(store.document_bytes(), 0);

    let text = store.get(&text_key).unwrap().unwrap();
    assert_eq!(text.text_content(), Some("alpha beta"));
    assert_eq!(text.metadata_value("author"), Some("ann"));
    assert_eq!(text.word_count("beta"), 1);

    let bin = store.get(&bin_key).unwrap().unwrap();
    assert_eq!(bin.binary_content(), Some(&[0u8, 1, 2, 254, 255][..]));
    assert_eq!(store.document_count(), 2);
    assert_consistent(&store);
}

#[test]
fn test_put_over_spilled_replaces_and_unindexes() {
    let (mut store, disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "old words").unwrap();
    store.move_to_disk(&k).unwrap();

    let previous = store.put_text(&k, "new words").unwrap();
    assert!(previous.is_some());
    assert!(!disk.contains(&k));
    assert!(store.search("old").unwrap().is_empty());
    assert_eq!(store.search("new").unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_idempotent_delete_of_never_inserted_key() {
    let (mut store, disk) = store();
    store.put_text(&key("doc://a"), "resident words").unwrap();
    store.put_text(&key("doc://b"), "spilled words").unwrap();
    store.move_to_disk(&key("doc://b")).unwrap();
    let (count, bytes, depth) = (store.document_count(), store.document_bytes(), store.undo_depth());
    let deletes_before = disk.delete_calls();

    let k = key("doc://never");
    assert!(!store.delete(&k).unwrap());
    assert!(!store.delete(&k).unwrap());

    assert_eq!(disk.delete_calls(), deletes_before + 2);
    assert_eq!(store.document_count(), count);
    assert_eq!(store.document_bytes(), bytes);
    assert_eq!(store.undo_depth(), depth);
    assert_eq!(store.keys().len(), 2);
    assert!(disk.contains(&key("doc://b")));
    assert_consistent(&store);
}

#[test]
fn test_delete_spilled_document() {
    let (mut store, disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "spill then delete").unwrap();
    store.move_to_disk(&k).unwrap();

    assert!(store.delete(&k).unwrap());
    assert!(!store.contains(&k));
    assert!(disk.is_empty());
    assert!(store.search("spill").unwrap().is_empty());
    assert!(store.get(&k).unwrap().is_none());
    assert_consistent(&store);
}

#[test]
fn test_blank_key_rejected() {
    assert!(matches!(
        DocumentKey::new("   "),
        Err(StoreError::InvalidArgument { .. })
    ));
}

#[test]
fn test_metadata_on_spilled_document_reloads_it() {
    let (mut store, _disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "body").unwrap();
    store.move_to_disk(&k).unwrap();

    store.set_metadata(&k, "status", "draft").unwrap();
    assert!(store.is_resident(&k));
    assert_eq!(store.get_metadata(&k, "status").unwrap().as_deref(), Some("draft"));
    assert_consistent(&store);
}
