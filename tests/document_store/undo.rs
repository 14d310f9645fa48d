//! Undo of single mutations, batches and targeted keys

use crate::common::*;

#[test]
fn test_undo_put_over_put_restores_previous() {
    let (mut store, _disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "first version").unwrap();
    store.put_text(&k, "second version").unwrap();

    store.undo().unwrap();
    assert_eq!(text_of(&mut store, &k).as_deref(), Some("first version"));
    assert!(store.search("second").unwrap().is_empty());
    assert_eq!(store.search("first").unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_undo_delete_restores_document_and_index() {
    let (mut store, _disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "restore me").unwrap();
    store.set_metadata(&k, "tag", "keep").unwrap();
    store.delete(&k).unwrap();
    assert!(store.search("restore").unwrap().is_empty());

    store.undo().unwrap();
    let doc = store.get(&k).unwrap().unwrap();
    assert_eq!(doc.text_content(), Some("restore me"));
    assert_eq!(doc.metadata_value("tag"), Some("keep"));
    assert_eq!(store.search("restore").unwrap().len(), 1);
    assert_eq!(store.search_by_metadata(&filter(&[("tag", "keep")])).unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_undo_of_spilled_put_over_put() {
    let (mut store, disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "one").unwrap();
    store.put_text(&k, "two").unwrap();
    store.move_to_disk(&k).unwrap();

    store.undo().unwrap();
    assert!(!disk.contains(&k));
    assert_eq!(text_of(&mut store, &k).as_deref(), Some("one"));
    assert_consistent(&store);
}

#[test]
fn test_nothing_to_undo() {
    let (mut store, _disk) = store();
    assert!(matches!(store.undo(), Err(StoreError::NothingToUndo)));
    assert!(matches!(
        store.undo_for(&key("doc://a")),
        Err(StoreError::NothingToUndo)
    ));
}

#[test]
fn test_targeted_undo_preserves_other_commands() {
    let (mut store, _disk) = store();
    let (a, b, c) = (key("doc://a"), key("doc://b"), key("doc://c"));
    store.put_text(&a, "a1").unwrap();
    store.put_text(&b, "b1").unwrap();
    store.put_text(&a, "a2").unwrap();
    store.put_text(&c, "c1").unwrap();

    store.undo_for(&b).unwrap();
    assert!(!store.contains(&b));
    assert_eq!(store.undo_depth(), 3);

    // remaining order, newest first: put c, put a2, put a1
    store.undo().unwrap();
    assert!(!store.contains(&c));
    store.undo().unwrap();
    assert_eq!(text_of(&mut store, &a).as_deref(), Some("a1"));
    store.undo().unwrap();
    assert!(!store.contains(&a));
    assert_consistent(&store);
}

#[test]
fn test_targeted_undo_picks_most_recent_for_key() {
    let (mut store, _disk) = store();
    let (a, b) = (key("doc://a"), key("doc://b"));
    store.put_text(&a, "a1").unwrap();
    store.put_text(&a, "a2").unwrap();
    store.put_text(&b, "b1").unwrap();

    store.undo_for(&a).unwrap();
    assert_eq!(text_of(&mut store, &a).as_deref(), Some("a1"));
    assert!(store.contains(&b));
}

#[test]
fn test_targeted_undo_unknown_key() {
    let (mut store, _disk) = store();
    store.put_text(&key("doc://a"), "a").unwrap();
    assert!(matches!(
        store.undo_for(&key("doc://zzz")),
        Err(StoreError::NoUndoForKey { .. })
    ));
    assert_eq!(store.undo_depth(), 1);
}

#[test]
fn test_batch_undo_of_delete_all_with_prefix() {
    let (mut store, _disk) = store();
    store.put_text(&key("doc://1"), "matter of fact").unwrap();
    store.put_text(&key("doc://2"), "mature cheese").unwrap();
    store.put_text(&key("doc://3"), "cheddar").unwrap();
    store.move_to_disk(&key("doc://2")).unwrap();

    let deleted = store.delete_all_with_prefix("mat").unwrap();
    assert_eq!(deleted.len(), 2);
    assert_eq!(store.keys(), vec![key("doc://3")]);

    store.undo().unwrap();
    assert_eq!(store.keys().len(), 3);
    assert_eq!(store.search_by_prefix("mat").unwrap().len(), 2);
    assert_eq!(store.search("cheese").unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_targeted_undo_inside_batch() {
    let (mut store, _disk) = store();
    store.put_text(&key("doc://1"), "shared").unwrap();
    store.put_text(&key("doc://2"), "shared").unwrap();
    store.put_text(&key("doc://3"), "other").unwrap();
    store.delete_all("shared").unwrap();

    store.undo_for(&key("doc://1")).unwrap();
    assert!(store.contains(&key("doc://1")));
    assert!(!store.contains(&key("doc://2")));

    // the rest of the batch is still undoable as one unit
    store.undo().unwrap();
    assert!(store.contains(&key("doc://2")));
    assert_eq!(store.undo_depth(), 3);
    assert_consistent(&store);
}

#[test]
fn test_undo_metadata_after_spill() {
    let (mut store, _disk) = store();
    let k = key("doc://a");
    store.put_text(&k, "body").unwrap();
    store.set_metadata(&k, "state", "new").unwrap();
    store.set_metadata(&k, "state", "done").unwrap();
    store.move_to_disk(&k).unwrap();

    store.undo_for(&k).unwrap();
    assert!(store.is_resident(&k));
    assert_eq!(store.get_metadata(&k, "state").unwrap().as_deref(), Some("new"));
    assert!(store.search("state:done").unwrap().is_empty());
    assert_eq!(store.search("state:new").unwrap().len(), 1);
    assert_consistent(&store);
}

#[test]
fn test_targeted_undo_walks_back_through_delete() {
    let (mut store, _disk) = store();
    let (a, b) = (key("doc://a"), key("doc://b"));
    store.put_text(&a, "body").unwrap();
    store.set_metadata(&a, "state", "new").unwrap();
    store.put_text(&b, "other").unwrap();
    store.delete(&a).unwrap();
    let depth = store.undo_depth();

    // undoing the delete first restores a; metadata undo then works
    store.undo_for(&a).unwrap();
    assert_eq!(store.undo_depth(), depth - 1);
    store.undo_for(&a).unwrap();
    assert_eq!(store.get_metadata(&a, "state").unwrap(), None);
}
