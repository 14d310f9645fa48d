//! Limit enforcement and least-recently-used ordering

use crate::common::*;
use docstore::{Persistence, StoreResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_recency_ordering_spills_least_recent() {
    let (mut store, disk) = store();
    let (a, b, c) = (key("A"), key("B"), key("C"));
    store.put_text(&a, "one").unwrap();
    store.put_text(&b, "two").unwrap();
    store.put_text(&c, "three").unwrap();
    store.get(&a).unwrap();

    store.set_max_document_count(2).unwrap();
    assert!(!store.is_resident(&b));
    assert!(disk.contains(&b));
    assert!(store.is_resident(&a));
    assert!(store.is_resident(&c));
    assert_eq!(store.document_count(), 2);
    assert_consistent(&store);
}

#[test]
fn test_put_beyond_limit_spills_oldest() {
    let (mut store, _disk) = store();
    store.set_max_document_count(2).unwrap();
    for name in ["doc://1", "doc://2", "doc://3", "doc://4"] {
        store.put_text(&key(name), name).unwrap();
    }
    assert_eq!(store.resident_keys(), vec![key("doc://3"), key("doc://4")]);
    assert_eq!(store.keys().len(), 4);
    assert_consistent(&store);
}

#[test]
fn test_byte_limit() {
    let (mut store, _disk) = store();
    store.set_max_document_bytes(10).unwrap();
    store.put_text(&key("doc://a"), "12345").unwrap();
    store.put_text(&key("doc://b"), "12345").unwrap();
    assert_eq!(store.document_bytes(), 10);

    store.put_text(&key("doc://c"), "1").unwrap();
    assert!(!store.is_resident(&key("doc://a")));
    assert_eq!(store.document_bytes(), 6);
    assert_consistent(&store);
}

#[test]
fn test_reload_respects_limit() {
    let (mut store, _disk) = store();
    store.set_max_document_count(1).unwrap();
    store.put_text(&key("doc://a"), "alpha").unwrap();
    store.put_text(&key("doc://b"), "beta").unwrap();
    assert_eq!(store.resident_keys(), vec![key("doc://b")]);

    assert!(store.get(&key("doc://a")).unwrap().is_some());
    assert_eq!(store.resident_keys(), vec![key("doc://a")]);
    assert_eq!(store.document_count(), 1);
    assert_consistent(&store);
}

#[test]
fn test_zero_means_unbounded() {
    let (mut store, disk) = store();
    store.set_max_document_count(1).unwrap();
    store.set_max_document_count(0).unwrap();
    for i in 0..50 {
        store.put_text(&key(&format!("doc://{}", i)), "words").unwrap();
    }
    assert_eq!(store.document_count(), 50);
    assert!(disk.is_empty());
}

#[test]
fn test_limits_report_current_values() {
    let (mut store, _disk) = store();
    store.set_max_document_count(3).unwrap();
    store.set_max_document_bytes(99).unwrap();
    assert_eq!(
        store.limits(),
        StoreLimits {
            max_document_count: 3,
            max_document_bytes: 99,
        }
    );
}

/// Memory persistence that remembers the fewest documents it ever held, so a
/// test can bound how many were resident at once.
#[derive(Debug, Clone)]
struct LowWaterMark {
    disk: MemoryPersistence,
    low: Arc<AtomicUsize>,
}

impl LowWaterMark {
    fn new(disk: MemoryPersistence) -> Self {
        LowWaterMark {
            disk,
            low: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    fn reset(&self) {
        self.low.store(self.disk.len(), Ordering::SeqCst);
    }

    fn low(&self) -> usize {
        self.low.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.low.fetch_min(self.disk.len(), Ordering::SeqCst);
    }
}

impl Persistence for LowWaterMark {
    fn serialize(&mut self, key: &DocumentKey, document: &Document) -> StoreResult<()> {
        let result = self.disk.serialize(key, document);
        self.record();
        result
    }

    fn deserialize(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        self.disk.deserialize(key)
    }

    fn delete(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        let result = self.disk.delete(key);
        self.record();
        result
    }
}

fn all_spilled(total: usize) -> (DocumentStore<LowWaterMark>, LowWaterMark) {
    init_tracing();
    let watch = LowWaterMark::new(MemoryPersistence::new());
    let mut store = DocumentStore::with_persistence(watch.clone());
    for i in 0..total {
        let k = key(&format!("doc://many/{:03}", i));
        store.put_text(&k, "word after word").unwrap();
        store.set_metadata(&k, "shelf", "top").unwrap();
    }
    store.set_max_document_count(1).unwrap();
    for k in store.keys() {
        store.move_to_disk(&k).unwrap();
    }
    assert_eq!(store.document_count(), 0);
    watch.reset();
    (store, watch)
}

#[test]
fn test_search_reloads_stay_within_count_limit() {
    const TOTAL: usize = 40;
    let (mut store, watch) = all_spilled(TOTAL);

    let hits = store.search("word").unwrap();
    assert_eq!(hits.len(), TOTAL);
    // At most the limit plus the document being reloaded.
    assert!(
        TOTAL - watch.low() <= 2,
        "{} documents resident at once",
        TOTAL - watch.low()
    );
    assert_eq!(store.document_count(), 1);
    assert_consistent(&store);

    watch.reset();
    let hits = store
        .search_by_prefix_and_metadata("wo", &filter(&[("shelf", "top")]))
        .unwrap();
    assert_eq!(hits.len(), TOTAL);
    assert!(TOTAL - watch.low() <= 2);
    assert!(hits.iter().all(|doc| doc.text_content() == Some("word after word")));
    assert_consistent(&store);
}

#[test]
fn test_filtered_delete_reloads_stay_within_count_limit() {
    const TOTAL: usize = 40;
    let (mut store, watch) = all_spilled(TOTAL);

    // Every candidate is reloaded to check the filter, none matches.
    let deleted = store
        .delete_all_with_keyword_and_metadata("after", &filter(&[("shelf", "bottom")]))
        .unwrap();
    assert!(deleted.is_empty());
    assert!(TOTAL - watch.low() <= 2);
    assert_eq!(store.document_count(), 1);
    assert_eq!(store.keys().len(), TOTAL);
    assert_consistent(&store);
}

#[test]
fn test_search_returns_hits_larger_than_byte_limit() {
    let (mut store, _disk) = store();
    let big = key("doc://big");
    store.put_text(&big, "enormous enormous enormous").unwrap();
    store.set_max_document_bytes(4).unwrap();
    assert!(!store.is_resident(&big));

    let hits = store.search("enormous").unwrap();
    assert_eq!(keys_of(&hits), vec!["doc://big"]);
    assert!(!store.is_resident(&big));
    assert_consistent(&store);
}
