//! One lock around the whole store

use crate::common::*;
use std::sync::Barrier;
use std::sync::Arc;
use std::thread;

#[test]
fn test_shared_store_under_contention() {
    init_tracing();
    let mut inner = DocumentStore::ephemeral();
    inner.set_max_document_count(8).unwrap();
    let shared = SharedDocumentStore::new(inner);
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..20 {
                    let k = key(&format!("doc://w{}/{}", t, i));
                    shared.with(|store| {
                        store.put_text(&k, &format!("worker{} item {}", t, i)).unwrap();
                        store.search("item").unwrap();
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut store = shared.lock();
    assert_eq!(store.keys().len(), 80);
    assert!(store.document_count() <= 8);
    assert_eq!(store.search("worker2").unwrap().len(), 20);
    assert_consistent(&*store);
}
