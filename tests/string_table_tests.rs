use binform::{InternTable, StringTable};
use std::sync::Arc;
use std::thread;

#[test]
fn test_registration_and_lookup() {
    let table = InternTable::new();
    let id = table.get_index("Test string");
    assert_eq!(table.get_str(id).as_deref(), Some("Test string"));
}

#[test]
fn test_duplicate_registration() {
    let table = InternTable::new();
    let id1 = table.get_index("Duplicate string");
    let id2 = table.get_index("Duplicate string");
    assert_eq!(id1, id2, "same string should get same index");
    assert_eq!(table.len(), 1);
}

#[test]
fn test_multiple_strings() {
    let table = InternTable::new();
    let strings = ["First", "Second", "Third"];
    let ids: Vec<u32> = strings.iter().map(|s| table.get_index(s)).collect();

    for i in 0..ids.len() {
        for j in i + 1..ids.len() {
            assert_ne!(ids[i], ids[j], "different strings should get different indices");
        }
    }
    for (s, id) in strings.iter().zip(&ids) {
        assert_eq!(table.get_str(*id).as_deref(), Some(*s));
    }
}

#[test]
fn test_indices_are_dense_from_zero() {
    let table = InternTable::new();
    assert_eq!(table.get_index("a"), 0);
    assert_eq!(table.get_index("b"), 1);
    assert_eq!(table.get_index("a"), 0);
}

#[test]
fn test_invalid_index() {
    let table = InternTable::new();
    table.get_index("present");
    assert!(table.get_str(u32::MAX).is_none());
    assert!(table.get_str(1).is_none());
}

#[test]
fn test_unicode_strings() {
    let table = InternTable::new();
    let s = "Hello, 世界! 🌍";
    let id = table.get_index(s);
    assert_eq!(table.get_str(id).as_deref(), Some(s));
}

#[test]
fn test_concurrent_interning() {
    let table = Arc::new(InternTable::new());
    let mut handles = Vec::new();
    for t in 0..4 {
        let table = table.clone();
        handles.push(thread::spawn(move || {
            let mut ids = Vec::new();
            for i in 0..50 {
                // Half shared across threads, half thread-unique.
                let s = if i % 2 == 0 {
                    format!("shared-{i}")
                } else {
                    format!("thread-{t}-{i}")
                };
                ids.push((s.clone(), table.get_index(&s)));
            }
            ids
        }));
    }

    let all: Vec<(String, u32)> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    // Every recorded id must still resolve to its string, and equal strings
    // must have received equal ids across threads.
    for (s, id) in &all {
        assert_eq!(table.get_str(*id).as_deref(), Some(s.as_str()));
    }
    for (s1, id1) in &all {
        for (s2, id2) in &all {
            if s1 == s2 {
                assert_eq!(id1, id2);
            }
        }
    }
}
