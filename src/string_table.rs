use std::collections::HashMap;

use parking_lot::Mutex;

/// String interning for compact binary logging.
///
/// Repeated strings (format templates, interned payload strings) are stored
/// once and referenced by a dense 4-byte index. The table is shared between
/// the encode side (which may insert) and the decode side (which only looks
/// up); it is handed around explicitly rather than living in a process-wide
/// global, so tests and embedders control its lifetime.

/// Capability contract the encoder and decoder consume.
///
/// `get_index` interns on first use and is the encode-side entry point;
/// `get_str` is the read-only decode-side lookup. Implementations serialize
/// their own mutation so concurrent `get_index` calls are safe.
pub trait StringTable {
    /// Returns the index for `s`, interning it on first use.
    fn get_index(&self, s: &str) -> u32;

    /// Looks up a previously interned string. `None` for unknown indices.
    fn get_str(&self, index: u32) -> Option<String>;
}

struct Inner {
    ids: HashMap<String, u32>,
    strings: Vec<String>,
}

/// Thread-safe interning table.
///
/// Indices are positions in an append-only `Vec`, so lookup by index is O(1)
/// and indices are dense starting at 0.
///
/// # Examples
///
/// ```
/// use binform::{InternTable, StringTable};
///
/// let table = InternTable::new();
/// let a = table.get_index("Temperature: {} C");
/// let b = table.get_index("Temperature: {} C");
/// assert_eq!(a, b);
/// assert_eq!(table.get_str(a).as_deref(), Some("Temperature: {} C"));
/// assert_eq!(table.get_str(9999), None);
/// ```
pub struct InternTable {
    inner: Mutex<Inner>,
}

impl InternTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { ids: HashMap::new(), strings: Vec::new() }),
        }
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.lock().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InternTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable for InternTable {
    fn get_index(&self, s: &str) -> u32 {
        let mut inner = self.inner.lock();
        if let Some(&id) = inner.ids.get(s) {
            return id;
        }
        let id = inner.strings.len() as u32;
        inner.strings.push(s.to_owned());
        inner.ids.insert(s.to_owned(), id);
        id
    }

    fn get_str(&self, index: u32) -> Option<String> {
        self.inner.lock().strings.get(index as usize).cloned()
    }
}
