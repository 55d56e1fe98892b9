//! The reading table shared between an aggregator's pollers and its renderer.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::mapsort::Entry;

/// Latest reading per source name.
///
/// Cloning is cheap and every clone refers to the same table. Entries are
/// only ever inserted or overwritten, never removed, so a source that goes
/// quiet keeps showing its last reading.
#[derive(Clone, Default)]
pub struct ReadingTable {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl ReadingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reading stored for `name`.
    pub fn record(&self, name: &str, reading: String) {
        let mut readings = self.lock();
        match readings.get_mut(name) {
            Some(slot) => *slot = reading,
            None => {
                readings.insert(name.to_string(), reading);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Copy every `(name, reading)` pair out under a single lock.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock()
            .iter()
            .map(|(name, reading)| Entry::new(name.as_str(), reading.as_str()))
            .collect()
    }

    // Writers only ever store whole strings, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapsort::{sort_entries, SortBy, Value};
    use std::thread;

    #[test]
    fn keeps_only_latest_reading_per_name() {
        let table = ReadingTable::new();
        table.record("Tokyo", "10:00:00".into());
        table.record("Tokyo", "10:00:01".into());
        table.record("Paris", "03:00:01".into());
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Tokyo").as_deref(), Some("10:00:01"));
        assert_eq!(table.get("Berlin"), None);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let table = ReadingTable::new();
        table.record("b", "11:00:00".into());
        table.record("a", "12:00:00".into());
        table.record("c", "01:00:00".into());

        let mut first = table.snapshot();
        let mut second = table.snapshot();
        sort_entries(&mut first, SortBy::Value).unwrap();
        sort_entries(&mut second, SortBy::Value).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn concurrent_writers_never_expose_partial_values() {
        let table = ReadingTable::new();
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let table = table.clone();
                thread::spawn(move || {
                    let name = format!("src{w}");
                    for i in 0..2_000u32 {
                        let reading = format!("{:02}:{:02}:{:02}", w, (i / 60) % 60, i % 60);
                        table.record(&name, reading);
                    }
                })
            })
            .collect();

        let reader = {
            let table = table.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    for entry in table.snapshot() {
                        let Value::Text(reading) = &entry.value else {
                            panic!("reading stored as {:?}", entry.value.kind());
                        };
                        assert!(crate::clock::parse_stamp(reading).is_some(), "torn reading {reading:?}");
                        let Value::Text(name) = &entry.key else { unreachable!() };
                        assert_eq!(&name[3..], &reading[1..2], "{name} holds another source's reading");
                    }
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get("src3").as_deref(), Some("03:33:19"));
    }
}
