// SPDX-License-Identifier: MIT OR Apache-2.0

//! The record data model: ordered field maps, per-record context, and the
//! envelope type that carries both through the pipeline.

pub mod context;
pub mod envelope;
pub mod value;

pub use context::{Context, Separators};
pub use envelope::Envelope;
pub use value::Value;

/// Separator used to splice multi-field join keys into one map key. Chosen
/// outside the printable range so key tuples cannot collide with field text.
const KEY_JOIN_SEPARATOR: char = '\u{1f}';

/// An ordered, string-keyed map of typed values: the unit of data flowing
/// through the pipeline.
///
/// Keys are unique; insertion order is significant and preserved through
/// copies and merges. A record is owned by exactly one pipeline stage at a
/// time; stages that retain a record past their own call must clone it if
/// the original is also forwarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Record {
        Record { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Set a field: replaces the value in place if the key exists
    /// (preserving its position), else appends at the end.
    pub fn put(&mut self, key: String, value: Value) {
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(index).1)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.iter().map(|(k, _)| k)
    }

    /// True iff every named field is present.
    pub fn has_all_fields(&self, names: &[String]) -> bool {
        names.iter().all(|name| self.has(name))
    }

    /// Project the record onto the named fields, in list order. `None` when
    /// any field is missing — the caller routes such records to the
    /// unpairable path rather than failing.
    pub fn select_values(&self, names: &[String]) -> Option<Vec<Value>> {
        names
            .iter()
            .map(|name| self.get(name).cloned())
            .collect()
    }

    /// Projection plus a single spliced map key for hash-join bucketing.
    pub fn grouping_key(&self, names: &[String]) -> Option<(String, Vec<Value>)> {
        let values = self.select_values(names)?;
        let mut key = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                key.push(KEY_JOIN_SEPARATOR);
            }
            key.push_str(&value.to_string());
        }
        Some((key, values))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Record {
        let mut record = Record::new();
        for (key, value) in iter {
            record.put(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from_inferred(v)))
            .collect()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let r = rec(&[("z", "1"), ("a", "2"), ("m", "3")]);
        let keys: Vec<&String> = r.keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_put_replaces_in_place() {
        let mut r = rec(&[("a", "1"), ("b", "2")]);
        r.put("a".to_string(), Value::Int(9));
        let keys: Vec<&String> = r.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(r.get("a"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_remove_closes_the_gap() {
        let mut r = rec(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(r.remove("b"), Some(Value::Int(2)));
        assert_eq!(r.remove("b"), None);
        let keys: Vec<&String> = r.keys().collect();
        assert_eq!(keys, ["a", "c"]);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_select_values_missing_field() {
        let r = rec(&[("id", "1"), ("name", "a")]);
        assert!(r
            .select_values(&["id".to_string(), "name".to_string()])
            .is_some());
        assert!(r
            .select_values(&["id".to_string(), "amt".to_string()])
            .is_none());
    }

    #[test]
    fn test_grouping_key_multi_field() {
        let r = rec(&[("a", "1"), ("b", "2")]);
        let (key, values) = r
            .grouping_key(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(key, format!("1{}2", '\u{1f}'));
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }
}
