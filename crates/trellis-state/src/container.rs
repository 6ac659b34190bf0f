//! Path-addressable state container.

use std::path::Path;

use indexmap::IndexMap;
use trellis_config::path::write_atomic;
use trellis_config::{log_state_debug, log_state_info};
use trellis_monitor::{ReadGuard, Store, WriteGuard};

use crate::error::{PathError, Result};
use crate::path::KeyPath;
use crate::value::Value;

/// A nested [`Value`] tree shared between threads.
///
/// Single `get`/`set` calls are atomic on their own but not with respect to
/// each other. A caller that needs several mutually consistent values uses
/// [`bulk_read`](Self::bulk_read), and one that needs several writes to land
/// together uses [`bulk_write`](Self::bulk_write).
///
/// Share it with `Arc<StateContainer>`.
#[derive(Debug, Default)]
pub struct StateContainer {
    store: Store<Value>,
}

impl StateContainer {
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            store: Store::new(root.into()),
        }
    }

    /// Value at `path`, or the reason it does not resolve.
    pub fn try_get(&self, path: impl Into<KeyPath>) -> std::result::Result<Value, PathError> {
        let path = path.into();
        self.store.read(|root| root.resolve(&path).cloned())
    }

    /// Value at `path`; `None` (with a debug log) when it does not resolve.
    pub fn get(&self, path: impl Into<KeyPath>) -> Option<Value> {
        match self.try_get(path) {
            Ok(value) => Some(value),
            Err(e) => {
                log_state_debug!(
                    "Path not found",
                    path = e.path.as_str(),
                    reason = tracing::field::display(&e.kind)
                );
                None
            }
        }
    }

    pub fn try_set(
        &self,
        path: impl Into<KeyPath>,
        value: impl Into<Value>,
    ) -> std::result::Result<(), PathError> {
        let path = path.into();
        let value = value.into();
        self.store.write(|root| root.assign(&path, value))
    }

    /// Assign `value` at `path`. Returns whether the write happened; an
    /// unresolvable path is logged and leaves the tree untouched.
    ///
    /// The path must already exist. A missing map key is not inserted; use
    /// [`update`](Self::update) or [`overlay_json_str`](Self::overlay_json_str)
    /// to add keys.
    pub fn set(&self, path: impl Into<KeyPath>, value: impl Into<Value>) -> bool {
        match self.try_set(path, value) {
            Ok(()) => true,
            Err(e) => {
                log_state_debug!(
                    "Set ignored",
                    path = e.path.as_str(),
                    reason = tracing::field::display(&e.kind)
                );
                false
            }
        }
    }

    /// Read several paths against one consistent snapshot.
    pub fn bulk_read<I, P>(&self, paths: I) -> Vec<Option<Value>>
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        let _region = self.store.read_region();
        paths.into_iter().map(|p| self.get(p)).collect()
    }

    /// Like [`bulk_read`](Self::bulk_read), keyed by path.
    pub fn bulk_read_map<I, P>(&self, paths: I) -> IndexMap<String, Option<Value>>
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPath>,
    {
        let _region = self.store.read_region();
        paths
            .into_iter()
            .map(|p| {
                let path = p.into();
                let value = self.get(&path);
                (path.as_str().to_string(), value)
            })
            .collect()
    }

    /// Apply every assignment inside one write region. Returns how many landed.
    pub fn bulk_write<I, P, V>(&self, pairs: I) -> usize
    where
        I: IntoIterator<Item = (P, V)>,
        P: Into<KeyPath>,
        V: Into<Value>,
    {
        let _region = self.store.write_region();
        pairs
            .into_iter()
            .map(|(path, value)| self.set(path, value))
            .filter(|applied| *applied)
            .count()
    }

    /// Append `value` to the list at `path`.
    pub fn push(&self, path: impl Into<KeyPath>, value: impl Into<Value>) -> bool {
        let path = path.into();
        let value = value.into();
        self.log_outcome(self.store.write(|root| root.push_at(&path, value)))
    }

    /// Replace `list[index]` at `path`, or append when `index` is the length.
    pub fn put_at(&self, path: impl Into<KeyPath>, index: usize, value: impl Into<Value>) -> bool {
        let path = path.into();
        let value = value.into();
        self.log_outcome(self.store.write(|root| root.put_at(&path, index, value)))
    }

    /// Remove and return the list element or map entry at `path`.
    pub fn remove(&self, path: impl Into<KeyPath>) -> Option<Value> {
        let path = path.into();
        match self.store.write(|root| root.remove_at(&path)) {
            Ok(value) => Some(value),
            Err(e) => {
                self.log_outcome(Err(e));
                None
            }
        }
    }

    /// Run a compound read against a copy of the whole tree.
    ///
    /// Writers are held off while `f` runs. `f` may call other methods on
    /// this container.
    pub fn inspect<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.store.inspect(f)
    }

    /// Run a compound edit against a copy of the whole tree, then store it.
    ///
    /// Readers on other threads see the tree before or after the whole edit.
    /// `f` may call other methods on this container; those calls see the tree
    /// as it was before `f` started, and any writes they make are replaced
    /// when `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        self.store.update(f)
    }

    /// Deep copy of the whole tree.
    pub fn snapshot(&self) -> Value {
        self.store.read(|root| root.clone())
    }

    pub fn read_region(&self) -> ReadGuard<'_> {
        self.store.read_region()
    }

    pub fn write_region(&self) -> WriteGuard<'_> {
        self.store.write_region()
    }

    /// Serialize the tree as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(self.store.read(|root| serde_json::to_string_pretty(root))?)
    }

    /// Overlay a JSON document onto the tree (see [`Value::overlay`]).
    pub fn overlay_json_str(&self, json: &str) -> Result<()> {
        let incoming: Value = serde_json::from_str(json)?;
        self.store.write(|root| root.overlay(incoming));
        Ok(())
    }

    /// Write the tree to `path` as JSON, atomically.
    ///
    /// Serialization happens under the read region; the file write does not.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        write_atomic(path, json.as_bytes())?;
        log_state_info!("State saved", path = tracing::field::display(path.display()));
        Ok(())
    }

    /// Load a JSON file and overlay it onto the tree.
    ///
    /// The file is read and parsed before the write region is taken.
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.overlay_json_str(&text)?;
        log_state_info!("State loaded", path = tracing::field::display(path.display()));
        Ok(())
    }

    fn log_outcome(&self, outcome: std::result::Result<(), PathError>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(e) => {
                log_state_debug!(
                    "List edit ignored",
                    path = e.path.as_str(),
                    reason = tracing::field::display(&e.kind)
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn container() -> StateContainer {
        StateContainer::new(Value::map([(
            "a",
            Value::map([("b", Value::List(vec![1.0.into(), 2.0.into()]))]),
        )]))
    }

    #[test]
    fn test_set_then_get_coerces_float() {
        let c = container();
        assert!(c.set("a.b.1", 7));
        assert_eq!(c.get("a.b.1"), Some(Value::from(7.0)));
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let c = container();
        assert_eq!(c.get("a.b.2"), None);
        assert_eq!(c.get("a.x.y"), None);
    }

    #[test]
    fn test_set_unresolvable_is_noop() {
        let c = container();
        let before = c.snapshot();
        assert!(!c.set("a.b.5", 1));
        assert!(!c.set("a.missing.x", 1));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_get_empty_path_returns_root() {
        let c = container();
        assert_eq!(c.get(""), Some(c.snapshot()));
    }

    #[test]
    fn test_bulk_read_and_map() {
        let c = container();
        let values = c.bulk_read(["a.b.0", "a.b.9", "a.b.1"]);
        assert_eq!(
            values,
            vec![Some(Value::from(1.0)), None, Some(Value::from(2.0))]
        );

        let map = c.bulk_read_map(["a.b.0", "nope"]);
        assert_eq!(map["a.b.0"], Some(Value::from(1.0)));
        assert_eq!(map["nope"], None);
    }

    #[test]
    fn test_bulk_write_counts_applied() {
        let c = container();
        let applied = c.bulk_write([("a.b.0", Value::from(5)), ("a.q.r", Value::from(1))]);
        assert_eq!(applied, 1);
        assert_eq!(c.get("a.b.0"), Some(Value::from(5.0)));
    }

    #[test]
    fn test_list_edits() {
        let c = StateContainer::new(Record::new().with("embeddings", Value::List(vec![])));
        assert!(c.push("embeddings", Value::map([("train", false)])));
        assert!(c.put_at("embeddings", 1, Value::map([("train", false)])));
        assert!(!c.put_at("embeddings", 5, Value::null()));

        let flags: Vec<_> = (0..2).map(|i| (format!("embeddings.{}.train", i), true)).collect();
        assert_eq!(c.bulk_write(flags), 2);
        assert_eq!(c.get("embeddings.1.train"), Some(Value::from(true)));

        assert!(c.remove("embeddings.0").is_some());
        assert_eq!(c.get("embeddings").unwrap().as_list().unwrap().len(), 1);
        assert!(c.remove("embeddings.3").is_none());
    }

    #[test]
    fn test_update_and_inspect() {
        let c = container();
        c.update(|root| {
            root.assign(&"a.b.0".into(), 5.into()).unwrap();
        });
        assert_eq!(c.inspect(|root| root.kind()), "map");
        assert_eq!(c.get("a.b.0"), Some(Value::from(5.0)));
    }

    #[test]
    fn test_set_does_not_insert_map_keys() {
        let c = container();
        let before = c.snapshot();
        assert!(!c.set("a.extra", "x"));
        assert_eq!(c.get("a.extra"), None);
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_update_closure_can_read_container() {
        let c = container();
        let seen = c.update(|root| {
            root.assign(&"a.b.0".into(), 9.into()).unwrap();
            c.get("a.b.0")
        });
        assert_eq!(seen, Some(Value::from(1.0)));
        assert_eq!(c.get("a.b.0"), Some(Value::from(9.0)));
    }

    #[test]
    fn test_inspect_closure_can_write_container() {
        let c = container();
        let len = c.inspect(|root| {
            assert!(c.set("a.b.1", 3));
            root.resolve(&"a.b".into()).ok().and_then(Value::as_list).map(<[Value]>::len)
        });
        assert_eq!(len, Some(2));
        assert_eq!(c.get("a.b.1"), Some(Value::from(3.0)));
    }

    #[test]
    fn test_json_string_roundtrip() {
        let c = container();
        let json = c.to_json_string().unwrap();
        let other = StateContainer::new(Value::map([("a", Value::null())]));
        other.overlay_json_str(&json).unwrap();
        assert_eq!(other.get("a.b.1"), Some(Value::from(2.0)));
    }

    #[test]
    fn test_overlay_rejects_bad_json() {
        let c = container();
        assert!(c.overlay_json_str("{not json").is_err());
        assert_eq!(c.get("a.b.0"), Some(Value::from(1.0)));
    }
}
