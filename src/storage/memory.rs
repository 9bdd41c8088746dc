use crate::core::{Result, StoreError, StorePath, child_count};
use crate::interface::StoreClient;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Store primitives, used for fault injection and the operation journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    Delete,
    Patch,
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOp {
    pub operation: Operation,
    pub path: String,
}

/// In-process tree store with the same observable semantics as the hosted
/// realtime database.
///
/// - absent nodes and `null` read back as `None`
/// - nodes emptied by a delete or patch disappear
/// - a patch creates missing parents and a `null` field removes that field
///
/// Every primitive call is journaled, and individual `(operation, path)` pairs
/// can be set to fail, which lets tests exercise partial-failure handling.
///
/// # Examples
///
/// ```
/// use fantasy_admin::storage::InMemoryStore;
/// use serde_json::json;
///
/// let store = InMemoryStore::with_data(json!({"loans": {"l1": {"player": "p9"}}}));
/// assert_eq!(store.journal().len(), 0);
/// ```
pub struct InMemoryStore {
    root: RwLock<Value>,
    faults: Mutex<HashSet<(Operation, String)>>,
    journal: Mutex<Vec<RecordedOp>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_data(Value::Null)
    }

    /// Seed the store with a full tree.
    pub fn with_data(mut data: Value) -> Self {
        if prune(&mut data) {
            data = Value::Null;
        }
        Self {
            root: RwLock::new(data),
            faults: Mutex::new(HashSet::new()),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Make every future `operation` on `path` fail.
    pub fn fail_on(&self, operation: Operation, path: &str) -> Result<()> {
        let path = StorePath::parse(path)?;
        self.faults.lock()?.insert((operation, path.to_string()));
        Ok(())
    }

    pub fn clear_faults(&self) -> Result<()> {
        self.faults.lock()?.clear();
        Ok(())
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    pub fn journal(&self) -> Vec<RecordedOp> {
        self.journal
            .lock()
            .map(|ops| ops.clone())
            .unwrap_or_default()
    }

    /// Number of journaled calls of one kind.
    pub fn count(&self, operation: Operation) -> usize {
        self.journal()
            .iter()
            .filter(|op| op.operation == operation)
            .count()
    }

    fn record(&self, operation: Operation, path: &StorePath) -> Result<()> {
        let key = path.to_string();
        self.journal.lock()?.push(RecordedOp {
            operation,
            path: key.clone(),
        });

        if self.faults.lock()?.contains(&(operation, key.clone())) {
            let message = "injected fault";
            return Err(match operation {
                Operation::Fetch => StoreError::read(key, message),
                Operation::Delete | Operation::Patch => StoreError::write(key, message),
                Operation::Ping => StoreError::Connection(message.to_string()),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn fetch_subtree(&self, path: &StorePath) -> Result<Option<Value>> {
        self.record(Operation::Fetch, path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, path.segments())
            .filter(|node| !is_empty_node(node))
            .cloned())
    }

    async fn delete_subtree(&self, path: &StorePath) -> Result<()> {
        self.record(Operation::Delete, path)?;
        let mut root = self.root.write().await;
        remove_at(&mut root, path.segments());
        if prune(&mut root) {
            *root = Value::Null;
        }
        Ok(())
    }

    async fn patch_record(&self, path: &StorePath, fields: Map<String, Value>) -> Result<()> {
        self.record(Operation::Patch, path)?;
        let mut root = self.root.write().await;
        merge_at(&mut root, path.segments(), fields);
        if prune(&mut root) {
            *root = Value::Null;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.record(Operation::Ping, &StorePath::root())
    }

    async fn count_children(&self, path: &StorePath) -> Result<usize> {
        self.record(Operation::Fetch, path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, path.segments()).map_or(0, child_count))
    }
}

// ============================================================================
// Tree helpers
// ============================================================================

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(node, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn is_empty_node(node: &Value) -> bool {
    match node {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.iter().all(Value::is_null),
        _ => false,
    }
}

/// Run `f` against `node` viewed as an object.
///
/// Arrays become objects keyed by index; scalars are replaced by an empty
/// object, which is what the hosted store does when a write lands beneath a
/// leaf.
fn with_object<R>(node: &mut Value, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
    let mut map = match node.take() {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        _ => Map::new(),
    };
    let result = f(&mut map);
    *node = Value::Object(map);
    result
}

fn merge_at(node: &mut Value, segments: &[String], fields: Map<String, Value>) {
    with_object(node, |map| match segments.split_first() {
        None => {
            for (field, value) in fields {
                if value.is_null() {
                    map.remove(&field);
                } else {
                    map.insert(field, value);
                }
            }
        }
        Some((first, rest)) => {
            let child = map.entry(first.clone()).or_insert(Value::Null);
            merge_at(child, rest, fields);
        }
    })
}

fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Null;
        return;
    };
    if !(node.is_object() || node.is_array()) {
        return;
    }
    with_object(node, |map| {
        if rest.is_empty() {
            map.remove(first);
        } else if let Some(child) = map.get_mut(first) {
            remove_at(child, rest);
        }
    });
}

/// Drop empty branches; returns true when `node` itself ended up empty.
fn prune(node: &mut Value) -> bool {
    match node {
        Value::Null => true,
        Value::Object(map) => {
            map.retain(|_, child| !prune(child));
            map.is_empty()
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if prune(item) {
                    *item = Value::Null;
                }
            }
            items.iter().all(Value::is_null)
        }
        _ => false,
    }
}
