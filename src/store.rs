//! Cross-reference store: which shared artifacts are used where.
//!
//! Three independent id partitions (layouts, fragments, pluggable widgets)
//! each map an artifact id to the set of locations that reference it.
//! Entries are never removed and usage sets only grow. A flat set of style
//! class tokens is kept alongside.
use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Layout,
    Fragment,
    Widget,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntry {
    pub id: String,
    pub used_in: IndexSet<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(serialize_with = "entry_list")]
    layout: IndexMap<String, StoreEntry>,
    #[serde(serialize_with = "entry_list")]
    widget: IndexMap<String, StoreEntry>,
    #[serde(serialize_with = "entry_list")]
    fragment: IndexMap<String, StoreEntry>,
    class_list: IndexSet<String>,
}

fn entry_list<S: Serializer>(entries: &IndexMap<String, StoreEntry>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(entries.values())
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, partition: Partition) -> &IndexMap<String, StoreEntry> {
        match partition {
            Partition::Layout => &self.layout,
            Partition::Fragment => &self.fragment,
            Partition::Widget => &self.widget,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut IndexMap<String, StoreEntry> {
        match partition {
            Partition::Layout => &mut self.layout,
            Partition::Fragment => &mut self.fragment,
            Partition::Widget => &mut self.widget,
        }
    }

    pub fn used(&self, partition: Partition, id: &str) -> bool {
        self.partition(partition).contains_key(id)
    }

    pub fn get(&self, partition: Partition, id: &str) -> Option<&StoreEntry> {
        self.partition(partition).get(id)
    }

    pub fn find_or_create(&mut self, partition: Partition, id: &str) -> &mut StoreEntry {
        self.partition_mut(partition)
            .entry(id.to_string())
            .or_insert_with(|| StoreEntry { id: id.to_string(), used_in: IndexSet::new() })
    }

    pub fn register_usage(&mut self, partition: Partition, id: &str, location: &str) {
        let entry = self.find_or_create(partition, id);
        if !entry.used_in.contains(location) {
            entry.used_in.insert(location.to_string());
        }
    }

    /// Adds every whitespace-separated token of `classes`; blank input is ignored.
    pub fn register_class_names(&mut self, classes: &str) {
        for token in classes.split_whitespace() {
            if !self.class_list.contains(token) {
                self.class_list.insert(token.to_string());
            }
        }
    }

    /// Declared ids that no traversal ever registered a usage for.
    pub fn compute_unused(&self, declared: &IndexSet<String>, partition: Partition) -> IndexSet<String> {
        let entries = self.partition(partition);
        declared
            .iter()
            .filter(|id| entries.get(id.as_str()).is_none_or(|e| e.used_in.is_empty()))
            .cloned()
            .collect()
    }

    pub fn entries(&self, partition: Partition) -> impl Iterator<Item = &StoreEntry> {
        self.partition(partition).values()
    }

    pub fn class_names(&self) -> &IndexSet<String> {
        &self.class_list
    }
}

/// Where visitors report usages. The store is the real sink; a
/// [`UsageLog`] records calls so they can be replayed into the store later.
pub trait UsageSink {
    fn register_usage(&mut self, partition: Partition, id: &str, location: &str);
    fn register_class_names(&mut self, classes: &str);
}

impl UsageSink for Store {
    fn register_usage(&mut self, partition: Partition, id: &str, location: &str) {
        Store::register_usage(self, partition, id, location)
    }

    fn register_class_names(&mut self, classes: &str) {
        Store::register_class_names(self, classes)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum UsageEvent {
    Usage { partition: Partition, id: String, location: String },
    Classes(String),
}

#[derive(Clone, Debug, Default)]
pub struct UsageLog {
    events: Vec<UsageEvent>,
}

impl UsageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply recorded calls in the order they were made.
    pub fn replay(self, sink: &mut impl UsageSink) {
        for event in self.events {
            match event {
                UsageEvent::Usage { partition, id, location } => sink.register_usage(partition, &id, &location),
                UsageEvent::Classes(classes) => sink.register_class_names(&classes),
            }
        }
    }
}

impl UsageSink for UsageLog {
    fn register_usage(&mut self, partition: Partition, id: &str, location: &str) {
        self.events.push(UsageEvent::Usage {
            partition,
            id: id.to_string(),
            location: location.to_string(),
        });
    }

    fn register_class_names(&mut self, classes: &str) {
        self.events.push(UsageEvent::Classes(classes.to_string()));
    }
}
