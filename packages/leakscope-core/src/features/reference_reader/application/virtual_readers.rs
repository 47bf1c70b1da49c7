//! Collection readers
//!
//! Known collection classes hide their elements behind internal arrays and
//! node chains. These readers expose each element as a direct ARRAY_ENTRY
//! reference from the collection, so a path reads `list[3]` instead of
//! `list.elementData[3]`. The internal fields are still read afterwards by the
//! field reader.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::heap_graph::{GraphResult, HeapGraph, HeapInstance, ObjectId};
use crate::features::reference_reader::domain::{Reference, ReferenceLocationType};

/// Internal layout of a known collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLayout {
    ArrayList,
    CopyOnWriteArrayList,
    LinkedList,
    HashMap,
    HashSet,
    ConcurrentHashMap,
    MessageQueue,
    ThreadLocals,
}

impl CollectionLayout {
    const ALL: [CollectionLayout; 8] = [
        Self::ArrayList,
        Self::CopyOnWriteArrayList,
        Self::LinkedList,
        Self::HashMap,
        Self::HashSet,
        Self::ConcurrentHashMap,
        Self::MessageQueue,
        Self::ThreadLocals,
    ];

    fn class_names(&self) -> &'static [&'static str] {
        match self {
            Self::ArrayList => &["java.util.ArrayList"],
            Self::CopyOnWriteArrayList => &["java.util.concurrent.CopyOnWriteArrayList"],
            Self::LinkedList => &["java.util.LinkedList"],
            Self::HashMap => &["java.util.HashMap", "java.util.LinkedHashMap"],
            Self::HashSet => &["java.util.HashSet", "java.util.LinkedHashSet"],
            Self::ConcurrentHashMap => &["java.util.concurrent.ConcurrentHashMap"],
            Self::MessageQueue => &["android.os.MessageQueue"],
            Self::ThreadLocals => &["java.lang.Thread"],
        }
    }

    /// Thread subclasses are common, so threads match by hierarchy
    fn matches_subclasses(&self) -> bool {
        matches!(self, Self::ThreadLocals)
    }
}

/// Reader for one [`CollectionLayout`]
#[derive(Debug, Clone)]
pub struct VirtualInstanceReader {
    layout: CollectionLayout,
    class_ids: FxHashSet<ObjectId>,
    subclass_cache: FxHashMap<ObjectId, bool>,
}

impl VirtualInstanceReader {
    /// Readers for every layout whose classes exist in this heap
    pub fn for_graph(graph: &dyn HeapGraph) -> GraphResult<Vec<Self>> {
        let mut readers = Vec::new();
        for layout in CollectionLayout::ALL {
            let mut class_ids = FxHashSet::default();
            for name in layout.class_names() {
                if let Some(class) = graph.find_class_by_name(name)? {
                    class_ids.insert(class.object_id);
                }
            }
            if !class_ids.is_empty() {
                readers.push(Self {
                    layout,
                    class_ids,
                    subclass_cache: FxHashMap::default(),
                });
            }
        }
        Ok(readers)
    }

    pub fn layout(&self) -> CollectionLayout {
        self.layout
    }

    pub fn matches(&mut self, graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<bool> {
        if self.class_ids.contains(&instance.class_id) {
            return Ok(true);
        }
        if !self.layout.matches_subclasses() {
            return Ok(false);
        }
        if let Some(cached) = self.subclass_cache.get(&instance.class_id) {
            return Ok(*cached);
        }
        let hierarchy = graph.class_hierarchy(instance.class_id)?;
        let is_match = hierarchy.iter().any(|c| self.class_ids.contains(&c.object_id));
        self.subclass_cache.insert(instance.class_id, is_match);
        Ok(is_match)
    }

    pub fn read(&self, graph: &dyn HeapGraph, instance: &HeapInstance) -> GraphResult<Vec<Reference>> {
        let owner = instance.class_name.as_str();
        let references = match self.layout {
            CollectionLayout::ArrayList => {
                let data = ref_field(instance, "elementData").or_else(|| ref_field(instance, "array"));
                let size = instance
                    .field_named("size")
                    .and_then(|v| v.as_int())
                    .map(|s| s.max(0) as usize);
                let mut elements = array_elements(graph, data)?;
                if let Some(size) = size {
                    elements.truncate(size);
                }
                indexed_entries(elements.into_iter(), owner)
            }
            CollectionLayout::CopyOnWriteArrayList => {
                let elements = array_elements(graph, ref_field(instance, "array"))?;
                indexed_entries(elements.into_iter(), owner)
            }
            CollectionLayout::LinkedList => {
                let items = walk_chain(graph, ref_field(instance, "first"), "next", "item")?;
                indexed_entries(items.into_iter(), owner)
            }
            CollectionLayout::MessageQueue => {
                let messages = walk_nodes(graph, ref_field(instance, "mMessages"), "next")?;
                indexed_entries(messages.into_iter().map(Some), owner)
            }
            CollectionLayout::HashMap | CollectionLayout::ConcurrentHashMap => {
                map_entries(graph, ref_field(instance, "table"), owner)?
            }
            CollectionLayout::HashSet => {
                let map = ref_field(instance, "map");
                let table = match map {
                    Some(map_id) => read_ref_field(graph, map_id, "table")?,
                    None => None,
                };
                set_entries(graph, table, owner)?
            }
            CollectionLayout::ThreadLocals => {
                let map = ref_field(instance, "threadLocals");
                let table = match map {
                    Some(map_id) => read_ref_field(graph, map_id, "table")?,
                    None => None,
                };
                let mut values = Vec::new();
                for entry in array_elements(graph, table)?.into_iter().flatten() {
                    values.push(read_ref_field(graph, entry, "value")?);
                }
                indexed_entries(values.into_iter(), "java.lang.ThreadLocal$ThreadLocalMap")
            }
        };
        Ok(references)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Layout helpers
// ═══════════════════════════════════════════════════════════════════════════

fn ref_field(instance: &HeapInstance, name: &str) -> Option<ObjectId> {
    instance.field_named(name).and_then(|v| v.as_object_id())
}

fn read_ref_field(graph: &dyn HeapGraph, id: ObjectId, name: &str) -> GraphResult<Option<ObjectId>> {
    Ok(graph
        .find_object_by_id(id)?
        .and_then(|object| object.as_instance().and_then(|i| ref_field(i, name))))
}

fn array_elements(graph: &dyn HeapGraph, array_id: Option<ObjectId>) -> GraphResult<Vec<Option<ObjectId>>> {
    let Some(array_id) = array_id else {
        return Ok(Vec::new());
    };
    Ok(graph
        .find_object_by_id(array_id)?
        .and_then(|object| object.as_object_array().map(|a| a.elements.clone()))
        .unwrap_or_default())
}

/// Follow `next_field` from `head`, stopping at null, missing objects or a cycle
fn walk_nodes(graph: &dyn HeapGraph, head: Option<ObjectId>, next_field: &str) -> GraphResult<Vec<ObjectId>> {
    let mut nodes = Vec::new();
    let mut seen = FxHashSet::default();
    let mut next = head;
    while let Some(id) = next {
        if !seen.insert(id) {
            break;
        }
        let Some(object) = graph.find_object_by_id(id)? else {
            break;
        };
        let Some(node) = object.as_instance() else {
            break;
        };
        nodes.push(id);
        next = ref_field(node, next_field);
    }
    Ok(nodes)
}

/// Walk a node chain and read `item_field` of each node
fn walk_chain(
    graph: &dyn HeapGraph,
    head: Option<ObjectId>,
    next_field: &str,
    item_field: &str,
) -> GraphResult<Vec<Option<ObjectId>>> {
    let mut items = Vec::new();
    for node in walk_nodes(graph, head, next_field)? {
        items.push(read_ref_field(graph, node, item_field)?);
    }
    Ok(items)
}

fn indexed_entries(elements: impl Iterator<Item = Option<ObjectId>>, owner: &str) -> Vec<Reference> {
    elements
        .enumerate()
        .filter_map(|(index, element)| {
            element.map(|target_id| {
                Reference::new(target_id, ReferenceLocationType::ArrayEntry, index.to_string(), owner)
                    .into_virtual()
            })
        })
        .collect()
}

/// Key and value of every entry of a hash table, buckets followed via `next`
fn table_entries(
    graph: &dyn HeapGraph,
    table: Option<ObjectId>,
) -> GraphResult<Vec<(Option<ObjectId>, Option<ObjectId>)>> {
    let mut entries = Vec::new();
    for bucket in array_elements(graph, table)?.into_iter().flatten() {
        for node_id in walk_nodes(graph, Some(bucket), "next")? {
            let Some(object) = graph.find_object_by_id(node_id)? else {
                continue;
            };
            if let Some(node) = object.as_instance() {
                let key = ref_field(node, "key");
                let value = ref_field(node, "value").or_else(|| ref_field(node, "val"));
                entries.push((key, value));
            }
        }
    }
    Ok(entries)
}

fn map_entries(graph: &dyn HeapGraph, table: Option<ObjectId>, owner: &str) -> GraphResult<Vec<Reference>> {
    let mut references = Vec::new();
    for (key, value) in table_entries(graph, table)? {
        if let Some(key_id) = key {
            references.push(
                Reference::new(key_id, ReferenceLocationType::ArrayEntry, "key()", owner).into_virtual(),
            );
        }
        if let Some(value_id) = value {
            let name = render_key(graph, key)?;
            references.push(
                Reference::new(value_id, ReferenceLocationType::ArrayEntry, name, owner).into_virtual(),
            );
        }
    }
    Ok(references)
}

fn set_entries(graph: &dyn HeapGraph, table: Option<ObjectId>, owner: &str) -> GraphResult<Vec<Reference>> {
    Ok(table_entries(graph, table)?
        .into_iter()
        .filter_map(|(key, _)| key)
        .map(|key_id| {
            Reference::new(key_id, ReferenceLocationType::ArrayEntry, "element()", owner).into_virtual()
        })
        .collect())
}

/// Human-readable map key: quoted string text or `instance @id of Class`
fn render_key(graph: &dyn HeapGraph, key: Option<ObjectId>) -> GraphResult<String> {
    let Some(key_id) = key else {
        return Ok("null".to_string());
    };
    if let Some(text) = graph.read_string(key_id)? {
        return Ok(format!("\"{}\"", text));
    }
    Ok(match graph.find_object_by_id(key_id)? {
        Some(object) => format!("instance @{} of {}", key_id, object.class_name()),
        None => format!("instance @{}", key_id),
    })
}
