//! Scenario graphs
//!
//! Every fixture roots its objects in the static field of an application
//! class, the most common shape of a real leak.

use leakscope_core::features::heap_graph::{GcRootKind, InMemoryHeapGraph, ObjectId};

use super::builders::HeapScenario;

pub const APP_CLASS: &str = "com.example.App";
pub const REGISTRY_CLASS: &str = "com.example.Registry";
pub const ACTIVITY_CLASS: &str = "com.example.MainActivity";
pub const FRAGMENT_CLASS: &str = "com.example.DetailFragment";

/// `App.registry → Registry.activity → MainActivity`
pub struct SingleChain {
    pub graph: InMemoryHeapGraph,
    pub app_class: ObjectId,
    pub registry: ObjectId,
    pub activity: ObjectId,
}

pub fn single_chain() -> SingleChain {
    let mut scenario = HeapScenario::new();
    let app_class = scenario.class(APP_CLASS, 0);
    let registry_class = scenario.class(REGISTRY_CLASS, 16);
    let activity_class = scenario.class(ACTIVITY_CLASS, 64);
    let registry = scenario.instance(registry_class);
    let activity = scenario.instance(activity_class);
    scenario
        .static_field(app_class, "registry", registry)
        .field(registry, "activity", activity)
        .root(GcRootKind::StickyClass, app_class);
    SingleChain {
        graph: scenario.build(),
        app_class,
        registry,
        activity,
    }
}

/// `App.registry → Registry` holding a `MainActivity` and a `DetailFragment`
pub struct SiblingLeaks {
    pub graph: InMemoryHeapGraph,
    pub activity: ObjectId,
    pub fragment: ObjectId,
}

pub fn sibling_leaks() -> SiblingLeaks {
    let mut scenario = HeapScenario::new();
    let app_class = scenario.class(APP_CLASS, 0);
    let registry_class = scenario.class(REGISTRY_CLASS, 16);
    let activity_class = scenario.class(ACTIVITY_CLASS, 64);
    let fragment_class = scenario.class(FRAGMENT_CLASS, 32);
    let registry = scenario.instance(registry_class);
    let activity = scenario.instance(activity_class);
    let fragment = scenario.instance(fragment_class);
    scenario
        .static_field(app_class, "registry", registry)
        .field(registry, "activity", activity)
        .field(registry, "fragment", fragment)
        .root(GcRootKind::StickyClass, app_class);
    SiblingLeaks {
        graph: scenario.build(),
        activity,
        fragment,
    }
}

/// Two routes to `target`: `root → a → b → target` and `root → c → target`
pub struct TwoRoutes {
    pub graph: InMemoryHeapGraph,
    pub root: ObjectId,
    pub short_hop: ObjectId,
    pub target: ObjectId,
}

pub fn two_routes() -> TwoRoutes {
    let mut scenario = HeapScenario::new();
    let node_class = scenario.class("com.example.Node", 16);
    let target_class = scenario.class(ACTIVITY_CLASS, 64);
    let root = scenario.instance(node_class);
    let a = scenario.instance(node_class);
    let b = scenario.instance(node_class);
    let c = scenario.instance(node_class);
    let target = scenario.instance(target_class);
    scenario
        .field(root, "a", a)
        .field(a, "b", b)
        .field(b, "target", target)
        .field(root, "c", c)
        .field(c, "target", target)
        .root(GcRootKind::ThreadBlock, root);
    TwoRoutes {
        graph: scenario.build(),
        root,
        short_hop: c,
        target,
    }
}

/// A watched activity reached from a static field, and a watched fragment
/// nothing references
pub struct WatchedObjects {
    pub graph: InMemoryHeapGraph,
    pub activity: ObjectId,
    pub orphan: ObjectId,
}

pub fn watched_objects() -> WatchedObjects {
    let mut scenario = HeapScenario::new();
    let app_class = scenario.class(APP_CLASS, 0);
    let activity_class = scenario.class(ACTIVITY_CLASS, 64);
    let fragment_class = scenario.class(FRAGMENT_CLASS, 32);
    let activity = scenario.instance(activity_class);
    let orphan = scenario.instance(fragment_class);
    scenario
        .static_field(app_class, "current", activity)
        .root(GcRootKind::StickyClass, app_class);
    scenario.watch(Some(activity), "MainActivity received Activity#onDestroy() callback");
    scenario.watch(Some(orphan), "DetailFragment received Fragment#onDestroy() callback");
    scenario.watch(None, "cleared before the dump");
    WatchedObjects {
        graph: scenario.build(),
        activity,
        orphan,
    }
}
