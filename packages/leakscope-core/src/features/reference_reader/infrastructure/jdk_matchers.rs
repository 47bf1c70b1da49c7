//! Runtime-internal references that never explain a leak

use once_cell::sync::Lazy;

use crate::features::reference_reader::domain::{ReferenceMatcher, ReferencePattern};

static JDK_MATCHERS: Lazy<Vec<ReferenceMatcher>> = Lazy::new(|| {
    let mut matchers = Vec::new();

    // Referents are what the references are watching, not what keeps them alive
    for class_name in [
        "java.lang.ref.WeakReference",
        "java.lang.ref.SoftReference",
        "java.lang.ref.PhantomReference",
        "java.lang.ref.Finalizer",
        "java.lang.ref.FinalizerReference",
    ] {
        matchers.push(ReferenceMatcher::ignored(ReferencePattern::instance_field(
            class_name, "referent",
        )));
    }

    for field_name in ["prev", "next", "element"] {
        matchers.push(ReferenceMatcher::ignored(ReferencePattern::instance_field(
            "java.lang.ref.Finalizer",
            field_name,
        )));
    }
    for field_name in ["prev", "next", "zombie"] {
        matchers.push(ReferenceMatcher::ignored(ReferencePattern::instance_field(
            "java.lang.ref.FinalizerReference",
            field_name,
        )));
    }
    for field_name in ["prev", "next"] {
        matchers.push(ReferenceMatcher::ignored(ReferencePattern::instance_field(
            "sun.misc.Cleaner",
            field_name,
        )));
    }
    matchers.push(ReferenceMatcher::ignored(ReferencePattern::static_field(
        "java.lang.ref.FinalizerReference",
        "head",
    )));

    // The watchdog holds the object being finalized as a local
    matchers.push(ReferenceMatcher::ignored(ReferencePattern::java_local(
        "FinalizerWatchdogDaemon",
    )));
    // Locals of the main thread are transient
    matchers.push(ReferenceMatcher::ignored(ReferencePattern::java_local("main")));

    matchers
});

/// Ignored references for JDK internals
pub fn jdk_reference_matchers() -> Vec<ReferenceMatcher> {
    JDK_MATCHERS.clone()
}
