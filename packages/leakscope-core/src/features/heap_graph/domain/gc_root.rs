//! GC roots

use serde::{Deserialize, Serialize};
use std::fmt;

use super::heap_object::ObjectId;

/// Kind of GC root, as reported in leak traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GcRootKind {
    JniGlobal,
    JniLocal,
    JavaFrame,
    NativeStack,
    StickyClass,
    ThreadBlock,
    MonitorUsed,
    ThreadObject,
    JniMonitor,
}

impl GcRootKind {
    /// Traversal preference: higher is enqueued first
    pub fn priority(&self) -> u8 {
        match self {
            Self::ThreadObject => 8,
            Self::ThreadBlock => 7,
            Self::StickyClass => 6,
            Self::NativeStack => 5,
            Self::MonitorUsed => 4,
            Self::JniMonitor => 3,
            Self::JniLocal => 2,
            Self::JniGlobal => 1,
            Self::JavaFrame => 0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::JniGlobal => "Global variable in native code",
            Self::JniLocal => "Local variable in native code",
            Self::JavaFrame => "Java local variable",
            Self::NativeStack => "Input or output parameters in native code",
            Self::StickyClass => "System class",
            Self::ThreadBlock => "Thread block",
            Self::MonitorUsed => {
                "Monitor (anything that called the wait() or notify() methods, or that is synchronized.)"
            }
            Self::ThreadObject => "Thread object",
            Self::JniMonitor => "Root JNI monitor",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JniGlobal => "JNI_GLOBAL",
            Self::JniLocal => "JNI_LOCAL",
            Self::JavaFrame => "JAVA_FRAME",
            Self::NativeStack => "NATIVE_STACK",
            Self::StickyClass => "STICKY_CLASS",
            Self::ThreadBlock => "THREAD_BLOCK",
            Self::MonitorUsed => "MONITOR_USED",
            Self::ThreadObject => "THREAD_OBJECT",
            Self::JniMonitor => "JNI_MONITOR",
        }
    }
}

impl fmt::Display for GcRootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A root keeping `object_id` alive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GcRoot {
    pub object_id: ObjectId,
    pub kind: GcRootKind,
    /// Owning thread for thread and frame roots
    #[serde(default)]
    pub thread_serial_number: Option<u32>,
}

impl GcRoot {
    pub fn new(kind: GcRootKind, object_id: ObjectId) -> Self {
        Self {
            object_id,
            kind,
            thread_serial_number: None,
        }
    }

    pub fn with_thread(mut self, thread_serial_number: u32) -> Self {
        self.thread_serial_number = Some(thread_serial_number);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let ordered = [
            GcRootKind::ThreadObject,
            GcRootKind::ThreadBlock,
            GcRootKind::StickyClass,
            GcRootKind::NativeStack,
            GcRootKind::MonitorUsed,
            GcRootKind::JniMonitor,
            GcRootKind::JniLocal,
            GcRootKind::JniGlobal,
            GcRootKind::JavaFrame,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].priority() > pair[1].priority(), "{:?}", pair);
        }
    }

    #[test]
    fn test_kind_serializes_screaming_case() {
        let json = serde_json::to_string(&GcRootKind::StickyClass).unwrap();
        assert_eq!(json, "\"STICKY_CLASS\"");
        assert_eq!(GcRootKind::StickyClass.to_string(), "STICKY_CLASS");
    }
}
