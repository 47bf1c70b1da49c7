//! Android framework references known to leak

use once_cell::sync::Lazy;

use crate::features::reference_reader::domain::{ReferenceMatcher, ReferencePattern};

struct KnownLeak {
    pattern: ReferencePattern,
    description: &'static str,
}

fn instance(class_name: &str, field_name: &str, description: &'static str) -> KnownLeak {
    KnownLeak {
        pattern: ReferencePattern::instance_field(class_name, field_name),
        description,
    }
}

fn static_field(class_name: &str, field_name: &str, description: &'static str) -> KnownLeak {
    KnownLeak {
        pattern: ReferencePattern::static_field(class_name, field_name),
        description,
    }
}

const IMM_DESCRIPTION: &str = "When a view that receives keyboard input is detached, \
InputMethodManager keeps a reference to it until another view asks for keyboard input.";

static ANDROID_MATCHERS: Lazy<Vec<ReferenceMatcher>> = Lazy::new(|| {
    let leaks = vec![
        instance("android.view.inputmethod.InputMethodManager", "mNextServedView", IMM_DESCRIPTION),
        instance("android.view.inputmethod.InputMethodManager", "mServedView", IMM_DESCRIPTION),
        instance("android.view.inputmethod.InputMethodManager", "mCurRootView", IMM_DESCRIPTION),
        instance(
            "android.view.accessibility.AccessibilityNodeInfo",
            "mOriginalText",
            "AccessibilityNodeInfo instances are pooled and keep the original text, \
             which may be a span holding a view.",
        ),
        static_field(
            "android.text.TextLine",
            "sCached",
            "TextLine.sCached is a pool of TextLine instances that are not cleared \
             after use and keep their last spans.",
        ),
        instance(
            "android.os.Message",
            "obj",
            "A thread waiting on a blocking queue leaks the last dequeued message \
             as a local until the next message arrives.",
        ),
        instance(
            "android.app.ActivityManager",
            "mContext",
            "ActivityManager keeps the first context it was created with.",
        ),
        instance(
            "android.widget.Toast$TN",
            "mNextView",
            "Toast keeps its next view until the toast window is removed.",
        ),
        instance(
            "android.media.session.MediaSessionLegacyHelper",
            "mContext",
            "MediaSessionLegacyHelper is a static singleton created with the first context.",
        ),
        static_field(
            "android.view.textservice.SpellCheckerSession$SpellCheckerSessionListenerImpl",
            "mHandler",
            "SpellCheckerSessionListenerImpl keeps its handler after the session is closed.",
        ),
    ];

    let mut matchers: Vec<ReferenceMatcher> = leaks
        .into_iter()
        .map(|leak| ReferenceMatcher::library_leak(leak.pattern, leak.description))
        .collect();

    matchers.push(ReferenceMatcher::ignored(ReferencePattern::instance_field(
        "android.view.Choreographer$FrameDisplayEventReceiver",
        "mMessageQueue",
    )));
    matchers.push(ReferenceMatcher::ignored(ReferencePattern::static_field(
        "android.app.ActivityThread",
        "sCurrentActivityThread",
    )));

    matchers
});

/// Library leaks and ignored references for the Android framework
pub fn android_reference_matchers() -> Vec<ReferenceMatcher> {
    ANDROID_MATCHERS.clone()
}
