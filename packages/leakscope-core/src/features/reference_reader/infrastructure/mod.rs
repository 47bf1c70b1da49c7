//! Static rule tables

mod android_matchers;
mod jdk_matchers;

pub use android_matchers::android_reference_matchers;
pub use jdk_matchers::jdk_reference_matchers;
