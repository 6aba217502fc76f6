//! Driver diagnostics.
//!
//! The graphics backend reports usage errors, performance warnings and
//! informational notes through a callback. `DebugChannel` owns the policy for
//! those messages: every message is logged under the `gl` target, and
//! error-class messages are latched as a fatal condition the render loop
//! checks after load and after every frame.
//!
//! The callback may run on the render thread (synchronous debug output) or on
//! a driver thread; it only touches the log facade and shared atomics/mutexes.

mod channel;
mod message;

pub use channel::{BackendFault, DebugChannel, DebugPolicy};
pub use message::{DebugKind, DebugMessage, DebugSeverity, DebugSource};
