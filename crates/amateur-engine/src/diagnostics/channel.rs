use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::device::GlBackend;

use super::message::DebugMessage;

/// What to do with backend debug output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DebugPolicy {
    /// Latch error-class messages as fatal; the render loop stops at the next check.
    pub abort_on_error: bool,

    /// Ask the driver to deliver messages on the thread that issued the call.
    ///
    /// Makes the log line appear right next to the offending call in the frame narration.
    pub synchronous: bool,
}

impl Default for DebugPolicy {
    fn default() -> Self {
        Self {
            abort_on_error: true,
            synchronous: true,
        }
    }
}

/// An error-class message latched by the debug channel.
#[derive(Debug, Clone, thiserror::Error)]
#[error("graphics backend reported an error: {0}")]
pub struct BackendFault(pub DebugMessage);

#[derive(Debug, Default)]
struct Shared {
    received: AtomicU64,
    fatal: Mutex<Option<DebugMessage>>,
}

/// Handle to the installed debug callback.
///
/// The callback closure itself is owned by the backend context and lives as
/// long as the context does; this handle only shares the state the callback
/// writes to.
#[derive(Debug)]
pub struct DebugChannel {
    shared: Arc<Shared>,
    installed: bool,
}

impl DebugChannel {
    /// Registers the callback, then enables debug output.
    ///
    /// The order matters: messages emitted between enabling output and
    /// registering a callback would go to the driver's default sink and be lost.
    pub fn install<G: GlBackend>(gl: &mut G, policy: DebugPolicy) -> Self {
        let shared = Arc::new(Shared::default());

        if !gl.supports_debug() {
            log::warn!("backend has no debug output; driver diagnostics will not be reported");
            return Self {
                shared,
                installed: false,
            };
        }

        let sink = Arc::clone(&shared);
        gl.set_debug_callback(Box::new(move |msg: &DebugMessage| {
            dispatch(&sink, policy, msg);
        }));
        gl.enable_debug_output(policy.synchronous);

        log::debug!(
            "debug output enabled (synchronous: {}, abort on error: {})",
            policy.synchronous,
            policy.abort_on_error
        );

        Self {
            shared,
            installed: true,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Number of messages delivered so far.
    pub fn received(&self) -> u64 {
        self.shared.received.load(Ordering::Relaxed)
    }

    /// Returns the first latched error-class message, if any.
    ///
    /// The latch is sticky: once a fault is recorded every later check fails.
    pub fn check(&self) -> Result<(), BackendFault> {
        let slot = self.shared.fatal.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(msg) => Err(BackendFault(msg.clone())),
            None => Ok(()),
        }
    }
}

fn dispatch(shared: &Shared, policy: DebugPolicy, msg: &DebugMessage) {
    shared.received.fetch_add(1, Ordering::Relaxed);

    log::log!(target: "gl", msg.level(), "{msg}");

    if msg.is_error() && policy.abort_on_error {
        let mut slot = shared.fatal.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(msg.clone());
        }
    }
}
