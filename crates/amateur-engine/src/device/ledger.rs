use std::fmt;

/// Category of a tracked GPU handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum HandleKind {
    Program,
    Buffer,
    VertexArray,
}

impl HandleKind {
    /// Whether leaving this handle alive at teardown is a leak worth a warning.
    ///
    /// Programs must be disposed explicitly. Buffers and vertex arrays of the
    /// single geometry object are left to the driver, which reclaims them at exit.
    pub fn must_release(self) -> bool {
        matches!(self, HandleKind::Program)
    }
}

/// Registry of GPU handles that were created but not yet released.
///
/// Checked at unload to report leaks deterministically, instead of relying
/// on destruction order.
#[derive(Debug, Default)]
pub struct HandleLedger {
    live: Vec<(HandleKind, String)>,
}

impl HandleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, kind: HandleKind, handle: &impl fmt::Debug) {
        self.live.push((kind, format!("{handle:?}")));
    }

    /// Forgets a handle. Returns `false` if it was not tracked.
    pub fn release(&mut self, kind: HandleKind, handle: &impl fmt::Debug) -> bool {
        let key = format!("{handle:?}");
        match self.live.iter().position(|(k, h)| *k == kind && *h == key) {
            Some(i) => {
                self.live.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn live(&self, kind: HandleKind) -> usize {
        self.live.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Logs every live handle and returns how many of them are leaks.
    pub fn report(&self) -> usize {
        let mut leaks = 0;
        for (kind, handle) in &self.live {
            if kind.must_release() {
                leaks += 1;
                log::warn!("GPU resource leak: {kind:?} {handle} was never released");
            } else {
                log::debug!("{kind:?} {handle} left for the driver to reclaim at exit");
            }
        }
        leaks
    }
}
