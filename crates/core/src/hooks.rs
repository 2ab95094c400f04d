//! The phase -> ordered hook list registry.

use crate::phase::Phase;

/// A zero-argument callable registered against a phase.
pub type Hook = Box<dyn Fn() + Send + Sync + 'static>;

/// Maps each phase to the ordered sequence of hooks registered for it.
///
/// Callables run synchronously on the thread driving the phase transition.
pub struct HookRegistry {
    table: Vec<Vec<Hook>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        let mut table = Vec::with_capacity(Phase::COUNT);
        table.resize_with(Phase::COUNT, Vec::new);
        Self { table }
    }

    /// Register `hook` to run the next time `phase` is entered. Hooks run
    /// in registration order.
    pub fn register(&mut self, phase: Phase, hook: impl Fn() + Send + Sync + 'static) {
        self.table[phase.index()].push(Box::new(hook));
    }

    /// Run every hook registered for `phase`, in order.
    pub fn run(&self, phase: Phase) {
        for hook in &self.table[phase.index()] {
            hook();
        }
    }

    /// Number of hooks registered for `phase` (test/diagnostic use).
    pub fn len(&self, phase: Phase) -> usize {
        self.table[phase.index()].len()
    }

    pub fn is_empty(&self, phase: Phase) -> bool {
        self.len(phase) == 0
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
