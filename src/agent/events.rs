//! Turn observer plumbing.
//!
//! The engine reports progress through [`TurnObserver`] so presentation stays
//! outside the control loop. Callbacks run synchronously, in stream arrival
//! order, and must not block.

/// Receives incremental progress of one turn.
pub trait TurnObserver {
    /// A fragment of assistant text arrived.
    fn on_text_delta(&mut self, delta: &str);

    /// The model announced a call to `name`. Reported once per name per turn.
    fn on_tool_name(&mut self, name: &str);
}

/// Observer built from two closures.
pub struct FnObserver<D, T> {
    on_delta: D,
    on_tool: T,
}

impl<D, T> FnObserver<D, T>
where
    D: FnMut(&str),
    T: FnMut(&str),
{
    pub fn new(on_delta: D, on_tool: T) -> Self {
        Self { on_delta, on_tool }
    }
}

impl<D, T> TurnObserver for FnObserver<D, T>
where
    D: FnMut(&str),
    T: FnMut(&str),
{
    fn on_text_delta(&mut self, delta: &str) {
        (self.on_delta)(delta);
    }

    fn on_tool_name(&mut self, name: &str) {
        (self.on_tool)(name);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_text_delta(&mut self, _delta: &str) {}

    fn on_tool_name(&mut self, _name: &str) {}
}
