//! The boundary to the host inspection engine.
//!
//! The engine never owns transactions or phases; it sees them through
//! [`EvalContext`]. A context supplies the current phase, value lists for
//! named fields (which the `field` call aliases), and host operators.
//! [`SimpleContext`] is a self-contained implementation for tests and
//! tooling.

use std::sync::Arc;

use indexmap::IndexMap;
use sieve_core::{Phase, Value, ValueList};

/// A host-registered unary predicate/transformation applied per value.
pub trait HostOperator: Send + Sync {
    /// Apply to one input value; `None` drops it from the output.
    fn apply(&self, input: &Value) -> Option<Value>;
}

impl<F> HostOperator for F
where
    F: Fn(&Value) -> Option<Value> + Send + Sync,
{
    fn apply(&self, input: &Value) -> Option<Value> {
        self(input)
    }
}

/// What the host exposes to one evaluation.
pub trait EvalContext {
    /// Current inspection phase. `None` means no phase is defined, which
    /// forces recalculation on every `eval` (pure-literal evaluation).
    fn phase(&self) -> Option<Phase> {
        None
    }

    /// Handle to the host-owned value list for a named field, if the
    /// field exists yet. The list may keep growing between phases.
    fn field(&self, _name: &str) -> Option<ValueList> {
        None
    }

    /// Whether the field is settled: its list will not grow further, and
    /// if it is absent it will not appear, for the remainder of this
    /// context.
    fn field_is_complete(&self, _name: &str) -> bool {
        false
    }

    /// Host operator registry.
    fn host_operator(&self, _name: &str) -> Option<Arc<dyn HostOperator>> {
        None
    }
}

/// Context with no phase, no fields, no operators. Evaluating under it
/// recalculates on every call; literal-only expressions need nothing
/// more.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullContext;

impl EvalContext for NullContext {}

/// In-memory context for tests and tooling.
pub struct SimpleContext {
    phase: Option<Phase>,
    fields: IndexMap<String, ValueList>,
    fields_complete: bool,
    operators: IndexMap<String, Arc<dyn HostOperator>>,
}

impl SimpleContext {
    pub fn new() -> Self {
        Self {
            phase: None,
            fields: IndexMap::new(),
            fields_complete: true,
            operators: IndexMap::new(),
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Advance to another phase; evaluation will recalculate unfinished
    /// nodes on the next `eval`.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = Some(phase);
    }

    /// Install a field list. The returned handle can be used to append
    /// further values, which aliased nodes observe immediately.
    pub fn insert_field(&mut self, name: impl Into<String>, list: ValueList) -> ValueList {
        let handle = list.clone();
        self.fields.insert(name.into(), list);
        handle
    }

    /// Declare whether field lists may still grow. Defaults to complete.
    pub fn set_fields_complete(&mut self, complete: bool) {
        self.fields_complete = complete;
    }

    pub fn add_operator(
        &mut self,
        name: impl Into<String>,
        operator: impl HostOperator + 'static,
    ) {
        self.operators.insert(name.into(), Arc::new(operator));
    }
}

impl Default for SimpleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext for SimpleContext {
    fn phase(&self) -> Option<Phase> {
        self.phase
    }

    fn field(&self, name: &str) -> Option<ValueList> {
        self.fields.get(name).cloned()
    }

    fn field_is_complete(&self, _name: &str) -> bool {
        self.fields_complete
    }

    fn host_operator(&self, name: &str) -> Option<Arc<dyn HostOperator>> {
        self.operators.get(name).cloned()
    }
}
