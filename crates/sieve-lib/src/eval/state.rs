//! Evaluation state of a single node.
//!
//! A node binds its value in exactly one of three ways:
//!
//! 1. **Local** — set up an owned list once, then append values and
//!    finish when no more will come.
//! 2. **Forwarded** — delegate values and finished state to another node.
//!    Useful for nodes that *conditionally* take on a child's values;
//!    nodes that do so unconditionally should transform into the child
//!    instead. Chains are permitted but should stay short.
//! 3. **Aliased** — expose a read-only view of a list owned elsewhere
//!    (typically host data). The node is still finished separately, once
//!    the external list is known to be complete.
//!
//! Every illegal transition — mixing binding modes, appending before
//! setup, mutating after finish — is rejected with an
//! [`EvalState`](sieve_core::CoreError::EvalState) error: these indicate a
//! bug in a call implementation, not bad user input.

use std::any::Any;

use sieve_core::{CoreError, Phase, Result, Value, ValueList};

use crate::dag::NodeId;

/// How a node's value is bound.
#[derive(Debug, Clone, Default)]
pub enum Binding {
    #[default]
    Unbound,
    Local(ValueList),
    Forwarded(NodeId),
    Aliased(ValueList),
}

/// Mutable per-context state of one node.
#[derive(Default)]
pub struct NodeEvalState {
    binding: Binding,
    finished: bool,
    phase: Option<Phase>,
    initialized: bool,
    scratch: Option<Box<dyn Any>>,
}

impl NodeEvalState {
    /// Set up an owned value list. Must precede
    /// [`append_to_list`](Self::append_to_list); does nothing on
    /// subsequent calls.
    pub fn setup_local_list(&mut self) -> Result<()> {
        match self.binding {
            Binding::Local(_) => Ok(()),
            Binding::Unbound => {
                self.binding = Binding::Local(ValueList::new());
                Ok(())
            }
            Binding::Forwarded(_) => Err(CoreError::eval_state(
                "cannot set up local values on a forwarded node",
            )),
            Binding::Aliased(_) => Err(CoreError::eval_state(
                "cannot set up local values on an aliased node",
            )),
        }
    }

    /// Append a value to the local list.
    pub fn append_to_list(&mut self, value: Value) -> Result<()> {
        if self.finished {
            return Err(CoreError::eval_state("cannot add a value to a finished node"));
        }
        match &self.binding {
            Binding::Local(list) => {
                list.push(value);
                Ok(())
            }
            Binding::Unbound => Err(CoreError::eval_state(
                "cannot add a value before setting up the local list",
            )),
            Binding::Forwarded(_) => {
                Err(CoreError::eval_state("cannot add a value to a forwarded node"))
            }
            Binding::Aliased(_) => {
                Err(CoreError::eval_state("cannot add a value to an aliased node"))
            }
        }
    }

    /// Mark the node finished: its values are final for this context.
    pub fn finish(&mut self) -> Result<()> {
        if matches!(self.binding, Binding::Forwarded(_)) {
            return Err(CoreError::eval_state("cannot finish a forwarded node"));
        }
        if self.finished {
            return Err(CoreError::eval_state(
                "cannot finish an already finished node",
            ));
        }
        self.finished = true;
        Ok(())
    }

    /// Finish with a single truthy value (the empty string).
    pub fn finish_true(&mut self) -> Result<()> {
        self.setup_local_list()?;
        self.append_to_list(Value::string(""))?;
        self.finish()
    }

    /// Finish with no values at all.
    pub fn finish_false(&mut self) -> Result<()> {
        self.setup_local_list()?;
        self.finish()
    }

    /// Delegate values and finished state to `to`. Only legal while
    /// unbound and unfinished.
    pub fn forward(&mut self, to: NodeId) -> Result<()> {
        if self.finished {
            return Err(CoreError::eval_state("cannot forward a finished node"));
        }
        match self.binding {
            Binding::Unbound => {
                self.binding = Binding::Forwarded(to);
                Ok(())
            }
            Binding::Forwarded(_) => {
                Err(CoreError::eval_state("cannot forward an already forwarded node"))
            }
            Binding::Aliased(_) => Err(CoreError::eval_state("cannot forward an aliased node")),
            Binding::Local(_) => Err(CoreError::eval_state(
                "cannot forward a node with local values",
            )),
        }
    }

    /// Take a read-only view of an externally owned list. Only legal
    /// while unbound and unfinished. The caller guarantees the list only
    /// grows; finish separately once it is complete.
    pub fn alias(&mut self, list: ValueList) -> Result<()> {
        if self.finished {
            return Err(CoreError::eval_state("cannot alias a finished node"));
        }
        match self.binding {
            Binding::Unbound => {
                self.binding = Binding::Aliased(list);
                Ok(())
            }
            Binding::Forwarded(_) => Err(CoreError::eval_state("cannot alias a forwarded node")),
            Binding::Aliased(_) => {
                Err(CoreError::eval_state("cannot alias an already aliased node"))
            }
            Binding::Local(_) => {
                Err(CoreError::eval_state("cannot alias a node with local values"))
            }
        }
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_forwarding(&self) -> bool {
        matches!(self.binding, Binding::Forwarded(_))
    }

    pub fn is_aliased(&self) -> bool {
        matches!(self.binding, Binding::Aliased(_))
    }

    pub fn forwarded_to(&self) -> Option<NodeId> {
        match self.binding {
            Binding::Forwarded(to) => Some(to),
            _ => None,
        }
    }

    /// Last phase this node was calculated at.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Option<Phase>) {
        self.phase = phase;
    }

    /// Current values. `None` while unbound; not meaningful while
    /// forwarding (resolve through the graph state instead).
    pub fn values(&self) -> Option<ValueList> {
        match &self.binding {
            Binding::Local(list) | Binding::Aliased(list) => Some(list.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Per-context scratch state for the owning call implementation.
    /// Good practice is to set it up in `eval_initialize`.
    pub fn set_scratch(&mut self, scratch: Box<dyn Any>) {
        self.scratch = Some(scratch);
    }

    pub fn scratch_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.scratch.as_mut()?.downcast_mut()
    }

    pub fn scratch<T: 'static>(&self) -> Option<&T> {
        self.scratch.as_ref()?.downcast_ref()
    }
}
