//! Shared growable value lists.
//!
//! A [`ValueList`] is the unit of exchange between a node's evaluation
//! state and its consumers: local bindings own one, aliased bindings hold a
//! handle to one owned elsewhere (typically the host's field store).
//! Handles are cheap to clone and append-only; values are never changed or
//! removed once pushed, so iteration positions stay valid across appends.
//!
//! Evaluation contexts are strictly single-threaded (one `GraphEvalState`
//! per context, one thread per context), so the handle is `Rc`-based.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Value;

/// Append-only list of values shared by handle.
#[derive(Clone, Default)]
pub struct ValueList {
    inner: Rc<RefCell<Vec<Value>>>,
}

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(values)),
        }
    }

    pub fn push(&self, value: Value) {
        self.inner.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.borrow().get(index).cloned()
    }

    /// First value, if any.
    pub fn first(&self) -> Option<Value> {
        self.get(0)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<Value> {
        self.inner.borrow().clone()
    }

    /// Visit every value currently in the list.
    pub fn for_each(&self, mut f: impl FnMut(&Value)) {
        for value in self.inner.borrow().iter() {
            f(value);
        }
    }

    /// Two handles to the same underlying list?
    pub fn ptr_eq(&self, other: &ValueList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ValueList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}
