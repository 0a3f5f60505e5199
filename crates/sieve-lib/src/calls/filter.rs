//! Streaming value filters.
//!
//! Every filter takes a comparison value and a value stream: once the
//! comparison value settles, each new subvalue of the stream is tested
//! and appended on a match. The filter finishes exactly when its input
//! does. A cursor in the node's scratch state remembers how much of the
//! input was already examined, so each subvalue is tested once no matter
//! how many phases the stream spans.

use std::cmp::Ordering;
use std::sync::Arc;

use regex_automata::meta::Regex;
use sieve_core::{CoreError, Result, Value};

use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState};
use crate::graph::{
    NodeReporter, validate_literal_string_child, validate_n_children,
};

pub(crate) fn load(factory: &mut CallFactory) {
    for op in FilterOp::ALL {
        let shared: Arc<dyn Call> = Arc::new(Filter { op });
        factory.add_generator(op.name(), move || shared.clone());
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Named,
    NamedI,
    NamedRx,
}

impl FilterOp {
    const ALL: [FilterOp; 9] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Lt,
        FilterOp::Le,
        FilterOp::Gt,
        FilterOp::Ge,
        FilterOp::Named,
        FilterOp::NamedI,
        FilterOp::NamedRx,
    ];

    fn name(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Le => "le",
            FilterOp::Gt => "gt",
            FilterOp::Ge => "ge",
            FilterOp::Named => "named",
            FilterOp::NamedI => "namedi",
            FilterOp::NamedRx => "namedRx",
        }
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            FilterOp::Lt | FilterOp::Le | FilterOp::Gt | FilterOp::Ge
        )
    }

    fn is_name_match(self) -> bool {
        matches!(self, FilterOp::Named | FilterOp::NamedI | FilterOp::NamedRx)
    }
}

struct FilterScratch {
    consumed: usize,
    regex: Option<Regex>,
}

/// One of the standard filters; which one is fixed at registration.
pub struct Filter {
    op: FilterOp,
}

impl Filter {
    fn matches(&self, scratch: &FilterScratch, needle: &Value, value: &Value) -> Result<bool> {
        match self.op {
            FilterOp::Eq => Ok(value.eq_value(needle)),
            FilterOp::Ne => Ok(!value.eq_value(needle)),
            FilterOp::Lt => Ok(value.try_cmp(needle)? == Ordering::Less),
            FilterOp::Le => Ok(value.try_cmp(needle)? != Ordering::Greater),
            FilterOp::Gt => Ok(value.try_cmp(needle)? == Ordering::Greater),
            FilterOp::Ge => Ok(value.try_cmp(needle)? != Ordering::Less),
            FilterOp::Named => {
                let wanted = needle.as_bytes()?;
                Ok(value.name().is_some_and(|n| n.as_bytes() == wanted))
            }
            FilterOp::NamedI => {
                let wanted = needle.as_bytes()?;
                Ok(value
                    .name()
                    .is_some_and(|n| n.as_bytes().eq_ignore_ascii_case(wanted)))
            }
            FilterOp::NamedRx => {
                let regex = scratch.regex.as_ref().ok_or_else(|| {
                    CoreError::einval("namedRx requires a string literal pattern")
                })?;
                Ok(value.name().is_some_and(|n| regex.is_match(n)))
            }
        }
    }
}

impl Call for Filter {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 2);
        let needle = dag
            .children(node)
            .first()
            .and_then(|c| dag.literal_value(*c));
        if self.op.is_name_match() {
            if let Some(pattern) = validate_literal_string_child(dag, node, reporter, 0) {
                if self.op == FilterOp::NamedRx && Regex::new(&pattern).is_err() {
                    reporter.error(format!("could not compile regex `{pattern}`"));
                }
            }
        } else if self.op.is_ordering() {
            // A literal bound must be numeric; dynamic bounds are checked
            // at evaluation time.
            if let Some(Some(v)) = needle {
                if v.as_float().is_err() {
                    reporter.error(format!("value {v} is not numeric"));
                }
            }
        }
    }

    fn eval_initialize(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        let regex = if self.op == FilterOp::NamedRx {
            let pattern = dag
                .children(node)
                .first()
                .and_then(|c| dag.literal_value(*c))
                .and_then(|v| v.as_ref())
                .and_then(|v| v.as_bytes().ok().map(|b| b.to_vec()));
            match pattern {
                Some(bytes) => {
                    let pattern = String::from_utf8_lossy(&bytes).into_owned();
                    Some(Regex::new(&pattern).map_err(|e| {
                        CoreError::einval(format!("could not compile regex `{pattern}`: {e}"))
                    })?)
                }
                None => None,
            }
        } else {
            None
        };
        let slot = state.node_state_mut(dag, node)?;
        slot.setup_local_list()?;
        slot.set_scratch(Box::new(FilterScratch { consumed: 0, regex }));
        Ok(())
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let children = dag.children(node).to_vec();
        let &[needle, input] = children.as_slice() else {
            return Err(CoreError::einval("filter requires exactly 2 children"));
        };

        state.eval(dag, needle, ctx)?;
        if !state.is_finished(dag, needle)? {
            // No comparison value yet; try again next phase.
            return Ok(());
        }
        let needle_value = state.values(dag, needle)?.first();

        let input_values = state.eval(dag, input, ctx)?;
        let input_finished = state.is_finished(dag, input)?;

        let mut matched = Vec::new();
        {
            let slot = state.node_state(dag, node)?;
            let scratch = slot
                .scratch::<FilterScratch>()
                .ok_or_else(|| CoreError::eval_state("filter state missing"))?;
            if let Some(needle_value) = &needle_value {
                for i in scratch.consumed..input_values.len() {
                    if let Some(value) = input_values.get(i) {
                        if self.matches(scratch, needle_value, &value)? {
                            matched.push(value);
                        }
                    }
                }
            }
        }

        let slot = state.node_state_mut(dag, node)?;
        if let Some(scratch) = slot.scratch_mut::<FilterScratch>() {
            scratch.consumed = input_values.len();
        }
        for value in matched {
            slot.append_to_list(value)?;
        }
        if needle_value.is_none() || input_finished {
            slot.finish()?;
        }
        Ok(())
    }
}
