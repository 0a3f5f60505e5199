//! Bridge calls to the host inspection engine.
//!
//! `field` exposes a host-owned value list under this node — the alias
//! binding in action: the node takes a read-only view and is finished
//! separately, once the host declares the field settled. `operator`
//! applies a host-registered per-value operator to a stream.

use std::sync::Arc;

use sieve_core::{CoreError, Result};

use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState, HostOperator};
use crate::graph::{
    NodeReporter, validate_literal_string_child, validate_n_children,
};

pub(crate) fn load(factory: &mut CallFactory) {
    factory.add::<Field>().add::<HostOp>();
}

/// Alias of the host's value list for a named field.
#[derive(Default)]
pub struct Field;

fn field_name(dag: &Dag, node: NodeId) -> Result<String> {
    let value = dag
        .children(node)
        .first()
        .and_then(|c| dag.literal_value(*c))
        .and_then(|v| v.as_ref())
        .ok_or_else(|| CoreError::einval("field requires a string literal name"))?;
    Ok(String::from_utf8_lossy(value.as_bytes()?).into_owned())
}

impl Call for Field {
    fn name(&self) -> &str {
        "field"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 1);
        validate_literal_string_child(dag, node, reporter, 0);
    }

    fn eval_calculate(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let name = field_name(dag, node)?;

        if !state.node_state(dag, node)?.is_aliased() {
            match ctx.field(&name) {
                Some(list) => state.node_state_mut(dag, node)?.alias(list)?,
                None => {
                    if ctx.field_is_complete(&name) {
                        // Settled absent: finish empty.
                        return state.node_state_mut(dag, node)?.finish_false();
                    }
                    return Ok(());
                }
            }
        }

        if ctx.field_is_complete(&name) {
            state.node_state_mut(dag, node)?.finish()?;
        }
        Ok(())
    }
}

struct OpScratch {
    consumed: usize,
    operator: Option<Arc<dyn HostOperator>>,
}

/// Apply a host-registered operator to every subvalue of a stream.
#[derive(Default)]
pub struct HostOp;

impl Call for HostOp {
    fn name(&self) -> &str {
        "operator"
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 2);
        validate_literal_string_child(dag, node, reporter, 0);
    }

    fn eval_initialize(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        ctx: &dyn EvalContext,
    ) -> Result<()> {
        let operator = dag
            .children(node)
            .first()
            .and_then(|c| dag.literal_value(*c))
            .and_then(|v| v.as_ref())
            .and_then(|v| v.as_bytes().ok())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .and_then(|name| ctx.host_operator(&name));
        let slot = state.node_state_mut(dag, node)?;
        slot.setup_local_list()?;
        slot.set_scratch(Box::new(OpScratch {
            consumed: 0,
            operator,
        }));
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
        let &[_, input] = children.as_slice() else {
            return Err(CoreError::einval("operator requires exactly 2 children"));
        };

        let input_values = state.eval(dag, input, ctx)?;
        let input_finished = state.is_finished(dag, input)?;

        let (start, operator) = match state.node_state(dag, node)?.scratch::<OpScratch>() {
            Some(scratch) => (scratch.consumed, scratch.operator.clone()),
            None => (0, None),
        };
        let operator =
            operator.ok_or_else(|| CoreError::enoent("unknown host operator"))?;

        let mut produced = Vec::new();
        for i in start..input_values.len() {
            if let Some(value) = input_values.get(i) {
                if let Some(result) = operator.apply(&value) {
                    produced.push(result);
                }
            }
        }

        let slot = state.node_state_mut(dag, node)?;
        if let Some(scratch) = slot.scratch_mut::<OpScratch>() {
            scratch.consumed = input_values.len();
        }
        for value in produced {
            slot.append_to_list(value)?;
        }
        if input_finished {
            slot.finish()?;
        }
        Ok(())
    }
}
