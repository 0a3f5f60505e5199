//! Arithmetic operators.
//!
//! `add`/`mult` map a settled numeric constant over a value stream;
//! `neg`/`recip` are unary maps. A number-number combination stays a
//! number, anything involving a float is a float, and non-numeric
//! subvalues pass through unchanged. `max`/`min` fold their whole input,
//! producing a single value once the input finishes.

use std::cmp::Ordering;
use std::sync::Arc;

use sieve_core::{CoreError, Result, Value, ValueKind};

use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState};
use crate::graph::{NodeReporter, validate_n_children};

pub(crate) fn load(factory: &mut CallFactory) {
    for op in MapOp::ALL {
        let shared: Arc<dyn Call> = Arc::new(MathMap { op });
        factory.add_generator(op.name(), move || shared.clone());
    }
    for op in FoldOp::ALL {
        let shared: Arc<dyn Call> = Arc::new(MathFold { op });
        factory.add_generator(op.name(), move || shared.clone());
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum MapOp {
    Add,
    Mult,
    Neg,
    Recip,
}

impl MapOp {
    const ALL: [MapOp; 4] = [MapOp::Add, MapOp::Mult, MapOp::Neg, MapOp::Recip];

    fn name(self) -> &'static str {
        match self {
            MapOp::Add => "add",
            MapOp::Mult => "mult",
            MapOp::Neg => "neg",
            MapOp::Recip => "recip",
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, MapOp::Add | MapOp::Mult)
    }
}

struct MapScratch {
    consumed: usize,
}

/// Per-value arithmetic map.
pub struct MathMap {
    op: MapOp,
}

impl MathMap {
    fn apply(&self, constant: Option<&Value>, value: &Value) -> Result<Value> {
        let renamed = |v: Value| match value.name() {
            Some(name) => v.named(name),
            None => v,
        };
        match self.op {
            MapOp::Add | MapOp::Mult => {
                let constant =
                    constant.ok_or_else(|| CoreError::einval("missing constant argument"))?;
                match (constant.kind(), value.kind()) {
                    (ValueKind::Number(a), ValueKind::Number(b)) => {
                        let n = match self.op {
                            MapOp::Add => a + b,
                            _ => a * b,
                        };
                        Ok(renamed(Value::number(n)))
                    }
                    (
                        ValueKind::Number(_) | ValueKind::Float(_),
                        ValueKind::Number(_) | ValueKind::Float(_),
                    ) => {
                        let a = constant.as_float()?;
                        let b = value.as_float()?;
                        let f = match self.op {
                            MapOp::Add => a + b,
                            _ => a * b,
                        };
                        Ok(renamed(Value::float(f)))
                    }
                    (ValueKind::Number(_) | ValueKind::Float(_), _) => Ok(value.clone()),
                    _ => Err(CoreError::einval(format!(
                        "value {constant} is not numeric"
                    ))),
                }
            }
            MapOp::Neg => match value.kind() {
                ValueKind::Number(n) => Ok(renamed(Value::number(-n))),
                ValueKind::Float(f) => Ok(renamed(Value::float(-f))),
                _ => Ok(value.clone()),
            },
            MapOp::Recip => match value.kind() {
                ValueKind::Number(_) | ValueKind::Float(_) => {
                    Ok(renamed(Value::float(1.0 / value.as_float()?)))
                }
                _ => Ok(value.clone()),
            },
        }
    }
}

impl Call for MathMap {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        if self.op.is_binary() {
            validate_n_children(dag, node, reporter, 2);
            if let Some(Some(v)) = dag
                .children(node)
                .first()
                .and_then(|c| dag.literal_value(*c))
            {
                if v.as_float().is_err() {
                    reporter.error(format!("value {v} is not numeric"));
                }
            }
        } else {
            validate_n_children(dag, node, reporter, 1);
        }
    }

    fn eval_initialize(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        let slot = state.node_state_mut(dag, node)?;
        slot.setup_local_list()?;
        slot.set_scratch(Box::new(MapScratch { consumed: 0 }));
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
        let (constant, input) = if self.op.is_binary() {
            let &[constant, input] = children.as_slice() else {
                return Err(CoreError::einval("expected exactly 2 children"));
            };
            (Some(constant), input)
        } else {
            let &[input] = children.as_slice() else {
                return Err(CoreError::einval("expected exactly 1 child"));
            };
            (None, input)
        };

        let constant_value = match constant {
            Some(constant) => {
                state.eval(dag, constant, ctx)?;
                if !state.is_finished(dag, constant)? {
                    return Ok(());
                }
                state.values(dag, constant)?.first()
            }
            None => None,
        };
        if self.op.is_binary() && constant_value.is_none() {
            // A settled empty constant maps nothing, ever.
            return state.node_state_mut(dag, node)?.finish();
        }

        let input_values = state.eval(dag, input, ctx)?;
        let input_finished = state.is_finished(dag, input)?;

        let start = state
            .node_state(dag, node)?
            .scratch::<MapScratch>()
            .map_or(0, |s| s.consumed);
        let mut produced = Vec::new();
        for i in start..input_values.len() {
            if let Some(value) = input_values.get(i) {
                produced.push(self.apply(constant_value.as_ref(), &value)?);
            }
        }

        let slot = state.node_state_mut(dag, node)?;
        if let Some(scratch) = slot.scratch_mut::<MapScratch>() {
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

#[derive(Clone, Copy, PartialEq, Eq)]
enum FoldOp {
    Max,
    Min,
}

impl FoldOp {
    const ALL: [FoldOp; 2] = [FoldOp::Max, FoldOp::Min];

    fn name(self) -> &'static str {
        match self {
            FoldOp::Max => "max",
            FoldOp::Min => "min",
        }
    }

    fn keeps(self, ordering: Ordering) -> bool {
        match self {
            FoldOp::Max => ordering == Ordering::Greater,
            FoldOp::Min => ordering == Ordering::Less,
        }
    }
}

struct FoldScratch {
    consumed: usize,
    best: Option<Value>,
}

/// Whole-stream reduction producing one value once the input settles.
pub struct MathFold {
    op: FoldOp,
}

impl Call for MathFold {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        validate_n_children(dag, node, reporter, 1);
    }

    fn eval_initialize(
        &self,
        dag: &Dag,
        node: NodeId,
        state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        let slot = state.node_state_mut(dag, node)?;
        slot.setup_local_list()?;
        slot.set_scratch(Box::new(FoldScratch {
            consumed: 0,
            best: None,
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
        let input = dag.children(node)[0];
        let input_values = state.eval(dag, input, ctx)?;
        let input_finished = state.is_finished(dag, input)?;

        let (start, mut best) = match state.node_state(dag, node)?.scratch::<FoldScratch>() {
            Some(scratch) => (scratch.consumed, scratch.best.clone()),
            None => (0, None),
        };
        for i in start..input_values.len() {
            if let Some(value) = input_values.get(i) {
                best = match best {
                    None => Some(value),
                    Some(current) => {
                        if self.op.keeps(value.try_cmp(&current)?) {
                            Some(value)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
        }

        let slot = state.node_state_mut(dag, node)?;
        if let Some(scratch) = slot.scratch_mut::<FoldScratch>() {
            scratch.consumed = input_values.len();
            scratch.best = best.clone();
        }
        if input_finished {
            if let Some(best) = best {
                slot.append_to_list(best)?;
            }
            slot.finish()?;
        }
        Ok(())
    }
}
