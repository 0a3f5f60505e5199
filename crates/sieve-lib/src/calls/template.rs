//! User-defined macros.
//!
//! A template is a named call with a parameter list and a body
//! expression. Template calls validate their arity and transform into a
//! copy of the body with every `(ref 'param')` subexpression replaced by
//! the corresponding actual child. Bodies are kept as parsed [`Sexpr`]
//! trees: the factory outlives any one graph, so bodies cannot point at
//! arena nodes.
//!
//! `ref` itself is only meaningful inside a body. One that survives into
//! a graph is a validation error and refuses evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use sieve_core::{CoreError, Result};

use crate::dag::{Call, CallFactory, Dag, NodeId};
use crate::eval::{EvalContext, GraphEvalState};
use crate::graph::{MergeGraph, NodeReporter};
use crate::sexpr::Sexpr;

pub(crate) fn load(factory: &mut CallFactory) {
    factory.add::<Ref>();
}

/// A template definition: name, parameters, body.
pub struct TemplateDef {
    name: String,
    params: Vec<String>,
    body: Sexpr,
}

/// Register a template call under its own name. Expressions parsed
/// afterwards may use it like any built-in operator.
pub fn add_template(
    factory: &mut CallFactory,
    name: impl Into<String>,
    params: Vec<String>,
    body: Sexpr,
) {
    let def = Arc::new(TemplateDef {
        name: name.into(),
        params,
        body,
    });
    let registered = def.name.clone();
    factory.add_generator(registered, move || {
        Arc::new(Template { def: def.clone() }) as Arc<dyn Call>
    });
}

struct Template {
    def: Arc<TemplateDef>,
}

impl Call for Template {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn validate(&self, dag: &Dag, node: NodeId, reporter: &mut NodeReporter<'_>) {
        let expected = self.def.params.len();
        let actual = dag.children(node).len();
        if actual != expected {
            reporter.error(format!(
                "template `{}` expects {expected} argument(s), have {actual}",
                self.def.name
            ));
        }
    }

    fn transform(
        &self,
        node: NodeId,
        graph: &mut MergeGraph,
        factory: &CallFactory,
        _reporter: &mut NodeReporter<'_>,
    ) -> Result<bool> {
        let actuals = graph.dag().children(node).to_vec();
        if actuals.len() != self.def.params.len() {
            // Arity mismatch is a validation error; expanding would only
            // obscure it.
            return Ok(false);
        }
        let bindings: HashMap<&str, NodeId> = self
            .def
            .params
            .iter()
            .map(String::as_str)
            .zip(actuals)
            .collect();
        let built = instantiate(&self.def.body, graph, factory, &bindings)?;
        graph.replace(node, built)?;
        Ok(true)
    }

    fn eval_calculate(
        &self,
        _dag: &Dag,
        _node: NodeId,
        _state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        Err(CoreError::eval_state(
            "template call evaluated; transformation must run first",
        ))
    }
}

/// Build the body into graph nodes, substituting refs by actual
/// children. Actual nodes are shared, not copied: a parameter used
/// twice becomes a shared subexpression.
fn instantiate(
    body: &Sexpr,
    graph: &mut MergeGraph,
    factory: &CallFactory,
    bindings: &HashMap<&str, NodeId>,
) -> Result<NodeId> {
    if let Some(param) = ref_param(body) {
        return bindings.get(param).copied().ok_or_else(|| {
            CoreError::einval(format!("reference to unknown template argument `{param}`"))
        });
    }
    match body {
        Sexpr::Literal(value) => Ok(graph.literal(value.clone())),
        Sexpr::Call { name, children } => {
            let node = graph.create_call(name, factory)?;
            for child in children {
                let built = instantiate(child, graph, factory, bindings)?;
                graph.add_child(node, built)?;
            }
            Ok(node)
        }
    }
}

/// Matches `(ref 'param')`, returning the parameter name.
fn ref_param(sexpr: &Sexpr) -> Option<&str> {
    let Sexpr::Call { name, children } = sexpr else {
        return None;
    };
    if name != "ref" || children.len() != 1 {
        return None;
    }
    let Sexpr::Literal(Some(value)) = &children[0] else {
        return None;
    };
    std::str::from_utf8(value.as_bytes().ok()?).ok()
}

/// Placeholder for a template argument; legal only inside bodies.
#[derive(Default)]
pub struct Ref;

impl Call for Ref {
    fn name(&self) -> &str {
        "ref"
    }

    fn validate(&self, _dag: &Dag, _node: NodeId, reporter: &mut NodeReporter<'_>) {
        reporter.error("ref must appear inside a template body");
    }

    fn eval_calculate(
        &self,
        _dag: &Dag,
        _node: NodeId,
        _state: &mut GraphEvalState,
        _ctx: &dyn EvalContext,
    ) -> Result<()> {
        Err(CoreError::eval_state(
            "ref node evaluated; only legal inside a template body",
        ))
    }
}
