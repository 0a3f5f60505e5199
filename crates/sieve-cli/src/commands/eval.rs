//! `sieve eval`: evaluate each root against an in-memory context.

use std::io;

use sieve_core::{Phase, Value, ValueKind, ValueList};
use sieve_lib::{GraphEvalState, Reporter, SimpleContext, parse_literal};

use crate::cli::EvalArgs;
use crate::commands::Session;

pub fn run(args: &EvalArgs) -> i32 {
    let mut session = Session::new();
    if !session.read(io::stdin().lock()) {
        return 1;
    }

    let mut reporter = Reporter::new();
    if let Err(err) = session.analyze(&mut reporter, true) {
        eprint!("{}", reporter.render());
        eprintln!("error: {err}");
        return 1;
    }

    let mut ctx = SimpleContext::new();
    if let Some(phase) = args.phase {
        ctx.set_phase(Phase(phase));
    }
    for spec in &args.fields {
        match parse_field(spec) {
            Ok((name, list)) => {
                ctx.insert_field(name, list);
            }
            Err(message) => {
                eprintln!("error: --field {spec}: {message}");
                return 1;
            }
        }
    }

    let index_limit = session.graph.index_for_evaluation();
    let mut state = GraphEvalState::new(index_limit);

    let roots = session.graph.roots().to_vec();
    for (index, root) in roots.iter().enumerate() {
        let name = session
            .root_names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| session.graph.dag().sexpr(*root));
        match state.eval(session.graph.dag(), *root, &ctx) {
            Ok(values) => {
                let rendered: Vec<String> =
                    values.snapshot().iter().map(Value::sexpr).collect();
                let finished = state
                    .is_finished(session.graph.dag(), *root)
                    .unwrap_or(false);
                println!(
                    "{name}: [{}]{}",
                    rendered.join(" "),
                    if finished { " finished" } else { "" }
                );
            }
            Err(err) => {
                eprintln!("error: evaluating {name}: {err}");
                return 1;
            }
        }
    }
    0
}

/// `NAME=LITERAL`; a list literal contributes one value per element.
fn parse_field(spec: &str) -> Result<(String, ValueList), String> {
    let (name, literal) = spec
        .split_once('=')
        .ok_or_else(|| "expected NAME=LITERAL".to_owned())?;
    let mut pos = 0;
    let value = parse_literal(literal, &mut pos).map_err(|e| e.to_string())?;
    if !literal[pos..].trim().is_empty() {
        return Err("trailing input after literal".to_owned());
    }
    let list = ValueList::new();
    match value {
        None => {}
        Some(v) => match v.kind() {
            ValueKind::List(_) | ValueKind::Dynamic(_) => {
                for item in v.as_list().map_err(|e| e.to_string())? {
                    list.push(item.named(name));
                }
            }
            _ => list.push(v.named(name)),
        },
    }
    Ok((name.to_owned(), list))
}
