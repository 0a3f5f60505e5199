//! `sieve dot`: render the merged graph as Graphviz source.

use std::collections::HashMap;
use std::io;

use sieve_lib::graph::escape_label;
use sieve_lib::{Report, Reporter, Severity, to_dot};

use crate::cli::DotArgs;
use crate::commands::Session;

pub fn run(args: &DotArgs) -> i32 {
    let mut session = Session::new();
    if !session.read(io::stdin().lock()) {
        return 1;
    }

    let mut reporter = Reporter::new();
    if !args.parse_only {
        if let Err(err) = session.analyze(&mut reporter, !args.no_post_validate) {
            eprint!("{}", reporter.render());
            eprintln!("error: {err}");
            return 1;
        }
    }

    // Findings keyed by node sexpr; attached to the matching node below.
    let mut findings: HashMap<String, Vec<Report>> = HashMap::new();
    for report in reporter.reports() {
        findings
            .entry(report.subject.clone())
            .or_default()
            .push(report.clone());
    }

    let graph = &session.graph;
    let root_names = &session.root_names;
    let dot = to_dot(graph, |dag, node| {
        let mut lines = Vec::new();
        if let Ok(indices) = graph.root_indices(node) {
            for index in indices {
                if let Some(name) = root_names.get(index) {
                    lines.push(name.clone());
                }
            }
        }
        lines.push(dag.label(node));
        let sexpr = dag.sexpr(node);
        let mut worst: Option<Severity> = None;
        if let Some(reports) = findings.get(&sexpr) {
            for report in reports {
                lines.push(format!("{}: {}", report.severity, report.message));
                if report.severity == Severity::Error || worst.is_none() {
                    worst = Some(report.severity);
                }
            }
        }
        let label = lines
            .iter()
            .map(|line| escape_label(line))
            .collect::<Vec<_>>()
            .join("\\n");
        match worst {
            Some(Severity::Error) => format!("label=\"{label}\", color=red"),
            Some(Severity::Warning) => format!("label=\"{label}\", color=orange"),
            None => format!("label=\"{label}\""),
        }
    });
    print!("{dot}");
    0
}
