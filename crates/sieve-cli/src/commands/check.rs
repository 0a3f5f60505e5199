//! `sieve check`: parse, validate, transform, and report.

use std::io;

use sieve_lib::{Reporter, Severity};

use crate::cli::CheckArgs;

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    severity: &'a str,
    subject: &'a str,
    message: &'a str,
}

pub fn run(args: &CheckArgs) -> i32 {
    let mut session = crate::commands::Session::new();
    if !session.read(io::stdin().lock()) {
        return 1;
    }

    let mut reporter = Reporter::new();
    let outcome = session.analyze(&mut reporter, true);

    if args.json {
        let reports: Vec<JsonReport<'_>> = reporter
            .reports()
            .iter()
            .map(|r| JsonReport {
                severity: match r.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                subject: &r.subject,
                message: &r.message,
            })
            .collect();
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: serializing reports: {err}");
                return 1;
            }
        }
    } else {
        print!("{}", reporter.render());
    }

    match outcome {
        Ok(()) => {
            if !args.json {
                println!(
                    "ok: {} root(s), {} node(s) known",
                    session.graph.size(),
                    session.graph.known_size()
                );
            }
            0
        }
        Err(err) => {
            if !args.json {
                eprintln!("error: {err}");
            }
            1
        }
    }
}
