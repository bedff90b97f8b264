//! Report formatting and printing utilities.
//!
//! Descriptors and the service summary go to stdout; compile errors are
//! printed cargo-style to stderr.

use std::{
    collections::BTreeSet,
    io::{self, Write},
};

use colored::Colorize;

use super::run::{BuildSummary, CommandResult};
use crate::{config::CONFIG_FILE_NAME, pipeline::ClassFailure};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

pub fn print(result: &CommandResult) {
    match result {
        CommandResult::Build(summary) => {
            print_build_to(summary, &mut io::stdout().lock());
            print_failures_to(summary, &mut io::stderr().lock());
        }
        CommandResult::Init => {
            let _ = writeln!(
                io::stdout().lock(),
                "{} {}",
                SUCCESS_MARK.green(),
                format!("Created {}", CONFIG_FILE_NAME).green()
            );
        }
    }
}

/// Print descriptors (unless written to disk) and the service summary.
pub fn print_build_to<W: Write>(summary: &BuildSummary, writer: &mut W) {
    let output = &summary.output;
    if output.aborted {
        return;
    }

    match &summary.written_to {
        Some(dir) => {
            let _ = writeln!(
                writer,
                "{} {}",
                SUCCESS_MARK.green(),
                format!(
                    "Wrote {} {} to {}",
                    output.descriptors.len(),
                    plural(output.descriptors.len(), "descriptor", "descriptors"),
                    dir.display()
                )
                .green()
            );
        }
        None => {
            for descriptor in &output.descriptors {
                let _ = writeln!(writer, "{}", format!("# {}", descriptor.class).dimmed());
                let _ = write!(writer, "{}", descriptor.text);
                let _ = writeln!(writer);
            }
        }
    }

    print_services(writer, "Import-Service", &output.services.imported);
    print_services(writer, "Export-Service", &output.services.exported);
}

fn print_services<W: Write>(writer: &mut W, header: &str, names: &BTreeSet<String>) {
    if names.is_empty() {
        return;
    }
    let joined = names.iter().map(String::as_str).collect::<Vec<_>>().join(",");
    let _ = writeln!(writer, "{}: {}", header.bold(), joined);
}

/// Print every failure, then a one-line summary.
pub fn print_failures_to<W: Write>(summary: &BuildSummary, writer: &mut W) {
    let output = &summary.output;
    if output.failures.is_empty() {
        return;
    }

    for failure in &output.failures {
        print_failure(failure, writer);
    }

    let message = if output.aborted {
        format!(
            "build aborted after {} failed (use {} to compile the remaining classes)",
            output.failures[0].class,
            "--continue-on-error".cyan()
        )
    } else {
        format!(
            "{} of {} {} failed",
            output.failures.len(),
            summary.records,
            plural(summary.records, "class", "classes")
        )
    };
    let _ = writeln!(writer, "{} {}", FAILURE_MARK.red(), message);
}

fn print_failure<W: Write>(failure: &ClassFailure, writer: &mut W) {
    let error = &failure.error;
    let _ = writeln!(
        writer,
        "{}: {}",
        format!("error[{}]", error.kind()).bold().red(),
        error.message()
    );
    let _ = writeln!(writer, "  {} {}", "-->".blue(), error.site());
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::{
        core::scan::parse_records,
        pipeline::{BuildSettings, compile_all},
    };

    fn render(json: &str, continue_on_error: bool) -> (String, String) {
        colored::control::set_override(false);
        let records = parse_records(json).unwrap();
        let settings = BuildSettings {
            continue_on_error,
            ..Default::default()
        };
        let summary = BuildSummary {
            output: compile_all(&records, &settings),
            records: records.len(),
            written_to: None,
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        print_build_to(&summary, &mut out);
        print_failures_to(&summary, &mut err);
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_prints_descriptors_and_services() {
        let (out, err) = render(
            r#"{ "name": "a.Impl", "interfaces": ["a.Api"],
                 "members": [{ "kind": "field", "name": "log", "signature": "La/Log;",
                               "annotations": [{ "kind": "ServiceDependency" }] }],
                 "annotations": [{ "kind": "Component" }] }"#,
            false,
        );
        assert_snapshot!(out, @r#"
        # a.Impl
        Component impl="a.Impl" provides="a.Api"
        ServiceDependency service="a.Log" autoConfig="log"

        Import-Service: a.Log
        Export-Service: a.Api
        "#);
        assert_eq!(err, "");
    }

    #[test]
    fn test_prints_failures() {
        let (out, err) = render(
            r#"[{ "name": "a.Broken", "annotations": [{ "kind": "AspectService" }] },
                { "name": "a.Ok", "annotations": [{ "kind": "Component" }] }]"#,
            true,
        );
        assert_snapshot!(out, @r#"
        # a.Ok
        Component impl="a.Ok"
        "#);
        assert_snapshot!(err, @r"
        error[value]: missing ranking attribute
          --> class a.Broken, @AspectService
        ✘ 1 of 2 classes failed
        ");
    }
}
