use std::fmt::Write;

use itertools::Itertools;

use crate::core::domain::{CheckKind, CheckResult, Outcome, Report};

/// Renders a report as markdown: failed checks first, then passed ones,
/// grouped by language.
pub fn render(report: &Report, script: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Results\n");
    let _ = writeln!(out, "scripts: {}\n", script);

    let _ = writeln!(out, "## Failed\n");
    render_section(&mut out, report, false);

    let _ = writeln!(out, "## Passed\n");
    render_section(&mut out, report, true);

    out
}

fn render_section(out: &mut String, report: &Report, passed: bool) {
    for language in &report.languages {
        let _ = writeln!(out, "### {}\n", language.lang);

        let results = language
            .all_results()
            .filter(|r| r.is_ok() == passed)
            .collect_vec();
        if results.is_empty() {
            continue;
        }

        let _ = writeln!(out, "#### Build results\n");
        for result in results {
            render_result(out, result);
        }
        out.push('\n');
    }
}

fn render_result(out: &mut String, result: &CheckResult) {
    let kind = match result.kind {
        CheckKind::CheckCompile => "check_compile",
        CheckKind::RunTest => "run_test",
    };
    let _ = writeln!(out, "- [{}] `{}`", kind, result.path);

    for outcome in &result.results {
        render_outcome(out, outcome);
    }
}

fn render_outcome(out: &mut String, outcome: &Outcome) {
    let _ = writeln!(
        out,
        "  - {}: {}",
        outcome.option,
        if outcome.ok { "OK" } else { "NG" }
    );
    if outcome.ok {
        return;
    }

    let _ = writeln!(
        out,
        "    - timedout: {}",
        if outcome.timedout { "YES" } else { "NO" }
    );
    render_stream(out, "stdout", &outcome.stdout);
    render_stream(out, "stderr", &outcome.stderr);
}

fn render_stream(out: &mut String, name: &str, content: &str) {
    if content.is_empty() {
        let _ = writeln!(out, "    - {}: (empty)", name);
        return;
    }

    let _ = writeln!(out, "    - {}:", name);
    let block = format!("```\n{}\n```", content.trim_end_matches('\n'));
    let _ = writeln!(out, "{}", block.lines().map(|l| format!("      {}", l)).join("\n"));
}
