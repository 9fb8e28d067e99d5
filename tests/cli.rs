#![cfg(feature = "boa")]

use assert_cmd::Command;
use predicates::prelude::*;

const STUB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/stub_mathjax.js");

fn d2latex() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_d2latex"));
    cmd.env_remove("D2LATEX_MATHJAX_JS").env_remove("D2LATEX_PROCESS_WORKER");
    cmd
}

#[test]
fn measure_prints_width_and_height() {
    d2latex()
        .args(["--mathjax", STUB, "measure", r"\size{10.5}{2}"])
        .assert()
        .success()
        .stdout("84 16\n");
}

#[test]
fn measure_json_output() {
    d2latex()
        .args(["measure", "--json", r"\size{1}{3}", "--mathjax", STUB])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""width":8"#).and(predicate::str::contains(r#""height":24"#)),
        );
}

#[test]
fn render_reads_stdin() {
    d2latex()
        .args(["--mathjax", STUB, "render", "-"])
        .write_stdin("x^2\n")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("<svg").and(predicate::str::contains(r#"data-latex="x^2""#)),
        );
}

#[test]
fn render_through_process_worker() {
    d2latex()
        .args(["--mathjax", STUB, "--process-worker", "render", r"\alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"data-mml-node="math""#));
}

#[test]
fn failures_exit_nonzero_with_marker() {
    d2latex()
        .args(["--mathjax", STUB, "measure", r"\nosize"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latex failed to parse"));
}

#[cfg(not(feature = "bundled-mathjax"))]
#[test]
fn missing_bundle_is_reported() {
    d2latex()
        .args(["render", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("typesetting bundle"));
}
