use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn sloth() -> Command {
    Command::cargo_bin("sloth").expect("binary exists")
}

#[test]
fn sloth_run_fibonacci() {
    let mut cmd = sloth();
    cmd.arg("run").arg("demos/fib.sloth");
    cmd.assert().success().stdout("89\n");
}

#[test]
fn sloth_run_links_libraries() {
    let mut cmd = sloth();
    cmd.arg("run")
        .arg("demos/app.sloth")
        .arg("--lib")
        .arg("demos/mathlib.sloth");
    cmd.assert().success().stdout("19\n");
}

#[test]
fn sloth_run_without_library_fails_on_missing_function() {
    let mut cmd = sloth();
    cmd.arg("run").arg("demos/app.sloth");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("NameError"))
        .stderr(predicate::str::contains("bigger"));
}

#[test]
fn sloth_run_respects_call_depth_limit() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("deep.sloth");
    fs::write(
        &script,
        "def down(n) do\n  return down(n + 1);\nend;\nreturn down(0);\n",
    )
    .expect("write script");

    let mut cmd = sloth();
    cmd.arg("run").arg(&script).arg("--max-call-depth").arg("16");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("ResourceExhausted"));
}

#[test]
fn sloth_eval_snippet() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("return 2 + 3 * 4;");
    cmd.assert().success().stdout("14\n");
}

#[test]
fn sloth_eval_print_host_function() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("print(\"sum\", 1 + 2); return len(\"abc\");");
    cmd.assert().success().stdout("sum 3\n3\n");
}

#[test]
fn sloth_eval_reports_runtime_error() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("x = 1;\ny = x / 0;");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("ArithmeticError"))
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn sloth_eval_reports_syntax_error() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("x = = 1;");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("SyntaxError"));
}

#[test]
fn sloth_tokens_lists_tagged_tokens() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("tiny.sloth");
    fs::write(&script, "x = (-1);\n").expect("write script");

    let mut cmd = sloth();
    cmd.arg("tokens").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("<id:x>"))
        .stdout(predicate::str::contains("<num:-1>"))
        .stdout(predicate::str::contains("<eof>"));
}

#[test]
fn sloth_ast_prints_tree() {
    let mut cmd = sloth();
    cmd.arg("ast").arg("demos/mathlib.sloth");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("(<def>bigger(x y)=>"))
        .stdout(predicate::str::contains("(<def>square(x)=>((<return>(x * x))))"));
}

#[test]
fn sloth_run_missing_file_fails() {
    let dir = tempdir().expect("create temp dir");
    let mut cmd = sloth();
    cmd.arg("run").arg(dir.path().join("absent.sloth"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}

#[test]
fn sloth_eval_len_rejects_integers() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("return len(42);");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("HostError"))
        .stderr(predicate::str::contains("len expects a String argument"));
}

#[test]
fn sloth_eval_len_counts_characters() {
    let mut cmd = sloth();
    cmd.arg("eval").arg("return len(\"héllo\");");
    cmd.assert().success().stdout("5\n");
}
