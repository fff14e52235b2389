use assert_cmd::prelude::*; // Add methods on commands
use assert_fs::prelude::*;
use predicates::prelude::*; // Used for writing assertions
use std::process::Command; // Run programs

const FACTS: &str = r#"{"rules": [
    {"head": [{"predicate": "p", "args": ["a"]}]},
    {"head": [{"predicate": "p", "args": ["b"]}]},
    {"head": [{"predicate": "q", "args": ["X"]}],
     "body": [{"atom": {"predicate": "p", "args": ["X"]}}]}
]}"#;

const CHOICE: &str = r#"{"rules": [
    {"head": [{"predicate": "a"}], "body": [{"naf": true, "atom": {"predicate": "b"}}]},
    {"head": [{"predicate": "b"}], "body": [{"naf": true, "atom": {"predicate": "a"}}]}
]}"#;

#[test]
fn arguments() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg("-vvv").arg("file.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg("-v").arg("-q").arg("file.json");
    cmd.assert().failure().stderr(predicate::str::contains(
        "cannot be used with",
    ));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg("--heu").arg("Custom").arg("file.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg("-h");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Monolithic"));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("hex-eval "));
    Ok(())
}

#[test]
fn runs_heuristics() -> Result<(), Box<dyn std::error::Error>> {
    let file = assert_fs::NamedTempFile::new("facts.json")?;
    file.write_str(FACTS)?;
    for heuristic in ["Trivial", "Monolithic", "Easy", "Greedy"] {
        let mut cmd = Command::cargo_bin("hex-eval")?;
        cmd.arg(file.path()).arg("-q").arg("--heu").arg(heuristic);
        cmd.assert()
            .success()
            .stdout(predicate::eq("{p(a),p(b),q(a),q(b)}\n"));
    }

    let mut cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path())
        .arg("-vv")
        .arg("--constant-space")
        .arg("--no-redundancy-elimination");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("{p(a),p(b),q(a),q(b)}"));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path()).arg("--json");
    cmd.assert()
        .success()
        .stdout(predicate::eq("[\"p(a)\",\"p(b)\",\"q(a)\",\"q(b)\"]\n"));
    Ok(())
}

#[test]
fn limits_and_statistics() -> Result<(), Box<dyn std::error::Error>> {
    let file = assert_fs::NamedTempFile::new("choice.json")?;
    file.write_str(CHOICE)?;

    let mut cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("{a}").and(predicate::str::contains("{b}")));

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path()).arg("-n").arg("1");
    let output = cmd.output()?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.lines().count(), 1);

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path()).arg("--stats");
    cmd.assert().success().stdout(
        predicate::str::contains("generators created:")
            .and(predicate::str::contains("payloads freed:")),
    );

    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path()).arg("--max-guess").arg("1");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Evaluation failed"));
    Ok(())
}

#[test]
fn malformed_input() -> Result<(), Box<dyn std::error::Error>> {
    let file = assert_fs::NamedTempFile::new("broken.json")?;
    file.write_str(r#"{"rules": [{"head": 1}]}"#)?;
    let mut cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(file.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unable to read program"));

    let unknown = assert_fs::NamedTempFile::new("unknown.json")?;
    unknown.write_str(
        r#"{"rules": [{"head": [{"predicate": "a"}], "body": [
            {"external": {"name": "nope", "inputs": [], "outputs": []}}
        ]}]}"#,
    )?;
    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(unknown.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no external source named 'nope'"));
    Ok(())
}

#[test]
fn dot_export() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let input = temp.child("facts.json");
    input.write_str(FACTS)?;
    let depgraph = temp.child("dep.dot");
    let compgraph = temp.child("comp.dot");
    let evalgraph = temp.child("eval.dot");

    let mut cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(input.path())
        .arg("--dot-depgraph")
        .arg(depgraph.path())
        .arg("--dot-compgraph")
        .arg(compgraph.path())
        .arg("--dot-evalgraph")
        .arg(evalgraph.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("{p(a),p(b),q(a),q(b)}"));
    depgraph.assert(predicate::str::contains("digraph"));
    compgraph.assert(predicate::str::contains("digraph"));
    evalgraph.assert(predicate::str::contains("digraph"));

    // existing files are not overwritten
    cmd = Command::cargo_bin("hex-eval")?;
    cmd.arg(input.path()).arg("--dot-depgraph").arg(depgraph.path());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    temp.close()?;
    Ok(())
}
