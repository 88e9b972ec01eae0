//! Smoke tests for the command-line runner.

use assert_cmd::Command;

#[test]
fn runs_a_job_file_and_prints_the_record() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("galley.toml"),
        r#"recipe = "lj.static"
geometry = """
Ar 0.0   0.0 0.0
Ar 1.122 0.0 0.0
Ar 3.0   0.0 0.0
"""
"#,
    )
    .unwrap();
    let output = Command::cargo_bin("galley")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout)
        .into_owned();
    let record: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(record["name"], "LJ Static");
    assert_eq!(record["natoms"], 3);
    assert!(record["energy"].as_f64().unwrap() < 0.0);
}

#[test]
fn writes_the_record_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.toml");
    std::fs::write(
        &job,
        "recipe = \"lj.static\"\ngeometry = \"Ar 0 0 0\"\n",
    )
    .unwrap();
    let out = dir.path().join("record.json");
    Command::cargo_bin("galley")
        .unwrap()
        .arg(&job)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap())
            .unwrap();
    assert_eq!(record["natoms"], 1);
    assert_eq!(record["energy"], 0.0);
}

#[test]
fn bad_job_files_fail_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let job = dir.path().join("job.toml");
    std::fs::write(&job, "recipe = \"lj.shake\"\ngeometry = \"Ar 0 0 0\"\n")
        .unwrap();
    Command::cargo_bin("galley").unwrap().arg(&job).assert().failure();
}
