use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn enconda() -> Command {
    let mut cmd = Command::cargo_bin("enconda").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Config pointing the oracle at a closed local port so no request leaves the machine.
fn offline_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("offline.toml");
    write(
        &path,
        r#"
[llm]
api_key = "test-key"
base_url = "http://127.0.0.1:9/v1"
timeout_secs = 2
max_retries = 0
retry_delay_secs = 0
"#,
    );
    path
}

#[test]
fn test_evaluate_missing_results_dir_fails() {
    let temp = TempDir::new().unwrap();

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results_dir", "nope", "--data_root_dir", "."])
        .env("OPENAI_API_KEY", "test-key")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Results directory does not exist"));

    assert!(!temp.path().join("evaluation_output").exists());
}

#[test]
fn test_evaluate_missing_data_root_fails() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("results")).unwrap();

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results-dir", "results", "--data-root-dir", "missing"])
        .env("OPENAI_API_KEY", "test-key")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Data root directory does not exist"));
}

#[test]
fn test_evaluate_requires_api_key() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("results")).unwrap();
    fs::create_dir(temp.path().join("data")).unwrap();

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results_dir", "results", "--data_root_dir", "data"])
        .env_remove("OPENAI_API_KEY")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("api_key"));
}

#[test]
fn test_evaluate_zero_files_writes_reports() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("results")).unwrap();
    fs::create_dir(temp.path().join("data")).unwrap();

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results_dir", "results", "--data_root_dir", "data"])
        .env("OPENAI_API_KEY", "test-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files evaluated: 0"));

    let out = temp.path().join("evaluation_output");
    let detailed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("detailed_evaluation_results.json")).unwrap())
            .unwrap();
    assert_eq!(detailed["total_files"], 0);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("evaluation_summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["overall_metrics"]["error_type"]["f1_score"], 0.0);
}

#[test]
fn test_evaluate_markdown_summary() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    write(
        &temp.path().join("results/flask/README_1_errors.json"),
        r#"{"repo_name": "flask", "readme_name": "README_1", "errors": [{"error_type": "E1", "error_description": "d", "fix_answer": "f"}], "raw_output": ""}"#,
    );
    write(
        &temp.path().join("data/error_gen_flask/README_1/README.json"),
        r#"{"readme_name": "README_1", "errors": [{"error_type": "E1", "error_description": "x", "golden_answer": "y"}]}"#,
    );

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results_dir", "results", "--data_root_dir", "data"])
        .args(["--format", "markdown", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("## Evaluation Summary"))
        .stdout(predicate::str::contains("**Files**: 1"))
        .stdout(predicate::str::contains("| E1 | Dependency Installation Error | 100.00%"))
        .stdout(predicate::str::contains("Files evaluated").not());
}

#[test]
fn test_evaluate_with_unreachable_oracle() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    write(
        &temp.path().join("results/flask/README_1_errors.json"),
        r#"{
            "repo_name": "flask",
            "readme_name": "README_1",
            "errors": [
                {"error_type": "E1", "error_description": "numpy missing", "fix_answer": "pip install numpy"},
                {"error_type": "E2", "error_description": "bad flag", "fix_answer": "drop flag"}
            ],
            "raw_output": "",
            "timestamp": "2026-01-01T00:00:00+00:00"
        }"#,
    );
    write(
        &temp.path().join("data/error_gen_flask/README_1/README.json"),
        r#"{
            "readme_name": "README_1",
            "errors": [
                {"error_type": "E1", "error_description": "numpy not installed", "golden_answer": "install numpy"}
            ]
        }"#,
    );

    enconda()
        .current_dir(temp.path())
        .arg("evaluate")
        .arg("--results_dir")
        .arg("results")
        .arg("--data_root_dir")
        .arg("data")
        .arg("--output_dir")
        .arg("report")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Files evaluated: 1"))
        .stdout(predicate::str::contains("Precision: 50.00%"));

    let detailed: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("report/detailed_evaluation_results.json")).unwrap(),
    )
    .unwrap();

    let file = &detailed["per_file_results"][0];
    // Category match alone (0.6) clears the threshold even though every oracle call failed
    let first = &file["error_evaluations"][0];
    assert_eq!(first["matched_golden_error"]["error_type"], "E1");
    assert_eq!(first["error_type_correct"], true);
    assert_eq!(first["description_similar"]["is_similar"], false);
    assert!(
        first["description_similar"]["reason"]
            .as_str()
            .unwrap()
            .starts_with("Evaluation failed")
    );
    assert!(file["error_evaluations"][1]["matched_golden_error"].is_null());

    assert_eq!(file["description_accuracy"], 0.0);
    assert_eq!(file["golden_answer_accuracy"], 0.0);
    assert_eq!(detailed["overall_error_type_metrics"]["true_positives"], 1);
    assert_eq!(detailed["overall_error_type_metrics"]["false_positives"], 1);
    assert_eq!(detailed["error_type_breakdown"]["E2"]["false_positives"], 1);
}

#[test]
fn test_evaluate_breakdown_misses_flag() {
    let temp = TempDir::new().unwrap();
    let config = offline_config(temp.path());

    write(
        &temp.path().join("results/flask/README_1_errors.json"),
        r#"{"repo_name": "flask", "readme_name": "README_1", "errors": [], "raw_output": ""}"#,
    );
    write(
        &temp.path().join("data/error_gen_flask/README_1/README.json"),
        r#"{"readme_name": "README_1", "errors": [{"error_type": "E7", "error_description": "d", "golden_answer": "g"}]}"#,
    );

    enconda()
        .current_dir(temp.path())
        .args(["evaluate", "--results_dir", "results", "--data_root_dir", "data"])
        .arg("--config")
        .arg(&config)
        .arg("--breakdown-misses")
        .assert()
        .success();

    let detailed: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("evaluation_output/detailed_evaluation_results.json"))
            .unwrap(),
    )
    .unwrap();
    assert_eq!(detailed["error_type_breakdown"]["E7"]["false_negatives"], 1);
}

#[test]
fn test_categories_lists_catalog() {
    enconda()
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("E1"))
        .stdout(predicate::str::contains("Dependency Installation Error"))
        .stdout(predicate::str::contains("E8"));
}

#[test]
fn test_init_writes_loadable_config() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("custom.toml");

    enconda()
        .arg("init")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[llm]"));
    assert!(content.contains("gpt-4o-mini"));

    // The written file is accepted as a config
    fs::create_dir(temp.path().join("data")).unwrap();
    enconda()
        .current_dir(temp.path())
        .args(["analyze", "--dry-run", "--data-dir", "data", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_analyze_dry_run_lists_folders() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("data/error_gen_flask/README_1/README.md"), "pip install flask");
    write(&temp.path().join("data/error_gen_flask/README_2/README.md"), "pip install flask");
    write(&temp.path().join("data/error_gen_attrs/README_1/README.rst"), "pip install attrs");
    write(&temp.path().join("data/not_a_repo/README_1/README.md"), "ignored");

    enconda()
        .current_dir(temp.path())
        .args(["analyze", "--dry-run", "--data-dir", "data", "--output-dir", "out"])
        .env_remove("OPENAI_API_KEY")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 README folders"))
        .stdout(predicate::str::contains("attrs_README_1"))
        .stdout(predicate::str::contains("flask_README_2"))
        .stdout(predicate::str::contains("not_a_repo").not());
}

#[test]
fn test_analyze_missing_data_dir_fails() {
    let temp = TempDir::new().unwrap();

    enconda()
        .current_dir(temp.path())
        .args(["analyze", "--data-dir", "missing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Data directory does not exist"));
}

#[cfg(unix)]
#[test]
fn test_analyze_agent_mode_end_to_end() {
    let temp = TempDir::new().unwrap();
    write(&temp.path().join("data/error_gen_flask/README_1/README.md"), "pip install flask");

    let agent_output = temp.path().join("agent_output.json");
    write(
        &agent_output,
        r#"{"detected_errors": [{"error_type": "e1", "error_description": "flask version unpinned", "fix_suggestion": "pin flask"}], "shell_script": "pip install flask==3.0"}"#,
    );

    let config = temp.path().join("agent.toml");
    write(
        &config,
        &format!(
            r#"
[llm]
api_key = "test-key"

[agent]
executable = "sh"
args = ["-c", "cat {}", "agent"]
timeout_secs = 30
"#,
            agent_output.display()
        ),
    );

    enconda()
        .current_dir(temp.path())
        .args(["analyze", "--mode", "agent", "--data-dir", "data", "--output-dir", "out"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("success rate 100.00%"));

    let errors: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("out/results/flask/README_1_errors.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(errors["repo_name"], "flask");
    assert_eq!(errors["errors"][0]["error_type"], "E1");
    assert_eq!(errors["errors"][0]["fix_answer"], "pin flask");

    let script = fs::read_to_string(temp.path().join("out/results/flask/README_1_setup.sh")).unwrap();
    assert_eq!(script, "pip install flask==3.0");
    assert!(temp.path().join("out/summary_report.json").is_file());
}
