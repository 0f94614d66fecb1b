use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

const TINY_CONFIG: &str = r#"{
    "size": 4,
    "num_epochs": 1,
    "num_cycles": 2,
    "num_episodes_per_cycle": 2,
    "optimisation_steps_per_cycle": 2,
    "k": 2,
    "buffer_size": 500,
    "batch_size": 8,
    "hidden_units": 16,
    "num_test": 5,
    "seed": 7
}"#;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("her_runtime_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run_binary(args: &[&str], cwd: &Path) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_her_runtime"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "info")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .expect("Failed to spawn her_runtime process");

    let timeout = Duration::from_secs(60);
    let start = Instant::now();
    while child.try_wait().expect("Failed to poll her_runtime").is_none() {
        if start.elapsed() > timeout {
            child.kill().expect("Failed to kill timed-out process");
            panic!("her_runtime timed out after {timeout:?}");
        }
        thread::sleep(Duration::from_millis(50));
    }
    let output = child.wait_with_output().expect("Failed to collect output");
    eprintln!("--- her_runtime STDOUT ---\n{}", String::from_utf8_lossy(&output.stdout));
    eprintln!("--- her_runtime STDERR ---\n{}", String::from_utf8_lossy(&output.stderr));
    output
}

#[test]
fn train_then_evaluate() {
    let dir = scratch_dir("train");
    fs::write(dir.join("config.json"), TINY_CONFIG).unwrap();

    let output = run_binary(
        &[
            "--config",
            "config.json",
            "--checkpoint",
            "out/model.json",
            "--metrics",
            "metrics.json",
        ],
        &dir,
    );
    assert!(output.status.success(), "training exited with {:?}", output.status.code());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Training finished"),
        "Expected log output not found in stdout."
    );

    let checkpoint: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("out/model.json")).unwrap()).unwrap();
    assert_eq!(checkpoint["size"], 4);
    assert!(checkpoint["online"].is_object());
    assert!(checkpoint["target"].is_object());

    let metrics: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("metrics.json")).unwrap()).unwrap();
    assert_eq!(metrics["success_rate"].as_array().unwrap().len(), 2);
    assert_eq!(metrics["loss"].as_array().unwrap().len(), 2);

    let output = run_binary(
        &["--config", "config.json", "--checkpoint", "out/model.json", "--evaluate"],
        &dir,
    );
    assert!(output.status.success(), "evaluation exited with {:?}", output.status.code());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Success rate"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_fails_cleanly() {
    let dir = scratch_dir("invalid");
    fs::write(dir.join("config.json"), r#"{ "size": 4, "gamma": 1.5 }"#).unwrap();
    let output = run_binary(&["--config", "config.json"], &dir);
    assert!(!output.status.success());
    assert!(!dir.join("train/model.json").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn evaluate_without_checkpoint_fails() {
    let dir = scratch_dir("missing");
    let output = run_binary(&["--evaluate", "--checkpoint", "nope.json"], &dir);
    assert!(!output.status.success());
    let _ = fs::remove_dir_all(&dir);
}
