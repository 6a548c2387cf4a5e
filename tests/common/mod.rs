#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_fbc") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "fbc.exe" } else { "fbc" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve fbc binary path for integration test"),
    }
}

/// Run `fbc` with `cwd` as working directory so the relative default
/// `files/` set resolves inside the test's scratch space.
pub fn run_cli_case(case_name: &str, cwd: &Path, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, cwd, args, &[])
}

pub fn run_cli_case_with_env(
    case_name: &str,
    cwd: &Path,
    args: &[&str],
    env: &[(&str, &str)],
) -> CmdResult {
    let root = std::env::temp_dir().join("fbc-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .current_dir(cwd)
        .env("RUST_BACKTRACE", "1")
        .env("NO_COLOR", "1");
    for key in [
        "FBC_INPUT_DIRECTORY",
        "FBC_INPUT_FILE_PREFIX",
        "FBC_INPUT_FILE_SUFFIX",
        "FBC_INPUT_FILE_COUNT",
        "FBC_INPUT_MISSING_FILE",
        "FBC_FIXTURES_FILE_COUNT",
        "FBC_FIXTURES_FILE_SIZE_BYTES",
        "FBC_LOGGING_JSONL_LOG",
    ] {
        command.env_remove(key);
    }
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute fbc command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("cwd={}\n", cwd.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("env={env:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Lay out `files/file{i}.test` under `root`; `None` leaves that index absent.
pub fn write_file_set(root: &Path, sizes: &[Option<usize>]) {
    let dir = root.join("files");
    fs::create_dir_all(&dir).expect("create files dir");
    for (i, size) in sizes.iter().enumerate() {
        if let Some(size) = size {
            fs::write(dir.join(format!("file{i}.test")), vec![b'z'; *size])
                .expect("write fixture");
        }
    }
}
