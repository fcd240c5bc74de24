//! Assertions over deployer output and the project directory.

use std::path::Path;
use std::process::Output;

use walkdir::WalkDir;

use super::Test;

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Exit status 0, or panic with both streams.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "deployer failed ({}):\nstdout: {}\nstderr: {}",
        output.status,
        stdout(output),
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "deployer unexpectedly succeeded:\nstdout: {}",
        stdout(output)
    );
}

pub fn assert_stdout_contains(output: &Output, expected: &str) {
    let out = stdout(output);
    assert!(out.contains(expected), "stdout missing '{}', got: {}", expected, out);
}

pub fn assert_stderr_contains(output: &Output, expected: &str) {
    let err = stderr(output);
    assert!(err.contains(expected), "stderr missing '{}', got: {}", expected, err);
}

impl Test {
    /// The kubectl invocations, without the `seen` lines.
    pub fn applies(&self) -> Vec<String> {
        self.kubectl_log()
            .into_iter()
            .filter(|line| line.starts_with("kubectl "))
            .collect()
    }

    /// Whether kubectl saw `rel` in plaintext during any apply.
    pub fn kubectl_saw(&self, rel: &str) -> bool {
        self.kubectl_log().contains(&format!("seen {}", rel))
    }
}

/// No decrypted counterpart of any `*.sops` file is left under `k8s/`.
pub fn assert_no_plaintext(t: &Test) {
    let root = t.path("k8s");
    let leftover: Vec<_> = WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|x| x == "sops"))
        .map(|p| p.with_extension(""))
        .filter(|p| p.exists())
        .map(|p| relative(t.dir.path(), &p))
        .collect();
    assert!(leftover.is_empty(), "plaintext left on disk: {:?}", leftover);
}

fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
