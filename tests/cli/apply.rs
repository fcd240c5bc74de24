//! Tests for `deployer apply`.

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use crate::support::*;

#[test]
fn test_apply_missing_environment_is_noop() {
    let t = Test::new();
    t.keys("testing");

    let output = t.apply("testing");
    assert_success(&output);
    assert_stderr_contains(&output, "no resources for testing!");
    assert!(t.kubectl_log().is_empty());
}

#[test]
fn test_apply_missing_environment_fails_when_configured() {
    let t = Test::new();
    t.write(".deployer.toml", "[deployer]\nmissing_env = \"fail\"\n");

    let output = t.apply("testing");
    assert_failure(&output);
    assert_stderr_contains(&output, "no resources for environment 'testing'");
    assert!(t.kubectl_log().is_empty());
}

#[test]
fn test_apply_decrypts_applies_and_cleans_up() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");
    t.secret("testing", "db.env", "DB=postgres\n");
    t.secret("testing", "nested/tls.env", "CERT=x\n");

    let output = t.apply("testing");
    assert_success(&output);
    assert_stdout_contains(&output, "applied testing (3 secrets decrypted and removed)");

    assert_eq!(
        t.kubectl_log(),
        vec![
            "kubectl apply --wait --kustomize k8s/env/testing",
            "seen k8s/env/testing/db.env",
            "seen k8s/env/testing/nested/tls.env",
            "seen k8s/env/testing/secrets.env",
        ]
    );

    assert_no_plaintext(&t);
    for rel in ["db.env", "nested/tls.env", "secrets.env"] {
        assert!(t.exists(&format!("k8s/env/testing/{}.sops", rel)));
    }
}

#[test]
fn test_apply_logs_each_step() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");

    let output = t.apply("testing");
    assert_success(&output);

    let err = stderr(&output);
    let order = [
        "loading testing private key",
        "decrypting k8s/env/testing/secrets.env for testing",
        "apply testing",
        "deleting k8s/env/testing/secrets.env",
    ];
    let mut from = 0;
    for needle in order {
        let at = err[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("missing '{}' after offset {} in: {}", needle, from, err));
        from += at + needle.len();
    }
}

#[test]
fn test_apply_failure_still_removes_plaintext() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");

    let output = t
        .cmd()
        .env("FAIL_APPLY", "k8s/env/testing")
        .args(["-e", "testing", "apply"])
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "apply failed for k8s/env/testing");
    // kubectl saw the plaintext, and it is gone afterwards
    assert!(t.kubectl_saw("k8s/env/testing/secrets.env"));
    assert_no_plaintext(&t);
}

#[test]
fn test_bootstrap_requested_without_directory_applies_once() {
    let t = Test::with_env("testing");

    let output = t.apply_bootstrap("testing");
    assert_success(&output);

    assert_eq!(t.applies(), vec!["kubectl apply --wait --kustomize k8s/env/testing"]);
}

#[test]
fn test_bootstrap_applied_before_environment() {
    let t = Test::with_env("testing");
    t.write("k8s/bootstrap/kustomization.yaml", "resources: []\n");

    let output = t.apply_bootstrap("testing");
    assert_success(&output);
    assert_stdout_contains(&output, "applied bootstrap + testing");

    assert_eq!(
        t.applies(),
        vec![
            "kubectl apply --wait --kustomize k8s/bootstrap",
            "kubectl apply --wait --kustomize k8s/env/testing",
        ]
    );
}

#[test]
fn test_bootstrap_not_applied_unless_requested() {
    let t = Test::with_env("testing");
    t.write("k8s/bootstrap/kustomization.yaml", "resources: []\n");

    let output = t.apply("testing");
    assert_success(&output);
    assert!(!t.applies().iter().any(|l| l.contains("k8s/bootstrap")));
}

#[test]
fn test_context_flag_is_passed_to_kubectl() {
    let t = Test::with_env("testing");

    let output = t
        .cmd()
        .args(["-e", "testing", "--context", "kind-dev", "apply"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(
        t.kubectl_log()[0],
        "kubectl --context=kind-dev apply --wait --kustomize k8s/env/testing"
    );
}

#[test]
fn test_context_from_settings_file() {
    let t = Test::with_env("testing");
    t.write(".deployer.toml", "[deployer]\ncontext = \"from-file\"\n");

    let output = t.apply("testing");
    assert_success(&output);
    assert!(t.kubectl_log()[0].starts_with("kubectl --context=from-file "));
}

#[test]
fn test_readiness_probe_receives_env() {
    let t = Test::with_env("testing");
    t.executable(
        "k8s/env/testing/apply-ready.sh",
        r#"echo "ready $ENV" >> kubectl.log"#,
    );

    let output = t.apply("testing");
    assert_success(&output);

    let log = t.kubectl_log();
    assert_eq!(log.first().map(String::as_str), Some("kubectl apply --wait --kustomize k8s/env/testing"));
    assert_eq!(log.last().map(String::as_str), Some("ready testing"));
}

#[test]
fn test_failing_probe_stops_pipeline_and_cleans_up() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");
    t.write("k8s/bootstrap/kustomization.yaml", "resources: []\n");
    t.executable("k8s/bootstrap/apply-ready.sh", "exit 4");

    let output = t.apply_bootstrap("testing");
    assert_failure(&output);
    assert_stderr_contains(&output, "readiness check failed for k8s/bootstrap/apply-ready.sh");

    assert!(!t.applies().iter().any(|l| l.ends_with("k8s/env/testing")));
    assert_no_plaintext(&t);
}

#[test]
fn test_dir_flag_runs_elsewhere() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");
    let elsewhere = tempfile::TempDir::new().unwrap();

    let output = t
        .cmd()
        .current_dir(elsewhere.path())
        .arg("-C")
        .arg(t.dir.path())
        .args(["-e", "testing", "apply"])
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(t.applies().len(), 1);
    assert!(t.kubectl_saw("k8s/env/testing/secrets.env"));
    assert_no_plaintext(&t);
}

#[test]
fn test_interrupt_during_apply_removes_plaintext() {
    let t = Test::with_env("testing");
    t.secret("testing", "secrets.env", "A=1\n");

    let mut child = t.spawn_slow_apply("testing", 30);

    // wait until kubectl is running with the plaintext in place
    let deadline = Instant::now() + Duration::from_secs(20);
    while !t.kubectl_saw("k8s/env/testing/secrets.env") {
        assert!(Instant::now() < deadline, "kubectl never started");
        thread::sleep(Duration::from_millis(50));
    }
    assert!(t.exists("k8s/env/testing/secrets.env"));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let started = Instant::now();
    let output = child.wait_with_output().unwrap();
    assert!(started.elapsed() < Duration::from_secs(20));

    assert_eq!(output.status.code(), Some(130));
    assert_stderr_contains(&output, "interrupted");
    assert_stderr_contains(&output, "deleting k8s/env/testing/secrets.env");
    assert_no_plaintext(&t);
    assert!(t.exists("k8s/env/testing/secrets.env.sops"));
}
