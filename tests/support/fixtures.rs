//! Test fixtures and constants.

/// File the fake kubectl appends to, relative to the project directory.
pub const KUBECTL_LOG: &str = "kubectl.log";

/// Fake sops: "encrypts" by prefixing a header naming the recipient and
/// "decrypts" by dropping that header. Refuses to run without key material.
pub const FAKE_SOPS: &str = r#"
case "$1" in
  --encrypt)
    [ -n "$SOPS_AGE_RECIPIENTS" ] || { echo "no recipients" >&2; exit 2; }
    printf 'ENC:%s\n' "$SOPS_AGE_RECIPIENTS"
    cat
    ;;
  --decrypt)
    [ -n "$SOPS_AGE_KEY" ] || { echo "no key" >&2; exit 2; }
    IFS= read -r header
    case "$header" in
      ENC:*) cat ;;
      *) echo "not sops ciphertext" >&2; exit 1 ;;
    esac
    ;;
  *) exit 64 ;;
esac
"#;

/// Fake kubectl: logs its arguments and the plaintext secrets visible at the
/// time of the call. Fails when asked to apply a path containing
/// `$FAIL_APPLY`, and hangs for `$SLOW_APPLY` seconds when set.
pub const FAKE_KUBECTL: &str = r#"
echo "kubectl $*" >> kubectl.log
find k8s -type f -name '*.env' | sort | sed 's/^/seen /' >> kubectl.log
last=""
for arg in "$@"; do last="$arg"; done
if [ -n "$FAIL_APPLY" ]; then
  case "$last" in
    *"$FAIL_APPLY"*) echo "apply exploded" >&2; exit 1 ;;
  esac
fi
[ -n "$SLOW_APPLY" ] && exec sleep "$SLOW_APPLY"
exit 0
"#;

/// Private key content for `env`.
pub fn private_key(env: &str) -> String {
    format!("AGE-SECRET-KEY-{}", env.to_uppercase())
}

/// Public key content for `env`.
pub fn public_key(env: &str) -> String {
    format!("age1{}", env)
}
