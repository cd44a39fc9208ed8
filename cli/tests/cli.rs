use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use test_case::test_case;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("key.bin"), b"fixture key material, not secret").unwrap();
        Fixture { dir }
    }

    fn settings(&self, name: &str, contents: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn key(&self) -> String {
        self.dir.path().join("key.bin").to_string_lossy().into_owned()
    }

    fn pwclip(&self) -> Command {
        let mut cmd = Command::cargo_bin("pwclip").unwrap();
        cmd.env_remove("PWCLIP_TIMEOUT").env_remove("PWCLIP_LOG");
        cmd
    }
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_print_default_password() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\nusername: me\n");

    let out = stdout_of(fx.pwclip().args(["-p", "-k", &fx.key(), &settings]));
    let password = out.strip_suffix('\n').unwrap();

    assert_eq!(password.chars().count(), 32);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_output_is_deterministic() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\nusername: me\n");

    let first = stdout_of(fx.pwclip().args(["-p", "-k", &fx.key(), &settings]));
    let second = stdout_of(fx.pwclip().args(["-k", &fx.key(), "-p", &settings]));

    assert_eq!(first, second);
}

#[test]
fn test_settings_shape_the_password() {
    let fx = Fixture::new();
    let settings = fx.settings(
        "site.yaml",
        "url: example.com\nprefix: \"X-\"\ncharset: \"01\"\nlength: 12\n",
    );

    let out = stdout_of(fx.pwclip().args(["-p", "-k", &fx.key(), &settings]));
    let password = out.trim_end();

    assert_eq!(password.len(), 12);
    assert!(password.starts_with("X-"));
    assert!(password[2..].chars().all(|c| c == '0' || c == '1'));
}

#[test]
fn test_question_changes_password() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\nq1: first pet\n");

    let site = stdout_of(fx.pwclip().args(["-p", "-k", &fx.key(), &settings]));
    let answer = stdout_of(fx.pwclip().args(["-p", "-q", "1", "-k", &fx.key(), &settings]));

    assert_ne!(site, answer);
}

#[test]
fn test_key_changes_password() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\n");
    let other_key = fx.settings("other.key", "different key material");

    let a = stdout_of(fx.pwclip().args(["-p", "-k", &fx.key(), &settings]));
    let b = stdout_of(fx.pwclip().args(["-p", "-k", &other_key, &settings]));

    assert_ne!(a, b);
}

#[test_case("-h" ; "short help")]
#[test_case("--help" ; "long help")]
fn test_help(flag: &str) {
    Command::cargo_bin("pwclip")
        .unwrap()
        .arg(flag)
        .assert()
        .success()
        .stdout(predicate::str::contains("yamlfile"))
        .stdout(predicate::str::contains("-k"));
}

#[test_case("-v" ; "short version")]
#[test_case("--version" ; "long version")]
fn test_version(flag: &str) {
    Command::cargo_bin("pwclip")
        .unwrap()
        .arg(flag)
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test_case(&[] ; "no arguments")]
#[test_case(&["-q", "abc", "site.yaml"] ; "non numeric question")]
#[test_case(&["-x", "site.yaml"] ; "unknown flag")]
#[test_case(&["a.yaml", "b.yaml"] ; "two files")]
fn test_usage_errors(args: &[&str]) {
    Command::cargo_bin("pwclip")
        .unwrap()
        .args(args)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("pwclip: error (usage): "))
        .stderr(predicate::str::contains("usage: pwclip"));
}

#[test]
fn test_missing_settings_file() {
    let fx = Fixture::new();
    let missing = fx.dir.path().join("missing.yaml");

    fx.pwclip()
        .args(["-p", "-k", &fx.key()])
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("pwclip: error (file): "));
}

#[test_case("url: [unclosed\n", "malformed" ; "malformed document")]
#[test_case("length: 12abc\n", "length must be an integer from 1 to 4096" ; "bad length")]
#[test_case("url:\n  nested: true\n", "url must be a string" ; "nested url")]
fn test_settings_errors(contents: &str, message: &str) {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", contents);

    fx.pwclip()
        .args(["-p", "-k", &fx.key(), &settings])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::starts_with("pwclip: error (settings): "))
        .stderr(predicate::str::contains(message));
}

#[test]
fn test_missing_question() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\nq1: first pet\n");

    fx.pwclip()
        .args(["-p", "-q", "3", "-k", &fx.key(), &settings])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error (settings)"))
        .stderr(predicate::str::contains("q3"));
}

#[test]
fn test_settings_checked_before_key() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "length: nope\n");
    let missing_key = fx.dir.path().join("missing.key");

    fx.pwclip()
        .args(["-p", "-k"])
        .arg(&missing_key)
        .arg(&settings)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error (settings)"));
}

#[test]
fn test_missing_key_file() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\n");
    let missing_key = fx.dir.path().join("missing.key");

    fx.pwclip()
        .args(["-p", "-k"])
        .arg(&missing_key)
        .arg(&settings)
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("pwclip: error (read key): "));
}

#[test]
fn test_unknown_clipboard_backend() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\n");

    fx.pwclip()
        .env("PWCLIP_CLIPBOARD", "carrier-pigeon")
        .args(["-k", &fx.key(), &settings])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("error (clipboard)"))
        .stderr(predicate::str::contains("carrier-pigeon"));
}

#[test]
fn test_zero_timeout_rejected() {
    let fx = Fixture::new();
    let settings = fx.settings("site.yaml", "url: example.com\n");

    fx.pwclip()
        .env("PWCLIP_TIMEOUT", "0")
        .args(["-k", &fx.key(), &settings])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error (usage)"));
}

#[cfg(unix)]
mod clipboard_delivery {
    use super::Fixture;
    use std::fs;
    use std::path::Path;
    use std::process::{Child, Command, ExitStatus, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    const BEFORE: &[u8] = b"contents before pwclip ran";

    fn spawn_delivery(fx: &Fixture, clipboard: &Path, timeout: &str) -> Child {
        let settings = fx.settings("site.yaml", "url: example.com\n");
        fs::write(clipboard, BEFORE).unwrap();

        Command::new(assert_cmd::cargo::cargo_bin("pwclip"))
            .env("PWCLIP_CLIPBOARD", format!("file:{}", clipboard.display()))
            .env_remove("PWCLIP_TIMEOUT")
            .args(["--timeout", timeout, "-k", &fx.key(), &settings])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap()
    }

    fn password_published(clipboard: &Path) -> bool {
        fs::read(clipboard).unwrap().len() == 32
    }

    fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        while started.elapsed() < limit {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    fn wait_for_exit(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
        let mut status = None;
        wait_until(limit, || {
            status = child.try_wait().unwrap();
            status.is_some()
        });
        status
    }

    #[test]
    fn test_restores_after_window() {
        let fx = Fixture::new();
        let clipboard = fx.dir.path().join("clipboard");
        let mut child = spawn_delivery(&fx, &clipboard, "1");

        assert!(wait_until(Duration::from_secs(10), || password_published(&clipboard)));

        let status = wait_for_exit(&mut child, Duration::from_secs(10)).expect("pwclip hung");
        assert!(status.success());
        assert_eq!(fs::read(&clipboard).unwrap(), BEFORE);
    }

    #[test]
    fn test_interrupt_restores_and_exits() {
        let fx = Fixture::new();
        let clipboard = fx.dir.path().join("clipboard");
        let mut child = spawn_delivery(&fx, &clipboard, "60");

        // The listener is armed before the password is written.
        assert!(wait_until(Duration::from_secs(10), || password_published(&clipboard)));

        let interrupted = Instant::now();
        let kill = Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(kill.success());

        let status = wait_for_exit(&mut child, Duration::from_secs(10)).unwrap_or_else(|| {
            let _ = child.kill();
            panic!("pwclip kept running after SIGINT");
        });
        assert!(interrupted.elapsed() < Duration::from_secs(10));
        assert_eq!(status.code(), Some(0));
        assert_eq!(fs::read(&clipboard).unwrap(), BEFORE);
    }
}
