use std::process::{Command, Output};

use tempfile::TempDir;

const USER: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";

/// Runs the binary from an empty directory with a scratch home, so no
/// `.env` or config file on the host leaks into the run.
fn run_subtrack_with_env(args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let sandbox = TempDir::new().expect("Failed to create temp dir");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_subtrack"));
    cmd.args(args)
        .current_dir(sandbox.path())
        .env("HOME", sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("DATABASE_URL")
        .env_remove("SUBTRACK_DATABASE_URL")
        .env_remove("SUBTRACK_LOG_LEVEL")
        .env_remove("RUST_LOG");
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute subtrack command")
}

fn run_subtrack(args: &[&str]) -> Output {
    run_subtrack_with_env(args, &[])
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_subtrack(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("subtrack"));
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_subtrack(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
    }

    #[test]
    fn test_version_ignores_broken_config() {
        for env in [
            ("SUBTRACK_LOG_LEVEL", "subtrack_core=loud"),
            ("SUBTRACK_QUERY_TIMEOUT_SECS", "soon"),
            ("DATABASE_URL", "mysql://localhost/db"),
        ] {
            let output = run_subtrack_with_env(&["version"], &[env]);
            assert!(
                output.status.success(),
                "version failed with {}={}: {}",
                env.0,
                env.1,
                stderr_to_string(&output)
            );
        }
    }
}

mod help_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = run_subtrack(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        for command in ["init", "add", "show", "update", "delete", "list", "total-cost"] {
            assert!(stdout.contains(command), "help should mention '{}'", command);
        }
    }

    #[test]
    fn test_total_cost_help_mentions_window() {
        let output = run_subtrack(&["total-cost", "--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("--from"));
        assert!(stdout.contains("--to"));
        assert!(stdout.contains("--user"));
    }

    #[test]
    fn test_unknown_command_fails() {
        let output = run_subtrack(&["subscribe"]);
        assert!(!output.status.success());
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_total_cost_rejects_malformed_user() {
        let output = run_subtrack(&["total-cost", "--user", "alice"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E4001"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_total_cost_rejects_malformed_month() {
        let output = run_subtrack(&["total-cost", "--user", USER, "--from", "2025-1"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E4002"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_add_rejects_negative_price() {
        let output = run_subtrack(&[
            "add",
            "--service",
            "Netflix",
            "--price=-1",
            "--user",
            USER,
            "--start",
            "2025-01",
        ]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E4003"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_show_rejects_malformed_id() {
        let output = run_subtrack(&["show", "42"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E4001"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_non_postgres_url_is_config_error() {
        let output = run_subtrack_with_env(&["list"], &[("DATABASE_URL", "mysql://localhost/db")]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E2003"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_bare_target_log_filter_is_accepted() {
        let output = run_subtrack_with_env(
            &["total-cost", "--user", "alice"],
            &[("RUST_LOG", "subtrack_core")],
        );
        let stderr = stderr_to_string(&output);

        assert!(!stderr.contains("E2003"), "stderr was: {}", stderr);
        assert!(stderr.contains("E4001"), "stderr was: {}", stderr);
    }

    #[test]
    fn test_malformed_timeout_is_config_error() {
        let output = run_subtrack_with_env(&["list"], &[("SUBTRACK_QUERY_TIMEOUT_SECS", "soon")]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("E2003"), "stderr was: {}", stderr);
        assert!(stderr.contains("query.timeout_secs"), "stderr was: {}", stderr);
    }
}
