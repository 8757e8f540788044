use anyhow::{bail, Context, Result};
use mdw_config::IAP_PUBLIC_KEY_URL;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Runs one shell command line to completion.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<()>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &str) -> Result<()> {
        (**self).run(command)
    }
}

/// `sh -c <command>`; non-zero exit is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .with_context(|| format!("failed to spawn: {command}"))?;
        if !status.success() {
            bail!("command exited with {status}: {command}");
        }
        Ok(())
    }
}

/// Command line that downloads the public signing keys into `output`.
pub fn key_fetch_command(output: &Path) -> String {
    format!(
        "curl \"{}\" > {}",
        IAP_PUBLIC_KEY_URL,
        shell_quote(&output.to_string_lossy())
    )
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// One-time key download performed before the first poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBootstrap {
    pub output_key_file: PathBuf,
}

impl KeyBootstrap {
    pub fn new(output_key_file: impl Into<PathBuf>) -> Self {
        Self {
            output_key_file: output_key_file.into(),
        }
    }

    /// Failures are logged and swallowed: the watcher still runs without keys.
    pub fn fetch(&self, runner: &dyn CommandRunner) -> bool {
        let command = key_fetch_command(&self.output_key_file);
        info!(path = %self.output_key_file.display(), "fetching public keys");
        match runner.run(&command) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "public key fetch failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        commands: RefCell<Vec<String>>,
        fail: bool,
    }

    impl CommandRunner for Recorder {
        fn run(&self, command: &str) -> Result<()> {
            self.commands.borrow_mut().push(command.to_string());
            if self.fail {
                bail!("boom");
            }
            Ok(())
        }
    }

    #[test]
    fn command_targets_key_url_and_output_path() {
        assert_eq!(
            key_fetch_command(Path::new("/tmp/keys")),
            "curl \"https://www.gstatic.com/iap/verify/public_key-jwk\" > '/tmp/keys'"
        );
        assert_eq!(
            key_fetch_command(Path::new("/tmp/it's")),
            "curl \"https://www.gstatic.com/iap/verify/public_key-jwk\" > '/tmp/it'\\''s'"
        );
    }

    #[test]
    fn failed_fetch_is_reported_not_raised() {
        let r = Recorder {
            fail: true,
            ..Default::default()
        };
        assert!(!KeyBootstrap::new("/tmp/keys").fetch(&r));
        assert_eq!(r.commands.borrow().len(), 1);
    }

    #[test]
    fn shell_runner_reports_exit_status() {
        assert!(ShellRunner.run("true").is_ok());
        let err = ShellRunner.run("exit 3").unwrap_err();
        assert!(err.to_string().contains("exit 3"));
    }

    #[test]
    fn shell_runner_writes_redirected_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        ShellRunner
            .run(&format!("echo hi > {}", shell_quote(&out.to_string_lossy())))
            .unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "hi\n");
    }
}
