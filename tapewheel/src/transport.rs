//! Command transport: remote shells to the clients, local shells for
//! manager-host hooks.
//!
//! Commands are built as argv vectors everywhere in the manager; the one
//! place a shell command line is assembled is [`join_escaped`], applied at
//! the transport boundary with a single well-defined escape.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of one spawned command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// POSIX single-quote escape for one argument.
///
/// Safe for any byte sequence: the argument is wrapped in single quotes
/// and embedded quotes become `'\''`.
pub fn shell_escape(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | ':' | ','))
    {
        return arg.to_string();
    }
    let mut escaped = String::with_capacity(arg.len() + 2);
    escaped.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(c);
        }
    }
    escaped.push('\'');
    escaped
}

/// Join an argv vector into a command line for the remote shell.
pub fn join_escaped(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_escape(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// An authenticated remote shell to a client host.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `argv` on `host` and capture its output.
    async fn run(&self, host: &str, user: &str, port: u16, argv: &[String])
    -> Result<CommandOutput>;
}

/// Runs commands on the manager host itself (hooks, tape verbs, mail).
#[async_trait]
pub trait LocalShell: Send + Sync {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput>;
}

/// The real remote shell, backed by the `ssh` binary.
#[derive(Debug, Clone)]
pub struct SshShell {
    pub binary: String,
    pub connect_timeout_secs: u32,
}

impl Default for SshShell {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            connect_timeout_secs: 30,
        }
    }
}

impl SshShell {
    /// The full ssh argv for one remote command.
    fn ssh_argv(&self, host: &str, user: &str, port: u16, argv: &[String]) -> Vec<String> {
        vec![
            "-p".to_string(),
            port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            format!("{user}@{host}"),
            join_escaped(argv),
        ]
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn run(
        &self,
        host: &str,
        user: &str,
        port: u16,
        argv: &[String],
    ) -> Result<CommandOutput> {
        let ssh_args = self.ssh_argv(host, user, port, argv);
        debug!("{} {}", self.binary, ssh_args.join(" "));

        let output = Command::new(&self.binary)
            .args(&ssh_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::transport(host, format!("failed to spawn ssh: {e}")))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The real local shell, spawning processes directly.
#[derive(Debug, Clone, Default)]
pub struct ProcessShell;

#[async_trait]
impl LocalShell for ProcessShell {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| Error::transport("localhost", "empty command"))?;
        debug!("local: {}", join_escaped(argv));

        let output = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::transport("localhost", format!("failed to spawn {program}: {e}")))?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// argv for running an operator-configured hook string through `sh`.
pub fn hook_argv(hook: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), hook.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_args_pass_through() {
        assert_eq!(shell_escape("/dev/nst0"), "/dev/nst0");
        assert_eq!(shell_escape("h1:/etc,h2:/var"), "h1:/etc,h2:/var");
        assert_eq!(shell_escape("backup-02.east"), "backup-02.east");
    }

    #[test]
    fn test_specials_are_quoted() {
        assert_eq!(shell_escape("a b"), "'a b'");
        assert_eq!(shell_escape("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(shell_escape(""), "''");
        assert_eq!(shell_escape("don't"), "'don'\\''t'");
    }

    #[test]
    fn test_join_escaped() {
        let argv = vec![
            "tar".to_string(),
            "--label".to_string(),
            "prod::h1:/etc daily".to_string(),
        ];
        assert_eq!(join_escaped(&argv), "tar --label 'prod::h1:/etc daily'");
    }

    #[test]
    fn test_hook_argv() {
        assert_eq!(
            hook_argv("echo ready | wall"),
            ["sh", "-c", "echo ready | wall"]
        );
    }

    #[test]
    fn test_ssh_argv_escapes_once_at_the_boundary() {
        let shell = SshShell::default();
        let argv = vec![
            "/opt/tw/bin/tw-agent".to_string(),
            "--label".to_string(),
            "prod::h1:/etc daily".to_string(),
        ];
        let ssh = shell.ssh_argv("h1", "backup", 2222, &argv);
        assert_eq!(ssh[0..2], ["-p", "2222"]);
        assert!(ssh.contains(&"BatchMode=yes".to_string()));
        assert_eq!(ssh[6], "backup@h1");
        assert_eq!(ssh[7], "/opt/tw/bin/tw-agent --label 'prod::h1:/etc daily'");
    }
}
