//! Local mail transport.
//!
//! The manager never speaks SMTP itself; it hands the message to the
//! system `mail` binary, which is what fleet hosts already have
//! configured for operator email.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Seam for operator email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Mail transport backed by the local `mail` binary.
#[derive(Debug, Clone)]
pub struct Sendmail {
    pub binary: String,
}

impl Default for Sendmail {
    fn default() -> Self {
        Self {
            binary: "mail".to_string(),
        }
    }
}

#[async_trait]
impl MailTransport for Sendmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut child = Command::new(&self.binary)
            .arg("-s")
            .arg(subject)
            .arg(to)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::transport("localhost", format!("failed to spawn {}: {e}", self.binary)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::transport("localhost", "failed to open mail stdin"))?;
        stdin.write_all(body.as_bytes()).await?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::transport("localhost", format!("mail did not exit: {e}")))?;
        if !output.status.success() {
            return Err(Error::transport(
                "localhost",
                format!(
                    "mail exited {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(())
    }
}
