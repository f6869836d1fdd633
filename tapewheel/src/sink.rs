//! Destination sink on the manager host.
//!
//! The receiver consumes one stream per target and writes it either to a
//! block device or to a synthesised file inside a destination directory.
//! Tape control is exposed as two verbs, `rewind` and `offline`; off
//! device both degrade to `echo` no-ops with the same status semantics.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Weekday;
use tapewheel_core::label::synthesized_file_name;
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::LocalShell;

/// Effective destination of an archive stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A block device (`/dev/...`), typically a tape drive.
    Device(String),
    /// A directory; each target stream gets its own synthesised file.
    Directory(PathBuf),
}

impl Destination {
    /// Classify a `remoteDevice` value: anything not under `/dev` is a
    /// directory destination.
    pub fn parse(remote_device: &str) -> Self {
        if remote_device.starts_with("/dev") {
            Self::Device(remote_device.to_string())
        } else {
            Self::Directory(PathBuf::from(remote_device))
        }
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_))
    }

    /// Where one target's stream ends up: the device itself, or a file
    /// named from the label stem and weekday inside the directory.
    pub fn effective_path(&self, label_stem: &str, weekday: Weekday) -> PathBuf {
        match self {
            Self::Device(dev) => PathBuf::from(dev),
            Self::Directory(dir) => dir.join(synthesized_file_name(label_stem, weekday)),
        }
    }

    fn device_path(&self) -> Option<&str> {
        match self {
            Self::Device(dev) => Some(dev),
            Self::Directory(_) => None,
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(dev) => write!(f, "{}", dev),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Tape control verbs.
#[async_trait]
pub trait TapeControl: Send + Sync {
    /// Invoked before each target stream begins.
    async fn rewind(&self, dest: &Destination) -> Result<()>;
    /// Invoked after the last target of an archive succeeds, device only.
    async fn offline(&self, dest: &Destination) -> Result<()>;
}

/// Tape control backed by the `mt` binary.
pub struct MtControl<'a> {
    local: &'a dyn LocalShell,
    mt_binary: String,
}

impl<'a> MtControl<'a> {
    pub fn new(local: &'a dyn LocalShell) -> Self {
        Self {
            local,
            mt_binary: "mt".to_string(),
        }
    }

    async fn verb(&self, dest: &Destination, verb: &str) -> Result<()> {
        let argv = match dest.device_path() {
            Some(dev) => vec![
                self.mt_binary.clone(),
                "-f".to_string(),
                dev.to_string(),
                verb.to_string(),
            ],
            // Directory destination: the verb is an echo no-op.
            None => vec!["echo".to_string(), verb.to_string()],
        };

        let output = self.local.run(&argv).await?;
        if !output.success() {
            return Err(Error::transport(
                "localhost",
                format!("{} {} failed: {}", self.mt_binary, verb, output.stderr.trim()),
            ));
        }
        debug!("tape {} on {} ok", verb, dest);
        Ok(())
    }
}

#[async_trait]
impl TapeControl for MtControl<'_> {
    async fn rewind(&self, dest: &Destination) -> Result<()> {
        self.verb(dest, "rewind").await
    }

    async fn offline(&self, dest: &Destination) -> Result<()> {
        self.verb(dest, "offline").await
    }
}

/// Make sure a directory destination exists before the first stream opens.
/// Device destinations are left alone.
pub async fn ensure_destination(dest: &Destination) -> std::io::Result<()> {
    if let Destination::Directory(dir) = dest {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapewheel_core::label::label_stem;
    use tapewheel_core::Rule;

    #[test]
    fn test_device_classification() {
        assert!(Destination::parse("/dev/nst0").is_device());
        assert!(!Destination::parse("/backup/vol").is_device());
        assert!(!Destination::parse("backup").is_device());
    }

    #[test]
    fn test_device_path_is_itself() {
        let dest = Destination::parse("/dev/nst0");
        assert_eq!(
            dest.effective_path("whatever", Weekday::Mon),
            PathBuf::from("/dev/nst0")
        );
    }

    #[test]
    fn test_directory_synthesises_file_name() {
        // remoteDevice=/backup/vol, label prod::h1:/etc-daily-09.14.2025 on a Sunday.
        let dest = Destination::parse("/backup/vol");
        let stem = label_stem("prod", "h1", "/etc", Rule::Daily);
        assert_eq!(
            dest.effective_path(&stem, Weekday::Sun),
            PathBuf::from("/backup/vol/prod__h1_.etc-daily.Sun.tgz")
        );
    }

    #[tokio::test]
    async fn test_ensure_destination_creates_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("vol");
        let dest = Destination::Directory(dir.clone());
        ensure_destination(&dest).await.unwrap();
        assert!(dir.is_dir());

        // Device destinations are not touched.
        ensure_destination(&Destination::Device("/dev/null".into()))
            .await
            .unwrap();
    }
}
