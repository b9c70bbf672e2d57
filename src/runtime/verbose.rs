use crate::config::VerboseLevel;
use crate::core::Result;
use std::sync::Mutex;
use tracing::{Level, event};

/// Process-wide verbose log.
///
/// Lines are kept in order and mirrored as `tracing` events under the
/// `checkpoint_restore` target. Writers check the configured level first.
#[derive(Debug, Default)]
pub struct VerboseLog {
    lines: Mutex<Vec<String>>,
}

impl VerboseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `line` when `configured` enables `required`.
    pub fn write(&self, configured: VerboseLevel, required: VerboseLevel, line: impl Into<String>) -> Result<bool> {
        if !configured.enabled(required) {
            return Ok(false);
        }
        let line = line.into();
        event!(target: "checkpoint_restore", Level::INFO, "{}", line);
        self.lines.lock()?.push(line);
        Ok(true)
    }

    pub fn lines(&self) -> Result<Vec<String>> {
        Ok(self.lines.lock()?.clone())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lines.lock()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_respects_level() {
        let log = VerboseLog::new();
        assert!(!log.write(VerboseLevel::Off, VerboseLevel::CheckpointRestore, "dropped").unwrap());
        assert!(
            !log.write(
                VerboseLevel::CheckpointRestore,
                VerboseLevel::CheckpointRestoreDetails,
                "too detailed"
            )
            .unwrap()
        );
        assert!(
            log.write(
                VerboseLevel::CheckpointRestoreDetails,
                VerboseLevel::CheckpointRestore,
                "kept"
            )
            .unwrap()
        );
        assert_eq!(log.lines().unwrap(), vec!["kept".to_string()]);
        assert!(!log.is_empty().unwrap());
    }
}
