use std::path::PathBuf;

use notify::event::ModifyKind;
use notify::event::RenameMode;
use notify::EventKind;

/// Kind of change reported for the configuration source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEventKind {
    /// Contents of the source were written
    Write,
    /// Source was (re)created
    Create,
    /// Anything else: removal, rename, metadata, access
    Other,
}

impl ConfigEventKind {
    /// Only writes and creations change what the source declares.
    pub fn triggers_reconcile(self) -> bool {
        matches!(self, ConfigEventKind::Write | ConfigEventKind::Create)
    }
}

/// Change notification for the configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEvent {
    pub kind: ConfigEventKind,
    pub path: PathBuf,
}

impl ConfigEvent {
    pub fn new(
        kind: ConfigEventKind,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl From<&EventKind> for ConfigEventKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            // a file renamed onto the watched path replaces it, as editors do on save
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                ConfigEventKind::Create
            }
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                ConfigEventKind::Write
            }
            _ => ConfigEventKind::Other,
        }
    }
}
