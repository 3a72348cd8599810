use clap::ValueEnum;
use notify::EventKind;
use notify::event::{MetadataKind, ModifyKind, RenameMode};
use serde::Deserialize;

/// What a chain does after one of its commands fails to spawn or exits
/// non-zero.
///
/// - `ContinueOnFailure`: keep going with the next command (default). The
///   `&&` separator in the chain syntax reads like a short-circuit, but the
///   chain deliberately does not stop on failure.
/// - `StopOnFailure`: abandon the remaining commands of the current epoch.
///
/// In both modes a newer trigger still aborts the chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChainPolicy {
    #[default]
    ContinueOnFailure,
    StopOnFailure,
}

/// Kind of filesystem change the event source reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Write,
    Rename,
    Move,
}

impl ChangeKind {
    /// Map a notify event kind onto the four kinds we react to.
    ///
    /// Removals, accesses and non-timestamp metadata changes yield `None`.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Create),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(ChangeKind::Rename),
            EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::To)) => {
                Some(ChangeKind::Move)
            }
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
                Some(ChangeKind::Write)
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(ChangeKind::Write),
            _ => None,
        }
    }
}
