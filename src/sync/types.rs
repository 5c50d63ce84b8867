//! Plan, report and policy types for deck synchronization.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::model::Card;

/// How the merge engine treats remote-side changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// One-way: local changes go up, remote deletions are a hard error and
    /// remote edits are left on the server.
    Push,
    /// Two-way: remote edits, additions and deletions also come down.
    Sync,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Sync => write!(f, "sync"),
        }
    }
}

/// Progress of one engine run. Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Loaded,
    Diffed,
    PlanBuilt,
    RemoteApplied,
    LocalApplied,
    SnapshotCommitted,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Diffed => "diffed",
            Self::PlanBuilt => "plan_built",
            Self::RemoteApplied => "remote_applied",
            Self::LocalApplied => "local_applied",
            Self::SnapshotCommitted => "snapshot_committed",
        };
        f.write_str(name)
    }
}

/// A never-synced local card, with its index in the local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCard {
    pub position: usize,
    pub card: Card,
}

/// A local card that was not created because the remote already has it.
///
/// `linked` is set when the local card adopted the existing remote id
/// instead of staying unsynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateWarning {
    pub position: usize,
    pub card: Card,
    pub existing_id: String,
    pub linked: bool,
}

/// A card changed on both sides since the last sync. The local side wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub card_id: String,
    pub local: Card,
    pub remote: Card,
}

/// Everything one run intends to do, computed before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_create_remote: Vec<NewCard>,
    /// Local versions to upload.
    pub to_update_remote: Vec<Card>,
    /// Base versions of cards to delete remotely.
    pub to_delete_remote: Vec<Card>,
    /// Remote cards new to this file.
    pub to_add_local: Vec<Card>,
    /// Remote versions replacing unchanged local cards.
    pub to_update_local: Vec<Card>,
    /// Local cards whose remote counterpart is gone.
    pub to_delete_local: Vec<Card>,
    pub duplicates: Vec<DuplicateWarning>,
    pub conflicts: Vec<Conflict>,
    /// Local cards missing from a truncated remote listing.
    pub unverified: Vec<Card>,
    /// Remote cards the deck file format cannot hold. They stay out of the
    /// file and the snapshot.
    pub unrepresentable: Vec<Card>,
}

impl SyncPlan {
    /// Number of remote create/update/delete calls planned.
    #[must_use]
    pub fn remote_mutations(&self) -> usize {
        self.to_create_remote.len() + self.to_update_remote.len() + self.to_delete_remote.len()
    }

    /// Number of local file changes planned, counting linked duplicates.
    #[must_use]
    pub fn local_changes(&self) -> usize {
        self.to_add_local.len()
            + self.to_update_local.len()
            + self.to_delete_local.len()
            + self.duplicates.iter().filter(|d| d.linked).count()
    }

    /// True when the run would change nothing on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote_mutations() == 0 && self.local_changes() == 0
    }

    /// One line per non-empty category, for confirmation prompts.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let counts = [
            (self.to_create_remote.len(), "create on remote"),
            (self.to_update_remote.len(), "update on remote"),
            (self.to_delete_remote.len(), "delete on remote"),
            (self.to_add_local.len(), "add to local file"),
            (self.to_update_local.len(), "update in local file"),
            (self.to_delete_local.len(), "remove from local file"),
        ];
        counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, what)| format!("{n} to {what}"))
            .collect()
    }
}

/// Outcome of one engine run, printed by the CLI or emitted as JSON.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub file: PathBuf,
    pub deck_id: Option<String>,
    pub deck_name: String,
    pub created_remote: usize,
    pub updated_remote: usize,
    pub deleted_remote: usize,
    pub added_local: usize,
    pub updated_local: usize,
    pub deleted_local: usize,
    pub duplicates: Vec<DuplicateWarning>,
    pub conflicts: Vec<Conflict>,
    pub unverified: usize,
    pub unrepresentable: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<PathBuf>,
    pub dry_run: bool,
}

impl SyncReport {
    /// Total changes applied on both sides.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.created_remote
            + self.updated_remote
            + self.deleted_remote
            + self.added_local
            + self.updated_local
            + self.deleted_local
    }
}

/// Outcome of writing a remote deck to a local file.
#[derive(Debug, Clone, Serialize)]
pub struct PullReport {
    pub file: PathBuf,
    pub deck_id: String,
    pub deck_name: String,
    pub cards: usize,
    /// Remote cards left out because the deck file format cannot hold them.
    pub unrepresentable: usize,
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan() {
        let plan = SyncPlan::default();
        assert!(plan.is_empty());
        assert!(plan.summary_lines().is_empty());
    }

    #[test]
    fn test_plan_counts_and_summary() {
        let plan = SyncPlan {
            to_create_remote: vec![NewCard {
                position: 0,
                card: Card::new("Q", "A"),
            }],
            to_delete_local: vec![Card::new("Q2", "A2").with_id("Gone0001")],
            ..SyncPlan::default()
        };
        assert_eq!(plan.remote_mutations(), 1);
        assert_eq!(plan.local_changes(), 1);
        assert!(!plan.is_empty());
        assert_eq!(
            plan.summary_lines(),
            vec!["1 to create on remote", "1 to remove from local file"]
        );
    }

    #[test]
    fn test_unlinked_duplicate_is_not_a_change() {
        let plan = SyncPlan {
            duplicates: vec![DuplicateWarning {
                position: 0,
                card: Card::new("Q", "A"),
                existing_id: "AbCdEfGh".into(),
                linked: false,
            }],
            ..SyncPlan::default()
        };
        assert!(plan.is_empty());
    }

    #[test]
    fn test_phase_order() {
        assert!(SyncPhase::Loaded < SyncPhase::PlanBuilt);
        assert!(SyncPhase::LocalApplied < SyncPhase::SnapshotCommitted);
        assert_eq!(SyncPhase::PlanBuilt.to_string(), "plan_built");
    }

    #[test]
    fn test_report_total() {
        let report = SyncReport {
            created_remote: 2,
            deleted_local: 1,
            ..SyncReport::default()
        };
        assert_eq!(report.total_changes(), 3);
    }
}
