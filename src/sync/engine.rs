//! Three-way merge engine.
//!
//! A run compares the local deck file, the last snapshot and the live remote
//! deck, builds a [`SyncPlan`] without side effects, and then applies it in a
//! fixed order:
//!
//! 1. For a new deck: create the remote deck and rename the file to its
//!    id-bearing name, so a failed run is retried against the same deck
//! 2. Remote creates, updates, deletes (one call at a time)
//! 3. Local deck file rewrite
//! 4. Snapshot commit
//!
//! Any failure stops the run before the snapshot is committed, so the next
//! run diffs against the last good base again. Completed remote calls are
//! not rolled back; recreating an already created card is prevented by the
//! duplicate guard on the next run.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{index_by_id, Card, Deck};
use crate::remote::{CardListing, CardPayload, RemoteGateway, DEFAULT_PAGE_SIZE};
use crate::validate::validate_deck_file;

use super::codec;
use super::diff::diff;
use super::file::write_deck_file;
use super::guard::DuplicateGuard;
use super::prompt::Prompt;
use super::router::{deck_filename, deck_name_from_path, extract_remote_id, renamed_path};
use super::snapshot::{Snapshot, SnapshotStore};
use super::types::{
    Conflict, DuplicateWarning, MergePolicy, NewCard, PullReport, SyncPhase, SyncPlan, SyncReport,
};

/// Per-invocation engine settings.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub policy: MergePolicy,
    /// Disable the duplicate guard.
    pub force: bool,
    /// Stop after planning.
    pub dry_run: bool,
    pub page_size: usize,
}

impl SyncOptions {
    #[must_use]
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            force: false,
            dry_run: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Decide what one run must do. Pure: no I/O, no remote calls.
///
/// `local` is the validated deck file, `base` the last snapshot (empty before
/// the first sync) and `remote` the live listing.
///
/// # Errors
///
/// Under [`MergePolicy::Push`], returns [`Error::Consistency`] when local
/// cards reference ids the remote no longer has.
pub fn build_plan(
    policy: MergePolicy,
    force: bool,
    local: &[Card],
    base: &[Card],
    remote: &CardListing,
) -> Result<SyncPlan> {
    let remote_by_id = index_by_id(&remote.cards);
    let base_by_id = index_by_id(base);
    let local_ids: HashSet<&str> = local.iter().filter_map(|c| c.remote_id.as_deref()).collect();
    let local_diff = diff(base, local);
    let remote_diff = diff(base, &remote.cards);
    let remote_changed = remote_diff.modified_ids();

    let mut plan = SyncPlan::default();

    // Local cards whose id the remote listing lacks.
    let missing: Vec<&Card> = local
        .iter()
        .filter(|c| {
            c.remote_id
                .as_deref()
                .is_some_and(|id| !remote_by_id.contains_key(id))
        })
        .collect();
    if !missing.is_empty() {
        if remote.truncated {
            plan.unverified.extend(missing.iter().map(|c| (*c).clone()));
        } else {
            match policy {
                MergePolicy::Push => {
                    return Err(Error::Consistency {
                        missing: missing
                            .iter()
                            .filter_map(|c| {
                                c.remote_id.clone().map(|id| (id, c.preview(60)))
                            })
                            .collect(),
                    });
                }
                MergePolicy::Sync => {
                    plan.to_delete_local.extend(missing.iter().map(|c| (*c).clone()));
                }
            }
        }
    }

    // Removed from the local file since the last sync.
    for card in &local_diff.deleted {
        let Some(id) = card.remote_id.as_deref() else {
            continue;
        };
        if remote_by_id.contains_key(id) {
            plan.to_delete_remote.push(card.clone());
        } else if remote.truncated {
            plan.unverified.push(card.clone());
        }
    }

    // Never-synced local cards.
    let deleting: HashSet<&str> = plan
        .to_delete_remote
        .iter()
        .filter_map(|c| c.remote_id.as_deref())
        .collect();
    let guard = if force {
        DuplicateGuard::disabled()
    } else {
        let surviving: Vec<Card> = remote
            .cards
            .iter()
            .filter(|c| c.remote_id.as_deref().is_none_or(|id| !deleting.contains(id)))
            .cloned()
            .collect();
        DuplicateGuard::new(&surviving)
    };
    let mut linked: HashSet<String> = HashSet::new();
    for (position, card) in local.iter().enumerate() {
        if card.remote_id.is_some() {
            continue;
        }
        match guard.would_duplicate(card) {
            Some(existing) => {
                let linkable = policy == MergePolicy::Sync
                    && !local_ids.contains(existing)
                    && !linked.contains(existing);
                if linkable {
                    linked.insert(existing.to_string());
                }
                plan.duplicates.push(DuplicateWarning {
                    position,
                    card: card.clone(),
                    existing_id: existing.to_string(),
                    linked: linkable,
                });
            }
            None => plan.to_create_remote.push(NewCard {
                position,
                card: card.clone(),
            }),
        }
    }

    // Edited cards, and ids the snapshot does not know.
    for card in local {
        let Some(id) = card.remote_id.as_deref() else {
            continue;
        };
        let Some(remote_card) = remote_by_id.get(id) else {
            continue;
        };

        match base_by_id.get(id) {
            Some(base_card) => {
                if !base_card.same_content(card) {
                    if !card.same_content(remote_card) {
                        if remote_changed.contains(id) {
                            plan.conflicts.push(Conflict {
                                card_id: id.to_string(),
                                local: card.clone(),
                                remote: (*remote_card).clone(),
                            });
                        }
                        plan.to_update_remote.push(card.clone());
                    }
                } else if remote_changed.contains(id) && policy == MergePolicy::Sync {
                    if codec::is_representable(remote_card) {
                        plan.to_update_local.push((*remote_card).clone());
                    } else {
                        plan.unrepresentable.push((*remote_card).clone());
                    }
                }
            }
            None => {
                if !card.same_content(remote_card) {
                    plan.to_update_remote.push(card.clone());
                }
            }
        }
    }

    // Added on the remote side since the last sync.
    if policy == MergePolicy::Sync {
        let added = remote.cards.iter().filter(|c| {
            c.remote_id.as_deref().is_some_and(|id| {
                !base_by_id.contains_key(id) && !local_ids.contains(id) && !linked.contains(id)
            })
        });
        for card in added {
            if codec::is_representable(card) {
                plan.to_add_local.push(card.clone());
            } else {
                plan.unrepresentable.push(card.clone());
            }
        }
    }

    Ok(plan)
}

/// The agreed base after a run.
///
/// For each card the file now tracks: the card itself when the remote holds
/// the same content, otherwise its previous base entry. Cards whose remote
/// state could not be verified keep their previous base entry.
fn next_base(
    merged: &[Card],
    base: &[Card],
    remote_after: &HashMap<String, Card>,
    unverified: &[Card],
) -> Vec<Card> {
    let base_by_id = index_by_id(base);
    let unverified_ids: HashSet<&str> = unverified
        .iter()
        .filter_map(|c| c.remote_id.as_deref())
        .collect();

    let mut cards = Vec::with_capacity(merged.len());
    for card in merged {
        let Some(id) = card.remote_id.as_deref() else {
            continue;
        };
        if unverified_ids.contains(id) {
            continue;
        }
        match remote_after.get(id) {
            Some(remote_card) if remote_card.same_content(card) => cards.push(card.clone()),
            _ => {
                if let Some(base_card) = base_by_id.get(id) {
                    cards.push((*base_card).clone());
                }
            }
        }
    }
    let mut kept: HashSet<&str> = HashSet::new();
    for id in unverified_ids {
        if let Some(base_card) = base_by_id.get(id) {
            if kept.insert(id) {
                cards.push((*base_card).clone());
            }
        }
    }
    cards
}

/// Validate a deck file and read its identity from the filename.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for a name that is not a deck
/// filename, or [`Error::Format`] for malformed content.
pub fn load_local_deck(path: &Path) -> Result<Deck> {
    let remote_id = extract_remote_id(path)?;
    let name = deck_name_from_path(path)?;
    let cards = validate_deck_file(path)?;
    Ok(Deck::new(remote_id, name, cards))
}

/// Drives one deck file through a push or sync.
pub struct SyncEngine<'a, G, P> {
    gateway: &'a G,
    prompt: &'a mut P,
    options: SyncOptions,
    phase: Option<SyncPhase>,
}

impl<'a, G: RemoteGateway, P: Prompt> SyncEngine<'a, G, P> {
    pub fn new(gateway: &'a G, prompt: &'a mut P, options: SyncOptions) -> Self {
        Self {
            gateway,
            prompt,
            options,
            phase: None,
        }
    }

    /// Last phase reached, `None` before the deck file was loaded.
    #[must_use]
    pub fn phase(&self) -> Option<SyncPhase> {
        self.phase
    }

    fn advance(&mut self, phase: SyncPhase) {
        debug!(%phase, "Sync phase");
        self.phase = Some(phase);
    }

    /// Push or sync one deck file.
    ///
    /// # Errors
    ///
    /// Returns the first validation, consistency, remote or I/O error, or
    /// [`Error::Aborted`] if the user declines the plan.
    pub async fn run(&mut self, path: &Path) -> Result<SyncReport> {
        let SyncOptions {
            policy,
            force,
            dry_run,
            page_size,
        } = self.options;

        let Deck {
            remote_id: deck_id,
            name: deck_name,
            cards: local,
        } = load_local_deck(path)?;
        let store = SnapshotStore::for_deck_file(path);
        self.advance(SyncPhase::Loaded);
        info!(file = %path.display(), cards = local.len(), %policy, "Loaded deck");

        let (base, listing) = match deck_id.as_deref() {
            Some(id) => {
                let base = store.load_cards(id)?;
                let listing = self.gateway.list_cards(id, page_size).await?;
                (base, listing)
            }
            None => (Vec::new(), CardListing::default()),
        };
        if listing.truncated {
            warn!(
                fetched = listing.cards.len(),
                "Remote listing incomplete; cards missing from it are left untouched"
            );
        }
        self.advance(SyncPhase::Diffed);

        let plan = build_plan(policy, force, &local, &base, &listing)?;
        self.advance(SyncPhase::PlanBuilt);

        for conflict in &plan.conflicts {
            warn!(card_id = %conflict.card_id, "Card changed locally and remotely; keeping local version");
        }
        for dup in &plan.duplicates {
            if dup.linked {
                info!(existing = %dup.existing_id, "Linked new local card to identical remote card");
            } else {
                warn!(existing = %dup.existing_id, card = %dup.card.preview(60), "Skipping duplicate card");
            }
        }
        for card in &plan.unrepresentable {
            warn!(
                card_id = card.remote_id.as_deref().unwrap_or_default(),
                card = %card.preview(60),
                "Remote card has more than one `---` line; leaving it out of the deck file"
            );
        }

        let mut report = SyncReport {
            file: path.to_path_buf(),
            deck_id: deck_id.clone(),
            deck_name: deck_name.clone(),
            duplicates: plan.duplicates.clone(),
            conflicts: plan.conflicts.clone(),
            unverified: plan.unverified.len(),
            unrepresentable: plan.unrepresentable.len(),
            truncated: listing.truncated,
            dry_run,
            ..SyncReport::default()
        };

        if dry_run {
            report.created_remote = plan.to_create_remote.len();
            report.updated_remote = plan.to_update_remote.len();
            report.deleted_remote = plan.to_delete_remote.len();
            report.added_local = plan.to_add_local.len();
            report.updated_local = plan.to_update_local.len();
            report.deleted_local = plan.to_delete_local.len();
            return Ok(report);
        }

        if deck_id.is_none() || !plan.is_empty() {
            let message = confirmation_message(path, deck_id.is_none(), &plan);
            if !self.prompt.confirm(&message)? {
                return Err(Error::Aborted);
            }
        }

        let mut file = path.to_path_buf();
        let deck_id = match deck_id {
            Some(id) => id,
            None => {
                let id = self.gateway.create_deck(&deck_name).await?;
                info!(deck_id = %id, name = %deck_name, "Created remote deck");
                file = rename_to_deck_id(path, &deck_name, &id)?;
                report.renamed_to = Some(file.clone());
                id
            }
        };
        report.deck_id = Some(deck_id.clone());

        // Remote mutations: creates, then updates, then deletes.
        let mut created_guard = if force {
            DuplicateGuard::disabled()
        } else {
            DuplicateGuard::new(&[])
        };
        let mut created: HashMap<usize, String> = HashMap::new();
        for new in &plan.to_create_remote {
            if let Some(existing) = created_guard.would_duplicate(&new.card) {
                warn!(existing, card = %new.card.preview(60), "Skipping card identical to one created this run");
                report.duplicates.push(DuplicateWarning {
                    position: new.position,
                    card: new.card.clone(),
                    existing_id: existing.to_string(),
                    linked: false,
                });
                continue;
            }
            let id = self
                .gateway
                .create_card(&deck_id, &CardPayload::from(&new.card))
                .await?;
            debug!(card_id = %id, "Created card");
            created_guard.record(&new.card.clone().with_id(id.clone()));
            created.insert(new.position, id);
        }
        for card in &plan.to_update_remote {
            let Some(id) = card.remote_id.as_deref() else {
                continue;
            };
            self.gateway.update_card(id, &CardPayload::from(card)).await?;
            debug!(card_id = id, "Updated card");
        }
        for card in &plan.to_delete_remote {
            let Some(id) = card.remote_id.as_deref() else {
                continue;
            };
            self.gateway.delete_card(id).await?;
            debug!(card_id = id, "Deleted card");
        }
        self.advance(SyncPhase::RemoteApplied);

        // Local file.
        let linked: HashMap<usize, &str> = plan
            .duplicates
            .iter()
            .filter(|d| d.linked)
            .map(|d| (d.position, d.existing_id.as_str()))
            .collect();
        let removed: HashSet<&str> = plan
            .to_delete_local
            .iter()
            .filter_map(|c| c.remote_id.as_deref())
            .collect();
        let pulled = index_by_id(&plan.to_update_local);

        let mut merged = Vec::with_capacity(local.len() + plan.to_add_local.len());
        for (position, card) in local.iter().enumerate() {
            match card.remote_id.as_deref() {
                None => {
                    let id = created
                        .get(&position)
                        .map(String::as_str)
                        .or_else(|| linked.get(&position).copied());
                    merged.push(match id {
                        Some(id) => card.clone().with_id(id),
                        None => card.clone(),
                    });
                }
                Some(id) if removed.contains(id) => {}
                Some(id) => merged.push(pulled.get(id).map_or_else(|| card.clone(), |c| (*c).clone())),
            }
        }
        merged.extend(plan.to_add_local.iter().cloned());

        if merged != local {
            write_deck_file(&file, &merged)?;
        }
        self.advance(SyncPhase::LocalApplied);

        // Snapshot.
        let mut remote_after: HashMap<String, Card> = listing
            .cards
            .iter()
            .filter_map(|c| c.remote_id.clone().map(|id| (id, c.clone())))
            .collect();
        for card in &plan.to_update_remote {
            if let Some(id) = &card.remote_id {
                remote_after.insert(id.clone(), card.clone());
            }
        }
        for card in &plan.to_delete_remote {
            if let Some(id) = &card.remote_id {
                remote_after.remove(id);
            }
        }
        for (position, id) in &created {
            remote_after.insert(id.clone(), local[*position].clone().with_id(id.clone()));
        }

        let agreed = next_base(&merged, &base, &remote_after, &plan.unverified);
        store.commit(&Snapshot::new(&deck_id, &deck_name, agreed))?;
        self.advance(SyncPhase::SnapshotCommitted);

        report.created_remote = created.len();
        report.updated_remote = plan.to_update_remote.len();
        report.deleted_remote = plan.to_delete_remote.len();
        report.added_local = plan.to_add_local.len();
        report.updated_local = plan.to_update_local.len();
        report.deleted_local = plan.to_delete_local.len();
        info!(deck_id = %deck_id, changes = report.total_changes(), %policy, "Deck done");
        Ok(report)
    }
}

/// Give a new deck file its id-bearing name.
///
/// Refuses to replace an existing file of that name.
fn rename_to_deck_id(path: &Path, deck_name: &str, deck_id: &str) -> Result<PathBuf> {
    let target = renamed_path(path, deck_name, deck_id);
    if target.exists() {
        return Err(Error::InvalidArgument(format!(
            "Cannot rename {} to {}: file already exists",
            path.display(),
            target.display()
        )));
    }
    fs::rename(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "Renamed deck file");
    Ok(target)
}

fn confirmation_message(path: &Path, new_deck: bool, plan: &SyncPlan) -> String {
    let mut lines = Vec::new();
    if new_deck {
        lines.push(format!("Create a new remote deck for {}", path.display()));
    }
    lines.extend(plan.summary_lines());
    if !plan.to_delete_local.is_empty() {
        lines.push("Deleted remotely, will be removed locally:".to_string());
        for card in &plan.to_delete_local {
            lines.push(format!(
                "    {}: {}",
                card.remote_id.as_deref().unwrap_or_default(),
                card.preview(60)
            ));
        }
    }
    lines.push("Proceed?".to_string());
    lines.join("\n")
}

/// Write a remote deck to `dir` as a deck file and record it as the base.
///
/// # Errors
///
/// Returns a remote or I/O error, or [`Error::Aborted`] if the file exists
/// and the user declines to overwrite it.
pub async fn pull_deck<G: RemoteGateway, P: Prompt>(
    gateway: &G,
    prompt: &mut P,
    deck_id: &str,
    dir: &Path,
    page_size: usize,
) -> Result<PullReport> {
    let deck = gateway.get_deck(deck_id).await?;
    let listing = gateway.list_cards(&deck.id, page_size).await?;
    if listing.truncated {
        warn!(
            fetched = listing.cards.len(),
            "Remote listing incomplete; run `mochi sync` later to fetch the rest"
        );
    }

    let path = dir.join(deck_filename(&deck.name, Some(&deck.id)));
    if path.exists()
        && !prompt.confirm(&format!("{} already exists. Overwrite?", path.display()))?
    {
        return Err(Error::Aborted);
    }

    let truncated = listing.truncated;
    let (cards, unrepresentable): (Vec<Card>, Vec<Card>) = listing
        .cards
        .into_iter()
        .partition(codec::is_representable);
    for card in &unrepresentable {
        warn!(
            card_id = card.remote_id.as_deref().unwrap_or_default(),
            card = %card.preview(60),
            "Remote card has more than one `---` line; leaving it out of the deck file"
        );
    }

    write_deck_file(&path, &cards)?;
    SnapshotStore::for_deck_dir(dir).commit(&Snapshot::new(&deck.id, &deck.name, cards.clone()))?;
    info!(deck_id = %deck.id, cards = cards.len(), file = %path.display(), "Pulled deck");

    Ok(PullReport {
        file: path,
        deck_id: deck.id,
        deck_name: deck.name,
        cards: cards.len(),
        unrepresentable: unrepresentable.len(),
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, q: &str, a: &str) -> Card {
        Card::new(q, a).with_id(id)
    }

    fn listing(cards: Vec<Card>) -> CardListing {
        CardListing::complete(cards)
    }

    #[test]
    fn test_push_rejects_remote_deletions() {
        let local = vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")];
        let base = local.clone();
        let remote = listing(vec![card("Card0001", "Q1", "A1")]);

        let err = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap_err();
        match err {
            Error::Consistency { missing } => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].0, "Card0002");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sync_plans_local_removal_of_remote_deletions() {
        let local = vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")];
        let base = local.clone();
        let remote = listing(vec![card("Card0001", "Q1", "A1")]);

        let plan = build_plan(MergePolicy::Sync, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.to_delete_local.len(), 1);
        assert_eq!(plan.to_delete_local[0].remote_id.as_deref(), Some("Card0002"));
        assert_eq!(plan.remote_mutations(), 0);
    }

    #[test]
    fn test_truncated_listing_leaves_missing_cards_unverified() {
        let local = vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")];
        let base = local.clone();
        let remote = CardListing {
            cards: vec![card("Card0001", "Q1", "A1")],
            truncated: true,
        };

        let plan = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.unverified.len(), 1);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_new_card_is_created_unless_duplicate() {
        let local = vec![Card::new("Fresh", "Card"), Card::new("Q1", "A1")];
        let remote = listing(vec![card("Card0001", "Q1", "A1")]);

        let plan = build_plan(MergePolicy::Push, false, &local, &[], &remote).unwrap();
        assert_eq!(plan.to_create_remote.len(), 1);
        assert_eq!(plan.to_create_remote[0].position, 0);
        assert_eq!(plan.duplicates.len(), 1);
        assert_eq!(plan.duplicates[0].existing_id, "Card0001");
        assert!(!plan.duplicates[0].linked);

        let forced = build_plan(MergePolicy::Push, true, &local, &[], &remote).unwrap();
        assert_eq!(forced.to_create_remote.len(), 2);
        assert!(forced.duplicates.is_empty());
    }

    #[test]
    fn test_sync_links_duplicate_of_untracked_remote_card() {
        let local = vec![Card::new("Q1", "A1")];
        let remote = listing(vec![card("Card0001", "Q1", "A1")]);

        let plan = build_plan(MergePolicy::Sync, false, &local, &[], &remote).unwrap();
        assert!(plan.duplicates[0].linked);
        assert!(plan.to_add_local.is_empty());
        assert!(plan.to_create_remote.is_empty());
    }

    #[test]
    fn test_local_edit_updates_remote() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let local = vec![card("Card0001", "Q1", "A1 edited")];
        let remote = listing(base.clone());

        let plan = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.to_update_remote, local);
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_conflict_keeps_local() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let local = vec![card("Card0001", "Q1", "local answer")];
        let remote = listing(vec![card("Card0001", "Q1", "remote answer")]);

        let plan = build_plan(MergePolicy::Sync, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.to_update_remote, local);
        assert!(plan.to_update_local.is_empty());
    }

    #[test]
    fn test_identical_edits_on_both_sides_need_nothing() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let local = vec![card("Card0001", "Q1", "same")];
        let remote = listing(local.clone());

        let plan = build_plan(MergePolicy::Sync, false, &local, &base, &remote).unwrap();
        assert!(plan.is_empty());
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn test_untracked_id_compared_with_remote() {
        let local = vec![card("Card0001", "Q1", "local")];
        let remote = listing(vec![card("Card0001", "Q1", "remote")]);

        let plan = build_plan(MergePolicy::Sync, false, &local, &[], &remote).unwrap();
        assert_eq!(plan.to_update_remote, local);

        let same = listing(local.clone());
        let plan = build_plan(MergePolicy::Sync, false, &local, &[], &same).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_remote_edit_pulled_only_by_sync() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let local = base.clone();
        let remote = listing(vec![card("Card0001", "Q1", "A1 remote")]);

        let push = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert!(push.is_empty());

        let sync = build_plan(MergePolicy::Sync, false, &local, &base, &remote).unwrap();
        assert_eq!(sync.to_update_local, remote.cards);
    }

    #[test]
    fn test_remote_addition_pulled_only_by_sync() {
        let local = vec![card("Card0001", "Q1", "A1")];
        let base = local.clone();
        let remote = listing(vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")]);

        let push = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert!(push.to_add_local.is_empty());

        let sync = build_plan(MergePolicy::Sync, false, &local, &base, &remote).unwrap();
        assert_eq!(sync.to_add_local.len(), 1);
    }

    #[test]
    fn test_local_deletion_propagates() {
        let base = vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")];
        let local = vec![card("Card0001", "Q1", "A1")];
        let remote = listing(base.clone());

        let plan = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.to_delete_remote.len(), 1);
        assert_eq!(plan.to_delete_remote[0].remote_id.as_deref(), Some("Card0002"));
    }

    #[test]
    fn test_readded_card_is_not_a_duplicate_of_deleted_one() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let local = vec![Card::new("Q1", "A1")];
        let remote = listing(base.clone());

        let plan = build_plan(MergePolicy::Push, false, &local, &base, &remote).unwrap();
        assert_eq!(plan.to_delete_remote.len(), 1);
        assert_eq!(plan.to_create_remote.len(), 1);
    }

    #[test]
    fn test_next_base_keeps_unpulled_remote_changes_out() {
        let base = vec![card("Card0001", "Q1", "A1")];
        let merged = base.clone();
        let remote_after: HashMap<String, Card> =
            [("Card0001".to_string(), card("Card0001", "Q1", "A1 remote"))].into();

        let next = next_base(&merged, &base, &remote_after, &[]);
        assert_eq!(next, base);
    }

    #[test]
    fn test_next_base_keeps_unverified_entries() {
        let base = vec![card("Card0001", "Q1", "A1"), card("Card0002", "Q2", "A2")];
        let merged = vec![card("Card0001", "Q1", "A1")];
        let remote_after: HashMap<String, Card> =
            [("Card0001".to_string(), card("Card0001", "Q1", "A1"))].into();
        let unverified = vec![card("Card0002", "Q2", "A2")];

        let next = next_base(&merged, &base, &remote_after, &unverified);
        assert_eq!(next, base);
    }
}
