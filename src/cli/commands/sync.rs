//! `mochi push` and `mochi sync`.
//!
//! Both run the merge engine over one deck file, or over every deck file in
//! the current directory when none is given. Files are validated before any
//! configuration is loaded or network call is made.

use std::env;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use crate::cli::commands::prompt::CliPrompt;
use crate::cli::commands::{mochi_client, runtime, GlobalArgs};
use crate::error::{Error, Result};
use crate::sync::router::find_deck_files;
use crate::sync::{load_local_deck, MergePolicy, Prompt, SyncEngine, SyncOptions, SyncReport};

/// Run `policy` over `file`, or over every deck file in the working
/// directory.
pub fn execute(policy: MergePolicy, file: Option<&Path>, force: bool, args: &GlobalArgs) -> Result<()> {
    let batch = file.is_none();
    let files = match file {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let dir = env::current_dir()?;
            let files = find_deck_files(&dir)?;
            if files.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "No deck-*.md files found in {}",
                    dir.display()
                )));
            }
            files
        }
    };

    for path in &files {
        if !path.is_file() {
            return Err(Error::InvalidArgument(format!("Deck file not found: {}", path.display())));
        }
        load_local_deck(path)?;
    }

    let mut prompt = CliPrompt::new(args.yes);
    if batch && !args.dry_run {
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        let message = format!("{} {} deck file(s): {}?", capitalized(policy), files.len(), names.join(", "));
        if !prompt.confirm(&message)? {
            return Err(Error::Aborted);
        }
    }

    let mut config = args.load_config()?;
    let client = mochi_client(&mut config)?;
    let rt = runtime()?;
    let options = SyncOptions::new(policy).force(force).dry_run(args.dry_run);

    let mut reports = Vec::with_capacity(files.len());
    let mut skipped: Vec<PathBuf> = Vec::new();
    for path in &files {
        let mut engine = SyncEngine::new(&client, &mut prompt, options);
        match rt.block_on(engine.run(path)) {
            Ok(report) => {
                if args.human() {
                    print_report(policy, &report);
                }
                reports.push(report);
            }
            // One declined deck does not stop the rest of a batch.
            Err(Error::Aborted) if batch => {
                info!(file = %path.display(), "Skipped by user");
                if args.human() {
                    println!("{} {}", "-".dimmed(), format!("{} skipped", display_name(path)).dimmed());
                }
                skipped.push(path.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if args.json {
        let output = serde_json::json!({
            "command": policy,
            "dry_run": args.dry_run,
            "decks": reports,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if args.human() && files.len() > 1 {
        let changes: usize = reports.iter().map(SyncReport::total_changes).sum();
        println!();
        println!("{} deck(s), {changes} change(s)", reports.len());
    }
    Ok(())
}

fn capitalized(policy: MergePolicy) -> &'static str {
    match policy {
        MergePolicy::Push => "Push",
        MergePolicy::Sync => "Sync",
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn print_report(policy: MergePolicy, report: &SyncReport) {
    let name = display_name(report.renamed_to.as_deref().unwrap_or(&report.file));
    let verb = match (report.dry_run, policy) {
        (true, _) => "would change",
        (false, MergePolicy::Push) => "pushed",
        (false, MergePolicy::Sync) => "synced",
    };

    if report.total_changes() == 0 {
        println!("{} {name} up to date", "✓".green());
    } else {
        println!("{} {name} {verb}", "✓".green());
        println!(
            "    remote: {} created, {} updated, {} deleted",
            report.created_remote, report.updated_remote, report.deleted_remote
        );
        if policy == MergePolicy::Sync {
            println!(
                "    local:  {} added, {} updated, {} removed",
                report.added_local, report.updated_local, report.deleted_local
            );
        }
    }

    if let Some(renamed) = &report.renamed_to {
        println!("    renamed {} -> {}", display_name(&report.file), display_name(renamed));
    }
    let skipped = report.duplicates.iter().filter(|d| !d.linked).count();
    if skipped > 0 {
        println!(
            "{}",
            format!("    {skipped} duplicate card(s) not created; use --force to create them anyway").yellow()
        );
    }
    if !report.conflicts.is_empty() {
        println!(
            "{}",
            format!("    {} card(s) changed on both sides; local version kept", report.conflicts.len()).yellow()
        );
    }
    if report.unrepresentable > 0 {
        println!(
            "{}",
            format!(
                "    {} multi-side remote card(s) left out of the file",
                report.unrepresentable
            )
            .yellow()
        );
    }
    if report.truncated {
        println!(
            "{}",
            format!(
                "    remote listing incomplete; {} card(s) left untouched until the next run",
                report.unverified
            )
            .yellow()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/decks/deck-foo.md")), "deck-foo.md");
        assert_eq!(display_name(Path::new("deck-foo.md")), "deck-foo.md");
    }
}
