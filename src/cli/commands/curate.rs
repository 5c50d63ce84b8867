//! `mochi curate`: grade cards and archive the weak ones.

use std::path::Path;

use colored::Colorize;
use tracing::info;

use crate::cli::commands::prompt::CliPrompt;
use crate::cli::commands::{runtime, GlobalArgs};
use crate::curation::grade::MAX_SCORE;
use crate::curation::{grade_cards, select_below, GradedCard, OpenRouterClient};
use crate::error::{Error, Result};
use crate::model::Card;
use crate::sync::{write_deck_file, Prompt};
use crate::validate::validate_deck_file;

/// Grade every active card in `file` and, after confirmation, mark the ones
/// scoring below `min_score` as archived.
pub fn execute(file: &Path, min_score: u8, args: &GlobalArgs) -> Result<()> {
    if min_score > MAX_SCORE {
        return Err(Error::InvalidArgument(format!(
            "threshold must be between 0 and {MAX_SCORE}, got {min_score}"
        )));
    }
    let mut cards = validate_deck_file(file)?;

    let config = args.load_config()?;
    let client = OpenRouterClient::new(config.require_openrouter_key()?)?;
    let rt = runtime()?;

    if args.human() {
        let active = cards.iter().filter(|c| !c.archived).count();
        println!("Grading {active} card(s)...");
    }
    let graded = rt.block_on(grade_cards(&client, &cards));
    let ungraded = graded.iter().filter(|g| g.grade.is_none()).count();
    let weak = select_below(&graded, min_score);
    info!(graded = graded.len(), weak = weak.len(), ungraded, "Grading finished");

    if args.human() {
        print_weak(&cards, &weak, min_score, ungraded);
    }

    let archive: Vec<usize> = weak.iter().map(|g| g.index).collect();
    if archive.is_empty() || args.dry_run {
        print_json(file, &graded, 0, args)?;
        return Ok(());
    }

    let mut prompt = CliPrompt::new(args.yes);
    if !prompt.confirm(&format!("Archive {} card(s) in {}?", archive.len(), file.display()))? {
        return Err(Error::Aborted);
    }

    for &index in &archive {
        if let Some(card) = cards.get_mut(index) {
            card.archived = true;
        }
    }
    write_deck_file(file, &cards)?;
    info!(archived = archive.len(), file = %file.display(), "Archived weak cards");

    print_json(file, &graded, archive.len(), args)?;
    if args.human() {
        println!(
            "{} Archived {} card(s). Run `mochi sync` to archive them remotely.",
            "✓".green(),
            archive.len()
        );
    }
    Ok(())
}

fn print_json(file: &Path, graded: &[GradedCard], archived: usize, args: &GlobalArgs) -> Result<()> {
    if args.json {
        let output = serde_json::json!({
            "file": file,
            "dry_run": args.dry_run,
            "grades": graded,
            "archived": archived,
        });
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

fn print_weak(cards: &[Card], weak: &[&GradedCard], min_score: u8, ungraded: usize) {
    if ungraded > 0 {
        println!("{}", format!("{ungraded} card(s) could not be graded and are kept").yellow());
    }
    if weak.is_empty() {
        println!("{} No cards below {min_score}/{MAX_SCORE}.", "✓".green());
        return;
    }

    println!("{} card(s) below {min_score}/{MAX_SCORE}:", weak.len());
    for g in weak {
        let (Some(grade), Some(card)) = (&g.grade, cards.get(g.index)) else {
            continue;
        };
        println!();
        println!("  [{}/{MAX_SCORE}] {}", grade.score.to_string().red().bold(), card.preview(80));
        println!("         {}", grade.reasoning.dimmed());
    }
    println!();
}
