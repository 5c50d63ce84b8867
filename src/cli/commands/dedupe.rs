//! `mochi dedupe`: find and remove semantically duplicate cards.

use std::path::Path;

use colored::Colorize;
use tracing::info;

use crate::cli::commands::prompt::CliPrompt;
use crate::cli::commands::{runtime, GlobalArgs};
use crate::curation::{
    classify_pair, embed_cards, find_similar_pairs, resolve_pairs, Classification, ClassifiedPair,
    OpenRouterClient,
};
use crate::error::{Error, Result};
use crate::sync::{write_deck_file, Prompt};
use crate::validate::validate_deck_file;

/// Embed, pair, classify and let the user prune duplicates from `file`.
///
/// Only the local file changes; the next `push` or `sync` deletes the removed
/// cards remotely.
pub fn execute(file: &Path, threshold: f32, args: &GlobalArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::InvalidArgument(format!(
            "threshold must be between 0.0 and 1.0, got {threshold}"
        )));
    }
    let cards = validate_deck_file(file)?;
    if cards.len() < 2 {
        if args.json {
            println!("{}", serde_json::json!({ "file": file, "pairs": [], "removed": 0 }));
        } else if !args.quiet {
            println!("Need at least 2 cards to look for duplicates.");
        }
        return Ok(());
    }

    let config = args.load_config()?;
    let client = OpenRouterClient::new(config.require_openrouter_key()?)?;
    let rt = runtime()?;

    if args.human() {
        println!("Embedding {} cards...", cards.len());
    }
    let pairs = rt.block_on(async {
        let embeddings = embed_cards(&client, &cards).await?;
        let similar = find_similar_pairs(&embeddings, threshold);
        info!(pairs = similar.len(), threshold, "Found similar pairs");

        let mut classified = Vec::with_capacity(similar.len());
        for pair in similar {
            classified.push(classify_pair(&client, &cards, pair).await);
        }
        Ok::<_, Error>(classified)
    })?;

    let complementary = pairs
        .iter()
        .filter(|p| p.classification == Classification::Complementary)
        .count();

    if pairs.is_empty() || args.dry_run {
        report_pairs(file, &pairs, complementary, args)?;
        return Ok(());
    }

    if args.human() {
        println!(
            "{} similar pair(s), {complementary} complementary (kept automatically)",
            pairs.len()
        );
    }

    let mut prompt = CliPrompt::new(args.yes);
    let Some(remove) = resolve_pairs(&mut prompt, &cards, &pairs)? else {
        if args.human() {
            println!("Quit; {} unchanged.", file.display());
        }
        return Ok(());
    };

    if remove.is_empty() {
        if args.json {
            println!("{}", serde_json::json!({ "file": file, "pairs": pairs, "removed": 0 }));
        } else if !args.quiet {
            println!("No cards removed.");
        }
        return Ok(());
    }

    if !prompt.confirm(&format!("Remove {} card(s) from {}?", remove.len(), file.display()))? {
        return Err(Error::Aborted);
    }

    let kept: Vec<_> = cards
        .iter()
        .enumerate()
        .filter(|(i, _)| !remove.contains(i))
        .map(|(_, c)| c.clone())
        .collect();
    write_deck_file(file, &kept)?;
    info!(removed = remove.len(), file = %file.display(), "Removed duplicate cards");

    if args.json {
        let output = serde_json::json!({
            "file": file,
            "pairs": pairs,
            "removed": remove.len(),
            "remaining": kept.len(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if !args.quiet {
        println!(
            "{} Removed {} card(s); {} remain. Run `mochi sync` to delete them remotely.",
            "✓".green(),
            remove.len(),
            kept.len()
        );
    }
    Ok(())
}

/// Print pairs without resolving them.
fn report_pairs(file: &Path, pairs: &[ClassifiedPair], complementary: usize, args: &GlobalArgs) -> Result<()> {
    if args.json {
        let output = serde_json::json!({
            "file": file,
            "dry_run": args.dry_run,
            "pairs": pairs,
            "complementary": complementary,
            "removed": 0,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }
    if args.quiet {
        return Ok(());
    }

    if pairs.is_empty() {
        println!("{} No similar cards found.", "✓".green());
        return Ok(());
    }
    println!("{} similar pair(s):", pairs.len());
    for p in pairs {
        let label = match p.classification {
            Classification::Duplicate => p.classification.to_string().red(),
            Classification::Complementary => p.classification.to_string().green(),
            Classification::Unclear | Classification::Error => p.classification.to_string().yellow(),
        };
        println!(
            "  #{} / #{}  {:.3}  {label}  {}",
            p.pair.first + 1,
            p.pair.second + 1,
            p.pair.score,
            p.reasoning.dimmed()
        );
    }
    Ok(())
}
