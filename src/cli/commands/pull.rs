//! `mochi pull`: download a remote deck into a new deck file.

use std::env;

use colored::Colorize;

use crate::cli::commands::prompt::CliPrompt;
use crate::cli::commands::{mochi_client, runtime, GlobalArgs};
use crate::error::{Error, Result};
use crate::remote::{RemoteDeck, RemoteGateway, DEFAULT_PAGE_SIZE};
use crate::sync::pull_deck;
use crate::sync::router::{deck_filename, find_deck};
use crate::validate::find_similar;

/// Resolve `query` against the deck list, suggesting close names on a miss.
fn resolve<'a>(decks: &'a [RemoteDeck], query: &str) -> Result<&'a RemoteDeck> {
    if let Some(deck) = find_deck(decks, query) {
        return Ok(deck);
    }

    let names: Vec<&str> = decks.iter().map(|d| d.name.as_str()).collect();
    let suggestions = find_similar(query, &names, 3);
    let message = if suggestions.is_empty() {
        format!("Deck not found: {query}")
    } else {
        format!("Deck not found: {query}. Did you mean: {}?", suggestions.join(", "))
    };
    Err(Error::InvalidArgument(message))
}

/// Pull the deck matching `query` (id, name, or name fragment) into the
/// current directory.
pub fn execute(query: &str, args: &GlobalArgs) -> Result<()> {
    let dir = env::current_dir()?;
    let mut config = args.load_config()?;
    let client = mochi_client(&mut config)?;
    let rt = runtime()?;

    let decks = rt.block_on(client.list_decks())?;
    let deck = resolve(&decks, query)?;

    if args.dry_run {
        let file = dir.join(deck_filename(&deck.name, Some(&deck.id)));
        if args.json {
            let output = serde_json::json!({
                "dry_run": true,
                "deck_id": deck.id,
                "deck_name": deck.name,
                "file": file.display().to_string(),
            });
            println!("{}", serde_json::to_string(&output)?);
        } else if !args.quiet {
            println!("Would pull \"{}\" into {}", deck.name, file.display());
        }
        return Ok(());
    }

    let mut prompt = CliPrompt::new(args.yes);
    let report = rt.block_on(pull_deck(&client, &mut prompt, &deck.id, &dir, DEFAULT_PAGE_SIZE))?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else if !args.quiet {
        println!(
            "{} Pulled \"{}\" ({} cards) into {}",
            "✓".green(),
            report.deck_name,
            report.cards,
            report.file.display()
        );
        if report.unrepresentable > 0 {
            println!(
                "{}",
                format!(
                    "  {} multi-side card(s) left out; the deck file holds one question and one answer per card.",
                    report.unrepresentable
                )
                .yellow()
            );
        }
        if report.truncated {
            println!(
                "{}",
                "  Remote listing was incomplete; run `mochi sync` later to fetch the rest.".yellow()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(id: &str, name: &str) -> RemoteDeck {
        RemoteDeck {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_resolve_by_id_and_fragment() {
        let decks = vec![deck("AbCd1234", "Rust Basics"), deck("EfGh5678", "Python")];
        assert_eq!(resolve(&decks, "EfGh5678").unwrap().name, "Python");
        assert_eq!(resolve(&decks, "rust").unwrap().id, "AbCd1234");
    }

    #[test]
    fn test_resolve_suggests_similar_names() {
        let decks = vec![deck("AbCd1234", "Rust Basics"), deck("EfGh5678", "Python")];
        let err = resolve(&decks, "Pythn").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref msg) if msg.contains("Did you mean: Python")));
    }
}
