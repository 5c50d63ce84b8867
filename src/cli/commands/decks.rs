//! `mochi decks`: list remote decks.

use colored::Colorize;

use crate::cli::commands::{mochi_client, runtime, GlobalArgs};
use crate::error::Result;
use crate::remote::RemoteGateway;
use crate::sync::router::deck_filename;

/// List every remote deck with the filename `pull` would write it to.
pub fn execute(args: &GlobalArgs) -> Result<()> {
    let mut config = args.load_config()?;
    let client = mochi_client(&mut config)?;
    let mut decks = runtime()?.block_on(client.list_decks())?;
    decks.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if args.json {
        let output = serde_json::json!({
            "count": decks.len(),
            "decks": decks,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if decks.is_empty() {
        println!("No decks found.");
        return Ok(());
    }

    let width = decks.iter().map(|d| d.name.chars().count()).max().unwrap_or(0);
    println!("{} deck(s):", decks.len());
    println!();
    for deck in &decks {
        println!(
            "  {}  {:<width$}  {}",
            deck.id.cyan(),
            deck.name,
            deck_filename(&deck.name, Some(&deck.id)).dimmed(),
        );
    }
    Ok(())
}
