use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::application::CardLedger;
use crate::io::{render_holdings, render_table, Exporter};

/// Card Ledger - a persisted 52-card deck with card and chip bookkeeping
#[derive(Parser)]
#[command(name = "card-ledger")]
#[command(about = "Shuffle, deal and track cards and chips across named characters")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "card52.db", env = "CARD_LEDGER_DB")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store, the canonical deck, and the dealer and player
    Init,

    /// Character management commands
    #[command(subcommand)]
    Character(CharacterCommands),

    /// Give the dealer all 52 cards in a new random order
    Shuffle {
        /// Seed for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Deal cards off the top of one character's hand to another
    Deal {
        /// Number of cards to move
        count: usize,

        /// Source character
        #[arg(long, default_value = "dealer")]
        from: String,

        /// Destination character
        #[arg(long)]
        to: String,
    },

    /// Chip balance commands
    #[command(subcommand)]
    Chips(ChipsCommands),

    /// Show how many cards a character holds
    Count {
        /// Character name
        name: String,
    },

    /// Stats maintenance commands
    #[command(subcommand)]
    Stats(StatsCommands),

    /// Render a character's hand, or every hand when no name is given
    Show {
        /// Character name
        name: Option<String>,
    },

    /// Render the next N cards of a character's hand
    Reveal {
        /// Character name
        name: String,

        /// Number of cards to reveal
        count: usize,
    },

    /// Verify store integrity
    Check,

    /// List recent journal entries
    History {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Drop all persisted state
    Teardown {
        /// Confirm that all data should be destroyed
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    /// Stats rows as CSV
    Stats,
    /// Every held card as CSV
    Holdings,
    /// The journal as CSV, oldest first
    Journal,
    /// The whole store as a JSON snapshot
    Full,
}

#[derive(Subcommand)]
pub enum CharacterCommands {
    /// Register a character (resets it if it already exists)
    Create {
        /// Character name
        name: String,
    },

    /// List all characters with their cards and chips
    List,
}

#[derive(Subcommand)]
pub enum ChipsCommands {
    /// Show a character's chip balance
    Show {
        /// Character name
        name: String,
    },

    /// Overwrite a character's chip balance
    Set {
        /// Character name
        name: String,

        /// New balance
        amount: i64,
    },

    /// Overwrite a character's chip balance (alias of set)
    Add {
        /// Character name
        name: String,

        /// New balance
        amount: i64,
    },

    /// Add to (or with a negative amount, remove from) a character's balance
    Adjust {
        /// Character name
        name: String,

        /// Amount to add
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Move chips between two characters
    Transfer {
        /// Amount to move
        amount: i64,

        /// Source character
        #[arg(long)]
        from: String,

        /// Destination character
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand)]
pub enum StatsCommands {
    /// Recompute every character's card total from its hand
    Refresh,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let ledger = match self.command {
            Commands::Init => CardLedger::open(&self.database).await?,
            Commands::Teardown { yes: false } => {
                anyhow::bail!("Refusing to destroy {} without --yes", self.database)
            }
            _ => CardLedger::connect(&self.database)
                .await
                .with_context(|| format!("Cannot open {}. Run 'init' first", self.database))?,
        };

        let result = run_command(&ledger, &self.database, self.command).await;
        ledger.close().await;
        result
    }
}

async fn run_command(ledger: &CardLedger, database: &str, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            ledger.init().await?;
            println!("Card store initialized: {}", database);
        }

        Commands::Teardown { .. } => {
            ledger.teardown().await?;
            println!("All card data removed from {}", database);
        }

        Commands::Character(cmd) => run_character_command(ledger, cmd).await?,

        Commands::Shuffle { seed } => {
            let cards = match seed {
                Some(seed) => ledger.shuffle_cards_dealer_seeded(seed).await?,
                None => ledger.shuffle_cards_dealer().await?,
            };
            println!("Dealer now holds {} shuffled cards", cards.len());
        }

        Commands::Deal { count, from, to } => {
            let result = ledger.card_transfer(&from, &to, count).await?;
            println!(
                "Dealt {} card(s): {} -> {}",
                result.cards.len(),
                result.from_character,
                result.to_character
            );
            println!(
                "  {} now holds {}, {} holds {}",
                result.from_character, result.from_total, result.to_character, result.to_total
            );
        }

        Commands::Chips(cmd) => run_chips_command(ledger, cmd).await?,

        Commands::Count { name } => match ledger.get_card_amount(&name).await? {
            Some(count) => println!("{}: {}", name, count),
            None => println!("{}: not found", name),
        },

        Commands::Stats(StatsCommands::Refresh) => {
            let refreshed = ledger.update_stats().await?;
            println!("Refreshed stats for {} character(s)", refreshed);
        }

        Commands::Show { name } => match name {
            Some(name) => {
                let count = ledger.get_card_amount(&name).await?.unwrap_or(0);
                let grid = ledger.render_hand(&name).await?;
                println!("{} ({} cards)", name, count);
                print!("{}", grid);
            }
            None => {
                let hands = ledger.list_hands().await?;
                print!("{}", render_table(&hands));
            }
        },

        Commands::Reveal { name, count } => {
            let holdings = ledger.reveal(&name, count).await?;
            print!("{}", render_holdings(&holdings));
        }

        Commands::Check => run_check_command(ledger).await?,

        Commands::History { limit } => {
            let entries = ledger.history(limit).await?;
            if entries.is_empty() {
                println!("No journal entries.");
            } else {
                println!(
                    "{:>6} {:<20} {:<8} {:<12} {:<12} {:>8}",
                    "SEQ", "RECORDED", "KIND", "FROM", "TO", "QTY"
                );
                println!("{}", "-".repeat(71));
                for entry in entries {
                    println!(
                        "{:>6} {:<20} {:<8} {:<12} {:<12} {:>8}",
                        entry.sequence,
                        entry.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.kind,
                        truncate(&entry.from_character, 12),
                        truncate(&entry.to_character, 12),
                        entry.quantity
                    );
                }
            }
        }

        Commands::Export {
            export_type,
            output,
        } => run_export_command(ledger, export_type, output.as_deref()).await?,
    }
    Ok(())
}

async fn run_character_command(ledger: &CardLedger, cmd: CharacterCommands) -> Result<()> {
    match cmd {
        CharacterCommands::Create { name } => {
            let stats = ledger.create_character(&name).await?;
            println!("Registered character: {}", stats.character);
        }

        CharacterCommands::List => {
            let stats = ledger.list_stats().await?;
            if stats.is_empty() {
                println!("No characters found.");
            } else {
                println!("{:<20} {:>6} {:>10}", "CHARACTER", "CARDS", "CHIPS");
                println!("{}", "-".repeat(38));
                for s in stats {
                    println!("{:<20} {:>6} {:>10}", s.character, s.total_cards, s.chips);
                }
            }
        }
    }
    Ok(())
}

async fn run_chips_command(ledger: &CardLedger, cmd: ChipsCommands) -> Result<()> {
    match cmd {
        ChipsCommands::Show { name } => {
            let chips = ledger.get_chips(&name).await?;
            println!("{}: {} chips", name, chips);
        }

        ChipsCommands::Set { name, amount } => {
            ledger.set_chips(&name, amount).await?;
            println!("{}: {} chips", name, amount);
        }

        ChipsCommands::Add { name, amount } => {
            ledger.add_chips(&name, amount).await?;
            println!("{}: {} chips", name, amount);
        }

        ChipsCommands::Adjust { name, delta } => {
            let balance = ledger.adjust_chips(&name, delta).await?;
            println!("{}: {} chips", name, balance);
        }

        ChipsCommands::Transfer { amount, from, to } => {
            let result = ledger.chips_transfer(&from, &to, amount).await?;
            println!(
                "Moved {} chips: {} -> {}",
                result.amount, result.from_character, result.to_character
            );
            println!(
                "  {}: {}, {}: {}",
                result.from_character, result.from_balance, result.to_character, result.to_balance
            );
        }
    }
    Ok(())
}

async fn run_check_command(ledger: &CardLedger) -> Result<()> {
    println!("Checking card store integrity...\n");

    let report = ledger.check_integrity().await?;

    println!("Canonical cards: {}", report.canonical_cards);
    println!("Characters:      {}", report.character_count);
    println!("Cards held:      {}", report.total_holdings);
    println!("Chips in play:   {}", report.total_chips);
    println!();

    if report.is_healthy() {
        println!("Card store is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        if !report.drift.is_empty() {
            println!();
            println!("Run 'stats refresh' to rebuild cached card totals.");
        }
        anyhow::bail!("Integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    ledger: &CardLedger,
    export_type: ExportType,
    output: Option<&str>,
) -> Result<()> {
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(ledger);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match export_type {
        ExportType::Stats => exporter.export_stats_csv(writer).await?,
        ExportType::Holdings => exporter.export_holdings_csv(writer).await?,
        ExportType::Journal => exporter.export_journal_csv(writer).await?,
        ExportType::Full => exporter.export_full_json(writer).await?.holdings.len(),
    };

    if let Some(path) = output {
        eprintln!("Exported {} record(s) to {}", count, path);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
