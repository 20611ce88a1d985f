use anyhow::Context;
use charsheet::{CaseSensitivity, LoadedSheet, Row, Settings};
use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use std::path::PathBuf;

/// Inspect and re-save character sheets
#[derive(Parser, Debug)]
#[command(name = "charsheet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (JSON5)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a sheet: attributes and row counts per family
    Info { sheet: PathBuf },

    /// Re-save a sheet; a `.gz` output path writes gzip
    Normalize {
        sheet: PathBuf,

        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List skill, technique and spell levels plus weapon skill levels
    Levels { sheet: PathBuf },

    /// Find rows containing some text
    Search {
        sheet: PathBuf,
        text: String,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// List the `@Key@` placeholders used by each row
    Nameables { sheet: PathBuf },
}

fn init_logging(verbose: u8) -> anyhow::Result<LoggerHandle> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    Logger::try_with_env_or_str(level)
        .context("invalid log specification")?
        .log_to_stderr()
        .start()
        .context("failed to start logger")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(cli.verbose)?;

    let settings = match &cli.settings {
        Some(path) => Settings::load_path(path)?,
        None => Settings::new(),
    };
    log::debug!("initial scale {}%", settings.sheet.initial_scale);

    match cli.command {
        Command::Info { sheet } => info(&LoadedSheet::load_path(&sheet)?),
        Command::Normalize { sheet, output } => {
            let mut loaded = LoadedSheet::load_path(&sheet)?;
            // Force regeneration so the output reflects the canonical writer.
            loaded.document.set_modified(true);
            let target = output.unwrap_or(sheet);
            loaded.save_to_path(&target)?;
            println!("wrote {}", target.display());
        }
        Command::Levels { sheet } => levels(&LoadedSheet::load_path(&sheet)?),
        Command::Search {
            sheet,
            text,
            case_sensitive,
        } => {
            let loaded = LoadedSheet::load_path(&sheet)?;
            let case = if case_sensitive {
                CaseSensitivity::Sensitive
            } else {
                CaseSensitivity::Insensitive
            };
            for id in loaded.document.search(&text, case) {
                if let Some(row) = loaded.document.find(id) {
                    println!("{}\t{}\t{}", row.kind().row_type(), id, row.name());
                }
            }
        }
        Command::Nameables { sheet } => {
            let loaded = LoadedSheet::load_path(&sheet)?;
            let doc = &loaded.document;
            let roots: Vec<_> = doc.rows().iter().map(Row::id).collect();
            for (id, keys) in doc.nameables(&roots) {
                let name = doc.find(id).map(Row::name).unwrap_or_default();
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                println!("{name}\t{}", keys.join(", "));
            }
        }
    }
    Ok(())
}

fn info(sheet: &LoadedSheet) {
    let doc = &sheet.document;
    println!("format: {:?} ({:?})", sheet.format, sheet.line_ending);
    for attr in charsheet::skill_default::Attribute::ALL {
        println!("{attr}: {}", doc.attributes().get(attr));
    }
    println!("encumbrance: {}", doc.attributes().encumbrance_level);
    for family in charsheet::Family::ALL {
        let count = doc.iter().filter(|row| row.family() == family).count();
        println!("{family:?}: {count} rows");
    }
}

fn levels(sheet: &LoadedSheet) {
    let doc = &sheet.document;
    let resolver = doc.resolver();
    for row in doc.iter() {
        if let Some(level) = resolver.level(row) {
            println!("{}\t{}\t{level}", row.kind().row_type(), row.name());
        }
        for weapon in row.weapons() {
            println!(
                "weapon\t{} ({})\t{}",
                row.name(),
                weapon.usage(),
                resolver.weapon_skill_level(weapon)
            );
        }
    }
}
