use clap::{Parser, Subcommand};
use intake_core::{
    config_from_env_values, extract_with_fallback, FieldPath, HeuristicExtractor, IntakeStore,
};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Intake record store CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full record as JSON
    Show,
    /// Read one field by dotted path
    Get {
        /// Dotted field path (e.g. patient.phone)
        path: String,
    },
    /// Write one field by dotted path, propagating to duplicated fields
    Set {
        /// Dotted field path (e.g. form2.patientFirstName)
        path: String,
        /// New value; parsed as JSON if possible, otherwise taken as a string
        value: String,
    },
    /// Show save-state (dirty flag, last save, errors)
    Status,
    /// Reset the record and erase the persisted copy
    Clear,
    /// Fill the record from a free-text note file via the local extractor
    Extract {
        /// Path to a plain-text clinical note
        file: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config_from_env_values(
        std::env::var("INTAKE_SNAPSHOT_PATH").ok(),
        std::env::var("INTAKE_AUTOSAVE_SECS").ok(),
    )?;
    let store = IntakeStore::open(&config)?;

    match cli.command {
        Some(Commands::Show) => {
            println!("{}", serde_json::to_string_pretty(&store.record_value())?);
        }
        Some(Commands::Get { path }) => {
            let path: FieldPath = path.parse()?;
            match store.get(&path) {
                Some(value) => println!("{value}"),
                None => eprintln!("No value at path: {path}"),
            }
        }
        Some(Commands::Set { path, value }) => {
            let path: FieldPath = path.parse()?;
            // Bare words are a convenience for string fields.
            let value = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value));
            store.update_field(&path, value);
            store.flush();
            println!("Updated {path}");
        }
        Some(Commands::Status) => {
            let status = store.status();
            println!("dirty: {}", status.is_dirty);
            match status.last_saved_at {
                Some(at) => println!("last saved: {at}"),
                None => println!("last saved: never"),
            }
            if let Some(error) = status.error {
                println!("error: {error}");
            }
        }
        Some(Commands::Clear) => {
            store.clear();
            println!("Record cleared and persisted copy erased");
        }
        Some(Commands::Extract { file }) => {
            let note = std::fs::read_to_string(&file)?;
            let current = store.snapshot()?;
            // No external service wired in the CLI; the heuristic extractor
            // fills both roles.
            let extractor = HeuristicExtractor::new();
            match extract_with_fallback(&extractor, &extractor, &note, &current) {
                Ok(record) => {
                    store.set_record(record);
                    println!("Record replaced from extracted note");
                }
                Err(e) => eprintln!("Extraction failed, record untouched: {e}"),
            }
        }
        None => {
            println!("Use 'intake --help' for commands");
        }
    }

    Ok(())
}
