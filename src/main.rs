use std::io::{BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_core::{config_from_env_values, FieldPath, IntakeStore};

/// Main entry point for the intake record session
///
/// Opens the synchronized record store (loading any persisted snapshot) and
/// drives it from an interactive stdin session, standing in for a form
/// presentation surface. Edits are applied synchronously with propagation to
/// every duplicated field; durable saving happens on a debounced autosave,
/// immediately on `save`, and on exit.
///
/// # Commands
/// - `get <path>` - read one field
/// - `set <path> <value>` - write one field (and its duplicated copies)
/// - `show` - print the full record as JSON
/// - `status` - print the save-state
/// - `save` - save immediately, skipping the autosave window
/// - `clear` - reset the record and erase the persisted copy
/// - `quit` - flush and exit
///
/// # Environment Variables
/// - `INTAKE_SNAPSHOT_PATH`: persisted record path (default: "intake-record.json")
/// - `INTAKE_AUTOSAVE_SECS`: autosave quiet window in seconds (default: 10)
///
/// # Returns
/// * `Ok(())` - Session ended normally
/// * `Err(anyhow::Error)` - Configuration or startup failure
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from_env_values(
        std::env::var("INTAKE_SNAPSHOT_PATH").ok(),
        std::env::var("INTAKE_AUTOSAVE_SECS").ok(),
    )?;

    tracing::info!("++ Opening intake record at {}", config.snapshot_path().display());
    let store = IntakeStore::open(&config)?;
    if let Some(error) = store.status().error {
        eprintln!("warning: {error}");
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("intake> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let mut parts = line.trim().splitn(3, ' ');
        match parts.next().unwrap_or_default() {
            "" => {}
            "get" => match parts.next().map(str::parse::<FieldPath>) {
                Some(Ok(path)) => match store.get(&path) {
                    Some(value) => println!("{value}"),
                    None => println!("no value at {path}"),
                },
                Some(Err(e)) => println!("invalid path: {e}"),
                None => println!("usage: get <path>"),
            },
            "set" => match (parts.next().map(str::parse::<FieldPath>), parts.next()) {
                (Some(Ok(path)), Some(raw)) => {
                    let value = serde_json::from_str(raw)
                        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
                    store.update_field(&path, value);
                    println!("ok");
                }
                (Some(Err(e)), _) => println!("invalid path: {e}"),
                _ => println!("usage: set <path> <value>"),
            },
            "show" => println!("{}", serde_json::to_string_pretty(&store.record_value())?),
            "status" => {
                let status = store.status();
                println!(
                    "dirty: {}, last saved: {}",
                    status.is_dirty,
                    status
                        .last_saved_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| "never".into())
                );
                if let Some(error) = status.error {
                    println!("error: {error}");
                }
            }
            "save" => {
                store.flush();
                println!("saved");
            }
            "clear" => {
                store.clear();
                println!("cleared");
            }
            "quit" | "exit" => break,
            other => println!("unknown command: {other}"),
        }
    }

    // Store drop flushes unsaved edits.
    Ok(())
}
