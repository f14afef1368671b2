//! passvault CLI - command-line front end for a local encrypted vault
//!
//! The vault lives in a directory you choose (typically a removable drive).
//! Each invocation opens the vault, unlocks it, runs one command, and exits;
//! the key never outlives the process.

use chrono::Utc;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::info;

use vault_core::credential::is_stale;
use vault_core::{VaultError, VaultEvent, VaultSession, VaultState};

/// passvault - encrypted credential vault on local or removable storage
#[derive(Parser, Debug)]
#[command(name = "passvault")]
#[command(author = "Symbia Labs")]
#[command(version = "0.1.0")]
#[command(about = "passvault - encrypted credential vault on local or removable storage")]
struct Args {
    /// Vault directory (defaults to the platform data directory)
    #[arg(long, env = "PASSVAULT_DIR")]
    dir: Option<PathBuf>,

    /// Master passphrase (prompted for when not set)
    #[arg(long, env = "PASSVAULT_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the master passphrase for a new vault
    Init,
    /// Store a secret for a platform (replaces an existing one)
    Add {
        platform: String,
        /// Secret value (prompted for when omitted)
        secret: Option<String>,
    },
    /// Replace the secret of an existing platform
    Update {
        platform: String,
        /// Secret value (prompted for when omitted)
        secret: Option<String>,
    },
    /// Delete a platform
    Delete { platform: String },
    /// Show the secret of a platform
    Get { platform: String },
    /// List stored platforms
    List,
    /// Generate a random secret
    Generate {
        /// Length between 8 and 32 (out-of-range values are clamped)
        #[arg(long, short)]
        length: Option<usize>,
        /// Store the generated secret for this platform
        #[arg(long)]
        save: Option<String>,
    },
    /// Change the master passphrase
    Rotate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let dir = match args.dir {
        Some(dir) => dir,
        None => default_dir()?,
    };

    let mut session = VaultSession::open(&dir)
        .map_err(|e| format!("Failed to open vault at {}: {}", dir.display(), e))?
        .with_observer(render_event);

    info!(
        "Using vault {} at {:?}",
        session.identity(),
        session.storage_dir()
    );

    if let Command::Init = args.command {
        let passphrase = match args.passphrase {
            Some(passphrase) => passphrase,
            None => new_passphrase("Create a master passphrase: ")?,
        };
        session.initialize(&passphrase)?;
        return Ok(());
    }

    if session.state() == VaultState::Uninitialized {
        return Err("Vault not initialized. Run `passvault init` first.".into());
    }

    let passphrase = match args.passphrase {
        Some(passphrase) => passphrase,
        None => rpassword::prompt_password("Master passphrase: ")?,
    };
    session.unlock(&passphrase)?;

    run(&mut session, args.command, &passphrase)
}

/// Dispatch one command against an unlocked vault
fn run(
    session: &mut VaultSession,
    command: Command,
    passphrase: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Init => return Err(VaultError::AlreadyInitialized.into()),
        Command::Add { platform, secret } => {
            let secret = secret_or_prompt(secret)?;
            session.add(&platform, &secret)?;
        }
        Command::Update { platform, secret } => {
            let secret = secret_or_prompt(secret)?;
            session.update(&platform, &secret)?;
        }
        Command::Delete { platform } => session.delete(&platform)?,
        Command::Get { platform } => match session.get(&platform)? {
            Some(entry) => {
                println!("Platform: {}", platform);
                println!("Secret:   {}", entry.secret);
                println!("Updated:  {}", entry.updated_at.to_rfc3339());
                let threshold = session.settings().stale_after_days;
                if is_stale(&entry, Utc::now(), threshold) {
                    println!("WARNING: this secret is older than {} days", threshold);
                }
            }
            None => return Err(VaultError::NotFound(platform).into()),
        },
        Command::List => {
            let listed = session.list()?;
            if listed.is_empty() {
                println!("No platforms stored.");
            }
            let now = Utc::now();
            for item in &listed {
                let marker = if item.is_stale { "  (stale)" } else { "" };
                println!(
                    "- {} (updated {} days ago){}",
                    item.platform,
                    item.entry.age_days(now),
                    marker
                );
            }
            println!("Total: {} platform(s)", listed.len());
        }
        Command::Generate { length, save } => {
            let secret = match save {
                Some(platform) => session.generate_and_save(&platform, length)?,
                None => {
                    let length =
                        length.unwrap_or_else(|| session.settings().effective_secret_length());
                    session.generate(length)
                }
            };
            println!("{}", secret);
        }
        Command::Rotate => {
            let new = new_passphrase("New master passphrase: ")?;
            session.rotate_master(passphrase, &new)?;
        }
    }

    Ok(())
}

/// Platform data directory used when no vault directory is given
fn default_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dirs = ProjectDirs::from("com", "symbia-labs", "passvault")
        .ok_or("Could not determine data directory")?;
    let dir = dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn secret_or_prompt(secret: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match secret {
        Some(secret) => Ok(secret),
        None => Ok(rpassword::prompt_password("Secret: ")?),
    }
}

/// Prompt twice for a new passphrase
fn new_passphrase(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    let first = rpassword::prompt_password(prompt)?;
    let confirm = rpassword::prompt_password("Confirm passphrase: ")?;
    if first != confirm {
        return Err("Passphrases do not match".into());
    }
    Ok(first)
}

/// Presentation of vault events
fn render_event(event: &VaultEvent) {
    match event {
        VaultEvent::Initialized => println!("Vault initialized."),
        VaultEvent::Unlocked => {}
        VaultEvent::UnlockFailed => eprintln!("Incorrect master passphrase."),
        VaultEvent::EntrySaved { platform } => println!("Saved secret for {}.", platform),
        VaultEvent::EntryDeleted { platform } => println!("Deleted {}.", platform),
        VaultEvent::MasterRotated => println!("Master passphrase changed."),
    }
}
