//! santapost command-line tool.
//!
//! Provides subcommands for generating a starter configuration, validating
//! the configuration and a roster CSV, and running the full Secret Santa
//! flow: load, validate, pair, confirm, and mail every giver their
//! assignment.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use dialoguer::{Confirm, Password};
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use santapost_core::config::AppConfig;
use santapost_core::giphy::GiphyClient;
use santapost_core::notify::email::Mailer;
use santapost_core::notify::template::TemplateSet;
use santapost_core::notify::Dispatcher;
use santapost_core::pairing::Pairing;
use santapost_core::roster::{Roster, RosterWarnings};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// santapost: double-blind Secret Santa pairing and mailing.
#[derive(Parser, Debug)]
#[command(
    name = "santapost",
    version,
    about = "Pair up a Secret Santa roster and email every giver their assignment"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./santapost.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file (and optionally starter templates).
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./santapost.toml")]
        output: PathBuf,

        /// Also write starter message templates into this directory.
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Validate the configuration file and, optionally, a roster CSV.
    Validate {
        /// Roster CSV to check alongside the config.
        #[arg(short, long)]
        roster: Option<PathBuf>,
    },

    /// Pair up the roster and email every giver their receiver.
    Run {
        /// Two-column roster CSV (name, email); the first row is a header.
        #[arg(short, long)]
        roster: PathBuf,

        /// Render letters without connecting to SMTP or GIPHY.
        #[arg(long)]
        dry_run: bool,

        /// Answer yes to every confirmation prompt (non-interactive mode).
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    // Minimal logging for the CLI; raise with RUST_LOG when debugging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output, templates } => cmd_init(&output, templates.as_deref()),
        Commands::Validate { roster } => cmd_validate(&cli.config, roster.as_deref()),
        Commands::Run {
            roster,
            dry_run,
            yes,
        } => cmd_run(&cli.config, &roster, dry_run, yes).await,
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"# santapost configuration
# See documentation for all available options.

[smtp]
# SMTP relay and submission port (STARTTLS).
host = "smtp.gmail.com"
port = 587

# Sender mailbox; also used as the SMTP username.
from = "santa@example.com"

# Environment variable holding the mailbox password. If unset, an
# interactive run will prompt for it.
password_env = "SANTAPOST_SMTP_PASSWORD"

[roster]
# Whether two participants may share a mailbox in non-interactive runs.
allow_duplicate_emails = false

[templates]
# Directory with a .txt and .html template; built-in defaults when unset.
# Placeholders: {giver}, {receiver}, {link}, {id}.
# dir = "./templates"
subject = "Secret Santa"

# Uncomment to embed a random festive GIF into each letter.
# [giphy]
# token_env = "SANTAPOST_GIPHY_TOKEN"
# tag = "Merry Christmas"
# rating = "PG-13"
# keep_gifs = false
# save_dir = "./images"
"#;

const STARTER_PLAIN_TEMPLATE: &str = "\
Ho ho ho {giver},

You have been chosen as the Secret Santa for... {receiver}!

Keep it under your hat, and happy gifting.
{link}
";

const STARTER_HTML_TEMPLATE: &str = "\
<html><body>
<h2>Ho ho ho {giver},</h2>
<p>You have been chosen as the Secret Santa for... <strong>{receiver}</strong>!</p>
<img src=\"cid:{id}\" alt=\"A festive GIF\">
<p>Keep it under your hat, and happy gifting.</p>
</body></html>
";

fn cmd_init(output: &Path, templates: Option<&Path>) -> Result<()> {
    if output.exists() {
        bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, DEFAULT_CONFIG).context("failed to write config file")?;
    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );

    if let Some(dir) = templates {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
        std::fs::write(dir.join("letter.txt"), STARTER_PLAIN_TEMPLATE)
            .context("failed to write plain template")?;
        std::fs::write(dir.join("letter.html"), STARTER_HTML_TEMPLATE)
            .context("failed to write HTML template")?;
        println!(
            "{}",
            style::success(&format!("Starter templates written to {}", dir.display()))
        );
    }

    println!();
    println!("Next steps:");
    println!("  1. Edit the config file with your mailbox details");
    println!("  2. Export the referenced environment variables (or rely on the prompts)");
    println!(
        "  3. Validate with: santapost validate --config {}",
        output.display()
    );
    println!(
        "  4. Run: santapost run --config {} --roster ./roster.csv",
        output.display()
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(config_path: &Path, roster_path: Option<&Path>) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    let _ = config.resolve_env_vars();
    println!("  [OK] Environment variable references processed");

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  SMTP relay    : {}:{}", config.smtp.host, config.smtp.port);
    println!("  Sender        : {}", config.smtp.from);
    println!(
        "  SMTP password : {}",
        if config.smtp.password.is_some() {
            "set"
        } else {
            "NOT SET (will prompt)"
        }
    );
    println!(
        "  Templates     : {}",
        config
            .templates
            .dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string())
    );
    match config.giphy {
        Some(ref giphy) => {
            println!(
                "  Festive GIFs  : enabled (tag '{}', rating {})",
                giphy.tag, giphy.rating
            );
            println!(
                "  GIPHY token   : {}",
                if giphy.token.is_some() {
                    "set"
                } else {
                    "NOT SET (will prompt)"
                }
            );
        }
        None => println!("  Festive GIFs  : disabled"),
    }

    if let Some(path) = roster_path {
        println!();
        println!("Validating roster: {}", path.display());
        let (roster, warnings) = Roster::from_csv_path(path).context("roster validation failed")?;
        println!("  [OK] {} participants, all addresses valid", roster.len());
        print_duplicate_email_warnings(&warnings);
    }

    println!();
    println!("{}", style::success("Everything checks out."));
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: &Path, roster_path: &Path, dry_run: bool, yes: bool) -> Result<()> {
    let config =
        AppConfig::load_and_resolve(config_path).context("failed to load configuration file")?;

    let (roster, warnings) =
        Roster::from_csv_path(roster_path).context("failed to load roster")?;

    println!("{}", style::header("Here are our Secret Santas:"));
    println!();
    print_roster_table(&roster);
    println!();

    if !confirm(yes, "All data loaded. Proceed with the pairing?", true)? {
        println!("{}", style::warn("Cancelled. Maybe next time, then."));
        return Ok(());
    }

    if !warnings.is_clean() {
        print_duplicate_email_warnings(&warnings);
        if yes {
            if !config.roster.allow_duplicate_emails {
                bail!(
                    "duplicate email addresses found; set roster.allow_duplicate_emails = true \
                     or run interactively to confirm"
                );
            }
        } else if !confirm(false, "Duplicate email addresses found. Continue anyway?", false)? {
            println!("{}", style::warn("Cancelled. Maybe next time, then."));
            return Ok(());
        }
    }

    let pairing = Pairing::generate(&roster);
    println!(
        "{}",
        style::success(&format!(
            "Pairing complete: {} assignments drawn. They stay secret.",
            pairing.len()
        ))
    );

    if dry_run {
        return dry_run_report(&config, &roster, &pairing);
    }

    if !confirm(yes, "Time to send the letters?", true)? {
        println!("{}", style::warn("Cancelled. No letters were sent."));
        return Ok(());
    }

    let password = match config.smtp.password {
        Some(ref password) => password.clone(),
        None if yes => bail!(
            "SMTP password not available; export {} or run interactively",
            config.smtp.password_env
        ),
        None => Password::new()
            .with_prompt(format!(
                "Santa's secret key [password for {}]",
                config.smtp.from
            ))
            .interact()
            .context("failed to read mailbox password")?,
    };

    let giphy = match config.giphy {
        Some(ref giphy_config) => {
            let token = match giphy_config.token {
                Some(ref token) => token.clone(),
                None if yes => bail!(
                    "GIPHY token not available; export {} or run interactively",
                    giphy_config.token_env
                ),
                None => Password::new()
                    .with_prompt("Santa's photo album key [GIPHY API token]")
                    .interact()
                    .context("failed to read GIPHY token")?,
            };
            Some(GiphyClient::new(giphy_config, token))
        }
        None => None,
    };

    let templates = TemplateSet::from_config(&config.templates, giphy.is_some())
        .context("failed to load message templates")?;
    let mailer = Mailer::new(&config.smtp, password);
    let dispatcher = Dispatcher::new(mailer, templates, giphy);

    let progress = ProgressBar::new(pairing.len() as u64);
    progress.set_message("sending letters");
    for (giver, receiver) in pairing.assignments() {
        let giver_email = roster
            .email_of(giver)
            .with_context(|| format!("no email address on roster for '{giver}'"))?;
        dispatcher
            .send_assignment(giver, giver_email, receiver)
            .await
            .with_context(|| format!("failed to send letter to '{giver}'"))?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!();
    println!(
        "{}",
        style::success(&format!(
            "All {} letters sent - Merry Christmas!",
            pairing.len()
        ))
    );

    Ok(())
}

/// Report what a real run would send, without touching the network and
/// without revealing any assignment.
fn dry_run_report(config: &AppConfig, roster: &Roster, pairing: &Pairing) -> Result<()> {
    let with_gif = config.giphy.is_some();
    let templates = TemplateSet::from_config(&config.templates, with_gif)
        .context("failed to load message templates")?;

    println!();
    println!("{}", style::header("Dry run - no letters will be sent."));
    println!();
    println!(
        "  SMTP relay : {}:{} (from {})",
        config.smtp.host, config.smtp.port, config.smtp.from
    );
    println!("  Subject    : {}", templates.subject());
    println!(
        "  GIF embed  : {}",
        if with_gif { "enabled" } else { "disabled" }
    );
    println!();

    for (giver, _) in pairing.assignments() {
        let giver_email = roster
            .email_of(giver)
            .with_context(|| format!("no email address on roster for '{giver}'"))?;
        println!(
            "  {}",
            style::dim(&format!("would send a letter for {} to {}", giver, giver_email))
        );
    }

    println!();
    println!(
        "{}",
        style::success(&format!("{} letters ready to go.", pairing.len()))
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_roster_table(roster: &Roster) {
    let mut table = Table::new();
    table.set_header(vec!["Participant", "Email address"]);
    for participant in roster.participants() {
        table.add_row(vec![
            participant.name.clone(),
            participant.email.clone(),
        ]);
    }
    println!("{table}");
}

fn print_duplicate_email_warnings(warnings: &RosterWarnings) {
    for duplicate in &warnings.duplicate_emails {
        println!(
            "{}",
            style::warn(&format!(
                "mailbox {} is shared by: {}",
                duplicate.address,
                duplicate.names.join(", ")
            ))
        );
    }
}

/// Ask for confirmation, or pass straight through in non-interactive mode.
fn confirm(skip: bool, prompt: &str, default: bool) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("failed to read confirmation")
}
