//! Command-line front end of the task ledger.

use std::path::Path;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use clap::Subcommand;

use rusty_ledger::spreadsheet::reference::reference_to_index;
use rusty_ledger::tasks::notify::Outbox;
use rusty_ledger::Invocation;
use rusty_ledger::LedgerConfig;
use rusty_ledger::TableContext;
use rusty_ledger::Workbook;

#[derive(Parser)]
#[command(name = "ledger", version, about = "Tabular task ledger with archive and recurrence")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, default_value = "ledger.toml")]
    config: PathBuf,

    /// Workbook to operate on (.json, or .xlsx for import).
    #[arg(long)]
    workbook: PathBuf,

    /// Where to save the changed workbook (.json). Defaults to the input when it is JSON.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Glob pattern naming the task sheet (overrides the config file).
    #[arg(long)]
    sheet: Option<String>,

    /// Archive sheet name (overrides the config file).
    #[arg(long)]
    archive_sheet: Option<String>,

    /// Notification recipient (overrides the config file).
    #[arg(long)]
    recipient: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive finished tasks and re-create recurring ones.
    Archive,

    /// Send reminders for flagged tasks due today.
    Remind,

    /// Send the daily summary of open tasks.
    Summary,

    /// Stamp identifiers into rows without a task id.
    StampIds,

    /// Record an edit of one cell of the task sheet.
    Edit {
        /// A1 reference of the edited cell.
        #[arg(long)]
        cell: String,
    },

    /// Show the detected header row and column mapping.
    Headers,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = LedgerConfig::load(&cli.config).context("failed to load configuration")?;
    if let Some(sheet) = cli.sheet {
        config.sheet_name = sheet;
    }
    if let Some(archive_sheet) = cli.archive_sheet {
        config.archive_sheet_name = archive_sheet;
    }
    if let Some(recipient) = cli.recipient {
        config.recipient = recipient;
    }

    let mut workbook = Workbook::open(&cli.workbook)
        .with_context(|| format!("failed to open workbook {}", cli.workbook.display()))?;
    let invocation = Invocation::new(&config, Local::now().naive_local());
    let mut outbox = Outbox::new();

    let changed = match cli.command {
        Commands::Archive => {
            let report = rusty_ledger::archive_completed_tasks(&mut workbook, &invocation)?;
            println!("Archived {} row(s), re-created {}.", report.moved, report.regenerated);
            report.moved > 0
        }
        Commands::Remind => {
            let reminders = rusty_ledger::send_task_reminders(&mut workbook, &invocation, &mut outbox)?;
            !reminders.is_empty()
        }
        Commands::Summary => {
            rusty_ledger::send_task_summary(&workbook, &invocation, &mut outbox)?;
            false
        }
        Commands::StampIds => {
            let stamped = rusty_ledger::generate_missing_task_ids(&mut workbook, &invocation)?;
            println!("Stamped {stamped} task id(s).");
            stamped > 0
        }
        Commands::Edit { cell } => {
            let Some((row, col)) = reference_to_index(&cell) else {
                bail!("invalid cell reference '{cell}'");
            };
            let stamp = rusty_ledger::record_edit(&mut workbook, &invocation, row + 1, col + 1)?;
            stamp.modified || stamp.notification_reset
        }
        Commands::Headers => {
            print_headers(&workbook, &invocation)?;
            false
        }
    };

    for notification in outbox.notifications() {
        println!("To: {}", notification.recipient);
        println!("Subject: {}", notification.subject);
        println!();
        println!("{}", notification.html_body);
        println!();
    }

    if changed {
        let output = output_path(&cli.workbook, cli.output.as_deref())?;
        workbook
            .save(&output)
            .with_context(|| format!("failed to save workbook {}", output.display()))?;
        println!("Saved {}", output.display());
    }
    Ok(())
}

fn print_headers(workbook: &Workbook, invocation: &Invocation) -> Result<()> {
    let sheet_name = rusty_ledger::table::locator::find_data_sheet(
        workbook,
        &invocation.sheet_pattern,
        &invocation.archive_sheet_name,
    )?;
    let sheet = workbook
        .sheet(&sheet_name)
        .with_context(|| format!("sheet {sheet_name} disappeared"))?;
    let context = TableContext::resolve(sheet, invocation.header_scan_rows)?;

    println!("Sheet: {sheet_name}");
    println!("Header row: {}", context.header_row);
    for field in rusty_ledger::table::field::Field::ALL {
        match context.field(field) {
            Some(col) => println!("  {:<16} column {} ({:?})", field.to_string(), col + 1, context.headers[col]),
            None => println!("  {:<16} -", field.to_string()),
        }
    }
    Ok(())
}

/// The JSON file to save into: `--output`, else the input when it is JSON.
fn output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if let Some(output) = output {
        return Ok(output.to_path_buf());
    }
    let is_json = input
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!("{} cannot be written back; pass --output with a .json path", input.display());
    }
    Ok(input.to_path_buf())
}
