mod config;
mod error;
mod ledger;
mod models;
mod operations;

use chrono::Local;
use clap::Parser;
use config::TrackerConfig;
use error::{TrackerError, TrackerResult};
use ledger::Ledger;
use models::category::{CategoryDraft, default_categories};
use operations::export::{ExportMode, export_report};
use operations::remove::{parse_id, remove_receipt};
use operations::scan::{ReceiptImage, Scanner};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Receipt tracker with simulated recognition, statistics and CSV export.
#[derive(Debug, Parser)]
#[command(name = "receipts", version, about)]
struct Args {
    /// Directory CSV reports are written into
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Simulated recognition time in milliseconds
    #[arg(long)]
    scan_delay_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UserCommands {
    Scan(String),
    Dashboard,
    History,
    List,
    Delete(String),
    Categories,
    CategoryAdd,
    CategoryEdit(String),
    CategoryDelete(String),
    CategoryReset,
    Export(String),
    Help,
    Exit,
    Unknown(String),
}

const HELP: &str = "\
Commands:
  scan <path>             recognize a receipt image
  dashboard               spending statistics
  history                 browse, search and delete receipts
  list                    print all receipts
  delete <id>             delete a receipt
  categories              print all categories
  category add            create a category
  category edit <id>      change a category
  category delete <id>    remove a category
  category reset          restore the default categories
  export <mode>           write a CSV report (detailed, daily, categories)
  help                    show this message
  exit                    quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match TrackerConfig::load() {
        Ok(config) => config
            .with_scan_delay_ms(args.scan_delay_ms)
            .with_export_dir(args.export_dir),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_filter, args.verbose);
    debug!(?config, "Configuration loaded");

    let mut ledger = Ledger::default();
    let scanner = Scanner::new(config.scan_delay);

    println!("Welcome to the receipt tracker! Type `help` for the list of commands.");

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let input = match read_user_input() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                println!("Error reading input: {}", e);
                continue;
            }
        };
        if input.is_empty() {
            continue;
        }

        let command = check_for_command(&input);
        if command == UserCommands::Exit {
            println!("Exiting the application.");
            break;
        }

        if let Err(e) = run_command(command, &mut ledger, &scanner, &config.export_dir).await {
            println!("Error: {}", e);
        }
    }

    ExitCode::SUCCESS
}

fn init_tracing(filter: &str, verbose: u8) {
    let directive = match verbose {
        0 => filter,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_command(
    command: UserCommands,
    ledger: &mut Ledger,
    scanner: &Scanner,
    export_dir: &Path,
) -> TrackerResult<()> {
    match command {
        UserCommands::Scan(path) => {
            let Some(image) = ReceiptImage::open(Path::new(&path)) else {
                // Missing and non-image files are ignored.
                return Ok(());
            };
            println!("Recognizing receipt...");
            let receipt = scanner.process(&image, ledger.categories()).await?;
            println!(
                "Recognized: {} | {} | {} ₽ | {}",
                receipt.date(),
                receipt.store(),
                receipt.amount().normalize(),
                receipt.category()
            );
            ledger.add_receipt(receipt);
        }
        UserCommands::Dashboard => {
            operations::dashboard::run_dashboard(&ledger.snapshot(), today())?;
        }
        UserCommands::History => {
            operations::browse::run_browse(ledger)?;
        }
        UserCommands::List => {
            if ledger.receipts().is_empty() {
                println!("No receipts yet.");
            }
            for receipt in ledger.receipts() {
                println!(
                    "{} | {} | {} | {} ₽ | {} | {}",
                    receipt.id(),
                    receipt.date(),
                    receipt.store(),
                    receipt.amount().normalize(),
                    receipt.category(),
                    receipt.items().join(", ")
                );
            }
        }
        UserCommands::Delete(id) => {
            let removed = remove_receipt(ledger, &id)?;
            println!("Receipt from {} removed successfully.", removed.store());
        }
        UserCommands::Categories => {
            for category in ledger.categories().iter() {
                println!(
                    "{} | {} | {} | {}",
                    category.id(),
                    category.name(),
                    category.color(),
                    category.keywords().join(", ")
                );
            }
        }
        UserCommands::CategoryAdd => {
            let Some(draft) = prompt_category_draft()? else {
                return Ok(());
            };
            let category = ledger.add_category(draft)?;
            println!("Category '{}' added.", category.name());
        }
        UserCommands::CategoryEdit(id) => {
            let id = parse_id("category ID", &id)?;
            let current = ledger
                .find_category(id)
                .ok_or_else(|| TrackerError::CategoryNotFound(id.to_string()))?;
            println!(
                "Current: {}; {}; {} (leave the color empty to keep it)",
                current.name(),
                current.color(),
                current.keywords().join(", ")
            );
            let Some(draft) = prompt_category_draft()? else {
                return Ok(());
            };
            let category = ledger.update_category(id, draft)?;
            println!("Category '{}' updated.", category.name());
        }
        UserCommands::CategoryDelete(id) => {
            let id = parse_id("category ID", &id)?;
            let removed = ledger.delete_category(id)?;
            println!("Category '{}' deleted.", removed.name());
        }
        UserCommands::CategoryReset => {
            ledger.replace_categories(default_categories())?;
            println!("Default categories restored.");
        }
        UserCommands::Export(mode) => {
            let mode: ExportMode = mode.parse()?;
            let snapshot = ledger.snapshot();
            let path = export_report(
                export_dir,
                today(),
                &snapshot.receipts,
                &snapshot.categories,
                mode,
            )?;
            println!("Report saved to {}", path.display());
        }
        UserCommands::Help => println!("{}", HELP),
        UserCommands::Unknown(input) => {
            println!("Unknown command: '{}'. Type `help` for the list of commands.", input);
        }
        UserCommands::Exit => {}
    }
    Ok(())
}

fn prompt_category_draft() -> TrackerResult<Option<CategoryDraft>> {
    println!("Enter the category as: name; #RRGGBB; keyword, keyword");
    Ok(read_user_input()?.map(|line| CategoryDraft::parse(&line)))
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

/// Reads one trimmed line. `None` at end of input.
fn read_user_input() -> io::Result<Option<String>> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn check_for_command(input: &str) -> UserCommands {
    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };

    match (head, rest) {
        ("scan", path) if !path.is_empty() => UserCommands::Scan(path.to_string()),
        ("dashboard", "") => UserCommands::Dashboard,
        ("history", "") => UserCommands::History,
        ("list", "") => UserCommands::List,
        ("delete", id) => UserCommands::Delete(id.to_string()),
        ("categories", "") => UserCommands::Categories,
        ("category", rest) => {
            let (action, arg) = match rest.split_once(char::is_whitespace) {
                Some((action, arg)) => (action, arg.trim()),
                None => (rest, ""),
            };
            match action {
                "add" if arg.is_empty() => UserCommands::CategoryAdd,
                "edit" => UserCommands::CategoryEdit(arg.to_string()),
                "delete" => UserCommands::CategoryDelete(arg.to_string()),
                "reset" if arg.is_empty() => UserCommands::CategoryReset,
                _ => UserCommands::Unknown(input.to_string()),
            }
        }
        ("export", mode) => UserCommands::Export(mode.to_string()),
        ("help", _) => UserCommands::Help,
        ("exit" | "quit", _) => UserCommands::Exit,
        _ => UserCommands::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::Receipt;
    use crate::operations::scan::SAMPLE_STORES;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn ledger_with_existing() -> Ledger {
        let mut ledger = Ledger::default();
        ledger.add_receipt(
            Receipt::new(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("Invalid date"),
                "Existing",
                Decimal::from(100),
                "Other",
                vec![],
            )
            .unwrap(),
        );
        ledger
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_command_puts_new_receipt_first() {
        let image = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("Failed to create temp file");
        let export_dir = TempDir::new().unwrap();
        let scanner = Scanner::new(Duration::from_millis(1500));
        let mut ledger = ledger_with_existing();

        let command = UserCommands::Scan(image.path().to_string_lossy().into_owned());
        run_command(command, &mut ledger, &scanner, export_dir.path())
            .await
            .unwrap();

        let receipts = ledger.receipts();
        assert_eq!(receipts.len(), 2);
        assert!(SAMPLE_STORES.contains(&receipts[0].store()));
        assert_eq!(receipts[1].store(), "Existing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_command_ignores_non_images() {
        let file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("Failed to create temp file");
        let export_dir = TempDir::new().unwrap();
        let scanner = Scanner::new(Duration::from_millis(1500));
        let mut ledger = ledger_with_existing();

        let command = UserCommands::Scan(file.path().to_string_lossy().into_owned());
        run_command(command, &mut ledger, &scanner, export_dir.path())
            .await
            .unwrap();
        assert_eq!(ledger.receipts().len(), 1);
    }

    #[tokio::test]
    async fn test_category_edit_unknown_id_fails_before_prompting() {
        let export_dir = TempDir::new().unwrap();
        let scanner = Scanner::new(Duration::ZERO);
        let mut ledger = Ledger::default();
        let missing = Uuid::new_v4();

        let result = run_command(
            UserCommands::CategoryEdit(missing.to_string()),
            &mut ledger,
            &scanner,
            export_dir.path(),
        )
        .await;
        assert!(matches!(result, Err(TrackerError::CategoryNotFound(ref id)) if *id == missing.to_string()));
    }

    #[test]
    fn test_check_for_command_simple() {
        assert_eq!(check_for_command("dashboard"), UserCommands::Dashboard);
        assert_eq!(check_for_command("history"), UserCommands::History);
        assert_eq!(check_for_command("list"), UserCommands::List);
        assert_eq!(check_for_command("categories"), UserCommands::Categories);
        assert_eq!(check_for_command("help"), UserCommands::Help);
        assert_eq!(check_for_command("exit"), UserCommands::Exit);
    }

    #[test]
    fn test_check_for_command_with_arguments() {
        assert_eq!(
            check_for_command("scan  photos/receipt 1.jpg"),
            UserCommands::Scan("photos/receipt 1.jpg".to_string())
        );
        assert_eq!(
            check_for_command("export daily"),
            UserCommands::Export("daily".to_string())
        );
        assert_eq!(
            check_for_command("delete abc"),
            UserCommands::Delete("abc".to_string())
        );
        // Missing ids are reported by the id parser, not here.
        assert_eq!(check_for_command("delete"), UserCommands::Delete(String::new()));
    }

    #[test]
    fn test_check_for_command_category_actions() {
        assert_eq!(check_for_command("category add"), UserCommands::CategoryAdd);
        assert_eq!(
            check_for_command("category edit 42"),
            UserCommands::CategoryEdit("42".to_string())
        );
        assert_eq!(
            check_for_command("category delete 42"),
            UserCommands::CategoryDelete("42".to_string())
        );
        assert_eq!(check_for_command("category reset"), UserCommands::CategoryReset);
        assert_eq!(
            check_for_command("category rename"),
            UserCommands::Unknown("category rename".to_string())
        );
    }

    #[test]
    fn test_unknown_command_does_not_exit() {
        assert_eq!(check_for_command("frobnicate"), UserCommands::Unknown("frobnicate".to_string()));
        assert_eq!(check_for_command("scan"), UserCommands::Unknown("scan".to_string()));
        assert_eq!(check_for_command("list all"), UserCommands::Unknown("list all".to_string()));
    }
}
