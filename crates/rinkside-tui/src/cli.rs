//! Command-line entry points that run without the full-screen UI.
//!
//! - `--csv-template`: print the import template
//! - `--import-csv <file> [--tryout <id>] [--dry-run] [--json]`: bulk import players

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use uuid::Uuid;

use rinkside_core::import::{self, DuplicateMatch, ImportOptions, ImportReport};
use rinkside_core::services::coach;
use rinkside_core::store::Store;

use crate::app::App;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tui,
    CsvTemplate,
    ImportCsv(ImportArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportArgs {
    pub path: PathBuf,
    pub tryout_id: Option<Uuid>,
    pub dry_run: bool,
    pub json: bool,
}

/// Parse process arguments (without the program name)
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Tui);
    };
    match first.as_str() {
        "--csv-template" => Ok(Command::CsvTemplate),
        "--import-csv" => {
            let path = args
                .get(1)
                .filter(|a| !a.starts_with("--"))
                .ok_or_else(|| anyhow!("--import-csv needs a file path"))?;
            let mut parsed = ImportArgs {
                path: PathBuf::from(path),
                tryout_id: None,
                dry_run: false,
                json: false,
            };
            let mut rest = args[2..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--dry-run" => parsed.dry_run = true,
                    "--json" => parsed.json = true,
                    "--tryout" => {
                        let id = rest.next().ok_or_else(|| anyhow!("--tryout needs an id"))?;
                        let id = Uuid::parse_str(id)
                            .with_context(|| format!("Invalid tryout id '{}'", id))?;
                        parsed.tryout_id = Some(id);
                    }
                    other => return Err(anyhow!("Unknown option '{}'", other)),
                }
            }
            Ok(Command::ImportCsv(parsed))
        }
        other => Err(anyhow!("Unknown option '{}'", other)),
    }
}

/// Parse, map and import a CSV document for one coach
pub async fn run_import<S: Store>(
    store: &S,
    coach_id: Uuid,
    input: &str,
    options: ImportOptions,
) -> Result<ImportReport> {
    let data = import::parse_csv(input)?;
    let mapping = import::auto_map(&data.headers);
    import::import_players(store, coach_id, &data, &mapping, options).await
}

/// Human-readable summary of an import
pub fn format_report(report: &ImportReport) -> String {
    let mut out = String::new();
    let verb = if report.dry_run { "Would import" } else { "Imported" };
    let _ = writeln!(out, "{} {} players", verb, report.inserted);
    if report.registered > 0 {
        let _ = writeln!(out, "Registered {} for the tryout", report.registered);
    }
    if !report.duplicates.is_empty() {
        let _ = writeln!(out, "Skipped {} duplicates:", report.duplicates.len());
        for dup in &report.duplicates {
            let on = match dup.matched_on {
                DuplicateMatch::Email => "email",
                DuplicateMatch::Name => "name",
            };
            let _ = writeln!(out, "  row {}: {} (same {})", dup.row, dup.name, on);
        }
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "{} rows had errors:", report.errors.len());
        for err in &report.errors {
            let _ = writeln!(out, "  row {}: {}", err.row, err.message);
        }
    }
    out
}

pub fn print_template() -> Result<()> {
    print!("{}", import::template_csv()?);
    Ok(())
}

/// Sign in if needed, then import the file for the signed-in coach
pub async fn import_command(args: ImportArgs) -> Result<()> {
    let input = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    let mut app = App::new()?;
    app.login_interactive().await?;
    let session = app
        .session
        .data
        .clone()
        .ok_or_else(|| anyhow!("Not signed in"))?;

    let profile = coach::profile_from_email(session.user_id, &session.email);
    let (coach, _) = coach::ensure_coach_profile(&app.api, profile).await?;

    let options = ImportOptions {
        tryout_id: args.tryout_id,
        dry_run: args.dry_run,
    };
    info!(path = %args.path.display(), dry_run = args.dry_run, "Importing players");
    let report = run_import(&app.api, coach.id, &input, options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rinkside_core::import::ImportError;
    use rinkside_core::models::{NewPlayer, Player};
    use rinkside_core::store::{insert_one, MemoryStore};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Tui);
        assert_eq!(parse_args(&args(&["--csv-template"])).unwrap(), Command::CsvTemplate);

        let id = Uuid::new_v4();
        let parsed = parse_args(&args(&[
            "--import-csv",
            "players.csv",
            "--dry-run",
            "--tryout",
            &id.to_string(),
        ]))
        .unwrap();
        assert_eq!(
            parsed,
            Command::ImportCsv(ImportArgs {
                path: PathBuf::from("players.csv"),
                tryout_id: Some(id),
                dry_run: true,
                json: false,
            })
        );

        assert!(parse_args(&args(&["--import-csv"])).is_err());
        assert!(parse_args(&args(&["--import-csv", "--dry-run"])).is_err());
        assert!(parse_args(&args(&["--import-csv", "a.csv", "--tryout", "nope"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[tokio::test]
    async fn test_run_import_and_report() {
        let store = MemoryStore::new();
        let coach_id = Uuid::new_v4();
        let _: Player = insert_one(&store, &NewPlayer {
            coach_id: Some(coach_id),
            first_name: "Nora".to_string(),
            last_name: "Quinn".to_string(),
            email: Some("nora@example.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let csv = "First Name,Last Name,Email,Jersey #\n\
                   Ada,Ames,ada@example.com,9\n\
                   Nora,Q,NORA@example.com,\n\
                   ,Nobody,,\n";
        let report = run_import(&store, coach_id, csv, ImportOptions::default()).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(store.count("players"), 2);

        let text = format_report(&report);
        assert!(text.starts_with("Imported 1 players"));
        assert!(text.contains("row 2: Nora Q (same email)"));
        assert!(text.contains("row 3:"));
    }

    #[tokio::test]
    async fn test_run_import_needs_name_columns() {
        let store = MemoryStore::new();
        let err = run_import(&store, Uuid::new_v4(), "email,phone\na@b.co,555\n", ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<ImportError>(), Some(ImportError::MissingColumns(_))));
        assert_eq!(store.count("players"), 0);
    }

    #[test]
    fn test_dry_run_wording() {
        let report = ImportReport {
            inserted: 3,
            dry_run: true,
            ..Default::default()
        };
        assert_eq!(format_report(&report), "Would import 3 players\n");
    }
}
