use crate::config::Session;
use crate::db::{Connector, Database};
use crate::error::{Error, Result};
use crate::output::check_csv_extension;
use crate::prompt::{Prompter, TRUNCATE_MESSAGE};
use colored::Colorize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::File;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub file: PathBuf,
    /// Target table as `<schema>.<table>`.
    pub table: String,
    pub truncate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub truncated: bool,
    pub rows: u64,
}

/// Bulk loads a CSV file into a table with `COPY`, optionally truncating
/// the table first once the user confirms.
pub async fn run<C, P>(
    args: &LoadArgs,
    session: &Session,
    connector: &C,
    prompter: &P,
) -> Result<LoadOutcome>
where
    C: Connector,
    P: Prompter,
{
    check_csv_extension(&args.file, "You can only load csv files")?;

    let file = File::open(&args.file).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            Error::Validation(format!("The file {} does not exist", args.file.display()))
        }
        _ => Error::io(format!("Could not open {}", args.file.display()), e),
    })?;
    debug!(file = %args.file.display(), "opened csv file");

    let conn = connector.connect(&session.connection_string()).await?;

    let mut truncated = false;
    if args.truncate {
        if prompter.confirm(TRUNCATE_MESSAGE)? {
            conn.truncate(&args.table).await?;
            truncated = true;
            println!(
                "{}",
                format!("Successfully TRUNCATED {}.", args.table)
                    .bright_green()
                    .bold()
            );
        } else {
            println!("{}", "Skipping TRUNCATION, will append instead\n".yellow());
        }
    }

    println!("{}", "Beginning `COPY` command".bright_yellow());
    let rows = conn.copy_csv(&args.table, file).await?;
    info!(table = %args.table, rows, "copy finished");
    println!(
        "{}",
        format!("COPY successful, {} records loaded", rows)
            .bright_green()
            .bold()
    );

    conn.close().await?;
    Ok(LoadOutcome { truncated, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{FakeConnector, session};
    use crate::prompt::testing::ScriptedPrompter;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "id,name\n1,alice\n2,bob\n";

    fn args(path: PathBuf, truncate: bool) -> LoadArgs {
        LoadArgs {
            file: path,
            table: "s.t".to_string(),
            truncate,
        }
    }

    fn write_csv(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, CSV).unwrap();
        path
    }

    #[tokio::test]
    async fn test_wrong_extension_fails_before_connecting() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.txt");
        let connector = FakeConnector::default();
        let prompter = ScriptedPrompter::new(true);

        let err = run(&args(path, true), &session(), &connector, &prompter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "You can only load csv files, you provided a txt");
        assert_eq!(connector.state.borrow().connects, 0);
        assert!(prompter.asked.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_connecting() {
        let dir = TempDir::new().unwrap();
        let connector = FakeConnector::default();
        let prompter = ScriptedPrompter::new(false);

        let err = run(
            &args(dir.path().join("missing.csv"), false),
            &session(),
            &connector,
            &prompter,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(connector.state.borrow().connects, 0);
    }

    #[tokio::test]
    async fn test_load_without_truncate_copies_file() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv");
        let connector = FakeConnector::default();
        let prompter = ScriptedPrompter::new(true);

        let outcome = run(&args(path, false), &session(), &connector, &prompter)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            LoadOutcome {
                truncated: false,
                rows: 2
            }
        );
        let state = connector.state.borrow();
        assert_eq!(
            state.statements,
            vec!["COPY s.t FROM STDIN DELIMITER ',' CSV HEADER".to_string()]
        );
        assert_eq!(state.copied, CSV.as_bytes());
        assert_eq!(state.closes, 1);
        assert!(prompter.asked.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_declined_truncate_appends() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv");
        let connector = FakeConnector::default();
        let prompter = ScriptedPrompter::new(false);

        let outcome = run(&args(path, true), &session(), &connector, &prompter)
            .await
            .unwrap();

        assert!(!outcome.truncated);
        assert_eq!(*prompter.asked.borrow(), vec![TRUNCATE_MESSAGE.to_string()]);
        let state = connector.state.borrow();
        assert!(!state.statements.iter().any(|s| s.starts_with("TRUNCATE")));
        assert_eq!(state.statements.len(), 1);
        assert!(state.statements[0].starts_with("COPY s.t"));
    }

    #[tokio::test]
    async fn test_confirmed_truncate_runs_before_copy() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv");
        let connector = FakeConnector::default();
        let prompter = ScriptedPrompter::new(true);

        let outcome = run(&args(path, true), &session(), &connector, &prompter)
            .await
            .unwrap();

        assert!(outcome.truncated);
        assert_eq!(
            connector.state.borrow().statements,
            vec![
                "TRUNCATE s.t".to_string(),
                "COPY s.t FROM STDIN DELIMITER ',' CSV HEADER".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv");
        let connector = FakeConnector::refusing();
        let prompter = ScriptedPrompter::new(true);

        let err = run(&args(path, true), &session(), &connector, &prompter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Connection(_)));
        assert!(connector.state.borrow().statements.is_empty());
        assert!(prompter.asked.borrow().is_empty());
    }
}
