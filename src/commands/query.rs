use crate::config::Session;
use crate::db::{Connector, Database, ResultSet};
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::output::{CsvSink, TableSink, check_csv_extension};
use colored::Colorize;
use futures_util::TryStreamExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    /// SQL file holding the statement to run.
    pub file: Option<PathBuf>,
    /// CSV destination; the results go to stdout as a table when unset.
    pub output: Option<PathBuf>,
    /// Inline statement. Accepted on the command line but not used yet.
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Written { path: PathBuf, rows: usize },
    Rendered { rows: usize },
    /// No SQL file was given, so nothing ran.
    Skipped,
}

pub async fn run<C: Connector>(
    args: &QueryArgs,
    session: &Session,
    connector: &C,
) -> Result<QueryOutcome> {
    println!("Query Results\n");

    if args.query.is_some() {
        debug!("--query is ignored; the statement is read from --file");
    }

    let conn = connector.connect(&session.connection_string()).await?;

    let Some(sql_path) = &args.file else {
        debug!("no sql file given, nothing to run");
        conn.close().await?;
        return Ok(QueryOutcome::Skipped);
    };

    let sql = tokio::fs::read_to_string(sql_path)
        .await
        .map_err(|e| Error::io("Could not open the sql file", e))?;
    debug!(file = %sql_path.display(), bytes = sql.len(), "running query");

    let result = conn.query(&sql).await?;
    let outcome = match &args.output {
        Some(path) => write_csv(path, result).await?,
        None => render_table(result).await?,
    };

    conn.close().await?;
    Ok(outcome)
}

async fn write_csv(path: &Path, result: ResultSet) -> Result<QueryOutcome> {
    check_csv_extension(
        path,
        "Sorry, you can only output query results into a csv file",
    )?;

    let ResultSet { columns, mut rows } = result;
    let mut sink = CsvSink::create(path)?;
    sink.write_header(&columns)?;
    while let Some(values) = rows.try_next().await? {
        sink.write_row(&normalize(&values))?;
    }
    let written = sink.finish()?;
    info!(path = %path.display(), rows = written, "query results written");

    println!(
        "{}",
        format!("Successfully wrote the query results to {}", path.display())
            .bright_green()
            .bold()
    );
    Ok(QueryOutcome::Written {
        path: path.to_path_buf(),
        rows: written,
    })
}

async fn render_table(result: ResultSet) -> Result<QueryOutcome> {
    let ResultSet { columns, mut rows } = result;
    let mut table = TableSink::new(&columns);
    while let Some(values) = rows.try_next().await? {
        table.add_row(normalize(&values));
    }
    println!("{}", table.render());

    Ok(QueryOutcome::Rendered {
        rows: table.row_count(),
    })
}
