use crate::config::Session;
use crate::db::{Connector, Database};
use crate::error::Result;
use colored::Colorize;
use tracing::info;

/// Opens a connection and closes it again. Never touches any table.
pub async fn run<C: Connector>(session: &Session, connector: &C) -> Result<()> {
    println!("Testing connection\n");

    let conn = connector.connect(&session.connection_string()).await?;
    info!(host = %session.host, port = session.port, "connection established");
    conn.close().await?;

    println!("{}", "Your connection to Greenplum is good to go.".bright_green());
    Ok(())
}
