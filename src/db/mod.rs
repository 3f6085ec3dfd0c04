use crate::error::{Error, Result};
use crate::normalize::{ColumnValue, decode_row};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt, pin_mut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error};

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Column names plus the decoded rows, streamed as the server sends them.
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: BoxStream<'static, Result<Vec<ColumnValue>>>,
}

/// Opens one connection per command.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Conn: Database;

    async fn connect(&self, conn_str: &str) -> Result<Self::Conn>;
}

/// The statements gpctl issues against an open connection.
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Removes every row of `table`.
    async fn truncate(&self, table: &str) -> Result<u64>;

    /// Streams `reader` into `table` as CSV with a header line, returning the
    /// number of rows loaded.
    async fn copy_csv<R>(&self, table: &str, reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin;

    async fn query(&self, sql: &str) -> Result<ResultSet>;

    /// Releases the connection and waits for the server session to end.
    async fn close(self) -> Result<()>;
}

pub struct PgConnector;

impl Connector for PgConnector {
    type Conn = DatabaseConnection;

    async fn connect(&self, conn_str: &str) -> Result<DatabaseConnection> {
        DatabaseConnection::connect(conn_str).await
    }
}

#[derive(Debug)]
pub struct DatabaseConnection {
    pub client: Client,
    driver: JoinHandle<()>,
}

impl DatabaseConnection {
    pub async fn connect(conn_str: &str) -> Result<DatabaseConnection> {
        let config: Config = conn_str.parse().map_err(Error::Connection)?;

        match config.connect(NoTls).await {
            Ok((client, connection)) => {
                // The connection object performs the actual communication with the database,
                // so spawn it off to run on its own.
                let driver = tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("Database connection error: {}", e);
                    }
                });
                debug!(host = ?config.get_hosts(), "connected");

                Ok(DatabaseConnection { client, driver })
            }
            Err(e) => Err(Error::Connection(e)),
        }
    }
}

impl Database for DatabaseConnection {
    async fn truncate(&self, table: &str) -> Result<u64> {
        let statement = truncate_statement(table);
        debug!(%statement, "executing");
        self.client.execute(statement.as_str(), &[]).await.map_err(|e| {
            Error::database(
                format!("An error occurred when attempting to TRUNCATE {}", table),
                e,
            )
        })
    }

    async fn copy_csv<R>(&self, table: &str, mut reader: R) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let context = format!("An error occurred when copying the csv file into {}", table);
        let statement = copy_statement(table);
        debug!(%statement, "executing");

        let sink = self
            .client
            .copy_in::<_, Bytes>(statement.as_str())
            .await
            .map_err(|e| Error::database(context.as_str(), e))?;
        pin_mut!(sink);

        let mut buf = vec![0u8; COPY_CHUNK_SIZE];
        let mut sent = 0usize;
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| Error::io(context.as_str(), e))?;
            if n == 0 {
                break;
            }
            sink.send(Bytes::copy_from_slice(&buf[..n]))
                .await
                .map_err(|e| Error::database(context.as_str(), e))?;
            sent += n;
        }
        debug!(bytes = sent, "copy data sent");

        sink.as_mut()
            .finish()
            .await
            .map_err(|e| Error::database(context.as_str(), e))
    }

    async fn query(&self, sql: &str) -> Result<ResultSet> {
        let context = "An error occurred when running the query";
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| Error::database(context, e))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        debug!(columns = columns.len(), "statement prepared");

        let stream = self
            .client
            .query_raw(&statement, std::iter::empty::<&(dyn ToSql + Sync)>())
            .await
            .map_err(|e| Error::database(context, e))?;

        let rows = stream
            .map(|row| {
                row.map_err(|e| Error::database("Could not read a result row", e))
                    .and_then(|row| decode_row(&row))
            })
            .boxed();

        Ok(ResultSet { columns, rows })
    }

    async fn close(self) -> Result<()> {
        let DatabaseConnection { client, driver } = self;
        drop(client);
        if let Err(e) = driver.await {
            error!("Database connection task failed: {}", e);
        }
        Ok(())
    }
}

pub fn truncate_statement(table: &str) -> String {
    format!("TRUNCATE {}", table)
}

pub fn copy_statement(table: &str) -> String {
    format!("COPY {} FROM STDIN DELIMITER ',' CSV HEADER", table)
}
