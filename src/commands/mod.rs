//! The three gpctl commands. Each opens its own connection through a
//! [`Connector`](crate::db::Connector) and releases it before returning.

pub mod load;
pub mod query;
pub mod test_conn;

pub use load::{LoadArgs, LoadOutcome};
pub use query::{QueryArgs, QueryOutcome};

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::Session;
    use crate::db::{Connector, Database, ResultSet, copy_statement, truncate_statement};
    use crate::error::{Error, Result};
    use crate::normalize::ColumnValue;
    use futures_util::StreamExt;
    use futures_util::stream;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::io::{AsyncRead, AsyncReadExt};

    #[derive(Default)]
    pub struct FakeState {
        pub connects: usize,
        pub closes: usize,
        pub statements: Vec<String>,
        pub copied: Vec<u8>,
        pub columns: Vec<String>,
        pub rows: Vec<Vec<ColumnValue>>,
    }

    /// In-memory stand-in for a Greenplum server.
    #[derive(Clone, Default)]
    pub struct FakeConnector {
        pub state: Rc<RefCell<FakeState>>,
        pub refuse: bool,
    }

    impl FakeConnector {
        pub fn with_result(columns: &[&str], rows: Vec<Vec<ColumnValue>>) -> Self {
            let connector = FakeConnector::default();
            {
                let mut state = connector.state.borrow_mut();
                state.columns = columns.iter().map(|c| c.to_string()).collect();
                state.rows = rows;
            }
            connector
        }

        pub fn refusing() -> Self {
            FakeConnector {
                refuse: true,
                ..FakeConnector::default()
            }
        }
    }

    pub struct FakeDatabase {
        state: Rc<RefCell<FakeState>>,
    }

    impl Connector for FakeConnector {
        type Conn = FakeDatabase;

        async fn connect(&self, _conn_str: &str) -> Result<FakeDatabase> {
            self.state.borrow_mut().connects += 1;
            if self.refuse {
                let cause = "port=refused"
                    .parse::<tokio_postgres::Config>()
                    .expect_err("port must be numeric");
                return Err(Error::Connection(cause));
            }
            Ok(FakeDatabase {
                state: Rc::clone(&self.state),
            })
        }
    }

    impl Database for FakeDatabase {
        async fn truncate(&self, table: &str) -> Result<u64> {
            self.state.borrow_mut().statements.push(truncate_statement(table));
            Ok(0)
        }

        async fn copy_csv<R>(&self, table: &str, mut reader: R) -> Result<u64>
        where
            R: AsyncRead + Unpin,
        {
            let mut data = Vec::new();
            reader
                .read_to_end(&mut data)
                .await
                .map_err(|e| Error::io("copy", e))?;
            // The header line is not a record.
            let records = data.split(|b| *b == b'\n').filter(|l| !l.is_empty()).count();

            let mut state = self.state.borrow_mut();
            state.statements.push(copy_statement(table));
            state.copied = data;
            Ok(records.saturating_sub(1) as u64)
        }

        async fn query(&self, sql: &str) -> Result<ResultSet> {
            let mut state = self.state.borrow_mut();
            state.statements.push(sql.to_string());
            let rows = state.rows.clone();
            Ok(ResultSet {
                columns: state.columns.clone(),
                rows: stream::iter(rows.into_iter().map(Ok)).boxed(),
            })
        }

        async fn close(self) -> Result<()> {
            self.state.borrow_mut().closes += 1;
            Ok(())
        }
    }

    pub fn session() -> Session {
        Session {
            host: "localhost".to_string(),
            port: 5432,
            user: "gpadmin".to_string(),
            password: "secret".to_string(),
            dbname: "warehouse".to_string(),
        }
    }
}
