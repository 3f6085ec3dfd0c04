use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure a gpctl command can end with. None of them are retried:
/// the binary reports the message on stderr and exits with status 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("Error in connecting to Greenplum:\n{0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{context}:\n{source}")]
    Database {
        context: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("{context}:\n{source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode column '{column}' of type {type_name}: {message}")]
    Decode {
        column: String,
        type_name: String,
        message: String,
    },

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl Error {
    pub fn database(context: impl Into<String>, source: tokio_postgres::Error) -> Self {
        Error::Database {
            context: context.into(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(format!("Invalid configuration: {}", e))
    }
}

impl From<inquire::InquireError> for Error {
    fn from(e: inquire::InquireError) -> Self {
        Error::Prompt(e.to_string())
    }
}
