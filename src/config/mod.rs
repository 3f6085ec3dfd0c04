use crate::error::{Error, Result};
use config::{Environment, File, FileFormat, Map};
use dirs::home_dir;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_NAMES: [&str; 3] = [".gpctl", ".gpctl.yaml", ".gpctl.yml"];
const ENV_PREFIX: &str = "GPCTL";
const DEFAULT_PORT: u16 = 5432;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub hostname: String,
    pub user: String,
    pub port: u16,
    pub database: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub database: DatabaseSettings,
}

impl Settings {
    /// Loads settings from `explicit` (or the default file in the home
    /// directory) and the `GPCTL_` environment variables.
    ///
    /// Returns the settings and the config file that was read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_default_config_file(&Self::get_home_dir()?),
        };
        let settings = Self::load_from(file.as_deref(), None)?;
        Ok((settings, file))
    }

    /// `env` replaces the process environment when set.
    pub(crate) fn load_from(file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder().set_default("database.port", i64::from(DEFAULT_PORT))?;

        if let Some(path) = file {
            debug!(path = %path.display(), "reading config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("_")
                .try_parsing(true)
                .source(env),
        );

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    fn find_default_config_file(home: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| home.join(name))
            .find(|path| path.is_file())
    }

    fn get_home_dir() -> Result<PathBuf> {
        home_dir().ok_or_else(|| Error::Config("Could not resolve the home directory".to_string()))
    }
}

/// Connection parameters for one invocation, built once after the password
/// prompt and passed to every command.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl Session {
    pub fn new(settings: &Settings, password: String) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::Validation("A password is required".to_string()));
        }
        let db = &settings.database;
        Ok(Session {
            host: db.hostname.clone(),
            port: db.port,
            user: db.user.clone(),
            password,
            dbname: db.database.clone(),
        })
    }

    /// Key/value connection string, always with `sslmode=disable`.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            quote_value(&self.host),
            self.port,
            quote_value(&self.user),
            quote_value(&self.password),
            quote_value(&self.dbname),
        )
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

// libpq quoting: single quotes around the value, with ' and \ escaped.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
