use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for a palaver instance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL to connect to the database.
    pub database_url: String,
    /// File to log to, in addition to stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Open a config file at the given path.
    pub fn open<P>(path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let msg = format!("Couldn't open config file at {}", path.display());

        let reader =
            File::open(path).map_err(|err| Error::from_io_error(err, msg))?;

        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Generate a new config file from default values.
    pub fn generate<W>(mut out: W) -> Result<()>
    where
        W: std::io::Write,
    {
        writeln!(&mut out, "# Configuration for palaver")?;
        serde_yaml::to_writer(&mut out, &Config::default())?;
        writeln!(&mut out)?;
        Ok(())
    }

    /// Get the default location of the config file.
    pub fn default_path() -> PathBuf {
        if cfg!(debug_assertions) {
            PathBuf::from("contrib/dev-config.yaml")
        } else {
            PathBuf::from("/etc/palaver/config.yaml")
        }
    }

    /// Dump configuration info to the log.
    pub fn debug_log(&self) {
        use log::debug;

        debug!("  database url {}", self.database_url);
        if let Some(ref log_file) = self.log_file {
            debug!("  log file {}", log_file.display());
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        if cfg!(debug_assertions) {
            Config {
                database_url: "postgres://palaver:@localhost/palaver".into(),
                log_file: None,
            }
        } else {
            Config {
                database_url: "postgres://palaver:@localhost/palaver".into(),
                log_file: Some(PathBuf::from("/var/log/palaver/palaver.log")),
            }
        }
    }
}
