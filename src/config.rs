use {
    log::debug,
    serde::Deserialize,
    std::{
        fs, io,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

pub const DEFAULT_PATH: &str = "nest.yaml";

const SAMPLE: &str = "\
# Sample nest-scraper config file
# browserpath should be set to the absolute path of the Chromium (or Chrome)
# executable to run.
browserpath: /path/to/chromium
login: user@domain.com
password: PASSWORD
# Directory where the browser profile should be stored. Environment variables
# and ~ in this are expanded.
browserprofiledir: $HOME/.nest-scrape/browser-profile
";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("the permissions on {} must not allow group or other any access", .0.display())]
    Permissions(PathBuf),

    #[error("invalid config")]
    Yaml(#[from] serde_yaml::Error),

    #[error("the {0} setting cannot be empty")]
    EmptyField(&'static str),

    #[error("cannot expand {field}: {message}")]
    Expand {
        field: &'static str,
        message: String,
    },

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "browserpath")]
    pub browser_path: String,
    pub login: String,
    pub password: String,
    #[serde(rename = "browserprofiledir")]
    pub browser_profile_dir: String,
}

impl Config {
    /// Reads and validates the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("loading config from {}", path.display());

        let meta = fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        check_permissions(path, &meta)?;

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;

        config.browser_profile_dir = shellexpand::full(&config.browser_profile_dir)
            .map_err(|e| ConfigError::Expand {
                field: "browserprofiledir",
                message: e.to_string(),
            })?
            .into_owned();

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("browserpath", &self.browser_path),
            ("login", &self.login),
            ("password", &self.password),
            ("browserprofiledir", &self.browser_profile_dir),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
fn check_permissions(path: &Path, meta: &fs::Metadata) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    if meta.permissions().mode() & 0o077 != 0 {
        return Err(ConfigError::Permissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path, _meta: &fs::Metadata) -> Result<(), ConfigError> {
    Ok(())
}

/// Writes a commented sample config to `path`, readable only by its owner.
pub fn generate(path: &Path) -> Result<(), ConfigError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|source| match source.kind() {
        io::ErrorKind::AlreadyExists => ConfigError::AlreadyExists(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    io::Write::write_all(&mut file, SAMPLE.as_bytes()).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use {super::*, tempfile::TempDir};

    const VALID: &str = "\
browserpath: /usr/bin/chromium
login: me@example.com
password: hunter2
browserprofiledir: /tmp/profile
";

    #[test]
    fn parses_lowercase_keys() {
        let config = Config::from_yaml(VALID).unwrap();

        assert_eq!(config.browser_path, "/usr/bin/chromium");
        assert_eq!(config.login, "me@example.com");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.browser_profile_dir, "/tmp/profile");
    }

    #[test]
    fn empty_field_is_rejected() {
        let raw = VALID.replace("hunter2", "\"\"");
        match Config::from_yaml(&raw) {
            Err(ConfigError::EmptyField(name)) => assert_eq!(name, "password"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_field_is_rejected() {
        let raw = "browserpath: /usr/bin/chromium\nlogin: me\npassword: pw\n";
        assert!(matches!(Config::from_yaml(raw), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn profile_dir_expands_env() {
        std::env::set_var("NEST_SCRAPER_TEST_DIR", "/var/tmp/nest");
        let raw = VALID.replace("/tmp/profile", "$NEST_SCRAPER_TEST_DIR/profile");

        let config = Config::from_yaml(&raw).unwrap();
        assert_eq!(config.browser_profile_dir, "/var/tmp/nest/profile");
    }

    #[cfg(unix)]
    #[test]
    fn load_checks_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nest.yaml");
        fs::write(&path, VALID).unwrap();

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Permissions(_))
        ));

        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(Config::load(&path).unwrap().login, "me@example.com");
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(&dir.path().join("absent.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn io_cause_is_reported_once() {
        use anyhow::Context;

        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.yaml"))
            .context("Loading config failed")
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.starts_with("Loading config failed: cannot read "));
        assert_eq!(message.matches("os error").count(), 1, "{}", message);
    }

    #[test]
    fn yaml_cause_is_reported_once() {
        let err = Config::from_yaml("browserpath: [").unwrap_err();
        let cause = std::error::Error::source(&err).unwrap().to_string();

        let message = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(message.matches(&cause).count(), 1, "{}", message);
    }

    #[test]
    fn generated_sample_loads_and_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nest.yaml");

        generate(&path).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.browser_path, "/path/to/chromium");
        assert!(config.browser_profile_dir.ends_with("/.nest-scrape/browser-profile"));

        assert!(matches!(
            generate(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }
}
