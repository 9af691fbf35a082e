//! Profile configuration (`config.yaml`).

use anyhow::{Context, Result, bail};
use kafkakit::{ConnectionConfig, SaslMechanism, SecurityProtocol};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yaml";

/// User-level config directory, `~/.config/kafka-admin`
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("kafka-admin"))
}

/// Find the config file: the `--config` flag, then `./config.yaml`, then
/// `~/.config/kafka-admin/config.yaml`.
pub fn locate(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(expand(&path.to_string_lossy()));
    }

    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Ok(local);
    }

    let user = config_dir()?.join(CONFIG_FILE);
    if user.is_file() {
        return Ok(user);
    }

    bail!(
        "No {CONFIG_FILE} found (looked in the current directory and {})",
        user.display()
    )
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Config File
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Connection settings for one cluster.
#[derive(Clone, Deserialize)]
pub struct Profile {
    pub bootstrap_servers: BootstrapServers,
    #[serde(default)]
    pub security_protocol: Option<String>,
    #[serde(default)]
    pub sasl_mechanism: Option<String>,
    #[serde(default)]
    pub sasl_plain_username: Option<String>,
    #[serde(default)]
    pub sasl_plain_password: Option<String>,
    #[serde(default)]
    pub ssl_check_hostname: bool,
    #[serde(default)]
    pub kafka_bin_dir: Option<String>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("security_protocol", &self.security_protocol)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("sasl_plain_username", &self.sasl_plain_username)
            .field(
                "sasl_plain_password",
                &self.sasl_plain_password.as_ref().map(|_| "***"),
            )
            .field("ssl_check_hostname", &self.ssl_check_hostname)
            .field("kafka_bin_dir", &self.kafka_bin_dir)
            .finish()
    }
}

/// `bootstrap_servers` as a comma-separated string or a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BootstrapServers {
    One(String),
    Many(Vec<String>),
}

impl BootstrapServers {
    pub fn to_vec(&self) -> Vec<String> {
        let servers: Vec<&str> = match self {
            Self::One(s) => s.split(',').collect(),
            Self::Many(list) => list.iter().map(String::as_str).collect(),
        };
        servers
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

impl Config {
    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Pick the profile to use.
    ///
    /// An explicit name must exist. Otherwise `default_profile` is used when
    /// it names a profile, else the first profile by name.
    pub fn select(&self, name: Option<&str>) -> Result<(&str, &Profile)> {
        if self.profiles.is_empty() {
            bail!("No profiles defined in config");
        }

        if let Some(name) = name {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| (k.as_str(), p))
                .with_context(|| {
                    format!(
                        "Unknown profile '{name}' (available: {})",
                        self.profile_names().join(", ")
                    )
                });
        }

        if let Some(default) = &self.default_profile
            && let Some((k, p)) = self.profiles.get_key_value(default)
        {
            return Ok((k.as_str(), p));
        }

        self.profiles
            .iter()
            .next()
            .map(|(k, p)| (k.as_str(), p))
            .context("No profiles defined in config")
    }

    fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

impl Profile {
    /// Connection settings for the backend
    pub fn connection(&self) -> Result<ConnectionConfig> {
        let security_protocol = match &self.security_protocol {
            Some(s) => SecurityProtocol::parse(s)?,
            None => SecurityProtocol::default(),
        };
        let sasl_mechanism = self
            .sasl_mechanism
            .as_deref()
            .map(SaslMechanism::parse)
            .transpose()?;

        let config = ConnectionConfig {
            bootstrap_servers: self.bootstrap_servers.to_vec(),
            security_protocol,
            sasl_mechanism,
            sasl_username: self.sasl_plain_username.clone(),
            sasl_password: self.sasl_plain_password.clone(),
            ssl_check_hostname: self.ssl_check_hostname,
            kafka_bin_dir: self.kafka_bin_dir.as_deref().map(expand),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Load the config and resolve the selected profile into connection settings.
pub fn load_connection(flag: Option<&Path>, profile: Option<&str>) -> Result<ConnectionConfig> {
    let path = locate(flag)?;
    let config = Config::load(&path)?;
    let (name, selected) = config.select(profile)?;
    log::debug!("using profile '{name}' from {}", path.display());
    selected
        .connection()
        .with_context(|| format!("Invalid profile '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
default_profile: prod
profiles:
  local:
    bootstrap_servers: localhost:9092
  prod:
    bootstrap_servers:
      - b1:9093
      - b2:9093
    security_protocol: SASL_SSL
    sasl_mechanism: SCRAM-SHA-512
    sasl_plain_username: admin
    sasl_plain_password: secret
";

    #[test]
    fn test_default_profile_selected() {
        let config = Config::parse(SAMPLE).unwrap();
        let (name, profile) = config.select(None).unwrap();

        assert_eq!(name, "prod");
        let connection = profile.connection().unwrap();
        assert_eq!(connection.bootstrap(), "b1:9093,b2:9093");
        assert_eq!(connection.security_protocol, SecurityProtocol::SaslSsl);
        assert_eq!(connection.sasl_mechanism, Some(SaslMechanism::ScramSha512));
    }

    #[test]
    fn test_explicit_profile() {
        let config = Config::parse(SAMPLE).unwrap();
        let (name, profile) = config.select(Some("local")).unwrap();

        assert_eq!(name, "local");
        let connection = profile.connection().unwrap();
        assert_eq!(connection.security_protocol, SecurityProtocol::Plaintext);
        assert!(connection.client_properties().is_none());
    }

    #[test]
    fn test_unknown_profile_is_fatal() {
        let config = Config::parse(SAMPLE).unwrap();
        let err = config.select(Some("staging")).unwrap_err();
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn test_missing_default_falls_back_to_first() {
        let config = Config::parse(
            "default_profile: gone\nprofiles:\n  b:\n    bootstrap_servers: b:9092\n  a:\n    bootstrap_servers: a:9092\n",
        )
        .unwrap();
        assert_eq!(config.select(None).unwrap().0, "a");
    }

    #[test]
    fn test_no_profiles_is_fatal() {
        let config = Config::parse("default_profile: prod\n").unwrap();
        assert!(config.select(None).is_err());

        let config = Config::parse("profiles: {}\n").unwrap();
        assert!(config.select(None).is_err());
    }

    #[test]
    fn test_comma_separated_servers() {
        let config =
            Config::parse("profiles:\n  p:\n    bootstrap_servers: 'a:1, b:2,'\n").unwrap();
        let connection = config.select(None).unwrap().1.connection().unwrap();
        assert_eq!(connection.bootstrap_servers, vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_sasl_without_credentials_rejected() {
        let config = Config::parse(
            "profiles:\n  p:\n    bootstrap_servers: a:1\n    security_protocol: SASL_PLAINTEXT\n    sasl_mechanism: PLAIN\n",
        )
        .unwrap();
        assert!(config.select(None).unwrap().1.connection().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::parse(SAMPLE).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_load_connection_from_flag() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let connection = load_connection(Some(file.path()), Some("local")).unwrap();
        assert_eq!(connection.bootstrap(), "localhost:9092");
    }
}
