//! Broker connection settings.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// `security.protocol` of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecurityProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAINTEXT" => Ok(Self::SaslPlaintext),
            "SASL_SSL" => Ok(Self::SaslSsl),
            other => Err(Error::Config(format!(
                "unknown security_protocol '{other}' (expected PLAINTEXT, SSL, SASL_PLAINTEXT or SASL_SSL)"
            ))),
        }
    }

    pub fn uses_sasl(&self) -> bool {
        matches!(self, Self::SaslPlaintext | Self::SaslSsl)
    }

    pub fn uses_tls(&self) -> bool {
        matches!(self, Self::Ssl | Self::SaslSsl)
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `sasl.mechanism` of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().replace('_', "-").as_str() {
            "PLAIN" => Ok(Self::Plain),
            "SCRAM-SHA-256" => Ok(Self::ScramSha256),
            "SCRAM-SHA-512" => Ok(Self::ScramSha512),
            other => Err(Error::Config(format!(
                "unknown sasl_mechanism '{other}' (expected PLAIN, SCRAM-SHA-256 or SCRAM-SHA-512)"
            ))),
        }
    }

    fn login_module(&self) -> &'static str {
        match self {
            Self::Plain => "org.apache.kafka.common.security.plain.PlainLoginModule",
            Self::ScramSha256 | Self::ScramSha512 => {
                "org.apache.kafka.common.security.scram.ScramLoginModule"
            }
        }
    }
}

/// Everything needed to talk to one cluster.
///
/// Built once from the selected profile and handed to the backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub bootstrap_servers: Vec<String>,
    pub security_protocol: SecurityProtocol,
    pub sasl_mechanism: Option<SaslMechanism>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    /// Verify the broker certificate's hostname
    pub ssl_check_hostname: bool,
    /// Directory holding `kafka-topics.sh` and friends
    pub kafka_bin_dir: Option<PathBuf>,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("bootstrap_servers", &self.bootstrap_servers)
            .field("security_protocol", &self.security_protocol)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("sasl_username", &self.sasl_username)
            .field("sasl_password", &self.sasl_password.as_ref().map(|_| "***"))
            .field("ssl_check_hostname", &self.ssl_check_hostname)
            .field("kafka_bin_dir", &self.kafka_bin_dir)
            .finish()
    }
}

impl ConnectionConfig {
    /// Plaintext connection to the given servers
    pub fn plaintext(bootstrap_servers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Value for `--bootstrap-server`
    pub fn bootstrap(&self) -> String {
        self.bootstrap_servers.join(",")
    }

    /// Check the settings are complete and consistent
    pub fn validate(&self) -> Result<()> {
        if self.bootstrap_servers.iter().all(|s| s.trim().is_empty()) {
            return Err(Error::Config("bootstrap_servers is empty".to_string()));
        }

        if self.security_protocol.uses_sasl() {
            if self.sasl_mechanism.is_none() {
                return Err(Error::Config(format!(
                    "sasl_mechanism is required with security_protocol {}",
                    self.security_protocol
                )));
            }
            if self.sasl_username.is_none() || self.sasl_password.is_none() {
                return Err(Error::Config(
                    "sasl_plain_username and sasl_plain_password are required for SASL".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Client properties for the admin tools' `--command-config`.
    ///
    /// Returns `None` for a plain connection, which needs no properties.
    pub fn client_properties(&self) -> Option<String> {
        if self.security_protocol == SecurityProtocol::Plaintext {
            return None;
        }

        let mut props = vec![format!("security.protocol={}", self.security_protocol)];

        if self.security_protocol.uses_sasl()
            && let Some(mechanism) = self.sasl_mechanism
        {
            props.push(format!("sasl.mechanism={}", mechanism.as_str()));
            props.push(format!(
                "sasl.jaas.config={} required username=\"{}\" password=\"{}\";",
                mechanism.login_module(),
                jaas_escape(self.sasl_username.as_deref().unwrap_or_default()),
                jaas_escape(self.sasl_password.as_deref().unwrap_or_default()),
            ));
        }

        if self.security_protocol.uses_tls() && !self.ssl_check_hostname {
            props.push("ssl.endpoint.identification.algorithm=".to_string());
        }

        let mut text = props.join("\n");
        text.push('\n');
        Some(text)
    }
}

fn jaas_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sasl_ssl() -> ConnectionConfig {
        ConnectionConfig {
            bootstrap_servers: vec!["b1:9093".into(), "b2:9093".into()],
            security_protocol: SecurityProtocol::SaslSsl,
            sasl_mechanism: Some(SaslMechanism::ScramSha512),
            sasl_username: Some("alice".into()),
            sasl_password: Some("p\"w".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_protocol_and_mechanism() {
        assert_eq!(
            SecurityProtocol::parse("sasl_ssl").unwrap(),
            SecurityProtocol::SaslSsl
        );
        assert_eq!(
            SaslMechanism::parse("scram_sha_256").unwrap(),
            SaslMechanism::ScramSha256
        );
        assert!(SecurityProtocol::parse("TLS").is_err());
        assert!(SaslMechanism::parse("GSSAPI").is_err());
    }

    #[test]
    fn test_plaintext_needs_no_properties() {
        let config = ConnectionConfig::plaintext(["localhost:9092"]);
        assert!(config.client_properties().is_none());
        assert_eq!(config.bootstrap(), "localhost:9092");
        config.validate().unwrap();
    }

    #[test]
    fn test_sasl_ssl_properties() {
        let props = sasl_ssl().client_properties().unwrap();

        assert!(props.contains("security.protocol=SASL_SSL\n"));
        assert!(props.contains("sasl.mechanism=SCRAM-SHA-512\n"));
        assert!(props.contains("ScramLoginModule required username=\"alice\" password=\"p\\\"w\";"));
        assert!(props.contains("ssl.endpoint.identification.algorithm=\n"));
    }

    #[test]
    fn test_hostname_check_keeps_default_algorithm() {
        let config = ConnectionConfig {
            ssl_check_hostname: true,
            ..sasl_ssl()
        };
        let props = config.client_properties().unwrap();
        assert!(!props.contains("ssl.endpoint.identification.algorithm"));
    }

    #[test]
    fn test_validate_requires_sasl_credentials() {
        let config = ConnectionConfig {
            sasl_password: None,
            ..sasl_ssl()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", sasl_ssl());
        assert!(!debug.contains("p\\\"w"));
        assert!(debug.contains("***"));
    }
}
