//! Configuration file support for ndmgmt
//!
//! Loads and validates ND settings and the interfaces this node speaks on
//! from a TOML file. Default location: /etc/rpl/ndmgmt.conf
//!
//! ```toml
//! [device]
//! aro_lifetime = 120
//!
//! [[interface]]
//! name = "wpan0"
//! eui64 = "00:12:4b:ff:fe:01:02:03"
//! addresses = ["2001:db8::1"]
//! ```

use crate::builder::DeviceIdentity;
use crate::error::{NdError, Result};
use crate::interface::NetworkInterface;
use crate::wire::ARO_DEFAULT_LIFETIME;
use rpl_types::{Eui64, is_link_local, is_multicast};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv6Addr;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rpl/ndmgmt.conf";

/// Node-wide Neighbor Discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// ARO registration lifetime, in 60-second units
    #[serde(default = "default_aro_lifetime")]
    pub aro_lifetime: u16,

    /// Require non-all-nodes multicast NS to hit the target's solicited-node group
    #[serde(default)]
    pub strict_solicited_node: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// One local interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name (e.g., "wpan0")
    pub name: String,

    /// Kernel interface index; resolved from the name when omitted
    #[serde(default)]
    pub index: Option<u32>,

    /// Hardware identity placed in address registrations
    pub eui64: Eui64,

    /// Link-local address; derived from the EUI-64 when omitted
    #[serde(default)]
    pub link_local: Option<Ipv6Addr>,

    /// Additional unicast addresses owned by this interface
    #[serde(default)]
    pub addresses: Vec<Ipv6Addr>,

    /// Simulated interface: packets are recorded instead of sent
    #[serde(default)]
    pub faked: bool,
}

/// Complete ndmgmt configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NdConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, rename = "interface")]
    pub interfaces: Vec<InterfaceConfig>,
}

fn default_aro_lifetime() -> u16 {
    ARO_DEFAULT_LIFETIME
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            aro_lifetime: default_aro_lifetime(),
            strict_solicited_node: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl NdConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(NdError::Io(e)),
        };

        config.validate()?;
        info!(
            path = %path.display(),
            interfaces = config.interfaces.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Load from default location or defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.device.aro_lifetime == 0 {
            return Err(NdError::Config(
                "aro_lifetime must be > 0 (zero deregisters)".to_string(),
            ));
        }

        for (i, iface) in self.interfaces.iter().enumerate() {
            if iface.name.is_empty() {
                return Err(NdError::Config(format!("interface #{} has no name", i)));
            }
            if self.interfaces[..i].iter().any(|other| other.name == iface.name) {
                return Err(NdError::Config(format!(
                    "interface {} configured twice",
                    iface.name
                )));
            }
            if let Some(link_local) = iface.link_local {
                if !is_link_local(&link_local) {
                    return Err(NdError::Config(format!(
                        "{}: link_local {} is not in fe80::/10",
                        iface.name, link_local
                    )));
                }
            }
            if let Some(addr) = iface.addresses.iter().find(|a| is_multicast(a)) {
                return Err(NdError::Config(format!(
                    "{}: address {} is multicast",
                    iface.name, addr
                )));
            }
        }

        Ok(())
    }

    /// Settings used when this node builds its own announcements
    pub fn device_identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.device.aro_lifetime)
    }

    /// Look up an interface section by name
    pub fn interface(&self, name: &str) -> Result<&InterfaceConfig> {
        self.interfaces
            .iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| NdError::InterfaceNotFound(name.to_string()))
    }
}

impl InterfaceConfig {
    /// Create the runtime interface described by this section
    pub fn build(&self) -> Result<NetworkInterface> {
        let index = match self.index {
            Some(index) => index,
            None if self.faked => 0,
            None => resolve_ifindex(&self.name)?,
        };

        let mut iface = NetworkInterface::new(&self.name, index, self.eui64).with_faked(self.faked);
        if let Some(link_local) = self.link_local {
            iface = iface.with_link_local(link_local);
        }
        for addr in &self.addresses {
            iface = iface.with_address(*addr);
        }
        Ok(iface)
    }
}

#[cfg(target_os = "linux")]
fn resolve_ifindex(name: &str) -> Result<u32> {
    nix::net::if_::if_nametoindex(name).map_err(|_| NdError::InterfaceNotFound(name.to_string()))
}

#[cfg(not(target_os = "linux"))]
fn resolve_ifindex(name: &str) -> Result<u32> {
    Err(NdError::InterfaceNotFound(format!(
        "{} (set index explicitly on this platform)",
        name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::InterfaceIdentity;
    use std::io::Write;

    const SAMPLE: &str = r#"
[device]
aro_lifetime = 120
strict_solicited_node = true

[logging]
level = "debug"

[[interface]]
name = "wpan0"
index = 7
eui64 = "00:12:4b:ff:fe:01:02:03"
addresses = ["2001:db8::1"]

[[interface]]
name = "lowpan-sim"
eui64 = "02:00:00:ff:fe:00:00:01"
link_local = "fe80::1"
faked = true
"#;

    #[test]
    fn test_default_config() {
        let config = NdConfig::default();
        assert_eq!(config.device.aro_lifetime, ARO_DEFAULT_LIFETIME);
        assert!(!config.device.strict_solicited_node);
        assert_eq!(config.logging.level, "info");
        assert!(config.interfaces.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let config: NdConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.device.aro_lifetime, 120);
        assert!(config.device.strict_solicited_node);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.interfaces.len(), 2);
        assert_eq!(config.interfaces[0].index, Some(7));
        assert!(config.interfaces[1].faked);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: NdConfig = toml::from_str("[device]\nstrict_solicited_node = true\n").unwrap();
        assert_eq!(config.device.aro_lifetime, ARO_DEFAULT_LIFETIME);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_build_interfaces() {
        let config: NdConfig = toml::from_str(SAMPLE).unwrap();

        let wpan0 = config.interface("wpan0").unwrap().build().unwrap();
        assert_eq!(wpan0.index(), 7);
        assert!(wpan0.matching_address(&"2001:db8::1".parse().unwrap()));
        assert_eq!(
            wpan0.link_local_address(),
            "fe80::212:4bff:fe01:203".parse::<Ipv6Addr>().unwrap()
        );

        let sim = config.interface("lowpan-sim").unwrap().build().unwrap();
        assert!(sim.is_faked());
        assert_eq!(sim.index(), 0);
        assert_eq!(sim.link_local_address(), "fe80::1".parse::<Ipv6Addr>().unwrap());
    }

    #[test]
    fn test_unknown_interface() {
        let config: NdConfig = toml::from_str(SAMPLE).unwrap();
        assert!(matches!(
            config.interface("eth9"),
            Err(NdError::InterfaceNotFound(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_lifetime() {
        let mut config = NdConfig::default();
        config.device.aro_lifetime = 0;
        assert!(matches!(config.validate(), Err(NdError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let mut config: NdConfig = toml::from_str(SAMPLE).unwrap();
        config.interfaces[0].addresses.push("ff02::1".parse().unwrap());
        assert!(config.validate().is_err());

        let mut config: NdConfig = toml::from_str(SAMPLE).unwrap();
        config.interfaces[1].link_local = Some("2001:db8::9".parse().unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut config: NdConfig = toml::from_str(SAMPLE).unwrap();
        let dup = config.interfaces[0].clone();
        config.interfaces.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_eui64_rejected() {
        let result: std::result::Result<NdConfig, _> =
            toml::from_str("[[interface]]\nname = \"wpan0\"\neui64 = \"nope\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = NdConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.device_identity(), DeviceIdentity::new(120));
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let logs = crate::test_support::LogCapture::default();
        let config = logs
            .run(|| NdConfig::load_or_default("/nonexistent/path.conf"))
            .unwrap();
        assert!(config.interfaces.is_empty());

        let output = logs.contents();
        assert!(output.contains("config file not found, using defaults"), "{output}");
        assert!(output.contains("/nonexistent/path.conf"), "{output}");
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[device\n").unwrap();
        assert!(matches!(
            NdConfig::load_or_default(file.path()),
            Err(NdError::Toml(_))
        ));
    }
}
