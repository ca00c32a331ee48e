//! ndmgmt: Neighbor Discovery management tool
//!
//! Announces this node on a mesh interface (`send-ns`) or feeds a captured
//! Neighbor Solicitation through the classifier (`inject`), then reports
//! the diagnostic counters.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log every command and its outcome
//! - CM-6: Configuration Settings - TOML configuration file

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rpl_ndmgmt::{
    DEFAULT_CONFIG_PATH, DiagnosticCounters, NdConfig, NetworkInterface, NsClassifier,
    RecordingTransport, Transport, TransportReplies, hexdump, hexfile,
};
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Swaps the active log filter once the configuration is known
type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Neighbor Discovery management for RPL mesh interfaces
#[derive(Parser, Debug)]
#[command(name = "ndmgmt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Record packets and hexdump them instead of sending
    #[arg(long, alias = "testing")]
    fake: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the diagnostic counters when done
    #[arg(long, value_enum)]
    stats: Option<StatsFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Announce this node with an NS/ARO to all-nodes
    SendNs {
        /// Interface to announce on
        #[arg(short = 'i', long)]
        iface: String,
    },

    /// Classify a Neighbor Solicitation read from a hex file
    Inject {
        /// Interface the packet arrived on
        #[arg(short = 'i', long)]
        iface: String,

        /// IPv6 source of the solicitation
        #[arg(long)]
        from: Ipv6Addr,

        /// IPv6 destination of the solicitation
        #[arg(long)]
        to: Ipv6Addr,

        /// Hex file holding the ICMPv6 body, or `-` for stdin
        #[arg(short = 'd', long)]
        data: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatsFormat {
    Json,
    Prometheus,
}

/// Where outbound packets go for this run
enum Link {
    Recorded(RecordingTransport),
    #[cfg(target_os = "linux")]
    Raw(rpl_ndmgmt::RawIcmpTransport),
}

impl Link {
    fn open(iface: &NetworkInterface) -> anyhow::Result<Self> {
        if iface.is_faked() {
            return Ok(Link::Recorded(RecordingTransport::default()));
        }
        open_raw(iface)
    }

    fn transport(&mut self) -> &mut dyn Transport {
        match self {
            Link::Recorded(t) => t,
            #[cfg(target_os = "linux")]
            Link::Raw(t) => t,
        }
    }

    /// Dump whatever a simulated link captured
    fn report(&mut self) {
        if let Link::Recorded(t) = self {
            for packet in t.take() {
                println!(
                    "Sending ICMP of length: {} ({} -> {})",
                    packet.bytes.len(),
                    packet.src,
                    packet.dest
                );
                print!("{}", hexdump(&packet.bytes));
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn open_raw(iface: &NetworkInterface) -> anyhow::Result<Link> {
    use rpl_ndmgmt::InterfaceIdentity;

    let transport = rpl_ndmgmt::RawIcmpTransport::open(iface.index())
        .with_context(|| format!("opening raw ICMPv6 socket on {}", iface.name()))?;
    Ok(Link::Raw(transport))
}

#[cfg(not(target_os = "linux"))]
fn open_raw(iface: &NetworkInterface) -> anyhow::Result<Link> {
    bail!(
        "raw ICMPv6 is only supported on Linux; use --fake for {}",
        iface.name()
    )
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "ndmgmt: exiting with error");
            eprintln!("ndmgmt: {:#}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let logging = init_logging(args.verbose)?;
    let config = load_config(&args.config, args.verbose, &logging)?;

    let counters = Arc::new(DiagnosticCounters::new()?);

    match &args.command {
        Command::SendNs { iface } => {
            let iface = build_interface(&config, iface, args.fake)?;
            let mut link = Link::open(&iface)?;

            let len = iface.send_ns(&config.device_identity(), link.transport())?;
            info!(interface = iface.name(), len, "ndmgmt: sent self-announcement");
            link.report();
        }
        Command::Inject {
            iface,
            from,
            to,
            data,
        } => {
            let payload = hexfile::read_path(data)
                .with_context(|| format!("reading packet data from {}", data.display()))?;
            let mut iface = build_interface(&config, iface, args.fake)?;
            let mut link = Link::open(&iface)?;

            let classifier = NsClassifier::new(Arc::clone(&counters))
                .with_strict_solicited_node(config.device.strict_solicited_node);
            let disposition = {
                let mut replies =
                    TransportReplies::new(link.transport(), config.device_identity());
                classifier.receive_neighbor_solicit(
                    &mut iface,
                    *from,
                    *to,
                    Instant::now(),
                    &payload,
                    &mut replies,
                )
            };

            info!(interface = iface.name(), ?disposition, "ndmgmt: solicitation classified");
            for entry in iface.neighbors().iter() {
                info!(
                    neighbor = %entry.address(),
                    valid = entry.is_valid(),
                    ifindex = entry.ifindex(),
                    "ndmgmt: neighbor cache"
                );
            }
            link.report();
        }
    }

    match args.stats {
        Some(StatsFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&counters.snapshot())?);
        }
        Some(StatsFormat::Prometheus) => print!("{}", counters.encode_text()?),
        None => {}
    }

    Ok(())
}

/// Runtime interface for `name`; `fake` overrides the configured mode
fn build_interface(config: &NdConfig, name: &str, fake: bool) -> anyhow::Result<NetworkInterface> {
    let mut section = config.interface(name)?.clone();
    section.faked |= fake;
    if !section.faked && cfg!(not(target_os = "linux")) {
        bail!("interface {} is not faked and this platform has no raw ICMPv6", name);
    }
    Ok(section.build()?)
}

/// Load the configuration file and apply its `[logging] level`.
///
/// `RUST_LOG` and `-v` take precedence over the configured level.
fn load_config(path: &Path, verbose: u8, logging: &FilterHandle) -> anyhow::Result<NdConfig> {
    let config = NdConfig::load_or_default(path)
        .with_context(|| format!("loading {}", path.display()))?;

    if verbose == 0 && std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        let filter = EnvFilter::try_new(&config.logging.level)
            .with_context(|| format!("invalid [logging] level {:?}", config.logging.level))?;
        logging.reload(filter)?;
        debug!(level = %config.logging.level, "applied configured log level");
    }

    Ok(config)
}

/// Filter used until the configuration has been read
fn startup_filter(verbose: u8) -> EnvFilter {
    let directive = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn logging_subscriber<W>(
    verbose: u8,
    writer: W,
) -> (impl tracing::Subscriber + Send + Sync + 'static, FilterHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::new(startup_filter(verbose));
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_writer(writer)
            .compact(),
    );
    (subscriber, handle)
}

/// Initialize structured logging
///
/// Installed before anything else runs so configuration loading is logged.
///
/// # NIST Controls
/// - AU-3: Content of Audit Records - Structured format
fn init_logging(verbose: u8) -> anyhow::Result<FilterHandle> {
    let (subscriber, handle) = logging_subscriber(verbose, std::io::stderr);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use tracing::warn;

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_missing_config_file_is_logged() {
        let logs = LogCapture::default();
        let (subscriber, handle) = logging_subscriber(0, logs.clone());

        let config = tracing::subscriber::with_default(subscriber, || {
            load_config(Path::new("/nonexistent/ndmgmt.conf"), 0, &handle)
        })
        .unwrap();

        assert!(config.interfaces.is_empty());
        let output = logs.contents();
        assert!(output.contains("config file not found, using defaults"), "{output}");
    }

    #[test]
    fn test_configured_level_applied_after_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[logging]\nlevel = \"warn\"\n").unwrap();
        let logs = LogCapture::default();
        let (subscriber, handle) = logging_subscriber(0, logs.clone());

        tracing::subscriber::with_default(subscriber, || {
            load_config(file.path(), 0, &handle).unwrap();
            info!("after load: info");
            warn!("after load: warn");
        });

        let output = logs.contents();
        assert!(output.contains("loaded configuration"), "{output}");
        assert!(!output.contains("after load: info"), "{output}");
        assert!(output.contains("after load: warn"), "{output}");
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_inject() {
        let args = Args::try_parse_from([
            "ndmgmt",
            "--testing",
            "--stats",
            "prometheus",
            "inject",
            "-i",
            "wpan0",
            "--from",
            "fe80::1",
            "--to",
            "ff02::1",
            "-d",
            "-",
        ])
        .unwrap();

        assert!(args.fake);
        assert_eq!(args.stats, Some(StatsFormat::Prometheus));
        match args.command {
            Command::Inject { iface, to, data, .. } => {
                assert_eq!(iface, "wpan0");
                assert_eq!(to, "ff02::1".parse::<Ipv6Addr>().unwrap());
                assert_eq!(data, PathBuf::from("-"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_send_ns_defaults() {
        let args = Args::try_parse_from(["ndmgmt", "-vv", "send-ns", "--iface", "wpan0"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!args.fake);
        assert!(args.stats.is_none());
    }

    #[test]
    fn test_build_interface_fake_override() {
        let config: NdConfig = toml::from_str(
            "[[interface]]\nname = \"wpan0\"\nindex = 3\neui64 = \"02:00:00:ff:fe:00:00:01\"\n",
        )
        .unwrap();

        let iface = build_interface(&config, "wpan0", true).unwrap();
        assert!(iface.is_faked());
        assert!(build_interface(&config, "wpan9", true).is_err());
    }
}
