use clap::{ArgGroup, CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ts_relay::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TELEMETRY_PORT, DEFAULT_TS_PORT};
use ts_relay::relay::{run, AddressFamily, Options, StationIdentity};

#[derive(Parser)]
#[command(name = "ts-relay", version, disable_help_flag = true)]
#[command(group(ArgGroup::new("family").args(["ipv4", "ipv6"])))]
struct Opt {
    /// Hostname to send data to
    #[arg(short = 'h', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to send data to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Force IPv4 only
    #[arg(short = '4', long)]
    ipv4: bool,

    /// Force IPv6 only
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Station callsign, up to 10 characters
    #[arg(short, long, default_value = "")]
    callsign: String,

    /// Station preshared key, up to 10 characters
    #[arg(short, long, default_value = "")]
    key: String,

    /// UDP port the MPEG-TS feed arrives on
    #[arg(long, default_value_t = DEFAULT_TS_PORT)]
    ts_port: u16,

    /// UDP port receiver status lines arrive on
    #[arg(long, default_value_t = DEFAULT_TELEMETRY_PORT)]
    telemetry_port: u16,

    /// Interval for the JSON stats snapshot (0 disables)
    #[arg(long, default_value_t = 10)]
    report_secs: u64,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opt = Opt::parse();

    let identity = StationIdentity::new(&opt.callsign, &opt.key);
    if !identity.is_complete() {
        let missing = if opt.callsign.is_empty() { "callsign (-c)" } else { "key (-k)" };
        eprintln!("Error: A {missing} is required\n");
        eprintln!("{}", Opt::command().render_help());
        std::process::exit(1);
    }

    let family = match (opt.ipv4, opt.ipv6) {
        (true, _) => AddressFamily::V4,
        (_, true) => AddressFamily::V6,
        _ => AddressFamily::Any,
    };

    // an auth rejection is already logged by the relay and exits cleanly
    run(Options {
        host: opt.host,
        port: opt.port,
        family,
        identity,
        ts_port: opt.ts_port,
        telemetry_port: opt.telemetry_port,
        report_secs: opt.report_secs,
    })
    .await?;
    Ok(())
}
