use anyhow::Result;
use clap::Parser;
use sensibo::{ALL_FIELDS, commands};

/// sensibo - Sensibo cloud API client
///
/// Query and control Sensibo devices from the command line.
///
/// The API key is read from --api-key or the SENSIBO_API_KEY environment
/// variable. Set RUST_LOG=debug to see every request and retry.
///
/// Examples:
///   sensibo status                           # One line per device
///   sensibo set ABC123 targetTemperature 22  # Change one AC property
#[derive(Parser, Debug)]
#[command(author, version = env!("SENSIBO_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Sensibo API key
    #[arg(long = "api-key", env = "SENSIBO_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Sensibo API URL (defaults to https://home.sensibo.com)
    #[arg(long = "api-url", env = "SENSIBO_API_URL", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Send the API key as a query parameter instead of a header
    #[arg(long = "query-auth", global = true)]
    pub query_auth: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the account the API key belongs to
    Me,

    /// Show all devices as returned by the API
    Devices(FieldsArgs),

    /// Show one or more devices
    Device(DeviceArgs),

    /// Print a one-line summary per device
    Status,

    /// Change one AC-state property of a device
    Set(SetArgs),

    /// Turn a device on or off
    Power(PowerArgs),

    /// Clear the "clean filters" notification
    ResetFilter(UidArgs),

    /// Show the timer of a device
    Timer(UidArgs),

    /// Show the schedules of a device
    Schedules(UidArgs),
}

#[derive(clap::Args, Debug)]
pub struct FieldsArgs {
    /// Comma-separated fields to request
    #[arg(long, default_value = ALL_FIELDS)]
    pub fields: String,
}

#[derive(clap::Args, Debug)]
pub struct DeviceArgs {
    /// Device ids
    #[arg(value_name = "UID", required = true)]
    pub uids: Vec<String>,

    /// Comma-separated fields to request
    #[arg(long, default_value = ALL_FIELDS)]
    pub fields: String,
}

#[derive(clap::Args, Debug)]
pub struct UidArgs {
    /// Device id
    #[arg(value_name = "UID")]
    pub uid: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Device id
    #[arg(value_name = "UID")]
    pub uid: String,

    /// AC-state property, e.g. on, mode, targetTemperature, fanLevel, swing
    pub property: String,

    /// New value; numbers and booleans are sent as JSON
    pub value: String,

    /// Only correct the recorded state, do not send a command to the AC
    #[arg(long)]
    pub assumed: bool,
}

#[derive(clap::Args, Debug)]
pub struct PowerArgs {
    /// Device id
    #[arg(value_name = "UID")]
    pub uid: String,

    pub state: PowerState,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = commands::Config::new(cli.api_key, cli.api_url, cli.timeout, cli.query_auth)?;
    let api = config.build()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Me => commands::me(&api, &mut out).await?,
        Commands::Devices(args) => commands::devices(&api, &args.fields, &mut out).await?,
        Commands::Device(args) => {
            commands::device(&api, &args.uids, &args.fields, &mut out).await?
        }
        Commands::Status => commands::status(&api, &mut out).await?,
        Commands::Set(args) => {
            commands::set(&api, &args.uid, &args.property, &args.value, args.assumed, &mut out)
                .await?
        }
        Commands::Power(args) => {
            commands::power(&api, &args.uid, args.state == PowerState::On, &mut out).await?
        }
        Commands::ResetFilter(args) => commands::reset_filter(&api, &args.uid, &mut out).await?,
        Commands::Timer(args) => commands::timer(&api, &args.uid, &mut out).await?,
        Commands::Schedules(args) => commands::schedules(&api, &args.uid, &mut out).await?,
    }
    Ok(())
}
