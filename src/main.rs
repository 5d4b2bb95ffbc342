use burstweb::context::{DEFAULT_DATA_PATH, DEFAULT_STARTING_SAMPLE};
use burstweb::{AppContext, Config};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "burstweb")]
#[command(author, version, about = "Interactive view of burst spiking, sensed intra- and extracellularly")]
struct Args {
    /// Spike table (CSV with sample, isi, amp, SIZE, COLOR, PIC columns)
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Directory the spike images are served from (default: next to the data file)
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8001")]
    port: u16,

    /// Sample id whose image is shown before any interaction
    #[arg(long, default_value_t = DEFAULT_STARTING_SAMPLE)]
    starting_sample: i64,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Don't open the browser
    #[arg(long)]
    no_open: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();

    info!("burstweb v{}", env!("CARGO_PKG_VERSION"));

    let config = Config {
        data_path: args.data,
        image_dir: args.images,
        host: args.host,
        port: args.port,
        starting_sample: args.starting_sample,
        open_browser: !args.no_open,
    };

    let ctx = match AppContext::init(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = burstweb::serve::start(&ctx) {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
