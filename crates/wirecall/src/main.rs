mod client;
mod exit;
mod server;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "wirecall", version, about = "Point-to-point RPC over a byte channel")]
#[command(group(ArgGroup::new("mode").required(true).args(["server", "client"])))]
struct Cli {
    /// Run the serving endpoint (registers the ping function).
    #[arg(long, short = 's')]
    server: bool,

    /// Run the calling endpoint (sends ping requests).
    #[arg(long, short = 'c')]
    client: bool,

    /// FIFO the server writes and the client reads.
    #[arg(long, value_name = "PATH", default_value = "/tmp/wirecall_first")]
    fifo_first: PathBuf,

    /// FIFO the client writes and the server reads.
    #[arg(long, value_name = "PATH", default_value = "/tmp/wirecall_second")]
    fifo_second: PathBuf,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Client: stop after this many requests (0 = run until killed).
    #[arg(long, value_name = "N", default_value = "0")]
    count: u64,

    /// Client: delay between requests in milliseconds.
    #[arg(long, value_name = "MS", default_value = "1000")]
    interval: u64,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn init_logging(level: LogLevel) {
    use tracing::level_filters::LevelFilter;

    let filter = match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(filter)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = if cli.server {
        server::run(&cli.fifo_first, &cli.fifo_second)
    } else {
        client::run(
            &cli.fifo_first,
            &cli.fifo_second,
            cli.count,
            cli.interval,
        )
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
