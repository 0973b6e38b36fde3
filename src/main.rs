mod cmd;
mod config;
mod error;

use clap::Parser;

fn init_logs() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, registry, EnvFilter};

    let _ = registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("{}=info", env!("CARGO_PKG_NAME")).into()))
        .with(fmt::layer().with_ansi(cfg!(debug_assertions)))
        .try_init();
}

fn main() -> std::process::ExitCode {
    init_logs();

    let args = cmd::Args::parse();
    let config = args.config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .expect("unable to start the async runtime");

    match runtime.block_on(args.run(config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}
