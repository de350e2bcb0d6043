mod overlay;
mod page;

use anyhow::Result;
use clap::Parser;
use tabless_browser::prelude::*;
use tabless_engine::device::GpuInit;
use tabless_engine::logging::{init_logging, LoggingConfig};
use tabless_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

#[derive(Parser, Debug)]
#[command(
    name = "tabless-demo",
    about = "Run the bundled WebGPU canvas demo in a native window."
)]
struct Args {
    /// Run frames without GPU validation error scopes
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_validation: bool,

    /// Always fetch remote assets, refreshing the download cache
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_cache: bool,

    /// Window title
    #[arg(long, default_value = "tabless")]
    title: String,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Image drawn over the animated background (asset path or URL)
    #[arg(long, value_name = "SRC")]
    image: Option<String>,

    /// Log filter in env_logger syntax; falls back to RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

fn main() {
    let args = Args::parse();
    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn run(args: Args) -> Result<i32> {
    let mut options = BridgeOptions::from_env();
    if args.no_validation {
        options.validation_scopes = false;
    }
    let mut loader = LoaderConfig::from_env();
    if args.no_cache {
        loader.bypass_cache = true;
    }
    log::debug!("bridge options {options:?}, loader {loader:?}");

    let config = RuntimeConfig {
        title: args.title,
        initial_size: LogicalSize::new(args.width, args.height),
        ..RuntimeConfig::default()
    };

    let image = args.image;
    let bridge = EventBridge::new(Browser::with_loader(loader), options)
        .with_setup(move |scope| page::setup(scope, image.as_deref()));

    Runtime::run(config, GpuInit::default(), bridge)
}
