// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use scanlink::Config;
use scanlink::constants::{APP_ID, LOG_FILE_NAME, capture};
use scanlink::scanner::LinkPolicy;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "scanlink")]
#[command(about = "Scan barcodes: open links and collect unique identifiers")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: ~/.config/scanlink/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan barcodes from a camera (default command)
    Scan(ScanArgs),

    /// List available cameras
    List,

    /// Decode barcodes in image files or directories
    Decode {
        /// Images or directories of images
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Copy the unique identifiers to the clipboard when done
        #[arg(short, long)]
        copy: bool,
    },

    /// Show a web page
    Web {
        /// Page to open
        url: String,
    },

    /// Print the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Camera device to use (from 'scanlink list')
    #[arg(short, long)]
    device: Option<String>,

    /// Replay these images (or directories) instead of using a camera
    #[arg(short, long, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Replay rate for --images
    #[arg(long, default_value_t = capture::DEFAULT_SEQUENCE_FPS)]
    fps: u32,

    /// Restart --images from the first image after the last one
    #[arg(long = "loop")]
    looping: bool,

    /// Print results to stdout instead of showing the scanning screen
    #[arg(long)]
    headless: bool,

    /// Copy the unique identifiers to the clipboard on exit (headless only)
    #[arg(short, long)]
    copy: bool,

    /// Only open values with a valid http(s) scheme as links
    #[arg(long)]
    strict_links: bool,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            device: None,
            images: Vec::new(),
            fps: capture::DEFAULT_SEQUENCE_FPS,
            looping: false,
            headless: false,
            copy: false,
            strict_links: false,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        None => true,
        Some(Commands::Scan(args)) => !args.headless,
        Some(_) => false,
    };
    init_logging(interactive);

    if let Some(Commands::Config { init }) = cli.command {
        return cli::show_config(cli.config.as_deref(), init);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Scan(args)) => run_scan(&mut config, args),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Decode { files, copy }) => cli::decode_images(&files, &config, copy),
        Some(Commands::Web { url }) => cli::show_web_page(&url),
        Some(Commands::Config { .. }) => Ok(()),
        None => run_scan(&mut config, ScanArgs::default()),
    }
}

fn run_scan(config: &mut Config, args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(device) = args.device {
        config.camera_device = device;
    }
    if args.strict_links {
        config.link_policy = LinkPolicy::WebScheme;
    }

    let camera = cli::open_camera(config, &args.images, args.fps, args.looping)?;
    if args.headless {
        cli::scan_headless(camera, config, args.copy)
    } else {
        scanlink::terminal::run(camera, config)
    }
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=scanlink=debug, RUST_LOG=info
///
/// The scanning screen owns the terminal, so it logs to a file in the
/// cache directory instead of stderr.
fn init_logging(interactive: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if !interactive {
        builder.init();
        return;
    }

    if let Some(file) = open_log_file() {
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    }
}

fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join(APP_ID);
    std::fs::create_dir_all(&dir).ok()?;
    File::create(dir.join(LOG_FILE_NAME)).ok()
}
