//! # axiom-glx-probe
//!
//! Brings the GLX backend up on the current X display, reports the
//! FBConfig chosen for every depth, optionally presents a few frames while
//! watching the back buffer age, and shuts everything down again.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Serialize;

use axiom_glx::driver::dlopen::{DlopenGl, XlibDisplay};
use axiom_glx::{Backend, BackendConfig, GlxBackend, NullPainter};

#[derive(Parser)]
#[command(name = "axiom-glx-probe")]
#[command(about = "Probe GLX texture-from-pixmap support on an X display")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/axiom/glx.toml")]
    config: String,

    /// X display to connect to (defaults to $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the depth table as JSON
    #[arg(long)]
    json: bool,

    /// Don't require or use a stencil buffer
    #[arg(long)]
    no_stencil: bool,

    /// Render to the root window instead of the composite overlay
    #[arg(long)]
    no_overlay: bool,

    /// Present this many frames and report the buffer age of each
    #[arg(long, default_value_t = 0)]
    frames: u32,
}

#[derive(Serialize)]
struct DepthReport {
    depth: u8,
    texture_format: String,
    texture_targets: u32,
    y_inverted: bool,
    red_size: i32,
}

#[derive(Serialize)]
struct ProbeReport {
    root: String,
    target: String,
    non_power_of_two_texture: bool,
    depths: Vec<DepthReport>,
    buffer_ages: Vec<Option<u32>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The logger filter depends on the config, so report how loading went
    // once the logger is up
    let loaded = BackendConfig::load(&cli.config);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    // Override config with CLI flags
    if cli.debug {
        config.general.debug = true;
        config.glx.debug_context = true;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_filter()),
    )
    .init();

    info!("🔎 axiom-glx-probe {}", axiom_glx::VERSION);

    match &loaded {
        Ok(_) => info!("✅ Configuration loaded from: {}", cli.config),
        Err(e) => {
            warn!("Failed to load configuration: {:#}", e);
            info!("📝 Using default configuration");
        }
    }

    if cli.no_stencil {
        config.glx.no_stencil = true;
        info!("Stencil buffer disabled via CLI flag");
    }
    if cli.no_overlay {
        config.general.use_overlay = false;
    }
    config.validate()?;

    let display = XlibDisplay::open(cli.display.as_deref(), config.general.use_overlay)?;
    let screen = display.screen_info();
    let gl = DlopenGl::load(&display);

    let mut backend = GlxBackend::init(display, gl, Box::new(NullPainter::new()), screen, &config)
        .context("GLX backend initialization failed")?;

    let ctx = backend.context();
    let depths = ctx
        .fbconfigs()
        .iter()
        .map(|(depth, config)| DepthReport {
            depth,
            texture_format: format!("{:?}", config.texture_format),
            texture_targets: config.texture_targets.bits(),
            y_inverted: config.y_inverted,
            red_size: config.red_size(),
        })
        .collect::<Vec<_>>();
    let non_power_of_two_texture = ctx.caps().non_power_of_two_texture;

    let mut buffer_ages = Vec::with_capacity(cli.frames as usize);
    for _ in 0..cli.frames {
        backend.present();
        buffer_ages.push(backend.buffer_age().get());
    }

    let report = ProbeReport {
        root: format!("{:#010x}", screen.root),
        target: format!("{:#010x}", screen.target_drawable()),
        non_power_of_two_texture,
        depths,
        buffer_ages,
    };

    backend.deinit();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ProbeReport) {
    println!("root {}  target {}", report.root, report.target);
    println!("non-power-of-two textures: {}", report.non_power_of_two_texture);
    println!("{:>5}  {:<6}  {:>7}  {:>10}  {:>3}", "depth", "format", "targets", "y-inverted", "red");
    for d in &report.depths {
        println!(
            "{:>5}  {:<6}  {:>#7x}  {:>10}  {:>3}",
            d.depth, d.texture_format, d.texture_targets, d.y_inverted, d.red_size
        );
    }
    for (frame, age) in report.buffer_ages.iter().enumerate() {
        match age {
            Some(age) => println!("frame {}: buffer age {}", frame, age),
            None => println!("frame {}: buffer age unknown", frame),
        }
    }
}
