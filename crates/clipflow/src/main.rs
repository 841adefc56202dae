use std::cell::RefCell;
use std::io::Read;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use clipflow_config::{BlockMode, EngineFamily, PasteConfig};
use clipflow_mod_transfer::SessionRegistry;
use clipflow_surface::memory::MemorySurface;
use clipflow_surface::{ContentType, DocRange, Orchestrator, Verdict};

/// Normalizes clipboard content the way a rich-text edit surface would
/// before insertion.
#[derive(Parser, Debug)]
#[command(name = "clipflow", version, about)]
struct Cli {
    /// Read the value from stdin instead of the system clipboard.
    #[arg(long)]
    stdin: bool,

    /// Force plain-text semantics (rich markup gets textified).
    #[arg(long)]
    as_text: bool,

    /// Engine family whose paste artifacts to expect.
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Block-separator representation for the output.
    #[arg(long, value_enum)]
    block: Option<BlockArg>,

    /// Config file to load (created with defaults when missing).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineArg {
    Webkit,
    Blink,
    Gecko,
    Trident,
    Other,
}

impl From<EngineArg> for EngineFamily {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::Webkit => EngineFamily::WebKit,
            EngineArg::Blink => EngineFamily::Blink,
            EngineArg::Gecko => EngineFamily::Gecko,
            EngineArg::Trident => EngineFamily::Trident,
            EngineArg::Other => EngineFamily::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BlockArg {
    P,
    Div,
    Br,
}

impl From<BlockArg> for BlockMode {
    fn from(value: BlockArg) -> Self {
        match value {
            BlockArg::P => BlockMode::Paragraph,
            BlockArg::Div => BlockMode::Div,
            BlockArg::Br => BlockMode::BreakOnly,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => PasteConfig::load_or_create(path),
        None => PasteConfig::default(),
    };
    if let Some(engine) = cli.engine {
        config.engine_family = engine.into();
    }
    if let Some(block) = cli.block {
        config.block_mode = block.into();
    }

    let value = if cli.stdin {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        buffer
    } else {
        let mut clipboard = arboard::Clipboard::new().context("opening system clipboard")?;
        clipboard.get_text().context("reading system clipboard")?
    };

    let registry = Rc::new(RefCell::new(SessionRegistry::<DocRange>::new(
        config.stale_drag_secs,
    )));
    let mut orch = Orchestrator::new(config.clone(), registry).context("building orchestrator")?;
    if cli.as_text {
        orch.hooks().on_before_paste(|record| {
            record.content_type = ContentType::Text;
            Verdict::Continue
        });
    }

    let mut surface = MemorySurface::new(config, "");
    orch.paste_from_value(&mut surface, value);
    orch.run_until_idle(&mut surface);

    match surface.insertions.first() {
        Some(insertion) => println!("{}", insertion.html),
        None => tracing::warn!("nothing to paste"),
    }

    Ok(())
}
