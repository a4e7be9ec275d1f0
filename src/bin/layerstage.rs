use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use layerstage::{
    EditRecord, ManifestDecoder, RecordingSurface, StageOpts, StageSession, StageStatus,
};

#[derive(Parser, Debug)]
#[command(name = "layerstage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the stage from a document manifest and write the viewport as a PNG.
    Render(RenderArgs),
    /// Print the frames, instances and control sections of a document as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Stage options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recorded panel edits to replay after parsing (JSON array of `{section, field, value}`).
    #[arg(long)]
    edits: Option<PathBuf>,

    /// Override the initial zoom.
    #[arg(long)]
    zoom: Option<f64>,

    /// Seconds to wait for parsing and font loading.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input document manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stage options JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_opts(path: Option<&Path>) -> anyhow::Result<StageOpts> {
    Ok(match path {
        Some(p) => StageOpts::from_path(p)?,
        None => StageOpts::default(),
    })
}

fn decoder_for(in_path: &Path) -> Arc<ManifestDecoder> {
    let assets_root = in_path.parent().unwrap_or_else(|| Path::new("."));
    Arc::new(ManifestDecoder::new(assets_root))
}

fn read_edits(path: &Path) -> anyhow::Result<Vec<EditRecord>> {
    let f = File::open(path).with_context(|| format!("open edits '{}'", path.display()))?;
    let edits = serde_json::from_reader(BufReader::new(f)).with_context(|| "parse edits JSON")?;
    Ok(edits)
}

fn load_document(
    session: &mut StageSession,
    in_path: &Path,
    timeout: Duration,
) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(in_path).with_context(|| format!("read document '{}'", in_path.display()))?;
    session.open_document(bytes)?;
    match session.wait_idle(timeout)? {
        StageStatus::Failed(reason) => anyhow::bail!("document failed to parse: {reason}"),
        _ => Ok(()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut opts = load_opts(args.config.as_deref())?;
    if let Some(zoom) = args.zoom {
        opts = opts.with_initial_zoom(zoom);
    }
    let timeout = Duration::from_secs(args.timeout_secs);

    let mut session = StageSession::with_cpu_surface(opts, decoder_for(&args.in_path))?;
    load_document(&mut session, &args.in_path, timeout)?;

    if let Some(path) = &args.edits {
        let edits = read_edits(path)?;
        session.replay(&edits)?;
        session.wait_idle(timeout)?;
    }
    session.render()?;

    let frame = session
        .frame()
        .cloned()
        .context("render surface kept no frame")?
        .into_straight();
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
        .context("frame buffer size does not match its dimensions")?;
    img.save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} layers, {} sections)",
        args.out.display(),
        session.compositor().len(),
        session.panel().len()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let opts = load_opts(args.config.as_deref())?;
    let mut session = StageSession::new(
        opts,
        decoder_for(&args.in_path),
        Box::new(RecordingSurface::default()),
    )?;
    load_document(&mut session, &args.in_path, Duration::from_secs(60))?;

    let json = serde_json::to_string_pretty(&session.snapshot()).context("serialize stage")?;
    println!("{json}");
    Ok(())
}
