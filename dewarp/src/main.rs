//! dewarp CLI - rectify a photographed page from guide lines.

use clap::{Args, Parser, Subcommand};
use dewarp::correct::{
    CommitOutcome, CorrectionConfig, PointerButton, RectifiedImage, Session, SessionEvent,
    SessionOutcome, Tool,
};
use dewarp::io::{detect_format, format_from_path, write_image_quality};
use dewarp::{ImageFormat, Point, Segment};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "dewarp")]
#[command(about = "Correct page perspective from lines that should be horizontal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rectify an image using guide lines.
    Correct(CorrectArgs),

    /// Print image dimensions and format.
    Info {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CorrectArgs {
    /// Path to the input image (PNG or JPEG).
    #[arg(long)]
    image: PathBuf,

    /// Output path; the format follows the extension. Defaults to the
    /// configured output path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Guide line as `x1,y1,x2,y2` in image coordinates. Repeatable.
    #[arg(long = "line", value_parser = parse_segment)]
    lines: Vec<Segment>,

    /// JSON array of session events to replay before the --line options.
    #[arg(long)]
    events: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the source with the committed lines drawn over it.
    #[arg(long)]
    overlay: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Correct(args) => run_correct(&args),
        Commands::Info { image } => run_info(&image),
    }
}

fn run_info(path: &Path) -> CliResult<()> {
    let format = detect_format(path)?;
    let pix = dewarp::io::read_image(path)?;
    println!("{}", path.display());
    println!("  format: {:?}", format);
    println!("  size:   {} x {}", pix.width(), pix.height());
    println!("  depth:  {} bpp, {} samples per pixel", pix.depth().bits(), pix.spp());
    Ok(())
}

fn run_correct(args: &CorrectArgs) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => CorrectionConfig::from_json_file(path)?,
        None => CorrectionConfig::default(),
    };
    if args.lines.is_empty() && args.events.is_none() {
        return Err("no guide lines given; use --line or --events".into());
    }

    tracing::info!("Loading image: {}", args.image.display());
    let mut session = Session::open(&args.image, config)?;

    let overlay = args.overlay.as_deref();
    let mut rectified = None;
    if let Some(path) = &args.events {
        rectified = replay_events(&mut session, path, overlay)?;
    }

    if !args.lines.is_empty() {
        if rectified.is_some() {
            tracing::warn!("event script already finalized; ignoring --line");
        } else {
            if !session.is_active() {
                session.activate()?;
            }
            for segment in &args.lines {
                draw_line(&mut session, segment);
            }
        }
    }

    let rectified = match rectified {
        Some(image) => image,
        None => {
            if let Some(path) = overlay {
                write_overlay(&session, path)?;
            }
            session.finalize()?
        }
    };

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| session.config().output_path.clone());
    write_image_quality(
        &rectified.pix,
        &out,
        output_format(&out),
        session.config().jpeg_quality,
    )?;

    let m = rectified.homography.matrix();
    tracing::info!(
        "Homography [{:.6} {:.6} {:.3}; {:.6} {:.6} {:.3}; {:.3e} {:.3e} {:.6}]",
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)]
    );
    println!("Rectified image written to {}", out.display());
    Ok(())
}

/// Feed a recorded event script through the session.
///
/// The overlay, if requested, is written just before a scripted finalize
/// clears the committed lines. Returns the finalize result if the script
/// finalized.
fn replay_events(
    session: &mut Session,
    path: &Path,
    overlay: Option<&Path>,
) -> CliResult<Option<RectifiedImage>> {
    let text = std::fs::read_to_string(path)?;
    let events: Vec<SessionEvent> = serde_json::from_str(&text)?;
    tracing::info!("Replaying {} events from {}", events.len(), path.display());

    let mut rectified = None;
    for event in events {
        if let (SessionEvent::Finalize, Some(out)) = (&event, overlay) {
            write_overlay(session, out)?;
        }
        match session.handle(event)? {
            SessionOutcome::Finalized(image) => rectified = Some(*image),
            SessionOutcome::LineRejected => tracing::warn!("scripted line rejected as degenerate"),
            _ => {}
        }
    }
    Ok(rectified)
}

fn write_overlay(session: &Session, path: &Path) -> CliResult<()> {
    let overlay = session.render_overlay()?;
    write_image_quality(
        &overlay,
        path,
        output_format(path),
        session.config().jpeg_quality,
    )?;
    tracing::info!("Overlay written to {}", path.display());
    Ok(())
}

/// Draw one line the way a user would: press, drag, press, secondary press.
fn draw_line(session: &mut Session, segment: &Segment) {
    session.pointer_down(PointerButton::Primary, segment.p1);
    session.pointer_move(segment.p2);
    session.pointer_down(PointerButton::Primary, segment.p2);
    match session.commit_line() {
        CommitOutcome::Committed(line) => tracing::info!(
            "Line y = {:.4} x + {:.2} committed ({} total)",
            line.slope,
            line.intercept,
            session.lines().len()
        ),
        CommitOutcome::Rejected => tracing::warn!(
            "Line {},{} -> {},{} rejected: vertical or degenerate",
            segment.p1.x,
            segment.p1.y,
            segment.p2.x,
            segment.p2.y
        ),
        CommitOutcome::NoPreview => {}
    }
}

fn output_format(path: &Path) -> ImageFormat {
    match format_from_path(path) {
        ImageFormat::Unknown => ImageFormat::Png,
        format => format,
    }
}

fn parse_segment(s: &str) -> Result<Segment, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{}': {}", s, e))?;
    match values.as_slice() {
        &[x1, y1, x2, y2] => Ok(Segment::new(Point::new(x1, y1), Point::new(x2, y2))),
        _ => Err(format!("expected x1,y1,x2,y2, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment() {
        let seg = parse_segment("0,100, 400.5,120").unwrap();
        assert_eq!(seg.p1, Point::new(0.0, 100.0));
        assert_eq!(seg.p2, Point::new(400.5, 120.0));
        assert!(parse_segment("1,2,3").is_err());
        assert!(parse_segment("1,2,3,x").is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!(output_format(Path::new("a.jpg")), ImageFormat::Jpeg);
        assert_eq!(output_format(Path::new("a.png")), ImageFormat::Png);
        assert_eq!(output_format(Path::new("a")), ImageFormat::Png);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "dewarp",
            "correct",
            "--image",
            "in.png",
            "--line",
            "0,100,400,120",
            "--line",
            "0,250,400,230",
        ])
        .unwrap();
        match cli.command {
            Commands::Correct(args) => {
                assert_eq!(args.lines.len(), 2);
                assert!(args.out.is_none());
            }
            Commands::Info { .. } => panic!("expected correct"),
        }
    }
}
