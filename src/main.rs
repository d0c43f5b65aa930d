use clap::Parser;
use gaugeface::{
    init_logging, Color, FaceCatalog, FaceGeometry, FaceId, FontFace, GaugeError, GaugeSpec,
    OutputFormat, RenderContext, RenderOptions, Renderer, ShapeVariant,
};
use rand::Rng;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Renders a radial gauge to PNG or SVG, or shows it in a preview window.
#[derive(Parser, Debug)]
#[command(name = "gaugeface", version, long_about = None)]
struct Args {
    /// Packed face ID: rotation, shape and face number
    #[arg(long)]
    face_id: Option<u16>,

    /// JSON face catalog the face number is looked up in
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Theme key passed to the palette resolver
    #[arg(long, default_value = "light")]
    theme: String,

    /// Added to the face number before the catalog lookup
    #[arg(long, default_value_t = 0)]
    theme_offset: u32,

    /// Needle value; defaults to the minimum
    #[arg(long, allow_negative_numbers = true)]
    value: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    min: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    max: Option<f64>,

    /// Major tick increment
    #[arg(long)]
    major: Option<f64>,

    /// Minor tick increment
    #[arg(long)]
    minor: Option<f64>,

    /// Range boundaries, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    ranges: Vec<f64>,

    /// Range colors as names or hex, comma separated
    #[arg(long, value_delimiter = ',', value_parser = Color::from_str)]
    colors: Vec<Color>,

    /// Round range ends
    #[arg(long)]
    round: bool,

    /// Blend range colors into gradients
    #[arg(long)]
    gradient: bool,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Draw a drop shadow under the body
    #[arg(long)]
    shadow: bool,

    /// Write SVG instead of PNG
    #[arg(long)]
    svg: bool,

    /// Output file; SVG defaults to stdout, PNG to gauge.png
    #[arg(long)]
    out: Option<PathBuf>,

    /// TrueType font for raster labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Open a live preview window instead of writing a file
    #[arg(long)]
    preview: bool,
}

fn build_spec(args: &Args) -> GaugeSpec {
    let mut spec = GaugeSpec::builder()
        .ranges(args.ranges.clone())
        .range_colors(args.colors.clone())
        .round_ranges(args.round)
        .gradient(args.gradient)
        .build();
    spec.min = args.min.unwrap_or(spec.min);
    spec.max = args.max.unwrap_or(spec.max);
    spec.major_inc = args.major.unwrap_or(spec.major_inc);
    spec.minor_inc = args.minor.unwrap_or(spec.minor_inc);
    spec.value = args.value.unwrap_or(spec.min);
    spec
}

/// Face and shape from `--face-id`, resolved in the catalog when one is given.
fn resolve_face(args: &Args) -> Result<(FaceGeometry, ShapeVariant), GaugeError> {
    let Some(raw) = args.face_id else {
        return Ok((FaceGeometry::default(), ShapeVariant::Half));
    };
    let id = FaceId::decode(raw)?;
    let mut face = match &args.catalog {
        Some(path) => FaceCatalog::from_file(path)?
            .resolve(id.face, args.theme_offset)?
            .clone(),
        None => FaceGeometry::default(),
    };
    face.rotation_offset += id.rotation_offset();
    Ok((face, id.shape))
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (face, shape) = resolve_face(&args)?;
    let spec = build_spec(&args);
    let ctx = RenderContext::new(args.theme.clone());

    let mut renderer = Renderer::new();
    if let Some(path) = &args.font {
        renderer = renderer.with_font(FontFace::from_file(path)?);
    }

    if args.preview {
        let (sender, receiver) = mpsc::channel();
        if let Some(value) = args.value {
            let _ = sender.send(value);
        } else if spec.is_drawable() {
            let (min, max) = (spec.min, spec.max);
            thread::spawn(move || {
                let mut rng = rand::rng();
                loop {
                    if sender.send(rng.random_range(min..max)).is_err() {
                        break;
                    }
                    thread::sleep(Duration::from_millis(800));
                }
            });
        }
        return gaugeface::preview::show("gaugeface", renderer, face, shape, spec, ctx, Some(receiver));
    }

    let mut options = RenderOptions::builder()
        .format(if args.svg {
            OutputFormat::Vector
        } else {
            OutputFormat::Raster
        })
        .shadow(args.shadow)
        .build();
    options.width = args.width.unwrap_or(options.width);
    options.height = args.height.unwrap_or(options.height);

    let out = renderer.render(&face, shape, &spec, &options, &ctx);
    for skipped in &out.skipped {
        info!(part = %skipped.part, reason = %skipped.reason, "layer left out");
    }

    match (out.to_svg_string(), &args.out) {
        (Some(svg), Some(path)) => std::fs::write(path, svg)?,
        (Some(svg), None) => io::stdout().write_all(svg.as_bytes())?,
        (None, Some(path)) => out.write_png(path)?,
        (None, None) => out.write_png("gauge.png")?,
    }
    Ok(())
}

fn main() {
    init_logging();
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(error = %e, "gaugeface failed");
        process::exit(1);
    }
}
