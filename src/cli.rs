use crate::config::load_config;
use crate::layout::{Session, TreeVisualizer};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_tree;
use crate::render::{SceneBinding, render_svg, write_output_png, write_output_svg};
use crate::text_metrics::{FixedWidthMeasure, FontMeasure, TextMeasure};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ncv", version, about = "Nested circle layout for package/class trees")]
pub struct Args {
    /// Input file (class name list or tree JSON) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Fold a node (full name) after the initial layout; repeatable
    #[arg(long = "fold")]
    pub fold: Vec<String>,

    /// Drag a node after folding, as NAME:DX:DY; repeatable
    #[arg(long = "drag")]
    pub drag: Vec<String>,

    /// Measure labels as this many pixels per character instead of using a font
    #[arg(long = "charWidth")]
    pub char_width: Option<f64>,

    /// Write the computed layout as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// Log layout decisions (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(Debug, Clone)]
enum LabelMeasure {
    Fixed(FixedWidthMeasure),
    Font(FontMeasure),
}

impl TextMeasure for LabelMeasure {
    fn measure(&self, label: &str) -> f64 {
        match self {
            LabelMeasure::Fixed(measure) => measure.measure(label),
            LabelMeasure::Font(measure) => measure.measure(label),
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let tree = parse_tree(&input)?;
    log::info!("parsed tree with {} nodes", tree.len());

    let measure = match args.char_width {
        Some(width) => LabelMeasure::Fixed(FixedWidthMeasure::new(width)),
        None => LabelMeasure::Font(FontMeasure::new(
            config.theme.font_family.clone(),
            f64::from(config.theme.font_size),
        )),
    };
    let visualizer = TreeVisualizer::new(config.layout.clone(), measure);
    let mut session = Session::new(tree, visualizer, SceneBinding::new());

    for name in &args.fold {
        let id = session.tree().id_of(name)?;
        session.set_folded(id, true);
    }
    for raw in &args.drag {
        let (name, dx, dy) = parse_drag(raw)?;
        let id = session.tree().id_of(name)?;
        session.drag(id, dx, dy, true);
    }

    if let Some(path) = args.dump.as_deref() {
        write_layout_dump(path, session.tree())?;
    }

    let svg = render_svg(session.binding(), &config.theme, &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// Splits `NAME:DX:DY`; the name itself never contains ':'.
fn parse_drag(raw: &str) -> Result<(&str, f64, f64)> {
    let mut parts = raw.rsplitn(3, ':');
    let dy = parts.next();
    let dx = parts.next();
    let name = parts.next();
    match (name, dx, dy) {
        (Some(name), Some(dx), Some(dy)) if !name.is_empty() => {
            let dx: f64 = dx
                .trim()
                .parse()
                .with_context(|| format!("invalid dx in drag `{raw}`"))?;
            let dy: f64 = dy
                .trim()
                .parse()
                .with_context(|| format!("invalid dy in drag `{raw}`"))?;
            Ok((name, dx, dy))
        }
        _ => Err(anyhow::anyhow!("drag must look like NAME:DX:DY, got `{raw}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drag_arguments() {
        let (name, dx, dy) = parse_drag("com.tngtech.main:12.5:-3").unwrap();
        assert_eq!(name, "com.tngtech.main");
        assert_eq!(dx, 12.5);
        assert_eq!(dy, -3.0);
    }

    #[test]
    fn rejects_malformed_drag_arguments() {
        assert!(parse_drag("main:1").is_err());
        assert!(parse_drag(":1:2").is_err());
        assert!(parse_drag("main:x:2").is_err());
    }

    #[test]
    fn args_accept_repeated_folds() {
        let args = Args::try_parse_from([
            "ncv",
            "-i",
            "tree.txt",
            "--fold",
            "p.a",
            "--fold",
            "p.b",
            "--drag",
            "p.c:1:2",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.fold, vec!["p.a", "p.b"]);
        assert_eq!(args.drag.len(), 1);
        assert_eq!(args.verbose, 2);
    }
}
