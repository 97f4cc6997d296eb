//! pdftools command-line front end
//!
//! Thin wrapper over the library crates. Results go to stdout, logs and
//! progress to stderr.

mod cli;
mod reveal;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Command, ConvertArgs, MergeArgs, ScaleArgs, TrimArgs};
use office_convert::{convert_batch, scan_folder, SofficeConverter};
use pdfjoin_core::{default_scaled_path, merge_files, normalize_widths, sort_inputs};
use pdftrim_core::{RasterBackend, TrimEvent, TrimJob, TrimRequest};
use reveal::reveal_in_file_manager;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("pdftools v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Trim(args) => run_trim(args),
        Command::Merge(args) => run_merge(args),
        Command::Convert(args) => run_convert(args),
        Command::Scale(args) => run_scale(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` directives when set and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(feature = "pdfium")]
fn raster_backend(dpi: f64) -> anyhow::Result<Box<dyn RasterBackend>> {
    Ok(Box::new(pdftrim_core::PdfiumBackend::new(dpi)?))
}

#[cfg(not(feature = "pdfium"))]
fn raster_backend(_dpi: f64) -> anyhow::Result<Box<dyn RasterBackend>> {
    bail!("pdftools was built without PDFium support")
}

fn run_trim(args: TrimArgs) -> anyhow::Result<()> {
    let options = args.options()?;
    let mut request = TrimRequest::new(&args.input).with_options(options);
    if let Some(output) = &args.output {
        request = request.with_output(output);
    }

    let backend = raster_backend(request.options.dpi).context("Trim failed")?;
    let mut job = TrimJob::new();
    let report = job
        .run(&request, backend.as_ref(), |event| match event {
            TrimEvent::Progress(progress) => {
                eprint!("\rTrimming: {:>3}%", progress.percent());
                let _ = std::io::stderr().flush();
            }
            TrimEvent::Succeeded { .. } | TrimEvent::Failed { .. } => eprintln!(),
            TrimEvent::Started { .. } => {}
        })
        .context("Trim failed")?;

    println!("{}", report.message());
    println!("{}", request.output.display());
    if args.reveal {
        reveal(&request.output);
    }
    Ok(())
}

fn run_merge(args: MergeArgs) -> anyhow::Result<()> {
    let files = sort_inputs(args.files, args.sort.into());
    let report = merge_files(&files, &args.output).context("Merge failed")?;

    println!("{}", report.message());
    println!("{}", args.output.display());
    if args.reveal {
        reveal(&args.output);
    }
    Ok(())
}

fn run_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let files = scan_folder(&args.dir)
        .with_context(|| format!("Failed to scan {}", args.dir.display()))?;
    if files.is_empty() {
        bail!("No Word or PowerPoint files found in {}", args.dir.display());
    }

    let converter = SofficeConverter::with_program(&args.soffice);
    let report = convert_batch(&converter, &files, |progress| {
        eprintln!(
            "[{}/{}] {}",
            progress.current, progress.total, progress.file_name
        );
    });

    for failure in &report.failed {
        eprintln!("{}: {}", failure.file.display(), failure.message);
    }
    println!("{}", report.message());
    if report.converted.is_empty() {
        bail!("No files were converted");
    }
    Ok(())
}

fn run_scale(args: ScaleArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| default_scaled_path(&args.input));
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let scaled = normalize_widths(&bytes).context("Scale failed")?;
    shared_pdf::io::write_atomically(&output, &scaled)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn reveal(path: &Path) {
    if let Err(e) = reveal_in_file_manager(path) {
        tracing::warn!("Could not open file manager for {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).to_string(), "info");
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            log_filter(Some("pdftrim_core=trace")).to_string(),
            "pdftrim_core=trace"
        );
    }

    #[test]
    fn test_log_filter_rejects_garbage() {
        assert_eq!(log_filter(Some("pdftrim_core=[")).to_string(), "info");
        assert_eq!(log_filter(Some("  ")).to_string(), "info");
    }
}
