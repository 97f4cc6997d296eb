//! Command-line arguments

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdfjoin_core::SortMode;
use pdftrim_core::{AxisPolicy, TrimConfig, TrimOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdftools")]
#[command(version, about = "Trim, merge, convert and rescale PDF documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crop the whitespace around each page's content
    Trim(TrimArgs),
    /// Concatenate PDFs with one bookmark per input file
    Merge(MergeArgs),
    /// Convert the Word and PowerPoint files in a folder to PDF
    Convert(ConvertArgs),
    /// Scale every page to the width of the first page
    Scale(ScaleArgs),
}

#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input PDF
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output PDF (default: <stem>_cropped.pdf next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sensitivity in [0, 1]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Padding around detected content, in points
    #[arg(short, long)]
    pub margin: Option<f64>,

    /// Which sides are trimmed
    #[arg(long, value_enum)]
    pub axis: Option<AxisArg>,

    /// Detect page boxes on a worker pool
    #[arg(long)]
    pub parallel: bool,

    /// Worker count for --parallel
    #[arg(long, requires = "parallel")]
    pub workers: Option<usize>,

    /// Render resolution used for detection
    #[arg(long)]
    pub dpi: Option<f64>,

    /// TOML file with a [trim] table; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show the output in the file manager when done
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum AxisArg {
    Horizontal,
    Vertical,
    Both,
}

impl From<AxisArg> for AxisPolicy {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Horizontal => AxisPolicy::Horizontal,
            AxisArg::Vertical => AxisPolicy::Vertical,
            AxisArg::Both => AxisPolicy::Both,
        }
    }
}

impl TrimArgs {
    /// Options from the config file (or defaults) with flags applied on top
    pub fn options(&self) -> anyhow::Result<TrimOptions> {
        let mut options = match &self.config {
            Some(path) => TrimConfig::from_file(path)?.trim,
            None => TrimOptions::default(),
        };
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(margin) = self.margin {
            options.margin = margin;
        }
        if let Some(axis) = self.axis {
            options.axis = axis.into();
        }
        if let Some(dpi) = self.dpi {
            options.dpi = dpi;
        }
        if self.parallel {
            options.parallel = true;
        }
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        Ok(options)
    }
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// PDFs to merge
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output PDF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Input ordering
    #[arg(long, value_enum, default_value = "name")]
    pub sort: SortArg,

    /// Show the output in the file manager when done
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Name,
    Created,
    Given,
}

impl From<SortArg> for SortMode {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Name => SortMode::Name,
            SortArg::Created => SortMode::Created,
            SortArg::Given => SortMode::AsGiven,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Folder holding .doc/.docx/.ppt/.pptx files
    pub dir: PathBuf,

    /// LibreOffice executable
    #[arg(long, default_value = "soffice")]
    pub soffice: PathBuf,
}

#[derive(Args, Debug)]
pub struct ScaleArgs {
    /// Input PDF
    pub input: PathBuf,

    /// Output PDF (default: <stem>_Crop.pdf next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    fn trim_args(argv: &[&str]) -> TrimArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Trim(args) => args,
            other => panic!("expected trim, got {:?}", other),
        }
    }

    #[test]
    fn test_trim_defaults() {
        let args = trim_args(&["pdftools", "trim", "-i", "deck.pdf"]);
        assert_eq!(args.input, PathBuf::from("deck.pdf"));
        assert_eq!(args.output, None);
        assert_eq!(args.options().unwrap(), TrimOptions::default());
    }

    #[test]
    fn test_trim_flags_override() {
        let args = trim_args(&[
            "pdftools", "trim", "-i", "deck.pdf", "-o", "out.pdf", "-t", "0.3", "-m", "4",
            "--axis", "both", "--parallel", "--workers", "3", "--dpi", "144",
        ]);
        let options = args.options().unwrap();
        assert_eq!(options.threshold, 0.3);
        assert_eq!(options.margin, 4.0);
        assert_eq!(options.axis, AxisPolicy::Both);
        assert!(options.parallel);
        assert_eq!(options.workers, 3);
        assert_eq!(options.dpi, 144.0);
    }

    #[test]
    fn test_workers_requires_parallel() {
        let result = Cli::try_parse_from(["pdftools", "trim", "-i", "a.pdf", "--workers", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_arguments() {
        let cli = Cli::try_parse_from([
            "pdftools", "merge", "b.pdf", "a.pdf", "-o", "all.pdf", "--sort", "given",
        ])
        .unwrap();
        match cli.command {
            Command::Merge(args) => {
                assert_eq!(args.files, vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]);
                assert_eq!(SortMode::from(args.sort), SortMode::AsGiven);
                assert!(!args.reveal);
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_needs_files() {
        assert!(Cli::try_parse_from(["pdftools", "merge", "-o", "all.pdf"]).is_err());
    }

    #[test]
    fn test_convert_default_program() {
        let cli = Cli::try_parse_from(["pdftools", "convert", "docs"]).unwrap();
        match cli.command {
            Command::Convert(args) => assert_eq!(args.soffice, PathBuf::from("soffice")),
            other => panic!("expected convert, got {:?}", other),
        }
    }
}
