//! CLI argument parsing for Cotejar

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for the validation report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cotejar")]
#[command(version)]
#[command(
    about = "Statistical validation and plotting for compression benchmark results",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recompute summary statistics from the observations sheet, cross-check
    /// them against the stored summary, and rerun the significance tests
    Validate(ValidateArgs),
    /// Render per-metric box plots and confidence-interval charts
    Plot(PlotArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the results workbook (.xlsx)
    #[arg(long = "xlsx", value_name = "PATH")]
    pub xlsx: PathBuf,

    /// Report output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Args, Debug, Clone)]
pub struct PlotArgs {
    /// Path to the results workbook (.xlsx)
    #[arg(long = "xlsx", value_name = "PATH")]
    pub xlsx: PathBuf,

    /// Directory the figures are written into (created if absent)
    #[arg(long = "out", value_name = "DIR", default_value = "figures")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::parse_from(["cotejar", "validate", "--xlsx", "results.xlsx"]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.xlsx, PathBuf::from("results.xlsx"));
                assert!(matches!(args.format, ReportFormat::Text));
            }
            _ => panic!("expected validate subcommand"),
        }
    }

    #[test]
    fn test_cli_validate_json_format() {
        let cli = Cli::parse_from([
            "cotejar", "validate", "--xlsx", "results.xlsx", "--format", "json",
        ]);
        match cli.command {
            Commands::Validate(args) => assert!(matches!(args.format, ReportFormat::Json)),
            _ => panic!("expected validate subcommand"),
        }
    }

    #[test]
    fn test_cli_plot_default_output_dir() {
        let cli = Cli::parse_from(["cotejar", "plot", "--xlsx", "results.xlsx"]);
        match cli.command {
            Commands::Plot(args) => assert_eq!(args.out, PathBuf::from("figures")),
            _ => panic!("expected plot subcommand"),
        }
    }

    #[test]
    fn test_cli_plot_custom_output_dir() {
        let cli = Cli::parse_from([
            "cotejar", "plot", "--xlsx", "results.xlsx", "--out", "paper/figs",
        ]);
        match cli.command {
            Commands::Plot(args) => assert_eq!(args.out, PathBuf::from("paper/figs")),
            _ => panic!("expected plot subcommand"),
        }
    }

    #[test]
    fn test_cli_requires_xlsx() {
        assert!(Cli::try_parse_from(["cotejar", "validate"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["cotejar"]).is_err());
    }
}
