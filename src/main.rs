use anyhow::Result;
use clap::Parser;
use cotejar::{
    cli::{Cli, Commands, ReportFormat},
    plot, summary, validate,
    workbook::{parse_observations, TableLayout, Workbook},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => {
            let workbook = Workbook::load_xlsx(&args.xlsx)?;
            let report = validate::run_validation(&workbook, &TableLayout::default())?;
            match args.format {
                ReportFormat::Text => print!("{}", report.render_text()),
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Plot(args) => {
            let workbook = Workbook::load_xlsx(&args.xlsx)?;
            let layout = TableLayout::default();
            let sheet = workbook.resolve(&layout.observations)?;
            let table = parse_observations(sheet)?;
            let rows = summary::summarize(&table)?;
            let written = plot::render_plots(&table, &rows, &args.out)?;
            println!(
                "Saved {} figures to: {}",
                written.len(),
                args.out.display()
            );
        }
    }
    Ok(())
}
