use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pgta_core::config::{report_date_from_env_value, resolve_vocabulary};
use pgta_core::constants::{REPORT_DATE_ENV, VOCABULARY_FILE_ENV};
use pgta_core::images::index_chart_images;
use pgta_core::linkage::normalise;
use pgta_core::notation::{parse_notation, ChromosomeEvent};
use pgta_core::{
    autosomes::describe_autosomes, process_files, process_workbook, BatchContext, BatchReport,
    ChromosomeStatusMap, CoreConfig, RowWarning, Vocabulary,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pgta")]
#[command(about = "PGT-A result normalisation and record linkage")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a roster and a results export and write the patient → embryo hierarchy
    Process {
        /// Run workbook (.xlsx) with "Details" and "summary" sheets
        #[arg(long, conflicts_with_all = ["roster", "results"])]
        workbook: Option<PathBuf>,
        /// Patient roster (CSV or TSV)
        #[arg(long, required_unless_present = "workbook", requires = "results")]
        roster: Option<PathBuf>,
        /// Per-sample results export (CSV or TSV)
        #[arg(long, required_unless_present = "workbook", requires = "roster")]
        results: Option<PathBuf>,
        /// Directory of CNV chart images
        #[arg(long)]
        images: Option<PathBuf>,
        /// Lab vocabulary YAML (overrides PGTA_VOCABULARY_FILE)
        #[arg(long)]
        vocabulary: Option<PathBuf>,
        /// Report date, YYYY-MM-DD (overrides PGTA_REPORT_DATE; defaults to today)
        #[arg(long)]
        report_date: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse one notation string and print its events, statuses and description
    Parse {
        /// Notation, e.g. "del(5)(p15.33q12.3)(~64.50Mb,~57%)"
        notation: String,
    },
    /// Print the linkage-normalised form of a name or identifier
    Normalise {
        /// Patient name, sample identifier or sample name
        name: String,
    },
    /// Print the built-in lab vocabulary as YAML
    Vocabulary,
}

#[derive(Serialize)]
struct ParseOutput {
    events: Vec<ChromosomeEvent>,
    #[serde(flatten)]
    statuses: ChromosomeStatusMap,
    autosomes: String,
    warnings: Vec<RowWarning>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pgta=info".parse()?)
                .add_directive("pgta_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Process {
            workbook,
            roster,
            results,
            images,
            vocabulary,
            report_date,
            format,
            output,
        }) => {
            let vocabulary_file =
                vocabulary.or_else(|| std::env::var_os(VOCABULARY_FILE_ENV).map(PathBuf::from));
            let vocabulary = resolve_vocabulary(vocabulary_file)?;
            let config = CoreConfig::with_vocabulary(vocabulary)?;

            let report_date = report_date_from_env_value(
                report_date.or_else(|| std::env::var(REPORT_DATE_ENV).ok()),
                chrono::Local::now().date_naive(),
            )?;

            let mut context = BatchContext::new(Arc::new(config), report_date);
            if let Some(dir) = images {
                context = context.with_chart_images(index_chart_images(&dir)?);
            }

            let report = match (workbook, roster, results) {
                (Some(workbook), _, _) => process_workbook(&context, &workbook)?,
                (None, Some(roster), Some(results)) => process_files(&context, &roster, &results)?,
                _ => anyhow::bail!("either --workbook or both --roster and --results are required"),
            };
            write_report(&report, format, output)?;

            if !report.accounts_for_all_rows() {
                anyhow::bail!("batch output does not account for every result row");
            }
        }
        Some(Commands::Parse { notation }) => {
            let parsed = parse_notation(&notation);
            let statuses = ChromosomeStatusMap::from_events(&parsed.events);
            let output = ParseOutput {
                autosomes: describe_autosomes(&statuses),
                events: parsed.events,
                statuses,
                warnings: parsed.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::Normalise { name }) => {
            println!("{}", normalise(&name));
        }
        Some(Commands::Vocabulary) => {
            print!("{}", Vocabulary::default().to_yaml()?);
        }
        None => {
            println!("Use 'pgta --help' for commands");
        }
    }

    Ok(())
}

fn write_report(
    report: &BatchReport,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Yaml => report.to_yaml()?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote batch report");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
