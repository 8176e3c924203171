use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use grainstat::grain::{DateFormat, SubjectGrain, TimeGrain};
use grainstat::params::{parse_date, split_list, ReportParameters, ReportType, RosterFilter};
use grainstat::report::{Report, ReportKind, ReportRunner, ReportTable, RunContext};
use grainstat::settings::Settings;
use grainstat::{ReportError, Result};

/// Roster-filtered survey reports
#[derive(Parser)]
#[command(name = "grainstat")]
#[command(about = "grainstat - Roster-filtered survey reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to grainstat.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available reports
    List,
    /// Run one or more reports against a single roster
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Reports to run, separated by commas or semicolons
    reports: String,

    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    start: String,

    /// First day excluded (YYYY-MM-DD)
    #[arg(long)]
    end: String,

    /// One row per subject grain instead of per time grain
    #[arg(long)]
    stack: bool,

    #[arg(long, default_value = "month")]
    time_grain: TimeGrain,

    /// iso, compact or long
    #[arg(long, default_value = "iso")]
    date_format: DateFormat,

    /// id, name, team, program or orgunit
    #[arg(long, default_value = "name")]
    user_grain: SubjectGrain,

    /// Agent names to include, separated by commas or semicolons
    #[arg(long, value_name = "NAMES")]
    agents: Option<String>,

    /// Team names to include, separated by commas or semicolons
    #[arg(long, value_name = "NAMES")]
    teams: Option<String>,

    /// Include every subject regardless of --agents and --teams
    #[arg(long)]
    all: bool,

    /// Print JSON instead of tab-separated text
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn reports(&self) -> Result<Vec<ReportKind>> {
        split_list(&self.reports).iter().map(|key| key.parse()).collect()
    }

    fn parameters(&self) -> Result<ReportParameters> {
        let filter =
            RosterFilter::from_lists(self.agents.as_deref(), self.teams.as_deref(), self.all);
        let mut params = ReportParameters::new(
            filter,
            parse_date("start", &self.start)?,
            parse_date("end", &self.end)?,
        );
        params.report_type = if self.stack { ReportType::Stack } else { ReportType::TimeTrend };
        params.time_grain = self.time_grain;
        params.date_format = self.date_format;
        params.user_grain = self.user_grain;
        Ok(params)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e.chain());
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!("Settings: {:?}", settings);

    let result = match &cli.command {
        Commands::List => {
            list_reports();
            Ok(())
        }
        Commands::Run(args) => run_reports(&settings, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.chain());
            ExitCode::FAILURE
        }
    }
}

fn list_reports() {
    for kind in ReportKind::ALL {
        let report = kind.report();
        println!("{}\t{}\t{}", kind, report.name(), report.description());
    }
}

fn run_reports(settings: &Settings, args: &RunArgs) -> Result<()> {
    let params = args.parameters()?;
    let boxed: Vec<Box<dyn Report>> = args.reports()?.iter().map(ReportKind::report).collect();
    let reports: Vec<&dyn Report> = boxed.iter().map(|report| &**report).collect();

    let connector = settings.connector()?;
    let runner = ReportRunner::new(&connector, settings);
    let tables = runner.run_all(&reports, &params, &RunContext::new())?;
    if args.json {
        let text = serde_json::to_string_pretty(&tables)
            .map_err(|e| ReportError::Source(format!("could not render JSON: {}", e)))?;
        println!("{}", text);
    } else {
        for table in &tables {
            print_table(table);
        }
    }
    Ok(())
}

fn print_table(table: &ReportTable) {
    println!("# {}", table.report);
    println!("{}", table.columns.join("\t"));
    for row in &table.rows {
        println!("{}", row.join("\t"));
    }
    println!();
}
