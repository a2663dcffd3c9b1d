use std::fs;
use std::path::{Path, PathBuf};

use chartmold::action::Action;
use chartmold::component::Component;
use chartmold::config::Config;
use chartmold::core::{
    ChartId, ChartTid, Connection, ConnectionId, DataRequest, DataRequestId, ProjectId, Template,
};
use chartmold::dialog::{MongoQueryBuilder, TemplateForm};
use chartmold::providers::ApiClient;
use chartmold::services::{CompatibilityReport, DashboardBackend, Session};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Generate dashboards from templates against a dashboard backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which existing connections can stand in for each template connection
    Match(TemplateInput),
    /// Generate a dashboard from a template
    Generate {
        #[command(flatten)]
        input: TemplateInput,
        /// Project to generate into; a new project is created when omitted
        #[arg(long, value_name = "ID")]
        project_id: Option<ProjectId>,
        /// Template connection to leave out. Repeatable
        #[arg(long, value_name = "CONNECTION_ID")]
        deactivate: Vec<ConnectionId>,
        /// Template connection to create anew instead of reusing one. Repeatable
        #[arg(long, value_name = "CONNECTION_ID")]
        create_new: Vec<ConnectionId>,
        /// Chart to leave out. Repeatable
        #[arg(long, value_name = "TID")]
        exclude_chart: Vec<ChartTid>,
        /// Print the generation payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete a team template
    DeleteTemplate {
        /// Template JSON file
        #[arg(long, value_name = "FILE")]
        template: PathBuf,
    },
    /// Edit and run the MongoDB query of a chart's data request
    #[command(subcommand)]
    Query(QueryCommand),
}

#[derive(ClapArgs, Debug)]
struct TemplateInput {
    /// Template JSON file
    #[arg(long, value_name = "FILE")]
    template: PathBuf,
    /// JSON array of the connections that already exist
    #[arg(long, value_name = "FILE")]
    connections: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct DataRequestTarget {
    #[arg(long, value_name = "ID")]
    project_id: ProjectId,
    #[arg(long, value_name = "ID")]
    chart_id: ChartId,
    #[arg(long, value_name = "ID")]
    data_request_id: DataRequestId,
    /// Query text; the builder default is used when omitted
    #[arg(long)]
    query: Option<String>,
}

#[derive(Subcommand, Debug)]
enum QueryCommand {
    /// Save the data request and run it
    Run {
        #[command(flatten)]
        target: DataRequestTarget,
        /// Ask the backend to skip its cached response
        #[arg(long)]
        no_cache: bool,
    },
    /// Save the data request, or store the query for reuse when a summary is given
    Save {
        #[command(flatten)]
        target: DataRequestTarget,
        #[arg(long)]
        summary: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config = Config::from_path(args.config.as_ref()).wrap_err("Failed to load configuration")?;
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn)  => Some(tracing::Level::WARN),
        Some(LogLevel::Info)  => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => Some(tracing::Level::WARN),
    };
    chartmold::logging::init_with(Some(config.log_path()), level)?;

    debug!("Using backend at {}", config.api.api_host);
    let client = ApiClient::from_config(&config)?;

    match args.command {
        Command::Match(input) => {
            let (template, connections) = input.load()?;
            print_compatibility(&CompatibilityReport::build(&template, &connections));
            Ok(())
        }
        Command::Generate {
            input,
            project_id,
            deactivate,
            create_new,
            exclude_chart,
            dry_run,
        } => {
            let (template, connections) = input.load()?;
            let form = TemplateForm::new(template, &connections, project_id);
            let mut session =
                Session::new(form, client).with_completion_delay(config.completion_delay());

            let toggles = deactivate
                .into_iter()
                .map(Action::ToggleConnectionActive)
                .chain(create_new.into_iter().map(Action::ToggleCreateNew))
                .chain(exclude_chart.into_iter().map(Action::ToggleChartSelected));
            for action in toggles {
                let surfaced = session.dispatch(action).await?;
                report(surfaced)?;
            }

            let form = session.component();
            for warning in form.selection.dependency_warnings() {
                println!(
                    "chart {} ({}) needs inactive connection {}",
                    warning.tid, warning.chart_name, warning.connection_name
                );
            }

            if dry_run {
                println!("{}", serde_json::to_string_pretty(&form.generation_request())?);
                return Ok(());
            }
            if !form.can_generate() {
                return Err(eyre!("No charts selected, nothing to generate"));
            }
            let surfaced = session.dispatch(Action::GenerateFromTemplate).await?;
            report(surfaced)
        }
        Command::DeleteTemplate { template } => {
            let template: Template = read_json(&template)?;
            let form = TemplateForm::new(template, &[], None).with_admin(true);
            let mut session = Session::new(form, client);
            let surfaced = session.dispatch(Action::DeleteTemplate).await?;
            report(surfaced)
        }
        Command::Query(command) => run_query(command, client).await,
    }
}

impl TemplateInput {
    fn load(&self) -> Result<(Template, Vec<Connection>)> {
        let template = read_json(&self.template)?;
        let connections = match &self.connections {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };
        Ok((template, connections))
    }
}

impl DataRequestTarget {
    fn builder(self) -> Result<MongoQueryBuilder> {
        let mut builder = MongoQueryBuilder::new(
            self.project_id,
            self.chart_id,
            DataRequest::new(self.data_request_id),
        );
        if let Some(query) = self.query {
            builder.update(Action::ChangeQuery(query))?;
        }
        Ok(builder)
    }
}

async fn run_query<B: DashboardBackend>(command: QueryCommand, backend: B) -> Result<()> {
    match command {
        QueryCommand::Run { target, no_cache } => {
            let mut builder = target.builder()?;
            if no_cache {
                builder.update(Action::ToggleUseCache)?;
            }
            let mut session = Session::new(builder, backend);
            let surfaced = session.dispatch(Action::RunQuery).await?;
            println!("{}", session.component().result);
            report(surfaced)
        }
        QueryCommand::Save { target, summary } => {
            let mut session = Session::new(target.builder()?, backend);
            let action = match summary {
                Some(summary) => Action::SaveQuery { summary },
                None => Action::SaveRequest,
            };
            let surfaced = session.dispatch(action).await?;
            report(surfaced)
        }
    }
}

fn print_compatibility(report: &CompatibilityReport) {
    for entry in &report.entries {
        println!("{} [{}] ({})", entry.name, entry.template_connection, entry.kind);
        if entry.must_create_new() {
            println!("  no compatible connection, a new one will be created");
            continue;
        }
        for connection in &entry.compatible {
            let marker = if connection.id == entry.template_connection {
                " (same connection)"
            } else {
                ""
            };
            println!("  {} [{}]{marker}", connection.name, connection.id);
        }
    }
}

/// Print what the session surfaced; an error notification fails the command.
fn report(surfaced: Vec<Action>) -> Result<()> {
    for action in surfaced {
        match action {
            Action::Error(message) => return Err(eyre!(message)),
            Action::Notify(message) => println!("{message}"),
            Action::ChartsDeselected(tids) => {
                let tids: Vec<String> = tids.iter().map(ToString::to_string).collect();
                println!("deselected charts {}", tids.join(", "));
            }
            Action::ChartBlocked { tid, dependency } => {
                println!("chart {tid} stays deselected: connection {dependency} is inactive");
            }
            Action::GenerationComplete => println!("Dashboard generated"),
            Action::DialogClose => println!("Template deleted"),
            other => info!("Unhandled outcome {other}"),
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}
