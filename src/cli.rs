//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::write_table;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_adapter::{
    HttpAdapter, NoNetwork, DEFAULT_ENDPOINT, DEFAULT_FILTER_KEY, DEFAULT_FILTER_VALUE,
};
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::adapters::workbook_adapter::SpreadsheetAdapter;
use crate::domain::cache::{CachePolicy, DEFAULT_MAX_ENTRIES};
use crate::domain::chart::{ChartLabels, DEFAULT_X_LABEL};
use crate::domain::config_validation::validate_config;
use crate::domain::dashboard::{
    build_view, category_options, entity_options, ColumnMap, DashboardConfig, DashboardView,
    DataSource, Session,
};
use crate::domain::error::DashboardError;
use crate::domain::fetch::{FetchRequest, RecordFetcher, DEFAULT_PAGE_SIZE};
use crate::domain::table::Table;
use crate::ports::chart_port::ChartPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::page_port::PagePort;
use crate::shell;

pub const API_X_LABEL: &str = "Monto (en millones)";
pub const DEFAULT_OUTPUT: &str = "chart.svg";

#[derive(Parser, Debug)]
#[command(
    name = "balance-dashboard",
    about = "Compare total assets and liabilities across companies"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chart companies from a spreadsheet (.xlsx, .xls, .ods or .csv)
    File {
        #[arg(short, long)]
        input: PathBuf,
        /// Company name; repeat for several
        #[arg(short, long, action = ArgAction::Append)]
        select: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        show_table: bool,
    },
    /// Chart companies from the financial disclosure API
    Api {
        /// Industry (CIIU) code; defaults to the first one in the data
        #[arg(long)]
        category: Option<String>,
        /// Company name; repeat for several
        #[arg(short, long, action = ArgAction::Append)]
        select: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        show_table: bool,
    },
    /// List industry codes present in the API data
    Categories,
    /// List company names available for selection
    Entities {
        /// Read a spreadsheet instead of the API
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Interactive session
    Shell {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

impl Command {
    /// Whether the command reads from the API rather than a local spreadsheet.
    pub fn needs_network(&self) -> bool {
        match self {
            Command::File { .. } => false,
            Command::Api { .. } | Command::Categories => true,
            Command::Entities { input, .. } | Command::Shell { input } => input.is_none(),
        }
    }
}

/// `--select` values win over `[selection] entities`.
fn chosen_entities(select: Vec<String>, settings: &Settings) -> Vec<String> {
    let names: Vec<String> = select
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        settings.entities.clone()
    } else {
        names
    }
}

/// Everything read from the configuration file, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub request: FetchRequest,
    pub timeout: Duration,
    pub pause: Duration,
    pub cache: CachePolicy,
    pub api_columns: ColumnMap,
    pub file_columns: ColumnMap,
    pub entities: Vec<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub output: PathBuf,
    pub show_table: bool,
}

impl Settings {
    pub fn labels(&self, api_mode: bool) -> ChartLabels {
        let mut labels = ChartLabels::default();
        if let Some(title) = &self.title {
            labels.title = title.clone();
        }
        labels.x_label = match (&self.x_label, api_mode) {
            (Some(x), _) => x.clone(),
            (None, true) => API_X_LABEL.to_string(),
            (None, false) => DEFAULT_X_LABEL.to_string(),
        };
        labels
    }

    pub fn file_config(&self, path: PathBuf, entities: Vec<String>) -> DashboardConfig {
        DashboardConfig {
            source: DataSource::File { path },
            columns: self.file_columns.clone(),
            category: None,
            entities,
            labels: self.labels(false),
        }
    }

    pub fn api_config(&self, category: Option<String>, entities: Vec<String>) -> DashboardConfig {
        DashboardConfig {
            source: DataSource::Api {
                request: self.request.clone(),
            },
            columns: self.api_columns.clone(),
            category,
            entities,
            labels: self.labels(true),
        }
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = DashboardError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn string_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> String {
    config
        .get_string(section, key)
        .unwrap_or_else(|| default.to_string())
}

fn non_negative(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> u64 {
    config.get_int(section, key, default).max(0) as u64
}

pub fn build_settings(config: &dyn ConfigPort) -> Result<Settings, DashboardError> {
    validate_config(config)?;

    let api = ColumnMap::api_defaults();
    let file = ColumnMap::file_defaults();

    let ttl_secs = non_negative(config, "cache", "ttl_secs", 0);

    Ok(Settings {
        request: FetchRequest {
            endpoint: string_or(config, "api", "endpoint", DEFAULT_ENDPOINT),
            page_size: config
                .get_int("api", "page_size", DEFAULT_PAGE_SIZE as i64)
                .max(0) as usize,
            filter_key: string_or(config, "api", "filter_key", DEFAULT_FILTER_KEY),
            filter_value: string_or(config, "api", "filter_value", DEFAULT_FILTER_VALUE),
        },
        timeout: Duration::from_secs(non_negative(config, "api", "timeout_secs", 30)),
        pause: Duration::from_millis(non_negative(config, "api", "pause_ms", 1000)),
        cache: CachePolicy {
            ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            max_entries: non_negative(config, "cache", "max_entries", DEFAULT_MAX_ENTRIES as i64)
                as usize,
        },
        api_columns: ColumnMap {
            entity: string_or(config, "columns", "entity", &api.entity),
            category: Some(string_or(
                config,
                "columns",
                "category",
                api.category.as_deref().unwrap_or("ciiu"),
            )),
            assets: string_or(config, "columns", "assets", &api.assets),
            liabilities: string_or(config, "columns", "liabilities", &api.liabilities),
        },
        file_columns: ColumnMap {
            entity: string_or(config, "file", "entity", &file.entity),
            category: None,
            assets: string_or(config, "file", "assets", &file.assets),
            liabilities: string_or(config, "file", "liabilities", &file.liabilities),
        },
        entities: config.get_list("selection", "entities"),
        category: config.get_string("selection", "category"),
        title: config.get_string("chart", "title"),
        x_label: config.get_string("chart", "x_label"),
        output: PathBuf::from(string_or(config, "chart", "output", DEFAULT_OUTPUT)),
        show_table: config.get_bool("chart", "show_table", false),
    })
}

/// Split a comma-separated list of names, dropping blanks.
pub fn parse_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Fill in the category when the source has one and none was chosen: the
/// first code present in the data.
pub fn with_default_category(mut config: DashboardConfig, table: &Table) -> DashboardConfig {
    if config.category.is_none() {
        config.category = category_options(&config.columns, table).into_iter().next();
    }
    config
}

/// Load the configured source, run the pipeline and write the chart.
pub fn render_dashboard(
    session: &mut Session<'_>,
    config: DashboardConfig,
    chart_port: &dyn ChartPort,
    output: &Path,
) -> Result<(DashboardConfig, DashboardView), DashboardError> {
    let loaded = session.load(&config.source)?;
    if let Some(warning) = &loaded.warning {
        eprintln!("warning: {warning}");
    }
    let config = with_default_category(config, &loaded.table);
    let view = build_view(&config, &loaded.table)?;
    chart_port.write(&view.chart, &output.to_string_lossy())?;
    Ok((config, view))
}

pub fn report_view(view: &DashboardView, output: &Path) {
    for name in &view.unknown_entities {
        eprintln!("warning: {name} not found in the data");
    }
    if view.unparsed_amounts > 0 {
        tracing::debug!(cells = view.unparsed_amounts, "amounts coerced to missing");
    }
    if let Some(category) = &view.category {
        eprintln!(
            "Category {}: {} companies, {} selected",
            category,
            view.candidates.len(),
            view.selected.len()
        );
    }
    eprintln!("Chart written to: {}", output.display());
}

fn fail(err: &DashboardError) -> ExitCode {
    if err.is_warning() {
        eprintln!("warning: {err}");
    } else {
        eprintln!("error: {err}");
    }
    err.into()
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match build_settings(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let http = if cli.command.needs_network() {
        match HttpAdapter::new(settings.timeout) {
            Ok(h) => Some(h),
            Err(e) => return fail(&e),
        }
    } else {
        None
    };
    let pages: &dyn PagePort = match &http {
        Some(h) => h,
        None => &NoNetwork,
    };
    let files = SpreadsheetAdapter::new();
    let mut session = Session::new(
        pages,
        &files,
        RecordFetcher::new(settings.pause),
        settings.cache,
    );
    let mut stdout = io::stdout();

    match cli.command {
        Command::File {
            input,
            select,
            output,
            show_table,
        } => {
            let dashboard = settings.file_config(input, chosen_entities(select, &settings));
            run_chart(&mut session, &settings, dashboard, output, show_table, &mut stdout)
        }
        Command::Api {
            category,
            select,
            output,
            show_table,
        } => {
            let category = category.or_else(|| settings.category.clone());
            let dashboard = settings.api_config(category, chosen_entities(select, &settings));
            run_chart(&mut session, &settings, dashboard, output, show_table, &mut stdout)
        }
        Command::Categories => run_categories(&mut session, &settings, &mut stdout),
        Command::Entities { input, category } => {
            run_entities(&mut session, &settings, input, category, &mut stdout)
        }
        Command::Shell { input } => {
            let dashboard = match input {
                Some(path) => settings.file_config(path, settings.entities.clone()),
                None => settings.api_config(settings.category.clone(), settings.entities.clone()),
            };
            let stdin = io::stdin();
            match shell::run_shell(
                &mut session,
                &SvgChartAdapter::new(),
                dashboard,
                settings.output.clone(),
                stdin.lock(),
                stdout,
            ) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(&e),
            }
        }
    }
}

/// Render one chart; with `show_table` the selected rows go to `out` as CSV.
pub fn run_chart<W: Write>(
    session: &mut Session<'_>,
    settings: &Settings,
    dashboard: DashboardConfig,
    output: Option<PathBuf>,
    show_table: bool,
    out: &mut W,
) -> ExitCode {
    let output = output.unwrap_or_else(|| settings.output.clone());
    match render_dashboard(session, dashboard, &SvgChartAdapter::new(), &output) {
        Ok((_, view)) => {
            if show_table || settings.show_table {
                if let Err(e) = write_table(&view.selected, &mut *out) {
                    return fail(&e);
                }
            }
            report_view(&view, &output);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Print the industry codes in the API data, one per line.
pub fn run_categories<W: Write>(
    session: &mut Session<'_>,
    settings: &Settings,
    out: &mut W,
) -> ExitCode {
    let dashboard = settings.api_config(None, Vec::new());
    let loaded = match session.load(&dashboard.source) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    if let Some(warning) = &loaded.warning {
        eprintln!("warning: {warning}");
    }
    if loaded.table.is_empty() {
        return fail(&DashboardError::InputMissing {
            reason: "no records retrieved".into(),
        });
    }
    let categories = category_options(&dashboard.columns, &loaded.table);
    if let Err(e) = print_lines(out, &categories) {
        return fail(&e);
    }
    eprintln!("{} categories found", categories.len());
    ExitCode::SUCCESS
}

/// Print the company names selectable under the chosen source and category.
pub fn run_entities<W: Write>(
    session: &mut Session<'_>,
    settings: &Settings,
    input: Option<PathBuf>,
    category: Option<String>,
    out: &mut W,
) -> ExitCode {
    let dashboard = match input {
        Some(path) => settings.file_config(path, Vec::new()),
        None => settings.api_config(category.or_else(|| settings.category.clone()), Vec::new()),
    };
    let loaded = match session.load(&dashboard.source) {
        Ok(l) => l,
        Err(e) => return fail(&e),
    };
    if let Some(warning) = &loaded.warning {
        eprintln!("warning: {warning}");
    }
    let dashboard = with_default_category(dashboard, &loaded.table);
    match entity_options(&dashboard, &loaded.table) {
        Ok(names) => {
            if let Err(e) = print_lines(out, &names) {
                return fail(&e);
            }
            eprintln!("{} companies found", names.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_lines<W: Write>(out: &mut W, lines: &[String]) -> Result<(), DashboardError> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
