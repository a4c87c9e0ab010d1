//! Interactive dashboard session.
//!
//! Holds one [`DashboardConfig`] and re-runs the pipeline after every command
//! that changes it. The fetched table comes from the session cache, so only
//! `reload` goes back to the network.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::adapters::csv_adapter::write_table;
use crate::cli::{parse_names, with_default_category};
use crate::domain::dashboard::{
    build_view, category_options, entity_options, DashboardConfig, DataSource, Session,
};
use crate::domain::error::DashboardError;
use crate::domain::table::Table;
use crate::ports::chart_port::ChartPort;

fn print_help<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        r#"commands:
  show               current source, category and selection
  categories         industry codes present in the data
  entities           companies available under the current category
  category <code>    filter by industry code
  select <names>     choose companies (comma-separated)
  select --clear     clear the selection
  add <name>         add one company to the selection
  render [path]      write the chart as SVG
  table              print the selected rows as CSV
  reload             refetch the data, bypassing the cache
  help
  exit | quit"#
    )
}

fn describe_source(source: &DataSource) -> String {
    match source {
        DataSource::File { path } => format!("file {}", path.display()),
        DataSource::Api { request } => format!(
            "api {} ({}={}, page size {})",
            request.endpoint, request.filter_key, request.filter_value, request.page_size
        ),
    }
}

fn report<W: Write>(out: &mut W, err: &DashboardError) -> std::io::Result<()> {
    if err.is_warning() {
        writeln!(out, "warning: {err}")
    } else {
        writeln!(out, "error: {err}")
    }
}

fn load<W: Write>(
    session: &mut Session<'_>,
    config: &DashboardConfig,
    out: &mut W,
) -> Result<Table, DashboardError> {
    match session.load(&config.source) {
        Ok(loaded) => {
            if let Some(warning) = &loaded.warning {
                report(out, warning)?;
            }
            writeln!(out, "loaded {} records", loaded.table.len())?;
            Ok(loaded.table)
        }
        Err(e) if e.is_warning() => {
            report(out, &e)?;
            Ok(Table::default())
        }
        Err(e) => Err(e),
    }
}

fn refresh<W: Write>(config: &DashboardConfig, table: &Table, out: &mut W) -> std::io::Result<()> {
    match build_view(config, table) {
        Ok(view) => {
            for name in &view.unknown_entities {
                writeln!(out, "warning: {name} not found in the data")?;
            }
            writeln!(
                out,
                "{} companies charted (height {:.1})",
                view.chart.bars.len(),
                view.chart.height
            )
        }
        Err(e) => report(out, &e),
    }
}

pub fn run_shell<R: BufRead, W: Write>(
    session: &mut Session<'_>,
    chart_port: &dyn ChartPort,
    config: DashboardConfig,
    output: PathBuf,
    input: R,
    mut out: W,
) -> Result<(), DashboardError> {
    let mut table = load(session, &config, &mut out)?;
    let mut config = with_default_category(config, &table);
    refresh(&config, &table, &mut out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command {
            "" => continue,
            "exit" | "quit" => break,
            "help" => print_help(&mut out)?,
            "show" => {
                writeln!(out, "source:   {}", describe_source(&config.source))?;
                writeln!(
                    out,
                    "category: {}",
                    config.category.as_deref().unwrap_or("(none)")
                )?;
                writeln!(out, "selected: {}", config.entities.join(", "))?;
                writeln!(out, "output:   {}", output.display())?;
            }
            "categories" => {
                for category in category_options(&config.columns, &table) {
                    writeln!(out, "{category}")?;
                }
            }
            "entities" => match entity_options(&config, &table) {
                Ok(names) => {
                    for name in names {
                        writeln!(out, "{name}")?;
                    }
                }
                Err(e) => report(&mut out, &e)?,
            },
            "category" if config.columns.category.is_none() => {
                writeln!(out, "warning: this source has no category column")?;
            }
            "category" if rest.is_empty() => writeln!(out, "usage: category <code>")?,
            "category" => {
                config.category = Some(rest.to_string());
                refresh(&config, &table, &mut out)?;
            }
            "select" if rest == "--clear" => {
                config.entities.clear();
                refresh(&config, &table, &mut out)?;
            }
            "select" => {
                config.entities = parse_names(rest);
                refresh(&config, &table, &mut out)?;
            }
            "add" if rest.is_empty() => writeln!(out, "usage: add <name>")?,
            "add" => {
                config.entities.push(rest.to_string());
                refresh(&config, &table, &mut out)?;
            }
            "render" => {
                let path = if rest.is_empty() {
                    output.clone()
                } else {
                    PathBuf::from(rest)
                };
                match build_view(&config, &table) {
                    Ok(view) => {
                        chart_port.write(&view.chart, &path.to_string_lossy())?;
                        writeln!(out, "Chart written to: {}", path.display())?;
                    }
                    Err(e) => report(&mut out, &e)?,
                }
            }
            "table" => match build_view(&config, &table) {
                Ok(view) => write_table(&view.selected, &mut out)?,
                Err(e) => report(&mut out, &e)?,
            },
            "reload" => {
                session.invalidate(&config.source);
                table = load(session, &config, &mut out)?;
                refresh(&config, &table, &mut out)?;
            }
            other => writeln!(out, "unknown command: {other} (try help)")?,
        }
    }
    Ok(())
}
