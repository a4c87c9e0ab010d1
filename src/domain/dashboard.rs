//! Dashboard configuration and the fetch -> normalize -> select -> render pipeline.
//!
//! A [`DashboardConfig`] captures every choice a user makes (data source,
//! category, entities). [`build_view`] is a pure function of that configuration
//! and the loaded table; callers re-run it whenever the configuration changes.
//! [`Session`] owns the fetch cache so reloading the same source is free.

use crate::domain::cache::{CachePolicy, FetchCache};
use crate::domain::chart::{render_with_labels, Chart, ChartLabels};
use crate::domain::error::DashboardError;
use crate::domain::fetch::{FetchRequest, RecordFetcher};
use crate::domain::normalize::normalize_with_report;
use crate::domain::selection::{filter_by_category, filter_by_entities, unknown_entities};
use crate::domain::table::Table;
use crate::ports::page_port::PagePort;
use crate::ports::table_port::TablePort;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File { path: PathBuf },
    Api { request: FetchRequest },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub entity: String,
    /// Only API data carries an industry code.
    pub category: Option<String>,
    pub assets: String,
    pub liabilities: String,
}

impl ColumnMap {
    pub fn api_defaults() -> Self {
        Self {
            entity: "raz_n_social".into(),
            category: Some("ciiu".into()),
            assets: "total_activos".into(),
            liabilities: "total_pasivos".into(),
        }
    }

    pub fn file_defaults() -> Self {
        Self {
            entity: "Compañía".into(),
            category: None,
            assets: "Activos Totales".into(),
            liabilities: "Pasivos Totales".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub source: DataSource,
    pub columns: ColumnMap,
    pub category: Option<String>,
    pub entities: Vec<String>,
    pub labels: ChartLabels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub category: Option<String>,
    /// Rows left after the category filter, amounts normalized.
    pub candidates: Table,
    /// Selected rows, projected to entity/assets/liabilities.
    pub selected: Table,
    /// Selected names that matched no row.
    pub unknown_entities: Vec<String>,
    /// Amount cells that could not be parsed and became missing.
    pub unparsed_amounts: usize,
    pub chart: Chart,
}

/// Category options offered by the data, in first-seen order.
pub fn category_options(columns: &ColumnMap, table: &Table) -> Vec<String> {
    columns
        .category
        .as_deref()
        .map(|c| table.distinct_values(c))
        .unwrap_or_default()
}

/// Apply the configured category filter, if any.
pub fn candidates(config: &DashboardConfig, table: &Table) -> Result<Table, DashboardError> {
    if table.is_empty() {
        return Err(DashboardError::InputMissing {
            reason: "no records loaded".into(),
        });
    }
    match (&config.columns.category, &config.category) {
        (Some(key), Some(value)) => filter_by_category(table, key, value),
        _ => Ok(table.clone()),
    }
}

/// Entity names a user can pick from under the current configuration.
pub fn entity_options(config: &DashboardConfig, table: &Table) -> Result<Vec<String>, DashboardError> {
    let rows = candidates(config, table)?;
    rows.require_column(&config.columns.entity)?;
    Ok(rows.distinct_values(&config.columns.entity))
}

pub fn build_view(config: &DashboardConfig, table: &Table) -> Result<DashboardView, DashboardError> {
    let columns = &config.columns;
    let rows = candidates(config, table)?;
    for column in [&columns.entity, &columns.assets, &columns.liabilities] {
        rows.require_column(column)?;
    }

    let (rows, report) =
        normalize_with_report(&rows, &[columns.assets.as_str(), columns.liabilities.as_str()]);

    let selected =
        filter_by_entities(&rows, &columns.entity, config.entities.as_slice())?.into_table()?;
    let selected = selected.project(&[
        columns.entity.as_str(),
        columns.assets.as_str(),
        columns.liabilities.as_str(),
    ])?;

    let chart = render_with_labels(
        &selected,
        &columns.entity,
        &columns.assets,
        &columns.liabilities,
        config.labels.clone(),
    )?;

    let unknown = unknown_entities(&rows, &columns.entity, config.entities.as_slice())
        .into_iter()
        .map(String::from)
        .collect();

    Ok(DashboardView {
        category: config.category.clone(),
        candidates: rows,
        selected,
        unknown_entities: unknown,
        unparsed_amounts: report.total(),
        chart,
    })
}

/// A loaded table plus the non-fatal problem hit while loading it.
#[derive(Debug)]
pub struct Loaded {
    pub table: Table,
    pub warning: Option<DashboardError>,
}

/// Owns the fetch cache for the life of one interactive run.
pub struct Session<'a> {
    pages: &'a dyn PagePort,
    files: &'a dyn TablePort,
    fetcher: RecordFetcher,
    cache: FetchCache,
}

impl<'a> Session<'a> {
    pub fn new(
        pages: &'a dyn PagePort,
        files: &'a dyn TablePort,
        fetcher: RecordFetcher,
        policy: CachePolicy,
    ) -> Self {
        Self {
            pages,
            files,
            fetcher,
            cache: FetchCache::new(policy),
        }
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    pub fn invalidate(&mut self, source: &DataSource) {
        if let DataSource::Api { request } = source {
            self.cache.invalidate(request);
        }
    }

    pub fn load(&mut self, source: &DataSource) -> Result<Loaded, DashboardError> {
        match source {
            DataSource::File { path } => Ok(Loaded {
                table: self.files.load_table(path)?,
                warning: None,
            }),
            DataSource::Api { request } => {
                let outcome = self.cache.fetch_all(&self.fetcher, self.pages, request)?;
                Ok(Loaded {
                    table: outcome.table.clone(),
                    warning: outcome.warning(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::{Record, Value};
    use crate::ports::page_port::{PageError, PageRequest};
    use approx::assert_relative_eq;
    use std::path::Path;
    use std::time::Duration;

    struct FailingPages;

    impl PagePort for FailingPages {
        fn fetch_page(&self, _: &PageRequest) -> Result<Vec<Record>, PageError> {
            Err(PageError::Status(502))
        }
    }

    struct NoFiles;

    impl TablePort for NoFiles {
        fn load_table(&self, path: &Path) -> Result<Table, DashboardError> {
            Err(DashboardError::InputMissing {
                reason: format!("{} does not exist", path.display()),
            })
        }
    }

    fn api_table() -> Table {
        let mut table = Table::new(vec![
            "ciiu".into(),
            "raz_n_social".into(),
            "total_activos".into(),
            "total_pasivos".into(),
        ]);
        for (ciiu, name, assets, liabilities) in [
            ("4111", "Marval S.A.S.", "$1,000", "$400"),
            ("4111", "Amarilo S A S", "$2,500", "n/d"),
            ("4290", "Conconcreto", "$900", "$300"),
        ] {
            table.push(
                Record::new()
                    .with("ciiu", ciiu)
                    .with("raz_n_social", name)
                    .with("total_activos", assets)
                    .with("total_pasivos", liabilities),
            );
        }
        table
    }

    fn api_config(category: Option<&str>, entities: &[&str]) -> DashboardConfig {
        DashboardConfig {
            source: DataSource::Api {
                request: FetchRequest {
                    endpoint: "http://localhost/resource.json".into(),
                    page_size: 1000,
                    filter_key: "a_o_de_corte".into(),
                    filter_value: "2023".into(),
                },
            },
            columns: ColumnMap::api_defaults(),
            category: category.map(String::from),
            entities: entities.iter().map(|s| s.to_string()).collect(),
            labels: ChartLabels::default(),
        }
    }

    #[test]
    fn full_pipeline_builds_stacked_bars() {
        let config = api_config(Some("4111"), &["Marval S.A.S.", "Amarilo S A S"]);
        let view = build_view(&config, &api_table()).unwrap();

        assert_eq!(view.candidates.len(), 2);
        assert_eq!(view.selected.columns(), &["raz_n_social", "total_activos", "total_pasivos"]);
        assert_eq!(view.chart.bars.len(), 2);
        assert_relative_eq!(view.chart.bars[0].liabilities.end(), 1400.0);
        assert_relative_eq!(view.chart.bars[1].liabilities.length, 0.0);
        assert_eq!(view.unparsed_amounts, 1);
        assert_relative_eq!(view.chart.height, 4.0);
    }

    #[test]
    fn selected_rows_hold_numbers_not_currency_text() {
        let config = api_config(None, &["Conconcreto"]);
        let view = build_view(&config, &api_table()).unwrap();
        assert_eq!(view.selected.rows()[0].get("total_activos"), &Value::Number(900.0));
    }

    #[test]
    fn empty_table_is_input_missing() {
        let config = api_config(None, &["Marval S.A.S."]);
        assert!(matches!(
            build_view(&config, &Table::default()),
            Err(DashboardError::InputMissing { .. })
        ));
    }

    #[test]
    fn no_entities_is_selection_empty() {
        let config = api_config(Some("4111"), &[]);
        assert!(matches!(
            build_view(&config, &api_table()),
            Err(DashboardError::SelectionEmpty)
        ));
    }

    #[test]
    fn unobserved_category_is_filter_empty() {
        let config = api_config(Some("0000"), &["Marval S.A.S."]);
        assert!(matches!(
            build_view(&config, &api_table()),
            Err(DashboardError::FilterEmpty { value }) if value == "0000"
        ));
    }

    #[test]
    fn entity_options_follow_the_category() {
        let table = api_table();
        let options = entity_options(&api_config(Some("4290"), &[]), &table).unwrap();
        assert_eq!(options, vec!["Conconcreto"]);
        assert_eq!(
            category_options(&ColumnMap::api_defaults(), &table),
            vec!["4111", "4290"]
        );
        assert!(category_options(&ColumnMap::file_defaults(), &table).is_empty());
    }

    #[test]
    fn names_outside_the_category_are_reported() {
        let config = api_config(Some("4111"), &["Marval S.A.S.", "Conconcreto"]);
        let view = build_view(&config, &api_table()).unwrap();
        assert_eq!(view.chart.bars.len(), 1);
        assert_eq!(view.unknown_entities, vec!["Conconcreto"]);
    }

    #[test]
    fn load_carries_fetch_failure_as_warning() {
        let mut session = Session::new(
            &FailingPages,
            &NoFiles,
            RecordFetcher::new(Duration::ZERO),
            CachePolicy::default(),
        );
        let config = api_config(None, &[]);

        let loaded = session.load(&config.source).unwrap();

        assert!(loaded.table.is_empty());
        assert!(matches!(
            loaded.warning,
            Some(DashboardError::FetchFailure { reason }) if reason.contains("502")
        ));
    }

    #[test]
    fn missing_file_is_an_error_not_a_warning() {
        let mut session = Session::new(
            &FailingPages,
            &NoFiles,
            RecordFetcher::new(Duration::ZERO),
            CachePolicy::default(),
        );
        let source = DataSource::File {
            path: PathBuf::from("balances.xlsx"),
        };
        assert!(matches!(
            session.load(&source),
            Err(DashboardError::InputMissing { .. })
        ));
    }
}
