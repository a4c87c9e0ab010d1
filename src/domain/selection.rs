//! Category and entity selection over a [`Table`].

use crate::domain::error::DashboardError;
use crate::domain::table::Table;
use std::collections::HashSet;

/// Result of narrowing a table to the user's chosen entities.
#[derive(Debug, Clone, PartialEq)]
pub enum EntitySelection {
    /// The user has not picked anything yet; there is nothing to render.
    NothingSelected,
    Rows(Table),
}

impl EntitySelection {
    pub fn into_table(self) -> Result<Table, DashboardError> {
        match self {
            EntitySelection::NothingSelected => Err(DashboardError::SelectionEmpty),
            EntitySelection::Rows(table) => Ok(table),
        }
    }
}

/// Rows whose `category_key` cell equals `category_value`.
///
/// The valid choices are the distinct values of `category_key` in `table`; any
/// other value is rejected with [`DashboardError::FilterEmpty`].
pub fn filter_by_category(
    table: &Table,
    category_key: &str,
    category_value: &str,
) -> Result<Table, DashboardError> {
    table.require_column(category_key)?;
    let filtered = table.filter_rows(|row| {
        row.get(category_key).as_key().as_deref() == Some(category_value)
    });
    if filtered.is_empty() {
        return Err(DashboardError::FilterEmpty {
            value: category_value.to_string(),
        });
    }
    Ok(filtered)
}

pub fn filter_by_entities<S: AsRef<str>>(
    table: &Table,
    entity_column: &str,
    selected_names: &[S],
) -> Result<EntitySelection, DashboardError> {
    if selected_names.is_empty() {
        return Ok(EntitySelection::NothingSelected);
    }
    table.require_column(entity_column)?;
    let wanted: HashSet<&str> = selected_names.iter().map(AsRef::as_ref).collect();
    let filtered = table.filter_rows(|row| {
        row.get(entity_column)
            .as_key()
            .is_some_and(|name| wanted.contains(name.as_str()))
    });
    Ok(EntitySelection::Rows(filtered))
}

/// Names in `selected` that do not appear in `entity_column`.
pub fn unknown_entities<'a, S: AsRef<str>>(
    table: &Table,
    entity_column: &str,
    selected: &'a [S],
) -> Vec<&'a str> {
    let available: HashSet<String> = table.distinct_values(entity_column).into_iter().collect();
    selected
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !available.contains(*name))
        .collect()
}
