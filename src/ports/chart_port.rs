//! Chart output port trait.

use crate::domain::chart::Chart;
use crate::domain::error::DashboardError;

/// Port for persisting a rendered chart.
pub trait ChartPort {
    fn write(&self, chart: &Chart, output_path: &str) -> Result<(), DashboardError>;
}
