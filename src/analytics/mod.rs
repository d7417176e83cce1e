//! Fleet analytics: snapshot types, the background feed that keeps them
//! fresh, and the view model the analytics page renders.

mod feed;
mod view;

pub use feed::*;
pub use view::*;

use crate::db::{DbError, Store};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Analytics error types.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
}

/// Reporting window selectable on the analytics page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    #[default]
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Last7Days, TimeRange::Last30Days, TimeRange::Last90Days];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "7d" => Some(TimeRange::Last7Days),
            "30d" => Some(TimeRange::Last30Days),
            "90d" => Some(TimeRange::Last90Days),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7 Days",
            TimeRange::Last30Days => "30 Days",
            TimeRange::Last90Days => "90 Days",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Last7Days => 7,
            TimeRange::Last30Days => 30,
            TimeRange::Last90Days => 90,
        }
    }

    /// `strftime` pattern used to bucket missions into trend periods.
    pub fn period_format(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "%Y-%m-%d",
            TimeRange::Last30Days => "%Y-W%W",
            TimeRange::Last90Days => "%Y-%m",
        }
    }
}

/// Headline figures for the selected range. Absent values render as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyMetrics {
    pub total_missions: Option<u64>,
    pub flight_hours: Option<f64>,
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MissionPeriod {
    pub period: String,
    pub completed: u64,
    pub failed: u64,
    pub in_progress: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneUtilization {
    pub drone: String,
    /// Share of the range spent airborne, in percent.
    pub utilization: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteActivity {
    pub site: String,
    pub missions: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatteryPoint {
    /// Hour of day, `HH:00`.
    pub time: String,
    pub avg_battery: f64,
}

/// A read-only, pre-aggregated bundle of analytics figures and series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub key_metrics: Option<KeyMetrics>,
    pub mission_data: Vec<MissionPeriod>,
    pub drone_utilization_data: Vec<DroneUtilization>,
    pub site_activity_data: Vec<SiteActivity>,
    pub battery_trend_data: Vec<BatteryPoint>,
}

/// What the analytics page is given to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsState {
    pub analytics: Option<Snapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AnalyticsState {
    /// State before the first refresh has settled.
    pub fn pending() -> Self {
        Self {
            analytics: None,
            loading: true,
            error: None,
        }
    }
}

/// Anything that can aggregate a snapshot for a time range.
pub trait AnalyticsSource: Send + Sync + 'static {
    fn snapshot(&self, range: TimeRange) -> Result<Snapshot, AnalyticsError>;
}

impl AnalyticsSource for Store {
    fn snapshot(&self, range: TimeRange) -> Result<Snapshot, AnalyticsError> {
        Ok(self.analytics_snapshot(range, Utc::now())?)
    }
}
