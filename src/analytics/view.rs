//! View model for the analytics page.
//!
//! [`render`] decides what the page shows for a given [`AnalyticsState`]:
//! loading takes precedence over error, and error over data. Nothing here
//! aggregates; every figure comes straight from the snapshot.

use super::{AnalyticsState, Snapshot, TimeRange};

use serde::Serialize;

/// Segment colors for the utilization pie, cycled per drone.
pub const PIE_COLORS: [&str; 4] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444"];

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsView {
    Loading,
    Error { title: String, message: String },
    Ready(Dashboard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub range: TimeRange,
    pub metrics: Vec<MetricCard>,
    pub panels: Vec<ChartPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: &'static str,
    pub color: &'static str,
    pub values: Vec<f64>,
}

/// One tab of the chart area, shaped for the browser-side chart script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPanel {
    pub key: &'static str,
    pub tab: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    /// Per-segment colors (pie charts only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segment_colors: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
}

impl ChartPanel {
    /// Number of bars, slices or points along the category axis.
    pub fn segments(&self) -> usize {
        self.labels.len()
    }
}

/// Decide what the analytics page shows.
pub fn render(state: &AnalyticsState, range: TimeRange) -> AnalyticsView {
    if state.loading {
        return AnalyticsView::Loading;
    }

    if state.error.is_some() {
        return AnalyticsView::Error {
            title: "Error Loading Analytics".to_string(),
            message: "Failed to load analytics data".to_string(),
        };
    }

    let empty = Snapshot::default();
    let snapshot = state.analytics.as_ref().unwrap_or(&empty);

    AnalyticsView::Ready(Dashboard {
        range,
        metrics: metric_cards(snapshot),
        panels: chart_panels(snapshot),
    })
}

fn metric_cards(snapshot: &Snapshot) -> Vec<MetricCard> {
    let metrics = snapshot.key_metrics.clone().unwrap_or_default();
    let total = metrics.total_missions.unwrap_or(0);
    let drones = snapshot.drone_utilization_data.len();
    let completed = (total as f64 * metrics.success_rate.unwrap_or(0.0) / 100.0).round() as u64;

    vec![
        MetricCard {
            title: "Total Missions",
            value: total.to_string(),
            caption: "Missions started in range".to_string(),
        },
        MetricCard {
            title: "Active Drones",
            value: drones.to_string(),
            caption: format!("{} total drones", drones),
        },
        MetricCard {
            title: "Flight Hours",
            value: format!("{}h", metrics.flight_hours.unwrap_or(0.0)),
            caption: "Airborne time in range".to_string(),
        },
        MetricCard {
            title: "Success Rate",
            value: match metrics.success_rate {
                Some(rate) => format!("{:.1}%", rate),
                None => "0%".to_string(),
            },
            caption: format!("{} completed missions", completed),
        },
    ]
}

fn chart_panels(snapshot: &Snapshot) -> Vec<ChartPanel> {
    let missions = &snapshot.mission_data;
    let drones = &snapshot.drone_utilization_data;
    let sites = &snapshot.site_activity_data;
    let battery = &snapshot.battery_trend_data;

    vec![
        ChartPanel {
            key: "missions",
            tab: "Mission Trends",
            title: "Mission Completion Trends",
            description: "Track mission completion rates over time",
            kind: ChartKind::Bar,
            labels: missions.iter().map(|m| m.period.clone()).collect(),
            series: vec![
                ChartSeries {
                    name: "Completed",
                    color: "#10b981",
                    values: missions.iter().map(|m| m.completed as f64).collect(),
                },
                ChartSeries {
                    name: "Failed",
                    color: "#ef4444",
                    values: missions.iter().map(|m| m.failed as f64).collect(),
                },
                ChartSeries {
                    name: "In Progress",
                    color: "#3b82f6",
                    values: missions.iter().map(|m| m.in_progress as f64).collect(),
                },
            ],
            segment_colors: Vec::new(),
            y_max: None,
        },
        ChartPanel {
            key: "drones",
            tab: "Drone Performance",
            title: "Drone Performance Metrics",
            description: "Monitor individual drone performance and efficiency",
            kind: ChartKind::Pie,
            labels: drones
                .iter()
                .map(|d| format!("{}: {}%", d.drone, d.utilization))
                .collect(),
            series: vec![ChartSeries {
                name: "Utilization %",
                color: "#8884d8",
                values: drones.iter().map(|d| d.utilization).collect(),
            }],
            segment_colors: (0..drones.len()).map(|i| PIE_COLORS[i % PIE_COLORS.len()]).collect(),
            y_max: None,
        },
        ChartPanel {
            key: "sites",
            tab: "Site Analytics",
            title: "Site Activity Analysis",
            description: "Analyze mission activity across different sites",
            kind: ChartKind::Line,
            labels: sites.iter().map(|s| s.site.clone()).collect(),
            series: vec![
                ChartSeries {
                    name: "Missions",
                    color: "#3b82f6",
                    values: sites.iter().map(|s| s.missions as f64).collect(),
                },
                ChartSeries {
                    name: "Success Rate %",
                    color: "#10b981",
                    values: sites.iter().map(|s| s.success_rate).collect(),
                },
            ],
            segment_colors: Vec::new(),
            y_max: None,
        },
        ChartPanel {
            key: "battery",
            tab: "Battery Trends",
            title: "Battery Level Trends",
            description: "Monitor average battery levels throughout the day",
            kind: ChartKind::Line,
            labels: battery.iter().map(|b| b.time.clone()).collect(),
            series: vec![ChartSeries {
                name: "Average Battery %",
                color: "#f59e0b",
                values: battery.iter().map(|b| b.avg_battery).collect(),
            }],
            segment_colors: Vec::new(),
            y_max: Some(100.0),
        },
    ]
}
