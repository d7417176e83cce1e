//! Database model types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An operational site record as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated site ready to be persisted. Identity is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSite {
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub is_active: bool,
}

/// A registered drone.
#[derive(Debug, Clone, Default)]
pub struct Drone {
    pub id: i64,
    pub name: String,
    pub model: String,
}

/// Mission lifecycle as recorded by the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    Completed,
    Failed,
    InProgress,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Completed => "completed",
            MissionStatus::Failed => "failed",
            MissionStatus::InProgress => "in_progress",
        }
    }
}

/// A single mission flown by a drone at a site.
#[derive(Debug, Clone)]
pub struct Mission {
    pub drone_id: i64,
    pub site_id: i64,
    pub status: MissionStatus,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

/// A battery level reading reported by a drone, in percent.
#[derive(Debug, Clone)]
pub struct BatterySample {
    pub drone_id: i64,
    pub time: DateTime<Utc>,
    pub level: f64,
}
