//! SQLite database store implementation.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use super::models::*;
use crate::analytics::{
    BatteryPoint, DroneUtilization, KeyMetrics, MissionPeriod, SiteActivity, Snapshot, TimeRange,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("connection lock poisoned")]
    Poisoned,
}

/// Thread-safe database store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn()?;

        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        conn.execute_batch(include_str!("../../migrations/000002_fleet.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 2 failed: {}", e)))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // --- Sites ---

    /// Persist a validated site and return the stored record.
    pub fn add_site(&self, site: &NewSite) -> Result<Site, DbError> {
        let created_at = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sites (name, description, latitude, longitude, altitude, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                site.name,
                site.description,
                site.latitude,
                site.longitude,
                site.altitude,
                site.is_active,
                format_db_time(created_at),
            ],
        )?;

        Ok(Site {
            id: conn.last_insert_rowid(),
            name: site.name.clone(),
            description: site.description.clone(),
            latitude: site.latitude,
            longitude: site.longitude,
            altitude: site.altitude,
            is_active: site.is_active,
            created_at,
        })
    }

    /// Get all sites, newest first.
    pub fn get_sites(&self) -> Result<Vec<Site>, DbError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, latitude, longitude, altitude, is_active, created_at FROM sites ORDER BY id DESC",
        )?;

        let sites = stmt
            .query_map([], |row| {
                let created_at: String = row.get(7)?;
                Ok(Site {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    latitude: row.get(3)?,
                    longitude: row.get(4)?,
                    altitude: row.get(5)?,
                    is_active: row.get(6)?,
                    created_at: parse_db_time(&created_at).unwrap_or_else(Utc::now),
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(sites)
    }

    // --- Fleet ---

    /// Add a new drone and return its ID.
    pub fn add_drone(&self, drone: &mut Drone) -> Result<i64, DbError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO drones (name, model) VALUES (?1, ?2)",
            params![drone.name, drone.model],
        )?;
        drone.id = conn.last_insert_rowid();
        Ok(drone.id)
    }

    /// Number of registered drones.
    pub fn count_drones(&self) -> Result<i64, DbError> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM drones", [], |r| r.get(0))?)
    }

    /// Add missions in batch.
    pub fn add_missions(&self, missions: &[Mission]) -> Result<(), DbError> {
        if missions.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO missions (drone_id, site_id, status, started_at, duration_seconds) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for m in missions {
                stmt.execute(params![
                    m.drone_id,
                    m.site_id,
                    m.status.as_str(),
                    format_db_time(m.started_at),
                    m.duration_seconds,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Add battery samples in batch.
    pub fn add_battery_samples(&self, samples: &[BatterySample]) -> Result<(), DbError> {
        if samples.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO battery_samples (drone_id, time, level) VALUES (?1, ?2, ?3)")?;

            for s in samples {
                stmt.execute(params![s.drone_id, format_db_time(s.time), s.level])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // --- Analytics ---

    /// Aggregate an analytics snapshot over the `range` days preceding `now`.
    pub fn analytics_snapshot(&self, range: TimeRange, now: DateTime<Utc>) -> Result<Snapshot, DbError> {
        let since = format_db_time(now - ChronoDuration::days(range.days()));
        let range_seconds = (range.days() * 86_400) as f64;
        let conn = self.conn()?;

        let (total, completed, duration): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(duration_seconds), 0)
             FROM missions WHERE started_at >= ?1",
            params![since],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let key_metrics = KeyMetrics {
            total_missions: Some(total as u64),
            flight_hours: Some(round1(duration as f64 / 3600.0)),
            success_rate: Some(percent(completed, total)),
        };

        let mission_data = {
            let mut stmt = conn.prepare(
                "SELECT strftime(?2, started_at) AS period,
                        SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END)
                 FROM missions WHERE started_at >= ?1
                 GROUP BY period ORDER BY period ASC",
            )?;
            let rows = stmt.query_map(params![since, range.period_format()], |r| {
                Ok(MissionPeriod {
                    period: r.get(0)?,
                    completed: r.get::<_, i64>(1)? as u64,
                    failed: r.get::<_, i64>(2)? as u64,
                    in_progress: r.get::<_, i64>(3)? as u64,
                })
            })?;
            rows.collect::<SqlResult<Vec<_>>>()?
        };

        let drone_utilization_data = {
            let mut stmt = conn.prepare(
                "SELECT d.name, COALESCE(SUM(m.duration_seconds), 0)
                 FROM drones d
                 LEFT JOIN missions m ON m.drone_id = d.id AND m.started_at >= ?1
                 GROUP BY d.id ORDER BY d.name ASC",
            )?;
            let rows = stmt.query_map(params![since], |r| {
                let airborne: i64 = r.get(1)?;
                Ok(DroneUtilization {
                    drone: r.get(0)?,
                    utilization: round1(airborne as f64 / range_seconds * 100.0),
                })
            })?;
            rows.collect::<SqlResult<Vec<_>>>()?
        };

        let site_activity_data = {
            let mut stmt = conn.prepare(
                "SELECT s.name, COUNT(m.id),
                        SUM(CASE WHEN m.status = 'completed' THEN 1 ELSE 0 END)
                 FROM missions m
                 JOIN sites s ON s.id = m.site_id
                 WHERE m.started_at >= ?1
                 GROUP BY s.id ORDER BY s.name ASC",
            )?;
            let rows = stmt.query_map(params![since], |r| {
                let missions: i64 = r.get(1)?;
                let completed: i64 = r.get(2)?;
                Ok(SiteActivity {
                    site: r.get(0)?,
                    missions: missions as u64,
                    success_rate: percent(completed, missions),
                })
            })?;
            rows.collect::<SqlResult<Vec<_>>>()?
        };

        let battery_trend_data = {
            let mut stmt = conn.prepare(
                "SELECT strftime('%H', time) AS hour, AVG(level)
                 FROM battery_samples WHERE time >= ?1
                 GROUP BY hour ORDER BY hour ASC",
            )?;
            let rows = stmt.query_map(params![since], |r| {
                let hour: String = r.get(0)?;
                let avg: f64 = r.get(1)?;
                Ok(BatteryPoint {
                    time: format!("{}:00", hour),
                    avg_battery: round1(avg),
                })
            })?;
            rows.collect::<SqlResult<Vec<_>>>()?
        };

        Ok(Snapshot {
            key_metrics: Some(key_metrics),
            mission_data,
            drone_utilization_data,
            site_activity_data,
            battery_trend_data,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        round1(part as f64 / whole as f64 * 100.0)
    } else {
        0.0
    }
}

fn format_db_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Parse a datetime string from the database.
fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    let formats = [TIME_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn new_store() -> (NamedTempFile, Store) {
        let tmp = NamedTempFile::new().unwrap();
        let store = Store::new(tmp.path()).unwrap();
        (tmp, store)
    }

    fn harbor() -> NewSite {
        NewSite {
            name: "Harbor".to_string(),
            description: Some("North pier".to_string()),
            latitude: 37.8,
            longitude: -122.4,
            altitude: None,
            is_active: true,
        }
    }

    #[test]
    fn test_site_roundtrip() {
        let (_tmp, store) = new_store();

        let added = store.add_site(&harbor()).unwrap();
        assert!(added.id > 0);

        let sites = store.get_sites().unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, added.id);
        assert_eq!(sites[0].name, "Harbor");
        assert_eq!(sites[0].description.as_deref(), Some("North pier"));
        assert_eq!(sites[0].altitude, None);
        assert!(sites[0].is_active);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = NamedTempFile::new().unwrap();
        Store::new(tmp.path()).unwrap().add_site(&harbor()).unwrap();

        let reopened = Store::new(tmp.path()).unwrap();
        assert_eq!(reopened.get_sites().unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_range_site_rejected_by_schema() {
        let (_tmp, store) = new_store();
        let mut site = harbor();
        site.latitude = 91.0;
        assert!(matches!(store.add_site(&site), Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_empty_snapshot() {
        let (_tmp, store) = new_store();
        let snapshot = store.analytics_snapshot(TimeRange::Last7Days, Utc::now()).unwrap();

        let metrics = snapshot.key_metrics.unwrap();
        assert_eq!(metrics.total_missions, Some(0));
        assert_eq!(metrics.flight_hours, Some(0.0));
        assert_eq!(metrics.success_rate, Some(0.0));
        assert!(snapshot.mission_data.is_empty());
        assert!(snapshot.drone_utilization_data.is_empty());
        assert!(snapshot.site_activity_data.is_empty());
        assert!(snapshot.battery_trend_data.is_empty());
    }

    #[test]
    fn test_snapshot_aggregates_range() {
        let (_tmp, store) = new_store();
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();

        let site = store.add_site(&harbor()).unwrap();
        let mut alpha = Drone {
            name: "Alpha".to_string(),
            model: "M300".to_string(),
            ..Default::default()
        };
        let mut bravo = Drone {
            name: "Bravo".to_string(),
            ..Default::default()
        };
        store.add_drone(&mut alpha).unwrap();
        store.add_drone(&mut bravo).unwrap();
        assert_eq!(store.count_drones().unwrap(), 2);

        let mission = |status, days_ago: i64, secs| Mission {
            drone_id: alpha.id,
            site_id: site.id,
            status,
            started_at: now - ChronoDuration::days(days_ago),
            duration_seconds: secs,
        };
        store
            .add_missions(&[
                mission(MissionStatus::Completed, 1, 3600),
                mission(MissionStatus::Completed, 2, 1800),
                mission(MissionStatus::Failed, 2, 1800),
                mission(MissionStatus::InProgress, 3, 0),
                // Outside the 7 day window.
                mission(MissionStatus::Completed, 20, 7200),
            ])
            .unwrap();

        store
            .add_battery_samples(&[
                BatterySample {
                    drone_id: alpha.id,
                    time: Utc.with_ymd_and_hms(2024, 6, 14, 9, 10, 0).unwrap(),
                    level: 80.0,
                },
                BatterySample {
                    drone_id: bravo.id,
                    time: Utc.with_ymd_and_hms(2024, 6, 13, 9, 40, 0).unwrap(),
                    level: 70.0,
                },
                BatterySample {
                    drone_id: alpha.id,
                    time: Utc.with_ymd_and_hms(2024, 6, 14, 14, 0, 0).unwrap(),
                    level: 55.0,
                },
            ])
            .unwrap();

        let snapshot = store.analytics_snapshot(TimeRange::Last7Days, now).unwrap();

        let metrics = snapshot.key_metrics.unwrap();
        assert_eq!(metrics.total_missions, Some(4));
        assert_eq!(metrics.flight_hours, Some(2.0));
        assert_eq!(metrics.success_rate, Some(50.0));

        assert_eq!(snapshot.mission_data.len(), 3);
        assert_eq!(snapshot.mission_data[0].period, "2024-06-12");
        assert_eq!(snapshot.mission_data[0].in_progress, 1);
        assert_eq!(snapshot.mission_data[1].completed, 1);
        assert_eq!(snapshot.mission_data[1].failed, 1);

        // Bravo has no missions but is still listed.
        assert_eq!(snapshot.drone_utilization_data.len(), 2);
        assert_eq!(snapshot.drone_utilization_data[0].drone, "Alpha");
        assert_eq!(snapshot.drone_utilization_data[0].utilization, 1.2);
        assert_eq!(snapshot.drone_utilization_data[1].utilization, 0.0);

        assert_eq!(snapshot.site_activity_data.len(), 1);
        assert_eq!(snapshot.site_activity_data[0].missions, 4);
        assert_eq!(snapshot.site_activity_data[0].success_rate, 50.0);

        assert_eq!(snapshot.battery_trend_data.len(), 2);
        assert_eq!(snapshot.battery_trend_data[0].time, "09:00");
        assert_eq!(snapshot.battery_trend_data[0].avg_battery, 75.0);
        assert_eq!(snapshot.battery_trend_data[1].time, "14:00");

        let wider = store.analytics_snapshot(TimeRange::Last30Days, now).unwrap();
        assert_eq!(wider.key_metrics.unwrap().total_missions, Some(5));
    }
}
