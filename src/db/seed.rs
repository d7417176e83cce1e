//! Demo fleet used to populate an empty database.

use super::models::*;
use super::store::{DbError, Store};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;

const DEMO_DRONES: [(&str, &str); 4] = [
    ("Falcon-01", "Matrice 350"),
    ("Falcon-02", "Matrice 350"),
    ("Heron-01", "Skydio X10"),
    ("Kestrel-01", "Mavic 3E"),
];

const DEMO_SITES: [(&str, f64, f64, f64); 3] = [
    ("Harbor Yard", 37.8044, -122.2712, 4.0),
    ("Solar Farm East", 35.3733, -119.0187, 120.0),
    ("Ridge Substation", 39.5296, -119.8138, 1373.0),
];

/// Seed drones, sites, 90 days of missions and battery telemetry.
///
/// Does nothing when drones are already registered.
pub fn seed_demo_fleet<R: Rng>(store: &Store, rng: &mut R, now: DateTime<Utc>) -> Result<bool, DbError> {
    if store.count_drones()? > 0 {
        return Ok(false);
    }

    let mut drone_ids = Vec::with_capacity(DEMO_DRONES.len());
    for (name, model) in DEMO_DRONES {
        let mut drone = Drone {
            name: name.to_string(),
            model: model.to_string(),
            ..Default::default()
        };
        drone_ids.push(store.add_drone(&mut drone)?);
    }

    let mut site_ids = Vec::with_capacity(DEMO_SITES.len());
    for (name, latitude, longitude, altitude) in DEMO_SITES {
        let site = store.add_site(&NewSite {
            name: name.to_string(),
            description: None,
            latitude,
            longitude,
            altitude: Some(altitude),
            is_active: true,
        })?;
        site_ids.push(site.id);
    }

    let mut missions = Vec::new();
    let mut samples = Vec::new();

    for day in 0..90 {
        let day_start = now - ChronoDuration::days(day);
        for _ in 0..rng.gen_range(1..=4) {
            let drone_id = drone_ids[rng.gen_range(0..drone_ids.len())];
            let started_at = day_start - ChronoDuration::minutes(rng.gen_range(0..(24 * 60)));
            let status = match (day, rng.gen_range(0..100)) {
                (0, r) if r < 40 => MissionStatus::InProgress,
                (_, r) if r < 88 => MissionStatus::Completed,
                _ => MissionStatus::Failed,
            };
            let duration_seconds = match status {
                MissionStatus::InProgress => 0,
                _ => rng.gen_range(15..=55) * 60,
            };

            missions.push(Mission {
                drone_id,
                site_id: site_ids[rng.gen_range(0..site_ids.len())],
                status,
                started_at,
                duration_seconds,
            });

            // One reading every ten minutes while airborne.
            let mut level: f64 = rng.gen_range(92.0..100.0);
            for step in 0..(duration_seconds / 600) {
                samples.push(BatterySample {
                    drone_id,
                    time: started_at + ChronoDuration::minutes(step * 10),
                    level,
                });
                level = (level - rng.gen_range(3.0..8.0)).max(5.0);
            }
        }
    }

    store.add_missions(&missions)?;
    store.add_battery_samples(&samples)?;

    tracing::info!(
        "Seeded demo fleet: {} drones, {} sites, {} missions, {} battery samples",
        drone_ids.len(),
        site_ids.len(),
        missions.len(),
        samples.len()
    );

    Ok(true)
}
