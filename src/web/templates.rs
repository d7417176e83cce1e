//! Askama page templates and the rows they render.

use crate::analytics::{ChartPanel, Dashboard, MetricCard, TimeRange};
use crate::db::Site;
use crate::notify::{Toast, ToastBuffer};
use crate::sites::{SiteDraft, SiteField, SiteForm, SitesService};

use askama::Template;

#[derive(Template)]
#[template(path = "analytics_loading.html")]
pub struct AnalyticsLoadingTemplate {
    pub toasts: Vec<Toast>,
}

#[derive(Template)]
#[template(path = "analytics_error.html")]
pub struct AnalyticsErrorTemplate {
    pub toasts: Vec<Toast>,
    pub title: String,
    pub message: String,
}

pub struct RangeLink {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub toasts: Vec<Toast>,
    pub ranges: Vec<RangeLink>,
    pub metrics: Vec<MetricCard>,
    pub panels: Vec<ChartPanel>,
    /// Chart data embedded in a `<script>` block.
    pub panels_json: String,
}

impl AnalyticsTemplate {
    pub fn new(dashboard: Dashboard) -> Result<Self, serde_json::Error> {
        let panels_json = script_safe_json(&dashboard.panels)?;
        let ranges = TimeRange::ALL
            .iter()
            .map(|r| RangeLink {
                value: r.as_str(),
                label: r.label(),
                active: *r == dashboard.range,
            })
            .collect();

        Ok(Self {
            toasts: Vec::new(),
            ranges,
            metrics: dashboard.metrics,
            panels: dashboard.panels,
            panels_json,
        })
    }
}

pub struct SiteRow {
    pub name: String,
    pub description: String,
    pub coordinates: String,
    pub altitude: String,
    pub status: &'static str,
    pub created: String,
}

impl From<&Site> for SiteRow {
    fn from(site: &Site) -> Self {
        Self {
            name: site.name.clone(),
            description: site.description.clone().unwrap_or_default(),
            coordinates: format!("{:.6}, {:.6}", site.latitude, site.longitude),
            altitude: site
                .altitude
                .map(|a| format!("{} m", a))
                .unwrap_or_else(|| "-".to_string()),
            status: if site.is_active { "active" } else { "inactive" },
            created: site.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "sites.html")]
pub struct SitesTemplate {
    pub toasts: Vec<Toast>,
    pub sites: Vec<SiteRow>,
    pub dialog_open: bool,
    pub draft: SiteDraft,
    pub name_error: String,
    pub latitude_error: String,
    pub longitude_error: String,
    pub altitude_error: String,
    pub confirm_disabled: bool,
}

impl SitesTemplate {
    /// Render the site list with the dialog exactly as `form` left it.
    pub fn from_form<S: SitesService>(sites: &[Site], form: &SiteForm<S, ToastBuffer>) -> Self {
        let error = |field| form.errors().get(field).unwrap_or_default().to_string();

        Self {
            toasts: form.notifier().toasts().to_vec(),
            sites: sites.iter().map(SiteRow::from).collect(),
            dialog_open: form.is_open(),
            draft: form.draft().clone(),
            name_error: error(SiteField::Name),
            latitude_error: error(SiteField::Latitude),
            longitude_error: error(SiteField::Longitude),
            altitude_error: error(SiteField::Altitude),
            confirm_disabled: form.confirm_disabled(),
        }
    }
}

/// Serialize for embedding inside `<script>`; `<` is escaped so a site name
/// cannot close the tag.
fn script_safe_json<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}
