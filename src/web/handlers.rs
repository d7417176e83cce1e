//! HTTP request handlers.

use super::templates::{
    AnalyticsErrorTemplate, AnalyticsLoadingTemplate, AnalyticsTemplate, SitesTemplate,
};
use super::AppState;
use crate::analytics::{render, AnalyticsView, TimeRange};
use crate::notify::{Toast, ToastBuffer, ToastLevel};
use crate::sites::{SiteDraft, SiteForm, StoreSites, SubmitOutcome, ADDED_MESSAGE, FAILED_MESSAGE};

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    Form,
};
use rust_embed::RustEmbed;
use serde::Deserialize;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

fn render_page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

pub async fn handle_index() -> Redirect {
    Redirect::to("/analytics")
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub range: Option<String>,
}

impl RangeQuery {
    /// Unknown or missing values fall back to the default range.
    fn time_range(&self) -> TimeRange {
        self.range
            .as_deref()
            .and_then(TimeRange::parse)
            .unwrap_or_default()
    }
}

pub async fn handle_analytics(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let range = query.time_range();
    let analytics = state.analytics.state(range).await;

    match render(&analytics, range) {
        AnalyticsView::Loading => {
            render_page(StatusCode::OK, &AnalyticsLoadingTemplate { toasts: Vec::new() })
        }
        AnalyticsView::Error { title, message } => render_page(
            StatusCode::OK,
            &AnalyticsErrorTemplate {
                toasts: Vec::new(),
                title,
                message,
            },
        ),
        AnalyticsView::Ready(dashboard) => match AnalyticsTemplate::new(dashboard) {
            Ok(template) => render_page(StatusCode::OK, &template),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        },
    }
}

pub async fn handle_api_analytics(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    Json(state.analytics.state(query.time_range()).await)
}

// ============================================================================
// Sites
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct SitesQuery {
    #[serde(default)]
    pub new: Option<String>,
    /// Set by the redirect after a successful add.
    #[serde(default)]
    pub added: Option<String>,
}

/// Fields posted by the "Add New Site" dialog. An unchecked checkbox is absent.
#[derive(Debug, Default, Deserialize)]
pub struct SiteFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default)]
    pub altitude: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

impl From<SiteFormInput> for SiteDraft {
    fn from(input: SiteFormInput) -> Self {
        Self {
            name: input.name,
            description: input.description,
            latitude: input.latitude,
            longitude: input.longitude,
            altitude: input.altitude,
            is_active: input.is_active.is_some(),
        }
    }
}

/// JSON body for `POST /api/sites`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<CreateSiteRequest> for SiteDraft {
    fn from(req: CreateSiteRequest) -> Self {
        let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        Self {
            name: req.name,
            description: req.description.unwrap_or_default(),
            latitude: number(req.latitude),
            longitude: number(req.longitude),
            altitude: number(req.altitude),
            is_active: req.is_active.unwrap_or(true),
        }
    }
}

fn site_form(state: &AppState) -> SiteForm<StoreSites, ToastBuffer> {
    SiteForm::new(StoreSites::new(state.store.clone()), ToastBuffer::new())
}

fn list_sites(state: &AppState) -> Vec<crate::db::Site> {
    state.store.get_sites().unwrap_or_else(|e| {
        tracing::error!("Failed to list sites: {}", e);
        Vec::new()
    })
}

pub async fn handle_sites(
    State(state): State<AppState>,
    Query(query): Query<SitesQuery>,
) -> Response {
    let mut form = site_form(&state);
    if query.new.is_some() {
        form.open();
    }

    let mut template = SitesTemplate::from_form(&list_sites(&state), &form);
    if query.added.is_some() {
        template.toasts.push(Toast {
            level: ToastLevel::Success,
            message: ADDED_MESSAGE.to_string(),
        });
    }

    render_page(StatusCode::OK, &template)
}

pub async fn handle_create_site(
    State(state): State<AppState>,
    Form(input): Form<SiteFormInput>,
) -> Response {
    let mut form = site_form(&state);
    form.open();
    *form.draft_mut() = input.into();

    // Redirect after an add so a reload cannot resubmit the form.
    let status = match form.submit().await {
        SubmitOutcome::Added => return Redirect::to("/sites?added=1").into_response(),
        SubmitOutcome::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        SubmitOutcome::Busy | SubmitOutcome::Closed => StatusCode::CONFLICT,
    };

    render_page(status, &SitesTemplate::from_form(&list_sites(&state), &form))
}

/// Cancel from the dialog: the posted draft is discarded and the dialog closes.
pub async fn handle_cancel_site(
    State(state): State<AppState>,
    Form(input): Form<SiteFormInput>,
) -> Response {
    let mut form = site_form(&state);
    form.open();
    *form.draft_mut() = input.into();
    form.cancel();

    render_page(StatusCode::OK, &SitesTemplate::from_form(&list_sites(&state), &form))
}

pub async fn handle_api_sites(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.get_sites() {
        Ok(sites) => Json(sites).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub async fn handle_api_create_site(
    State(state): State<AppState>,
    Json(req): Json<CreateSiteRequest>,
) -> impl IntoResponse {
    let mut form = site_form(&state);
    form.open();
    *form.draft_mut() = req.into();

    match form.submit().await {
        SubmitOutcome::Added => (StatusCode::CREATED, Json(serde_json::json!({ "ok": true }))).into_response(),
        SubmitOutcome::Invalid => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "errors": form.errors() })),
        )
            .into_response(),
        SubmitOutcome::Failed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": FAILED_MESSAGE })),
        )
            .into_response(),
        SubmitOutcome::Busy | SubmitOutcome::Closed => StatusCode::CONFLICT.into_response(),
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_asset(Path(path): Path<String>) -> Response {
    match Assets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref().to_string())], file.data).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <circle cx="50" cy="50" r="45" fill="#b91c1c"/>
        <path d="M20 55 L50 35 L80 55 M50 35 L50 70" stroke="white" stroke-width="6" fill="none" stroke-linecap="round"/>
    </svg>"##;

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsFeed;
    use crate::config::ServerConfig;
    use crate::db::Store;

    use axum::body::to_bytes;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn app_state() -> (NamedTempFile, AppState) {
        let tmp = NamedTempFile::new().unwrap();
        let store = Arc::new(Store::new(tmp.path()).unwrap());
        let analytics = Arc::new(AnalyticsFeed::new(store.clone(), Duration::from_secs(60)));
        let state = AppState {
            config: ServerConfig::default(),
            store,
            analytics,
        };
        (tmp, state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn input(name: &str, lat: &str, lon: &str) -> SiteFormInput {
        SiteFormInput {
            name: name.to_string(),
            latitude: lat.to_string(),
            longitude: lon.to_string(),
            is_active: Some("on".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_site_form_success_redirects() {
        let (_tmp, state) = app_state();

        let response = handle_create_site(State(state.clone()), Form(input("Harbor", "37.8", "-122.4"))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/sites?added=1");

        let sites = state.store.get_sites().unwrap();
        assert_eq!(sites.len(), 1);
        assert!(sites[0].is_active);

        let page = handle_sites(
            State(state),
            Query(SitesQuery {
                added: Some("1".to_string()),
                ..Default::default()
            }),
        )
        .await;
        let html = body_text(page).await;
        assert_eq!(html.matches("Site added successfully").count(), 1);
        assert!(!html.contains("data-modal"));
        assert!(html.contains("Harbor"));
    }

    #[tokio::test]
    async fn test_create_site_form_store_failure() {
        let (tmp, state) = app_state();
        rusqlite::Connection::open(tmp.path())
            .unwrap()
            .execute_batch("DROP TABLE sites;")
            .unwrap();

        let response = handle_create_site(State(state), Form(input("Harbor", "37.8", "-122.4"))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let html = body_text(response).await;
        assert!(html.contains("data-modal"));
        assert!(html.contains(r#"value="Harbor""#));
        assert!(html.contains(r#"value="37.8""#));
        assert_eq!(html.matches("Failed to add site").count(), 1);
        assert!(!html.contains("Site added successfully"));
    }

    #[tokio::test]
    async fn test_create_site_form_invalid_keeps_dialog_open() {
        let (_tmp, state) = app_state();

        let response = handle_create_site(State(state.clone()), Form(input("", "95", "-122.4"))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let html = body_text(response).await;
        assert!(html.contains("data-modal"));
        assert!(html.contains("Site name is required"));
        assert!(html.contains("Latitude must be between -90 and 90"));
        // Entered values are echoed back for correction.
        assert!(html.contains(r#"value="95""#));
        assert!(state.store.get_sites().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_form_values_are_escaped() {
        let (_tmp, state) = app_state();

        let response = handle_create_site(State(state), Form(input("<img src=x>", "abc", "0"))).await;
        let html = body_text(response).await;
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("Latitude must be a number"));
    }

    #[tokio::test]
    async fn test_unchecked_checkbox_is_inactive() {
        let (_tmp, state) = app_state();
        let mut form = input("Depot", "1", "2");
        form.is_active = None;

        let response = handle_create_site(State(state.clone()), Form(form)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(!state.store.get_sites().unwrap()[0].is_active);
    }

    #[tokio::test]
    async fn test_sites_page_opens_dialog_on_request() {
        let (_tmp, state) = app_state();

        let closed = handle_sites(State(state.clone()), Query(SitesQuery::default())).await;
        assert!(!body_text(closed).await.contains("data-modal"));

        let open = handle_sites(
            State(state),
            Query(SitesQuery {
                new: Some("1".to_string()),
                ..Default::default()
            }),
        )
        .await;
        let html = body_text(open).await;
        assert!(html.contains("data-modal"));
        // Defaults on open.
        assert!(html.contains(r#"id="latitude" name="latitude" inputmode="decimal" value="0""#));
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let (_tmp, state) = app_state();

        let response = handle_cancel_site(State(state.clone()), Form(input("Harbor", "37.8", "-122.4"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(!html.contains("data-modal"));
        assert!(!html.contains(r#"value="Harbor""#));
        assert!(state.store.get_sites().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_create_site() {
        let (_tmp, state) = app_state();

        let ok = handle_api_create_site(
            State(state.clone()),
            Json(CreateSiteRequest {
                name: "Ridge".to_string(),
                latitude: Some(39.5),
                longitude: Some(-119.8),
                altitude: Some(1373.0),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert_eq!(ok.status(), StatusCode::CREATED);

        let sites = state.store.get_sites().unwrap();
        assert_eq!(sites[0].altitude, Some(1373.0));
        assert!(sites[0].is_active);

        let bad = handle_api_create_site(
            State(state.clone()),
            Json(CreateSiteRequest {
                name: "Nowhere".to_string(),
                latitude: Some(10.0),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = serde_json::from_str(&body_text(bad).await).unwrap();
        assert_eq!(body["errors"][0]["field"], "longitude");
        assert_eq!(body["errors"][0]["message"], "Longitude must be a number");
        assert_eq!(state.store.get_sites().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analytics_page_loading_then_ready() {
        let (_tmp, state) = app_state();

        let loading = handle_analytics(State(state.clone()), Query(RangeQuery::default())).await;
        let html = body_text(loading).await;
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(!html.contains("Total Missions"));

        state.analytics.refresh().await;

        let ready = handle_analytics(
            State(state),
            Query(RangeQuery {
                range: Some("30d".to_string()),
            }),
        )
        .await;
        assert_eq!(ready.status(), StatusCode::OK);
        let html = body_text(ready).await;
        assert!(html.contains("Total Missions"));
        assert!(html.contains("0 total drones"));
        assert!(html.contains("No data for this range."));
        assert!(html.contains(r#"button small primary" href="/analytics?range=30d""#));
    }

    #[tokio::test]
    async fn test_api_analytics_reports_state() {
        let (_tmp, state) = app_state();
        state.analytics.refresh().await;

        let response = handle_api_analytics(
            State(state),
            Query(RangeQuery {
                range: Some("bogus".to_string()),
            }),
        )
        .await
        .into_response();
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["loading"], false);
        assert!(body["error"].is_null());
        assert_eq!(body["analytics"]["keyMetrics"]["totalMissions"], 0);
    }

    #[tokio::test]
    async fn test_assets_served_with_mime() {
        let css = handle_asset(Path("app.css".to_string())).await;
        assert_eq!(css.status(), StatusCode::OK);
        assert_eq!(css.headers()[header::CONTENT_TYPE], "text/css");

        let missing = handle_asset(Path("nope.js".to_string())).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
