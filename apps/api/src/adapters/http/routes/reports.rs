use axum::{
    Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};

use super::ok;
use crate::{
    adapters::http::{app_state::AppState, extract::AuthUser},
    app_error::AppResult,
    use_cases::report::ReportPeriod,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/reports/overview", get(overview))
}

/// `?from=&to=` (RFC 3339) narrows the approval and revenue figures.
async fn overview(
    State(app_state): State<AppState>,
    AuthUser(admin): AuthUser,
    Query(period): Query<ReportPeriod>,
) -> AppResult<impl IntoResponse> {
    let report = app_state.report_use_cases.overview(&admin, period).await?;
    Ok(ok("Report overview", report))
}
