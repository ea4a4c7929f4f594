use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use wealthevolve_core::calc::allocation::{self, AllocationAdvice, Projection};
use wealthevolve_core::calc::overlap::{self, OverlapReport};
use wealthevolve_core::calc::recommendation::{self, Recommendation};
use wealthevolve_core::calc::risk::{self, Question, RiskProfile};
use wealthevolve_core::calc::sip::{self, SipInput, SipResult};
use wealthevolve_core::catalog::FundCatalog;
use wealthevolve_core::domain::account::{
    subscription_plans, SubscriptionPlan, SubscriptionTier, User, UserSettings,
};
use wealthevolve_core::domain::error::NotFoundError;
use wealthevolve_core::domain::fund::{FundSummary, MutualFund};
use wealthevolve_core::domain::questionnaire::{QuestionnaireResult, Timeframe};
use wealthevolve_core::storage::AccountService;

use crate::error::{ApiError, ApiJson};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<FundCatalog>,
    pub accounts: AccountService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/funds", get(list_funds))
        .route("/funds/:id", get(get_fund))
        .route("/overlap", post(analyze_overlap))
        .route("/allocation", post(recommend_allocation))
        .route("/sip", post(calculate_sip))
        .route("/risk-profile/questions", get(risk_questions))
        .route("/risk-profile", post(assess_risk))
        .route("/recommendations", post(recommend))
        .route("/plans", get(list_plans))
        .route("/account", get(current_account))
        .route("/account/signup", post(signup))
        .route("/account/login", post(login))
        .route("/account/logout", post(logout))
        .route("/account/profile", put(update_profile))
        .route("/account/subscription", put(change_subscription))
        .route("/account/settings", get(get_settings).put(update_settings))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_funds(State(state): State<AppState>) -> Json<Vec<FundSummary>> {
    Json(state.catalog.summaries())
}

async fn get_fund(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MutualFund> {
    Ok(Json(state.catalog.require(&id)?.clone()))
}

#[derive(Debug, Deserialize)]
struct OverlapRequest {
    fund_ids: Vec<String>,
}

async fn analyze_overlap(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<OverlapRequest>,
) -> ApiResult<OverlapReport> {
    Ok(Json(overlap::analyze(&state.catalog, &req.fund_ids)?))
}

#[derive(Debug, Deserialize)]
struct AllocationRequest {
    risk_tolerance: u8,
    timeframe: Timeframe,
    #[serde(default)]
    initial_investment: f64,
    #[serde(default)]
    monthly_contribution: f64,
}

#[derive(Debug, Serialize)]
struct AllocationResponse {
    advice: AllocationAdvice,
    projection: Projection,
}

async fn recommend_allocation(ApiJson(req): ApiJson<AllocationRequest>) -> ApiResult<AllocationResponse> {
    let advice = allocation::recommend(req.risk_tolerance, req.timeframe)?;
    let projection = allocation::project(
        req.initial_investment,
        req.monthly_contribution,
        advice.expected_return_pct,
        req.timeframe.horizon_years(),
    )?;
    Ok(Json(AllocationResponse { advice, projection }))
}

async fn calculate_sip(ApiJson(req): ApiJson<SipInput>) -> ApiResult<SipResult> {
    Ok(Json(sip::calculate(&req)?))
}

async fn risk_questions() -> Json<&'static [Question]> {
    Json(&risk::QUESTIONS[..])
}

#[derive(Debug, Deserialize)]
struct RiskProfileRequest {
    answers: BTreeMap<String, u8>,
}

async fn assess_risk(ApiJson(req): ApiJson<RiskProfileRequest>) -> ApiResult<RiskProfile> {
    Ok(Json(risk::assess(&req.answers)?))
}

async fn recommend(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<QuestionnaireResult>,
) -> ApiResult<Recommendation> {
    Ok(Json(recommendation::recommend(&state.catalog, req)?))
}

async fn list_plans() -> Json<Vec<SubscriptionPlan>> {
    Json(subscription_plans())
}

async fn current_account(State(state): State<AppState>) -> ApiResult<User> {
    let user = state
        .accounts
        .current_user()
        .await?
        .ok_or_else(|| NotFoundError::new("account", "no user is signed in"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    name: String,
    email: String,
    password: String,
    confirm_password: String,
}

async fn signup(State(state): State<AppState>, ApiJson(req): ApiJson<SignupRequest>) -> ApiResult<User> {
    let user = state
        .accounts
        .signup(&req.name, &req.email, &req.password, &req.confirm_password)
        .await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> ApiResult<User> {
    Ok(Json(state.accounts.login(&req.email, &req.password).await?))
}

async fn logout(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.accounts.logout().await?;
    Ok("ok")
}

#[derive(Debug, Deserialize)]
struct ProfileRequest {
    name: String,
    email: String,
}

async fn update_profile(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> ApiResult<User> {
    Ok(Json(state.accounts.update_profile(&req.name, &req.email).await?))
}

#[derive(Debug, Deserialize)]
struct SubscriptionRequest {
    tier: SubscriptionTier,
}

async fn change_subscription(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubscriptionRequest>,
) -> ApiResult<User> {
    Ok(Json(state.accounts.change_subscription(req.tier).await?))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<UserSettings> {
    Ok(Json(state.accounts.settings().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserSettings>,
) -> ApiResult<UserSettings> {
    Ok(Json(state.accounts.update_settings(req).await?))
}
