use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Amount, ApplicationId, ApplicationStatus, ClosureId, LoanId, User, UserId,
};
use super::emi::{calculate_prepayment_savings, validate_terms, EmiQuote};
use super::events::EventPublisher;
use super::notifications::{critical_count, generate_notifications, unread_count, Notification};
use super::reports::{generate_dashboard_summary, generate_report, ReportFilter, ReportKind};
use super::search::{search_all, search_suggestions};
use super::service::{
    ApplicationDraft, CustomerDraft, LendingError, LendingService, PaymentDraft,
};
use super::store::LendingRepository;

/// Header carrying the id of the acting back-office user.
pub const USER_HEADER: &str = "x-user-id";

/// Source of the acting instant for mutating requests.
pub type Clock = fn() -> DateTime<Utc>;

pub struct ApiState<R, P> {
    service: Arc<LendingService<R, P>>,
    clock: Clock,
}

impl<R, P> Clone for ApiState<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            clock: self.clock,
        }
    }
}

impl<R, P> ApiState<R, P> {
    pub fn new(service: Arc<LendingService<R, P>>, clock: Clock) -> Self {
        Self { service, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Router exposing calculators, listings, workflows and reports under `/api/v1`.
pub fn lending_router<R, P>(service: Arc<LendingService<R, P>>) -> Router
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    lending_router_with_clock(service, Utc::now)
}

pub fn lending_router_with_clock<R, P>(service: Arc<LendingService<R, P>>, clock: Clock) -> Router
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/emi/quote", post(emi_quote_handler))
        .route("/api/v1/emi/prepayment", post(prepayment_handler))
        .route(
            "/api/v1/customers",
            get(list_customers_handler::<R, P>).post(onboard_customer_handler::<R, P>),
        )
        .route(
            "/api/v1/applications",
            get(list_applications_handler::<R, P>).post(create_application_handler::<R, P>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(application_status_handler::<R, P>),
        )
        .route("/api/v1/loans", get(list_loans_handler::<R, P>))
        .route(
            "/api/v1/loans/:loan_id/schedule",
            get(loan_schedule_handler::<R, P>),
        )
        .route(
            "/api/v1/loans/:loan_id/payments",
            post(pay_emi_handler::<R, P>),
        )
        .route(
            "/api/v1/loans/:loan_id/closure",
            post(request_closure_handler::<R, P>),
        )
        .route(
            "/api/v1/closures/:closure_id/finalize",
            post(finalize_closure_handler::<R, P>),
        )
        .route("/api/v1/reports/:kind", get(report_handler::<R, P>))
        .route("/api/v1/dashboard", get(dashboard_handler::<R, P>))
        .route("/api/v1/notifications", get(notifications_handler::<R, P>))
        .route("/api/v1/search", get(search_handler::<R, P>))
        .route(
            "/api/v1/search/suggestions",
            get(suggestions_handler::<R, P>),
        )
        .with_state(ApiState::new(service, clock))
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, Json(payload)).into_response()
}

pub(crate) fn error_response(error: LendingError) -> Response {
    let status = match &error {
        LendingError::NotFound { .. } => StatusCode::NOT_FOUND,
        error if error.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        error if error.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "lending request failed");
    }
    error_body(status, error.to_string())
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, LendingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Resolves the acting user from [`USER_HEADER`].
fn acting_user<R, P>(service: &LendingService<R, P>, headers: &HeaderMap) -> Result<User, Response>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let id = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u32>().ok())
        .ok_or_else(|| {
            error_body(
                StatusCode::UNAUTHORIZED,
                format!("missing or invalid {USER_HEADER} header"),
            )
        })?;
    service.user(UserId(id)).map_err(|error| match error {
        LendingError::NotFound { .. } => {
            error_body(StatusCode::UNAUTHORIZED, format!("unknown user {id}"))
        }
        other => error_response(other),
    })
}

/// Loans outside the user's partner are reported as missing.
fn ensure_visible_loan<R, P>(
    service: &LendingService<R, P>,
    user: &User,
    loan_id: LoanId,
) -> Result<(), Response>
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let loans = service.loans_for(user).map_err(error_response)?;
    if loans.iter().any(|loan| loan.id == loan_id) {
        Ok(())
    } else {
        Err(error_response(LendingError::NotFound {
            entity: "loan",
            id: loan_id.0,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub principal: Amount,
    pub annual_rate: f64,
    pub tenure_months: u32,
    #[serde(default)]
    pub disbursement_date: Option<NaiveDate>,
}

pub(crate) async fn emi_quote_handler(Json(request): Json<QuoteRequest>) -> Response {
    if let Err(err) = validate_terms(request.principal, request.annual_rate, request.tenure_months)
    {
        return error_body(StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
    }
    let disbursed = request
        .disbursement_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let quote = EmiQuote::new(
        request.principal,
        request.annual_rate,
        request.tenure_months,
        disbursed,
    );
    (StatusCode::OK, Json(quote)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PrepaymentRequest {
    pub principal: Amount,
    pub annual_rate: f64,
    pub tenure_months: u32,
    pub prepayment_amount: Amount,
    pub months_paid: u32,
}

pub(crate) async fn prepayment_handler(Json(request): Json<PrepaymentRequest>) -> Response {
    if let Err(err) = validate_terms(request.principal, request.annual_rate, request.tenure_months)
    {
        return error_body(StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
    }
    if request.prepayment_amount < 0 {
        return error_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            "prepayment amount must not be negative",
        );
    }
    let savings = calculate_prepayment_savings(
        request.principal,
        request.annual_rate,
        request.tenure_months,
        request.prepayment_amount,
        request.months_paid,
    );
    (StatusCode::OK, Json(savings)).into_response()
}

pub(crate) async fn list_customers_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    match acting_user(&state.service, &headers) {
        Ok(user) => respond(StatusCode::OK, state.service.customers_for(&user)),
        Err(response) => response,
    }
}

pub(crate) async fn onboard_customer_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Json(draft): Json<CustomerDraft>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    if let Err(response) = acting_user(&state.service, &headers) {
        return response;
    }
    respond(
        StatusCode::CREATED,
        state.service.onboard_customer(draft, state.now()),
    )
}

pub(crate) async fn list_applications_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    match acting_user(&state.service, &headers) {
        Ok(user) => respond(StatusCode::OK, state.service.applications_for(&user)),
        Err(response) => response,
    }
}

pub(crate) async fn create_application_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Json(draft): Json<ApplicationDraft>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let visible = state
        .service
        .customers_for(&user)
        .map(|customers| customers.iter().any(|c| c.id == draft.customer_id));
    match visible {
        Ok(true) => respond(
            StatusCode::CREATED,
            state.service.create_application(draft, state.now()),
        ),
        Ok(false) => error_response(LendingError::NotFound {
            entity: "customer",
            id: draft.customer_id.0,
        }),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

pub(crate) async fn application_status_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(application_id): Path<u32>,
    Json(change): Json<StatusChange>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    let visible = state
        .service
        .applications_for(&user)
        .map(|applications| applications.iter().any(|a| a.id == id));
    match visible {
        Ok(true) => respond(
            StatusCode::OK,
            state
                .service
                .transition_application(id, change.status, change.remarks, state.now()),
        ),
        Ok(false) => error_response(LendingError::NotFound {
            entity: "application",
            id: application_id,
        }),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_loans_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    match acting_user(&state.service, &headers) {
        Ok(user) => respond(StatusCode::OK, state.service.loans_for(&user)),
        Err(response) => response,
    }
}

pub(crate) async fn loan_schedule_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(loan_id): Path<u32>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let loan_id = LoanId(loan_id);
    let checked = acting_user(&state.service, &headers)
        .and_then(|user| ensure_visible_loan(&state.service, &user, loan_id));
    match checked {
        Ok(()) => respond(StatusCode::OK, state.service.loan_schedule(loan_id)),
        Err(response) => response,
    }
}

pub(crate) async fn pay_emi_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(loan_id): Path<u32>,
    payment: Option<Json<PaymentDraft>>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let loan_id = LoanId(loan_id);
    let checked = acting_user(&state.service, &headers)
        .and_then(|user| ensure_visible_loan(&state.service, &user, loan_id));
    if let Err(response) = checked {
        return response;
    }
    let payment = payment.map(|Json(draft)| draft).unwrap_or_default();
    respond(
        StatusCode::CREATED,
        state.service.pay_emi(loan_id, payment, state.now()),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct ClosureRequest {
    #[serde(default)]
    pub remarks: Option<String>,
}

pub(crate) async fn request_closure_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(loan_id): Path<u32>,
    request: Option<Json<ClosureRequest>>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let loan_id = LoanId(loan_id);
    let checked = acting_user(&state.service, &headers)
        .and_then(|user| ensure_visible_loan(&state.service, &user, loan_id));
    if let Err(response) = checked {
        return response;
    }
    let request = request.map(|Json(body)| body).unwrap_or_default();
    respond(
        StatusCode::CREATED,
        state
            .service
            .request_closure(loan_id, request.remarks, state.today()),
    )
}

pub(crate) async fn finalize_closure_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(closure_id): Path<u32>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let closure_id = ClosureId(closure_id);
    let loan_id = state.service.with_dataset(|data| {
        data.closures
            .iter()
            .find(|closure| closure.id == closure_id)
            .map(|closure| closure.loan_id)
    });
    match loan_id {
        Ok(Some(loan_id)) => {
            if let Err(response) = ensure_visible_loan(&state.service, &user, loan_id) {
                return response;
            }
            respond(
                StatusCode::OK,
                state
                    .service
                    .finalize_closure(closure_id, &user.name, state.now()),
            )
        }
        Ok(None) => error_response(LendingError::NotFound {
            entity: "closure",
            id: closure_id.0,
        }),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Query(filter): Query<ReportFilter>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let kind = match kind.parse::<ReportKind>() {
        Ok(kind) => kind,
        Err(error) => return error_body(StatusCode::NOT_FOUND, error.to_string()),
    };
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let today = state.today();
    respond(
        StatusCode::OK,
        state
            .service
            .with_dataset(|data| generate_report(kind, data, &user, &filter, today)),
    )
}

pub(crate) async fn dashboard_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let today = state.today();
    respond(
        StatusCode::OK,
        state
            .service
            .with_dataset(|data| generate_dashboard_summary(data, &user, today)),
    )
}

#[derive(Debug, Serialize)]
pub struct NotificationFeed {
    pub unread: usize,
    pub critical: usize,
    pub notifications: Vec<Notification>,
}

pub(crate) async fn notifications_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    let user = match acting_user(&state.service, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let today = state.today();
    let feed = state.service.with_dataset(|data| {
        let notifications = generate_notifications(data, &user, today);
        NotificationFeed {
            unread: unread_count(&notifications),
            critical: critical_count(&notifications),
            notifications,
        }
    });
    respond(StatusCode::OK, feed)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub(crate) async fn search_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    match acting_user(&state.service, &headers) {
        Ok(user) => respond(
            StatusCode::OK,
            state
                .service
                .with_dataset(|data| search_all(&query.q, data, &user)),
        ),
        Err(response) => response,
    }
}

pub(crate) async fn suggestions_handler<R, P>(
    State(state): State<ApiState<R, P>>,
    headers: HeaderMap,
) -> Response
where
    R: LendingRepository + 'static,
    P: EventPublisher + 'static,
{
    match acting_user(&state.service, &headers) {
        Ok(user) => respond(
            StatusCode::OK,
            state
                .service
                .with_dataset(|data| search_suggestions(data, &user)),
        ),
        Err(response) => response,
    }
}
