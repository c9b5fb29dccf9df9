use crate::application::cancel::Cancellation;
use crate::application::router::SubmissionRouter;
use crate::domain::payment::PaymentRequest;
use crate::error::PaymentError;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct AppState {
    payments: Arc<SubmissionRouter>,
    timeout: Option<Duration>,
}

/// Builds the bridge's HTTP router.
///
/// `timeout` becomes the deadline of every payment request.
pub fn router(payments: Arc<SubmissionRouter>, timeout: Option<Duration>) -> Router {
    Router::new()
        .route("/payment", post(payment))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { payments, timeout })
}

/// Unreadable bodies are treated as a request with every field empty, so the
/// caller still gets a taxonomy error instead of a framework rejection.
async fn payment(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, PaymentError> {
    let request = match form {
        Ok(Form(pairs)) => PaymentRequest::from_pairs(pairs),
        Err(rejection) => {
            info!(error = %rejection, "Unreadable payment form");
            PaymentRequest::default()
        }
    };
    let cancel = match state.timeout {
        Some(timeout) => Cancellation::none().with_timeout(timeout),
        None => Cancellation::none(),
    };
    let result = state.payments.submit_payment(&request, &cancel).await?;
    Ok(Json(result).into_response())
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = match self {
            PaymentError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::Canceled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
