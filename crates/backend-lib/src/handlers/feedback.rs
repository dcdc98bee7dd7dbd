use std::sync::Arc;

use axum::{extract::State, Form, Json};
use portfolio_common::{FeedbackEntry, FeedbackForm};

use crate::error::AppError;
use crate::feedback;
use crate::AppState;

/// `POST /processfeedback`: store the comment, then list everything newest first
pub async fn process_feedback(
    State(state): State<Arc<AppState>>,
    Form(form): Form<FeedbackForm>,
) -> Result<Json<Vec<FeedbackEntry>>, AppError> {
    feedback::submit(state.gateway.as_ref(), form).await?;
    Ok(Json(feedback::list(state.gateway.as_ref()).await))
}
