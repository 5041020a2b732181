use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::Result;
use crate::models::brain_teaser::{BrainTeaser, TeaserView};
use crate::services::rewards;

async fn list_teasers(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<ApiResponse<Vec<TeaserView>>>> {
    let teasers = BrainTeaser::list_active(&state.pool).await?;
    Ok(ok(teasers.into_iter().map(TeaserView::from).collect()))
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    choice: i32,
}

#[derive(Debug, Serialize)]
struct AnswerData {
    correct: bool,
    rewarded_cents: i64,
}

async fn answer_teaser(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(teaser_id): Path<Uuid>,
    ApiJson(body): ApiJson<AnswerBody>,
) -> Result<Json<ApiResponse<AnswerData>>> {
    let outcome = rewards::credit_teaser_answer(&state.pool, &user, teaser_id, body.choice).await?;
    let correct = outcome.correct.unwrap_or(false);

    let message = if correct { "Correct!" } else { "Wrong answer" };

    Ok(ok_with_message(
        message,
        AnswerData {
            correct,
            rewarded_cents: outcome.rewarded_cents,
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/teasers", get(list_teasers))
        .route("/teasers/:id/answer", post(answer_teaser))
}
