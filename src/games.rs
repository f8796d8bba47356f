// ABOUTME: Game history handlers: append completed games and report history
// ABOUTME: History is returned newest-first with derived aggregate stats

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::AppState;
use crate::error::{AppError, Result};
use crate::types::{
    Game, GameData, GameResponse, GameStats, HistoryQuery, HistoryResponse, RecordGameRequest,
};

pub async fn record_game(
    State(state): State<AppState>,
    Json(req): Json<RecordGameRequest>,
) -> Result<Json<GameResponse>> {
    let username = req.username.unwrap_or_default();

    let Some(game_data) = req.game_data else {
        return Err(AppError::MissingFields("Username and game data are required"));
    };
    if username.is_empty() {
        return Err(AppError::MissingFields("Username and game data are required"));
    }

    let (topic, total_questions, correct_answers, score) = validate_game_data(game_data)?;

    // Serialize appends per user; the backend's unconditional set would
    // otherwise let a concurrent append overwrite this one.
    let _guard = state.users.write_lock(&username).lock_owned().await;

    let mut user = state
        .users
        .get(&username)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let date = Utc::now();
    let game = Game {
        id: date.timestamp_millis().to_string(),
        date,
        topic,
        total_questions,
        correct_answers,
        percent_correct: percent_correct(correct_answers, total_questions),
        score,
    };

    user.games.push(game.clone());
    state.users.put(&username, &user).await?;

    tracing::info!(
        username = %user.username,
        topic = %game.topic,
        "Recorded game"
    );

    Ok(Json(GameResponse {
        success: true,
        game,
    }))
}

// A field is "present" when its key exists in the payload; zero counts.
fn validate_game_data(data: GameData) -> Result<(String, u32, u32, f64)> {
    let topic = data.topic.unwrap_or_default();
    if topic.is_empty() {
        return Err(AppError::InvalidGameData);
    }

    match (data.total_questions, data.correct_answers, data.score) {
        (Some(total), Some(correct), Some(score)) => Ok((topic, total, correct, score)),
        _ => Err(AppError::InvalidGameData),
    }
}

// correct_answers is not bounded by total_questions, so this can exceed 100.
fn percent_correct(correct_answers: u32, total_questions: u32) -> u32 {
    if total_questions > 0 {
        (f64::from(correct_answers) / f64::from(total_questions) * 100.0).round() as u32
    } else {
        0
    }
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let username = query.username.unwrap_or_default();

    if username.is_empty() {
        return Err(AppError::MissingFields("Username is required"));
    }

    let user = state
        .users
        .get(&username)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // Sort a copy newest-first; the stored record keeps insertion order.
    let mut games = user.games.clone();
    games.sort_by(|a, b| b.date.cmp(&a.date));

    let stats = compute_stats(&games);

    Ok(Json(HistoryResponse {
        success: true,
        games,
        stats,
    }))
}

fn compute_stats(games: &[Game]) -> GameStats {
    if games.is_empty() {
        return GameStats {
            total_games: 0,
            average_score: 0,
            average_percent_correct: 0,
        };
    }

    let count = games.len() as f64;
    let score_sum: f64 = games.iter().map(|g| g.score).sum();
    let percent_sum: f64 = games.iter().map(|g| f64::from(g.percent_correct)).sum();

    GameStats {
        total_games: games.len(),
        average_score: (score_sum / count).round() as i64,
        average_percent_correct: (percent_sum / count).round() as u32,
    }
}
