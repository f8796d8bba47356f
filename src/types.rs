// ABOUTME: Type definitions for API requests, responses, and stored records
// ABOUTME: Stored records serialize with camelCase keys to match existing store data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Stored records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub date: DateTime<Utc>,
    pub topic: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percent_correct: u32,
    pub score: f64,
}

// Account API types
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public view of a user, safe to return externally. Never carries the
/// password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserView {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub total_games: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: SessionUserView,
}

// Game history API types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordGameRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub game_data: Option<GameData>,
}

// Numeric fields are "present" when the key exists, even at zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub correct_answers: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameResponse {
    pub success: bool,
    pub game: Game,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_games: usize,
    pub average_score: i64,
    pub average_percent_correct: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub games: Vec<Game>,
    pub stats: GameStats,
}
