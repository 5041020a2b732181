// API module - HTTP endpoints

use axum::Json;
use serde::Serialize;

pub mod admin;
pub mod ads;
pub mod auth;
pub mod courses;
pub mod extract;
pub mod images;
pub mod middleware;
pub mod products;
pub mod referrals;
pub mod teasers;
pub mod wallet;

/// The `{success, message, data}` envelope every JSON endpoint speaks.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: "ok".to_string(),
        data: Some(data),
    })
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: Some(data),
    })
}

pub fn ok_message(message: &str) -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        message: message.to_string(),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(&ok(serde_json::json!({"n": 1})).0).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["n"], 1);
    }

    #[test]
    fn test_message_only_envelope_omits_data() {
        let json = serde_json::to_value(&ok_message("done").0).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
    }
}
