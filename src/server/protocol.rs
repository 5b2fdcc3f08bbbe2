use serde::Serialize;

use crate::scene::{Feedback, SceneError, SceneFrame, SceneMode};

/// Reply sent only to the client that issued a command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandReply {
    pub message_type: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn from_result(result: &Result<Feedback, SceneError>) -> Self {
        match result {
            Ok(feedback) => CommandReply {
                message_type: "CommandReply",
                ok: true,
                feedback: Some(feedback.clone()),
                error: None,
            },
            Err(e) => CommandReply::error(e.to_string()),
        }
    }

    pub fn error(message: String) -> Self {
        CommandReply {
            message_type: "CommandReply",
            ok: false,
            feedback: None,
            error: Some(message),
        }
    }
}

/// Health endpoint response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub session: String,
    pub biome: String,
    pub tick: u64,
    pub tick_rate: f32,
    pub mode: SceneMode,
    pub active_agents: usize,
    pub clients: usize,
}

pub fn frame_json(frame: &SceneFrame) -> String {
    serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string())
}

pub fn reply_json(reply: &CommandReply) -> String {
    serde_json::to_string(reply).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::challenge::ChallengeError;

    #[test]
    fn ok_reply_carries_feedback() {
        let reply = CommandReply::from_result(&Ok(Feedback::None));
        let json: serde_json::Value = serde_json::from_str(&reply_json(&reply)).unwrap();
        assert_eq!(json["message_type"], "CommandReply");
        assert_eq!(json["ok"], true);
        assert_eq!(json["feedback"]["kind"], "none");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn error_reply_carries_message() {
        let reply =
            CommandReply::from_result(&Err(SceneError::Challenge(ChallengeError::Inactive)));
        let json: serde_json::Value = serde_json::from_str(&reply_json(&reply)).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "challenge mode is not active");
        assert!(json.get("feedback").is_none());
    }
}
