//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Request
//! payloads serialize exactly the fields the API expects; `UpdateTodo` omits
//! unset fields so the server applies a partial update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Request payload for the dedicated completion-toggle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleCompletion {
    pub completed: bool,
}

/// Request payload shared by sign-in and sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The user object embedded in an auth response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

/// Response from sign-in and sign-up: the authenticated user plus a bearer
/// token for subsequent requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

/// Response from the completion-toggle endpoint. The server echoes only the
/// fields it changed, wrapped in a `todo` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub todo: ToggledTodo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggledTodo {
    pub id: Uuid,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Response from deleting a todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn todo_roundtrips_through_json() {
        let body = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "buy milk",
            "description": "two liters",
            "completed": false,
            "user_id": "550e8400-e29b-41d4-a716-446655440001",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        });
        let todo: Todo = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(todo.title, "buy milk");
        assert_eq!(todo.description.as_deref(), Some("two liters"));
        assert_eq!(serde_json::to_value(&todo).unwrap(), body);
    }

    #[test]
    fn todo_description_is_optional() {
        let todo: Todo = serde_json::from_value(json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "title": "buy milk",
            "completed": true,
            "user_id": "550e8400-e29b-41d4-a716-446655440001",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(todo.description.is_none());
        let value = serde_json::to_value(&todo).unwrap();
        assert!(value.get("description").is_none());
    }

    #[test]
    fn create_todo_without_description_serializes_title_only() {
        let payload = CreateTodo {
            title: "buy milk".to_string(),
            description: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"title": "buy milk"})
        );
    }

    #[test]
    fn update_todo_omits_unset_fields() {
        let payload = UpdateTodo {
            completed: Some(true),
            ..UpdateTodo::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"completed": true})
        );
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        assert_eq!(
            serde_json::to_value(UpdateTodo::default()).unwrap(),
            json!({})
        );
    }

    #[test]
    fn toggle_payload_has_single_field() {
        assert_eq!(
            serde_json::to_value(ToggleCompletion { completed: true }).unwrap(),
            json!({"completed": true})
        );
    }

    #[test]
    fn auth_response_deserializes_user_and_token() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"id": "550e8400-e29b-41d4-a716-446655440000", "email": "a@b.com"},
            "token": "abc.def.ghi"
        }))
        .unwrap();
        assert_eq!(response.user.email, "a@b.com");
        assert_eq!(response.token, "abc.def.ghi");
    }

    #[test]
    fn toggle_response_unwraps_envelope() {
        let response: ToggleResponse = serde_json::from_value(json!({
            "todo": {
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "completed": true,
                "updated_at": "2024-01-02T00:00:00Z"
            }
        }))
        .unwrap();
        assert!(response.todo.completed);
    }
}
