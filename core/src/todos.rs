//! Typed operations for the `/api/todos` resource.

use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::types::{CreateTodo, DeleteResponse, Todo, ToggleCompletion, ToggleResponse, UpdateTodo};

/// Thin typed wrapper over [`ApiClient`] for the todo resource. Each method
/// maps to exactly one endpoint; authentication and error normalization are
/// inherited from the client.
#[derive(Clone)]
pub struct TodoApi {
    client: ApiClient,
}

impl TodoApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `GET /api/todos`, every todo belonging to the authenticated user.
    pub fn list(&self) -> Result<Vec<Todo>, ClientError> {
        self.client.get("/api/todos")
    }

    /// `GET /api/todos/{id}`.
    pub fn get_by_id(&self, id: Uuid) -> Result<Todo, ClientError> {
        self.client.get(&format!("/api/todos/{id}"))
    }

    /// `POST /api/todos`, returns the created todo with server-assigned
    /// fields filled in.
    pub fn create(&self, todo: &CreateTodo) -> Result<Todo, ClientError> {
        self.client.post("/api/todos", todo)
    }

    /// `PUT /api/todos/{id}`, partial update; unset fields keep their stored
    /// values.
    pub fn update(&self, id: Uuid, changes: &UpdateTodo) -> Result<Todo, ClientError> {
        self.client.put(&format!("/api/todos/{id}"), changes)
    }

    /// `PATCH /api/todos/{id}/complete`, sets the completion flag to exactly
    /// `completed`.
    pub fn toggle_completion(
        &self,
        id: Uuid,
        completed: bool,
    ) -> Result<ToggleResponse, ClientError> {
        self.client.patch(
            &format!("/api/todos/{id}/complete"),
            &ToggleCompletion { completed },
        )
    }

    /// `DELETE /api/todos/{id}`.
    pub fn delete(&self, id: Uuid) -> Result<DeleteResponse, ClientError> {
        self.client.delete(&format!("/api/todos/{id}"))
    }
}
