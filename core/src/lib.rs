//! Synchronous API client core for the todo service.
//!
//! # Overview
//! Everything an interactive todo front-end needs short of rendering: a
//! persistent session store holding one bearer token, a generic JSON client
//! that attaches it to every request, typed wrappers for the auth and todo
//! endpoints, and a derived authentication state.
//!
//! # Design
//! - `SessionStore` owns the token; `ApiClient` borrows it per request
//!   through a shared `Arc`, so storing a token after sign-in is immediately
//!   visible to every client.
//! - `ApiClient` splits each call into `build_request` / `execute` /
//!   `parse_response`; the two pure stages carry all the error-normalization
//!   logic and are unit-tested without a server.
//! - Every response is classified into one `ClientError` kind; callers match
//!   on the kind instead of probing status codes.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod session;
pub mod todos;
pub mod types;

pub use auth::{AuthApi, AuthSession, AuthState};
pub use client::ApiClient;
pub use error::ClientError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Identity, SessionStore};
pub use todos::TodoApi;
pub use types::{
    AuthResponse, CreateTodo, Credentials, DeleteResponse, Todo, ToggleCompletion, ToggleResponse,
    ToggledTodo, UpdateTodo, UserSummary,
};
