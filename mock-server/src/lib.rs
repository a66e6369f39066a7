use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

// Tokens are not verified cryptographically; the payload segment is decoded
// and its claims are trusted, which is all a mock needs.
const JWT_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct ToggleCompletion {
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

struct UserRecord {
    id: Uuid,
    email: String,
    password: String,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, UserRecord>,
    todos: HashMap<Uuid, Todo>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api/todos/{id}/complete", patch(toggle_completion))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Sign an unverified token for `user_id`, valid for 30 minutes.
pub fn issue_token(user_id: Uuid, email: &str) -> String {
    issue_token_with_expiry(user_id, email, Utc::now() + Duration::minutes(30))
}

pub fn issue_token_with_expiry(
    user_id: Uuid,
    email: &str,
    expires_at: DateTime<Utc>,
) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = engine.encode(
        json!({
            "sub": email,
            "user_id": user_id,
            "exp": expires_at.timestamp(),
        })
        .to_string(),
    );
    format!("{header}.{claims}.mock-signature")
}

/// Error envelope shared by every rejection.
fn reject(status: StatusCode, detail: &str) -> Response {
    let body = json!({
        "error": "HTTP Exception",
        "detail": detail,
        "status_code": status.as_u16(),
    });
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    reject(
        StatusCode::NOT_FOUND,
        "Todo not found or does not belong to user",
    )
}

/// Resolve the authenticated user from the `authorization` header.
///
/// A missing header or an empty credential is 403 "Not authenticated"; a
/// credential that is present but does not decode to usable claims, or that
/// has expired, is 401 "Could not validate credentials".
fn authenticate(headers: &HeaderMap) -> Result<Uuid, Response> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| reject(StatusCode::FORBIDDEN, "Not authenticated"))?;

    claims_user_id(token).ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            "Could not validate credentials",
        )
    })
}

fn claims_user_id(token: &str) -> Option<Uuid> {
    let payload = token.split('.').nth(1)?;
    let bytes = JWT_PAYLOAD.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("sub")?.as_str()?;
    let user_id = claims.get("user_id")?.as_str()?.parse().ok()?;
    if let Some(exp) = claims.get("exp") {
        if exp.as_i64()? <= Utc::now().timestamp() {
            return None;
        }
    }
    Some(user_id)
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Todo API is running!"}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn signup(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<Value>, Response> {
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(reject(StatusCode::CONFLICT, "Email already registered"));
    }
    let user = UserRecord {
        id: Uuid::new_v4(),
        email: input.email.clone(),
        password: input.password,
    };
    let token = issue_token(user.id, &user.email);
    let response = json!({
        "user": {"id": user.id, "email": user.email},
        "token": token,
    });
    store.users.insert(input.email, user);
    Ok(Json(response))
}

async fn signin(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<Value>, Response> {
    let store = db.read().await;
    let user = store
        .users
        .get(&input.email)
        .filter(|user| user.password == input.password)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    Ok(Json(json!({
        "user": {"id": user.id, "email": user.email},
        "token": issue_token(user.id, &user.email),
    })))
}

async fn list_todos(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Todo>>, Response> {
    let user_id = authenticate(&headers)?;
    let store = db.read().await;
    let mut todos: Vec<Todo> = store
        .todos
        .values()
        .filter(|todo| todo.user_id == user_id)
        .cloned()
        .collect();
    todos.sort_by_key(|todo| (todo.created_at, todo.id));
    Ok(Json(todos))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> Result<Json<Todo>, Response> {
    let user_id = authenticate(&headers)?;
    let now = Utc::now();
    let todo = Todo {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        completed: false,
        user_id,
        created_at: now,
        updated_at: now,
    };
    db.write().await.todos.insert(todo.id, todo.clone());
    Ok(Json(todo))
}

async fn get_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Todo>, Response> {
    let user_id = authenticate(&headers)?;
    let store = db.read().await;
    store
        .todos
        .get(&id)
        .filter(|todo| todo.user_id == user_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, Response> {
    let user_id = authenticate(&headers)?;
    let mut store = db.write().await;
    let todo = store
        .todos
        .get_mut(&id)
        .filter(|todo| todo.user_id == user_id)
        .ok_or_else(not_found)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(description) = input.description {
        todo.description = Some(description);
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    todo.updated_at = Utc::now();
    Ok(Json(todo.clone()))
}

async fn toggle_completion(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<ToggleCompletion>,
) -> Result<Json<Value>, Response> {
    let user_id = authenticate(&headers)?;
    let mut store = db.write().await;
    let todo = store
        .todos
        .get_mut(&id)
        .filter(|todo| todo.user_id == user_id)
        .ok_or_else(not_found)?;
    todo.completed = input.completed;
    todo.updated_at = Utc::now();
    Ok(Json(json!({
        "todo": {
            "id": todo.id,
            "completed": todo.completed,
            "updated_at": todo.updated_at,
        }
    })))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Value>, Response> {
    let user_id = authenticate(&headers)?;
    let mut store = db.write().await;
    let owned = store
        .todos
        .get(&id)
        .is_some_and(|todo| todo.user_id == user_id);
    if !owned {
        return Err(not_found());
    }
    store.todos.remove(&id);
    Ok(Json(json!({"success": true})))
}
