use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use ring::digest;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use super::errors::BackendError;
use super::types::{AuthSession, Backend, BackendUser, Filter, Order, Query, SignUpResponse};
use crate::portfolio::{
    ALL_TABLES, TABLE_BLOG_POSTS, TABLE_EXPERIENCES, TABLE_PROFILES, TABLE_PROJECTS,
    TABLE_SITE_SETTINGS, TABLE_TECHNOLOGIES,
};
use crate::utils::gen_random_string;

const OWNER_COLUMN: &str = "user_id";
const ACCESS_TOKEN_LIFETIME: u64 = 3600;

/// Operations of the [`Backend`] trait, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    SignUp,
    SignIn,
    GetUser,
    SignOut,
    Select,
    Count,
    Insert,
    Update,
    Delete,
    Rpc,
}

#[derive(Debug, Clone)]
struct MemoryUser {
    id: String,
    email: String,
    password_hash: Vec<u8>,
    confirmed_at: Option<chrono::DateTime<Utc>>,
}

impl MemoryUser {
    fn to_backend_user(&self) -> BackendUser {
        BackendUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            email_confirmed_at: self.confirmed_at,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, MemoryUser>,
    tokens: HashMap<String, String>,
    tables: HashMap<String, Vec<Value>>,
    failing: HashSet<BackendOp>,
}

/// In-process stand-in for the hosted backend.
///
/// Emulates password auth, JSON tables and owner-only write policies closely
/// enough for the registration protocol to behave the same as against the real
/// service.
pub struct InMemoryBackend {
    autoconfirm: bool,
    state: Mutex<MemoryState>,
}

fn hash_password(email: &str, password: &str) -> Vec<u8> {
    let salted = format!("{}:{password}", email.to_lowercase());
    digest::digest(&digest::SHA256, salted.as_bytes())
        .as_ref()
        .to_vec()
}

fn invalid_credentials() -> BackendError {
    BackendError::api(400, "Invalid login credentials")
}

fn rls_violation(table: &str) -> BackendError {
    BackendError::api(
        403,
        format!("new row violates row-level security policy for table \"{table}\""),
    )
}

impl InMemoryBackend {
    pub fn new(autoconfirm: bool) -> Self {
        tracing::info!(
            "Creating in-memory backend (email autoconfirm: {})",
            autoconfirm
        );
        Self {
            autoconfirm,
            state: Mutex::new(MemoryState::empty()),
        }
    }

    /// A backend pre-filled with the placeholder portfolio shown before the first sign-up
    pub fn with_sample_data(autoconfirm: bool) -> Self {
        let mut state = MemoryState::empty();
        for (table, rows) in sample_rows() {
            if let Some(stored) = state.tables.get_mut(table) {
                stored.extend(rows.into_iter().map(with_defaults));
            }
        }
        tracing::info!(
            "Creating in-memory backend with sample data (email autoconfirm: {})",
            autoconfirm
        );
        Self {
            autoconfirm,
            state: Mutex::new(state),
        }
    }

    /// Make every subsequent call of `op` fail with a 503 until switched off
    pub async fn set_failing(&self, op: BackendOp, failing: bool) {
        let mut state = self.state.lock().await;
        if failing {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// Mark an account as confirmed, as following the confirmation link would
    pub async fn confirm_email(&self, email: &str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&email.to_lowercase())
            .ok_or_else(|| BackendError::NotFound(format!("user {email}")))?;
        user.confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Snapshot of a table, bypassing row-level security
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self, op: BackendOp) -> Result<tokio::sync::MutexGuard<'_, MemoryState>, BackendError> {
        let state = self.state.lock().await;
        if state.failing.contains(&op) {
            tracing::debug!("Injected failure for {:?}", op);
            return Err(BackendError::api(503, "Service temporarily unavailable"));
        }
        Ok(state)
    }
}

impl MemoryState {
    fn empty() -> Self {
        Self {
            tables: ALL_TABLES
                .iter()
                .map(|t| (t.to_string(), Vec::new()))
                .collect(),
            ..Default::default()
        }
    }

    fn caller(&self, access_token: Option<&str>) -> Option<String> {
        access_token.and_then(|t| self.tokens.get(t).cloned())
    }

    fn require_caller(&self, access_token: Option<&str>) -> Result<String, BackendError> {
        self.caller(access_token)
            .ok_or_else(|| BackendError::api(401, "JWT expired or invalid"))
    }

    fn table(&self, table: &str) -> Result<&Vec<Value>, BackendError> {
        self.tables
            .get(table)
            .ok_or_else(|| unknown_table(table))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<Value>, BackendError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| unknown_table(table))
    }

    fn issue_session(&mut self, user: &MemoryUser) -> Result<AuthSession, BackendError> {
        let access_token =
            gen_random_string(32).map_err(|e| BackendError::Config(e.to_string()))?;
        let refresh_token =
            gen_random_string(16).map_err(|e| BackendError::Config(e.to_string()))?;
        self.tokens.insert(access_token.clone(), user.id.clone());
        Ok(AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_in: Some(ACCESS_TOKEN_LIFETIME),
            user: user.to_backend_user(),
        })
    }
}

fn unknown_table(table: &str) -> BackendError {
    BackendError::api(404, format!("relation \"public.{table}\" does not exist"))
}

fn owner_of(row: &Value) -> Option<&str> {
    row.get(OWNER_COLUMN).and_then(Value::as_str)
}

/// Owner-only policy: owned rows belong to their owner, owner-less rows to any signed-in user
fn writable_by(row: &Value, caller: &str) -> bool {
    owner_of(row).is_none_or(|owner| owner == caller)
}

fn with_defaults(row: Value) -> Value {
    let mut map = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if !map.get("id").is_some_and(|v| !v.is_null()) {
        map.insert("id".to_string(), json!(uuid::Uuid::new_v4().to_string()));
    }
    if !map.get("created_at").is_some_and(|v| !v.is_null()) {
        map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)));
    }
    Value::Object(map)
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let field = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, expected) => field == expected,
        Filter::Contains(_, needle) => field.as_str().is_some_and(|s| s.contains(needle.as_str())),
        Filter::IsNull(_) => field.is_null(),
    }
}

/// Null sorts above every value, which gives ASC NULLS LAST and DESC NULLS FIRST
fn compare_field(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    for o in order {
        let left = a.get(&o.column).unwrap_or(&Value::Null);
        let right = b.get(&o.column).unwrap_or(&Value::Null);
        let ordering = compare_field(left, right);
        let ordering = if o.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn init(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        let mut state = self.enter(BackendOp::SignUp).await?;

        let key = email.trim().to_lowercase();
        if !key.contains('@') {
            return Err(BackendError::api(
                400,
                "Unable to validate email address: invalid format",
            ));
        }
        if password.len() < 6 {
            return Err(BackendError::api(
                422,
                "Password should be at least 6 characters.",
            ));
        }
        if state.users.contains_key(&key) {
            return Err(BackendError::api(422, "User already registered"));
        }

        let user = MemoryUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: key.clone(),
            password_hash: hash_password(&key, password),
            confirmed_at: self.autoconfirm.then(Utc::now),
        };
        state.users.insert(key, user.clone());
        tracing::debug!("Registered in-memory user {}", user.id);

        if self.autoconfirm {
            Ok(SignUpResponse::Session(state.issue_session(&user)?))
        } else {
            Ok(SignUpResponse::Unconfirmed(user.to_backend_user()))
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let mut state = self.enter(BackendOp::SignIn).await?;

        let key = email.trim().to_lowercase();
        let user = state
            .users
            .get(&key)
            .cloned()
            .ok_or_else(invalid_credentials)?;
        if user.password_hash != hash_password(&key, password) {
            return Err(invalid_credentials());
        }
        if user.confirmed_at.is_none() {
            return Err(BackendError::api(400, "Email not confirmed"));
        }
        state.issue_session(&user)
    }

    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let state = self.enter(BackendOp::GetUser).await?;
        let user_id = state.require_caller(Some(access_token))?;
        state
            .users
            .values()
            .find(|u| u.id == user_id)
            .map(MemoryUser::to_backend_user)
            .ok_or_else(|| BackendError::api(404, "User not found"))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let mut state = self.enter(BackendOp::SignOut).await?;
        state.tokens.remove(access_token);
        Ok(())
    }

    async fn select(
        &self,
        query: &Query,
        _access_token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError> {
        let state = self.enter(BackendOp::Select).await?;
        let mut rows: Vec<Value> = state
            .table(&query.table)?
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn count(&self, table: &str, _access_token: Option<&str>) -> Result<u64, BackendError> {
        let state = self.enter(BackendOp::Count).await?;
        Ok(state.table(table)?.len() as u64)
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let mut state = self.enter(BackendOp::Insert).await?;
        let caller = state.require_caller(access_token)?;
        if !row.is_object() {
            return Err(BackendError::api(400, "Row must be a JSON object"));
        }
        if !writable_by(&row, &caller) {
            return Err(rls_violation(table));
        }
        let row = with_defaults(row);
        state.table_mut(table)?.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let mut state = self.enter(BackendOp::Update).await?;
        let caller = state.require_caller(access_token)?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::api(400, "Patch must be a JSON object"));
        };
        if patch
            .get(OWNER_COLUMN)
            .and_then(Value::as_str)
            .is_some_and(|owner| owner != caller)
        {
            return Err(rls_violation(table));
        }

        let row = state
            .table_mut(table)?
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
            .filter(|row| writable_by(row, &caller))
            .ok_or_else(|| BackendError::NotFound(format!("{table}/{id}")))?;

        if let Value::Object(map) = &mut *row {
            for (key, value) in patch {
                if key != "id" {
                    map.insert(key, value);
                }
            }
        }
        Ok(row.clone())
    }

    async fn delete(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut state = self.enter(BackendOp::Delete).await?;
        let caller = state.require_caller(access_token)?;
        // Rows hidden by the policy are silently left alone, as the hosted service does
        state.table_mut(table)?.retain(|row| {
            row.get("id").and_then(Value::as_str) != Some(id) || !writable_by(row, &caller)
        });
        Ok(())
    }

    async fn rpc(
        &self,
        function: &str,
        _args: Value,
        _access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let state = self.enter(BackendOp::Rpc).await?;
        match function {
            "is_registration_allowed" => {
                let has_owner = state
                    .table(TABLE_PROFILES)?
                    .iter()
                    .any(|row| owner_of(row).is_some());
                Ok(json!(!has_owner))
            }
            other => Err(BackendError::api(
                404,
                format!("Could not find the function public.{other} in the schema cache"),
            )),
        }
    }
}

fn sample_rows() -> Vec<(&'static str, Vec<Value>)> {
    vec![
        (
            TABLE_PROFILES,
            vec![json!({
                "user_id": null,
                "name": "John Doe",
                "title": "Full Stack Developer",
                "bio": "I build reliable web applications and enjoy turning rough ideas into polished products.",
                "email": "john.doe@example.com",
                "github_url": "https://github.com/johndoe",
                "linkedin_url": "https://linkedin.com/in/johndoe",
                "created_at": "2024-01-01T00:00:00Z"
            })],
        ),
        (
            TABLE_PROJECTS,
            vec![
                json!({
                    "user_id": null,
                    "title": "Task Tracker",
                    "description": "A collaborative task board with realtime updates.",
                    "technologies": ["Rust", "PostgreSQL", "HTMX"],
                    "featured": true,
                    "status": "completed",
                    "github_url": "https://github.com/johndoe/task-tracker",
                    "created_at": "2024-01-03T00:00:00Z"
                }),
                json!({
                    "user_id": null,
                    "title": "Weather Station",
                    "description": "Sensor readings collected from a Raspberry Pi and charted in the browser.",
                    "technologies": ["Python", "TypeScript"],
                    "featured": false,
                    "status": "in-progress",
                    "created_at": "2024-01-02T00:00:00Z"
                }),
            ],
        ),
        (
            TABLE_BLOG_POSTS,
            vec![json!({
                "user_id": null,
                "title": "Hello, World",
                "slug": "hello-world",
                "excerpt": "Why I started writing about the things I build.",
                "content": "Welcome to my blog.\n\nThis is where I write about projects, tools and lessons learned.",
                "published": true,
                "tags": ["meta"],
                "created_at": "2024-01-04T00:00:00Z"
            })],
        ),
        (
            TABLE_TECHNOLOGIES,
            vec![
                json!({ "user_id": null, "name": "Rust", "category": "language", "proficiency": 4 }),
                json!({ "user_id": null, "name": "TypeScript", "category": "language", "proficiency": 5 }),
                json!({ "user_id": null, "name": "PostgreSQL", "category": "database", "proficiency": 4 }),
                json!({ "user_id": null, "name": "Docker", "category": "tool", "proficiency": 3 }),
            ],
        ),
        (
            TABLE_EXPERIENCES,
            vec![
                json!({
                    "user_id": null,
                    "company": "Acme Corp",
                    "position": "Senior Developer",
                    "description": "Led the platform team.",
                    "start_date": "2021-04-01",
                    "end_date": null,
                    "current": true,
                    "location": "Remote"
                }),
                json!({
                    "user_id": null,
                    "company": "Initech",
                    "position": "Developer",
                    "start_date": "2018-06-01",
                    "end_date": "2021-03-31",
                    "current": false,
                    "location": "Austin, TX"
                }),
            ],
        ),
        (
            TABLE_SITE_SETTINGS,
            vec![json!({
                "single_user_mode": true,
                "primary_user_id": null,
                "site_name": "Portfolio"
            })],
        ),
    ]
}
