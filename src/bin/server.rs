//! Lorevine Server — HTTP API for the knowledge-telephone game.
//!
//! Thin axum server wrapping the shared lorevine_lib store and core
//! operations. The browser client fetches a seed, runs the chat round
//! against the learner agent, asks for the synthesized result, and saves it
//! back through this API; synthesis itself never writes.
//!
//! Usage:
//!   LOREVINE_DB=/path/to/lorevine.db LOREVINE_BIND=0.0.0.0:3600 lorevine-server
//!
//! Or with args:
//!   lorevine-server --db /path/to/lorevine.db --bind 0.0.0.0:3600

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use lorevine_lib::db::{Category, ChatMessage, Database, Knowledge, StoreError};
use lorevine_lib::genealogy::{self, GenealogyView};
use lorevine_lib::layout::{self, TreeLayout};
use lorevine_lib::{ai_client, orphans, seeds, settings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
struct AppState {
    db: Arc<Database>,
    start_time: Instant,
}

// ============================================================================
// Error type
// ============================================================================

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, s)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

fn not_found(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::NOT_FOUND, msg.into())
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Deserialize)]
struct KnowledgeQuery {
    id: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct KnowledgeListResponse {
    knowledge: Vec<Knowledge>,
}

#[derive(Serialize)]
struct SingleKnowledgeResponse {
    knowledge: Option<Knowledge>,
}

#[derive(Serialize)]
struct SaveKnowledgeResponse {
    success: bool,
    #[serde(rename = "knowledgeId")]
    knowledge_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(rename = "cleanOrphans")]
    clean_orphans: Option<String>,
    title: Option<String>,
}

#[derive(Serialize)]
struct CleanupResponse {
    success: bool,
    #[serde(rename = "deletedCount")]
    deleted_count: usize,
    #[serde(rename = "deletedIds")]
    deleted_ids: Vec<String>,
    message: String,
}

#[derive(Serialize)]
struct DeleteByTitleResponse {
    success: bool,
    #[serde(rename = "deletedCount")]
    deleted_count: usize,
    message: String,
}

#[derive(Deserialize)]
struct SeedsQuery {
    pick: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct SeedsResponse {
    seeds: Vec<Knowledge>,
}

#[derive(Serialize)]
struct PickedSeedResponse {
    seed: Knowledge,
}

#[derive(Deserialize)]
struct GenealogyQuery {
    id: Option<String>,
    direction: Option<String>,
}

#[derive(Deserialize)]
struct TreeQuery {
    category: Option<String>,
    strategy: Option<String>,
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(rename = "originalKnowledge")]
    original_knowledge: Knowledge,
    #[serde(rename = "chatLog", default)]
    chat_log: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct GenerateResponse {
    knowledge: Knowledge,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(rename = "elapsedSeconds")]
    elapsed_seconds: Option<u64>,
}

#[derive(Serialize)]
struct ChatResponse {
    messages: Vec<ai_client::LearnerMessage>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    knowledge_count: usize,
    uptime_secs: u64,
}

// ============================================================================
// Helpers
// ============================================================================

/// Query params arrive as empty strings when given without a value; treat
/// those as absent, matching the browser client's falsy checks.
fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    Category::from_str(raw).ok_or_else(|| bad_request(format!("Unknown category '{}'", raw)))
}

fn parse_direction(raw: &str) -> Result<genealogy::Direction, AppError> {
    genealogy::Direction::from_str(raw)
        .ok_or_else(|| bad_request(format!("Unknown direction '{}'", raw)))
}

fn parse_strategy(raw: &str) -> Result<layout::LayoutStrategy, AppError> {
    layout::LayoutStrategy::from_str(raw)
        .ok_or_else(|| bad_request(format!("Unknown layout strategy '{}'", raw)))
}

// ============================================================================
// Handlers
// ============================================================================

// POST /api/knowledge
async fn save_knowledge_handler(
    State(state): State<AppState>,
    Json(req): Json<Knowledge>,
) -> Result<Json<SaveKnowledgeResponse>, AppError> {
    let fresh = state.db.insert_if_absent(&req)?;

    if !fresh {
        println!("[POST /api/knowledge] '{}' already exists (id: {})", req.title, req.id);
        return Ok(Json(SaveKnowledgeResponse {
            success: true,
            knowledge_id: req.id,
            message: Some("Already exists".to_string()),
        }));
    }

    // The parent's cached counter moves only on a fresh insert.
    if let Some(parent_id) = &req.parent_id {
        state.db.increment_child_count(parent_id)?;
    }

    println!(
        "[POST /api/knowledge] Saved '{}' (id: {}, generation {})",
        req.title, req.id, req.generation
    );

    Ok(Json(SaveKnowledgeResponse {
        success: true,
        knowledge_id: req.id,
        message: None,
    }))
}

// DELETE /api/knowledge?cleanOrphans=true | ?title=X
async fn delete_knowledge_handler(
    State(state): State<AppState>,
    Query(params): Query<DeleteQuery>,
) -> Result<Response, AppError> {
    if params.clean_orphans.as_deref() == Some("true") {
        let report = orphans::cleanup_orphans(&state.db)?;
        println!(
            "[DELETE /api/knowledge] Orphan cleanup removed {} node(s)",
            report.deleted_count
        );
        let message = format!("Removed {} orphaned knowledge entries", report.deleted_count);
        return Ok(Json(CleanupResponse {
            success: true,
            deleted_count: report.deleted_count,
            deleted_ids: report.deleted_ids,
            message,
        })
        .into_response());
    }

    if let Some(title) = non_empty(&params.title) {
        let deleted_count = state.db.delete_by_title(title)?;
        println!(
            "[DELETE /api/knowledge] Deleted {} row(s) titled '{}'",
            deleted_count, title
        );
        let message = format!("Deleted {} entries titled \"{}\"", deleted_count, title);
        return Ok(Json(DeleteByTitleResponse {
            success: true,
            deleted_count,
            message,
        })
        .into_response());
    }

    Err(bad_request("Provide either ?cleanOrphans=true or ?title="))
}

// POST /api/generate
async fn generate_handler(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    // Synthesis does not save; the client posts the result back explicitly.
    let knowledge = ai_client::synthesize_knowledge(&req.original_knowledge, &req.chat_log).await?;

    println!(
        "[POST /api/generate] '{}' (gen {}) -> '{}' from {} chat message(s)",
        req.original_knowledge.title,
        req.original_knowledge.generation,
        knowledge.title,
        req.chat_log.len()
    );

    Ok(Json(GenerateResponse { knowledge }))
}

// POST /api/chat
async fn chat_handler(Json(req): Json<ChatRequest>) -> Result<Json<ChatResponse>, AppError> {
    let messages =
        ai_client::learner_replies(&req.message, &req.history, req.elapsed_seconds).await?;
    Ok(Json(ChatResponse { messages }))
}

// GET /api/knowledge?id=X | ?category=Y
async fn list_knowledge_handler(
    State(state): State<AppState>,
    Query(params): Query<KnowledgeQuery>,
) -> Result<Response, AppError> {
    if let Some(id) = non_empty(&params.id) {
        let knowledge = state.db.get_by_id(id)?;
        return Ok(Json(SingleKnowledgeResponse { knowledge }).into_response());
    }

    let knowledge = match non_empty(&params.category) {
        Some(raw) => state.db.list_by_category(parse_category(raw)?)?,
        None => state.db.list_all()?,
    };
    Ok(Json(KnowledgeListResponse { knowledge }).into_response())
}

// GET /api/knowledge/seeds?pick=random&category=X
async fn seeds_handler(
    State(state): State<AppState>,
    Query(params): Query<SeedsQuery>,
) -> Result<Response, AppError> {
    let seed_rows = state.db.list_seeds()?;

    if non_empty(&params.pick) == Some("random") {
        let category = match non_empty(&params.category) {
            Some(raw) => Some(parse_category(raw)?),
            None => None,
        };
        let picked = seeds::random_seed(&seed_rows, category)
            .ok_or_else(|| not_found("No seed knowledge available"))?
            .clone();
        state.db.increment_times_shown(&picked.id)?;
        println!("[GET /api/knowledge/seeds] Dealt '{}' ({})", picked.title, picked.id);
        return Ok(Json(PickedSeedResponse { seed: picked }).into_response());
    }

    Ok(Json(SeedsResponse { seeds: seed_rows }).into_response())
}

// GET /api/knowledge/genealogy?id=X&direction=both
async fn genealogy_handler(
    State(state): State<AppState>,
    Query(params): Query<GenealogyQuery>,
) -> Result<Json<GenealogyView>, AppError> {
    let id = non_empty(&params.id).ok_or_else(|| bad_request("Knowledge ID is required"))?;

    let direction = match non_empty(&params.direction) {
        Some(raw) => parse_direction(raw)?,
        None => genealogy::Direction::default(),
    };

    let all = state.db.list_all()?;
    Ok(Json(genealogy::resolve_genealogy(&all, id, direction)))
}

// GET /api/knowledge/tree?category=X&strategy=layered
async fn tree_handler(
    State(state): State<AppState>,
    Query(params): Query<TreeQuery>,
) -> Result<Json<TreeLayout>, AppError> {
    let strategy = match non_empty(&params.strategy) {
        Some(raw) => parse_strategy(raw)?,
        None => layout::LayoutStrategy::default(),
    };

    let nodes = match non_empty(&params.category) {
        Some(raw) => state.db.list_by_category(parse_category(raw)?)?,
        None => state.db.list_all()?,
    };

    Ok(Json(layout::build_layout(&nodes, strategy)))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let knowledge_count = state.db.count()?;
    let uptime = state.start_time.elapsed().as_secs();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge_count,
        uptime_secs: uptime,
    }))
}

// ============================================================================
// Database path resolution (matches CLI pattern)
// ============================================================================

fn find_database(db_arg: Option<&str>) -> PathBuf {
    // 1. CLI argument
    if let Some(path) = db_arg {
        return PathBuf::from(path);
    }

    // 2. Environment variable
    if let Ok(path) = std::env::var("LOREVINE_DB") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // 3. Walk up directory tree for .lorevine.db
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        loop {
            let candidate = dir.join(".lorevine.db");
            if candidate.exists() {
                return candidate;
            }
            match dir.parent() {
                Some(p) => dir = p,
                None => break,
            }
        }
    }

    // 4. Custom path from settings
    if let Some(custom) = settings::get_custom_db_path() {
        if !custom.is_empty() {
            return PathBuf::from(custom);
        }
    }

    // 5. Default app data directory
    dirs::data_dir()
        .map(|p| p.join("lorevine/lorevine.db"))
        .unwrap_or_else(|| PathBuf::from("lorevine.db"))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Parse simple args (no clap to keep binary small)
    let args: Vec<String> = std::env::args().collect();
    let mut db_arg: Option<&str> = None;
    let mut bind_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" if i + 1 < args.len() => {
                db_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--bind" if i + 1 < args.len() => {
                bind_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                println!("lorevine-server — knowledge-telephone game HTTP API");
                println!();
                println!("Usage: lorevine-server [--db PATH] [--bind ADDR:PORT]");
                println!();
                println!("Environment variables:");
                println!("  LOREVINE_DB    Database path");
                println!("  LOREVINE_BIND  Bind address (default: 0.0.0.0:3600)");
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_arg
        .map(|s| s.to_string())
        .or_else(|| std::env::var("LOREVINE_BIND").ok())
        .unwrap_or_else(|| "0.0.0.0:3600".to_string());

    // Settings before path resolution: the cascade consults the custom path.
    let app_data_dir = dirs::data_dir()
        .map(|p| p.join("lorevine"))
        .unwrap_or_else(|| PathBuf::from("."));
    settings::init(app_data_dir);

    let db_path = find_database(db_arg);
    println!("[Server] Database: {}", db_path.display());
    println!("[Server] Binding to: {}", bind_addr);

    // Open database (bootstraps the seed entries on first run)
    let db = match Database::new(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("[Server] Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    match db.count() {
        Ok(n) => println!("[Server] {} knowledge entries loaded", n),
        Err(e) => eprintln!("[Server] Warning: failed to count knowledge: {}", e),
    }

    if ai_client::is_available() {
        println!("[Server] Anthropic API key configured; synthesis enabled");
    } else {
        eprintln!("[Server] Warning: no Anthropic API key; /api/generate and /api/chat will fail");
    }

    // Build router
    let state = AppState {
        db,
        start_time: Instant::now(),
    };

    let app = Router::new()
        .route(
            "/api/knowledge",
            get(list_knowledge_handler)
                .post(save_knowledge_handler)
                .delete(delete_knowledge_handler),
        )
        .route("/api/knowledge/seeds", get(seeds_handler))
        .route("/api/knowledge/genealogy", get(genealogy_handler))
        .route("/api/knowledge/tree", get(tree_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Bind and serve
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[Server] Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    println!("[Server] Listening on {}", bind_addr);
    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        println!("[Server] Shutting down");
    });
    if let Err(e) = serve.await {
        eprintln!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}
