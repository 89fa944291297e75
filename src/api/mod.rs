// src/api/mod.rs
// Thin HTTP surface over the composer. Handlers validate input and pass
// envelopes through unchanged; cache failures never reach a client.

use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{web, App, Error, HttpResponse, HttpServer};
use chrono::Utc;
use futures_util::stream::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::{fallback_directions, GeoAgent, TrendAgent};
use crate::cache::invalidation::CacheInvalidationService;
use crate::cache::store::CacheStore;
use crate::cache::CacheDomain;
use crate::composer::ResultComposer;
use crate::config::AppConfig;
use crate::models::PreferencesUpdate;
use crate::profile::ProfileStore;
use crate::retrieval::ArtworkRetrieval;

const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const DEFAULT_USER: &str = "demo_user";
const DEFAULT_SESSION_LIMIT: usize = 10;
const DEFAULT_TREND_QUERY: &str = "interior design trends 2024";
const DEFAULT_TREND_RESULTS: usize = 10;
const DEFAULT_SEARCH_RESULTS: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<ResultComposer>,
    pub cache: Arc<CacheStore>,
    pub invalidation: Arc<CacheInvalidationService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub trend: Arc<dyn TrendAgent>,
    pub geo: Arc<dyn GeoAgent>,
    pub catalog: Arc<dyn ArtworkRetrieval>,
    pub upload_dir: String,
}

fn generate_request_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

async fn root_handler() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Art.Decor.AI API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "timestamp": Utc::now().to_rfc3339()
    })))
}

async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "cache": if state.cache.is_enabled() { "connected" } else { "disabled" },
            "ai_agents": "ready",
            "artwork_retrieval": "ready"
        },
        "request_id": request_id
    })))
}

/// Multipart room-image upload. The image lands in the upload directory only
/// for the duration of the analysis and is removed afterwards.
async fn analyze_room(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    fs::create_dir_all(&state.upload_dir).ok();

    let mut image_path: Option<PathBuf> = None;
    let mut location: Option<String> = None;
    let mut user_id = DEFAULT_USER.to_string();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or("")
            .to_string();

        match name.as_str() {
            "image" => {
                let filename = field
                    .content_disposition()
                    .as_ref()
                    .and_then(|cd| cd.get_filename())
                    .ok_or_else(|| actix_web::error::ErrorBadRequest("No filename"))?
                    .to_string();

                let ext = Path::new(&filename)
                    .extension()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "success": false,
                        "error": "Only jpg/jpeg/png/webp images are accepted",
                        "request_id": request_id
                    })));
                }

                let filepath =
                    PathBuf::from(&state.upload_dir).join(format!("{}.{}", Uuid::new_v4(), ext));
                let write_path = filepath.clone();
                let mut f = web::block(move || std::fs::File::create(&write_path)).await??;
                while let Some(chunk) = field.next().await {
                    let data = chunk?;
                    f = web::block(move || f.write_all(&data).map(|_| f)).await??;
                }
                image_path = Some(filepath);
            }
            "location" => location = read_text_field(&mut field).await?,
            "user_id" => {
                if let Some(value) = read_text_field(&mut field).await? {
                    user_id = value;
                }
            }
            other => warn!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let Some(image_path) = image_path else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": "Missing 'image' field",
            "request_id": request_id
        })));
    };

    info!(%request_id, %user_id, "Processing room analysis upload");
    let response = state
        .composer
        .process_room_analysis(&image_path, &user_id, location.as_deref())
        .await;

    if let Err(e) = fs::remove_file(&image_path) {
        warn!(path = %image_path.display(), "Could not remove uploaded image: {e}");
    }

    Ok(HttpResponse::Ok().json(response))
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<Option<String>, Error> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        buf.extend_from_slice(&chunk?);
    }
    if buf.is_empty() {
        return Ok(None);
    }
    let value = String::from_utf8(buf)
        .map_err(|_| actix_web::error::ErrorBadRequest("Field is not valid UTF-8"))?;
    Ok(Some(value))
}

#[derive(Deserialize)]
struct TextQueryForm {
    query: String,
    location: Option<String>,
    user_id: Option<String>,
}

async fn text_query(
    state: web::Data<AppState>,
    form: web::Form<TextQueryForm>,
) -> Result<HttpResponse, Error> {
    let user_id = form.user_id.as_deref().unwrap_or(DEFAULT_USER);
    let response = state
        .composer
        .process_text_query(&form.query, user_id, form.location.as_deref())
        .await;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Deserialize)]
struct VoiceQueryForm {
    audio_data: String,
    location: Option<String>,
    user_id: Option<String>,
}

async fn voice_query(
    state: web::Data<AppState>,
    form: web::Form<VoiceQueryForm>,
) -> Result<HttpResponse, Error> {
    let user_id = form.user_id.as_deref().unwrap_or(DEFAULT_USER);
    let response = state
        .composer
        .process_voice_query(&form.audio_data, user_id, form.location.as_deref())
        .await;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: Option<String>,
    limit: Option<usize>,
}

async fn get_user_profile(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let user_id = query.user_id.as_deref().unwrap_or(DEFAULT_USER);
    match state.profiles.get_user_profile(user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "profile": profile,
            "request_id": request_id
        }))),
        Err(e) => {
            error!(%request_id, user_id, "Profile lookup failed: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
                "request_id": request_id
            })))
        }
    }
}

async fn update_user_preferences(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
    body: web::Json<PreferencesUpdate>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let user_id = query.user_id.as_deref().unwrap_or(DEFAULT_USER);
    let updated = state.composer.update_user_preferences(user_id, &body).await;
    if updated {
        Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Preferences updated",
            "request_id": request_id
        })))
    } else {
        Ok(HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": "Failed to update preferences",
            "request_id": request_id
        })))
    }
}

async fn get_user_sessions(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let user_id = query.user_id.as_deref().unwrap_or(DEFAULT_USER);
    let limit = query.limit.unwrap_or(DEFAULT_SESSION_LIMIT);
    match state.profiles.recent_sessions(user_id, limit).await {
        Ok(sessions) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "count": sessions.len(),
            "sessions": sessions,
            "request_id": request_id
        }))),
        Err(e) => {
            error!(%request_id, user_id, "Session lookup failed: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
                "request_id": request_id
            })))
        }
    }
}

#[derive(Deserialize)]
struct TrendsQuery {
    query: Option<String>,
    max_results: Option<usize>,
}

async fn get_trends(
    state: web::Data<AppState>,
    query: web::Query<TrendsQuery>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let search = query.query.as_deref().unwrap_or(DEFAULT_TREND_QUERY);
    let max_results = query.max_results.unwrap_or(DEFAULT_TREND_RESULTS);

    match state.trend.search_trending_styles(search, max_results).await {
        Ok(trends) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "trends": trends,
            "request_id": request_id
        }))),
        Err(e) => {
            error!(%request_id, "Trend search failed: {e}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "error": e.to_string(),
                "request_id": request_id
            })))
        }
    }
}

#[derive(Deserialize)]
struct DirectionsQuery {
    origin: String,
    destination: String,
    mode: Option<String>,
}

/// A failing directions provider degrades to the fallback route rather than
/// failing the request.
async fn get_directions(
    state: web::Data<AppState>,
    query: web::Query<DirectionsQuery>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let mode = query.mode.as_deref().unwrap_or("driving");

    let directions = match state
        .geo
        .directions(&query.origin, &query.destination, mode)
        .await
    {
        Ok(directions) => directions,
        Err(e) => {
            warn!(%request_id, "Directions lookup failed, serving fallback: {e}");
            fallback_directions()
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "directions": directions,
        "request_id": request_id
    })))
}

#[derive(Deserialize)]
struct ArtworkSearchQuery {
    query: String,
    k: Option<usize>,
}

async fn search_artwork(
    state: web::Data<AppState>,
    query: web::Query<ArtworkSearchQuery>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let keywords: Vec<String> = query
        .query
        .split_whitespace()
        .map(|w| w.to_string())
        .collect();
    let artworks = state
        .catalog
        .search_by_keywords(&keywords, query.k.unwrap_or(DEFAULT_SEARCH_RESULTS));

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": artworks.len(),
        "artworks": artworks,
        "request_id": request_id
    })))
}

async fn cache_stats(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let stats = state.invalidation.stats().await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "enabled": state.cache.is_enabled(),
        "stats": stats,
        "request_id": request_id
    })))
}

#[derive(Deserialize)]
struct InvalidateUserRequest {
    user_id: String,
    domains: Option<Vec<String>>,
}

async fn invalidate_user_cache(
    state: web::Data<AppState>,
    body: web::Json<InvalidateUserRequest>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();

    let domains = match &body.domains {
        Some(names) => {
            let mut parsed = Vec::new();
            for name in names {
                match domain_from_prefix(name) {
                    Some(domain) => parsed.push(domain),
                    None => {
                        return Ok(HttpResponse::BadRequest().json(json!({
                            "success": false,
                            "error": format!("Unknown cache domain '{name}'"),
                            "request_id": request_id
                        })))
                    }
                }
            }
            Some(parsed)
        }
        None => None,
    };

    let removed = state
        .invalidation
        .invalidate_user(&body.user_id, domains.as_deref())
        .await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "invalidated": removed,
        "request_id": request_id
    })))
}

#[derive(Deserialize)]
struct InvalidateStaleRequest {
    domain: String,
    max_age_secs: u64,
}

async fn invalidate_stale_cache(
    state: web::Data<AppState>,
    body: web::Json<InvalidateStaleRequest>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let Some(domain) = domain_from_prefix(&body.domain) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": format!("Unknown cache domain '{}'", body.domain),
            "request_id": request_id
        })));
    };

    let removed = state
        .invalidation
        .invalidate_stale(domain, Duration::from_secs(body.max_age_secs))
        .await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "invalidated": removed,
        "request_id": request_id
    })))
}

#[derive(Deserialize)]
struct WarmUpRequest {
    user_id: String,
    styles: Option<Vec<String>>,
}

async fn warm_up_cache(
    state: web::Data<AppState>,
    body: web::Json<WarmUpRequest>,
) -> Result<HttpResponse, Error> {
    let request_id = generate_request_id();
    let warmed = state
        .invalidation
        .warm_up(&body.user_id, body.styles.as_deref(), state.trend.as_ref())
        .await;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "warmed": warmed,
        "request_id": request_id
    })))
}

fn domain_from_prefix(name: &str) -> Option<CacheDomain> {
    CacheDomain::ALL.into_iter().find(|d| d.prefix() == name)
}

pub fn start_api_server(
    config: &AppConfig,
    state: AppState,
) -> impl std::future::Future<Output = std::io::Result<()>> {
    let bind_addr = config.bind_addr();
    let state_data = web::Data::new(state);

    let http_server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::AUTHORIZATION,
            ])
            .max_age(3600);

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .route("/", web::get().to(root_handler))
            .route("/health", web::get().to(health_check))
            .route("/api/analyze-room", web::post().to(analyze_room))
            .route("/api/text-query", web::post().to(text_query))
            .route("/api/voice-query", web::post().to(voice_query))
            .route("/api/user-profile", web::get().to(get_user_profile))
            .route("/api/user-profile", web::put().to(update_user_preferences))
            .route("/api/user-sessions", web::get().to(get_user_sessions))
            .route("/api/trends", web::get().to(get_trends))
            .route("/api/directions", web::get().to(get_directions))
            .route("/api/artwork/search", web::get().to(search_artwork))
            .route("/admin/cache/stats", web::get().to(cache_stats))
            .route("/admin/cache/warm-up", web::post().to(warm_up_cache))
            .route(
                "/admin/cache/invalidate/user",
                web::post().to(invalidate_user_cache),
            )
            .route(
                "/admin/cache/invalidate/stale",
                web::post().to(invalidate_stale_cache),
            )
    });

    http_server
        .bind(bind_addr.clone())
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", bind_addr, e))
        .run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_short_and_unique() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn domain_prefix_lookup() {
        assert_eq!(
            domain_from_prefix("trend_data"),
            Some(CacheDomain::TrendData)
        );
        assert!(domain_from_prefix("bogus").is_none());
    }
}
