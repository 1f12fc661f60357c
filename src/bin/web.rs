//! Single binary web host: JSON API over the matchmaking engine with in-memory sessions.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use court_matchmaker::{
    add_players, advance_phase, assign_next_for_court, begin_match, cancel_match,
    choose_rotation_pair, create_session, finish_match, parse_roster, propose_for_session,
    remove_player, reset_all, reset_pairing, reset_table_stats, set_player_avatar, start_session,
    update_match_score,
    CourtId, FinishMatch, MatchId, MemoryStore, PairingWarning, PlayerId, SessionConfig,
    SessionError, SessionId, SessionStore, TeamId,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shared in-memory store. Sessions are removed after 12h inactivity.
type AppState = Data<MemoryStore>;

/// Inactivity threshold: sessions not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct AddPlayersBody {
    /// Pasted roster text: comma, newline or space separated names.
    text: String,
}

#[derive(Deserialize)]
struct ScoreBody {
    score_a: u32,
    score_b: u32,
}

#[derive(Deserialize)]
struct PairBody {
    pair: [PlayerId; 2],
}

#[derive(Deserialize)]
struct AvatarBody {
    /// Image reference (e.g. a data URL); null or empty clears it.
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Deserialize)]
struct ResetBody {
    #[serde(default)]
    keep_names: bool,
}

#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[derive(Deserialize)]
struct SessionPlayerPath {
    id: SessionId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct SessionCourtPath {
    id: SessionId,
    court_id: CourtId,
}

#[derive(Deserialize)]
struct SessionMatchPath {
    id: SessionId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct SessionTeamPath {
    id: SessionId,
    team_id: TeamId,
}

fn error_response(e: SessionError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        SessionError::SessionNotFound(_)
        | SessionError::PlayerNotFound(_)
        | SessionError::TeamNotFound(_)
        | SessionError::MatchNotFound(_)
        | SessionError::CourtNotFound(_) => HttpResponse::NotFound().json(body),
        SessionError::LockPoisoned => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

/// Respond with the session's current record, or the error.
fn session_response(store: &MemoryStore, id: SessionId, result: Result<(), SessionError>) -> HttpResponse {
    match result.and_then(|()| store.snapshot(id)) {
        Ok(rec) => HttpResponse::Ok().json(rec),
        Err(e) => error_response(e),
    }
}

fn warnings_response(store: &MemoryStore, id: SessionId, result: Result<Vec<PairingWarning>, SessionError>) -> HttpResponse {
    let warnings = match result {
        Ok(w) => w.iter().map(ToString::to_string).collect::<Vec<_>>(),
        Err(e) => return error_response(e),
    };
    match store.snapshot(id) {
        Ok(rec) => HttpResponse::Ok().json(serde_json::json!({ "warnings": warnings, "session": rec })),
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "court-matchmaker",
    })
}

/// Create a new session (returns it with id; client stores id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState, body: Option<Json<SessionConfig>>) -> HttpResponse {
    let config = body.map(Json::into_inner).unwrap_or_default();
    match create_session(state.get_ref(), config) {
        Ok(id) => session_response(&state, id, Ok(())),
        Err(e) => error_response(e),
    }
}

/// Get a session by id (404 if not found). Touching it refreshes last activity.
#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    session_response(&state, path.id, Ok(()))
}

/// Add players from pasted text (roster must be unlocked).
#[post("/api/sessions/{id}/players")]
async fn api_add_players(state: AppState, path: Path<SessionPath>, body: Json<AddPlayersBody>) -> HttpResponse {
    let names = parse_roster(&body.text);
    let result = add_players(state.get_ref(), path.id, &names).map(|_| ());
    session_response(&state, path.id, result)
}

/// Remove a player by id (roster must be unlocked).
#[delete("/api/sessions/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<SessionPlayerPath>) -> HttpResponse {
    let result = remove_player(state.get_ref(), path.id, path.player_id);
    session_response(&state, path.id, result)
}

#[put("/api/sessions/{id}/players/{player_id}/avatar")]
async fn api_set_avatar(state: AppState, path: Path<SessionPlayerPath>, body: Json<AvatarBody>) -> HttpResponse {
    let result = set_player_avatar(state.get_ref(), path.id, path.player_id, body.into_inner().avatar);
    session_response(&state, path.id, result)
}

/// Lock the roster and build teams.
#[post("/api/sessions/{id}/start")]
async fn api_start_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let result = start_session(state.get_ref(), path.id);
    warnings_response(&state, path.id, result)
}

/// Preview the next match without assigning it.
#[get("/api/sessions/{id}/proposal")]
async fn api_proposal(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    match propose_for_session(state.get_ref(), path.id) {
        Ok(proposal) => HttpResponse::Ok().json(serde_json::json!({ "proposal": proposal })),
        Err(e) => error_response(e),
    }
}

/// Fill an idle court with the next match.
#[post("/api/sessions/{id}/courts/{court_id}/assign")]
async fn api_assign_court(state: AppState, path: Path<SessionCourtPath>) -> HttpResponse {
    let outcome = match assign_next_for_court(state.get_ref(), path.id, path.court_id) {
        Ok(o) => o,
        Err(e) => return error_response(e),
    };
    match state.snapshot(path.id) {
        Ok(rec) => HttpResponse::Ok().json(serde_json::json!({ "assignment": outcome, "session": rec })),
        Err(e) => error_response(e),
    }
}

#[post("/api/sessions/{id}/matches/{match_id}/begin")]
async fn api_begin_match(state: AppState, path: Path<SessionMatchPath>) -> HttpResponse {
    let result = begin_match(state.get_ref(), path.id, path.match_id);
    session_response(&state, path.id, result)
}

/// Cancel a match; both teams go back to the queue.
#[post("/api/sessions/{id}/matches/{match_id}/cancel")]
async fn api_cancel_match(state: AppState, path: Path<SessionMatchPath>) -> HttpResponse {
    let result = cancel_match(state.get_ref(), path.id, path.match_id);
    session_response(&state, path.id, result)
}

/// Record a result, then let the phase controller move to bracket if coverage is done.
#[post("/api/sessions/{id}/matches/{match_id}/finish")]
async fn api_finish_match(state: AppState, path: Path<SessionMatchPath>, body: Json<FinishMatch>) -> HttpResponse {
    let store = state.get_ref();
    let result = finish_match(store, path.id, path.match_id, body.into_inner())
        .and_then(|()| advance_phase(store, path.id).map(|_| ()));
    session_response(&state, path.id, result)
}

#[put("/api/sessions/{id}/matches/{match_id}/score")]
async fn api_update_score(state: AppState, path: Path<SessionMatchPath>, body: Json<ScoreBody>) -> HttpResponse {
    let result = update_match_score(state.get_ref(), path.id, path.match_id, body.score_a, body.score_b);
    session_response(&state, path.id, result)
}

/// Choose which two members of a 3-player team play next.
#[put("/api/sessions/{id}/teams/{team_id}/pair")]
async fn api_choose_pair(state: AppState, path: Path<SessionTeamPath>, body: Json<PairBody>) -> HttpResponse {
    let result = choose_rotation_pair(state.get_ref(), path.id, path.team_id, body.pair);
    session_response(&state, path.id, result)
}

/// Re-pair players avoiding past teammates.
#[post("/api/sessions/{id}/reset-pairing")]
async fn api_reset_pairing(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let result = reset_pairing(state.get_ref(), path.id);
    warnings_response(&state, path.id, result)
}

#[post("/api/sessions/{id}/reset-stats")]
async fn api_reset_stats(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let result = reset_table_stats(state.get_ref(), path.id);
    session_response(&state, path.id, result)
}

/// Full reset back to an unlocked session.
#[post("/api/sessions/{id}/reset")]
async fn api_reset_all(state: AppState, path: Path<SessionPath>, body: Option<Json<ResetBody>>) -> HttpResponse {
    let keep_names = body.map(|b| b.keep_names).unwrap_or(false);
    let result = reset_all(state.get_ref(), path.id, keep_names);
    session_response(&state, path.id, result)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(MemoryStore::new());

    // Background task: every 30 minutes, remove sessions inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            match state_cleanup.purge_inactive(INACTIVITY_TIMEOUT) {
                Ok(0) => {}
                Ok(removed) => log::info!("Cleaned up {} inactive session(s) (no activity for 12h)", removed),
                Err(e) => log::error!("Session cleanup failed: {}", e),
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_add_players)
            .service(api_remove_player)
            .service(api_set_avatar)
            .service(api_start_session)
            .service(api_proposal)
            .service(api_assign_court)
            .service(api_begin_match)
            .service(api_cancel_match)
            .service(api_finish_match)
            .service(api_update_score)
            .service(api_choose_pair)
            .service(api_reset_pairing)
            .service(api_reset_stats)
            .service(api_reset_all)
    })
    .bind(bind)?
    .run()
    .await
}
