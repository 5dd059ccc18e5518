use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

use crate::hub::GameHub;
use crate::websocket::ConnectQuery;
use game_types::Phase;

pub mod config;
pub mod hub;
pub mod session;
pub mod websocket;

#[derive(Serialize)]
struct CreateRoomResponse {
    room_code: String,
    invite_link: String,
}

#[derive(Serialize)]
struct RoomSummary {
    room_code: String,
    player_count: usize,
    phase: Phase,
    can_join: bool,
}

#[derive(Serialize)]
struct RoomExistsResponse {
    exists: bool,
}

#[derive(Serialize)]
struct StatsResponse {
    active_games: usize,
    total_players: usize,
}

pub fn create_routes(
    hub: Arc<GameHub>,
    reconnect_grace_period: Duration,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let hub_filter = warp::any().map({
        let hub = hub.clone();
        move || hub.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(warp::query::<ConnectQuery>())
        .and(hub_filter.clone())
        .map(move |ws: warp::ws::Ws, query: ConnectQuery, hub: Arc<GameHub>| {
            ws.on_upgrade(move |socket| {
                websocket::handle_connection(socket, query, hub, reconnect_grace_period)
            })
        });

    // Health check endpoint
    let health = warp::path!("api" / "health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    // Room creation endpoint
    let create_room = warp::path!("api" / "rooms")
        .and(warp::post())
        .and(warp::header::optional::<String>("host"))
        .and(hub_filter.clone())
        .and_then(handle_create_room);

    // Room summary endpoint - used by the join screen
    let get_room = warp::path!("api" / "rooms" / String)
        .and(warp::get())
        .and(hub_filter.clone())
        .and_then(handle_get_room);

    // Room existence probe
    let room_exists = warp::path!("api" / "rooms" / String / "exists")
        .and(warp::get())
        .and(hub_filter.clone())
        .and_then(handle_room_exists);

    // Stats endpoint
    let stats = warp::path!("api" / "stats")
        .and(warp::get())
        .and(hub_filter.clone())
        .and_then(handle_stats);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    websocket
        .or(create_room)
        .or(room_exists)
        .or(get_room)
        .or(health)
        .or(stats)
        .with(cors)
        .with(warp::log("imposter_server"))
}

async fn handle_create_room(
    host_header: Option<String>,
    hub: Arc<GameHub>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match hub.create_game().await {
        Ok(session) => {
            let room_code = session.room_code().clone();
            let invite_link = match host_header {
                Some(host) => format!("http://{}/join/{}", host, room_code),
                None => format!("/join/{}", room_code),
            };

            Ok(warp::reply::with_status(
                warp::reply::json(&CreateRoomResponse {
                    room_code,
                    invite_link,
                }),
                warp::http::StatusCode::OK,
            ))
        }
        Err(e) => {
            tracing::error!("failed to create room: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to create room"
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_get_room(
    room_code: String,
    hub: Arc<GameHub>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match hub.get_session(&room_code.to_uppercase()).await {
        Ok(session) => Ok(warp::reply::with_status(
            warp::reply::json(&RoomSummary {
                room_code: session.room_code().clone(),
                player_count: session.player_count().await,
                phase: session.phase().await,
                can_join: session.can_join().await,
            }),
            warp::http::StatusCode::OK,
        )),
        Err(_) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Room not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}

async fn handle_room_exists(
    room_code: String,
    hub: Arc<GameHub>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let exists = hub.get_session(&room_code.to_uppercase()).await.is_ok();
    Ok(warp::reply::json(&RoomExistsResponse { exists }))
}

async fn handle_stats(hub: Arc<GameHub>) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&StatsResponse {
        active_games: hub.session_count().await,
        total_players: hub.total_player_count().await,
    }))
}
