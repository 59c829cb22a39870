use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::SyncError;
use crate::models::{AppState, ChessWebSocketMessage, ClientMessage, ConnectionId};
use crate::websocket::sink::{ActorSink, ClientSink};

/// WebSocket actor for one client connection
pub struct ChessWebSocket {
    pub id: ConnectionId,
    pub app_state: web::Data<AppState>,
    sink: Option<Arc<dyn ClientSink>>,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        Self {
            id: ConnectionId::new(),
            app_state,
            sink: None,
        }
    }

    fn handle_text(&self, text: &str) {
        let Some(sink) = self.sink.as_ref() else {
            warn!("Message on {} before the connection started", self.id);
            return;
        };
        let sync = &self.app_state.sync;
        match ClientMessage::parse(text) {
            Ok(msg) => {
                debug!("Message for game {} on {}", msg.game_id(), self.id);
                sync.dispatch(self.id, sink, msg)
            }
            Err(err) => sync.report(self.id, sink.as_ref(), &err),
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient();
        self.sink = Some(Arc::new(ActorSink::new(recipient)));
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.app_state.sync.handle_disconnect(self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!(
            "Active connections in rooms: {}",
            self.app_state.sync.registry().connection_count()
        );
        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                self.handle_text(&text);
            }
            Ok(ws::Message::Binary(_)) => {
                if let Some(sink) = self.sink.as_ref() {
                    let err =
                        SyncError::MalformedMessage("binary frames are not supported".to_string());
                    self.app_state.sync.report(self.id, sink.as_ref(), &err);
                }
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection {} closed: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("Protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state.clone());
    info!("New WebSocket connection: {}", ws.id);
    ws::start(ws, &req, stream)
}
