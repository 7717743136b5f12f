//! Live-update hub.
//!
//! Connected clients join a per-patient group and receive
//! fire-and-forget JSON events (service updates, care-level changes)
//! pushed by the API handlers. No ordering or delivery guarantee is
//! provided; clients refetch on reconnect.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::{debug, info};

use crate::api::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Text frame pushed to a session.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Event(pub String);

#[derive(Message)]
#[rtype(usize)]
pub struct Connect {
    pub addr: Recipient<Event>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: usize,
}

/// Start watching one patient's group. A session watches at most one
/// patient; joining again moves it.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Join {
    pub id: usize,
    pub patient_id: String,
}

/// Broadcast a payload to everyone watching a patient.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Publish {
    pub patient_id: String,
    pub payload: serde_json::Value,
}

pub struct LiveServer {
    sessions: HashMap<usize, Recipient<Event>>,
    groups: HashMap<String, HashSet<usize>>,
    rng: ThreadRng,
}

impl LiveServer {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            groups: HashMap::new(),
            rng: rand::thread_rng(),
        }
    }

    fn broadcast(&self, patient_id: &str, message: &str) {
        if let Some(members) = self.groups.get(patient_id) {
            for id in members {
                if let Some(addr) = self.sessions.get(id) {
                    addr.do_send(Event(message.to_owned()));
                }
            }
        }
    }

    fn leave_all(&mut self, id: usize) {
        for members in self.groups.values_mut() {
            members.remove(&id);
        }
    }
}

impl Default for LiveServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for LiveServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for LiveServer {
    type Result = usize;

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) -> Self::Result {
        let id = self.rng.gen::<usize>();
        self.sessions.insert(id, msg.addr);
        debug!("live session {} connected", id);
        id
    }
}

impl Handler<Disconnect> for LiveServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        self.sessions.remove(&msg.id);
        self.leave_all(msg.id);
        debug!("live session {} disconnected", msg.id);
    }
}

impl Handler<Join> for LiveServer {
    type Result = ();

    fn handle(&mut self, msg: Join, _: &mut Context<Self>) {
        self.leave_all(msg.id);
        self.groups
            .entry(msg.patient_id.clone())
            .or_default()
            .insert(msg.id);
        info!("live session {} watching patient {}", msg.id, msg.patient_id);
    }
}

impl Handler<Publish> for LiveServer {
    type Result = ();

    fn handle(&mut self, msg: Publish, _: &mut Context<Self>) {
        self.broadcast(&msg.patient_id, &msg.payload.to_string());
    }
}

/// One WebSocket connection.
pub struct LiveSession {
    id: usize,
    hb: Instant,
    server: Addr<LiveServer>,
}

impl LiveSession {
    pub fn new(server: Addr<LiveServer>) -> Self {
        Self {
            id: 0,
            hb: Instant::now(),
            server,
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                act.server.do_send(Disconnect { id: act.id });
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for LiveSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        let addr = ctx.address();
        self.server
            .send(Connect {
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => act.id = id,
                    _ => ctx.stop(),
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server.do_send(Disconnect { id: self.id });
        Running::Stop
    }
}

impl Handler<Event> for LiveSession {
    type Result = ();

    fn handle(&mut self, msg: Event, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for LiveSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(_) => {
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(bytes) => {
                self.hb = Instant::now();
                ctx.pong(&bytes);
            }
            ws::Message::Pong(_) => {
                self.hb = Instant::now();
            }
            ws::Message::Text(text) => {
                // The only client command: "join:<patient_id>".
                if let Some(patient_id) = text.trim().strip_prefix("join:") {
                    self.server.do_send(Join {
                        id: self.id,
                        patient_id: patient_id.to_owned(),
                    });
                }
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// `GET /ws` upgrade endpoint.
pub async fn ws_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    ws::start(LiveSession::new(state.live.clone()), &req, stream)
}
