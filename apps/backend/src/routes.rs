use actix_web::web;

use crate::ws::session::ws_upgrade;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(crate::health::configure)
        .route("/ws", web::get().to(ws_upgrade));
}
