use actix::Actor;
use actix_web::{web, App, HttpServer};
use duel21_backend::{cors_middleware, routes, telemetry, AppState, LobbyServer, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "🚀 Starting Duel21 Backend on http://{}:{}",
        config.host, config.port
    );

    let lobby = LobbyServer::new().start();
    let data = web::Data::new(AppState::with_defaults(lobby));

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
