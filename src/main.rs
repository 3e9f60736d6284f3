use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use mongodb::Client;
use splitledger::auth::TokenKeys;
use splitledger::config::{CorsConfig, LogConfig, Settings};
use splitledger::handlers;
use splitledger::schemas::{Expense, Group, User};
use splitledger::service::LedgerService;
use splitledger::store::MongoRepository;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cors(config: &CorsConfig) -> Cors {
    if config.origins.iter().any(|o| o == "*") {
        return Cors::permissive();
    }
    config
        .origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env().expect("Failed to load configuration");
    init_tracing(&settings.log);
    if let Err(reason) = settings.validate() {
        panic!("Invalid configuration: {reason}");
    }

    let tokens = TokenKeys::new(
        &settings.auth.secret_key,
        settings.auth.access_token_expire_minutes,
    );

    let service = match &settings.database.uri {
        Some(uri) => {
            let client = Client::with_uri_str(uri).await.expect("failed to connect");
            info!(database = %settings.database.name, "Connected to MongoDB");
            let name = &settings.database.name;
            LedgerService::new(
                Arc::new(MongoRepository::<User>::new(&client, name, "Users", "username")),
                Arc::new(MongoRepository::<Group>::new(&client, name, "Groups", "id")),
                Arc::new(MongoRepository::<Expense>::new(&client, name, "Expenses", "id")),
                tokens,
            )
        }
        None => {
            warn!("MONGODB_URI is not set, keeping all data in memory");
            LedgerService::in_memory(tokens)
        }
    };
    let service = web::Data::new(Arc::new(service));

    let bind = (settings.server.host.clone(), settings.server.port);
    info!(host = %bind.0, port = bind.1, "Starting SplitLedger");

    let cors_config = settings.cors.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors(&cors_config))
            .app_data(service.clone())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}
