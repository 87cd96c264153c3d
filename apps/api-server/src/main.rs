//! api-server — HTTP front end for the Pet Clinic pet forms.
//!
//! Serves the pet creation and edit forms below `/owners/{ownerId}` plus the
//! owner details page they redirect to. Supports local dev with:
//! - Storage: In-memory (default) or SQLite (file) when the `sqlite` feature is enabled.
//! - Logging: pretty or JSON via LOG_FORMAT, filtered with RUST_LOG.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # persist to a SQLite file
//! STORAGE_PROVIDER=sqlite DB_PATH=./data/petclinic.db cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;
mod error;
mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use domain::adapters::memory_repo::{InMemoryOwnerRepo, InMemoryPetRepo};
use domain::service::{FormOutcome, PetService};
use domain::validate::PetForm;
use domain::{CoreError, Owner, OwnerId, OwnerRepository, Pet, PetId, PetRepository, PetType};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::ApiError;

type ClinicService = PetService<Arc<dyn PetRepository>, Arc<dyn OwnerRepository>>;

#[derive(Clone)]
struct AppState {
    service: Arc<ClinicService>,
}

// Repository pair selected from config and feature flags.
struct Repos {
    pets: Arc<dyn PetRepository>,
    owners: Arc<dyn OwnerRepository>,
}

impl Repos {
    fn memory() -> Self {
        Self {
            pets: Arc::new(InMemoryPetRepo::new()),
            owners: Arc::new(InMemoryOwnerRepo::new()),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        let store = sqlite_adapter::SqliteRepo::open_creating_dirs(path)?;
        Ok(Self {
            pets: Arc::new(store.pets()),
            owners: Arc::new(store.owners()),
        })
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let repos = match build_repos(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, provider = ?cfg.storage_provider, "storage unavailable");
            std::process::exit(1);
        }
    };
    if cfg.seed_demo_data {
        if let Err(e) = seed_demo_data(&repos) {
            error!(err = ?e, "seeding demo data failed");
        }
    }
    let state = AppState {
        service: Arc::new(PetService::new(repos.pets, repos.owners)),
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pet-types", get(list_pet_types))
        .route("/owners/:owner_id", get(show_owner))
        .route(
            "/owners/:owner_id/pets/new",
            get(init_creation_form).post(process_creation_form),
        )
        .route(
            "/owners/:owner_id/pets/:pet_id/edit",
            get(init_update_form).post(process_update_form),
        )
        .with_state(state)
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the repositories based on config and feature flags.
//
// An explicitly requested SQLite store that cannot be opened is an error; the
// server never silently drops to memory.
fn build_repos(cfg: &config::Config) -> Result<Repos, CoreError> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => {
            let repos = Repos::sqlite(&cfg.db_path)?;
            info!(path = %cfg.db_path.display(), "using sqlite storage");
            Ok(repos)
        }
        #[cfg(not(feature = "sqlite"))]
        config::StorageProvider::Sqlite => Err(CoreError::Repository(
            "STORAGE_PROVIDER=sqlite but the server was built without the `sqlite` feature"
                .into(),
        )),
        config::StorageProvider::Memory => Ok(Repos::memory()),
    }
}

/// Insert the demo owner (and a first pet) unless it already exists.
fn seed_demo_data(repos: &Repos) -> Result<(), CoreError> {
    let id = OwnerId::new("1")?;
    if repos.owners.find_by_id(&id)?.is_some() {
        return Ok(());
    }
    let mut owner = Owner::new(id.clone(), "George", "Franklin");
    owner.address = "110 W. Liberty St.".into();
    owner.city = "Madison".into();
    owner.telephone = "6085551023".into();
    repos.owners.save(owner)?;

    let mut leo = Pet::new(id);
    leo.name = "Leo".into();
    leo.pet_type = Some(PetType::Cat);
    repos.pets.save(leo)?;
    info!("seeded demo owner 1");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn list_pet_types() -> Json<Vec<PetType>> {
    Json(ClinicService::pet_types())
}

async fn show_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let owner = state.service.find_owner(&OwnerId::new(owner_id)?)?;
    let pets = state.service.owner_pets(&owner)?;
    Ok(Html(views::render_owner_details(&owner, &pets)))
}

async fn init_creation_form(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let owner = state.service.find_owner(&OwnerId::new(owner_id)?)?;
    let view = state.service.init_creation_form(owner);
    Ok(Html(views::render_pet_form(&view)))
}

async fn process_creation_form(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    Form(form): Form<PetForm>,
) -> Result<Response, ApiError> {
    let owner = state.service.find_owner(&OwnerId::new(owner_id)?)?;
    let outcome = state.service.process_creation_form(owner, &form)?;
    Ok(render_outcome(outcome, "create"))
}

async fn init_update_form(
    State(state): State<AppState>,
    Path((owner_id, pet_id)): Path<(String, String)>,
) -> Result<Html<String>, ApiError> {
    let owner = state.service.find_owner(&OwnerId::new(owner_id)?)?;
    let view = state.service.init_update_form(owner, &PetId::new(pet_id)?)?;
    Ok(Html(views::render_pet_form(&view)))
}

async fn process_update_form(
    State(state): State<AppState>,
    Path((owner_id, pet_id)): Path<(String, String)>,
    Form(form): Form<PetForm>,
) -> Result<Response, ApiError> {
    let owner = state.service.find_owner(&OwnerId::new(owner_id)?)?;
    let outcome = state
        .service
        .process_update_form(owner, PetId::new(pet_id)?, &form)?;
    Ok(render_outcome(outcome, "update"))
}

fn render_outcome(outcome: FormOutcome, action: &'static str) -> Response {
    match outcome {
        FormOutcome::Redisplay(view) => {
            let fields: Vec<_> = view.errors.errors().iter().map(|e| e.field).collect();
            info!(action, owner_id = %view.owner.id.as_str(), ?fields, "pet form rejected");
            Html(views::render_pet_form(&view)).into_response()
        }
        FormOutcome::RedirectToOwner(owner_id) => {
            info!(action, owner_id = %owner_id.as_str(), "pet saved");
            Redirect::to(&http_common::owner_path(owner_id.as_str())).into_response()
        }
    }
}
