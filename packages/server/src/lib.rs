#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for parcel map lookups.
//!
//! Serves `GET /api/properties/{id}/parcel`, which resolves a caller's
//! saved property to a `GeoJSON` `FeatureCollection` of parcels (and LUPC
//! zoning districts in unorganized territory). Upstream services are
//! configured by the parcel service registry; saved properties come from
//! a TOML [`property_directory`].

mod handlers;
pub mod property_directory;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use parcel_map_parcel::service_registry::{self, RegistryError};
use parcel_map_parcel::ParcelResolver;
use property_directory::{DirectoryError, PropertyDirectory, TomlPropertyDirectory};
use thiserror::Error;

pub use handlers::USER_ID_HEADER;

/// Default location of the saved-properties file.
pub const DEFAULT_PROPERTIES_PATH: &str = "data/properties.toml";

/// Shared application state.
pub struct AppState {
    /// Parcel resolver over the configured upstream services.
    pub resolver: Arc<ParcelResolver>,
    /// Saved properties and their owners.
    pub properties: Arc<dyn PropertyDirectory>,
}

/// Errors starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Service configuration could not be loaded.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The properties file could not be loaded.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// The listener could not be bound, or the server failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route(
                "/properties/{id}/parcel",
                web::get().to(handlers::property_parcel),
            ),
    );
}

/// Starts the parcel map API server.
///
/// Loads the service configuration (`PARCEL_SERVICES_CONFIG` or the
/// embedded default), the saved properties (`PROPERTIES_PATH`), and
/// binds to `BIND_ADDR`:`PORT`. This is a regular async function; the
/// caller provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if configuration or properties cannot be
/// loaded, or if the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = service_registry::from_env()?;
    log::info!("Using parcel services '{}' ({})", config.id, config.name);
    let resolver = ParcelResolver::from_config(&config)?;

    let properties_path = PathBuf::from(
        std::env::var("PROPERTIES_PATH").unwrap_or_else(|_| DEFAULT_PROPERTIES_PATH.to_string()),
    );
    let properties = TomlPropertyDirectory::load(&properties_path)?;

    let state = web::Data::new(AppState {
        resolver: Arc::new(resolver),
        properties: Arc::new(properties),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use parcel_map_arcgis::{ArcGisError, FeatureQuery, FeatureService, FeatureSet, RawFeature};
    use parcel_map_geocoder::{AddressLocator, GeocodeError};
    use parcel_map_parcel_models::GeocodeCandidate;

    use super::*;

    struct NoLocator;

    #[async_trait]
    impl AddressLocator for NoLocator {
        async fn find_best_candidate(
            &self,
            _single_line: &str,
        ) -> Result<Option<GeocodeCandidate>, GeocodeError> {
            Ok(None)
        }
    }

    enum Layer {
        OneParcel,
        Empty,
        Down,
    }

    struct MockLayer {
        behavior: Layer,
        calls: AtomicUsize,
    }

    impl MockLayer {
        fn new(behavior: Layer) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FeatureService for MockLayer {
        async fn query(&self, _query: &FeatureQuery) -> Result<FeatureSet, ArcGisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Layer::OneParcel => {
                    let serde_json::Value::Object(attributes) = serde_json::json!({
                        "TOWN": "Fort Kent",
                        "MAP_BK_LOT": "021-004",
                        "PROP_LOC": "12 MAIN ST"
                    }) else {
                        unreachable!()
                    };
                    Ok(FeatureSet {
                        features: vec![RawFeature {
                            attributes,
                            rings: vec![vec![
                                [-68.60, 47.25],
                                [-68.59, 47.25],
                                [-68.59, 47.26],
                                [-68.60, 47.25],
                            ]],
                        }],
                        wkid: Some(4326),
                        exceeded_transfer_limit: false,
                    })
                }
                Layer::Empty => Ok(FeatureSet::default()),
                Layer::Down => Err(ArcGisError::Status { status: 503 }),
            }
        }
    }

    const PROPERTIES: &str = r#"
        [[properties]]
        id = "home"
        owner_id = "alice"
        street_address = "12 Main Street"
        city = "Fort Kent"
        state = "ME"

        [[properties]]
        id = "blank"
        owner_id = "alice"
    "#;

    fn state(parcels: Arc<MockLayer>) -> web::Data<AppState> {
        let config = service_registry::service("maine").unwrap();
        let resolver = ParcelResolver::new(
            &config,
            Arc::new(NoLocator),
            parcels,
            MockLayer::new(Layer::Empty),
        );
        web::Data::new(AppState {
            resolver: Arc::new(resolver),
            properties: Arc::new(TomlPropertyDirectory::parse(PROPERTIES).unwrap()),
        })
    }

    macro_rules! app {
        ($parcels:expr) => {
            test::init_service(
                App::new()
                    .app_data(state($parcels))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health() {
        let app = app!(MockLayer::new(Layer::Empty));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], serde_json::json!(true));
    }

    #[actix_web::test]
    async fn requires_caller_id() {
        let parcels = MockLayer::new(Layer::OneParcel);
        let app = app!(parcels.clone());
        let req = test::TestRequest::get()
            .uri("/api/properties/home/parcel")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(parcels.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn other_owners_property_is_not_found() {
        let parcels = MockLayer::new(Layer::OneParcel);
        let app = app!(parcels.clone());
        let req = test::TestRequest::get()
            .uri("/api/properties/home/parcel")
            .insert_header((USER_ID_HEADER, "mallory"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], serde_json::json!(false));
        assert_eq!(body["error"], serde_json::json!("Property not found"));
        assert_eq!(parcels.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn resolves_owned_property() {
        let app = app!(MockLayer::new(Layer::OneParcel));
        let req = test::TestRequest::get()
            .uri("/api/properties/home/parcel")
            .insert_header((USER_ID_HEADER, "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], serde_json::json!(true));
        assert_eq!(body["geojson"]["type"], serde_json::json!("FeatureCollection"));
        assert_eq!(
            body["geojson"]["features"][0]["properties"]["mapBkLot"],
            serde_json::json!("021-004")
        );
        assert_eq!(body["metadata"]["parcelCount"], serde_json::json!(1));
        assert_eq!(body["metadata"]["searchTier"], serde_json::json!("town"));
        assert_eq!(body["metadata"]["geocoded"], serde_json::json!(false));
    }

    #[actix_web::test]
    async fn maps_resolution_errors_to_statuses() {
        let cases = [
            ("blank", Layer::OneParcel, StatusCode::BAD_REQUEST),
            ("home", Layer::Empty, StatusCode::NOT_FOUND),
            ("home", Layer::Down, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (id, behavior, expected) in cases {
            let app = app!(MockLayer::new(behavior));
            let req = test::TestRequest::get()
                .uri(&format!("/api/properties/{id}/parcel"))
                .insert_header((USER_ID_HEADER, "alice"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "{id}");

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], serde_json::json!(false));
            assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
        }
    }
}
