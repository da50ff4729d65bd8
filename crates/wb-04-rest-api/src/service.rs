//! # REST Service
//!
//! Builds the router and serves it until shutdown is signalled.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use shared_types::NodeClient;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use wb_01_bill_store::BillStore;

use crate::domain::{RestConfig, RestConfigError};
use crate::handlers::{self, AppState};

/// The wallet-backend REST API.
pub struct RestService<S: BillStore + 'static> {
    state: AppState<S>,
}

impl<S: BillStore + 'static> RestService<S> {
    pub fn new(
        store: Arc<S>,
        client: Arc<dyn NodeClient>,
        config: RestConfig,
    ) -> Result<Self, RestConfigError> {
        config.validate()?;
        Ok(Self {
            state: AppState {
                store,
                client,
                config: Arc::new(config),
            },
        })
    }

    /// Router with every endpoint and the middleware stack.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .expose_headers([header::LINK]);
        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/v1/list-bills", get(handlers::list_bills::<S>))
            .route("/api/v1/balance", get(handlers::balance::<S>))
            .route("/api/v1/units/:unit_id", get(handlers::get_unit::<S>))
            .route(
                "/api/v1/units/:unit_id/transactions/:tx_hash/proof",
                get(handlers::get_proof::<S>),
            )
            .route(
                "/api/v1/fee-credit-bills/:unit_id",
                get(handlers::get_fee_credit_bill::<S>),
            )
            .route(
                "/api/v1/locked-fee-credit/:system_id/:unit_id",
                get(handlers::get_locked_fee_credit::<S>),
            )
            .route(
                "/api/v1/closed-fee-credit/:unit_id",
                get(handlers::get_closed_fee_credit::<S>),
            )
            .route("/api/v1/round-number", get(handlers::round_number::<S>))
            .route("/api/v1/info", get(handlers::info::<S>))
            .route("/api/v1/tx-history/:pubkey", get(handlers::tx_history::<S>))
            .route(
                "/api/v1/transactions/:pubkey",
                post(handlers::submit_transactions::<S>),
            )
            .layer(DefaultBodyLimit::max(self.state.config.max_body_bytes))
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Serve on `listener` until `shutdown` flips to `true`.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        info!("[wb-04] REST API listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                while !*shutdown.borrow() {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;
        info!("[wb-04] REST API stopped");
        Ok(())
    }
}
