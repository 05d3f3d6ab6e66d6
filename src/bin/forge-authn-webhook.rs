// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! Main webhook executable.
//!
//! This is the entry point of the `forge-authn-webhook` binary.

use axum::extract::DefaultBodyLimit;
use axum::http::{self, HeaderName, Request, header};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Report, Result};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit, ServiceBuilderExt,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, info_span};
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    prelude::*,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use forge_authn_webhook::api;
use forge_authn_webhook::config::Config;
use forge_authn_webhook::forge::ForgeProvider;
use forge_authn_webhook::service::{Service, ServiceState};

// Default body limit 256kB. A TokenReview is tiny; anything bigger is noise.
const DEFAULT_BODY_LIMIT: usize = 1024 * 256;

/// Kubernetes authentication webhook.
///
/// Validates the bearer token of an incoming TokenReview against a
/// project-hosting identity provider and answers with the username and the
/// group claims derived from the provider's group hierarchy.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the config file. Environment variables override file values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level. Repeat to increase level.
    #[arg(short, long, global=true, action = clap::ArgAction::Count, display_order = 920)]
    pub verbose: u8,

    /// Print the `OpenAPI` schema instead of running the webhook.
    #[arg(long)]
    pub dump_openapi: Option<OpenApiFormat>,
}

#[derive(Clone, Debug, Default, PartialEq, ValueEnum)]
enum OpenApiFormat {
    /// Json.
    Json,
    #[default]
    /// Yaml.
    Yaml,
}

// A `MakeRequestId` tagging every review request with a fresh id
#[derive(Clone, Default)]
struct WebhookRequestId {}

impl MakeRequestId for WebhookRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let req_id = Uuid::new_v4().simple().to_string();

        Some(RequestId::new(
            http::HeaderValue::from_str(format!("req-{req_id}").as_str())
                // default to static value. This is not expected to ever happen.
                .unwrap_or_else(|_| http::HeaderValue::from_static("req-unknown")),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    let args = Args::parse();

    let filter = Targets::new().with_default(match args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    });

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    // build the tracing registry
    tracing_subscriber::registry().with(log_layer).init();

    let openapi = api::ApiDoc::openapi();

    let (router, api) = OpenApiRouter::with_openapi(openapi.clone())
        .merge(api::openapi_router())
        .split_for_parts();

    if let Some(dump_format) = &args.dump_openapi {
        println!(
            "{}",
            match dump_format {
                OpenApiFormat::Yaml => api.to_yaml()?,
                OpenApiFormat::Json => api.to_pretty_json()?,
            }
        );
        return Ok(());
    }

    info!("Starting the authentication webhook...");

    let cfg = Config::new(args.config)?;
    let forge = ForgeProvider::new(&cfg)?;
    let shared_state = Arc::new(Service::new(cfg, forge)?);

    info!(
        "Identity provider endpoint: {}",
        shared_state.config.api_endpoint
    );
    info!("Group resolution policy: {}", shared_state.policy);

    let x_request_id = HeaderName::from_static("x-request-id");
    // The bearer token under review travels in the request body, but clients
    // may also send it as a header; never log either.
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION].into();

    let middleware = ServiceBuilder::new()
        // Inject x-request-id header into processing
        // make sure to set request ids before the request reaches `TraceLayer`
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            WebhookRequestId::default(),
        ))
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        "request",
                        method = ?request.method(),
                        uri = ?request.uri().path(),
                        x_request_id = ?request.headers().get("x-request-id")
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .sensitive_response_headers(sensitive_headers)
        // propagate the header to the response before the response reaches `TraceLayer`
        .layer(PropagateRequestIdLayer::new(x_request_id));

    let app = router.layer(middleware).with_state(shared_state.clone());

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, shared_state.config.listen_port));
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on {}", address);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shared_state))
        .await?;

    Ok(())
}

/// Install shutdown and interrupt signal handler
async fn shutdown_signal(state: ServiceState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .inspect_err(|e| error!("failed to install Ctrl+C handler: {e}"))
            .ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| error!("failed to install signal handler: {e}"))
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {state.terminate().await.ok();},
        () = terminate => {state.terminate().await.ok();},
    }
}
