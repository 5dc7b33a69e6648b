#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the apprehension dashboard.
//!
//! The source definition is resolved from `APREHENSYS_SOURCE_CONFIG` /
//! `APREHENSYS_CSV_URL`, falling back to the embedded default.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let definition = aprehensys_source::registry::resolve_source(None, None)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    aprehensys_server::run_server(definition).await
}
