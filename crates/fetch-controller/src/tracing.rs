//! # Observability & Tracing
//!
//! The controller logs through `tracing` with structured fields:
//!
//! - **Lifecycle**: `Controller started` and `Shutdown` at info
//! - **Commands**: every command at debug, with its payload
//! - **Requests**: `Dispatch` and `Loaded` at info, failures at warn
//! - **Races**: `Superseded` and `Discarded superseded result` at debug
//!
//! Each event carries `data_type` (e.g. `Post`) and `generation` (e.g.
//! `gen_3`), so one controller's history can be followed with a filter.
//!
//! ```bash
//! RUST_LOG=info cargo run -p dashboard
//! RUST_LOG=fetch_controller=debug cargo run -p dashboard
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // data_type identifies the controller
        .compact()
        .init();
}
