//! Scenario tests for the session lifecycle.
//!
//! All async tests run on tokio's current-thread runtime, so "concurrent"
//! callers are interleaved at await points, never parallel.
//!
//! - `harness.rs`      - Mock auth service, mock transport, recording navigator
//! - `single_flight.rs` - One refresh call per cycle, shared settlement
//! - `pipeline.rs`     - Before-send refresh, 401 refresh-and-retry once
//! - `gate.rs`         - Per-mount status machine, logout at most once per mount
//! - `logout.rs`       - Best-effort remote call, unconditional local teardown
//! - `login.rs`        - Role checks and store contents after sign-in

mod single_flight;
