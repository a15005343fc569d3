// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured logging setup for applications embedding the session core.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` does not override it.
const DEFAULT_DIRECTIVES: &str = "gymgem_session=debug,info";

/// Initialize structured JSON logging.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init();
}
