// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST gateway for the Mnemo memory service.
//!
//! Exposes a [`MemoryEngine`](mnemo_core::MemoryEngine) over HTTP. The engine
//! lives behind an atomic pointer so `POST /configure` can rebuild and swap it
//! while requests keep flowing; each request runs against the engine that was
//! current when it started.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{EngineFactory, GatewayState, router, start_server};
