//! Remote Docker fleet controller.
//!
//! `dockhand` registers Docker hosts and drives container and Compose-stack
//! lifecycle operations against them over a small REST API. A host is served
//! either by its Docker Engine API or by shell commands run over SSH; the
//! choice is made per host record, on every request.
//!
//! # Architecture
//!
//! A request names a host, and optionally a stack. The registry loads the
//! record, the backend resolver turns it into a connection descriptor, and the
//! dispatcher runs one operation through the matching collaborator. Results
//! and typed errors flow back to the HTTP boundary, which alone decides
//! status codes and logs failures.
//!
//! # Modules
//!
//! - [`backend`]: Host-to-backend resolution, the SSH shell and the engine client
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`dispatch`]: Operation routing and result normalisation
//! - [`error`]: Semantic error types for the application
//! - [`registry`]: `SQLite`-backed host and stack records
//! - [`server`]: The axum router and handlers
//! - [`stack`]: Compose verbs bound to a registered stack
//! - [`telemetry`]: Structured logging initialisation

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod server;
pub mod stack;
pub mod telemetry;
