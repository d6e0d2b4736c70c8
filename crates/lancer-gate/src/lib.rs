//! Request gates for chunked-upload services.
//!
//! A [`Gatekeeper`] holds the webhook signing secret and produces two axum
//! routes:
//!
//! - [`Gatekeeper::auth`] validates an upload-session request and asks an
//!   [`AuthHandler`] who owns it.
//! - [`Gatekeeper::webhook`] optionally verifies the `x-signature` /
//!   `x-timestamp` HMAC of a delivery and hands the event to a
//!   [`WebhookHandler`].

mod auth;
mod config;
mod error;
mod gatekeeper;
mod handler;
mod rejection;
mod router;
mod secret;
mod server;
pub mod signature;
mod types;
mod webhook;

pub use auth::SessionAuthGate;
pub use config::GateConfig;
pub use error::GateError;
pub use gatekeeper::Gatekeeper;
pub use handler::{AuthHandler, HandlerFuture, WebhookHandler};
pub use rejection::Rejection;
pub use router::build_router;
pub use secret::Secret;
pub use server::GateServer;
pub use signature::{sign, verify_signature};
pub use types::{AuthRequest, AuthResult, REQUIRED_SESSION_FIELDS, SessionRequest, WebhookEvent};
pub use webhook::{SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookGate};
