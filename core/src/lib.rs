//! Synchronous client for the Less Annoying CRM JSON API.
//!
//! # Overview
//! Every remote function is reached by POSTing one JSON object to a single
//! endpoint. The object carries the caller's arguments, a `Function` field
//! naming the operation, and the account's `UserCode` / `APIToken`.
//!
//! # Design
//! - `ParameterBuilder` owns the marshalling rules: which operations drop
//!   empty arguments, and the reserved fields that always win.
//! - `LacrmClient` exposes one method per remote function, plus a `build_*`
//!   twin returning the `HttpRequest` without sending it.
//! - Responses come back as raw `HttpResponse`s; interpreting status codes and
//!   bodies is the caller's job.
//! - Credentials are injected at construction; there is no global state.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use client::LacrmClient;
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use params::{Operation, OperationRequest, ParameterBuilder, SuppressionPolicy};
pub use transport::{Transport, UreqTransport};
pub use types::{
    indexed, Address, Contact, ContactMethod, CreateEvent, CreatePipeline, CreateTask, Indexed,
    PipelineReport, SearchContacts, UpdatePipelineItem, Website,
};
