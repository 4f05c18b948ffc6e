//! # wpcall - a typed WordPress REST API client
//!
//! wpcall builds requests from a fluent description, negotiates
//! authorization (including a JWT token exchange), dispatches each call once
//! over HTTP and reports every outcome through one [`ResponseEnvelope`]:
//! success, error status, hook rejection or transport failure.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wpcall::{AuthorizationScheme, Client, PostFields, Status};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wpcall::Error> {
//!     let client = Client::builder()
//!         .base_url("https://site.test")?
//!         .authorization(AuthorizationScheme::jwt("admin", "secret"))
//!         .connect()
//!         .await?;
//!
//!     let posts = client.posts().list(&[("per_page", "5")]).await?;
//!     if posts.success() {
//!         for post in posts.payload().into_iter().flatten() {
//!             println!("{} {}", post.id, post.title.rendered);
//!         }
//!     } else {
//!         eprintln!("{:?} {:?}", posts.status(), posts.error_message());
//!     }
//!
//!     let draft = PostFields {
//!         title: Some("Hello".to_string()),
//!         status: Some(Status::Draft),
//!         ..Default::default()
//!     };
//!     let created = client.posts().create(&draft).await?;
//!     println!("created in {:?}", created.elapsed());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## What fails where
//!
//! - Configuration and descriptor problems, and calls that require a
//!   credential the client does not have, return an [`Error`] before anything
//!   is sent.
//! - Everything from the transport onwards (network errors, timeouts,
//!   cancellation, non-200 statuses, hook rejections) comes back as an
//!   unsuccessful envelope, never as an `Err`.
//! - Decoding a successful payload into a domain type can fail with
//!   [`Error::Decode`].
//!
//! ## Hooks
//!
//! ```no_run
//! use wpcall::{Client, RequestDescriptor};
//!
//! # async fn example() -> Result<(), wpcall::Error> {
//! let client = Client::builder()
//!     .base_url("https://site.test")?
//!     .global_filter(|body| !body.is_empty())
//!     .build()?;
//!
//! let descriptor = RequestDescriptor::builder()
//!     .get("posts")
//!     .on_success(|body| tracing::debug!(len = body.len(), "posts received"))
//!     .validator(|body| body.starts_with('['))
//!     .on_unhandled_error(|e| tracing::error!(error = %e, "posts failed"))
//!     .build()?;
//!
//! let envelope = client.execute(&descriptor).await?;
//! if envelope.is_hook_rejection() {
//!     eprintln!("{}", envelope.error_message().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod assemble;
pub mod auth;
mod client;
pub mod config;
mod descriptor;
mod dispatch;
mod envelope;
mod error;
pub mod hooks;
pub mod models;
mod resources;
pub mod transport;

pub use assemble::assemble;
pub use auth::{AuthorizationScheme, AuthorizationState, Credentials, ResolvedAuth, TokenExchange};
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use descriptor::{MediaUpload, RequestBody, RequestBuilder, RequestDescriptor};
pub use envelope::{ResponseEnvelope, UNHANDLED_ERROR_MESSAGE};
pub use error::{Error, Result};
pub use models::{Category, Comment, Media, Page, Post, PostFields, Status, Tag, User};
pub use resources::{form_fields, Resource};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ReqwestTransport, Transport, TransportError};
