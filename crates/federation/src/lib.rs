//! Federation layer for fedblog.
//!
//! - **Gatekeeper**: middleware that offers every request to a resolver
//!   before the application router sees it
//! - **Resolver**: local `WebFinger`, `NodeInfo` and Person actor documents
//! - **Key-value store**: in-memory or Redis storage for actor key pairs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::{Router, middleware, routing::get};
//! use fedblog_federation::{Gatekeeper, Resolver, gatekeeper_middleware};
//!
//! fn app(resolver: Arc<dyn Resolver>) -> Router {
//!     let gatekeeper = Arc::new(Gatekeeper::new(resolver));
//!     Router::new()
//!         .route("/", get(|| async { "hello" }))
//!         .layer(middleware::from_fn_with_state(gatekeeper, gatekeeper_middleware))
//! }
//! ```

pub mod actor;
pub mod error;
pub mod gatekeeper;
pub mod kv;
pub mod nodeinfo;
pub mod resolver;
pub mod webfinger;

pub use actor::{ApImage, ApPerson, ApPublicKey};
pub use error::FederationError;
pub use gatekeeper::{Gatekeeper, gatekeeper_middleware};
pub use kv::{KvStore, MemoryKvStore, RedisKvStore};
pub use resolver::{Federation, InstanceInfo, RequestContext, Resolution, Resolver};
