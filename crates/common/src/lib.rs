//! Shared building blocks for the fedblog crates.
//!
//! - [`Config`]: layered settings (TOML files, then `FEDBLOG__*` variables)
//! - [`AppError`]: the error every layer returns, rendered as a JSON body
//! - [`crypto`]: actor RSA key pairs and access token digests
//! - [`IdGenerator`]: lowercase ULID row ids and opaque bearer tokens
//! - [`storage`]: sandboxed local file storage for images
//!
//! ```no_run
//! use fedblog_common::{AppResult, Config, IdGenerator};
//!
//! fn boot() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id = IdGenerator::new().generate();
//!     tracing::info!(%id, url = %config.server.url, "Booting");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use crypto::{RsaKeypair, generate_rsa_keypair, hash_token};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend, StoredFile};
