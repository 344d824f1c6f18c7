//! Dereferencing and walking remote ActivityStreams collections.
//!
//! Builds on the `weftstreams` object model. The API is blocking: each call
//! returns when its fetch, or its whole walk, has finished.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fetch`] | The [`Fetch`] trait, [`HttpFetcher`], [`MemoryFetcher`] |
//! | [`walk`] | [`CollectionWalker`]: page-by-page traversal with cycle detection |
//! | [`cancel`] | [`Cancellation`]: shared cancel flag and deadline |
//! | [`config`] | [`FetchConfig`], [`WalkConfig`], populated from the environment |
//! | [`backoff`] | Retry delays for transient fetch failures |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use weftstreams::Iri;
//! use weftstreams_client::{Cancellation, CollectionWalker, HttpFetcher};
//!
//! let fetcher = HttpFetcher::from_env()?;
//! let walker = CollectionWalker::new(fetcher);
//! let actor = Iri::parse("https://mastodon.social/users/Gargron")?;
//! let walk = walker.walk_actor(&actor, &Cancellation::with_timeout(std::time::Duration::from_secs(60)))?;
//! println!("{} items over {} pages", walk.items.len(), walk.pages);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod fetch;
pub mod walk;

pub use cancel::Cancellation;
pub use config::{FetchConfig, WalkConfig};
pub use fetch::http::HttpFetcher;
pub use fetch::memory::MemoryFetcher;
pub use fetch::{Fetch, FetchError, ACCEPT_ACTIVITY};
pub use walk::{CollectionWalker, Start, Walk, WalkError, WalkFailure};
