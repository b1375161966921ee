//! crier - rotating announcement engine
//!
//! A library for periodically selecting one message from a named catalog
//! and delivering it, rendered into styled/interactive segments, to an
//! external dispatcher. The crate owns rotation state, interval
//! scheduling, per-message time windows, condition-based eligibility, a
//! small interactive-markup parser, and a render cache; the host owns
//! delivery transport, permissions, and configuration storage.
//!
//! # Architecture
//!
//! - [`markup`] - tag and URL tokenizer producing rendered segments
//! - [`catalog`] - catalog model, render cache, rotation cursor
//! - [`conditions`] - named eligibility predicates over live server state
//! - [`schedule`] - per-message time windows, day filters, interval overrides
//! - [`placeholder`] - `{key}` expansion from host state
//! - [`config`] - TOML catalog files with forgiving validation
//! - [`engine`] - interval grouping, timer tasks, public facade
//! - [`host`] - collaborator contracts the host implements
//!
//! # Example
//!
//! ```rust,ignore
//! use crier::config::{self, CatalogDefaults};
//! use crier::engine::Engine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::new(dispatcher, server_state, Arc::new(crier::host::SystemClock));
//!     let loaded = config::load_path("catalogs/general.toml", &CatalogDefaults::default())?;
//!     engine.load_catalog(loaded).await?;
//!     engine.start().await;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod conditions;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod markup;
pub mod placeholder;
pub mod schedule;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, RenderCache, RotationCursor};
    pub use crate::conditions::{ConditionEvaluator, MessageCondition};
    pub use crate::config::{CatalogDefaults, LoadedCatalog};
    pub use crate::engine::{Engine, EngineOptions};
    pub use crate::error::{ConfigError, Error, Result};
    pub use crate::host::{
        Audience, Clock, Delivery, Dispatcher, ServerStateProvider, SystemClock, Weather,
    };
    pub use crate::markup::{ClickAction, ClickEvent, Color, Segment, Style};
    pub use crate::schedule::{ActiveDay, MessageSchedule, TimeRange};
}

// Direct re-exports for convenience
pub use engine::{Engine, EngineOptions};
pub use error::{Error, Result};
