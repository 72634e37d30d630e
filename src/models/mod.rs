//! Domain models for RocketForge.
//!
//! # Core Concepts
//!
//! - [`Design`]: the root aggregate. Owns an ordered list of [`Section`]s that
//!   tile the body length, plus the [`Component`]s, [`SectionConnection`]s and
//!   [`FinDesign`]s that reference them by id.
//! - [`Component`]: a part cut from sheet stock, outlined by
//!   [`BezierControlPoint`]s and optionally replicated by a [`Symmetry`].
//! - [`VersionHistoryEntry`]: append-only record of each version transition.
//!
//! ## Derived Data
//!
//! [`MassProperties`], [`StabilityAnalysis`] and [`PerformanceMetrics`] are
//! computed from the graph and cached on the design; they are never accepted
//! from callers.

mod analysis;
mod component;
mod connection;
mod design;
mod fin;
mod history;
mod identity;
mod material;
mod query;
mod section;

pub use analysis::*;
pub use component::*;
pub use connection::*;
pub use design::*;
pub use fin::*;
pub use history::*;
pub use identity::*;
pub use material::*;
pub use query::*;
pub use section::*;
