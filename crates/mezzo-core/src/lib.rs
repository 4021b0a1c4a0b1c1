#![forbid(unsafe_code)]

//! Core: geometry, identities, and lifecycle accounting.
//!
//! # Role in Mezzo
//! `mezzo-core` is the leaf crate of the mediation layer. It owns the value
//! types shared by every other crate (points, sizes, insets, proxy and view
//! identities) and the debug-only lifecycle accountant that pairs every
//! proxy/view creation with its destruction.
//!
//! # Primary responsibilities
//! - **Geometry**: `Point`, `Size`, `Insets` in native-view coordinates.
//! - **Identity**: `ProxyId` / `ViewId` newtypes with process-wide allocators.
//! - **Accounting**: per-type live counters, compiled out of release builds.
//!
//! # How it fits in the system
//! The proxy layer (`mezzo-proxy`) reports creation/destruction events here
//! and carries the geometry types through the backend boundary
//! (`mezzo-backend`). Nothing in this crate touches a native view.

pub mod accounting;
pub mod geometry;
pub mod id;

pub use geometry::{Insets, Point, Size};
pub use id::{ProxyId, ViewId};
