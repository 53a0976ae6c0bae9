//! # Dashboard
//!
//! The consumer side of the fetch controller: page view models for a small
//! posts/users dashboard backed by a read-only JSON API, the identity
//! service the sidebar and profile page read, and the lifecycle that starts
//! and stops it all.
//!
//! - **[model]**: records decoded from the API ([`Post`](model::Post), [`User`](model::User)).
//! - **[pages]**: one view model per page, each owning a controller handle.
//! - **[overview]**: the static metric cards of the landing page.
//! - **[identity]**: session, sign-in and sign-out, plus the sidebar menu.
//! - **[lifecycle]**: [`Dashboard`](lifecycle::Dashboard) wires pages to a data source.

pub mod endpoints;
pub mod identity;
pub mod lifecycle;
pub mod model;
pub mod overview;
pub mod pages;
