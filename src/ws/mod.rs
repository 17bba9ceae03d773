//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` is the live-delivery adapter for the
//! marketplace's domain events: listing activity by subscription, and
//! per-user notifications for authenticated connections.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
