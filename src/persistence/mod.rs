//! Persistence layer: PostgreSQL record mirror and event log.
//!
//! Durable storage for the write-once settlement artifacts and the
//! domain event log. The in-memory domain stores remain authoritative;
//! everything here is best-effort and optional
//! (`PERSISTENCE_ENABLED=false` runs fully in memory).

pub mod postgres;

pub use postgres::PostgresPersistence;
