//! PostgreSQL-backed repositories.

mod pg_link_repository;
mod pg_sequence_source;

pub use pg_link_repository::PgLinkRepository;
pub use pg_sequence_source::PgSequenceSource;
