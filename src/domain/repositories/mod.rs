//! Data-access traits implemented by the infrastructure layer.

mod link_repository;
mod sequence_source;

pub use link_repository::LinkRepository;
pub use sequence_source::SequenceSource;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use sequence_source::MockSequenceSource;
