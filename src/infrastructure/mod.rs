pub mod cache;
mod link_store;
pub mod persistence;

pub use link_store::LinkStore;
