//! Rekordbox collection format support

pub mod collection;

pub use collection::RekordboxCollection;
