//! Domain layer - the entities the directory stores and the records the user feeds in.

pub mod model;
