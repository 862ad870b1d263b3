pub mod application;
pub mod codec;
pub mod commands;
pub mod directory;
pub mod domain;
pub mod error;
pub mod http;
pub mod runtime;
