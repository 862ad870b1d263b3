pub mod entry;
pub mod package;
pub mod version;

pub use entry::*;
pub use package::*;
pub use version::*;
