pub mod replace_file;
pub mod staging;
pub mod write_once;

pub use replace_file::{Placement, replace_file};
pub use staging::{ensure_dir, staging_file};
pub use write_once::{persist_new, write_new};
