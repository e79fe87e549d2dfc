//! Pure decisions about responses: which redirects to follow, where they
//! lead, and whether a copied body is acceptable.

mod length;
mod validation;

pub use length::check_copied_length;
pub use validation::{MAX_REDIRECTS, is_redirect, resolve_redirect};
