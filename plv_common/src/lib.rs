mod gender;
mod helpers;
mod secret;

pub use gender::{Gender, GenderParseError};
pub use helpers::parse_boolean_flag;
pub use secret::Secret;
