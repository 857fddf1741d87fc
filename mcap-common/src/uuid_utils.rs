//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new UUIDv4 in its hyphenated string form, used for record ids
pub fn generate_id() -> String {
    generate().hyphenated().to_string()
}
