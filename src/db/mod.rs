//! Activity stores: Firestore in production, memory for development and tests.

pub mod cursor;
pub mod firestore;
pub mod memory;

pub use cursor::{decode_cursor, encode_cursor, CursorPosition};
pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const ACTIVITIES: &str = "activities";
    pub const USERS: &str = "users";
}
