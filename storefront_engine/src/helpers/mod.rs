mod password;
mod transaction_id;

pub use password::{hash_password, verify_password, PasswordError};
pub use transaction_id::new_transaction_id;
