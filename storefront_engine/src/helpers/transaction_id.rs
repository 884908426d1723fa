use rand::{distributions::Alphanumeric, Rng};

/// Generates a reference for a simulated payment, `TXN_` followed by 8 random upper-case alphanumeric characters.
pub fn new_transaction_id() -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(|c| char::from(c).to_ascii_uppercase()).collect();
    format!("TXN_{suffix}")
}
