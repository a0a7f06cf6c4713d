// tempmail-client/src/generator.rs
use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;

pub const LOCAL_PART_LEN: usize = 10;
pub const PASSWORD_LEN: usize = 14;

const LOWER_ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric mailbox name
pub fn random_local_part() -> String {
    let mut rng = rand::thread_rng();
    (0..LOCAL_PART_LEN)
        .map(|_| LOWER_ALNUM[rng.gen_range(0..LOWER_ALNUM.len())] as char)
        .collect()
}

/// Random mixed-case alphanumeric account password
pub fn random_password() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), PASSWORD_LEN)
}
