use rand::RngExt;

/// Uniform `len`-digit numeric code.
///
/// `rand::rng()` is the thread-local CSPRNG seeded from the OS, so codes are
/// unpredictable. Leading zeros are kept.
pub fn generate_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}
