/// Check an admin API key in constant time.
///
/// An empty configured key disables the admin surface, so nothing matches it.
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
