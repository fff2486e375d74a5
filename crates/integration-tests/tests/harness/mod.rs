#![allow(dead_code)]

pub mod config;
pub mod mock_upstream;
pub mod server;
pub mod stub;

/// Credential accepted by every test server
pub const TEST_KEY: &str = "sk-test-0123456789abcdef";

/// A second accepted credential
pub const OTHER_KEY: &str = "sk-other-fedcba9876543210";

/// Extract `data:` payloads from an event-stream body
pub fn sse_payloads(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(str::to_owned)
        .collect()
}
