//! Input validation utilities
//!
//! Checks applied to values that end up on a control connection.

/// Maximum length accepted for hosts, usernames and protocol arguments
pub const MAX_INPUT_LENGTH: usize = 512;

/// Validate that input is not empty and doesn't contain line breaks or NUL
pub fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty() && input.len() <= MAX_INPUT_LENGTH && !contains_control_break(input)
}

/// True when the value would split a command line on the wire
pub fn contains_control_break(input: &str) -> bool {
    input.contains(['\r', '\n', '\0'])
}

/// Check that a remote entry name is a single safe path component
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
