//! Globally unique, roughly time-ordered identifiers for tokens, requests and uploads.

pub fn next() -> String {
    xid::new().to_string()
}
