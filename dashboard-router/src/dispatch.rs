use performance_client::DataSource;
use std::fmt;

/// Identity of an upstream Data API request.
///
/// Built from the same canonical path the Data API client requests, so two
/// sources share a key exactly when they would issue the same request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchKey(String);

impl DispatchKey {
    pub fn new(source: &DataSource) -> Self {
        DispatchKey(source.canonical_path())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
