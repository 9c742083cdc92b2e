//! Generation of collision-free injection names for classes without an explicit id.

use crate::error::Error;
use crate::token::ProviderToken;
use tracing::trace;

/// Append-only registry of generated keys in the form `lowerCamelClassName#counter`.
///
/// Every call to [KeyRegistry::get] allocates a new key, even for the same class - callers which
/// need a stable name must store the returned key themselves.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    keys: Vec<String>,
    counter: usize,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a new key for a class token.
    pub fn get(&mut self, token: &ProviderToken) -> Result<String, Error> {
        let class = token
            .as_type()
            .ok_or_else(|| Error::InvalidTokenKind(token.to_string()))?;

        let key = format!("{}#{}", lower_first(class.name()), self.counter);
        self.counter += 1;

        trace!(%key, "Generated injectable key.");

        self.keys.push(key.clone());
        Ok(key)
    }

    #[inline]
    pub fn number_of_keys(&self) -> usize {
        self.keys.len()
    }

    /// All keys issued so far, in issuance order.
    #[inline]
    pub fn all_keys(&self) -> &[String] {
        &self.keys
    }

    /// Clears all keys and the counter. Meant for test harnesses only.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.counter = 0;
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
