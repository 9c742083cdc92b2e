//! Tokens used to register and look up units in the host container.

use crate::types::Type;
use std::fmt::{Display, Formatter};

/// A token which is not a class but should not collide with plain string names either.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct OpaqueToken {
    desc: String,
}

impl OpaqueToken {
    pub fn new<T: ToString>(desc: T) -> Self {
        Self {
            desc: desc.to_string(),
        }
    }

    #[inline]
    pub fn desc(&self) -> &str {
        &self.desc
    }
}

impl Display for OpaqueToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token {}", self.desc)
    }
}

/// Anything resolvable to a string name for the host container.
#[derive(Clone, Debug)]
pub enum ProviderToken {
    Name(String),
    Opaque(OpaqueToken),
    Type(Type),
    /// Reference to a class which might not be registered yet at the point of use.
    Forward(fn() -> Type),
}

impl ProviderToken {
    /// Resolves a forward reference, leaving other tokens intact.
    pub fn resolved(&self) -> ProviderToken {
        match self {
            ProviderToken::Forward(reference) => ProviderToken::Type(resolve_forward_ref(*reference)),
            token => token.clone(),
        }
    }

    /// Returns the class behind this token, if it refers to one.
    pub fn as_type(&self) -> Option<Type> {
        match self.resolved() {
            ProviderToken::Type(class) => Some(class),
            _ => None,
        }
    }
}

impl Display for ProviderToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderToken::Name(name) => write!(f, "'{name}'"),
            ProviderToken::Opaque(token) => token.fmt(f),
            ProviderToken::Type(class) => write!(f, "class {}", class.name()),
            ProviderToken::Forward(reference) => {
                write!(f, "forward reference to class {}", reference().name())
            }
        }
    }
}

impl From<&str> for ProviderToken {
    fn from(value: &str) -> Self {
        ProviderToken::Name(value.to_string())
    }
}

impl From<String> for ProviderToken {
    fn from(value: String) -> Self {
        ProviderToken::Name(value)
    }
}

impl From<OpaqueToken> for ProviderToken {
    fn from(value: OpaqueToken) -> Self {
        ProviderToken::Opaque(value)
    }
}

impl From<Type> for ProviderToken {
    fn from(value: Type) -> Self {
        ProviderToken::Type(value)
    }
}

/// Creates a token referring to a class through a function, resolved only when needed.
pub fn forward_ref(reference: fn() -> Type) -> ProviderToken {
    ProviderToken::Forward(reference)
}

#[inline]
pub fn resolve_forward_ref(reference: fn() -> Type) -> Type {
    reference()
}
