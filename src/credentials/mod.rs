//! Identity layer: access tokens, credential precedence and token exchange.

mod exchange;
mod resolver;
mod token;

pub use exchange::{HttpTokenExchanger, TOKEN_PATH};
pub use resolver::{CredentialKind, CredentialResolver, CredentialSource, Identity, TokenExchanger};
pub use token::AccessToken;
