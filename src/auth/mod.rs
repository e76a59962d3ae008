//! Credential hashing and token issuance.

pub mod claims;
pub mod jwt;
pub mod password;

pub use jwt::TokenIssuer;
pub use password::CredentialHasher;
