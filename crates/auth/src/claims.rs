//! JWT claims types

use serde::{Deserialize, Serialize};

/// Claims carried by identity-provider session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (identity-provider user id)
    pub sub: String,
    /// Email the identity provider verified for this session
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience (validated only when configured)
    pub aud: Option<String>,
}
