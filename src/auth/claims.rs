use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload of a session token. There is no `exp`: a token lives until it
/// is removed from the user's token list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
    pub jti: Uuid,   // unique per token
}
