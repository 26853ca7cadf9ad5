//! JWT encoding and validation for the bearer-token auth strategy.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::identity::{CurrentUser, Role};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // subject (user id)
    pub username: String, // username
    pub email: String,    // email
    pub role: String,     // role tag
    pub exp: i64,         // expiration time
    pub iat: i64,         // issued at
}

impl Claims {
    /// Reconstruct the authenticated identity carried by the token.
    pub fn to_current_user(&self) -> Result<CurrentUser, String> {
        let id = self
            .sub
            .parse::<i64>()
            .map_err(|_| format!("Invalid subject in token: {}", self.sub))?;

        Ok(CurrentUser {
            id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: Role::parse(&self.role),
        })
    }
}

/// Encode a JWT token for a user
pub fn encode_jwt(
    user: &CurrentUser,
    secret: &str,
    expiration_hours: i64,
) -> Result<String, String> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to encode JWT: {}", e))
}

/// Decode and validate a JWT token
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| format!("Failed to decode JWT: {}", e))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: 1,
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn test_jwt_encoding_decoding() {
        let secret = "test-secret-key-must-be-at-least-32-chars-long!";
        let user = test_user();

        let token = encode_jwt(&user, secret, 24).unwrap();
        let claims = decode_jwt(&token, secret).unwrap();

        assert_eq!(claims.sub, "1");
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.to_current_user().unwrap(), user);
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let user = test_user();
        let token = encode_jwt(&user, "first-secret-key-at-least-32-chars!!", 24).unwrap();

        assert!(decode_jwt(&token, "other-secret-key-at-least-32-chars!!").is_err());
    }
}
