//! Actor identity from the auth provider's bearer tokens. The core trusts
//! the decoded claims as given; authorization happens upstream.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Actor, Role};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Actor id
    pub role: Role,
    pub exp: usize, // Expiration time
}

pub fn generate_token(actor: &Actor, secret: &str) -> Result<String> {
    let expiration = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let claims = Claims {
        sub: actor.id.clone(),
        role: actor.role,
        exp: expiration,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Actor> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(Actor {
        id: token_data.claims.sub,
        role: token_data.claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let actor = Actor::new("agency-1", Role::Agency);
        let token = generate_token(&actor, "test-secret").unwrap();
        let decoded = verify_token(&token, "test-secret").unwrap();
        assert_eq!(decoded, actor);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let actor = Actor::new("u1", Role::User);
        let token = generate_token(&actor, "right-secret").unwrap();
        assert!(verify_token(&token, "wrong-secret").is_err());
    }
}
