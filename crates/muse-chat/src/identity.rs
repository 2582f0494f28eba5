use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use muse_types::api::Claims;
use muse_types::{ParticipantKind, ParticipantRef};

use crate::ChatError;

const TOKEN_TTL_DAYS: i64 = 30;

/// Issues and resolves bearer tokens.
///
/// There is one resolution path per participant kind: a token is only
/// accepted by the path for the kind it was issued to, so an end-user token
/// never resolves to an artist and vice versa.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, participant: ParticipantRef, name: &str) -> anyhow::Result<String> {
        let claims = Claims {
            sub: participant.id(),
            kind: participant.kind(),
            name: name.to_string(),
            aud: participant.kind().as_str().to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> anyhow::Result<String> {
        Ok(encode(&Header::default(), claims, &self.encoding)?)
    }

    /// Resolve `token` through the `kind` path.
    pub fn resolve(&self, token: &str, kind: ParticipantKind) -> crate::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[kind.as_str()]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                debug!("Rejected {} token: {}", kind, e);
                ChatError::Authentication
            })?
            .claims;

        if claims.kind != kind {
            debug!("Token kind {} presented on the {} path", claims.kind, kind);
            return Err(ChatError::Authentication);
        }

        Ok(claims)
    }
}
