use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use argon2::password_hash::SaltString;
use argon2::{Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::{Engine as _, engine::general_purpose};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_HASH_COST: u32 = Params::DEFAULT_T_COST;
/// Upper bound on refresh-token entropy, in bytes.
pub const MAX_REFRESH_TOKEN_LENGTH: usize = 1024;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;
/// Header algorithms accepted on parse: the HMAC family only.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
const SALT_LEN: usize = 16;

#[derive(Clone)]
pub struct CryptoConfig {
    pub access_token_ttl: Duration,
    pub signing_key: Vec<u8>,
    /// Bytes of entropy in each refresh token.
    pub refresh_token_length: usize,
    /// Argon2 time cost (iterations).
    pub hash_cost: u32,
}

impl fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("signing_key", &"<redacted>")
            .field("refresh_token_length", &self.refresh_token_length)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    guid: String,
    exp: i64,
    iat: i64,
    jti: String,
}

/// HS512 access tokens and Argon2id refresh-token hashes.
pub struct JwtArgon2CryptoService {
    access_token_ttl: Duration,
    refresh_token_length: usize,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    hasher: Argon2<'static>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl JwtArgon2CryptoService {
    pub fn try_new(
        cfg: CryptoConfig,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, CryptoError> {
        if cfg.signing_key.is_empty() {
            return Err(CryptoError::Signing("signing key is empty".to_string()));
        }
        if cfg.refresh_token_length == 0 || cfg.refresh_token_length > MAX_REFRESH_TOKEN_LENGTH {
            return Err(CryptoError::Entropy(format!(
                "refresh token length must be in 1..={}",
                MAX_REFRESH_TOKEN_LENGTH
            )));
        }
        let params = Params::new(
            Params::DEFAULT_M_COST,
            cfg.hash_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| CryptoError::Hashing(format!("invalid hash cost: {}", e)))?;

        Ok(Self {
            access_token_ttl: cfg.access_token_ttl,
            refresh_token_length: cfg.refresh_token_length,
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            hasher: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
            clock,
            entropy,
        })
    }

    fn validation() -> Validation {
        let mut v = Validation::new(SIGNING_ALGORITHM);
        v.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // expiry is checked against the injected clock instead
        v.validate_exp = false;
        v.leeway = 0;
        v.set_required_spec_claims(&["exp"]);
        v
    }

    fn random_jti(&self) -> Result<Uuid, CryptoError> {
        let mut bytes = [0u8; 16];
        self.entropy
            .fill(&mut bytes)
            .map_err(|e| CryptoError::Entropy(e.to_string()))?;
        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; len];
        self.entropy
            .fill(&mut buf)
            .map_err(|e| CryptoError::Entropy(e.to_string()))?;
        Ok(buf)
    }
}

impl CryptoService for JwtArgon2CryptoService {
    fn generate_access_token(&self, subject_id: &SubjectId) -> Result<AccessToken, CryptoError> {
        let iat = self.clock.now().timestamp();
        let ttl = i64::try_from(self.access_token_ttl.as_secs())
            .map_err(|e| CryptoError::Signing(format!("access token ttl: {}", e)))?;
        let claims = AccessClaims {
            guid: subject_id.to_string(),
            exp: iat.saturating_add(ttl),
            iat,
            jti: self.random_jti()?.to_string(),
        };
        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        Ok(AccessToken(token))
    }

    fn parse_access_token(&self, token: &AccessToken) -> Result<SubjectId, CryptoError> {
        let data = decode::<AccessClaims>(token.as_str(), &self.decoding_key, &Self::validation())
            .map_err(|e| CryptoError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(CryptoError::InvalidToken("token is expired".to_string()));
        }
        if claims.guid.is_empty() {
            return Err(CryptoError::InvalidToken("token has no subject".to_string()));
        }
        Ok(SubjectId(claims.guid))
    }

    fn generate_refresh_token(&self) -> Result<(RefreshToken, Vec<u8>), CryptoError> {
        let raw = self.random_bytes(self.refresh_token_length)?;
        let token = general_purpose::STANDARD.encode(&raw);

        let salt_bytes = self.random_bytes(SALT_LEN)?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CryptoError::Hashing(format!("salt: {}", e)))?;
        let hash = self
            .hasher
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| CryptoError::Hashing(e.to_string()))?
            .to_string();

        Ok((RefreshToken(token), hash.into_bytes()))
    }

    fn compare_refresh_tokens(
        &self,
        token_hash: &[u8],
        token: &RefreshToken,
    ) -> Result<(), CryptoError> {
        let phc = std::str::from_utf8(token_hash)
            .map_err(|e| CryptoError::Hashing(format!("stored hash is not utf-8: {}", e)))?;
        let parsed = PasswordHash::new(phc)
            .map_err(|e| CryptoError::Hashing(format!("invalid PHC hash: {}", e)))?;

        match self.hasher.verify_password(token.as_str().as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(CryptoError::InvalidToken(
                "refresh token mismatch".to_string(),
            )),
            Err(e) => Err(CryptoError::Hashing(format!("verify error: {}", e))),
        }
    }
}
