//! JWT claim structures. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the short-lived auth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortTokenClaims {
    pub user_id: Uuid,
    /// The username at issue time.
    pub user_key: String,
    pub session_id: String,
    pub device_id: String,
    pub iat: usize,
    pub exp: usize,
}

/// Claims carried by the long-lived refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTokenClaims {
    pub user_id: Uuid,
    pub user_key: String,
    /// Makes every minted token unique, so each digest is unique too.
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_claims_wire_names() {
        let claims = ShortTokenClaims {
            user_id: Uuid::nil(),
            user_key: "jdoe".into(),
            session_id: "s-1".into(),
            device_id: "d-1".into(),
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userKey"], "jdoe");
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["deviceId"], "d-1");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_long_claims_deserialize() {
        let json = format!(
            r#"{{"userId":"{}","userKey":"jdoe","jti":"abc","iat":1,"exp":9999999999}}"#,
            Uuid::nil()
        );
        let claims: LongTokenClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims.user_key, "jdoe");
        assert_eq!(claims.jti, "abc");
    }
}
