/*
[INPUT]:  Identity Toolkit / Secure Token REST error messages
[OUTPUT]: SDK-style `auth/...` error codes
[POS]:    Auth layer - error normalization
[UPDATE]: When the REST API reports new error messages
*/

/// REST error message -> SDK code
const REST_ERROR_CODES: &[(&str, &str)] = &[
    ("EMAIL_EXISTS", "auth/email-already-in-use"),
    ("INVALID_EMAIL", "auth/invalid-email"),
    ("USER_DISABLED", "auth/user-disabled"),
    ("EMAIL_NOT_FOUND", "auth/user-not-found"),
    ("USER_NOT_FOUND", "auth/user-not-found"),
    ("INVALID_PASSWORD", "auth/wrong-password"),
    ("OPERATION_NOT_ALLOWED", "auth/operation-not-allowed"),
    ("WEAK_PASSWORD", "auth/weak-password"),
    ("INVALID_LOGIN_CREDENTIALS", "auth/invalid-credential"),
    ("INVALID_IDP_RESPONSE", "auth/invalid-credential"),
    ("TOO_MANY_ATTEMPTS_TRY_LATER", "auth/too-many-requests"),
    ("TOKEN_EXPIRED", "auth/user-token-expired"),
    ("INVALID_REFRESH_TOKEN", "auth/invalid-user-token"),
];

/// Normalize a REST error message such as `WEAK_PASSWORD : Password should be ...`
pub fn auth_code_for(message: &str) -> String {
    let key = message.split(" : ").next().unwrap_or(message).trim();
    REST_ERROR_CODES
        .iter()
        .find(|(rest, _)| *rest == key)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or_else(|| format!("auth/{}", key.to_ascii_lowercase().replace('_', "-")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_messages() {
        assert_eq!(auth_code_for("EMAIL_EXISTS"), "auth/email-already-in-use");
        assert_eq!(auth_code_for("INVALID_PASSWORD"), "auth/wrong-password");
        assert_eq!(auth_code_for("EMAIL_NOT_FOUND"), "auth/user-not-found");
    }

    #[test]
    fn test_detail_suffix_is_dropped() {
        assert_eq!(
            auth_code_for("WEAK_PASSWORD : Password should be at least 6 characters"),
            "auth/weak-password"
        );
    }

    #[test]
    fn test_unknown_message_is_kebab_cased() {
        assert_eq!(auth_code_for("MISSING_PASSWORD"), "auth/missing-password");
    }
}
