/*
[INPUT]:  SDK-style auth error codes
[OUTPUT]: Messages shown to the user
[POS]:    Presentation helper - auth failure wording
[UPDATE]: When supporting additional auth codes
*/

static AUTH_MESSAGES: &[(&str, &str)] = &[
    ("auth/invalid-email", "The email address is not valid."),
    ("auth/user-disabled", "The user account has been disabled."),
    ("auth/user-not-found", "User not found."),
    ("auth/wrong-password", "Wrong password."),
    ("auth/email-already-in-use", "The email address is already in use"),
    ("auth/operation-not-allowed", "Operation not allowed."),
    ("auth/weak-password", "The password is too weak."),
];

/// Message for an auth failure; unknown codes are shown as-is
pub fn message_for_code(code: &str) -> String {
    AUTH_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| (*message).to_string())
        .unwrap_or_else(|| code.to_string())
}
