//! Double-submit CSRF tokens: a fresh random token goes into a signed cookie and a
//! hidden form field on every form render, and a POST must echo the cookie's token.

use axum_extra::extract::cookie::{Key, SignedCookieJar};
use cookie::{Cookie, SameSite};

pub const FIELD: &str = "csrf_token";
pub const INVALID: &str = "The CSRF token is invalid.";

const COOKIE: &str = "reelrank_csrf";

pub fn key_from_secret(secret: &str) -> Key {
    Key::derive_from(secret.as_bytes())
}

/// Issues a new token, replacing whatever the jar held.
pub fn issue(jar: SignedCookieJar) -> (SignedCookieJar, String) {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let cookie = Cookie::build((COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict);
    (jar.add(cookie), token)
}

pub fn verify(jar: &SignedCookieJar, submitted: &str) -> bool {
    match jar.get(COOKIE) {
        Some(cookie) => !submitted.is_empty() && cookie.value() == submitted,
        None => false,
    }
}

/// Drops the token once it has been spent on a successful submission.
pub fn consume(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(COOKIE).path("/"))
}
