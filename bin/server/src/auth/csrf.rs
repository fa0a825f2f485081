//! CSRF token cookies.
//!
//! Each token is written once per cookie generation. All cookies are
//! `HttpOnly` and scoped to the request's base path, so the callback sees
//! exactly the cookies the login route set.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use console_gate_platform_access::{CookieGeneration, CsrfKeys, CsrfTokenPair};
use time::Duration as TimeDuration;

/// Adds the state and nonce cookies of every generation.
pub fn issue(jar: CookieJar, keys: &CsrfKeys, base_path: &str, tokens: &CsrfTokenPair) -> CookieJar {
    CookieGeneration::ALL
        .into_iter()
        .fold(jar, |jar, generation| {
            jar.add(token_cookie(generation, keys.state_key(), tokens.state(), base_path))
                .add(token_cookie(generation, keys.nonce_key(), tokens.nonce(), base_path))
        })
}

/// Expires the state and nonce cookies of every generation, present or not.
pub fn clear(jar: CookieJar, keys: &CsrfKeys, base_path: &str) -> CookieJar {
    keys.cookie_names().into_iter().fold(jar, |jar, name| {
        jar.add(
            Cookie::build((name, ""))
                .path(base_path.to_string())
                .http_only(true)
                .max_age(TimeDuration::ZERO),
        )
    })
}

/// Returns a cookie lookup over the request's cookies.
pub fn lookup(jar: &CookieJar) -> impl Fn(&str) -> Option<String> + '_ {
    move |name| jar.get(name).map(|cookie| cookie.value().to_string())
}

fn token_cookie(
    generation: CookieGeneration,
    base: &str,
    value: &str,
    base_path: &str,
) -> Cookie<'static> {
    let cookie = Cookie::build((generation.cookie_name(base), value.to_string()))
        .path(base_path.to_string())
        .http_only(true);

    if generation.is_cross_site() {
        cookie.same_site(SameSite::None).secure(true).build()
    } else {
        cookie.build()
    }
}
