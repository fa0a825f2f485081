//! Authorize URL for the implicit form-post flow.

use crate::csrf::CsrfTokenPair;
use crate::options::LoginSettings;

const RESPONSE_TYPE: &str = "token id_token";
const RESPONSE_MODE: &str = "form_post";

/// Builds the identity provider's authorize URL.
///
/// The console's configured base URL doubles as the client id, and the
/// access token is requested for the tenant's management API.
#[derive(Debug, Clone)]
pub struct AuthorizeUrlBuilder<'a> {
    settings: &'a LoginSettings,
    redirect_uri: String,
}

impl<'a> AuthorizeUrlBuilder<'a> {
    #[must_use]
    pub fn new(settings: &'a LoginSettings, redirect_uri: impl Into<String>) -> Self {
        Self {
            settings,
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Returns the URL carrying `tokens` as nonce and state.
    #[must_use]
    pub fn build(&self, tokens: &CsrfTokenPair) -> String {
        let params = [
            ("client_id", self.settings.base_url().to_string()),
            ("response_type", RESPONSE_TYPE.to_string()),
            ("response_mode", RESPONSE_MODE.to_string()),
            ("scope", self.settings.scopes().to_string()),
            ("expiration", self.settings.expiration().to_string()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("audience", self.settings.management_audience()),
            ("nonce", tokens.nonce().to_string()),
            ("state", tokens.state().to_string()),
        ];

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("https://{}/authorize?{query}", self.settings.rta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LoginSettings {
        LoginSettings::builder(
            "secret",
            "urn:console",
            "auth.example.com",
            "tenant.example.com",
            "https://console.example.com/admins",
            "Console",
        )
        .build()
        .expect("valid settings")
    }

    #[test]
    fn authorize_url_carries_all_parameters() {
        let settings = settings();
        let tokens = CsrfTokenPair::new("st4te", "n0nce");
        let url = AuthorizeUrlBuilder::new(&settings, "https://h.example/login/callback")
            .build(&tokens);

        assert_eq!(
            url,
            "https://auth.example.com/authorize\
             ?client_id=https%3A%2F%2Fconsole.example.com%2Fadmins\
             &response_type=token%20id_token\
             &response_mode=form_post\
             &scope=openid%20name%20email\
             &expiration=36000\
             &redirect_uri=https%3A%2F%2Fh.example%2Flogin%2Fcallback\
             &audience=https%3A%2F%2Ftenant.example.com%2Fapi%2Fv2%2F\
             &nonce=n0nce\
             &state=st4te"
        );
    }

    #[test]
    fn custom_scopes_and_expiration() {
        let settings = LoginSettings::builder("s", "a", "r.example", "d.example", "https://b", "c")
            .scopes("openid profile")
            .expiration(60)
            .build()
            .expect("valid settings");
        let url = AuthorizeUrlBuilder::new(&settings, "https://b/login/callback")
            .build(&CsrfTokenPair::generate());

        assert!(url.contains("&scope=openid%20profile&"));
        assert!(url.contains("&expiration=60&"));
    }
}
