use crate::config::Locale;
use url::{ParseError, Url};

/// Builds canonical page URLs from the site's base URL.
pub struct Converter<'a> {
    /// The site's base URL. Must end in a trailing slash, otherwise its last
    /// path component is dropped by [`Url::join`].
    domain: &'a Url,
}

impl<'a> Converter<'a> {
    pub fn new(domain: &'a Url) -> Converter<'a> {
        Converter { domain }
    }

    /// Returns the URL of the site path `path` (e.g.
    /// `/articles/hello.html`) in `locale`.
    pub fn page_url(&self, locale: &Locale, path: &str) -> Result<Url> {
        self.domain
            .join(locale.build_path(path).trim_start_matches('/'))
    }

    /// Returns the URL of `path` in each of `locales`, keyed by locale code
    /// in locale order.
    pub fn alternates<'l>(
        &self,
        locales: impl IntoIterator<Item = &'l Locale>,
        path: &str,
    ) -> Result<Vec<(String, Url)>> {
        locales
            .into_iter()
            .map(|l| Ok((l.code.clone(), self.page_url(l, path)?)))
            .collect()
    }
}

type Result<T> = std::result::Result<T, ParseError>;
