//! Loads the site configuration: the `config` document, the locale
//! descriptors under `locales/`, and the paths derived from the content and
//! output directories.

use crate::document::{list_content, load_document, Error as DocumentError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// The contents of the `config` document.
#[derive(Deserialize, Clone, Debug)]
pub struct Site {
    /// The identifier of the default locale, whose pages are built at the
    /// root of the output directory.
    pub locale: String,

    /// The base URL of the site. Always ends in `/` once loaded.
    pub domain: Url,

    /// The page served as each locale's `index.html`, e.g. `/articles/hello`.
    pub homepage: String,

    /// The name of the license text each locale embeds in its pages.
    pub license: String,
}

/// A locale descriptor: one language variant of the site and its UI strings.
#[derive(Deserialize, Clone, Debug)]
pub struct Locale {
    /// The standardized locale identifier, e.g. `en_US`. Content documents
    /// key their translations by this identifier.
    #[serde(rename = "ISO/IEC 15897", alias = "locale")]
    pub id: String,

    /// The short code used in URL prefixes and `lang` attributes, e.g. `en`.
    pub code: String,

    /// Heading of the latest-articles list on author pages.
    pub articles: String,

    /// Label of archive links and title of archive pages.
    pub archive: String,

    /// Heading of the contacts list on author pages.
    pub contacts: String,

    /// Prefix of archive page titles (followed by the author name).
    #[serde(default, rename = "archive head")]
    pub archive_head: String,

    /// Prefix of the creation date on article pages.
    #[serde(default)]
    pub created: String,

    /// Prefix of the last-edit date on article pages.
    #[serde(default, rename = "last-edit")]
    pub last_edit: String,

    /// Whether this is the site's default locale. Derived, not read.
    #[serde(skip)]
    pub default: bool,

    /// License texts (markup) keyed by license name.
    #[serde(flatten)]
    pub licenses: BTreeMap<String, String>,
}

impl Locale {
    /// Maps an absolute site path (e.g. `/articles/hello.html`) to its path in
    /// this locale. The default locale keeps the path as is; other locales
    /// prefix it with their code (`/it/articles/hello.html`).
    pub fn build_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self.default {
            true => format!("/{}", path),
            false => format!("/{}/{}", self.code, path),
        }
    }

    /// The location of the site path `path` under the output directory `root`.
    pub fn output_path(&self, root: &Path, path: &str) -> PathBuf {
        root.join(self.build_path(path).trim_start_matches('/'))
    }

    /// Returns the license text named `name`.
    pub fn license(&self, name: &str) -> Option<&str> {
        self.licenses.get(name).map(String::as_str)
    }
}

/// The fully resolved configuration for a build.
pub struct Config {
    pub site: Site,

    /// All locales, in locale-file name order.
    pub locales: Vec<Locale>,

    pub content_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub articles_directory: PathBuf,
    pub authors_directory: PathBuf,
    pub resources_source_directory: PathBuf,

    pub output_directory: PathBuf,
    pub resources_output_directory: PathBuf,
}

impl Config {
    /// Loads the configuration for the content in `content_directory`, to be
    /// built into `output_directory`. Relative paths are resolved against the
    /// current directory. Fails if the default locale has no descriptor or if
    /// a locale lacks the configured license text.
    pub fn from_directory(content_directory: &Path, output_directory: &Path) -> Result<Config> {
        let content_directory = content_directory.canonicalize().map_err(|err| Error::Open {
            path: content_directory.to_owned(),
            err,
        })?;
        let output_directory = match output_directory.is_absolute() {
            true => output_directory.to_owned(),
            false => std::env::current_dir()?.join(output_directory),
        };

        let mut site: Site = load_document(&content_directory.join("config"))?;
        if !site.domain.path().ends_with('/') {
            let path = format!("{}/", site.domain.path());
            site.domain.set_path(&path);
        }

        let mut locales = Vec::new();
        for path in list_content(&content_directory.join("locales"))? {
            let mut locale: Locale = load_document(&path)?;
            locale.default = locale.id == site.locale;
            if locale.license(&site.license).is_none() {
                return Err(Error::MissingLicense {
                    locale: locale.id,
                    license: site.license,
                });
            }
            locales.push(locale);
        }
        if !locales.iter().any(|l| l.default) {
            return Err(Error::UnknownDefaultLocale(site.locale));
        }

        Ok(Config {
            site,
            locales,
            templates_directory: content_directory.join("templates"),
            articles_directory: content_directory.join("articles"),
            authors_directory: content_directory.join("authors"),
            resources_source_directory: content_directory.join("res"),
            resources_output_directory: output_directory.join("res"),
            content_directory,
            output_directory,
        })
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the content directory can't be resolved.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the config or a locale document can't be loaded.
    Document(DocumentError),

    /// Returned when no locale descriptor matches the configured default
    /// locale.
    UnknownDefaultLocale(String),

    /// Returned when a locale has no text for the configured license.
    MissingLicense { locale: String, license: String },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "opening content directory `{}`: {}", path.display(), err)
            }
            Error::Document(err) => err.fmt(f),
            Error::UnknownDefaultLocale(id) => {
                write!(f, "no locale descriptor for the default locale `{}`", id)
            }
            Error::MissingLicense { locale, license } => {
                write!(f, "locale `{}` has no text for license `{}`", locale, license)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Document(err) => Some(err),
            Error::UnknownDefaultLocale(_) => None,
            Error::MissingLicense { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<DocumentError> for Error {
    fn from(err: DocumentError) -> Error {
        Error::Document(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
