//! Defines the content document types ([`Article`], [`Author`]), the
//! [`Document`] wrapper which pairs parsed content with its file identity, and
//! the logic for loading documents from the content directory. Documents are
//! literal mappings (`{"author": "Jane", "en_US": {...}}`); see
//! [`crate::literal`] for the notation.

use crate::literal;
use chrono::{DateTime, Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{read_dir, read_to_string};
use std::path::{Path, PathBuf};

/// The title and body of a document in a single locale.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Translation {
    /// Plain text; inserted into pages as text.
    pub title: String,

    /// A markup fragment; spliced into pages as HTML.
    pub content: String,
}

/// An article. Besides `author` and `date`, every top-level key is a locale
/// identifier mapping to the article's [`Translation`] in that locale.
#[derive(Deserialize, Clone, Debug)]
pub struct Article {
    /// The display name of the author. This must match the `author` field of
    /// one of the [`Author`] documents.
    pub author: String,

    /// The creation date of the article.
    #[serde(default, deserialize_with = "crate::date::deserialize_date")]
    pub date: Option<NaiveDate>,

    #[serde(flatten)]
    pub translations: BTreeMap<String, Translation>,
}

impl Article {
    /// Returns the translation for the locale identified by `locale_id`.
    pub fn translation(&self, locale_id: &str) -> Option<&Translation> {
        self.translations.get(locale_id)
    }
}

/// A block of an author's page, keyed by locale identifier.
pub type Section = BTreeMap<String, Translation>;

/// An author. Contact fields are optional and only rendered when present.
#[derive(Deserialize, Clone, Debug)]
pub struct Author {
    /// The author's display name.
    pub author: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub xmpp: Option<String>,

    /// A PGP key fingerprint.
    #[serde(default)]
    pub pgp: Option<String>,

    /// A Dogecoin address.
    #[serde(default)]
    pub doge: Option<String>,

    /// A Bitcoin address.
    #[serde(default)]
    pub btc: Option<String>,

    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Parsed content together with the identity of the file it came from.
#[derive(Clone, Debug)]
pub struct Document<T> {
    /// The file name, which becomes the page name (`{name}.html`).
    pub name: String,

    /// The source file.
    pub path: PathBuf,

    /// The modification time of the source file.
    pub modified: DateTime<Local>,

    pub content: T,
}

impl<T: DeserializeOwned> Document<T> {
    /// Loads a single document from `path`.
    pub fn load(path: &Path) -> Result<Document<T>> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?
            .to_owned();
        Ok(Document {
            name,
            path: path.to_owned(),
            modified: last_modified(path)?,
            content: load_document(path)?,
        })
    }

    /// Loads every document in `dir`. See [`list_content`] for ordering.
    pub fn load_all(dir: &Path) -> Result<Vec<Document<T>>> {
        list_content(dir)?
            .iter()
            .map(|path| Document::load(path))
            .collect()
    }
}

/// Parses the file at `path` into a `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let source = read_to_string(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    literal::from_str(&source).map_err(|err| Error::Malformed {
        path: path.to_owned(),
        err,
    })
}

/// Returns the non-hidden entries of `dir` sorted by file name, so build
/// output doesn't depend on the platform's directory enumeration order.
pub fn list_content(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for result in read_dir(dir).map_err(|err| Error::Open {
        path: dir.to_owned(),
        err,
    })? {
        let entry = result?;
        if !entry.file_name().to_string_lossy().starts_with('.') {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Returns the modification time of the file at `path` in local time.
pub fn last_modified(path: &Path) -> Result<DateTime<Local>> {
    Ok(DateTime::from(std::fs::metadata(path)?.modified()?))
}

/// The orderings supported by [`select_articles`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    /// Most recently modified first.
    LastEditRecentToOld,

    /// Content directory order.
    Unsorted,
}

impl From<&str> for Sort {
    /// Parses a sort mode name. Unrecognized names mean [`Sort::Unsorted`].
    fn from(s: &str) -> Sort {
        match s {
            "last_edit_recent_to_old" => Sort::LastEditRecentToOld,
            _ => Sort::Unsorted,
        }
    }
}

/// Selects the articles translated into `locale_id`, ordered by `sort`, and
/// optionally restricted to those written by `author`.
pub fn select_articles<'a>(
    articles: &'a [Document<Article>],
    locale_id: &str,
    sort: Sort,
    author: Option<&str>,
) -> Vec<&'a Document<Article>> {
    let mut selected: Vec<&Document<Article>> = articles
        .iter()
        .filter(|a| a.content.translation(locale_id).is_some())
        .filter(|a| author.map_or(true, |author| a.content.author == author))
        .collect();
    if sort == Sort::LastEditRecentToOld {
        selected.sort_by(|a, b| b.modified.cmp(&a.modified));
    }
    selected
}

/// Represents the result of a document-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Document`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a content file or directory can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a content file isn't a well-formed document of the
    /// expected kind.
    Malformed { path: PathBuf, err: literal::Error },

    /// Returned when a content file name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "opening `{}`: {}", path.display(), err)
            }
            Error::Malformed { path, err } => {
                write!(f, "malformed document `{}`: {}", path.display(), err)
            }
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
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
            Error::Malformed { path: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn article(name: &str, author: &str, locales: &[&str], minute: u32) -> Document<Article> {
        Document {
            name: name.to_owned(),
            path: PathBuf::from(name),
            modified: Local.with_ymd_and_hms(2021, 1, 1, 0, minute, 0).unwrap(),
            content: Article {
                author: author.to_owned(),
                date: None,
                translations: locales
                    .iter()
                    .map(|l| {
                        (
                            l.to_string(),
                            Translation {
                                title: format!("{} ({})", name, l),
                                content: String::new(),
                            },
                        )
                    })
                    .collect(),
            },
        }
    }

    fn names(articles: &[&Document<Article>]) -> Vec<String> {
        articles.iter().map(|a| a.name.clone()).collect()
    }

    #[test]
    fn test_load_literal_article() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("hello");
        fs::write(
            &path,
            r#"{"author": "Jane", "date": "2020/01/01",
                "en_US": {"title": "Hi", "content": "<p>hi</p>"},
                'it_IT': {'title': 'Ciao', 'content': '<p>ciao</p>'}}"#,
        )?;
        let article: Document<Article> = Document::load(&path)?;
        assert_eq!("hello", article.name);
        assert_eq!("Jane", article.content.author);
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 1), article.content.date);
        assert_eq!(2, article.content.translations.len());
        assert_eq!("Ciao", article.content.translation("it_IT").unwrap().title);
        Ok(())
    }

    #[test]
    fn test_load_author_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("jane");
        fs::write(&path, "{'author': 'Jane', 'email': 'jane@x.test', 'btc': None}")?;
        let author: Author = load_document(&path)?;
        assert_eq!("Jane", author.author);
        assert_eq!(Some("jane@x.test"), author.email.as_deref());
        assert_eq!(None, author.btc);
        assert!(author.sections.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_malformed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken");
        fs::write(&path, "{\"author\": \"Jane\", \"en_US\": ")?;
        match load_document::<Article>(&path) {
            Err(Error::Malformed { path: p, .. }) => assert_eq!(path, p),
            other => panic!("wanted a malformed-document error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_load_missing_author_is_malformed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("anonymous");
        fs::write(&path, "{\"en_US\": {\"title\": \"t\", \"content\": \"c\"}}")?;
        assert!(matches!(
            load_document::<Article>(&path),
            Err(Error::Malformed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_load_literal_strings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("forms");
        fs::write(
            &path,
            r#"{'author': 'It\'s me',  # escaped quote
    'en_US': {'title': 'Triple', 'content': '''<p>a</p>
<p>b</p>'''},
    'it_IT': {'title': 'Joined', 'content': ('<p>a</p>'
                                              '<p>b</p>')},
    'fr_FR': {'title': 'Escaped', 'content': '<p>a</p>\n<p>b</p>'},
}"#,
        )?;
        let article: Article = load_document(&path)?;
        assert_eq!("It's me", article.author);
        let content = |id: &str| article.translation(id).map(|t| t.content.as_str());
        assert_eq!(Some("<p>a</p>\n<p>b</p>"), content("en_US"));
        assert_eq!(Some("<p>a</p><p>b</p>"), content("it_IT"));
        assert_eq!(Some("<p>a</p>\n<p>b</p>"), content("fr_FR"));
        Ok(())
    }

    #[test]
    fn test_load_rejects_non_literal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for (name, source) in &[
            ("yaml", "author: Jane\n"),
            ("call", "dict(author='Jane')"),
            ("fstring", "{'author': f'{name}'}"),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, source)?;
            assert!(
                matches!(
                    load_document::<Article>(&path),
                    Err(Error::Malformed {
                        err: literal::Error::Syntax { .. },
                        ..
                    })
                ),
                "{} loaded",
                name
            );
        }
        Ok(())
    }

    #[test]
    fn test_list_content_skips_hidden_and_sorts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in &["b", ".hidden", "a", "c"] {
            fs::write(dir.path().join(name), "")?;
        }
        let listed: Vec<String> = list_content(dir.path())?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(vec!["a", "b", "c"], listed);
        Ok(())
    }

    #[test]
    fn test_select_articles_recent_first() {
        let articles = vec![
            article("old", "Jane", &["en_US"], 1),
            article("new", "Jane", &["en_US"], 3),
            article("mid", "Jane", &["en_US", "it_IT"], 2),
            article("italian", "Jane", &["it_IT"], 4),
        ];
        let selected = select_articles(&articles, "en_US", Sort::LastEditRecentToOld, None);
        assert_eq!(vec!["new", "mid", "old"], names(&selected));
        for pair in selected.windows(2) {
            assert!(pair[0].modified >= pair[1].modified);
        }
    }

    #[test]
    fn test_select_articles_by_author() {
        let articles = vec![
            article("a", "Jane", &["en_US"], 1),
            article("b", "John", &["en_US"], 2),
            article("c", "Jane", &["en_US"], 3),
        ];
        let selected = select_articles(&articles, "en_US", Sort::LastEditRecentToOld, Some("Jane"));
        assert_eq!(vec!["c", "a"], names(&selected));
    }

    #[test]
    fn test_select_articles_unknown_sort_keeps_order() {
        let articles = vec![
            article("a", "Jane", &["en_US"], 1),
            article("b", "Jane", &["en_US"], 2),
        ];
        let selected = select_articles(&articles, "en_US", Sort::from("alphabetical"), None);
        assert_eq!(vec!["a", "b"], names(&selected));
    }
}
