//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: loading the content documents
//! ([`crate::document`]), creating the output directory skeleton, copying the
//! static resources, writing article, author, and archive pages
//! ([`crate::write`]), linking each locale's `index.html` to the home page,
//! and writing the sitemap ([`crate::sitemap`]).

use crate::config::{Config, Locale};
use crate::document::{Article, Author, Document, Error as DocumentError};
use crate::index::AuthorScan;
use crate::sitemap::{Error as SitemapError, Sitemap};
use crate::template::Error as TemplateError;
use crate::write::{Error as WriteError, Templates, Writer};
use log::{debug, info};
use std::fmt;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The page directories created for every locale.
const PAGE_DIRECTORIES: [&str; 3] = ["articles", "authors", "archive"];

/// Builds the site from a [`Config`] object. Content documents are loaded in
/// file name order, then pages are written for articles, then for authors
/// (author page followed by archive page). Existing output is overwritten in
/// place; nothing is deleted.
pub fn build_site(config: &Config) -> Result<()> {
    let articles: Vec<Document<Article>> = Document::load_all(&config.articles_directory)?;
    let authors: Vec<Document<Author>> = Document::load_all(&config.authors_directory)?;
    let templates = Templates::load(&config.templates_directory)?;
    info!(
        "loaded {} articles, {} authors, {} locales",
        articles.len(),
        authors.len(),
        config.locales.len()
    );

    build_tree(&config.output_directory, &config.locales)?;
    copy_resources(
        &config.resources_source_directory,
        &config.resources_output_directory,
    )?;

    let index = AuthorScan::new(&authors);
    let writer = Writer {
        site: &config.site,
        locales: &config.locales,
        articles: &articles,
        authors: &index,
        templates: &templates,
        output_directory: &config.output_directory,
    };
    let mut sitemap = Sitemap::new();
    for article in &articles {
        writer.write_article(article, &mut sitemap)?;
    }
    for author in &authors {
        writer.write_author(author, &mut sitemap)?;
        writer.write_archive(author, &mut sitemap)?;
    }
    info!("wrote {} pages", sitemap.entries().len());

    for locale in &config.locales {
        link_homepage(&config.output_directory, locale, &config.site.homepage)?;
    }

    let path = sitemap.finalize(&config.output_directory)?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Creates the output directory skeleton: `res/` and, for each locale, the
/// locale root and its page directories. Existing directories are fine.
pub fn build_tree(output_directory: &Path, locales: &[Locale]) -> Result<()> {
    mkdir(&output_directory.join("res"))?;
    for locale in locales {
        for dir in PAGE_DIRECTORIES.iter() {
            mkdir(&locale.output_path(output_directory, dir))?;
        }
    }
    Ok(())
}

fn mkdir(path: &Path) -> Result<()> {
    create_dir_all(path).map_err(|err| Error::CreateDirectory {
        path: path.to_owned(),
        err,
    })
}

/// Copies the resources in `src` into `dst`, recreating sub-directories and
/// overwriting existing files. Hidden entries are skipped. A missing `src`
/// means there are no resources.
pub fn copy_resources(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        debug!("no resources in {}", src.display());
        return Ok(());
    }
    let entries = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
    for result in entries {
        let entry = result?;
        // strip_prefix() should never fail since every entry is under `src`
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            mkdir(&target)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|err| Error::Copy {
                src: entry.path().to_owned(),
                dst: target.clone(),
                err,
            })?;
        }
    }
    Ok(())
}

/// Points `index.html` in `locale`'s root at the home page document,
/// replacing whatever `index.html` was there.
pub fn link_homepage(output_directory: &Path, locale: &Locale, homepage: &str) -> Result<()> {
    let link = locale.output_path(output_directory, "/index.html");
    let target = PathBuf::from(format!("{}.html", homepage.trim_start_matches('/')));
    if link.symlink_metadata().is_ok() {
        std::fs::remove_file(&link).map_err(|err| Error::Link {
            path: link.clone(),
            err,
        })?;
    }
    make_link(&target, &link).map_err(|err| Error::Link {
        path: link.clone(),
        err,
    })?;
    debug!("linked {} to {}", link.display(), target.display());
    Ok(())
}

/// Creates a symlink at `link` to `target`, relative to the link's directory.
#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Copies `target` (relative to the link's directory) to `link`.
#[cfg(not(unix))]
fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    let dir = link.parent().unwrap_or_else(|| Path::new("."));
    std::fs::copy(dir.join(target), link).map(|_| ())
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading content,
/// writing pages, creating output directories, copying resources, linking
/// home pages, and writing the sitemap.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading content documents.
    Document(DocumentError),

    /// Returned for errors loading template files.
    Template(TemplateError),

    /// Returned for errors writing pages.
    Write(WriteError),

    /// Returned for errors writing the sitemap.
    Sitemap(SitemapError),

    /// Returned when an output directory can't be created.
    CreateDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when a resource can't be copied.
    Copy {
        src: PathBuf,
        dst: PathBuf,
        err: std::io::Error,
    },

    /// Returned when walking the resource directory fails.
    WalkDir(walkdir::Error),

    /// Returned when a locale's `index.html` can't be linked.
    Link { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Document(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Sitemap(err) => err.fmt(f),
            Error::CreateDirectory { path, err } => {
                write!(f, "creating directory '{}': {}", path.display(), err)
            }
            Error::Copy { src, dst, err } => write!(
                f,
                "copying '{}' to '{}': {}",
                src.display(),
                dst.display(),
                err
            ),
            Error::WalkDir(err) => err.fmt(f),
            Error::Link { path, err } => {
                write!(f, "linking '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Document(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Sitemap(err) => Some(err),
            Error::CreateDirectory { path: _, err } => Some(err),
            Error::Copy { err, .. } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Link { path: _, err } => Some(err),
        }
    }
}

impl From<DocumentError> for Error {
    /// Converts [`DocumentError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DocumentError) -> Error {
        Error::Document(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<SitemapError> for Error {
    /// Converts [`SitemapError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: SitemapError) -> Error {
        Error::Sitemap(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const ARTICLE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html id="html"><head id="head"></head><body>
<a id="author"></a><h1 id="title"></h1><p id="date"></p><p id="last-edit"></p>
<div id="content"></div><div id="locales"></div><footer id="license"></footer>
</body></html>"#;

    const AUTHOR_TEMPLATE: &str = r#"<!DOCTYPE html>
<html id="html"><head id="head"></head><body>
<h1 id="author"></h1><div id="sections"></div><div id="contacts"></div>
<div id="locales"></div><footer id="license"></footer>
</body></html>"#;

    const ARCHIVE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html id="html"><head id="head"></head><body>
<a id="author"></a><h1 id="title"></h1><div id="body"></div>
<div id="locales"></div><footer id="license"></footer>
</body></html>"#;

    const EN_US: &str = r#"{"ISO/IEC 15897": "en_US", "code": "en", "articles": "Articles",
        "archive": "Archive", "archive head": "Archive of ", "contacts": "Contacts",
        "created": "Created: ", "last-edit": "Last edit: ", "cc": "<a>CC BY-SA 4.0</a>"}"#;

    const IT_IT: &str = r#"{"ISO/IEC 15897": "it_IT", "code": "it", "articles": "Articoli",
        "archive": "Archivio", "archive head": "Archivio di ", "contacts": "Contatti",
        "created": "Creato: ", "last-edit": "Modificato: ", "cc": "<a>CC BY-SA 4.0</a>"}"#;

    /// Writes the content directory of the end-to-end scenario: one locale,
    /// one article, one author.
    fn content(root: &Path) -> std::io::Result<PathBuf> {
        let content = root.join("content");
        for dir in &["locales", "templates", "articles", "authors", "res/css"] {
            fs::create_dir_all(content.join(dir))?;
        }
        fs::write(
            content.join("config"),
            r#"{"locale": "en_US", "domain": "https://x.test",
                "homepage": "/articles/hello", "license": "cc"}"#,
        )?;
        fs::write(content.join("locales/en_US"), EN_US)?;
        fs::write(content.join("templates/article.html"), ARTICLE_TEMPLATE)?;
        fs::write(content.join("templates/author.html"), AUTHOR_TEMPLATE)?;
        fs::write(content.join("templates/archive.html"), ARCHIVE_TEMPLATE)?;
        fs::write(
            content.join("articles/hello"),
            r#"{"en_US": {"title": "Hi", "content": "<p>hi</p>"},
                "author": "Jane", "date": "2020/01/01"}"#,
        )?;
        fs::write(content.join("authors/jane"), r#"{"author": "Jane", "sections": []}"#)?;
        fs::write(content.join("res/css/style.css"), "body {}")?;
        fs::write(content.join("res/.swp"), "")?;
        Ok(content)
    }

    fn build(content: &Path, output: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        build_site(&Config::from_directory(content, output)?)?;
        Ok(())
    }

    #[test]
    fn test_end_to_end() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        let output = dir.path().join("build");
        build(&content, &output)?;

        let article = fs::read_to_string(output.join("articles/hello.html"))?;
        assert!(article.contains("<title>Hi</title>"));
        assert!(article.contains(r#"<h1 id="title">Hi</h1>"#));
        assert!(article.contains("<p>hi</p>"));
        assert!(article.contains(r#"href="https://x.test/authors/jane.html""#));
        assert!(article.contains("Created: 01 January 2020"));
        assert!(article.contains("<a>CC BY-SA 4.0</a>"));

        assert!(output.join("authors/jane.html").is_file());
        assert!(output.join("archive/jane.html").is_file());
        assert_eq!("body {}", fs::read_to_string(output.join("res/css/style.css"))?);
        assert!(!output.join("res/.swp").exists());

        let index = output.join("index.html");
        assert!(fs::symlink_metadata(&index)?.file_type().is_symlink());
        assert_eq!(article, fs::read_to_string(&index)?);

        let sitemap = fs::read_to_string(output.join("sitemap.xml"))?;
        assert_eq!(3, sitemap.matches("<url>").count());
        assert!(sitemap.contains("<loc>https://x.test/articles/hello.html</loc>"));
        assert!(sitemap.contains("<loc>https://x.test/authors/jane.html</loc>"));
        assert!(sitemap.contains("<loc>https://x.test/archive/jane.html</loc>"));
        Ok(())
    }

    #[test]
    fn test_second_locale() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        fs::write(content.join("locales/it_IT"), IT_IT)?;
        let output = dir.path().join("build");
        build(&content, &output)?;

        // the article has no Italian translation, the author page exists in
        // every locale, the archive only where the author has articles
        assert!(!output.join("it/articles/hello.html").exists());
        assert!(output.join("it/authors/jane.html").is_file());
        assert!(!output.join("it/archive/jane.html").exists());
        assert!(output.join("it/articles").is_dir());

        let link = output.join("it/index.html");
        assert_eq!(Path::new("articles/hello.html"), fs::read_link(&link)?);

        let sitemap = fs::read_to_string(output.join("sitemap.xml"))?;
        assert_eq!(4, sitemap.matches("<url>").count());
        assert!(sitemap.contains(r#"hreflang="it" href="https://x.test/it/authors/jane.html""#));
        Ok(())
    }

    #[test]
    fn test_rebuild_is_identical() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        let output = dir.path().join("build");
        build(&content, &output)?;
        let pages = [
            "articles/hello.html",
            "authors/jane.html",
            "archive/jane.html",
            "index.html",
            "sitemap.xml",
        ];
        let first: Vec<Vec<u8>> = pages
            .iter()
            .map(|p| fs::read(output.join(p)))
            .collect::<std::io::Result<_>>()?;

        build(&content, &output)?;
        for (page, before) in pages.iter().zip(first) {
            assert_eq!(before, fs::read(output.join(page))?, "{} changed", page);
        }
        Ok(())
    }

    #[test]
    fn test_untranslated_article_by_unknown_author(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        fs::write(
            content.join("articles/draft"),
            r#"{"de_DE": {"title": "Entwurf", "content": "<p>x</p>"}, "author": "Guest"}"#,
        )?;
        let output = dir.path().join("build");
        build(&content, &output)?;

        assert!(output.join("articles/hello.html").is_file());
        assert!(!output.join("articles/draft.html").exists());
        let sitemap = fs::read_to_string(output.join("sitemap.xml"))?;
        assert_eq!(3, sitemap.matches("<url>").count());
        Ok(())
    }

    #[test]
    fn test_unknown_author_aborts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        fs::write(content.join("authors/jane"), r#"{"author": "Jane Doe"}"#)?;
        let output = dir.path().join("build");
        let result = build_site(&Config::from_directory(&content, &output)?);
        assert!(matches!(
            result,
            Err(Error::Write(WriteError::UnknownAuthor { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_template_aborts_before_writing(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let content = content(dir.path())?;
        fs::remove_file(content.join("templates/archive.html"))?;
        let output = dir.path().join("build");
        let result = build_site(&Config::from_directory(&content, &output)?);
        assert!(matches!(result, Err(Error::Template(TemplateError::Open { .. }))));
        assert!(!output.exists());
        Ok(())
    }
}
