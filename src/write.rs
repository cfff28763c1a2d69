//! Fills templates from content documents and writes the resulting pages to
//! disk, one page per document per locale, registering each page with the
//! [`Sitemap`]. Three kinds of pages exist:
//!
//! 1. Article pages ([`Writer::write_article`]), one per locale the article
//!    is translated into.
//! 2. Author pages ([`Writer::write_author`]), one per locale. They list the
//!    author's latest articles, the author's sections and contacts.
//! 3. Archive pages ([`Writer::write_archive`]), one per locale in which the
//!    author has written at least one article.
//!
//! All pages share the same scaffolding: a `lang` attribute on `#html`, a
//! `<title>` in `#head`, the locale navigation in `#locales`, and the license
//! text in `#license`.

mod archive;
mod article;
mod author;

use crate::config::{Locale, Site};
use crate::document::{Article, Document};
use crate::index::AuthorIndex;
use crate::sitemap::{ChangeFrequency, Entry, Sitemap};
use crate::template::{
    self, append_child, element, insert_markup, insert_text, set_attribute, text_element, Template,
};
use crate::url::Converter;
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Template sources, read once per build.
pub struct Templates {
    pub article: String,
    pub author: String,
    pub archive: String,
}

impl Templates {
    /// Reads `article.html`, `author.html`, and `archive.html` from `dir`.
    pub fn load(dir: &Path) -> template::Result<Templates> {
        Ok(Templates {
            article: Template::read_source(dir, "article")?,
            author: Template::read_source(dir, "author")?,
            archive: Template::read_source(dir, "archive")?,
        })
    }
}

/// Responsible for templating and writing HTML pages to disk from content
/// [`Document`]s.
pub struct Writer<'a> {
    /// The site configuration.
    pub site: &'a Site,

    /// Every locale of the site, in navigation order.
    pub locales: &'a [Locale],

    /// Every article of the site. Author and archive pages select from these.
    pub articles: &'a [Document<Article>],

    /// Resolves article bylines to author pages.
    pub authors: &'a dyn AuthorIndex,

    pub templates: &'a Templates,

    /// The root output directory. Locale-prefixed paths are relative to it.
    pub output_directory: &'a Path,
}

/// Per-page constants for the sitemap.
struct PageKind {
    template: &'static str,
    directory: &'static str,
    change_frequency: ChangeFrequency,
    priority: f32,
}

const ARTICLE: PageKind = PageKind {
    template: "article",
    directory: "articles",
    change_frequency: ChangeFrequency::Monthly,
    priority: 0.8,
};

const AUTHOR: PageKind = PageKind {
    template: "author",
    directory: "authors",
    change_frequency: ChangeFrequency::Monthly,
    priority: 1.0,
};

const ARCHIVE: PageKind = PageKind {
    template: "archive",
    directory: "archive",
    change_frequency: ChangeFrequency::Monthly,
    priority: 0.5,
};

impl PageKind {
    /// The site path of the page `name`, e.g. `/articles/hello.html`.
    fn path(&self, name: &str) -> String {
        format!("/{}/{}.html", self.directory, name)
    }
}

/// A page being filled for one locale, along with the URLs of its siblings
/// in other locales.
struct Page<'t> {
    template: Template,
    locale: &'t Locale,
    alternates: &'t [(String, Url)],
}

impl<'a> Writer<'a> {
    fn converter(&self) -> Converter<'a> {
        let site: &'a Site = self.site;
        Converter::new(&site.domain)
    }

    /// Parses `source` and fills in the scaffolding common to all pages.
    fn page<'t>(
        &self,
        kind: &PageKind,
        source: &str,
        locale: &'t Locale,
        alternates: &'t [(String, Url)],
        title: &str,
    ) -> Result<Page<'t>> {
        let template = Template::parse(kind.template, source);
        set_attribute(&template.find("html")?, "lang", &locale.code);
        append_child(&template.find("head")?, text_element("title", &[], title)?);

        let nav = template.find("locales")?;
        for (code, url) in alternates {
            if *code == locale.code {
                insert_text(&nav, &format!("[{}]", code));
            } else {
                insert_text(&nav, "[");
                append_child(&nav, text_element("a", &[("href", url.as_str())], code)?);
                insert_text(&nav, "]");
            }
        }

        // Locales are validated to carry the configured license on load.
        if let Some(license) = locale.license(&self.site.license) {
            insert_markup(&template.find("license")?, license);
        }

        Ok(Page {
            template,
            locale,
            alternates,
        })
    }

    /// Registers `page` with the sitemap and writes it to its locale's path.
    fn finish(
        &self,
        kind: &PageKind,
        name: &str,
        page: Page,
        last_modified: String,
        sitemap: &mut Sitemap,
    ) -> Result<PathBuf> {
        let path = kind.path(name);
        sitemap.add_url(Entry {
            location: self.converter().page_url(page.locale, &path)?,
            last_modified: Some(last_modified),
            alternates: page.alternates.to_vec(),
            change_frequency: kind.change_frequency,
            priority: kind.priority,
        });
        let output = page.locale.output_path(self.output_directory, &path);
        page.template.save(&output)?;
        debug!("wrote {}", output.display());
        Ok(output)
    }

    /// Returns an `<a>` element linking to `url` with the text `text`, wrapped
    /// in an `<li>`.
    fn link_item(url: &Url, text: &str) -> Result<kuchikiki::NodeRef> {
        let li = element("li", &[])?;
        append_child(&li, text_element("a", &[("href", url.as_str())], text)?);
        Ok(li)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error loading or filling a template.
    Template(template::Error),

    /// Returned when an article's author matches no author document.
    UnknownAuthor { article: String, author: String },

    /// Returned when a page URL can't be built.
    UrlParse(url::ParseError),
}

impl From<template::Error> for Error {
    /// Converts a [`template::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible template operations.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UnknownAuthor { article, author } => {
                write!(f, "article `{}`: no author document for `{}`", article, author)
            }
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::UnknownAuthor { .. } => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}
