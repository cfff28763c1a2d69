//! Accumulates the site's URLs during a build and writes them out as a
//! `sitemap.xml` document, including `xhtml:link` alternates for every locale
//! a page exists in.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use url::Url;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// How often a page is expected to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        })
    }
}

/// A single `<url>` entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub location: Url,

    /// `YYYY-MM-DD`.
    pub last_modified: Option<String>,

    /// The page's URL in every locale it exists in, keyed by locale code.
    pub alternates: Vec<(String, Url)>,

    pub change_frequency: ChangeFrequency,

    /// Between 0.0 and 1.0.
    pub priority: f32,
}

/// The URLs registered so far in a build.
#[derive(Default)]
pub struct Sitemap {
    entries: Vec<Entry>,
}

impl Sitemap {
    pub fn new() -> Sitemap {
        Sitemap::default()
    }

    /// Registers a URL. Entries aren't deduplicated.
    pub fn add_url(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Writes the sitemap document into `w`.
    pub fn write_to<W: Write>(&self, w: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(w, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("urlset")
                .with_attributes([("xmlns:xhtml", XHTML_NAMESPACE), ("xmlns", SITEMAP_NAMESPACE)]),
        ))?;
        for entry in &self.entries {
            write_entry(&mut writer, entry)?;
        }
        writer.write_event(Event::End(BytesEnd::new("urlset")))?;
        writer.into_inner().flush()?;
        Ok(())
    }

    /// Writes the sitemap to `{directory}/sitemap.xml`. Consumes the
    /// accumulator: a build finalizes its sitemap exactly once.
    pub fn finalize(self, directory: &Path) -> Result<PathBuf> {
        let path = directory.join("sitemap.xml");
        let file = File::create(&path).map_err(|err| Error::Create {
            path: path.clone(),
            err,
        })?;
        self.write_to(BufWriter::new(file))?;
        Ok(path)
    }
}

fn write_entry<W: Write>(writer: &mut Writer<W>, entry: &Entry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    write_text_element(writer, "loc", entry.location.as_str())?;
    if let Some(last_modified) = &entry.last_modified {
        write_text_element(writer, "lastmod", last_modified)?;
    }
    for (code, url) in &entry.alternates {
        writer.write_event(Event::Empty(BytesStart::new("xhtml:link").with_attributes([
            ("rel", "alternate"),
            ("hreflang", code.as_str()),
            ("href", url.as_str()),
        ])))?;
    }
    write_text_element(writer, "changefreq", &entry.change_frequency.to_string())?;
    write_text_element(writer, "priority", &format!("{:.1}", entry.priority))?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing a sitemap.
#[derive(Debug)]
pub enum Error {
    /// Returned when the sitemap file can't be created.
    Create { path: PathBuf, err: std::io::Error },

    /// Returned when there is an XML serialization error.
    Xml(quick_xml::Error),

    /// Returned when there is a generic I/O error.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Create { path, err } => {
                write!(f, "creating sitemap `{}`: {}", path.display(), err)
            }
            Error::Xml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Create { path: _, err } => Some(err),
            Error::Xml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<quick_xml::Error> for Error {
    /// Converts [`quick_xml::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible sitemap operations.
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible sitemap operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
