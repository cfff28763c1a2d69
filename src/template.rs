//! A thin layer over [`kuchikiki`] for filling HTML templates. Templates are
//! ordinary HTML files whose placeholders are elements with an `id`; pages
//! are produced by locating those elements and inserting text, markup, or new
//! elements into them.

use kuchikiki::traits::TendrilSink;
use kuchikiki::NodeRef;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A parsed template, i.e. a mutable document tree.
pub struct Template {
    /// The template's name, for error messages.
    name: String,
    document: NodeRef,
}

impl Template {
    /// Reads the source of the template `{name}.html` in `dir`. Sources are
    /// read once and parsed for every page via [`Template::parse`].
    pub fn read_source(dir: &Path, name: &str) -> Result<String> {
        let path = dir.join(format!("{}.html", name));
        std::fs::read_to_string(&path).map_err(|err| Error::Open { path, err })
    }

    /// Loads the template `{name}.html` in `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Template> {
        Ok(Template::parse(name, &Template::read_source(dir, name)?))
    }

    /// Parses `markup` as the template `name`.
    pub fn parse(name: &str, markup: &str) -> Template {
        Template {
            name: name.to_owned(),
            document: kuchikiki::parse_html().one(markup),
        }
    }

    /// Returns the element whose `id` attribute is `id`.
    pub fn find(&self, id: &str) -> Result<NodeRef> {
        self.document
            .select_first(&format!("#{}", id))
            .map(|element| element.as_node().clone())
            .map_err(|_| Error::MissingSlot {
                template: self.name.clone(),
                id: id.to_owned(),
            })
    }

    /// Renders the document back to markup.
    pub fn serialize(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.document.serialize(&mut buf)?;
        String::from_utf8(buf).map_err(|_| Error::Encoding(self.name.clone()))
    }

    /// Renders the document into the file at `path`, replacing it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|err| Error::Create {
            path: path.to_owned(),
            err,
        })?;
        let mut w = BufWriter::new(file);
        self.document.serialize(&mut w)?;
        w.flush()?;
        Ok(())
    }
}

/// Parses a markup fragment into a list of detached nodes.
pub fn fragment(markup: &str) -> Vec<NodeRef> {
    let document = kuchikiki::parse_html().one(format!(
        "<!DOCTYPE html><html><head></head><body>{}</body></html>",
        markup
    ));
    let nodes: Vec<NodeRef> = match document.select_first("body") {
        Ok(body) => body.as_node().children().collect(),
        Err(_) => Vec::new(),
    };
    for node in &nodes {
        node.detach();
    }
    nodes
}

/// Creates a detached, empty `tag` element with the given attributes.
pub fn element(tag: &str, attributes: &[(&str, &str)]) -> Result<NodeRef> {
    let node = fragment(&format!("<{0}></{0}>", tag))
        .into_iter()
        .find(|node| node.as_element().is_some())
        .ok_or_else(|| Error::Element(tag.to_owned()))?;
    for (key, value) in attributes {
        set_attribute(&node, key, value);
    }
    Ok(node)
}

/// Creates a `tag` element containing the text `text`.
pub fn text_element(tag: &str, attributes: &[(&str, &str)], text: &str) -> Result<NodeRef> {
    let node = element(tag, attributes)?;
    insert_text(&node, text);
    Ok(node)
}

/// Appends `text` to `node` as a text node; it's escaped on serialization.
pub fn insert_text(node: &NodeRef, text: &str) {
    node.append(NodeRef::new_text(text));
}

/// Replaces the children of `node` with the text `text`.
pub fn set_text(node: &NodeRef, text: &str) {
    for child in node.children().collect::<Vec<_>>() {
        child.detach();
    }
    insert_text(node, text);
}

/// Parses `markup` and appends the resulting nodes to `node`.
pub fn insert_markup(node: &NodeRef, markup: &str) {
    for child in fragment(markup) {
        node.append(child);
    }
}

/// Sets the attribute `key` of the element `node`. Does nothing if `node`
/// isn't an element.
pub fn set_attribute(node: &NodeRef, key: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(key, value.to_owned());
    }
}

/// Appends `child` to `parent`, moving it if it's already in a tree.
pub fn append_child(parent: &NodeRef, child: NodeRef) {
    parent.append(child);
}

/// Represents the result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading, filling, or saving a [`Template`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file can't be read.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a template has no element with the expected `id`.
    MissingSlot { template: String, id: String },

    /// Returned when an element can't be created for a tag name.
    Element(String),

    /// Returned when a serialized template isn't valid UTF-8.
    Encoding(String),

    /// Returned when an output file can't be created.
    Create { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "opening template `{}`: {}", path.display(), err)
            }
            Error::MissingSlot { template, id } => {
                write!(f, "template `{}` has no element with id `{}`", template, id)
            }
            Error::Element(tag) => write!(f, "can't create a `{}` element", tag),
            Error::Encoding(template) => {
                write!(f, "template `{}` serialized to invalid UTF-8", template)
            }
            Error::Create { path, err } => {
                write!(f, "creating `{}`: {}", path.display(), err)
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
            Error::MissingSlot { .. } => None,
            Error::Element(_) => None,
            Error::Encoding(_) => None,
            Error::Create { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts an [`std::io::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible I/O operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
