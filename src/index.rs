//! Resolves an author's display name to the page describing them. Articles
//! only carry the author's name; the page name comes from the author file.

use crate::document::{Author, Document};

/// Looks up author pages by display name.
pub trait AuthorIndex {
    /// Returns the page name (the author file's name) of the author whose
    /// `author` field is `name`.
    fn page_name(&self, name: &str) -> Option<&str>;
}

/// An [`AuthorIndex`] which scans the author documents on every lookup.
pub struct AuthorScan<'a> {
    authors: &'a [Document<Author>],
}

impl<'a> AuthorScan<'a> {
    pub fn new(authors: &'a [Document<Author>]) -> AuthorScan<'a> {
        AuthorScan { authors }
    }
}

impl AuthorIndex for AuthorScan<'_> {
    fn page_name(&self, name: &str) -> Option<&str> {
        // The last match wins when two author files share a name.
        self.authors
            .iter()
            .rev()
            .find(|a| a.content.author == name)
            .map(|a| a.name.as_str())
    }
}
