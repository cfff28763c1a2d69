//! The library code for the `alsangue` static site generator. A site is a
//! content directory holding a `config` document, locale descriptors,
//! article and author documents, HTML templates, and static resources. The
//! build can be broken down into three steps:
//!
//! 1. Loading the configuration and the content documents ([`crate::config`],
//!    [`crate::document`], [`crate::literal`])
//! 2. Filling templates and writing pages, once per document per locale
//!    ([`crate::write`])
//! 3. Writing the sitemap of every page written ([`crate::sitemap`])
//!
//! Pages of the default locale live at the root of the output directory;
//! pages of every other locale live under a directory named after the
//! locale's code. [`crate::build::build_site`] ties the steps together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod date;
pub mod document;
pub mod index;
pub mod literal;
pub mod sitemap;
pub mod template;
pub mod url;
pub mod write;
