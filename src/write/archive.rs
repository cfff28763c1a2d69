use super::{Result, Writer, ARCHIVE, ARTICLE, AUTHOR};
use crate::config::Locale;
use crate::date::sitemap_date;
use crate::document::{select_articles, Article, Author, Document, Sort};
use crate::sitemap::Sitemap;
use crate::template::{append_child, element, set_attribute, set_text};
use std::path::PathBuf;

impl<'a> Writer<'a> {
    /// Returns the locales in which `author` has written at least one
    /// article, each with those articles (most recently edited first).
    pub fn archive_locales(&self, author: &str) -> Vec<(&'a Locale, Vec<&'a Document<Article>>)> {
        let locales: &'a [Locale] = self.locales;
        let articles: &'a [Document<Article>] = self.articles;
        locales
            .iter()
            .map(|l| {
                (
                    l,
                    select_articles(articles, &l.id, Sort::LastEditRecentToOld, Some(author)),
                )
            })
            .filter(|(_, selected)| !selected.is_empty())
            .collect()
    }

    /// Writes one archive page listing the articles of `author` for each
    /// locale in which they have written, and returns the paths written.
    pub fn write_archive(
        &self,
        author: &Document<Author>,
        sitemap: &mut Sitemap,
    ) -> Result<Vec<PathBuf>> {
        let selected = self.archive_locales(&author.content.author);
        let path = ARCHIVE.path(&author.name);
        let author_path = AUTHOR.path(&author.name);
        let converter = self.converter();
        let alternates = converter.alternates(selected.iter().map(|(l, _)| *l), &path)?;

        let mut written = Vec::with_capacity(selected.len());
        for (locale, articles) in &selected {
            let locale: &Locale = locale;
            let page = self.page(
                &ARCHIVE,
                &self.templates.archive,
                locale,
                &alternates,
                &format!("{}{}", locale.archive_head, author.content.author),
            )?;
            let template = &page.template;

            let byline = template.find("author")?;
            set_text(&byline, &author.content.author);
            set_attribute(
                &byline,
                "href",
                converter.page_url(locale, &author_path)?.as_str(),
            );
            set_text(&template.find("title")?, &locale.archive);

            let list = element("ul", &[("id", "articles")])?;
            for article in articles {
                if let Some(translation) = article.content.translation(&locale.id) {
                    let url = converter.page_url(locale, &ARTICLE.path(&article.name))?;
                    append_child(&list, Self::link_item(&url, &translation.title)?);
                }
            }
            append_child(&template.find("body")?, list);

            written.push(self.finish(
                &ARCHIVE,
                &author.name,
                page,
                sitemap_date(&author.modified),
                sitemap,
            )?);
        }
        Ok(written)
    }
}
