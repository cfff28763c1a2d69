use super::{Error, Result, Writer, ARTICLE, AUTHOR};
use crate::config::Locale;
use crate::date::{human_calendar_date, human_date, sitemap_date};
use crate::document::{Article, Document, Translation};
use crate::sitemap::Sitemap;
use crate::template::{insert_markup, set_attribute, set_text};
use log::debug;
use std::path::PathBuf;

impl Writer<'_> {
    /// Writes one page for each locale `article` is translated into and
    /// returns the paths written. An article with no translation in any of
    /// the site's locales writes nothing, and its author isn't looked up.
    pub fn write_article(
        &self,
        article: &Document<Article>,
        sitemap: &mut Sitemap,
    ) -> Result<Vec<PathBuf>> {
        let translations: Vec<(&Locale, &Translation)> = self
            .locales
            .iter()
            .filter_map(|l| article.content.translation(&l.id).map(|t| (l, t)))
            .collect();
        if translations.is_empty() {
            debug!("article `{}`: no translation in any locale", article.name);
            return Ok(Vec::new());
        }
        let path = ARTICLE.path(&article.name);
        let converter = self.converter();
        let alternates = converter.alternates(translations.iter().map(|(l, _)| *l), &path)?;

        let author_page = self
            .authors
            .page_name(&article.content.author)
            .ok_or_else(|| Error::UnknownAuthor {
                article: article.name.clone(),
                author: article.content.author.clone(),
            })?;
        let author_path = AUTHOR.path(author_page);

        let mut written = Vec::with_capacity(translations.len());
        for (locale, translation) in translations {
            let page = self.page(
                &ARTICLE,
                &self.templates.article,
                locale,
                &alternates,
                &translation.title,
            )?;
            let template = &page.template;

            let byline = template.find("author")?;
            set_text(&byline, &article.content.author);
            set_attribute(
                &byline,
                "href",
                converter.page_url(locale, &author_path)?.as_str(),
            );

            set_text(&template.find("title")?, &translation.title);
            insert_markup(&template.find("content")?, &translation.content);

            if let Some(date) = &article.content.date {
                set_text(
                    &template.find("date")?,
                    &format!("{}{}", locale.created, human_calendar_date(date, &locale.id)),
                );
            }
            set_text(
                &template.find("last-edit")?,
                &format!("{}{}", locale.last_edit, human_date(&article.modified, &locale.id)),
            );

            written.push(self.finish(
                &ARTICLE,
                &article.name,
                page,
                sitemap_date(&article.modified),
                sitemap,
            )?);
        }
        Ok(written)
    }
}
