use super::{Result, Writer, ARCHIVE, ARTICLE, AUTHOR};
use crate::config::Locale;
use crate::date::sitemap_date;
use crate::document::{select_articles, Author, Document, Sort, Translation};
use crate::sitemap::Sitemap;
use crate::template::{append_child, element, insert_markup, insert_text, set_text, text_element};
use kuchikiki::NodeRef;
use log::debug;
use std::path::PathBuf;

/// The number of articles listed on an author page. Authors with more
/// articles get a link to their archive page.
const LATEST_ARTICLES: usize = 5;

impl Writer<'_> {
    /// Writes one author page for each locale and returns the paths written.
    pub fn write_author(
        &self,
        author: &Document<Author>,
        sitemap: &mut Sitemap,
    ) -> Result<Vec<PathBuf>> {
        let path = AUTHOR.path(&author.name);
        let alternates = self.converter().alternates(self.locales, &path)?;

        let mut written = Vec::with_capacity(self.locales.len());
        for locale in self.locales {
            let page = self.page(
                &AUTHOR,
                &self.templates.author,
                locale,
                &alternates,
                &author.content.author,
            )?;
            let template = &page.template;
            set_text(&template.find("author")?, &author.content.author);

            let sections = template.find("sections")?;
            append_child(&sections, self.latest_articles(locale, author)?);
            for section in &author.content.sections {
                match section.get(&locale.id) {
                    Some(translation) => append_child(&sections, section_element(translation)?),
                    None => debug!(
                        "author `{}`: section has no `{}` translation",
                        author.name, locale.id
                    ),
                }
            }

            let contacts = template.find("contacts")?;
            append_child(&contacts, text_element("h2", &[], &locale.contacts)?);
            append_child(&contacts, contact_list(&author.content)?);
            append_child(&sections, contacts);

            written.push(self.finish(
                &AUTHOR,
                &author.name,
                page,
                sitemap_date(&author.modified),
                sitemap,
            )?);
        }
        Ok(written)
    }

    /// Builds the `#last-articles` block: the author's most recently edited
    /// articles in `locale`, plus an archive link if there are more.
    fn latest_articles(&self, locale: &Locale, author: &Document<Author>) -> Result<NodeRef> {
        let converter = self.converter();
        let block = element("div", &[("id", "last-articles")])?;
        append_child(&block, text_element("h2", &[], &locale.articles)?);

        let list = element("ul", &[])?;
        let articles = select_articles(
            self.articles,
            &locale.id,
            Sort::LastEditRecentToOld,
            Some(author.content.author.as_str()),
        );
        for article in articles.iter().take(LATEST_ARTICLES) {
            if let Some(translation) = article.content.translation(&locale.id) {
                let url = converter.page_url(locale, &ARTICLE.path(&article.name))?;
                append_child(&list, Self::link_item(&url, &translation.title)?);
            }
        }
        if articles.len() > LATEST_ARTICLES {
            let url = converter.page_url(locale, &ARCHIVE.path(&author.name))?;
            append_child(
                &list,
                text_element(
                    "a",
                    &[("class", "archive"), ("href", url.as_str()), ("id", "archive")],
                    &locale.archive,
                )?,
            );
        }
        append_child(&block, list);
        Ok(block)
    }
}

/// Builds a section block. Its id is the section title with spaces replaced by
/// underscores.
fn section_element(translation: &Translation) -> Result<NodeRef> {
    let id = translation.title.replace(' ', "_");
    let section = element("div", &[("id", id.as_str())])?;
    append_child(&section, text_element("h2", &[], &translation.title)?);
    let content = element("div", &[])?;
    insert_markup(&content, &translation.content);
    append_child(&section, content);
    Ok(section)
}

/// How a contact value is rendered.
enum Contact {
    /// A link whose target is the value with a URI scheme prepended.
    Link(&'static str),

    /// A key or address, rendered verbatim.
    Hash,
}

/// Builds the `#contact_types` list with one item per contact field the
/// author has filled in.
fn contact_list(author: &Author) -> Result<NodeRef> {
    let fields = [
        ("xmpp", "XMPP", &author.xmpp, Contact::Link("xmpp:")),
        ("email", "Email", &author.email, Contact::Link("mailto:")),
        ("pgp", "PGP", &author.pgp, Contact::Hash),
        ("doge", "DOGE", &author.doge, Contact::Hash),
        ("btc", "BTC", &author.btc, Contact::Hash),
    ];

    let list = element("ul", &[("id", "contact_types")])?;
    for (id, label, value, contact) in fields.iter() {
        let value = match value {
            Some(value) => value,
            None => continue,
        };
        let item = element("li", &[("id", *id)])?;
        insert_text(&item, &format!("{}: ", label));
        let node = match contact {
            Contact::Link(scheme) => {
                let link_id = format!("{}_link", id);
                let href = format!("{}{}", scheme, value);
                text_element("a", &[("href", href.as_str()), ("id", link_id.as_str())], value)?
            }
            Contact::Hash => text_element("span", &[("class", "hash")], value)?,
        };
        append_child(&item, node);
        append_child(&list, item);
    }
    Ok(list)
}
