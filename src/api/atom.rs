//! Pull parser for the archive's Atom-formatted query responses.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One `<author>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomAuthor {
    pub name: String,
    pub affiliation: String,
}

/// One `<link>` element; only the target matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomLink {
    pub href: String,
}

/// One `<entry>` element of the feed. The canonical archive identifier
/// is the trailing segment of `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub title: String,
    pub id: String,
    pub links: Vec<AtomLink>,
    pub updated: String,
    pub published: String,
    pub summary: String,
    pub authors: Vec<AtomAuthor>,
    /// The first `<category>` term.
    pub category: String,
}

/// Text-bearing element currently open inside an `<entry>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Title,
    Id,
    Updated,
    Published,
    Summary,
    AuthorName,
    AuthorAffiliation,
}

/// Decode a feed body into its entries.
///
/// Malformed XML is never fatal: the warning is logged and an empty
/// list returned, which callers treat as "no results".
#[must_use]
pub fn parse_feed(xml: &str) -> Vec<AtomEntry> {
    match try_parse(xml) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("discarding malformed feed: {err}");
            Vec::new()
        }
    }
}

fn try_parse(xml: &str) -> Result<Vec<AtomEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<AtomEntry> = Vec::new();
    let mut in_entry = false;
    let mut in_author = false;
    let mut field = Field::None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    entries.push(AtomEntry::default());
                }
                b"author" if in_entry => {
                    in_author = true;
                    if let Some(entry) = entries.last_mut() {
                        entry.authors.push(AtomAuthor::default());
                    }
                }
                b"title" if in_entry => field = Field::Title,
                b"id" if in_entry => field = Field::Id,
                b"updated" if in_entry => field = Field::Updated,
                b"published" if in_entry => field = Field::Published,
                b"summary" if in_entry => field = Field::Summary,
                b"name" if in_author => field = Field::AuthorName,
                b"affiliation" if in_author => field = Field::AuthorAffiliation,
                b"link" if in_entry => push_link(entries.last_mut(), &e)?,
                b"category" if in_entry => set_category(entries.last_mut(), &e)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"link" if in_entry => push_link(entries.last_mut(), &e)?,
                b"category" if in_entry => set_category(entries.last_mut(), &e)?,
                _ => {}
            },
            Event::Text(t) => {
                if in_entry && field != Field::None {
                    let text = t.unescape()?;
                    if let Some(entry) = entries.last_mut() {
                        append_text(entry, field, &text);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = false;
                    field = Field::None;
                }
                b"author" => {
                    in_author = false;
                    field = Field::None;
                }
                _ => field = Field::None,
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn append_text(entry: &mut AtomEntry, field: Field, text: &str) {
    let target = match field {
        Field::Title => &mut entry.title,
        Field::Id => &mut entry.id,
        Field::Updated => &mut entry.updated,
        Field::Published => &mut entry.published,
        Field::Summary => &mut entry.summary,
        Field::AuthorName => match entry.authors.last_mut() {
            Some(author) => &mut author.name,
            None => return,
        },
        Field::AuthorAffiliation => match entry.authors.last_mut() {
            Some(author) => &mut author.affiliation,
            None => return,
        },
        Field::None => return,
    };
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

fn push_link(entry: Option<&mut AtomEntry>, e: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
    if let (Some(entry), Some(attr)) = (entry, e.try_get_attribute("href")?) {
        entry.links.push(AtomLink { href: attr.unescape_value()?.into_owned() });
    }
    Ok(())
}

fn set_category(entry: Option<&mut AtomEntry>, e: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
    if let (Some(entry), Some(attr)) = (entry, e.try_get_attribute("term")?) {
        if entry.category.is_empty() {
            entry.category = attr.unescape_value()?.into_owned();
        }
    }
    Ok(())
}
