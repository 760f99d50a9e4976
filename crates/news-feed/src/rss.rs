use briefing_core::{FetchError, Headline};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
}

fn field_of(tag: &BytesStart<'_>) -> Option<Field> {
    field_named(tag.name().as_ref())
}

fn is_item(name: &[u8]) -> bool {
    name == b"item" || name == b"entry"
}

/// Parse the first `limit` items of an RSS 2.0 (or Atom) feed, in document order.
///
/// Items without both a title and a link are skipped.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<Headline>, FetchError> {
    let mut reader = Reader::from_str(xml);

    let mut headlines = Vec::with_capacity(limit);
    let mut in_item = false;
    let mut current: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();

    while headlines.len() < limit {
        let event = reader
            .read_event()
            .map_err(|e| FetchError::Malformed(format!("feed XML at {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(tag) => {
                if is_item(tag.name().as_ref()) {
                    in_item = true;
                    title.clear();
                    link.clear();
                } else if in_item && current.is_none() {
                    current = field_of(&tag);
                }
            }
            // Atom: <link href="..."/>
            Event::Empty(tag) if in_item && field_of(&tag) == Some(Field::Link) && link.is_empty() => {
                if let Some(href) = tag
                    .try_get_attribute("href")
                    .map_err(|e| FetchError::Malformed(e.to_string()))?
                {
                    let value = href
                        .unescape_value()
                        .map_err(|e| FetchError::Malformed(e.to_string()))?;
                    link.push_str(&value);
                }
            }
            Event::Text(text) => {
                if let Some(field) = current {
                    let value = text.unescape().map_err(|e| FetchError::Malformed(e.to_string()))?;
                    push_field(field, &value, &mut title, &mut link);
                }
            }
            Event::CData(data) => {
                if let Some(field) = current {
                    let raw = data.into_inner();
                    let value = String::from_utf8_lossy(&raw);
                    push_field(field, &value, &mut title, &mut link);
                }
            }
            Event::End(tag) => {
                if is_item(tag.name().as_ref()) {
                    in_item = false;
                    current = None;
                    let title = collapse_whitespace(&title);
                    let link = link.trim();
                    if !title.is_empty() && !link.is_empty() {
                        headlines.push(Headline {
                            title,
                            link: link.to_string(),
                        });
                    }
                } else if current.is_some() && field_named(tag.name().as_ref()) == current {
                    current = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(headlines)
}

fn field_named(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_field(field: Field, value: &str, title: &mut String, link: &mut String) {
    match field {
        Field::Title => title.push_str(value),
        Field::Link => link.push_str(value),
    }
}

/// Cut a title at the first occurrence of `delimiter`, e.g. a trailing " - Source".
pub fn truncate_title(title: &str, delimiter: Option<&str>) -> String {
    let cut = match delimiter.filter(|d| !d.is_empty()) {
        Some(d) => title.split(d).next().unwrap_or(title),
        None => title,
    };
    cut.trim().to_string()
}
