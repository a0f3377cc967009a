//! Scraped feed JSON → RSS 2.0 XML.
//!
//! The stored document is `{ "channel": { title, description, link,
//! lastBuildDate, language, image?, items[] } }`. Every text and attribute
//! value is escaped; absent or `null` values are left out of the output.
//! Parsing is lenient below `channel`: a non-array `items` reads as empty and
//! non-object `image`, `guid` or `media:content` values read as absent.

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const MEDIA_NS: &str = "http://search.yahoo.com/mrss/";

#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    pub channel: Channel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub last_build_date: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub image: Option<Image>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Image {
    #[serde(default, deserialize_with = "scalar_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub guid: Option<Guid>,
    #[serde(default, rename = "dc:creator", deserialize_with = "scalar_text")]
    pub creator: Option<String>,
    #[serde(default, rename = "pubDate", deserialize_with = "scalar_text")]
    pub pub_date: Option<String>,
    #[serde(default, rename = "media:content", deserialize_with = "lenient_object")]
    pub media: Option<MediaContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Guid {
    #[serde(default, rename = "isPermaLink", deserialize_with = "scalar_text")]
    pub is_perma_link: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaContent {
    #[serde(default, deserialize_with = "scalar_text")]
    pub url: Option<String>,
}

/// Accepts strings, numbers and booleans as text; `null` means absent.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// An object, or nothing.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// The object entries of an array; anything else is an empty list.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Parses stored feed content. Invalid JSON or a missing `channel` is a
/// `Serialization` error.
pub fn parse_feed(content: &str) -> Result<FeedDocument, AppError> {
    serde_json::from_str(content)
        .map_err(|e| AppError::Serialization(format!("Invalid feed content: {e}")))
}

/// Parses and renders in one step.
pub fn feed_to_rss(content: &str) -> Result<String, AppError> {
    render_rss(&parse_feed(content)?)
}

pub fn render_rss(doc: &FeedDocument) -> Result<String, AppError> {
    let channel = &doc.channel;
    let mut writer = RssWriter(Writer::new_with_indent(Vec::new(), b' ', 2));

    writer.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:dc", DC_NS));
    rss.push_attribute(("xmlns:media", MEDIA_NS));
    writer.write(Event::Start(rss))?;
    writer.start("channel")?;

    writer.element("title", &channel.title)?;
    writer.element("description", &channel.description)?;
    writer.element("link", &channel.link)?;
    writer.element("lastBuildDate", &channel.last_build_date)?;
    writer.element("language", &channel.language)?;

    if let Some(image) = &channel.image {
        writer.start("image")?;
        writer.element("url", &image.url)?;
        writer.element("title", &image.title)?;
        writer.element("link", &image.link)?;
        writer.end("image")?;
    }

    for item in &channel.items {
        writer.start("item")?;
        writer.element("title", &item.title)?;
        writer.element("description", &item.description)?;
        writer.element("link", &item.link)?;
        if let Some(guid) = &item.guid {
            let mut start = BytesStart::new("guid");
            if let Some(perma) = &guid.is_perma_link {
                start.push_attribute(("isPermaLink", perma.as_str()));
            }
            writer.write(Event::Start(start))?;
            writer.text(guid.value.as_deref().unwrap_or_default())?;
            writer.end("guid")?;
        }
        writer.element("dc:creator", &item.creator)?;
        writer.element("pubDate", &item.pub_date)?;
        if let Some(url) = item.media.as_ref().and_then(|m| m.url.as_deref()) {
            let mut media = BytesStart::new("media:content");
            media.push_attribute(("url", url));
            writer.write(Event::Empty(media))?;
        }
        writer.end("item")?;
    }

    writer.end("channel")?;
    writer.end("rss")?;

    String::from_utf8(writer.0.into_inner())
        .map_err(|e| AppError::Serialization(format!("RSS output is not UTF-8: {e}")))
}

struct RssWriter(Writer<Vec<u8>>);

impl RssWriter {
    fn write(&mut self, event: Event<'_>) -> Result<(), AppError> {
        self.0
            .write_event(event)
            .map_err(|e| AppError::Serialization(format!("Failed to write RSS: {e}")))
    }

    fn start(&mut self, name: &str) -> Result<(), AppError> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), AppError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, value: &str) -> Result<(), AppError> {
        self.write(Event::Text(BytesText::from_escaped(escape(value))))
    }

    /// `<name>value</name>`, or nothing when the value is absent.
    fn element(&mut self, name: &str, value: &Option<String>) -> Result<(), AppError> {
        let Some(value) = value else {
            return Ok(());
        };
        self.start(name)?;
        self.text(value)?;
        self.end(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(json: &str) -> String {
        feed_to_rss(json).unwrap()
    }

    /// Text with all tags removed, for checking nothing raw leaks through.
    fn text_nodes(xml: &str) -> String {
        let mut out = String::new();
        let mut in_tag = false;
        for c in xml.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_channel_text_is_escaped() {
        let xml = render(r#"{"channel": {"title": "A & B", "description": "<d>", "items": []}}"#);

        assert!(xml.contains("<title>A &amp; B</title>"));
        assert!(xml.contains("<description>&lt;d&gt;</description>"));
        assert!(!xml.contains("<link>"));

        let text = text_nodes(&xml);
        assert!(!text.contains('<') && !text.contains('>'));
        assert!(!text.replace("&amp;", "").replace("&lt;", "").replace("&gt;", "").contains('&'));
    }

    #[test]
    fn test_image_children_escaped() {
        let xml = render(
            r#"{"channel": {"title": "t", "image": {"url": "http://x/?a=1&b=2", "title": "O'Hare", "link": "http://x"}, "items": []}}"#,
        );
        assert!(xml.contains("<image>"));
        assert!(xml.contains("<url>http://x/?a=1&amp;b=2</url>"));
        assert!(xml.contains("<title>O&apos;Hare</title>"));
        assert!(xml.contains("<link>http://x</link>"));
    }

    #[test]
    fn test_no_image_element_without_image() {
        let xml = render(r#"{"channel": {"title": "t", "items": []}}"#);
        assert!(!xml.contains("<image>"));
    }

    #[test]
    fn test_item_extension_elements() {
        let xml = render(
            r#"{"channel": {"items": [{
                "title": "Headline",
                "link": "http://n/1",
                "guid": {"isPermaLink": false, "value": "abc\"1"},
                "dc:creator": "Reporter",
                "pubDate": "Mon, 01 Jan 2024 00:00:00 GMT",
                "media:content": {"url": "http://img/1.jpg?s=1&t=2"}
            }]}}"#,
        );
        assert!(xml.contains("<guid isPermaLink=\"false\">abc&quot;1</guid>"));
        assert!(xml.contains("<dc:creator>Reporter</dc:creator>"));
        assert!(xml.contains("<pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("<media:content url=\"http://img/1.jpg?s=1&amp;t=2\"/>"));
        assert!(!xml.contains("<description>"));
    }

    #[test]
    fn test_null_values_are_omitted() {
        let xml = render(r#"{"channel": {"title": null, "language": "en", "items": []}}"#);
        assert!(!xml.contains("<title>"));
        assert!(xml.contains("<language>en</language>"));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        assert!(matches!(
            parse_feed("not json"),
            Err(AppError::Serialization(_))
        ));
        assert!(matches!(
            parse_feed(r#"{"error": "Invalid scraper output"}"#),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_document_prologue_and_namespaces() {
        let xml = render(r#"{"channel": {"title": "t"}}"#);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(
            "<rss version=\"2.0\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:media=\"http://search.yahoo.com/mrss/\">"
        ));
        assert!(xml.trim_end().ends_with("</rss>"));
    }

    #[test]
    fn test_null_or_absent_items_render_empty_channel() {
        for json in [
            r#"{"channel": {"title": "t", "items": null}}"#,
            r#"{"channel": {"title": "t"}}"#,
            r#"{"channel": {"title": "t", "items": "none"}}"#,
        ] {
            let doc = parse_feed(json).unwrap();
            assert!(doc.channel.items.is_empty(), "{json}");
            let xml = render_rss(&doc).unwrap();
            assert!(xml.contains("<title>t</title>"));
            assert!(!xml.contains("<item>"));
        }
    }

    #[test]
    fn test_malformed_nested_values_are_skipped() {
        let xml = render(
            r#"{"channel": {"image": "logo.png", "items": [
                "stray",
                {"title": "kept", "guid": "g-1", "media:content": ["http://img"]},
                null
            ]}}"#,
        );
        assert!(!xml.contains("<image>"));
        assert_eq!(xml.matches("<item>").count(), 1);
        assert!(xml.contains("<title>kept</title>"));
        assert!(!xml.contains("<guid"));
        assert!(!xml.contains("<media:content"));
    }
}
