// crates/domain/src/config.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};
use std::fmt;
use tracing::warn;

/// Route prefix under which articles are published (`/article/{slug}`).
pub const ARTICLE_ROUTE_PREFIX: &str = "/article/";

/// Font families offered by the admin form. Not enforced by the model.
pub const FONT_FAMILIES: [&str; 4] = [
    "Playfair Display",
    "Noto Serif JP",
    "Shippori Mincho",
    "Zen Kaku Gothic New",
];

/// Default color token for new buttons and articles.
pub const DEFAULT_COLOR: &str = "bg-[#3e2723]";

// ─────────────────────────────────────────────────────────────────────────────
// Document types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub color: String,
}

impl ButtonConfig {
    pub fn new(label: &str, link: &str, color: &str) -> Self {
        Self {
            label: label.to_owned(),
            link: link.to_owned(),
            color: color.to_owned(),
        }
    }
}

/// Buttons in the second body section share the button shape.
pub type Body2Button = ButtonConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub wood: String,
    #[serde(default)]
    pub gold: String,
    #[serde(default)]
    pub light: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body2Config {
    #[serde(default)]
    pub show_heading: bool,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub buttons: Vec<Body2Button>,
}

/// Closed set of content block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    Paragraph,
    Image,
    Quote,
    Divider,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Image => "image",
            BlockKind::Quote => "quote",
            BlockKind::Divider => "divider",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed unit of article content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: String,
    /// Heading level (1..=3). Only meaningful for headings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Open mapping; `alt` and `caption` are read for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Json>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    /// Legacy route; superseded by `slug`.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_blocks",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(
        default,
        serialize_with = "iso_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        serialize_with = "iso_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// True when `slug` addresses this article, either by its slug or by the
    /// legacy `/article/{slug}` link.
    pub fn matches(&self, slug: &str) -> bool {
        self.slug.as_deref() == Some(slug)
            || self.link.strip_prefix(ARTICLE_ROUTE_PREFIX) == Some(slug)
    }
}

/// `2024-05-01T10:00:00.000Z`, the shape browsers write.
fn iso_millis<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => serializer.serialize_none(),
    }
}

/// Blocks whose type (or shape) is not understood are dropped instead of
/// failing the whole document.
fn lenient_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Json>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ContentBlock>(value) {
            Ok(block) => Some(block),
            Err(err) => {
                warn!(error = %err, "dropping unreadable content block");
                None
            }
        })
        .collect())
}

/// The singleton site configuration document.
///
/// Every field deserializes with its *empty* value when missing, never with the
/// compiled-in default: merging with defaults is an explicit step (`merge`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub hero_title: String,
    #[serde(default)]
    pub hero_subtitle: String,
    #[serde(default)]
    pub hero_image: String,
    #[serde(default)]
    pub button1: ButtonConfig,
    #[serde(default)]
    pub button2: ButtonConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub body2: Body2Config,
    #[serde(default)]
    pub about_title: String,
    #[serde(default)]
    pub about_text: String,
    #[serde(default)]
    pub secondary_buttons: Vec<ButtonConfig>,
    #[serde(default)]
    pub font_family: String,
    /// Top-level keys this schema does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

/// Wire names of the typed top-level fields.
pub const KNOWN_KEYS: [&str; 12] = [
    "heroTitle",
    "heroSubtitle",
    "heroImage",
    "button1",
    "button2",
    "theme",
    "articles",
    "body2",
    "aboutTitle",
    "aboutText",
    "secondaryButtons",
    "fontFamily",
];

const ABOUT_TEXT: &str = "
  In the hushed corridors of the grand archive, every shelf whispers stories of ages past, and each tome holds a world waiting to be discovered. As you wander through the marble aisles, the scent of aged paper mingles with the soft glow of amber lamps, inviting you to lose yourself in the timeless pursuit of knowledge.

  The Archive is more than a collection; it is a sanctuary where curiosity is nurtured, and imagination is set free. Here, the rustle of pages becomes a symphony, and the gentle creak of wooden shelves echoes the footsteps of scholars who have walked these halls before you.

  Whether you seek the wisdom of ancient philosophers, the daring adventures of modern storytellers, or the quiet comfort of poetry, the Archive offers a curated journey through the realms of human thought. Each book is meticulously placed, its spine adorned with subtle gold leaf, inviting you to run your fingers along its texture and feel the weight of centuries.

  As you explore, notice the subtle interplay of light and shadow, the delicate dust particles dancing in the air, and the warm tones of walnut and cream that envelop you in a sense of timeless elegance. This is a place where the past meets the present, where the tactile pleasure of holding a physical book merges with the seamless flow of digital discovery.

  Let the Archive be your guide, your refuge, and your inspiration. Open a book, turn a page, and embark on a voyage that transcends time.
  ";

impl Default for AppConfig {
    /// The compiled-in template shipped with the site.
    fn default() -> Self {
        Self {
            hero_title: "The Hideout.".into(),
            hero_subtitle: "\"A secret sanctuary for the curious mind.\"".into(),
            hero_image: "/hero-bg.png".into(),
            button1: ButtonConfig::new("Enter", "#collection", DEFAULT_COLOR),
            button2: ButtonConfig::new("About", "#about", "bg-[#5d4037]"),
            theme: ThemeConfig {
                wood: "#1a0f0a".into(),
                gold: "#c5a059".into(),
                light: "#ffb300".into(),
            },
            articles: Vec::new(),
            body2: Body2Config {
                show_heading: true,
                heading: "The Librarian's Desk".into(),
                body_text: "Explore our collection of curated knowledge and timeless wisdom."
                    .into(),
                buttons: vec![ButtonConfig::new("Contact Us", "#contact", DEFAULT_COLOR)],
            },
            about_title: "About the Archive".into(),
            about_text: ABOUT_TEXT.into(),
            secondary_buttons: vec![
                ButtonConfig::new("Explore Archives", "#collection", DEFAULT_COLOR),
                ButtonConfig::new("Read More", "#about", "bg-[#5d4037]"),
            ],
            font_family: FONT_FAMILIES[0].into(),
            extra: Map::new(),
        }
    }
}

/// Shallow merge: every top-level key present in `partial` replaces the
/// corresponding field of `base` wholesale.
///
/// A nested object such as `theme: {gold: "#fff"}` replaces the whole theme;
/// `wood` and `light` end up empty rather than keeping `base`'s values. Older
/// persisted payloads rely on this.
pub fn merge(base: &AppConfig, partial: &Map<String, Json>) -> Result<AppConfig, serde_json::Error> {
    let mut doc = match serde_json::to_value(base)? {
        Json::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in partial {
        doc.insert(key.clone(), value.clone());
    }
    serde_json::from_value(Json::Object(doc))
}
