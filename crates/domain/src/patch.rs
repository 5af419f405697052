// crates/domain/src/patch.rs
//
// Field-level edits of the configuration document.
//
// Edits are expressed as `ConfigUpdate` commands. The dotted path grammar used
// by the admin form (`button1.label`, `articles.2.title`,
// `body2.buttons.1.color`) parses into `FieldRef`, so persisted tooling keeps
// working while the rest of the code deals in typed addresses.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use tracing::debug;

use crate::config::{AppConfig, Article, ButtonConfig, KNOWN_KEYS, DEFAULT_COLOR};
use crate::error::UnknownFieldError;

macro_rules! field_names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }
    };
}

field_names!(
    /// Top-level string fields.
    TextField {
        HeroTitle => "heroTitle",
        HeroSubtitle => "heroSubtitle",
        HeroImage => "heroImage",
        AboutTitle => "aboutTitle",
        AboutText => "aboutText",
        FontFamily => "fontFamily",
    }
);

field_names!(ButtonSlot {
    Button1 => "button1",
    Button2 => "button2",
});

field_names!(ButtonField {
    Label => "label",
    Link => "link",
    Color => "color",
});

field_names!(ThemeField {
    Wood => "wood",
    Gold => "gold",
    Light => "light",
});

field_names!(Body2Field {
    Heading => "heading",
    BodyText => "bodyText",
});

field_names!(
    /// Article fields editable from the admin form and the article editor.
    ArticleField {
        Title => "title",
        Author => "author",
        Link => "link",
        Color => "color",
        Slug => "slug",
        CoverImage => "coverImage",
    }
);

/// A new field value. Only `body2.showHeading` is boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Flag(bool),
    Text(String),
}

impl PatchValue {
    /// Strings count as `true` only when they are exactly `"true"`.
    pub fn as_flag(&self) -> bool {
        match self {
            PatchValue::Flag(b) => *b,
            PatchValue::Text(s) => s == "true",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            PatchValue::Flag(b) => b.to_string(),
            PatchValue::Text(s) => s,
        }
    }

    fn into_json(self) -> Json {
        match self {
            PatchValue::Flag(b) => Json::Bool(b),
            PatchValue::Text(s) => Json::String(s),
        }
    }
}

impl From<&str> for PatchValue {
    fn from(s: &str) -> Self {
        PatchValue::Text(s.to_owned())
    }
}

impl From<String> for PatchValue {
    fn from(s: String) -> Self {
        PatchValue::Text(s)
    }
}

impl From<bool> for PatchValue {
    fn from(b: bool) -> Self {
        PatchValue::Flag(b)
    }
}

/// Typed address of one editable leaf of the document.
///
/// On the wire a `FieldRef` is its dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldRef {
    Text(TextField),
    Button(ButtonSlot, ButtonField),
    Theme(ThemeField),
    Body2(Body2Field),
    ShowHeading,
    Article(usize, ArticleField),
    SecondaryButton(usize, ButtonField),
    Body2Button(usize, ButtonField),
    /// Legacy flat top-level key, stored verbatim in `AppConfig::extra`.
    Extra(String),
}

/// Containers whose paths must match one of the supported shapes.
const CONTAINERS: [&str; 6] = [
    "button1",
    "button2",
    "theme",
    "body2",
    "articles",
    "secondaryButtons",
];

fn index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Too large to be a valid position; stays numeric so it is out of range.
    Some(segment.parse().unwrap_or(usize::MAX))
}

impl FieldRef {
    /// Parse a dotted path.
    ///
    /// Paths rooted at a known container must match a supported shape;
    /// anything else that is not a top-level string field becomes a flat
    /// `Extra` key holding the whole path.
    pub fn parse(path: &str) -> Result<Self, UnknownFieldError> {
        let unknown = || UnknownFieldError(path.to_owned());
        if path.is_empty() {
            return Err(unknown());
        }

        let segments: Vec<&str> = path.split('.').collect();
        let head = segments[0];

        if segments.len() == 1 {
            if let Some(field) = TextField::from_name(head) {
                return Ok(FieldRef::Text(field));
            }
            if KNOWN_KEYS.contains(&head) {
                return Err(unknown());
            }
            return Ok(FieldRef::Extra(path.to_owned()));
        }

        if !CONTAINERS.contains(&head) {
            return Ok(FieldRef::Extra(path.to_owned()));
        }

        let parsed = match segments.as_slice() {
            [slot @ ("button1" | "button2"), field] => ButtonSlot::from_name(slot)
                .zip(ButtonField::from_name(field))
                .map(|(s, f)| FieldRef::Button(s, f)),
            ["theme", field] => ThemeField::from_name(field).map(FieldRef::Theme),
            ["body2", "showHeading"] => Some(FieldRef::ShowHeading),
            ["body2", field] => Body2Field::from_name(field).map(FieldRef::Body2),
            ["body2", "buttons", idx, field] => index(idx)
                .zip(ButtonField::from_name(field))
                .map(|(i, f)| FieldRef::Body2Button(i, f)),
            ["articles", idx, field] => index(idx)
                .zip(ArticleField::from_name(field))
                .map(|(i, f)| FieldRef::Article(i, f)),
            ["secondaryButtons", idx, field] => index(idx)
                .zip(ButtonField::from_name(field))
                .map(|(i, f)| FieldRef::SecondaryButton(i, f)),
            _ => None,
        };

        parsed.ok_or_else(unknown)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Text(field) => f.write_str(field.name()),
            FieldRef::Button(slot, field) => write!(f, "{}.{}", slot.name(), field.name()),
            FieldRef::Theme(field) => write!(f, "theme.{}", field.name()),
            FieldRef::Body2(field) => write!(f, "body2.{}", field.name()),
            FieldRef::ShowHeading => f.write_str("body2.showHeading"),
            FieldRef::Article(i, field) => write!(f, "articles.{i}.{}", field.name()),
            FieldRef::SecondaryButton(i, field) => {
                write!(f, "secondaryButtons.{i}.{}", field.name())
            }
            FieldRef::Body2Button(i, field) => write!(f, "body2.buttons.{i}.{}", field.name()),
            FieldRef::Extra(key) => f.write_str(key),
        }
    }
}

impl TryFrom<String> for FieldRef {
    type Error = UnknownFieldError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        FieldRef::parse(&path)
    }
}

impl From<FieldRef> for String {
    fn from(field: FieldRef) -> Self {
        field.to_string()
    }
}

/// Closed set of edits accepted by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ConfigUpdate {
    Set { field: FieldRef, value: PatchValue },
    RemoveArticle { index: usize },
    AddBody2Button,
    RemoveBody2Button { index: usize },
    AddSecondaryButton,
    RemoveSecondaryButton { index: usize },
}

impl ConfigUpdate {
    pub fn set(field: FieldRef, value: impl Into<PatchValue>) -> Self {
        ConfigUpdate::Set {
            field,
            value: value.into(),
        }
    }
}

fn new_button() -> ButtonConfig {
    ButtonConfig::new("New Button", "#", DEFAULT_COLOR)
}

fn button_field(button: &mut ButtonConfig, field: ButtonField) -> &mut String {
    match field {
        ButtonField::Label => &mut button.label,
        ButtonField::Link => &mut button.link,
        ButtonField::Color => &mut button.color,
    }
}

fn set_article_field(article: &mut Article, field: ArticleField, value: String) {
    // An empty slug or cover means "none".
    let optional = |v: String| if v.is_empty() { None } else { Some(v) };
    match field {
        ArticleField::Title => article.title = value,
        ArticleField::Author => article.author = value,
        ArticleField::Link => article.link = value,
        ArticleField::Color => article.color = value,
        ArticleField::Slug => article.slug = optional(value),
        ArticleField::CoverImage => article.cover_image = optional(value),
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &str) {
    if index < items.len() {
        items.remove(index);
    } else {
        debug!(index, len = items.len(), what, "remove index out of range; ignoring");
    }
}

impl AppConfig {
    fn text_field(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::HeroTitle => &mut self.hero_title,
            TextField::HeroSubtitle => &mut self.hero_subtitle,
            TextField::HeroImage => &mut self.hero_image,
            TextField::AboutTitle => &mut self.about_title,
            TextField::AboutText => &mut self.about_text,
            TextField::FontFamily => &mut self.font_family,
        }
    }

    fn button(&mut self, slot: ButtonSlot) -> &mut ButtonConfig {
        match slot {
            ButtonSlot::Button1 => &mut self.button1,
            ButtonSlot::Button2 => &mut self.button2,
        }
    }

    /// Returns a new document with `update` applied; `self` is left untouched.
    ///
    /// Out-of-range indices leave the copy equal to the input.
    pub fn apply(&self, update: &ConfigUpdate) -> AppConfig {
        let mut next = self.clone();
        next.apply_in_place(update);
        next
    }

    fn apply_in_place(&mut self, update: &ConfigUpdate) {
        match update {
            ConfigUpdate::Set { field, value } => self.set_field(field, value.clone()),
            ConfigUpdate::RemoveArticle { index } => remove_at(&mut self.articles, *index, "article"),
            ConfigUpdate::AddBody2Button => self.body2.buttons.push(new_button()),
            ConfigUpdate::RemoveBody2Button { index } => {
                remove_at(&mut self.body2.buttons, *index, "body2 button")
            }
            ConfigUpdate::AddSecondaryButton => self.secondary_buttons.push(new_button()),
            ConfigUpdate::RemoveSecondaryButton { index } => {
                remove_at(&mut self.secondary_buttons, *index, "secondary button")
            }
        }
    }

    fn set_field(&mut self, field: &FieldRef, value: PatchValue) {
        let slot = match field {
            FieldRef::Text(f) => Some(self.text_field(*f)),
            FieldRef::Button(slot, f) => Some(button_field(self.button(*slot), *f)),
            FieldRef::Theme(ThemeField::Wood) => Some(&mut self.theme.wood),
            FieldRef::Theme(ThemeField::Gold) => Some(&mut self.theme.gold),
            FieldRef::Theme(ThemeField::Light) => Some(&mut self.theme.light),
            FieldRef::Body2(Body2Field::Heading) => Some(&mut self.body2.heading),
            FieldRef::Body2(Body2Field::BodyText) => Some(&mut self.body2.body_text),
            FieldRef::ShowHeading => {
                self.body2.show_heading = value.as_flag();
                return;
            }
            FieldRef::Article(i, f) => {
                match self.articles.get_mut(*i) {
                    Some(article) => set_article_field(article, *f, value.into_text()),
                    None => debug!(path = %field, "article index out of range; ignoring"),
                }
                return;
            }
            FieldRef::SecondaryButton(i, f) => self
                .secondary_buttons
                .get_mut(*i)
                .map(|b| button_field(b, *f)),
            FieldRef::Body2Button(i, f) => {
                self.body2.buttons.get_mut(*i).map(|b| button_field(b, *f))
            }
            FieldRef::Extra(key) => {
                if KNOWN_KEYS.contains(&key.as_str()) {
                    debug!(key = %key, "refusing to overwrite a typed field with a flat key");
                } else {
                    self.extra.insert(key.clone(), value.into_json());
                }
                return;
            }
        };

        match slot {
            Some(target) => *target = value.into_text(),
            None => debug!(path = %field, "index out of range; ignoring"),
        }
    }

    /// Value currently stored at `field`, if the address resolves.
    pub fn read(&self, field: &FieldRef) -> Option<PatchValue> {
        let button = |b: &ButtonConfig, f: ButtonField| match f {
            ButtonField::Label => b.label.clone(),
            ButtonField::Link => b.link.clone(),
            ButtonField::Color => b.color.clone(),
        };
        let text = match field {
            FieldRef::Text(f) => match f {
                TextField::HeroTitle => self.hero_title.clone(),
                TextField::HeroSubtitle => self.hero_subtitle.clone(),
                TextField::HeroImage => self.hero_image.clone(),
                TextField::AboutTitle => self.about_title.clone(),
                TextField::AboutText => self.about_text.clone(),
                TextField::FontFamily => self.font_family.clone(),
            },
            FieldRef::Button(ButtonSlot::Button1, f) => button(&self.button1, *f),
            FieldRef::Button(ButtonSlot::Button2, f) => button(&self.button2, *f),
            FieldRef::Theme(f) => match f {
                ThemeField::Wood => self.theme.wood.clone(),
                ThemeField::Gold => self.theme.gold.clone(),
                ThemeField::Light => self.theme.light.clone(),
            },
            FieldRef::Body2(Body2Field::Heading) => self.body2.heading.clone(),
            FieldRef::Body2(Body2Field::BodyText) => self.body2.body_text.clone(),
            FieldRef::ShowHeading => return Some(PatchValue::Flag(self.body2.show_heading)),
            FieldRef::Article(i, f) => {
                let a = self.articles.get(*i)?;
                match f {
                    ArticleField::Title => a.title.clone(),
                    ArticleField::Author => a.author.clone(),
                    ArticleField::Link => a.link.clone(),
                    ArticleField::Color => a.color.clone(),
                    ArticleField::Slug => a.slug.clone().unwrap_or_default(),
                    ArticleField::CoverImage => a.cover_image.clone().unwrap_or_default(),
                }
            }
            FieldRef::SecondaryButton(i, f) => button(self.secondary_buttons.get(*i)?, *f),
            FieldRef::Body2Button(i, f) => button(self.body2.buttons.get(*i)?, *f),
            FieldRef::Extra(key) => {
                return match self.extra.get(key)? {
                    Json::Bool(b) => Some(PatchValue::Flag(*b)),
                    Json::String(s) => Some(PatchValue::Text(s.clone())),
                    other => Some(PatchValue::Text(other.to_string())),
                }
            }
        };
        Some(PatchValue::Text(text))
    }
}

/// Apply one form edit addressed by a dotted path.
///
/// Paths that name a known container but no editable field are ignored and
/// the input is returned unchanged.
pub fn patch(config: &AppConfig, path: &str, value: impl Into<PatchValue>) -> AppConfig {
    match FieldRef::parse(path) {
        Ok(field) => config.apply(&ConfigUpdate::set(field, value)),
        Err(err) => {
            debug!(error = %err, "ignoring edit");
            config.clone()
        }
    }
}

/// Value at a dotted path, or `None` when the path does not resolve.
pub fn read(config: &AppConfig, path: &str) -> Option<PatchValue> {
    config.read(&FieldRef::parse(path).ok()?)
}
