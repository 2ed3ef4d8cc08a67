//! Mutation commands for the working copy.
//!
//! Every optimistic edit is a value object carrying forward and inverse
//! deltas. The manager applies a command before the backend call and
//! reverts it mechanically if the call fails.

use pagewright_core::seo::SeoField;
use pagewright_core::types::DbId;
use pagewright_db::models::page::{PageRecord, UpdatePage};
use pagewright_db::models::page_section::PageSection;

// ---------------------------------------------------------------------------
// Page fields
// ---------------------------------------------------------------------------

/// One logical, user-editable field of a page record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageField {
    Title,
    IsPublished,
    Seo(SeoField),
}

impl PageField {
    pub fn all() -> impl Iterator<Item = PageField> {
        [PageField::Title, PageField::IsPublished]
            .into_iter()
            .chain(SeoField::ALL.into_iter().map(PageField::Seo))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::IsPublished => "is_published",
            Self::Seo(field) => field.as_str(),
        }
    }

    /// Current value of this field in `record`.
    pub fn read(&self, record: &PageRecord) -> FieldValue {
        match self {
            Self::Title => FieldValue::Title(record.title.clone()),
            Self::IsPublished => FieldValue::Published(record.is_published),
            Self::Seo(SeoField::Keywords) => FieldValue::Keywords(record.keywords.clone()),
            Self::Seo(field) => FieldValue::Text(text_slot_ref(record, *field).clone()),
        }
    }

    /// Overwrite this field in `record`. A value of the wrong kind is
    /// ignored.
    pub fn write(&self, record: &mut PageRecord, value: &FieldValue) {
        match (self, value) {
            (Self::Title, FieldValue::Title(v)) => record.title = v.clone(),
            (Self::IsPublished, FieldValue::Published(v)) => record.is_published = *v,
            (Self::Seo(SeoField::Keywords), FieldValue::Keywords(v)) => {
                record.keywords = v.clone();
            }
            (Self::Seo(field), FieldValue::Text(v)) if *field != SeoField::Keywords => {
                *text_slot(record, *field) = v.clone();
            }
            _ => {
                tracing::error!(field = self.as_str(), "Mismatched field value ignored");
            }
        }
    }
}

fn text_slot_ref(record: &PageRecord, field: SeoField) -> &Option<String> {
    match field {
        SeoField::MetaTitle => &record.meta_title,
        SeoField::MetaDescription => &record.meta_description,
        SeoField::CanonicalUrl => &record.canonical_url,
        SeoField::OgTitle => &record.og_title,
        SeoField::OgDescription => &record.og_description,
        SeoField::OgImage => &record.og_image,
        SeoField::TwitterCard => &record.twitter_card,
        SeoField::TwitterTitle => &record.twitter_title,
        SeoField::TwitterDescription => &record.twitter_description,
        SeoField::TwitterImage => &record.twitter_image,
        // Keywords are a list and never routed here.
        SeoField::Robots | SeoField::Keywords => &record.robots,
    }
}

fn text_slot(record: &mut PageRecord, field: SeoField) -> &mut Option<String> {
    match field {
        SeoField::MetaTitle => &mut record.meta_title,
        SeoField::MetaDescription => &mut record.meta_description,
        SeoField::CanonicalUrl => &mut record.canonical_url,
        SeoField::OgTitle => &mut record.og_title,
        SeoField::OgDescription => &mut record.og_description,
        SeoField::OgImage => &mut record.og_image,
        SeoField::TwitterCard => &mut record.twitter_card,
        SeoField::TwitterTitle => &mut record.twitter_title,
        SeoField::TwitterDescription => &mut record.twitter_description,
        SeoField::TwitterImage => &mut record.twitter_image,
        SeoField::Robots | SeoField::Keywords => &mut record.robots,
    }
}

/// A typed value of one [`PageField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Title(String),
    Published(bool),
    Text(Option<String>),
    Keywords(Option<Vec<String>>),
}

/// Fields set by `update`, with their new values.
fn requested_values(update: &UpdatePage) -> Vec<(PageField, FieldValue)> {
    let mut out = Vec::new();
    if let Some(title) = &update.title {
        out.push((PageField::Title, FieldValue::Title(title.clone())));
    }
    if let Some(published) = update.is_published {
        out.push((PageField::IsPublished, FieldValue::Published(published)));
    }
    let seo = &update.seo;
    if seo.keywords.is_some() {
        out.push((
            PageField::Seo(SeoField::Keywords),
            FieldValue::Keywords(seo.keywords.clone()),
        ));
    }
    let texts = [
        (SeoField::MetaTitle, &seo.meta_title),
        (SeoField::MetaDescription, &seo.meta_description),
        (SeoField::CanonicalUrl, &seo.canonical_url),
        (SeoField::OgTitle, &seo.og_title),
        (SeoField::OgDescription, &seo.og_description),
        (SeoField::OgImage, &seo.og_image),
        (SeoField::TwitterCard, &seo.twitter_card),
        (SeoField::TwitterTitle, &seo.twitter_title),
        (SeoField::TwitterDescription, &seo.twitter_description),
        (SeoField::TwitterImage, &seo.twitter_image),
        (SeoField::Robots, &seo.robots),
    ];
    for (field, value) in texts {
        if value.is_some() {
            out.push((PageField::Seo(field), FieldValue::Text(value.clone())));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Metadata command
// ---------------------------------------------------------------------------

/// Before/after values of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDelta {
    pub field: PageField,
    pub before: FieldValue,
    pub after: FieldValue,
}

/// A page metadata edit.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataCommand {
    deltas: Vec<FieldDelta>,
}

impl MetadataCommand {
    /// Capture the inverse of `update` against the current `record`.
    pub fn new(record: &PageRecord, update: &UpdatePage) -> Self {
        let deltas = requested_values(update)
            .into_iter()
            .map(|(field, after)| FieldDelta {
                field,
                before: field.read(record),
                after,
            })
            .collect();
        Self { deltas }
    }

    pub fn deltas(&self) -> &[FieldDelta] {
        &self.deltas
    }

    pub fn fields(&self) -> impl Iterator<Item = PageField> + '_ {
        self.deltas.iter().map(|d| d.field)
    }

    pub fn apply(&self, record: &mut PageRecord) {
        for delta in &self.deltas {
            delta.field.write(record, &delta.after);
        }
    }

    /// Restore the captured values of the fields selected by `keep`.
    pub fn revert_where(&self, record: &mut PageRecord, keep: impl Fn(PageField) -> bool) {
        for delta in self.deltas.iter().rev() {
            if keep(delta.field) {
                delta.field.write(record, &delta.before);
            }
        }
    }

    pub fn revert(&self, record: &mut PageRecord) {
        self.revert_where(record, |_| true);
    }
}

// ---------------------------------------------------------------------------
// Section commands
// ---------------------------------------------------------------------------

/// An edit to the working copy's active section list.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionCommand {
    /// In-place change of one section.
    Update {
        before: PageSection,
        after: PageSection,
    },
    /// A new section, held under a provisional negative id until the
    /// backend assigns the real one.
    Add { provisional: PageSection },
    /// Deactivation, which removes the section from the active list.
    Remove { before: PageSection },
}

impl SectionCommand {
    /// Id of the section this command targets.
    pub fn section_id(&self) -> DbId {
        match self {
            Self::Update { before, .. } => before.id,
            Self::Add { provisional } => provisional.id,
            Self::Remove { before } => before.id,
        }
    }

    pub fn apply(&self, sections: &mut Vec<PageSection>) {
        match self {
            Self::Update { after, .. } => replace(sections, after.clone()),
            Self::Add { provisional } => insert_sorted(sections, provisional.clone()),
            Self::Remove { before } => sections.retain(|s| s.id != before.id),
        }
    }

    pub fn revert(&self, sections: &mut Vec<PageSection>) {
        match self {
            Self::Update { before, .. } => replace(sections, before.clone()),
            Self::Add { provisional } => sections.retain(|s| s.id != provisional.id),
            Self::Remove { before } => {
                if !sections.iter().any(|s| s.id == before.id) {
                    insert_sorted(sections, before.clone());
                }
            }
        }
    }
}

fn replace(sections: &mut [PageSection], section: PageSection) {
    if let Some(slot) = sections.iter_mut().find(|s| s.id == section.id) {
        *slot = section;
    }
}

/// Insert keeping `(display_order, id)` order.
pub(crate) fn insert_sorted(sections: &mut Vec<PageSection>, section: PageSection) {
    let key = (section.display_order, section.id);
    let index = sections
        .iter()
        .position(|s| (s.display_order, s.id) > key)
        .unwrap_or(sections.len());
    sections.insert(index, section);
}
