//! Page record model and DTOs.

use pagewright_core::page_path::PagePath;
use pagewright_core::seo::SeoFields;
use pagewright_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `pages` table. One per public site path.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PageRecord {
    #[sqlx(try_from = "String")]
    pub page_path: PagePath,
    pub title: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub canonical_url: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub twitter_card: Option<String>,
    pub twitter_title: Option<String>,
    pub twitter_description: Option<String>,
    pub twitter_image: Option<String>,
    pub robots: Option<String>,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub updated_by: Option<DbId>,
}

impl PageRecord {
    /// The stored (sparse) SEO values of this page.
    pub fn seo(&self) -> SeoFields {
        SeoFields {
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            keywords: self.keywords.clone(),
            canonical_url: self.canonical_url.clone(),
            og_title: self.og_title.clone(),
            og_description: self.og_description.clone(),
            og_image: self.og_image.clone(),
            twitter_card: self.twitter_card.clone(),
            twitter_title: self.twitter_title.clone(),
            twitter_description: self.twitter_description.clone(),
            twitter_image: self.twitter_image.clone(),
            robots: self.robots.clone(),
        }
    }
}

/// DTO for updating (or first assigning) a page's mutable fields.
///
/// `None` leaves the stored value untouched. The path itself is never
/// part of an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePage {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(flatten)]
    pub seo: SeoFields,
}

impl UpdatePage {
    /// Whether the update sets nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_published.is_none() && self.seo.is_empty()
    }

    /// An update carrying only SEO fields.
    pub fn from_seo(seo: SeoFields) -> Self {
        Self {
            seo,
            ..Default::default()
        }
    }
}
