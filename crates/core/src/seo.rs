//! SEO metadata: field table, validation policy and per-path defaults.
//!
//! Stored SEO values are sparse; anything the editor never set is filled from
//! a static default table at read time. [`ResolvedSeo`] keeps the stored and
//! defaulted values apart so defaults are never persisted as user data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::page_path::PagePath;
use crate::validation::{validate_fields, FieldDescriptor, FieldRule, ValidationError};

/// Maximum characters for any title-like field.
pub const MAX_TITLE_CHARS: usize = 60;

/// Maximum characters for any description-like field.
pub const MAX_DESCRIPTION_CHARS: usize = 160;

/// Maximum number of keywords per page.
pub const MAX_KEYWORDS: usize = 20;

/// Maximum characters per keyword.
pub const MAX_KEYWORD_CHARS: usize = 50;

/// Accepted `twitter:card` values.
pub const TWITTER_CARDS: &[&str] = &["summary", "summary_large_image", "app", "player"];

/// Accepted `robots` directives.
pub const ROBOTS_DIRECTIVES: &[&str] = &[
    "index",
    "noindex",
    "follow",
    "nofollow",
    "all",
    "none",
    "noarchive",
    "nosnippet",
    "noimageindex",
];

/// Declarative validation table for every SEO field.
pub const SEO_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "meta_title",
        label: "Meta title",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_TITLE_CHARS)],
    },
    FieldDescriptor {
        name: "meta_description",
        label: "Meta description",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_DESCRIPTION_CHARS)],
    },
    FieldDescriptor {
        name: "keywords",
        label: "Keyword",
        required: false,
        rules: &[
            FieldRule::MaxItems(MAX_KEYWORDS),
            FieldRule::ItemMaxChars(MAX_KEYWORD_CHARS),
        ],
    },
    FieldDescriptor {
        name: "canonical_url",
        label: "Canonical URL",
        required: false,
        rules: &[FieldRule::AbsoluteUrl],
    },
    FieldDescriptor {
        name: "og_title",
        label: "Open Graph title",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_TITLE_CHARS)],
    },
    FieldDescriptor {
        name: "og_description",
        label: "Open Graph description",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_DESCRIPTION_CHARS)],
    },
    FieldDescriptor {
        name: "og_image",
        label: "Open Graph image",
        required: false,
        rules: &[FieldRule::AbsoluteUrl],
    },
    FieldDescriptor {
        name: "twitter_card",
        label: "Twitter card",
        required: false,
        rules: &[FieldRule::OneOf(TWITTER_CARDS)],
    },
    FieldDescriptor {
        name: "twitter_title",
        label: "Twitter title",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_TITLE_CHARS)],
    },
    FieldDescriptor {
        name: "twitter_description",
        label: "Twitter description",
        required: false,
        rules: &[FieldRule::MaxChars(MAX_DESCRIPTION_CHARS)],
    },
    FieldDescriptor {
        name: "twitter_image",
        label: "Twitter image",
        required: false,
        rules: &[FieldRule::AbsoluteUrl],
    },
    FieldDescriptor {
        name: "robots",
        label: "Robots",
        required: false,
        rules: &[FieldRule::TokenList(ROBOTS_DIRECTIVES)],
    },
];

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Names of the SEO fields, used to report which values were defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoField {
    MetaTitle,
    MetaDescription,
    Keywords,
    CanonicalUrl,
    OgTitle,
    OgDescription,
    OgImage,
    TwitterCard,
    TwitterTitle,
    TwitterDescription,
    TwitterImage,
    Robots,
}

impl SeoField {
    pub const ALL: [SeoField; 12] = [
        SeoField::MetaTitle,
        SeoField::MetaDescription,
        SeoField::Keywords,
        SeoField::CanonicalUrl,
        SeoField::OgTitle,
        SeoField::OgDescription,
        SeoField::OgImage,
        SeoField::TwitterCard,
        SeoField::TwitterTitle,
        SeoField::TwitterDescription,
        SeoField::TwitterImage,
        SeoField::Robots,
    ];

    /// Column (and JSON key) name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaTitle => "meta_title",
            Self::MetaDescription => "meta_description",
            Self::Keywords => "keywords",
            Self::CanonicalUrl => "canonical_url",
            Self::OgTitle => "og_title",
            Self::OgDescription => "og_description",
            Self::OgImage => "og_image",
            Self::TwitterCard => "twitter_card",
            Self::TwitterTitle => "twitter_title",
            Self::TwitterDescription => "twitter_description",
            Self::TwitterImage => "twitter_image",
            Self::Robots => "robots",
        }
    }
}

/// Sparse SEO metadata for one page. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFields {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub twitter_card: Option<String>,
    #[serde(default)]
    pub twitter_title: Option<String>,
    #[serde(default)]
    pub twitter_description: Option<String>,
    #[serde(default)]
    pub twitter_image: Option<String>,
    #[serde(default)]
    pub robots: Option<String>,
}

impl SeoFields {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// JSON object view used by the descriptor evaluator.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Validate every SEO field. Any violation rejects the whole set.
pub fn validate_seo(fields: &SeoFields) -> Result<(), ValidationError> {
    validate_fields(SEO_FIELDS, &fields.to_map())
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Static default entry for one page path.
struct DefaultEntry {
    path: &'static str,
    title: &'static str,
    description: &'static str,
}

const DEFAULT_TABLE: &[DefaultEntry] = &[
    DefaultEntry {
        path: "/",
        title: "Digital Marketing Agency | Growth, SEO & Paid Media",
        description: "We help ambitious brands grow with data-driven SEO, paid media, \
                      content and conversion optimisation.",
    },
    DefaultEntry {
        path: "/about",
        title: "About Us | Our Team and Approach",
        description: "Meet the strategists, creatives and analysts behind our \
                      performance-led digital marketing work.",
    },
    DefaultEntry {
        path: "/services",
        title: "Services | SEO, PPC, Social and Content Marketing",
        description: "Full-funnel digital marketing services: search, paid social, \
                      content, analytics and web design.",
    },
    DefaultEntry {
        path: "/blog",
        title: "Blog | Digital Marketing Insights",
        description: "Practical guides and industry analysis on SEO, paid media and \
                      marketing strategy.",
    },
    DefaultEntry {
        path: "/case-studies",
        title: "Case Studies | Client Results",
        description: "See how we have grown traffic, leads and revenue for clients \
                      across industries.",
    },
    DefaultEntry {
        path: "/careers",
        title: "Careers | Join Our Team",
        description: "Open roles in strategy, creative and engineering. Build your \
                      career in digital marketing with us.",
    },
    DefaultEntry {
        path: "/contact",
        title: "Contact Us | Start Your Project",
        description: "Tell us about your goals and we will get back to you within one \
                      business day.",
    },
];

const DEFAULT_TWITTER_CARD: &str = "summary_large_image";
const DEFAULT_ROBOTS: &str = "index, follow";

/// Per-path default SEO values for the site.
#[derive(Debug, Clone)]
pub struct SeoDefaults {
    site_url: String,
}

impl SeoDefaults {
    /// `site_url` is the absolute origin used for default canonical URLs,
    /// e.g. `https://www.example.com`. A trailing slash is ignored.
    pub fn new(site_url: impl Into<String>) -> Self {
        let mut site_url = site_url.into();
        while site_url.ends_with('/') {
            site_url.pop();
        }
        Self { site_url }
    }

    /// Full default field set for `path`. Paths without an entry use the
    /// site-wide (`/`) title and description.
    pub fn for_path(&self, path: &PagePath) -> SeoFields {
        let entry = DEFAULT_TABLE
            .iter()
            .find(|e| e.path == path.as_str())
            .unwrap_or(&DEFAULT_TABLE[0]);

        let canonical = if path.is_root() {
            format!("{}/", self.site_url)
        } else {
            format!("{}{}", self.site_url, path)
        };

        SeoFields {
            meta_title: Some(entry.title.to_string()),
            meta_description: Some(entry.description.to_string()),
            keywords: Some(Vec::new()),
            canonical_url: Some(canonical),
            og_title: Some(entry.title.to_string()),
            og_description: Some(entry.description.to_string()),
            og_image: None,
            twitter_card: Some(DEFAULT_TWITTER_CARD.to_string()),
            twitter_title: Some(entry.title.to_string()),
            twitter_description: Some(entry.description.to_string()),
            twitter_image: None,
            robots: Some(DEFAULT_ROBOTS.to_string()),
        }
    }

    /// Whether `path` has its own table entry.
    pub fn has_entry(path: &PagePath) -> bool {
        DEFAULT_TABLE.iter().any(|e| e.path == path.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// SEO values as served to renderers: stored values backfilled with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSeo {
    pub page_path: PagePath,
    /// Effective values (stored, else default).
    pub fields: SeoFields,
    /// Fields whose effective value came from the default table.
    pub defaulted: Vec<SeoField>,
    #[serde(skip)]
    stored: SeoFields,
}

impl ResolvedSeo {
    /// Backfill every unset or cleared field of `stored` from `defaults`.
    pub fn resolve(page_path: PagePath, stored: SeoFields, defaults: &SeoFields) -> Self {
        let mut fields = stored.clone();
        let mut defaulted = Vec::new();

        backfill(&mut fields.meta_title, &defaults.meta_title, SeoField::MetaTitle, &mut defaulted);
        backfill(
            &mut fields.meta_description,
            &defaults.meta_description,
            SeoField::MetaDescription,
            &mut defaulted,
        );
        backfill(&mut fields.keywords, &defaults.keywords, SeoField::Keywords, &mut defaulted);
        backfill(
            &mut fields.canonical_url,
            &defaults.canonical_url,
            SeoField::CanonicalUrl,
            &mut defaulted,
        );
        backfill(&mut fields.og_title, &defaults.og_title, SeoField::OgTitle, &mut defaulted);
        backfill(
            &mut fields.og_description,
            &defaults.og_description,
            SeoField::OgDescription,
            &mut defaulted,
        );
        backfill(&mut fields.og_image, &defaults.og_image, SeoField::OgImage, &mut defaulted);
        backfill(
            &mut fields.twitter_card,
            &defaults.twitter_card,
            SeoField::TwitterCard,
            &mut defaulted,
        );
        backfill(
            &mut fields.twitter_title,
            &defaults.twitter_title,
            SeoField::TwitterTitle,
            &mut defaulted,
        );
        backfill(
            &mut fields.twitter_description,
            &defaults.twitter_description,
            SeoField::TwitterDescription,
            &mut defaulted,
        );
        backfill(
            &mut fields.twitter_image,
            &defaults.twitter_image,
            SeoField::TwitterImage,
            &mut defaulted,
        );
        backfill(&mut fields.robots, &defaults.robots, SeoField::Robots, &mut defaulted);

        Self {
            page_path,
            fields,
            defaulted,
            stored,
        }
    }

    /// The values actually stored for the page. This, never
    /// [`fields`](Self::fields), is what a write-back persists.
    pub fn stored(&self) -> &SeoFields {
        &self.stored
    }

    pub fn is_defaulted(&self, field: SeoField) -> bool {
        self.defaulted.contains(&field)
    }
}

/// A stored value that counts as absent: a cleared text field or an empty
/// keyword list.
trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for Vec<String> {
    fn is_blank(&self) -> bool {
        self.iter().all(|k| k.is_blank())
    }
}

fn backfill<T: Clone + Blank>(
    slot: &mut Option<T>,
    default: &Option<T>,
    field: SeoField,
    defaulted: &mut Vec<SeoField>,
) {
    let absent = slot.as_ref().map_or(true, Blank::is_blank);
    if absent && default.is_some() {
        *slot = default.clone();
        defaulted.push(field);
    }
}
