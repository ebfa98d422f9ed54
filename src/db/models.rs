//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored text value that does not name any known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of string values stored in a TEXT column.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, UnknownVariant> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, UnknownVariant> {
                value.parse()
            }
        }
    };
}

/// Comma-separated list of a text enum's values, for validation messages.
pub fn choices<T: std::fmt::Display>(all: &[T]) -> String {
    all.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Site settings
// ============================================================================

pub const DEFAULT_SITE_NAME: &str = "Fusion Force LLC";
pub const DEFAULT_CONTACT_EMAIL: &str = "info@fusionforce.com";
pub const DEFAULT_CONTACT_PHONE: &str = "+1 (443) 545-4565";

/// Singleton site settings row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: i64,
    pub logo: Option<String>,
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Site settings as written by an admin; absent fields take the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettingsInput {
    pub logo: Option<String>,
    pub site_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl SiteSettingsInput {
    pub fn site_name(&self) -> &str {
        self.site_name.as_deref().unwrap_or(DEFAULT_SITE_NAME)
    }

    pub fn contact_email(&self) -> &str {
        self.contact_email.as_deref().unwrap_or(DEFAULT_CONTACT_EMAIL)
    }

    pub fn contact_phone(&self) -> &str {
        self.contact_phone.as_deref().unwrap_or(DEFAULT_CONTACT_PHONE)
    }
}

// ============================================================================
// Content blocks
// ============================================================================

text_enum! {
    /// Display section a content block belongs to.
    ContentKind("content kind") {
        Hero => "hero",
        Gallery => "gallery",
        Service => "service",
        Testimonial => "testimonial",
        ImpactResult => "impact_result",
        About => "about",
        Newsletter => "newsletter",
    }
}

impl ContentKind {
    /// Kinds limited to a single stored block.
    pub fn is_singleton(self) -> bool {
        matches!(self, ContentKind::Newsletter)
    }

    /// Kinds whose block is meaningless without an image.
    pub fn requires_media(self) -> bool {
        matches!(self, ContentKind::Hero | ContentKind::Gallery)
    }
}

text_enum! {
    HeroPosition("hero position") {
        Desktop => "desktop",
        Mobile => "mobile",
    }
}

impl Default for HeroPosition {
    fn default() -> Self {
        HeroPosition::Desktop
    }
}

text_enum! {
    GalleryPosition("gallery position") {
        Large => "large",
        Small => "small",
        Tall => "tall",
    }
}

impl Default for GalleryPosition {
    fn default() -> Self {
        GalleryPosition::Small
    }
}

text_enum! {
    ServiceType("service type") {
        Keynote => "keynote",
        Training => "training",
        Sales => "sales",
    }
}

fn default_icon() -> String {
    "fas fa-star".to_string()
}

fn default_button_text() -> String {
    "Learn More".to_string()
}

/// Kind-specific fields of a content block, stored as tagged JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBody {
    Hero {
        #[serde(default)]
        position: HeroPosition,
    },
    Gallery {
        #[serde(default)]
        description: String,
        #[serde(default)]
        position: GalleryPosition,
    },
    Service {
        service_type: ServiceType,
        description: String,
        #[serde(default = "default_icon")]
        icon: String,
        #[serde(default)]
        topics: String,
        #[serde(default = "default_button_text")]
        button_text: String,
    },
    Testimonial {
        position: String,
        company: String,
        content: String,
    },
    ImpactResult {
        value: String,
    },
    About {
        content: String,
        #[serde(default)]
        image_2: Option<String>,
        #[serde(default)]
        bullet_points: String,
    },
    Newsletter {
        #[serde(default)]
        subtitle: String,
        #[serde(default)]
        benefits: String,
        #[serde(default)]
        pdf_file: Option<String>,
    },
}

impl ContentBody {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentBody::Hero { .. } => ContentKind::Hero,
            ContentBody::Gallery { .. } => ContentKind::Gallery,
            ContentBody::Service { .. } => ContentKind::Service,
            ContentBody::Testimonial { .. } => ContentKind::Testimonial,
            ContentBody::ImpactResult { .. } => ContentKind::ImpactResult,
            ContentBody::About { .. } => ContentKind::About,
            ContentBody::Newsletter { .. } => ContentKind::Newsletter,
        }
    }
}

/// Content block as served to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: i64,
    pub title: String,
    pub media: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    #[serde(flatten)]
    pub body: ContentBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentBlock {
    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }
}

/// Raw `content_blocks` row; `data` holds the serialized [`ContentBody`].
#[derive(Debug, Clone, FromRow)]
pub struct ContentBlockRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub media: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// New or replacement content block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlockInput {
    pub title: String,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(flatten)]
    pub body: ContentBody,
}

impl ContentBlockInput {
    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }

    /// Field-level checks; returns the message shown to the admin.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required.".to_string());
        }
        let has_media = self.media.as_deref().is_some_and(|m| !m.trim().is_empty());
        if self.kind().requires_media() && !has_media {
            return Err("Image is required.".to_string());
        }
        Ok(())
    }
}

/// Listing filter for content blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFilter {
    pub active_only: bool,
    pub limit: Option<i64>,
}

// ============================================================================
// Free eBook
// ============================================================================

fn default_ebook_title() -> String {
    "Free Leadership Guide".to_string()
}

fn default_ebook_subtitle() -> String {
    "Download our free guide to leadership excellence".to_string()
}

fn default_ebook_description() -> String {
    "Get our exclusive free eBook with leadership insights, strategies, and actionable tips."
        .to_string()
}

/// Free eBook model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FreeEbook {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub ebook_file: Option<String>,
    pub cover_image: Option<String>,
    pub is_active: bool,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New or replacement eBook; the download count is never written through this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbookInput {
    #[serde(default = "default_ebook_title")]
    pub title: String,
    #[serde(default = "default_ebook_subtitle")]
    pub subtitle: String,
    #[serde(default = "default_ebook_description")]
    pub description: String,
    #[serde(default)]
    pub ebook_file: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Default for EbookInput {
    fn default() -> Self {
        Self {
            title: default_ebook_title(),
            subtitle: default_ebook_subtitle(),
            description: default_ebook_description(),
            ebook_file: None,
            cover_image: None,
            is_active: true,
        }
    }
}

/// Result of an eBook write under the single-active rule.
#[derive(Debug, Clone, Serialize)]
pub struct EbookWrite {
    pub ebook: FreeEbook,
    /// Other eBooks switched off by this write.
    pub deactivated_others: u64,
    /// The write switched an active eBook off and none remain active.
    pub none_active: bool,
}

// ============================================================================
// Contact submissions
// ============================================================================

text_enum! {
    EventType("event type") {
        Keynote => "keynote",
        Workshop => "workshop",
        Training => "training",
        Consultation => "consultation",
    }
}

text_enum! {
    /// Booking lifecycle: `new -> contacted -> booked | cancelled`.
    ContactStatus("contact status") {
        New => "new",
        Contacted => "contacted",
        Booked => "booked",
        Cancelled => "cancelled",
    }
}

impl ContactStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ContactStatus::Booked | ContactStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` changes anything. Staying in the
    /// same state, leaving a terminal state and returning to `new` do not.
    pub fn can_transition_to(self, next: ContactStatus) -> bool {
        self != next && !self.is_terminal() && next != ContactStatus::New
    }

    /// States a record may currently be in for a move to `next` to apply.
    pub fn sources_for(next: ContactStatus) -> Vec<ContactStatus> {
        ContactStatus::ALL
            .iter()
            .copied()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

/// Contact/booking submission model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub organization: String,
    #[sqlx(try_from = "String")]
    pub event_type: EventType,
    pub event_details: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub submitted_at: DateTime<Utc>,
    pub contacted_at: Option<DateTime<Utc>>,
    pub notes: String,
}

/// New contact submission for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactSubmission {
    pub full_name: String,
    pub email: String,
    pub organization: String,
    pub event_type: EventType,
    pub event_details: String,
}

// ============================================================================
// Newsletter subscriptions
// ============================================================================

text_enum! {
    SubscriptionSource("subscription source") {
        NewsletterSection => "newsletter_section",
        Footer => "footer",
    }
}

/// Newsletter subscription model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub source: SubscriptionSource,
    pub is_active: bool,
    pub agreed_to_terms: bool,
    pub created_at: DateTime<Utc>,
}

/// New subscription for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub email: String,
    pub name: String,
    pub source: SubscriptionSource,
    pub agreed_to_terms: bool,
}

/// Outcome of a subscribe attempt; a repeat email is not an error.
#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    Created(NewsletterSubscription),
    AlreadySubscribed(NewsletterSubscription),
}

// ============================================================================
// System logs (audit trail)
// ============================================================================

text_enum! {
    LogLevel("log level") {
        Info => "info",
        Warning => "warning",
        Error => "error",
        Success => "success",
    }
}

/// Audit trail entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemLog {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub log_level: LogLevel,
    pub message: String,
    pub source: String,
    pub user_ip: Option<String>,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// New audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSystemLog {
    pub log_level: LogLevel,
    pub message: String,
    pub source: String,
    pub user_ip: Option<String>,
    pub user_agent: String,
}

/// Listing filter for the audit trail
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub source: Option<String>,
    pub limit: i64,
}

// ============================================================================
// Form submissions (webhook capture)
// ============================================================================

text_enum! {
    FormSource("form source") {
        Booking => "booking",
        Newsletter => "newsletter",
        Footer => "footer",
    }
}

/// Captured webhook payload
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: i64,
    #[sqlx(try_from = "String")]
    pub source: FormSource,
    pub form_data: serde_json::Value,
    pub processed: bool,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_enum_round_trips_through_str() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), *kind);
        }
        assert!("banner".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_log_level_error_variant_parses() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::try_from("error".to_string()).unwrap(), LogLevel::Error);
        assert!(LogLevel::try_from("fatal".to_string()).is_err());
    }

    #[test]
    fn test_contact_transitions() {
        use ContactStatus::*;
        assert!(New.can_transition_to(Contacted));
        assert!(New.can_transition_to(Booked));
        assert!(Contacted.can_transition_to(Cancelled));
        assert!(!Contacted.can_transition_to(Contacted));
        assert!(!Booked.can_transition_to(Cancelled));
        assert!(!Contacted.can_transition_to(New));
        assert_eq!(ContactStatus::sources_for(Contacted), vec![New]);
        assert_eq!(ContactStatus::sources_for(Booked), vec![New, Contacted]);
    }

    #[test]
    fn test_content_input_applies_kind_defaults() {
        let input: ContentBlockInput = serde_json::from_value(serde_json::json!({
            "kind": "service",
            "title": "Keynotes",
            "service_type": "keynote",
            "description": "Stage talks"
        }))
        .unwrap();
        assert!(input.is_active);
        assert_eq!(input.sort_order, 0);
        match input.body {
            ContentBody::Service {
                icon, button_text, ..
            } => {
                assert_eq!(icon, "fas fa-star");
                assert_eq!(button_text, "Learn More");
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_hero_requires_media() {
        let input = ContentBlockInput {
            title: "Main".to_string(),
            media: None,
            is_active: true,
            sort_order: 0,
            body: ContentBody::Hero {
                position: HeroPosition::Desktop,
            },
        };
        assert_eq!(input.validate().unwrap_err(), "Image is required.");
    }

    #[test]
    fn test_content_block_serializes_kind_flat() {
        let block = ContentBlock {
            id: 1,
            title: "25%".to_string(),
            media: None,
            is_active: true,
            sort_order: 0,
            body: ContentBody::ImpactResult {
                value: "25%".to_string(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["kind"], "impact_result");
        assert_eq!(json["value"], "25%");
    }
}
