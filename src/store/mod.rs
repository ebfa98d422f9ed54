/*!
 * Site Store
 * Persistence contract shared by the Postgres and in-memory backends
 *
 * Every backend enforces the same write-time rules:
 * - at most one site settings row; reads lazily create it with defaults
 * - at most one block of a singleton content kind (newsletter content)
 * - at most one active eBook; activating one deactivates the rest in the
 *   same write
 * - download counts only grow through `increment_download`, one atomic
 *   update per call, and only drop through `reset_download_counts`
 * - entering `contacted` stamps `contacted_at` once
 */
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::db::models::{
    BlockFilter, ContactStatus, ContactSubmission, ContentBlock, ContentBlockInput, ContentKind,
    EbookInput, EbookWrite, FormSource, FormSubmission, FreeEbook, LogFilter, NewContactSubmission,
    NewSubscription, NewSystemLog, NewsletterSubscription, SiteSettings, SiteSettingsInput,
    SubscribeOutcome, SystemLog,
};
use crate::error::StoreError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Short backend name for health output.
    fn backend(&self) -> &'static str;

    /// Round-trip check against the backing storage.
    async fn ping(&self) -> StoreResult<Duration>;

    // ---------------------------------------------------------------- settings

    /// First settings row, if any.
    async fn settings(&self) -> StoreResult<Option<SiteSettings>>;

    /// First settings row, created with defaults when none exists.
    async fn settings_or_default(&self) -> StoreResult<SiteSettings>;

    /// Create the settings row; `None` when one already exists.
    async fn create_settings(&self, input: SiteSettingsInput) -> StoreResult<Option<SiteSettings>>;

    /// Overwrite the settings row, creating it first if needed.
    async fn update_settings(&self, input: SiteSettingsInput) -> StoreResult<SiteSettings>;

    // ---------------------------------------------------------- content blocks

    /// Blocks of one kind ordered by `sort_order` ascending, newest first on ties.
    async fn list_blocks(&self, kind: ContentKind, filter: BlockFilter)
        -> StoreResult<Vec<ContentBlock>>;

    async fn get_block(&self, kind: ContentKind, id: i64) -> StoreResult<Option<ContentBlock>>;

    /// Most recently created active block of a kind.
    async fn latest_active_block(&self, kind: ContentKind) -> StoreResult<Option<ContentBlock>>;

    /// Insert a block; `Conflict` for a second block of a singleton kind.
    async fn insert_block(&self, input: ContentBlockInput) -> StoreResult<ContentBlock>;

    /// Replace a block's fields; its kind cannot change.
    async fn update_block(&self, id: i64, input: ContentBlockInput)
        -> StoreResult<Option<ContentBlock>>;

    async fn set_blocks_active(&self, kind: ContentKind, ids: &[i64], active: bool)
        -> StoreResult<u64>;

    /// Copy blocks, suffixing their title with " (Copy)".
    async fn duplicate_blocks(&self, kind: ContentKind, ids: &[i64])
        -> StoreResult<Vec<ContentBlock>>;

    async fn delete_blocks(&self, kind: ContentKind, ids: &[i64]) -> StoreResult<u64>;

    // ------------------------------------------------------------------ ebooks

    /// All eBooks: active first, then by downloads, then most recently updated.
    async fn list_ebooks(&self) -> StoreResult<Vec<FreeEbook>>;

    async fn get_ebook(&self, id: i64) -> StoreResult<Option<FreeEbook>>;

    /// The active eBook (most recently created, should several ever exist).
    async fn active_ebook(&self) -> StoreResult<Option<FreeEbook>>;

    async fn insert_ebook(&self, input: EbookInput) -> StoreResult<EbookWrite>;

    async fn update_ebook(&self, id: i64, input: EbookInput) -> StoreResult<Option<EbookWrite>>;

    /// Make one eBook the only active one.
    async fn activate_ebook(&self, id: i64) -> StoreResult<Option<EbookWrite>>;

    /// Switch eBooks off; reports how many changed and whether none remain active.
    async fn deactivate_ebooks(&self, ids: &[i64]) -> StoreResult<(u64, bool)>;

    /// Count one download of an active eBook; `None` if missing or inactive.
    async fn increment_download(&self, id: i64) -> StoreResult<Option<FreeEbook>>;

    async fn reset_download_counts(&self, ids: &[i64]) -> StoreResult<u64>;

    async fn delete_ebooks(&self, ids: &[i64]) -> StoreResult<u64>;

    // ---------------------------------------------------------------- contacts

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission>;

    /// Submissions newest first, optionally restricted to one status.
    async fn list_contacts(&self, status: Option<ContactStatus>)
        -> StoreResult<Vec<ContactSubmission>>;

    async fn get_contact(&self, id: i64) -> StoreResult<Option<ContactSubmission>>;

    /// Move submissions to `status`; rows the lifecycle forbids are skipped.
    async fn set_contact_status(&self, ids: &[i64], status: ContactStatus) -> StoreResult<u64>;

    async fn set_contact_notes(&self, id: i64, notes: &str)
        -> StoreResult<Option<ContactSubmission>>;

    async fn count_contacts(&self) -> StoreResult<u64>;

    // ----------------------------------------------------------- subscriptions

    /// Idempotent subscribe keyed by email.
    async fn subscribe(&self, new: NewSubscription) -> StoreResult<SubscribeOutcome>;

    async fn list_subscriptions(&self, active: Option<bool>)
        -> StoreResult<Vec<NewsletterSubscription>>;

    async fn set_subscriptions_active(&self, ids: &[i64], active: bool) -> StoreResult<u64>;

    // -------------------------------------------------------------- audit logs

    async fn append_log(&self, entry: NewSystemLog) -> StoreResult<()>;

    /// Entries newest first.
    async fn list_logs(&self, filter: LogFilter) -> StoreResult<Vec<SystemLog>>;

    async fn purge_logs_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    // -------------------------------------------------------- form submissions

    async fn insert_form_submission(&self, source: FormSource, form_data: serde_json::Value)
        -> StoreResult<FormSubmission>;

    /// Submissions newest first.
    async fn list_form_submissions(&self) -> StoreResult<Vec<FormSubmission>>;
}

pub(crate) const COPY_SUFFIX: &str = " (Copy)";
