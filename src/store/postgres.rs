//! Postgres-backed store.
//!
//! The single-active eBook rule is enforced twice: writes that touch the
//! active flag run in a transaction holding a self-exclusive table lock, and a
//! partial unique index rejects a second active row outright.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::{Duration, Instant};

use super::{SiteStore, StoreResult, COPY_SUFFIX};
use crate::db::models::{
    BlockFilter, ContactStatus, ContactSubmission, ContentBlock, ContentBlockInput,
    ContentBlockRow, ContentBody, ContentKind, EbookInput, EbookWrite, FormSource, FormSubmission,
    FreeEbook, LogFilter, NewContactSubmission, NewSubscription, NewSystemLog,
    NewsletterSubscription, SiteSettings, SiteSettingsInput, SubscribeOutcome, SystemLog,
};
use crate::error::StoreError;

const SETTINGS_COLUMNS: &str =
    "id, logo, site_name, contact_email, contact_phone, created_at, updated_at";
const BLOCK_COLUMNS: &str =
    "id, kind, title, media, is_active, sort_order, data, created_at, updated_at";
const EBOOK_COLUMNS: &str = "id, title, subtitle, description, ebook_file, cover_image, \
     is_active, download_count, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, full_name, email, organization, event_type, event_details, \
     status, submitted_at, contacted_at, notes";
const SUBSCRIPTION_COLUMNS: &str =
    "id, email, name, source, is_active, agreed_to_terms, created_at";
const LOG_COLUMNS: &str = "id, log_level, message, source, user_ip, user_agent, created_at";
const FORM_COLUMNS: &str = "id, source, form_data, processed, submitted_at";

fn into_block(row: ContentBlockRow) -> StoreResult<ContentBlock> {
    let body: ContentBody = serde_json::from_value(row.data)?;
    if body.kind().as_str() != row.kind {
        return Err(StoreError::Corrupt(format!(
            "content block {} is stored as '{}' but holds '{}' data",
            row.id,
            row.kind,
            body.kind()
        )));
    }
    Ok(ContentBlock {
        id: row.id,
        title: row.title,
        media: row.media,
        is_active: row.is_active,
        sort_order: row.sort_order,
        body,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn into_blocks(rows: Vec<ContentBlockRow>) -> StoreResult<Vec<ContentBlock>> {
    rows.into_iter().map(into_block).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn singleton_conflict(kind: ContentKind) -> StoreError {
    StoreError::Conflict(format!("Only one {} block may exist", kind))
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction that serializes writers of the eBook active flag.
    /// Plain readers are not blocked.
    async fn begin_ebook_write(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE free_ebooks IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn deactivate_other_ebooks(
        tx: &mut Transaction<'static, Postgres>,
        keep: Option<i64>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE free_ebooks SET is_active = false, updated_at = now() \
             WHERE is_active AND ($1::BIGINT IS NULL OR id <> $1)",
        )
        .bind(keep)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn none_active(tx: &mut Transaction<'static, Postgres>) -> StoreResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM free_ebooks WHERE is_active)")
                .fetch_one(&mut **tx)
                .await?;
        Ok(!exists)
    }
}

#[async_trait]
impl SiteStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn settings(&self) -> StoreResult<Option<SiteSettings>> {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM site_settings ORDER BY id LIMIT 1");
        Ok(sqlx::query_as::<_, SiteSettings>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn settings_or_default(&self) -> StoreResult<SiteSettings> {
        if let Some(settings) = self.settings().await? {
            return Ok(settings);
        }
        // A concurrent request may win the insert; either way one row exists after.
        self.create_settings(SiteSettingsInput::default()).await?;
        self.settings()
            .await?
            .ok_or_else(|| StoreError::Corrupt("site settings vanished after insert".into()))
    }

    async fn create_settings(&self, input: SiteSettingsInput) -> StoreResult<Option<SiteSettings>> {
        let sql = format!(
            "INSERT INTO site_settings (logo, site_name, contact_email, contact_phone) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (singleton) DO NOTHING \
             RETURNING {SETTINGS_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SiteSettings>(&sql)
            .bind(&input.logo)
            .bind(input.site_name())
            .bind(input.contact_email())
            .bind(input.contact_phone())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_settings(&self, input: SiteSettingsInput) -> StoreResult<SiteSettings> {
        let sql = format!(
            "INSERT INTO site_settings (logo, site_name, contact_email, contact_phone) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (singleton) DO UPDATE SET \
                 logo = EXCLUDED.logo, \
                 site_name = EXCLUDED.site_name, \
                 contact_email = EXCLUDED.contact_email, \
                 contact_phone = EXCLUDED.contact_phone, \
                 updated_at = now() \
             RETURNING {SETTINGS_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SiteSettings>(&sql)
            .bind(&input.logo)
            .bind(input.site_name())
            .bind(input.contact_email())
            .bind(input.contact_phone())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_blocks(
        &self,
        kind: ContentKind,
        filter: BlockFilter,
    ) -> StoreResult<Vec<ContentBlock>> {
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM content_blocks \
             WHERE kind = $1 AND (NOT $2 OR is_active) \
             ORDER BY sort_order ASC, created_at DESC, id DESC \
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(kind.as_str())
            .bind(filter.active_only)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;
        into_blocks(rows)
    }

    async fn get_block(&self, kind: ContentKind, id: i64) -> StoreResult<Option<ContentBlock>> {
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM content_blocks WHERE kind = $1 AND id = $2");
        sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_block)
            .transpose()
    }

    async fn latest_active_block(&self, kind: ContentKind) -> StoreResult<Option<ContentBlock>> {
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM content_blocks \
             WHERE kind = $1 AND is_active \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(into_block)
            .transpose()
    }

    async fn insert_block(&self, input: ContentBlockInput) -> StoreResult<ContentBlock> {
        let kind = input.kind();
        let data = serde_json::to_value(&input.body)?;
        let sql = format!(
            "INSERT INTO content_blocks (kind, title, media, is_active, sort_order, data) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {BLOCK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(kind.as_str())
            .bind(&input.title)
            .bind(&input.media)
            .bind(input.is_active)
            .bind(input.sort_order)
            .bind(&data)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    singleton_conflict(kind)
                } else {
                    StoreError::Database(e)
                }
            })?;
        into_block(row)
    }

    async fn update_block(
        &self,
        id: i64,
        input: ContentBlockInput,
    ) -> StoreResult<Option<ContentBlock>> {
        let data = serde_json::to_value(&input.body)?;
        let sql = format!(
            "UPDATE content_blocks \
             SET title = $1, media = $2, is_active = $3, sort_order = $4, data = $5, updated_at = now() \
             WHERE id = $6 AND kind = $7 \
             RETURNING {BLOCK_COLUMNS}"
        );
        sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(&input.title)
            .bind(&input.media)
            .bind(input.is_active)
            .bind(input.sort_order)
            .bind(&data)
            .bind(id)
            .bind(input.kind().as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(into_block)
            .transpose()
    }

    async fn set_blocks_active(
        &self,
        kind: ContentKind,
        ids: &[i64],
        active: bool,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE content_blocks SET is_active = $1, updated_at = now() \
             WHERE kind = $2 AND id = ANY($3)",
        )
        .bind(active)
        .bind(kind.as_str())
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn duplicate_blocks(
        &self,
        kind: ContentKind,
        ids: &[i64],
    ) -> StoreResult<Vec<ContentBlock>> {
        if kind.is_singleton() {
            return Err(singleton_conflict(kind));
        }
        let sql = format!(
            "INSERT INTO content_blocks (kind, title, media, is_active, sort_order, data) \
             SELECT kind, title || $3, media, is_active, sort_order, data \
             FROM content_blocks WHERE kind = $1 AND id = ANY($2) \
             ORDER BY id \
             RETURNING {BLOCK_COLUMNS}"
        );
        let rows = sqlx::query_as::<_, ContentBlockRow>(&sql)
            .bind(kind.as_str())
            .bind(ids)
            .bind(COPY_SUFFIX)
            .fetch_all(&self.pool)
            .await?;
        into_blocks(rows)
    }

    async fn delete_blocks(&self, kind: ContentKind, ids: &[i64]) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM content_blocks WHERE kind = $1 AND id = ANY($2)")
            .bind(kind.as_str())
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_ebooks(&self) -> StoreResult<Vec<FreeEbook>> {
        let sql = format!(
            "SELECT {EBOOK_COLUMNS} FROM free_ebooks \
             ORDER BY is_active DESC, download_count DESC, updated_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, FreeEbook>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_ebook(&self, id: i64) -> StoreResult<Option<FreeEbook>> {
        let sql = format!("SELECT {EBOOK_COLUMNS} FROM free_ebooks WHERE id = $1");
        Ok(sqlx::query_as::<_, FreeEbook>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn active_ebook(&self) -> StoreResult<Option<FreeEbook>> {
        let sql = format!(
            "SELECT {EBOOK_COLUMNS} FROM free_ebooks WHERE is_active \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, FreeEbook>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_ebook(&self, input: EbookInput) -> StoreResult<EbookWrite> {
        let mut tx = self.begin_ebook_write().await?;
        let deactivated_others = if input.is_active {
            Self::deactivate_other_ebooks(&mut tx, None).await?
        } else {
            0
        };
        let sql = format!(
            "INSERT INTO free_ebooks (title, subtitle, description, ebook_file, cover_image, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {EBOOK_COLUMNS}"
        );
        let ebook = sqlx::query_as::<_, FreeEbook>(&sql)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.ebook_file)
            .bind(&input.cover_image)
            .bind(input.is_active)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(EbookWrite {
            ebook,
            deactivated_others,
            none_active: false,
        })
    }

    async fn update_ebook(&self, id: i64, input: EbookInput) -> StoreResult<Option<EbookWrite>> {
        let mut tx = self.begin_ebook_write().await?;
        let Some((was_active,)): Option<(bool,)> =
            sqlx::query_as("SELECT is_active FROM free_ebooks WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            return Ok(None);
        };
        let deactivated_others = if input.is_active {
            Self::deactivate_other_ebooks(&mut tx, Some(id)).await?
        } else {
            0
        };
        let sql = format!(
            "UPDATE free_ebooks \
             SET title = $1, subtitle = $2, description = $3, ebook_file = $4, \
                 cover_image = $5, is_active = $6, updated_at = now() \
             WHERE id = $7 \
             RETURNING {EBOOK_COLUMNS}"
        );
        let Some(ebook) = sqlx::query_as::<_, FreeEbook>(&sql)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.ebook_file)
            .bind(&input.cover_image)
            .bind(input.is_active)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            // Dropping the transaction rolls back the deactivation above.
            return Ok(None);
        };
        let none_active = was_active && !ebook.is_active && Self::none_active(&mut tx).await?;
        tx.commit().await?;
        Ok(Some(EbookWrite {
            ebook,
            deactivated_others,
            none_active,
        }))
    }

    async fn activate_ebook(&self, id: i64) -> StoreResult<Option<EbookWrite>> {
        let mut tx = self.begin_ebook_write().await?;
        let deactivated_others = Self::deactivate_other_ebooks(&mut tx, Some(id)).await?;
        let sql = format!(
            "UPDATE free_ebooks \
             SET is_active = true, \
                 updated_at = CASE WHEN is_active THEN updated_at ELSE now() END \
             WHERE id = $1 \
             RETURNING {EBOOK_COLUMNS}"
        );
        let Some(ebook) = sqlx::query_as::<_, FreeEbook>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(EbookWrite {
            ebook,
            deactivated_others,
            none_active: false,
        }))
    }

    async fn deactivate_ebooks(&self, ids: &[i64]) -> StoreResult<(u64, bool)> {
        let mut tx = self.begin_ebook_write().await?;
        let result = sqlx::query(
            "UPDATE free_ebooks SET is_active = false, updated_at = now() \
             WHERE is_active AND id = ANY($1)",
        )
        .bind(ids)
        .execute(&mut *tx)
        .await?;
        let changed = result.rows_affected();
        let none_active = changed > 0 && Self::none_active(&mut tx).await?;
        tx.commit().await?;
        Ok((changed, none_active))
    }

    async fn increment_download(&self, id: i64) -> StoreResult<Option<FreeEbook>> {
        let sql = format!(
            "UPDATE free_ebooks \
             SET download_count = download_count + 1, updated_at = now() \
             WHERE id = $1 AND is_active \
             RETURNING {EBOOK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, FreeEbook>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn reset_download_counts(&self, ids: &[i64]) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE free_ebooks SET download_count = 0, updated_at = now() WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_ebooks(&self, ids: &[i64]) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM free_ebooks WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission> {
        let sql = format!(
            "INSERT INTO contact_submissions \
                 (full_name, email, organization, event_type, event_details) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(&new.full_name)
            .bind(&new.email)
            .bind(&new.organization)
            .bind(new.event_type.as_str())
            .bind(&new.event_details)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
    ) -> StoreResult<Vec<ContactSubmission>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_submissions \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY submitted_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(status.map(ContactStatus::as_str))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Option<ContactSubmission>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact_submissions WHERE id = $1");
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_contact_status(&self, ids: &[i64], status: ContactStatus) -> StoreResult<u64> {
        let sources: Vec<String> = ContactStatus::sources_for(status)
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let result = sqlx::query(
            "UPDATE contact_submissions \
             SET status = $1, \
                 contacted_at = CASE WHEN $1 = 'contacted' THEN now() ELSE contacted_at END \
             WHERE id = ANY($2) AND status = ANY($3)",
        )
        .bind(status.as_str())
        .bind(ids)
        .bind(&sources)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn set_contact_notes(
        &self,
        id: i64,
        notes: &str,
    ) -> StoreResult<Option<ContactSubmission>> {
        let sql = format!(
            "UPDATE contact_submissions SET notes = $1 WHERE id = $2 RETURNING {CONTACT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ContactSubmission>(&sql)
            .bind(notes)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_contacts(&self) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_submissions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn subscribe(&self, new: NewSubscription) -> StoreResult<SubscribeOutcome> {
        let sql = format!(
            "INSERT INTO newsletter_subscriptions (email, name, source, agreed_to_terms) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, NewsletterSubscription>(&sql)
            .bind(&new.email)
            .bind(&new.name)
            .bind(new.source.as_str())
            .bind(new.agreed_to_terms)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(subscription) = inserted {
            return Ok(SubscribeOutcome::Created(subscription));
        }

        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM newsletter_subscriptions WHERE email = $1"
        );
        sqlx::query_as::<_, NewsletterSubscription>(&sql)
            .bind(&new.email)
            .fetch_optional(&self.pool)
            .await?
            .map(SubscribeOutcome::AlreadySubscribed)
            .ok_or_else(|| {
                StoreError::Conflict(format!("subscription for {} changed concurrently", new.email))
            })
    }

    async fn list_subscriptions(
        &self,
        active: Option<bool>,
    ) -> StoreResult<Vec<NewsletterSubscription>> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM newsletter_subscriptions \
             WHERE ($1::BOOLEAN IS NULL OR is_active = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, NewsletterSubscription>(&sql)
            .bind(active)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn set_subscriptions_active(&self, ids: &[i64], active: bool) -> StoreResult<u64> {
        let result =
            sqlx::query("UPDATE newsletter_subscriptions SET is_active = $1 WHERE id = ANY($2)")
                .bind(active)
                .bind(ids)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn append_log(&self, entry: NewSystemLog) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO system_logs (log_level, message, source, user_ip, user_agent) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.log_level.as_str())
        .bind(&entry.message)
        .bind(&entry.source)
        .bind(&entry.user_ip)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_logs(&self, filter: LogFilter) -> StoreResult<Vec<SystemLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM system_logs \
             WHERE ($1::TEXT IS NULL OR log_level = $1) \
               AND ($2::TEXT IS NULL OR source = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3"
        );
        Ok(sqlx::query_as::<_, SystemLog>(&sql)
            .bind(filter.level.map(|l| l.as_str()))
            .bind(filter.source.as_deref())
            .bind(filter.limit.max(0))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn purge_logs_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM system_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_form_submission(
        &self,
        source: FormSource,
        form_data: serde_json::Value,
    ) -> StoreResult<FormSubmission> {
        let sql = format!(
            "INSERT INTO form_submissions (source, form_data) VALUES ($1, $2) \
             RETURNING {FORM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, FormSubmission>(&sql)
            .bind(source.as_str())
            .bind(&form_data)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_form_submissions(&self) -> StoreResult<Vec<FormSubmission>> {
        let sql = format!(
            "SELECT {FORM_COLUMNS} FROM form_submissions ORDER BY submitted_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, FormSubmission>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}
