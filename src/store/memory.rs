//! In-memory store used when no database is configured, and by the tests.
//!
//! Every write takes the single write lock, so each operation is atomic with
//! respect to every other one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{SiteStore, StoreResult, COPY_SUFFIX};
use crate::db::models::{
    BlockFilter, ContactStatus, ContactSubmission, ContentBlock, ContentBlockInput, ContentKind,
    EbookInput, EbookWrite, FormSource, FormSubmission, FreeEbook, LogFilter, NewContactSubmission,
    NewSubscription, NewSystemLog, NewsletterSubscription, SiteSettings, SiteSettingsInput,
    SubscribeOutcome, SystemLog,
};
use crate::error::StoreError;

#[derive(Default)]
struct Tables {
    next_id: i64,
    settings: Option<SiteSettings>,
    blocks: Vec<ContentBlock>,
    ebooks: Vec<FreeEbook>,
    contacts: Vec<ContactSubmission>,
    subscriptions: Vec<NewsletterSubscription>,
    logs: Vec<SystemLog>,
    forms: Vec<FormSubmission>,
    #[cfg(test)]
    fail_log_writes: bool,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_settings(&mut self, input: &SiteSettingsInput) -> SiteSettings {
        let now = Utc::now();
        SiteSettings {
            id: self.next_id(),
            logo: input.logo.clone(),
            site_name: input.site_name().to_string(),
            contact_email: input.contact_email().to_string(),
            contact_phone: input.contact_phone().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn new_block(&mut self, input: ContentBlockInput) -> ContentBlock {
        let now = Utc::now();
        ContentBlock {
            id: self.next_id(),
            title: input.title,
            media: input.media,
            is_active: input.is_active,
            sort_order: input.sort_order,
            body: input.body,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clear the active flag on every eBook except `keep`.
    fn deactivate_other_ebooks(&mut self, keep: i64, now: DateTime<Utc>) -> u64 {
        let mut changed = 0;
        for ebook in self.ebooks.iter_mut().filter(|e| e.is_active && e.id != keep) {
            ebook.is_active = false;
            ebook.updated_at = now;
            changed += 1;
        }
        changed
    }

    fn any_active_ebook(&self) -> bool {
        self.ebooks.iter().any(|e| e.is_active)
    }

    #[cfg(test)]
    fn log_writes_enabled(&self) -> bool {
        !self.fail_log_writes
    }

    #[cfg(not(test))]
    fn log_writes_enabled(&self) -> bool {
        true
    }
}

/// Newest-first ordering key with the id as tiebreaker.
fn newest_first(created_at: DateTime<Utc>, id: i64) -> Reverse<(DateTime<Utc>, i64)> {
    Reverse((created_at, id))
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make audit writes fail, to exercise best-effort logging.
    #[cfg(test)]
    pub(crate) async fn fail_log_writes(&self, fail: bool) {
        self.tables.write().await.fail_log_writes = fail;
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        let _tables = self.tables.read().await;
        Ok(start.elapsed())
    }

    async fn settings(&self) -> StoreResult<Option<SiteSettings>> {
        Ok(self.tables.read().await.settings.clone())
    }

    async fn settings_or_default(&self) -> StoreResult<SiteSettings> {
        let mut tables = self.tables.write().await;
        if let Some(settings) = &tables.settings {
            return Ok(settings.clone());
        }
        let settings = tables.new_settings(&SiteSettingsInput::default());
        tables.settings = Some(settings.clone());
        Ok(settings)
    }

    async fn create_settings(&self, input: SiteSettingsInput) -> StoreResult<Option<SiteSettings>> {
        let mut tables = self.tables.write().await;
        if tables.settings.is_some() {
            return Ok(None);
        }
        let settings = tables.new_settings(&input);
        tables.settings = Some(settings.clone());
        Ok(Some(settings))
    }

    async fn update_settings(&self, input: SiteSettingsInput) -> StoreResult<SiteSettings> {
        let mut tables = self.tables.write().await;
        let settings = match tables.settings.take() {
            Some(existing) => SiteSettings {
                logo: input.logo.clone(),
                site_name: input.site_name().to_string(),
                contact_email: input.contact_email().to_string(),
                contact_phone: input.contact_phone().to_string(),
                updated_at: Utc::now(),
                ..existing
            },
            None => tables.new_settings(&input),
        };
        tables.settings = Some(settings.clone());
        Ok(settings)
    }

    async fn list_blocks(
        &self,
        kind: ContentKind,
        filter: BlockFilter,
    ) -> StoreResult<Vec<ContentBlock>> {
        let tables = self.tables.read().await;
        let mut blocks: Vec<ContentBlock> = tables
            .blocks
            .iter()
            .filter(|b| b.kind() == kind && (!filter.active_only || b.is_active))
            .cloned()
            .collect();
        blocks.sort_by_key(|b| (b.sort_order, newest_first(b.created_at, b.id)));
        if let Some(limit) = filter.limit {
            blocks.truncate(limit.max(0) as usize);
        }
        Ok(blocks)
    }

    async fn get_block(&self, kind: ContentKind, id: i64) -> StoreResult<Option<ContentBlock>> {
        let tables = self.tables.read().await;
        Ok(tables
            .blocks
            .iter()
            .find(|b| b.id == id && b.kind() == kind)
            .cloned())
    }

    async fn latest_active_block(&self, kind: ContentKind) -> StoreResult<Option<ContentBlock>> {
        let tables = self.tables.read().await;
        Ok(tables
            .blocks
            .iter()
            .filter(|b| b.kind() == kind && b.is_active)
            .max_by_key(|b| (b.created_at, b.id))
            .cloned())
    }

    async fn insert_block(&self, input: ContentBlockInput) -> StoreResult<ContentBlock> {
        let mut tables = self.tables.write().await;
        let kind = input.kind();
        if kind.is_singleton() && tables.blocks.iter().any(|b| b.kind() == kind) {
            return Err(StoreError::Conflict(format!(
                "Only one {} block may exist",
                kind
            )));
        }
        let block = tables.new_block(input);
        tables.blocks.push(block.clone());
        Ok(block)
    }

    async fn update_block(
        &self,
        id: i64,
        input: ContentBlockInput,
    ) -> StoreResult<Option<ContentBlock>> {
        let mut tables = self.tables.write().await;
        let kind = input.kind();
        let Some(block) = tables
            .blocks
            .iter_mut()
            .find(|b| b.id == id && b.kind() == kind)
        else {
            return Ok(None);
        };
        block.title = input.title;
        block.media = input.media;
        block.is_active = input.is_active;
        block.sort_order = input.sort_order;
        block.body = input.body;
        block.updated_at = Utc::now();
        Ok(Some(block.clone()))
    }

    async fn set_blocks_active(
        &self,
        kind: ContentKind,
        ids: &[i64],
        active: bool,
    ) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for block in tables
            .blocks
            .iter_mut()
            .filter(|b| b.kind() == kind && ids.contains(&b.id))
        {
            block.is_active = active;
            block.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn duplicate_blocks(
        &self,
        kind: ContentKind,
        ids: &[i64],
    ) -> StoreResult<Vec<ContentBlock>> {
        let mut tables = self.tables.write().await;
        if kind.is_singleton() {
            return Err(StoreError::Conflict(format!(
                "Only one {} block may exist",
                kind
            )));
        }
        let sources: Vec<ContentBlock> = tables
            .blocks
            .iter()
            .filter(|b| b.kind() == kind && ids.contains(&b.id))
            .cloned()
            .collect();
        let mut copies = Vec::with_capacity(sources.len());
        for source in sources {
            let copy = tables.new_block(ContentBlockInput {
                title: format!("{}{}", source.title, COPY_SUFFIX),
                media: source.media,
                is_active: source.is_active,
                sort_order: source.sort_order,
                body: source.body,
            });
            tables.blocks.push(copy.clone());
            copies.push(copy);
        }
        Ok(copies)
    }

    async fn delete_blocks(&self, kind: ContentKind, ids: &[i64]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.blocks.len();
        tables
            .blocks
            .retain(|b| !(b.kind() == kind && ids.contains(&b.id)));
        Ok((before - tables.blocks.len()) as u64)
    }

    async fn list_ebooks(&self) -> StoreResult<Vec<FreeEbook>> {
        let tables = self.tables.read().await;
        let mut ebooks = tables.ebooks.clone();
        ebooks.sort_by_key(|e| Reverse((e.is_active, e.download_count, e.updated_at, e.id)));
        Ok(ebooks)
    }

    async fn get_ebook(&self, id: i64) -> StoreResult<Option<FreeEbook>> {
        let tables = self.tables.read().await;
        Ok(tables.ebooks.iter().find(|e| e.id == id).cloned())
    }

    async fn active_ebook(&self) -> StoreResult<Option<FreeEbook>> {
        let tables = self.tables.read().await;
        Ok(tables
            .ebooks
            .iter()
            .filter(|e| e.is_active)
            .max_by_key(|e| (e.created_at, e.id))
            .cloned())
    }

    async fn insert_ebook(&self, input: EbookInput) -> StoreResult<EbookWrite> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let id = tables.next_id();
        let deactivated_others = if input.is_active {
            tables.deactivate_other_ebooks(id, now)
        } else {
            0
        };
        let ebook = FreeEbook {
            id,
            title: input.title,
            subtitle: input.subtitle,
            description: input.description,
            ebook_file: input.ebook_file,
            cover_image: input.cover_image,
            is_active: input.is_active,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.ebooks.push(ebook.clone());
        Ok(EbookWrite {
            ebook,
            deactivated_others,
            none_active: false,
        })
    }

    async fn update_ebook(&self, id: i64, input: EbookInput) -> StoreResult<Option<EbookWrite>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let Some(was_active) = tables.ebooks.iter().find(|e| e.id == id).map(|e| e.is_active)
        else {
            return Ok(None);
        };
        let deactivated_others = if input.is_active {
            tables.deactivate_other_ebooks(id, now)
        } else {
            0
        };
        let Some(ebook) = tables.ebooks.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        ebook.title = input.title;
        ebook.subtitle = input.subtitle;
        ebook.description = input.description;
        ebook.ebook_file = input.ebook_file;
        ebook.cover_image = input.cover_image;
        ebook.is_active = input.is_active;
        ebook.updated_at = now;
        let ebook = ebook.clone();
        let switched_off = was_active && !ebook.is_active;
        Ok(Some(EbookWrite {
            ebook,
            deactivated_others,
            none_active: switched_off && !tables.any_active_ebook(),
        }))
    }

    async fn activate_ebook(&self, id: i64) -> StoreResult<Option<EbookWrite>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        if !tables.ebooks.iter().any(|e| e.id == id) {
            return Ok(None);
        }
        let deactivated_others = tables.deactivate_other_ebooks(id, now);
        let Some(ebook) = tables.ebooks.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if !ebook.is_active {
            ebook.is_active = true;
            ebook.updated_at = now;
        }
        Ok(Some(EbookWrite {
            ebook: ebook.clone(),
            deactivated_others,
            none_active: false,
        }))
    }

    async fn deactivate_ebooks(&self, ids: &[i64]) -> StoreResult<(u64, bool)> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for ebook in tables
            .ebooks
            .iter_mut()
            .filter(|e| e.is_active && ids.contains(&e.id))
        {
            ebook.is_active = false;
            ebook.updated_at = now;
            changed += 1;
        }
        Ok((changed, changed > 0 && !tables.any_active_ebook()))
    }

    async fn increment_download(&self, id: i64) -> StoreResult<Option<FreeEbook>> {
        let mut tables = self.tables.write().await;
        let Some(ebook) = tables
            .ebooks
            .iter_mut()
            .find(|e| e.id == id && e.is_active)
        else {
            return Ok(None);
        };
        ebook.download_count += 1;
        ebook.updated_at = Utc::now();
        Ok(Some(ebook.clone()))
    }

    async fn reset_download_counts(&self, ids: &[i64]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for ebook in tables.ebooks.iter_mut().filter(|e| ids.contains(&e.id)) {
            ebook.download_count = 0;
            ebook.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_ebooks(&self, ids: &[i64]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.ebooks.len();
        tables.ebooks.retain(|e| !ids.contains(&e.id));
        Ok((before - tables.ebooks.len()) as u64)
    }

    async fn insert_contact(&self, new: NewContactSubmission) -> StoreResult<ContactSubmission> {
        let mut tables = self.tables.write().await;
        let contact = ContactSubmission {
            id: tables.next_id(),
            full_name: new.full_name,
            email: new.email,
            organization: new.organization,
            event_type: new.event_type,
            event_details: new.event_details,
            status: ContactStatus::New,
            submitted_at: Utc::now(),
            contacted_at: None,
            notes: String::new(),
        };
        tables.contacts.push(contact.clone());
        Ok(contact)
    }

    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
    ) -> StoreResult<Vec<ContactSubmission>> {
        let tables = self.tables.read().await;
        let mut contacts: Vec<ContactSubmission> = tables
            .contacts
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        contacts.sort_by_key(|c| newest_first(c.submitted_at, c.id));
        Ok(contacts)
    }

    async fn get_contact(&self, id: i64) -> StoreResult<Option<ContactSubmission>> {
        let tables = self.tables.read().await;
        Ok(tables.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn set_contact_status(&self, ids: &[i64], status: ContactStatus) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for contact in tables.contacts.iter_mut().filter(|c| ids.contains(&c.id)) {
            if !contact.status.can_transition_to(status) {
                continue;
            }
            contact.status = status;
            if status == ContactStatus::Contacted {
                contact.contacted_at = Some(now);
            }
            changed += 1;
        }
        Ok(changed)
    }

    async fn set_contact_notes(
        &self,
        id: i64,
        notes: &str,
    ) -> StoreResult<Option<ContactSubmission>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .map(|contact| {
                contact.notes = notes.to_string();
                contact.clone()
            }))
    }

    async fn count_contacts(&self) -> StoreResult<u64> {
        Ok(self.tables.read().await.contacts.len() as u64)
    }

    async fn subscribe(&self, new: NewSubscription) -> StoreResult<SubscribeOutcome> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.subscriptions.iter().find(|s| s.email == new.email) {
            return Ok(SubscribeOutcome::AlreadySubscribed(existing.clone()));
        }
        let subscription = NewsletterSubscription {
            id: tables.next_id(),
            email: new.email,
            name: new.name,
            source: new.source,
            is_active: true,
            agreed_to_terms: new.agreed_to_terms,
            created_at: Utc::now(),
        };
        tables.subscriptions.push(subscription.clone());
        Ok(SubscribeOutcome::Created(subscription))
    }

    async fn list_subscriptions(
        &self,
        active: Option<bool>,
    ) -> StoreResult<Vec<NewsletterSubscription>> {
        let tables = self.tables.read().await;
        let mut subscriptions: Vec<NewsletterSubscription> = tables
            .subscriptions
            .iter()
            .filter(|s| active.is_none_or(|a| s.is_active == a))
            .cloned()
            .collect();
        subscriptions.sort_by_key(|s| newest_first(s.created_at, s.id));
        Ok(subscriptions)
    }

    async fn set_subscriptions_active(&self, ids: &[i64], active: bool) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for subscription in tables
            .subscriptions
            .iter_mut()
            .filter(|s| ids.contains(&s.id))
        {
            subscription.is_active = active;
            changed += 1;
        }
        Ok(changed)
    }

    async fn append_log(&self, entry: NewSystemLog) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.log_writes_enabled() {
            return Err(StoreError::Conflict("log writes disabled".to_string()));
        }
        let log = SystemLog {
            id: tables.next_id(),
            log_level: entry.log_level,
            message: entry.message,
            source: entry.source,
            user_ip: entry.user_ip,
            user_agent: entry.user_agent,
            created_at: Utc::now(),
        };
        tables.logs.push(log);
        Ok(())
    }

    async fn list_logs(&self, filter: LogFilter) -> StoreResult<Vec<SystemLog>> {
        let tables = self.tables.read().await;
        let mut logs: Vec<SystemLog> = tables
            .logs
            .iter()
            .filter(|l| filter.level.is_none_or(|level| l.log_level == level))
            .filter(|l| filter.source.as_deref().is_none_or(|source| l.source == source))
            .cloned()
            .collect();
        logs.sort_by_key(|l| newest_first(l.created_at, l.id));
        logs.truncate(filter.limit.max(0) as usize);
        Ok(logs)
    }

    async fn purge_logs_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.logs.len();
        tables.logs.retain(|l| l.created_at >= cutoff);
        Ok((before - tables.logs.len()) as u64)
    }

    async fn insert_form_submission(
        &self,
        source: FormSource,
        form_data: serde_json::Value,
    ) -> StoreResult<FormSubmission> {
        let mut tables = self.tables.write().await;
        let submission = FormSubmission {
            id: tables.next_id(),
            source,
            form_data,
            processed: false,
            submitted_at: Utc::now(),
        };
        tables.forms.push(submission.clone());
        Ok(submission)
    }

    async fn list_form_submissions(&self) -> StoreResult<Vec<FormSubmission>> {
        let tables = self.tables.read().await;
        let mut forms = tables.forms.clone();
        forms.sort_by_key(|f| newest_first(f.submitted_at, f.id));
        Ok(forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        ContentBody, EventType, HeroPosition, ServiceType, SubscriptionSource,
    };
    use std::sync::Arc;

    fn service(title: &str, sort_order: i32) -> ContentBlockInput {
        ContentBlockInput {
            title: title.to_string(),
            media: None,
            is_active: true,
            sort_order,
            body: ContentBody::Service {
                service_type: ServiceType::Keynote,
                description: "desc".to_string(),
                icon: "fas fa-star".to_string(),
                topics: "a, b".to_string(),
                button_text: "Learn More".to_string(),
            },
        }
    }

    fn ebook(title: &str, is_active: bool) -> EbookInput {
        EbookInput {
            title: title.to_string(),
            ebook_file: Some(format!("/media/ebooks/{}.pdf", title)),
            is_active,
            ..EbookInput::default()
        }
    }

    fn contact() -> NewContactSubmission {
        NewContactSubmission {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            organization: "Engines Ltd".to_string(),
            event_type: EventType::Workshop,
            event_details: "Annual offsite".to_string(),
        }
    }

    async fn active_ids(store: &MemoryStore) -> Vec<i64> {
        store
            .list_ebooks()
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.is_active)
            .map(|e| e.id)
            .collect()
    }

    #[tokio::test]
    async fn test_settings_singleton_guard() {
        let store = MemoryStore::new();
        let created = store
            .create_settings(SiteSettingsInput {
                site_name: Some("Acme".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.unwrap().site_name, "Acme");

        let second = store.create_settings(SiteSettingsInput::default()).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.settings_or_default().await.unwrap().site_name, "Acme");
    }

    #[tokio::test]
    async fn test_settings_lazily_created_with_defaults() {
        let store = MemoryStore::new();
        assert!(store.settings().await.unwrap().is_none());
        let settings = store.settings_or_default().await.unwrap();
        assert_eq!(settings.site_name, "Fusion Force LLC");
        assert_eq!(settings.contact_phone, "+1 (443) 545-4565");
        let again = store.settings_or_default().await.unwrap();
        assert_eq!(again.id, settings.id);
    }

    #[tokio::test]
    async fn test_blocks_ordered_by_sort_order_then_newest() {
        let store = MemoryStore::new();
        let first = store.insert_block(service("first", 1)).await.unwrap();
        let second = store.insert_block(service("second", 1)).await.unwrap();
        let top = store.insert_block(service("top", 0)).await.unwrap();

        let ids: Vec<i64> = store
            .list_blocks(ContentKind::Service, BlockFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![top.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_active_filter_and_limit() {
        let store = MemoryStore::new();
        let hidden = store.insert_block(service("hidden", 0)).await.unwrap();
        store.insert_block(service("a", 1)).await.unwrap();
        store.insert_block(service("b", 2)).await.unwrap();
        store
            .set_blocks_active(ContentKind::Service, &[hidden.id], false)
            .await
            .unwrap();

        let blocks = store
            .list_blocks(
                ContentKind::Service,
                BlockFilter {
                    active_only: true,
                    limit: Some(1),
                },
            )
            .await
            .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].title, "a");
    }

    #[tokio::test]
    async fn test_singleton_kind_rejects_second_block() {
        let store = MemoryStore::new();
        let newsletter = || ContentBlockInput {
            title: "Monthly Newsletter".to_string(),
            media: None,
            is_active: true,
            sort_order: 0,
            body: ContentBody::Newsletter {
                subtitle: String::new(),
                benefits: String::new(),
                pdf_file: None,
            },
        };
        store.insert_block(newsletter()).await.unwrap();
        let err = store.insert_block(newsletter()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_appends_copy_suffix() {
        let store = MemoryStore::new();
        let hero = store
            .insert_block(ContentBlockInput {
                title: "Stage".to_string(),
                media: Some("/media/hero/a.jpg".to_string()),
                is_active: true,
                sort_order: 0,
                body: ContentBody::Hero {
                    position: HeroPosition::Mobile,
                },
            })
            .await
            .unwrap();
        let copies = store
            .duplicate_blocks(ContentKind::Hero, &[hero.id])
            .await
            .unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].title, "Stage (Copy)");
        assert_ne!(copies[0].id, hero.id);
        assert_eq!(copies[0].body, hero.body);
    }

    #[tokio::test]
    async fn test_update_block_cannot_change_kind() {
        let store = MemoryStore::new();
        let block = store.insert_block(service("svc", 0)).await.unwrap();
        let replaced = store
            .update_block(
                block.id,
                ContentBlockInput {
                    title: "x".to_string(),
                    media: None,
                    is_active: true,
                    sort_order: 0,
                    body: ContentBody::ImpactResult {
                        value: "10".to_string(),
                    },
                },
            )
            .await
            .unwrap();
        assert!(replaced.is_none());
    }

    #[tokio::test]
    async fn test_activating_ebook_leaves_exactly_one_active() {
        let store = MemoryStore::new();
        let a = store.insert_ebook(ebook("a", true)).await.unwrap().ebook;
        let b = store.insert_ebook(ebook("b", false)).await.unwrap().ebook;
        assert_eq!(active_ids(&store).await, vec![a.id]);

        let write = store.activate_ebook(b.id).await.unwrap().unwrap();
        assert_eq!(write.deactivated_others, 1);
        assert_eq!(active_ids(&store).await, vec![b.id]);
    }

    #[tokio::test]
    async fn test_activating_from_no_active_state() {
        let store = MemoryStore::new();
        let a = store.insert_ebook(ebook("a", false)).await.unwrap();
        assert!(!a.none_active);
        let write = store.activate_ebook(a.ebook.id).await.unwrap().unwrap();
        assert_eq!(write.deactivated_others, 0);
        assert_eq!(active_ids(&store).await, vec![a.ebook.id]);
    }

    #[tokio::test]
    async fn test_inserting_active_ebook_deactivates_previous() {
        let store = MemoryStore::new();
        store.insert_ebook(ebook("a", true)).await.unwrap();
        let b = store.insert_ebook(ebook("b", true)).await.unwrap();
        assert_eq!(b.deactivated_others, 1);
        assert_eq!(active_ids(&store).await, vec![b.ebook.id]);
    }

    #[tokio::test]
    async fn test_deactivating_last_active_ebook_flags_none_active() {
        let store = MemoryStore::new();
        let a = store.insert_ebook(ebook("a", true)).await.unwrap().ebook;
        let (changed, none_active) = store.deactivate_ebooks(&[a.id]).await.unwrap();
        assert_eq!(changed, 1);
        assert!(none_active);

        let (changed, none_active) = store.deactivate_ebooks(&[a.id]).await.unwrap();
        assert_eq!(changed, 0);
        assert!(!none_active);
    }

    #[tokio::test]
    async fn test_none_active_only_when_update_switches_off() {
        let store = MemoryStore::new();
        let a = store.insert_ebook(ebook("a", true)).await.unwrap().ebook;

        let switched = store
            .update_ebook(a.id, ebook("a", false))
            .await
            .unwrap()
            .unwrap();
        assert!(switched.none_active);

        let renamed = store
            .update_ebook(a.id, ebook("renamed", false))
            .await
            .unwrap()
            .unwrap();
        assert!(!renamed.none_active);
    }

    #[tokio::test]
    async fn test_concurrent_downloads_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert_ebook(ebook("guide", true)).await.unwrap().ebook.id;

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_download(id).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        let ebook = store.get_ebook(id).await.unwrap().unwrap();
        assert_eq!(ebook.download_count, 50);
    }

    #[tokio::test]
    async fn test_inactive_ebook_download_is_not_counted() {
        let store = MemoryStore::new();
        let id = store.insert_ebook(ebook("old", false)).await.unwrap().ebook.id;
        assert!(store.increment_download(id).await.unwrap().is_none());
        assert!(store.increment_download(9999).await.unwrap().is_none());
        assert_eq!(store.get_ebook(id).await.unwrap().unwrap().download_count, 0);
    }

    #[tokio::test]
    async fn test_reset_download_counts() {
        let store = MemoryStore::new();
        let id = store.insert_ebook(ebook("guide", true)).await.unwrap().ebook.id;
        store.increment_download(id).await.unwrap();
        store.increment_download(id).await.unwrap();
        assert_eq!(store.reset_download_counts(&[id]).await.unwrap(), 1);
        assert_eq!(store.get_ebook(id).await.unwrap().unwrap().download_count, 0);
    }

    #[tokio::test]
    async fn test_contacted_stamp_is_not_refreshed() {
        let store = MemoryStore::new();
        let id = store.insert_contact(contact()).await.unwrap().id;

        assert_eq!(
            store
                .set_contact_status(&[id], ContactStatus::Contacted)
                .await
                .unwrap(),
            1
        );
        let stamped = store.get_contact(id).await.unwrap().unwrap().contacted_at;
        assert!(stamped.is_some());

        assert_eq!(
            store
                .set_contact_status(&[id], ContactStatus::Contacted)
                .await
                .unwrap(),
            0
        );
        let after = store.get_contact(id).await.unwrap().unwrap().contacted_at;
        assert_eq!(stamped, after);
    }

    #[tokio::test]
    async fn test_terminal_contact_status_is_final() {
        let store = MemoryStore::new();
        let id = store.insert_contact(contact()).await.unwrap().id;
        store
            .set_contact_status(&[id], ContactStatus::Booked)
            .await
            .unwrap();
        let changed = store
            .set_contact_status(&[id], ContactStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(changed, 0);
        let stored = store.get_contact(id).await.unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Booked);
        assert!(stored.contacted_at.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_twice_keeps_one_row() {
        let store = MemoryStore::new();
        let new = || NewSubscription {
            email: "reader@example.com".to_string(),
            name: "reader".to_string(),
            source: SubscriptionSource::Footer,
            agreed_to_terms: true,
        };
        assert!(matches!(
            store.subscribe(new()).await.unwrap(),
            SubscribeOutcome::Created(_)
        ));
        assert!(matches!(
            store.subscribe(new()).await.unwrap(),
            SubscribeOutcome::AlreadySubscribed(_)
        ));
        assert_eq!(store.list_subscriptions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_logs_before_cutoff() {
        let store = MemoryStore::new();
        store
            .append_log(NewSystemLog {
                log_level: crate::db::models::LogLevel::Info,
                message: "hello".to_string(),
                source: "test".to_string(),
                user_ip: None,
                user_agent: String::new(),
            })
            .await
            .unwrap();
        let past = Utc::now() - chrono::Duration::days(30);
        assert_eq!(store.purge_logs_before(past).await.unwrap(), 0);
        let future = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.purge_logs_before(future).await.unwrap(), 1);
    }
}
