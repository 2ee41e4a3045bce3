use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::heuristic::Density;

/// A classification value records can be filtered and grouped by.
pub trait Classifier: Copy + Eq + Hash + Debug + Send {
    /// Stable key, used as the bucket key.
    fn key(&self) -> &'static str;
    /// Display label for a bucket holding records with this value.
    fn label(&self) -> &'static str;
}

/// The value a record exposes for one sort field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Count(Option<u64>),
    Date(Option<DateTime<Utc>>),
}

/// Read-only view of a domain entity flowing through the engine.
pub trait Record {
    type Id: Clone + Eq + Hash + Debug;
    type Status: Classifier;
    type Category: Classifier;
    type Secondary: Classifier;
    type SortField: Copy + Eq + Debug + Send;

    /// Label of the single bucket produced when grouping is off.
    const COLLECTION_LABEL: &'static str;

    fn id(&self) -> Self::Id;
    fn status(&self) -> Self::Status;
    fn category(&self) -> Self::Category;
    fn secondary_status(&self) -> Self::Secondary;

    /// Address or subject; orders members inside a bucket.
    fn primary_text(&self) -> &str;
    /// Fields the search box matches against.
    fn search_fields(&self) -> Vec<&str>;
    fn sort_key(&self, field: Self::SortField) -> SortKey<'_>;
    fn domain(&self) -> Option<&str>;
    /// Most recent activity, for usage-frequency grouping.
    fn last_activity(&self) -> Option<DateTime<Utc>>;

    fn is_error(&self) -> bool;
    fn is_active(&self) -> bool;
    /// Switched off by the user: a disabled account, an archived email.
    fn is_disabled(&self) -> bool;

    /// Row extent used before the real one has been measured.
    fn estimated_extent(density: Density) -> f64;
}

/// Part after the `@`, if any.
pub fn domain_of(address: &str) -> Option<&str> {
    address
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim())
        .filter(|d| !d.is_empty())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum AccountStatus {
    Active,
    Disabled,
    Error,
    #[default]
    Unknown,
}

impl From<String> for AccountStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => AccountStatus::Active,
            "disabled" => AccountStatus::Disabled,
            "error" => AccountStatus::Error,
            other => {
                log::debug!("Unrecognized account status {:?}", other);
                AccountStatus::Unknown
            }
        }
    }
}

impl From<AccountStatus> for &'static str {
    fn from(s: AccountStatus) -> Self {
        s.key()
    }
}

impl Classifier for AccountStatus {
    fn key(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disabled => "disabled",
            AccountStatus::Error => "error",
            AccountStatus::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active accounts",
            AccountStatus::Disabled => "Disabled accounts",
            AccountStatus::Error => "Accounts with errors",
            AccountStatus::Unknown => "Unknown status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Provider {
    Gmail,
    Outlook,
    Imap,
    Pop3,
    #[default]
    Unknown,
}

impl From<String> for Provider {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Provider::Gmail,
            "outlook" => Provider::Outlook,
            "imap" => Provider::Imap,
            "pop3" => Provider::Pop3,
            other => {
                log::debug!("Unrecognized provider {:?}", other);
                Provider::Unknown
            }
        }
    }
}

impl From<Provider> for &'static str {
    fn from(p: Provider) -> Self {
        p.key()
    }
}

impl Classifier for Provider {
    fn key(&self) -> &'static str {
        match self {
            Provider::Gmail => "gmail",
            Provider::Outlook => "outlook",
            Provider::Imap => "imap",
            Provider::Pop3 => "pop3",
            Provider::Unknown => "unknown",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Provider::Gmail => "Gmail",
            Provider::Outlook => "Outlook",
            Provider::Imap => "IMAP",
            Provider::Pop3 => "POP3",
            Provider::Unknown => "Other providers",
        }
    }
}

/// Outcome of the most recent sync, derived from `last_sync_at` and
/// `last_sync_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
    Running,
    Never,
}

impl Classifier for SyncStatus {
    fn key(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Running => "running",
            SyncStatus::Never => "never",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SyncStatus::Success => "Synced",
            SyncStatus::Failed => "Sync failed",
            SyncStatus::Running => "Syncing",
            SyncStatus::Never => "Never synced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSortField {
    Email,
    Provider,
    Status,
    UnreadCount,
    LastSyncAt,
}

/// A mailbox account as served by the dashboard API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sync_status: Option<String>,
    #[serde(default)]
    pub last_sync_error: Option<String>,
    #[serde(default)]
    pub total_emails: Option<u64>,
    #[serde(default)]
    pub unread_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn sync_status(&self) -> SyncStatus {
        if self.last_sync_at.is_none() {
            return SyncStatus::Never;
        }
        match self.last_sync_status.as_deref() {
            Some("running") => SyncStatus::Running,
            Some("success") => SyncStatus::Success,
            Some("failed") => SyncStatus::Failed,
            _ => SyncStatus::Never,
        }
    }
}

impl Record for Account {
    type Id = String;
    type Status = AccountStatus;
    type Category = Provider;
    type Secondary = SyncStatus;
    type SortField = AccountSortField;

    const COLLECTION_LABEL: &'static str = "All accounts";

    fn id(&self) -> String {
        self.uid.clone()
    }

    fn status(&self) -> AccountStatus {
        self.status
    }

    fn category(&self) -> Provider {
        self.provider
    }

    fn secondary_status(&self) -> SyncStatus {
        self.sync_status()
    }

    fn primary_text(&self) -> &str {
        &self.email
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.provider.key()];
        if let Some(domain) = self.domain() {
            fields.push(domain);
        }
        fields
    }

    fn sort_key(&self, field: AccountSortField) -> SortKey<'_> {
        match field {
            AccountSortField::Email => SortKey::Text(&self.email),
            AccountSortField::Provider => SortKey::Text(self.provider.key()),
            AccountSortField::Status => SortKey::Text(self.status.key()),
            AccountSortField::UnreadCount => SortKey::Count(self.unread_count),
            AccountSortField::LastSyncAt => SortKey::Date(self.last_sync_at),
        }
    }

    fn domain(&self) -> Option<&str> {
        domain_of(&self.email)
    }

    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    fn is_error(&self) -> bool {
        self.status == AccountStatus::Error
    }

    fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    fn is_disabled(&self) -> bool {
        self.status == AccountStatus::Disabled
    }

    fn estimated_extent(density: Density) -> f64 {
        // card height + 12px margin
        match density {
            Density::Detailed => 192.0,
            Density::Compact => 112.0,
            Density::Minimal => 72.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Emails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadState {
    Unread,
    Read,
}

impl Classifier for ReadState {
    fn key(&self) -> &'static str {
        match self {
            ReadState::Unread => "unread",
            ReadState::Read => "read",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ReadState::Unread => "Unread",
            ReadState::Read => "Read",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Inbox,
    Starred,
    Archived,
}

impl Classifier for EmailCategory {
    fn key(&self) -> &'static str {
        match self {
            EmailCategory::Inbox => "inbox",
            EmailCategory::Starred => "starred",
            EmailCategory::Archived => "archived",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            EmailCategory::Inbox => "Inbox",
            EmailCategory::Starred => "Starred",
            EmailCategory::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentState {
    WithAttachments,
    NoAttachments,
}

impl Classifier for AttachmentState {
    fn key(&self) -> &'static str {
        match self {
            AttachmentState::WithAttachments => "with_attachments",
            AttachmentState::NoAttachments => "no_attachments",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AttachmentState::WithAttachments => "With attachments",
            AttachmentState::NoAttachments => "Without attachments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSortField {
    SentAt,
    Subject,
    Sender,
    Size,
}

/// Summary of a message for the list view (no body).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: u64,
    #[serde(default)]
    pub account_uid: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl Record for Email {
    type Id = u64;
    type Status = ReadState;
    type Category = EmailCategory;
    type Secondary = AttachmentState;
    type SortField = EmailSortField;

    const COLLECTION_LABEL: &'static str = "All messages";

    fn id(&self) -> u64 {
        self.id
    }

    fn status(&self) -> ReadState {
        if self.is_read {
            ReadState::Read
        } else {
            ReadState::Unread
        }
    }

    fn category(&self) -> EmailCategory {
        if self.is_archived {
            EmailCategory::Archived
        } else if self.is_starred {
            EmailCategory::Starred
        } else {
            EmailCategory::Inbox
        }
    }

    fn secondary_status(&self) -> AttachmentState {
        if self.has_attachments {
            AttachmentState::WithAttachments
        } else {
            AttachmentState::NoAttachments
        }
    }

    fn primary_text(&self) -> &str {
        &self.subject
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.subject.as_str(), self.from_address.as_str()];
        if let Some(name) = self.from_name.as_deref() {
            fields.push(name);
        }
        if let Some(domain) = self.domain() {
            fields.push(domain);
        }
        fields
    }

    fn sort_key(&self, field: EmailSortField) -> SortKey<'_> {
        match field {
            EmailSortField::SentAt => SortKey::Date(self.sent_at),
            EmailSortField::Subject => SortKey::Text(&self.subject),
            EmailSortField::Sender => {
                SortKey::Text(self.from_name.as_deref().unwrap_or(&self.from_address))
            }
            EmailSortField::Size => SortKey::Count(self.size_bytes),
        }
    }

    fn domain(&self) -> Option<&str> {
        domain_of(&self.from_address)
    }

    fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    fn is_error(&self) -> bool {
        false
    }

    fn is_active(&self) -> bool {
        !self.is_read
    }

    fn is_disabled(&self) -> bool {
        self.is_archived
    }

    fn estimated_extent(density: Density) -> f64 {
        match density {
            Density::Detailed => 80.0,
            Density::Compact => 64.0,
            Density::Minimal => 48.0,
        }
    }
}
