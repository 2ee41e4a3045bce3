use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::core::compare::compare_text;
use crate::core::models::{Classifier, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    None,
    Status,
    Category,
    SecondaryStatus,
    Domain,
    /// Days since the record's last activity.
    UsageFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageFrequency {
    Daily,
    Weekly,
    Monthly,
    Rarely,
}

impl UsageFrequency {
    /// Whole days between `last` and `now`. No activity at all counts as rarely.
    pub fn since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last else {
            return UsageFrequency::Rarely;
        };
        match (now - last).num_days() {
            i64::MIN..=1 => UsageFrequency::Daily,
            2..=7 => UsageFrequency::Weekly,
            8..=30 => UsageFrequency::Monthly,
            _ => UsageFrequency::Rarely,
        }
    }
}

impl Classifier for UsageFrequency {
    fn key(&self) -> &'static str {
        match self {
            UsageFrequency::Daily => "daily",
            UsageFrequency::Weekly => "weekly",
            UsageFrequency::Monthly => "monthly",
            UsageFrequency::Rarely => "rarely",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            UsageFrequency::Daily => "Used daily",
            UsageFrequency::Weekly => "Used weekly",
            UsageFrequency::Monthly => "Used monthly",
            UsageFrequency::Rarely => "Rarely used",
        }
    }
}

/// One group of records plus its summary counts.
#[derive(Debug, Clone)]
pub struct GroupBucket<'a, R> {
    pub key: String,
    pub label: String,
    pub members: Vec<&'a R>,
    pub error_count: usize,
    pub active_count: usize,
}

impl<R> GroupBucket<'_, R> {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

const UNKNOWN_DOMAIN: &str = "unknown";

/// Friendly names for mail hosts users recognise at a glance.
const KNOWN_DOMAINS: &[(&str, &str)] = &[
    ("gmail.com", "Gmail"),
    ("outlook.com", "Outlook"),
    ("hotmail.com", "Hotmail"),
    ("qq.com", "QQ Mail"),
    ("163.com", "NetEase 163"),
    ("126.com", "NetEase 126"),
    ("sina.com", "Sina Mail"),
    ("icloud.com", "iCloud"),
    ("yahoo.com", "Yahoo Mail"),
];

pub fn domain_label(domain: &str) -> String {
    KNOWN_DOMAINS
        .iter()
        .find(|(d, _)| *d == domain)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("@{domain}"))
}

fn classify<R: Record>(record: &R, by: GroupBy, now: DateTime<Utc>) -> (String, String) {
    fn of<C: Classifier>(c: C) -> (String, String) {
        (c.key().to_string(), c.label().to_string())
    }

    match by {
        GroupBy::None => ("all".to_string(), R::COLLECTION_LABEL.to_string()),
        GroupBy::Status => of(record.status()),
        GroupBy::Category => of(record.category()),
        GroupBy::SecondaryStatus => of(record.secondary_status()),
        GroupBy::Domain => match record.domain() {
            Some(domain) => {
                let domain = domain.to_lowercase();
                let label = domain_label(&domain);
                (domain, label)
            }
            None => (UNKNOWN_DOMAIN.to_string(), "Unknown domain".to_string()),
        },
        GroupBy::UsageFrequency => of(UsageFrequency::since(record.last_activity(), now)),
    }
}

/// Error buckets first, then bigger buckets, then by key.
fn bucket_order<R>(a: &GroupBucket<'_, R>, b: &GroupBucket<'_, R>) -> Ordering {
    b.error_count
        .cmp(&a.error_count)
        .then_with(|| b.member_count().cmp(&a.member_count()))
        .then_with(|| a.key.cmp(&b.key))
}

/// Partition `records` into buckets. Every record lands in exactly one bucket.
pub fn group<'a, R: Record>(records: &[&'a R], by: GroupBy) -> Vec<GroupBucket<'a, R>> {
    group_at(records, by, Utc::now())
}

/// `group` with an explicit current time for usage-frequency buckets.
pub fn group_at<'a, R: Record>(
    records: &[&'a R],
    by: GroupBy,
    now: DateTime<Utc>,
) -> Vec<GroupBucket<'a, R>> {
    let mut buckets: IndexMap<String, GroupBucket<'a, R>> = IndexMap::new();

    if by == GroupBy::None {
        buckets.insert(
            "all".to_string(),
            GroupBucket {
                key: "all".to_string(),
                label: R::COLLECTION_LABEL.to_string(),
                members: Vec::with_capacity(records.len()),
                error_count: 0,
                active_count: 0,
            },
        );
    }

    for &record in records {
        let (key, label) = classify(record, by, now);
        let bucket = buckets.entry(key.clone()).or_insert_with(|| GroupBucket {
            key,
            label,
            members: Vec::new(),
            error_count: 0,
            active_count: 0,
        });
        bucket.members.push(record);
        if record.is_error() {
            bucket.error_count += 1;
        }
        if record.is_active() {
            bucket.active_count += 1;
        }
    }

    let mut out: Vec<_> = buckets.into_values().collect();
    for bucket in &mut out {
        bucket
            .members
            .sort_by(|a, b| compare_text(a.primary_text(), b.primary_text()));
    }
    out.sort_by(|a, b| bucket_order(a, b));
    log::debug!("Grouped {} records by {:?} into {} buckets", records.len(), by, out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::{account, accounts, email};
    use crate::core::models::{Account, AccountStatus, Provider};

    #[test]
    fn none_is_one_bucket() {
        let all = accounts(4);
        let refs: Vec<_> = all.iter().collect();
        let buckets = group(&refs, GroupBy::None);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, "all");
        assert_eq!(buckets[0].label, "All accounts");
        assert_eq!(buckets[0].member_count(), 4);
        assert_eq!(buckets[0].active_count, 4);
    }

    #[test]
    fn error_bucket_comes_first() {
        let mut all = accounts(10);
        all[3].status = AccountStatus::Error;
        all[7].status = AccountStatus::Error;
        let refs: Vec<_> = all.iter().collect();

        let buckets = group(&refs, GroupBy::Status);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "error");
        assert_eq!(buckets[0].member_count(), 2);
        assert_eq!(buckets[0].error_count, 2);
        assert_eq!(buckets[1].key, "active");
        assert_eq!(buckets[1].member_count(), 8);
        assert_eq!(buckets[1].active_count, 8);
    }

    #[test]
    fn every_record_in_exactly_one_bucket() {
        let all: Vec<Account> = vec![
            account("1", "a@qq.com", Provider::Imap, AccountStatus::Active),
            account("2", "b@gmail.com", Provider::Gmail, AccountStatus::Error),
            account("3", "c@QQ.com", Provider::Imap, AccountStatus::Disabled),
            account("4", "no-domain", Provider::Unknown, AccountStatus::Unknown),
            account("5", "e@corp.example", Provider::Outlook, AccountStatus::Active),
        ];
        let refs: Vec<_> = all.iter().collect();

        for by in [
            GroupBy::None,
            GroupBy::Status,
            GroupBy::Category,
            GroupBy::SecondaryStatus,
            GroupBy::Domain,
        ] {
            let buckets = group(&refs, by);
            let mut seen: Vec<&str> = buckets
                .iter()
                .flat_map(|b| b.members.iter().map(|a| a.uid.as_str()))
                .collect();
            seen.sort();
            assert_eq!(seen, ["1", "2", "3", "4", "5"], "{by:?}");
        }
    }

    #[test]
    fn domain_buckets_use_friendly_labels() {
        let all = vec![
            account("1", "a@qq.com", Provider::Imap, AccountStatus::Active),
            account("2", "b@QQ.com", Provider::Imap, AccountStatus::Active),
            account("3", "c@corp.example", Provider::Imap, AccountStatus::Active),
            account("4", "nobody", Provider::Imap, AccountStatus::Active),
        ];
        let refs: Vec<_> = all.iter().collect();
        let buckets = group(&refs, GroupBy::Domain);

        assert_eq!(buckets[0].key, "qq.com");
        assert_eq!(buckets[0].label, "QQ Mail");
        assert_eq!(buckets[0].member_count(), 2);
        assert_eq!(buckets[1].key, "corp.example");
        assert_eq!(buckets[1].label, "@corp.example");
        assert_eq!(buckets[2].key, "unknown");
    }

    #[test]
    fn equal_sized_buckets_order_by_key() {
        let all = vec![
            account("1", "a@x.com", Provider::Outlook, AccountStatus::Active),
            account("2", "b@x.com", Provider::Gmail, AccountStatus::Active),
        ];
        let refs: Vec<_> = all.iter().collect();
        let keys: Vec<_> = group(&refs, GroupBy::Category)
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, ["gmail", "outlook"]);
    }

    #[test]
    fn members_sorted_case_insensitively() {
        let all = vec![
            account("1", "zed@x.com", Provider::Gmail, AccountStatus::Active),
            account("2", "Amy@x.com", Provider::Gmail, AccountStatus::Active),
            account("3", "bob@x.com", Provider::Gmail, AccountStatus::Active),
        ];
        let refs: Vec<_> = all.iter().collect();
        let buckets = group(&refs, GroupBy::Category);
        let order: Vec<_> = buckets[0].members.iter().map(|a| a.uid.as_str()).collect();
        assert_eq!(order, ["2", "3", "1"]);
    }

    #[test]
    fn emails_group_by_read_state() {
        let mut read = email(1, "old news", "a@b.com");
        read.is_read = true;
        let all = vec![read, email(2, "fresh", "c@d.com"), email(3, "also fresh", "e@f.com")];
        let refs: Vec<_> = all.iter().collect();
        let buckets = group(&refs, GroupBy::Status);
        assert_eq!(buckets[0].key, "unread");
        assert_eq!(buckets[0].active_count, 2);
        assert_eq!(buckets[1].key, "read");
        assert_eq!(buckets[1].error_count, 0);
    }

    #[test]
    fn usage_frequency_by_days_since_activity() {
        use chrono::{Duration, TimeZone};

        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let ago = |days: i64| Some(now - Duration::days(days) - Duration::hours(2));
        let mut all = accounts(6);
        all[0].last_sync_at = ago(0);
        all[1].last_sync_at = ago(1);
        all[2].last_sync_at = ago(5);
        all[3].last_sync_at = ago(30);
        all[4].last_sync_at = ago(31);
        all[5].last_sync_at = None;
        let refs: Vec<_> = all.iter().collect();

        let buckets = group_at(&refs, GroupBy::UsageFrequency, now);
        let summary: Vec<_> = buckets
            .iter()
            .map(|b| (b.key.as_str(), b.member_count()))
            .collect();
        assert_eq!(
            summary,
            [("daily", 2), ("rarely", 2), ("monthly", 1), ("weekly", 1)]
        );
        assert_eq!(buckets[0].label, "Used daily");
    }
}
