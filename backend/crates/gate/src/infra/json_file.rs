//! JSON File Repository Implementation
//!
//! Keeps the ledger in three JSON documents inside one directory:
//!
//! - `history.json`: `{"users": {id: {"checks": {day: n}}}}`
//! - `ip.json`: `{"ips": {ip: {day: n}}}`
//! - `captcha.json`: `{"captchas": {id: {"answer": "7", "timestamp": ms}}}`
//!
//! State lives in memory behind one async mutex; each mutation rewrites the
//! affected document through a temp file and a rename. A mutation whose write
//! fails is rolled back, so memory never runs ahead of disk.

use crate::domain::entities::{Challenge, LedgerStats};
use crate::domain::repository::{ChallengeRepository, CounterRepository};
use crate::domain::value_objects::{Identity, QuotaKind, UserId};
use crate::error::GateResult;
use chrono::{DateTime, Utc};
use platform::rate_limit::DayKey;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const HISTORY_FILE: &str = "history.json";
const IP_FILE: &str = "ip.json";
const CAPTCHA_FILE: &str = "captcha.json";

type DayCounts = BTreeMap<String, u32>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryDocument {
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserRecord {
    #[serde(default)]
    checks: Option<DayCounts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IpDocument {
    #[serde(default)]
    ips: BTreeMap<String, Option<DayCounts>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CaptchaDocument {
    #[serde(default)]
    captchas: BTreeMap<String, CaptchaRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CaptchaRecord {
    answer: String,
    /// Milliseconds since the Unix epoch
    timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
enum Document {
    History,
    Ip,
    Captcha,
}

impl Document {
    fn file_name(self) -> &'static str {
        match self {
            Document::History => HISTORY_FILE,
            Document::Ip => IP_FILE,
            Document::Captcha => CAPTCHA_FILE,
        }
    }

    fn for_kind(kind: QuotaKind) -> Self {
        match kind {
            QuotaKind::User => Document::History,
            QuotaKind::Ip => Document::Ip,
        }
    }
}

/// Copy of one document taken before a mutation
enum Snapshot {
    History(HistoryDocument),
    Ip(IpDocument),
    Captcha(CaptchaDocument),
}

#[derive(Debug, Default)]
struct LedgerState {
    history: HistoryDocument,
    ips: IpDocument,
    captchas: CaptchaDocument,
}

impl LedgerState {
    fn snapshot(&self, document: Document) -> Snapshot {
        match document {
            Document::History => Snapshot::History(self.history.clone()),
            Document::Ip => Snapshot::Ip(self.ips.clone()),
            Document::Captcha => Snapshot::Captcha(self.captchas.clone()),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        match snapshot {
            Snapshot::History(history) => self.history = history,
            Snapshot::Ip(ips) => self.ips = ips,
            Snapshot::Captcha(captchas) => self.captchas = captchas,
        }
    }

    /// Day map of an identity, created when absent and healed when malformed
    fn day_counts_mut(&mut self, identity: &Identity) -> &mut DayCounts {
        let slot = match identity {
            Identity::User(user) => {
                &mut self
                    .history
                    .users
                    .entry(user.as_str().to_owned())
                    .or_insert_with(|| UserRecord {
                        checks: Some(DayCounts::new()),
                    })
                    .checks
            }
            Identity::Ip(ip) => self
                .ips
                .ips
                .entry(ip.as_str().to_owned())
                .or_insert_with(|| Some(DayCounts::new())),
        };

        if slot.is_none() {
            tracing::warn!(identity = %identity, "Ledger entry had no day map, reinitializing");
        }
        slot.get_or_insert_with(DayCounts::new)
    }

    fn count(&self, identity: &Identity, day: &DayKey) -> u32 {
        let counts = match identity {
            Identity::User(user) => self
                .history
                .users
                .get(user.as_str())
                .and_then(|record| record.checks.as_ref()),
            Identity::Ip(ip) => self.ips.ips.get(ip.as_str()).and_then(Option::as_ref),
        };

        counts
            .and_then(|counts| counts.get(day.as_str()))
            .copied()
            .unwrap_or(0)
    }

    fn slots(&self, kind: QuotaKind) -> Vec<Option<&DayCounts>> {
        match kind {
            QuotaKind::User => self
                .history
                .users
                .values()
                .map(|record| record.checks.as_ref())
                .collect(),
            QuotaKind::Ip => self.ips.ips.values().map(Option::as_ref).collect(),
        }
    }

    fn slots_mut(&mut self, kind: QuotaKind) -> Vec<&mut DayCounts> {
        match kind {
            QuotaKind::User => self
                .history
                .users
                .values_mut()
                .filter_map(|record| record.checks.as_mut())
                .collect(),
            QuotaKind::Ip => self.ips.ips.values_mut().filter_map(Option::as_mut).collect(),
        }
    }

    fn encode(&self, document: Document) -> GateResult<Vec<u8>> {
        let bytes = match document {
            Document::History => serde_json::to_vec_pretty(&self.history)?,
            Document::Ip => serde_json::to_vec_pretty(&self.ips)?,
            Document::Captcha => serde_json::to_vec_pretty(&self.captchas)?,
        };
        Ok(bytes)
    }
}

struct Inner {
    dir: Option<PathBuf>,
    state: Mutex<LedgerState>,
}

/// JSON-file-backed repository
#[derive(Clone)]
pub struct JsonFileGateRepository {
    inner: Arc<Inner>,
}

impl JsonFileGateRepository {
    /// Open (or create) the ledger in `dir`
    ///
    /// Missing files start empty. Unreadable or undecodable files are an error.
    pub async fn open(dir: impl Into<PathBuf>) -> GateResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let state = LedgerState {
            history: read_document(&dir.join(HISTORY_FILE)).await?,
            ips: read_document(&dir.join(IP_FILE)).await?,
            captchas: read_document(&dir.join(CAPTCHA_FILE)).await?,
        };

        tracing::info!(
            dir = %dir.display(),
            users = state.history.users.len(),
            ips = state.ips.ips.len(),
            challenges = state.captchas.captchas.len(),
            "Opened JSON ledger"
        );

        let repo = Self {
            inner: Arc::new(Inner {
                dir: Some(dir),
                state: Mutex::new(state),
            }),
        };

        {
            let state = repo.inner.state.lock().await;
            for document in [Document::History, Document::Ip, Document::Captcha] {
                repo.persist(&state, document).await?;
            }
        }

        Ok(repo)
    }

    /// Ledger that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                dir: None,
                state: Mutex::new(LedgerState::default()),
            }),
        }
    }

    /// Delete challenges older than the TTL
    pub async fn purge_expired(&self, challenge_ttl_ms: i64) -> GateResult<u64> {
        let now = Utc::now();

        let purged = self
            .mutate(Document::Captcha, |state| {
                let before = state.captchas.captchas.len();
                state.captchas.captchas.retain(|user_id, record| {
                    record
                        .to_challenge(user_id)
                        .is_some_and(|c| !c.is_expired_at(now, challenge_ttl_ms))
                });
                let purged = (before - state.captchas.captchas.len()) as u64;
                (purged, purged > 0)
            })
            .await?;

        tracing::info!(challenges = purged, "Cleaned up expired challenges");

        Ok(purged)
    }

    /// Apply `change` under the lock and write `document` if it reports a change
    ///
    /// `change` returns its result and whether anything was modified. When the
    /// write fails the document is restored to its state before `change`.
    async fn mutate<T, F>(&self, document: Document, change: F) -> GateResult<T>
    where
        F: FnOnce(&mut LedgerState) -> (T, bool),
    {
        let mut state = self.inner.state.lock().await;

        let snapshot = self.inner.dir.is_some().then(|| state.snapshot(document));
        let (value, changed) = change(&mut *state);
        if !changed {
            return Ok(value);
        }

        if let Err(e) = self.persist(&state, document).await {
            if let Some(snapshot) = snapshot {
                state.restore(snapshot);
            }
            return Err(e);
        }

        Ok(value)
    }

    /// Write one document; the caller holds the state lock
    async fn persist(&self, state: &LedgerState, document: Document) -> GateResult<()> {
        let Some(dir) = self.inner.dir.as_ref() else {
            return Ok(());
        };

        let path = dir.join(document.file_name());
        let temp_path = path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, state.encode(document)?).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        Ok(())
    }
}

impl CaptchaRecord {
    fn to_challenge(&self, user_id: &str) -> Option<Challenge> {
        let user_id = UserId::new(user_id).ok()?;
        let issued_at = DateTime::<Utc>::from_timestamp_millis(self.timestamp).unwrap_or_default();
        Some(Challenge::new(user_id, self.answer.clone(), issued_at))
    }
}

async fn read_document<T>(path: &Path) -> GateResult<T>
where
    T: DeserializeOwned + Default,
{
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if raw.trim().is_empty() {
        return Ok(T::default());
    }

    Ok(serde_json::from_str(&raw)?)
}

impl CounterRepository for JsonFileGateRepository {
    async fn get_or_init(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        self.mutate(Document::for_kind(identity.kind()), |state| {
            let counts = state.day_counts_mut(identity);
            if let Some(&count) = counts.get(day.as_str()) {
                return (count, false);
            }
            counts.insert(day.as_str().to_owned(), 0);
            (0, true)
        })
        .await
    }

    async fn count(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        let state = self.inner.state.lock().await;
        Ok(state.count(identity, day))
    }

    async fn increment(&self, identity: &Identity, day: &DayKey) -> GateResult<u32> {
        self.mutate(Document::for_kind(identity.kind()), |state| {
            let count = state
                .day_counts_mut(identity)
                .entry(day.as_str().to_owned())
                .or_insert(0);
            *count = count.saturating_add(1);
            (*count, true)
        })
        .await
    }

    async fn reset(&self, identity: &Identity, day: &DayKey) -> GateResult<bool> {
        self.mutate(Document::for_kind(identity.kind()), |state| {
            if state.count(identity, day) == 0 {
                return (false, false);
            }
            state
                .day_counts_mut(identity)
                .insert(day.as_str().to_owned(), 0);
            (true, true)
        })
        .await
    }

    async fn reset_all(&self, kind: QuotaKind, day: &DayKey) -> GateResult<u64> {
        self.mutate(Document::for_kind(kind), |state| {
            let mut reset = 0;
            for counts in state.slots_mut(kind) {
                if let Some(count) = counts.get_mut(day.as_str()) {
                    if *count > 0 {
                        *count = 0;
                        reset += 1;
                    }
                }
            }
            (reset, reset > 0)
        })
        .await
    }

    async fn stats(&self, kind: QuotaKind, day: &DayKey) -> GateResult<LedgerStats> {
        let state = self.inner.state.lock().await;

        let slots = state.slots(kind);
        let mut stats = LedgerStats {
            identities: slots.len() as u64,
            ..Default::default()
        };
        for counts in slots.into_iter().flatten() {
            stats.total_checks += counts.values().map(|&n| u64::from(n)).sum::<u64>();
            stats.today_checks += counts.get(day.as_str()).map_or(0, |&n| u64::from(n));
        }

        Ok(stats)
    }
}

impl ChallengeRepository for JsonFileGateRepository {
    async fn put(&self, challenge: &Challenge) -> GateResult<()> {
        self.mutate(Document::Captcha, |state| {
            state.captchas.captchas.insert(
                challenge.user_id.as_str().to_owned(),
                CaptchaRecord {
                    answer: challenge.expected_answer.clone(),
                    timestamp: challenge.issued_at.timestamp_millis(),
                },
            );
            ((), true)
        })
        .await
    }

    async fn get(&self, user_id: &UserId) -> GateResult<Option<Challenge>> {
        let state = self.inner.state.lock().await;

        Ok(state
            .captchas
            .captchas
            .get(user_id.as_str())
            .and_then(|record| record.to_challenge(user_id.as_str())))
    }

    async fn delete(&self, user_id: &UserId) -> GateResult<()> {
        self.mutate(Document::Captcha, |state| {
            let removed = state.captchas.captchas.remove(user_id.as_str()).is_some();
            ((), removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::IpIdentity;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    fn user(id: &str) -> Identity {
        Identity::User(UserId::new(id).unwrap())
    }

    #[tokio::test]
    async fn test_get_or_init_creates_zero_entry() {
        let repo = JsonFileGateRepository::in_memory();
        let id = user("42");

        assert_eq!(repo.get_or_init(&id, &day("2025-01-01")).await.unwrap(), 0);
        assert_eq!(repo.increment(&id, &day("2025-01-01")).await.unwrap(), 1);
        assert_eq!(repo.get_or_init(&id, &day("2025-01-01")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_absent_is_noop() {
        let repo = JsonFileGateRepository::in_memory();
        let id = Identity::Ip(IpIdentity::new("10.0.0.1"));

        assert!(!repo.reset(&id, &day("2025-01-01")).await.unwrap());
        assert_eq!(repo.count(&id, &day("2025-01-01")).await.unwrap(), 0);
        assert_eq!(
            repo.stats(QuotaKind::Ip, &day("2025-01-01")).await.unwrap(),
            LedgerStats::default()
        );
    }

    #[tokio::test]
    async fn test_writes_bot_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileGateRepository::open(dir.path()).await.unwrap();

        repo.increment(&user("7"), &day("2025-03-04")).await.unwrap();
        repo.increment(&Identity::Ip(IpIdentity::new("1.2.3.4")), &day("2025-03-04"))
            .await
            .unwrap();

        let history: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(HISTORY_FILE)).unwrap()).unwrap();
        assert_eq!(history["users"]["7"]["checks"]["2025-03-04"], 1);

        let ips: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(IP_FILE)).unwrap()).unwrap();
        assert_eq!(ips["ips"]["1.2.3.4"]["2025-03-04"], 1);

        assert!(dir.path().join(CAPTCHA_FILE).exists());
        assert!(!dir.path().join("history.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(HISTORY_FILE), "{not json").unwrap();

        let result = JsonFileGateRepository::open(dir.path()).await;
        assert!(result.is_err_and(|e| e.is_storage_unavailable()));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileGateRepository::open(dir.path()).await.unwrap();
        let id = user("9");
        let today = day("2025-05-06");

        repo.increment(&id, &today).await.unwrap();

        // A directory in place of the temp file makes every write fail
        std::fs::create_dir(dir.path().join("history.json.tmp")).unwrap();
        std::fs::create_dir(dir.path().join("captcha.json.tmp")).unwrap();

        assert!(repo.increment(&id, &today).await.is_err());
        assert_eq!(repo.count(&id, &today).await.unwrap(), 1);

        assert!(repo.reset(&id, &today).await.is_err());
        assert_eq!(repo.count(&id, &today).await.unwrap(), 1);

        let fresh = user("10");
        assert!(repo.get_or_init(&fresh, &today).await.is_err());
        assert_eq!(
            repo.stats(QuotaKind::User, &today).await.unwrap().identities,
            1
        );

        let challenge = Challenge::new(UserId::new("9").unwrap(), "7", Utc::now());
        assert!(repo.put(&challenge).await.is_err());
        assert!(repo.get(&challenge.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_challenge() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileGateRepository::open(dir.path()).await.unwrap();
        let challenge = Challenge::new(UserId::new("3").unwrap(), "12", Utc::now());
        repo.put(&challenge).await.unwrap();

        std::fs::create_dir(dir.path().join("captcha.json.tmp")).unwrap();

        assert!(repo.delete(&challenge.user_id).await.is_err());
        assert!(repo.get(&challenge.user_id).await.unwrap().is_some());

        let on_disk: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(CAPTCHA_FILE)).unwrap()).unwrap();
        assert_eq!(on_disk["captchas"]["3"]["answer"], "12");
    }

    #[tokio::test]
    async fn test_reset_reports_change() {
        let repo = JsonFileGateRepository::in_memory();
        let id = user("4");
        let today = day("2025-01-01");

        repo.increment(&id, &today).await.unwrap();

        assert!(repo.reset(&id, &today).await.unwrap());
        assert!(!repo.reset(&id, &today).await.unwrap());
    }
}
