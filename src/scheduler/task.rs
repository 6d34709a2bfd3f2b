//! Watch task definitions and the per-sweep state transition.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::fetch::PageFetcher;
use crate::matcher::Phrase;

/// Longest interval a task may run on (one year, in seconds).
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Last known result for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlState {
    /// Not checked since the task was (re)created.
    #[default]
    Unknown,
    Absent,
    Present,
}

impl UrlState {
    pub fn from_found(found: bool) -> Self {
        if found {
            UrlState::Present
        } else {
            UrlState::Absent
        }
    }

    pub fn is_present(self) -> bool {
        self == UrlState::Present
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UrlState::Unknown => "not checked yet",
            UrlState::Absent => "not found",
            UrlState::Present => "found",
        };
        f.write_str(label)
    }
}

/// How far a sweep goes once the phrase shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Check every URL.
    #[default]
    Full,
    /// Stop the sweep after the first URL that reports present.
    StopAtFirstPresent,
}

/// Result of checking one URL during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
    pub url: String,
    pub state: UrlState,
    /// Set when the fetch failed; the state is then `Absent`.
    pub error: Option<String>,
    /// Whether this check is an entry into the present state.
    pub notify: bool,
}

/// A set of URLs watched on one schedule for one owner.
#[derive(Debug, Clone)]
pub struct WatchTask {
    id: String,
    urls: Vec<String>,
    interval: Duration,
    states: HashMap<String, UrlState>,
    next_due_at: Instant,
}

impl WatchTask {
    /// Create a task that is due at `now`. Every URL starts `Unknown`.
    /// Intervals above [`MAX_INTERVAL_SECS`] are clamped.
    ///
    /// Returns `None` when `urls` is empty.
    pub fn new(id: &str, urls: Vec<String>, interval: Duration, now: Instant) -> Option<Self> {
        if urls.is_empty() {
            return None;
        }
        let states = urls
            .iter()
            .map(|url| (url.clone(), UrlState::Unknown))
            .collect();
        Some(Self {
            id: id.to_string(),
            urls,
            interval: interval.min(Duration::from_secs(MAX_INTERVAL_SECS)),
            states,
            next_due_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_due_at(&self) -> Instant {
        self.next_due_at
    }

    pub fn state(&self, url: &str) -> UrlState {
        self.states.get(url).copied().unwrap_or_default()
    }

    /// URLs paired with their last known state, in list order.
    pub fn states(&self) -> impl Iterator<Item = (&str, UrlState)> + '_ {
        self.urls.iter().map(|url| (url.as_str(), self.state(url)))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due_at
    }

    /// Anchor the next run to the sweep start, not to when the sweep ended.
    /// An `Instant` that can't represent the sum falls back to the sweep
    /// start, so the task stays due instead of panicking.
    pub(crate) fn reschedule_from(&mut self, sweep_started: Instant) {
        self.next_due_at = sweep_started
            .checked_add(self.interval)
            .unwrap_or(sweep_started);
    }

    /// Record a fresh result and report whether it enters the present state.
    pub fn record(&mut self, url: &str, found: UrlState) -> bool {
        let previous = self.state(url);
        let notify = found.is_present() && !previous.is_present();
        self.states.insert(url.to_string(), found);
        notify
    }

    /// Run one sweep over the URL list in order.
    ///
    /// A failed fetch counts as absent and never stops the sweep.
    pub async fn check(
        &mut self,
        phrase: &Phrase,
        fetcher: &dyn PageFetcher,
        policy: SweepPolicy,
    ) -> Vec<UrlCheck> {
        let mut results = Vec::with_capacity(self.urls.len());
        let urls = self.urls.clone();

        for url in urls {
            let (state, error) = match fetcher.fetch(&url).await {
                Ok(page) => (UrlState::from_found(phrase.found_in(&page)), None),
                Err(e) => {
                    warn!(task = %self.id, url = %url, "fetch failed: {}", e);
                    (UrlState::Absent, Some(e.to_string()))
                }
            };

            let notify = self.record(&url, state);
            debug!(task = %self.id, url = %url, state = %state, notify, "checked");
            results.push(UrlCheck {
                url,
                state,
                error,
                notify,
            });

            if policy == SweepPolicy::StopAtFirstPresent && state.is_present() {
                break;
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::MockPageFetcher;

    fn task(urls: &[&str]) -> WatchTask {
        WatchTask::new(
            "chat-1",
            urls.iter().map(|u| u.to_string()).collect(),
            Duration::from_secs(5),
            Instant::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_task_requires_urls() {
        assert!(WatchTask::new("c", vec![], Duration::from_secs(5), Instant::now()).is_none());
    }

    #[test]
    fn test_new_task_states_unknown_and_due() {
        let now = Instant::now();
        let t = WatchTask::new(
            "c",
            vec!["https://a.test".into(), "https://b.test".into()],
            Duration::from_secs(5),
            now,
        )
        .unwrap();
        assert!(t.is_due(now));
        let states: Vec<_> = t.states().collect();
        assert_eq!(
            states,
            vec![
                ("https://a.test", UrlState::Unknown),
                ("https://b.test", UrlState::Unknown)
            ]
        );
    }

    #[test]
    fn test_record_notifies_once_per_entry_into_present() {
        let mut t = task(&["https://a.test"]);
        let sequence = [
            UrlState::Absent,
            UrlState::Absent,
            UrlState::Present,
            UrlState::Present,
            UrlState::Absent,
            UrlState::Present,
        ];
        let fired: Vec<bool> = sequence
            .iter()
            .map(|s| t.record("https://a.test", *s))
            .collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_unknown_to_present_notifies() {
        let mut t = task(&["https://a.test"]);
        assert!(t.record("https://a.test", UrlState::Present));
    }

    #[test]
    fn test_reschedule_anchored_to_sweep_start() {
        let mut t = task(&["https://a.test"]);
        let start = Instant::now();
        t.reschedule_from(start);
        assert_eq!(t.next_due_at(), start + Duration::from_secs(5));
        assert!(!t.is_due(start + Duration::from_secs(4)));
        assert!(t.is_due(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_huge_interval_is_clamped_and_reschedules() {
        let start = Instant::now();
        let mut t = WatchTask::new("c", vec!["https://a.test".into()], Duration::MAX, start)
            .unwrap();
        let max = Duration::from_secs(MAX_INTERVAL_SECS);
        assert_eq!(t.interval(), max);

        t.reschedule_from(start);
        assert_eq!(t.next_due_at(), start + max);
        assert!(!t.is_due(start + Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_check_failed_fetch_is_absent_and_sweep_continues() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://down.test")
            .times(1)
            .returning(|url| {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 502,
                })
            });
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://up.test")
            .times(1)
            .returning(|_| Ok("Registration: SIGN UP NOW".to_string()));

        let mut t = task(&["https://down.test", "https://up.test"]);
        let phrase = Phrase::new("sign up now");
        let results = t.check(&phrase, &fetcher, SweepPolicy::Full).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].state, UrlState::Absent);
        assert!(results[0].error.as_deref().unwrap().contains("502"));
        assert!(!results[0].notify);
        assert_eq!(results[1].state, UrlState::Present);
        assert!(results[1].notify);
        assert_eq!(t.state("https://down.test"), UrlState::Absent);
        assert_eq!(t.state("https://up.test"), UrlState::Present);
    }

    #[tokio::test]
    async fn test_check_stop_at_first_present() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://a.test")
            .times(1)
            .returning(|_| Ok("phrase here".to_string()));
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://b.test")
            .times(0)
            .returning(|_| Ok(String::new()));

        let mut t = task(&["https://a.test", "https://b.test"]);
        let results = t
            .check(
                &Phrase::new("phrase"),
                &fetcher,
                SweepPolicy::StopAtFirstPresent,
            )
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(t.state("https://b.test"), UrlState::Unknown);
    }

    #[tokio::test]
    async fn test_duplicate_urls_share_state() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok("phrase".to_string()));

        let mut t = task(&["https://a.test", "https://a.test"]);
        let results = t
            .check(&Phrase::new("phrase"), &fetcher, SweepPolicy::Full)
            .await;
        let notified: Vec<bool> = results.iter().map(|r| r.notify).collect();
        assert_eq!(notified, vec![true, false]);
    }

    #[test]
    fn test_url_state_display() {
        assert_eq!(UrlState::Present.to_string(), "found");
        assert_eq!(UrlState::Absent.to_string(), "not found");
        assert_eq!(UrlState::Unknown.to_string(), "not checked yet");
    }
}
