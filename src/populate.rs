use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::CacheLayer;
use crate::config::PopulateConfig;
use crate::domain::{ALL_ORGANISMS, Organism};
use crate::error::BiogeneError;
use crate::eutils::{FetchClient, SearchClient};
use crate::parser::fetch_gene_record;
use crate::strategy::{self, SearchMode};

pub const DEFAULT_RETSTART: usize = 0;
pub const DEFAULT_FETCH: usize = 50;
pub const DEFAULT_TOTAL: i64 = -1;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulateState {
    Idle,
    Fetching,
    Retrying,
    Caching,
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulateSettings {
    pub organism: Organism,
    pub retstart: usize,
    pub fetch: usize,
    // Negative walks everything the server reports.
    pub total: i64,
    pub delay: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl PopulateSettings {
    pub fn new(organism: Organism) -> Self {
        Self {
            organism,
            retstart: DEFAULT_RETSTART,
            fetch: DEFAULT_FETCH,
            total: DEFAULT_TOTAL,
            delay: DEFAULT_DELAY,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn from_config(organism: Organism, config: &PopulateConfig) -> Self {
        let retstart = usize::try_from(config.retstart).unwrap_or(DEFAULT_RETSTART);
        let fetch = usize::try_from(config.fetch)
            .ok()
            .filter(|fetch| *fetch > 0)
            .unwrap_or(DEFAULT_FETCH);
        let total = if config.total == 0 {
            DEFAULT_TOTAL
        } else {
            config.total
        };
        let delay = u64::try_from(config.delay_ms)
            .ok()
            .filter(|delay| *delay > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DELAY);
        let retries = if config.retries == 0 {
            DEFAULT_RETRIES
        } else {
            config.retries
        };
        Self {
            organism,
            retstart,
            fetch,
            total,
            delay,
            retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulateReport {
    pub organism: String,
    pub state: PopulateState,
    pub processed: usize,
    pub cached: usize,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
struct TaskControl {
    stopped: Mutex<bool>,
    wake: Condvar,
    state: Mutex<PopulateState>,
}

impl Default for TaskControl {
    fn default() -> Self {
        Self {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
            state: Mutex::new(PopulateState::Idle),
        }
    }
}

impl TaskControl {
    fn state(&self) -> PopulateState {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: PopulateState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    fn stop(&self) {
        let mut stopped = self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stopped = true;
        self.wake.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // false when stopped
    fn sleep_until(&self, deadline: Instant) -> bool {
        let mut stopped = self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            if *stopped {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            stopped = match self.wake.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

pub struct PopulateHandle {
    control: Arc<TaskControl>,
    thread: JoinHandle<PopulateReport>,
}

impl PopulateHandle {
    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn state(&self) -> PopulateState {
        self.control.state()
    }

    pub fn join(self) -> Result<PopulateReport, BiogeneError> {
        self.thread
            .join()
            .map_err(|_| BiogeneError::Task("populate thread panicked".to_string()))
    }
}

pub struct PopulateTask<S: SearchClient, F: FetchClient> {
    settings: PopulateSettings,
    search: S,
    fetch: F,
    cache: Arc<CacheLayer>,
    control: Arc<TaskControl>,
}

impl<S: SearchClient, F: FetchClient> PopulateTask<S, F> {
    pub fn new(settings: PopulateSettings, search: S, fetch: F, cache: Arc<CacheLayer>) -> Self {
        Self {
            settings,
            search,
            fetch,
            cache,
            control: Arc::new(TaskControl::default()),
        }
    }

    pub fn run(&self) -> PopulateReport {
        let settings = &self.settings;
        let organism = settings.organism.to_string();
        let started_at = Utc::now();
        let template = strategy::strategy(SearchMode::AllIds).unscoped();

        if settings.organism.is_all() {
            warn!("refusing to populate the cache for all organisms");
            self.control.set_state(PopulateState::Aborted);
            return PopulateReport {
                organism,
                state: PopulateState::Aborted,
                processed: 0,
                cached: 0,
                error: Some(BiogeneError::InvalidOrganism(ALL_ORGANISMS.to_string()).to_string()),
                started_at,
                finished_at: Utc::now(),
            };
        }

        let mut target = usize::try_from(settings.total).ok();
        let mut page_size = settings.fetch;
        if let Some(target) = target {
            page_size = page_size.min(target);
        }
        let mut target_checked = false;
        let mut processed = 0usize;
        let mut cached = 0usize;
        let mut failures = 0u32;
        let mut wait = Duration::ZERO;
        let mut last_request: Option<Instant> = None;
        let mut error = None;

        info!(
            %organism,
            retstart = settings.retstart,
            fetch = page_size,
            total = settings.total,
            "populate task started"
        );

        let state = loop {
            if target.is_some_and(|target| processed >= target) || page_size == 0 {
                break PopulateState::Done;
            }
            if let Some(last) = last_request {
                if Instant::now() < last + wait {
                    debug!(%organism, "sleeping");
                }
                if !self.control.sleep_until(last + wait) {
                    info!(%organism, processed, "populate task stopped");
                    break PopulateState::Aborted;
                }
            } else if self.control.is_stopped() {
                break PopulateState::Aborted;
            }

            self.control.set_state(PopulateState::Fetching);
            last_request = Some(Instant::now());
            let offset = settings.retstart + processed;
            debug!(%organism, offset, page_size, "requesting id page");
            let page = match self
                .search
                .search(&template, &settings.organism, offset, page_size)
            {
                Ok(page) => page,
                Err(err) => {
                    failures += 1;
                    if failures >= settings.retries {
                        let exhausted = BiogeneError::RetriesExhausted {
                            attempts: failures,
                            offset,
                        };
                        warn!(%organism, error = %err, processed, "{}", exhausted);
                        error = Some(exhausted.to_string());
                        break PopulateState::Aborted;
                    }
                    info!(
                        %organism,
                        error = %err,
                        attempt = failures,
                        retry_in = ?settings.retry_delay,
                        "id page request failed, retrying"
                    );
                    self.control.set_state(PopulateState::Retrying);
                    wait = settings.retry_delay;
                    continue;
                }
            };
            failures = 0;
            wait = settings.delay;

            if page.ids.is_empty() {
                info!(%organism, processed, "no more ids");
                break PopulateState::Done;
            }

            self.control.set_state(PopulateState::Caching);
            for id in &page.ids {
                if self.cache.contains_record(id) {
                    continue;
                }
                match fetch_gene_record(&self.fetch, id) {
                    Some(record) => {
                        self.cache.put_record(record);
                        cached += 1;
                    }
                    None => debug!(%organism, id, "skipping unparseable gene"),
                }
            }

            if !target_checked {
                target = Some(match target {
                    Some(requested) if requested > page.total => {
                        info!(
                            %organism,
                            available = page.total,
                            requested,
                            "fewer ids available than requested, adjusting"
                        );
                        page.total
                    }
                    Some(requested) => requested,
                    None => page.total,
                });
                target_checked = true;
            }

            processed += page.ids.len();
            info!(%organism, processed, cached, "page processed");

            if let Some(target) = target {
                page_size = page_size.min(target.saturating_sub(processed));
            }
        };

        self.control.set_state(state);
        info!(%organism, ?state, processed, cached, "populate task finished");
        PopulateReport {
            organism,
            state,
            processed,
            cached,
            error,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl<S, F> PopulateTask<S, F>
where
    S: SearchClient + 'static,
    F: FetchClient + 'static,
{
    pub fn spawn(self) -> Result<PopulateHandle, BiogeneError> {
        let control = Arc::clone(&self.control);
        let thread = thread::Builder::new()
            .name(format!("populate-{}", self.settings.organism.normalized()))
            .spawn(move || self.run())
            .map_err(|err| BiogeneError::Task(err.to_string()))?;
        Ok(PopulateHandle { control, thread })
    }
}
