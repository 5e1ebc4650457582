//! Incremental list loading with observable load states.
//!
//! A [`Pager`] owns the pages loaded so far for the current query and
//! publishes a [`PagerSnapshot`] after every change. Submitting a new query
//! restarts at offset 0; loads still in flight for the previous query are
//! aborted and their results discarded.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use transitsync_fetch::{Page, PageError, PagedFetcher, PagingState, QueryParams};

/// Builds the paginator for a submitted query.
pub type FetcherFactory<T> = dyn Fn(QueryParams) -> PagedFetcher<T> + Send + Sync;

/// Observer called with every load failure.
pub type ErrorHook = dyn Fn(&PageError) + Send + Sync;

// ============================================================================
// Load States
// ============================================================================

/// State of one load direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// A load is in flight.
    Loading,
    /// Idle.
    Loaded {
        /// True when there is nothing more to load in this direction.
        end_of_data: bool,
    },
    /// The last load failed.
    Error(PageError),
}

impl LoadState {
    const IDLE: Self = Self::Loaded { end_of_data: false };
    const DONE: Self = Self::Loaded { end_of_data: true };

    /// Returns true while loading.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the failure, if any.
    pub fn error(&self) -> Option<&PageError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true when the end of data was reached.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::Loaded { end_of_data: true })
    }
}

/// What consumers of a [`Pager`] observe.
#[derive(Debug, Clone, PartialEq)]
pub struct PagerSnapshot<T> {
    /// Every loaded item in list order.
    pub items: Vec<T>,
    /// State of the initial load or a refresh.
    pub refresh: LoadState,
    /// State of loading before the first page.
    pub prepend: LoadState,
    /// State of loading after the last page.
    pub append: LoadState,
}

impl<T> PagerSnapshot<T> {
    fn idle() -> Self {
        Self {
            items: Vec::new(),
            refresh: LoadState::IDLE,
            prepend: LoadState::IDLE,
            append: LoadState::IDLE,
        }
    }

    /// Returns the first failure among refresh, prepend and append.
    pub fn error(&self) -> Option<&PageError> {
        self.refresh
            .error()
            .or_else(|| self.prepend.error())
            .or_else(|| self.append.error())
    }

    /// Returns true while any load is in flight.
    pub fn is_loading(&self) -> bool {
        self.refresh.is_loading() || self.prepend.is_loading() || self.append.is_loading()
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Refresh,
    Prepend,
    Append,
}

struct PagerState<T> {
    generation: u64,
    fetcher: Option<PagedFetcher<T>>,
    pages: Vec<Page<T>>,
    anchor: Option<usize>,
    refresh_key: Option<u32>,
    refresh: LoadState,
    prepend: LoadState,
    append: LoadState,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Clone> PagerState<T> {
    fn snapshot(&self) -> PagerSnapshot<T> {
        PagerSnapshot {
            items: self.pages.iter().flat_map(|p| p.data.iter().cloned()).collect(),
            refresh: self.refresh.clone(),
            prepend: self.prepend.clone(),
            append: self.append.clone(),
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut LoadState {
        match direction {
            Direction::Refresh => &mut self.refresh,
            Direction::Prepend => &mut self.prepend,
            Direction::Append => &mut self.append,
        }
    }

    fn restart(&mut self) {
        self.generation += 1;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // Aborted loads never complete; release their slots.
        for slot in [&mut self.prepend, &mut self.append] {
            if slot.is_loading() {
                *slot = LoadState::IDLE;
            }
        }
    }
}

struct Shared<T> {
    factory: Box<FetcherFactory<T>>,
    state: Mutex<PagerState<T>>,
    snapshot: watch::Sender<PagerSnapshot<T>>,
    on_error: Option<Box<ErrorHook>>,
}

impl<T: Clone + Send + Sync + 'static> Shared<T> {
    fn lock(&self) -> std::sync::MutexGuard<'_, PagerState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(self: &Arc<Self>, state: &mut PagerState<T>, direction: Direction, key: Option<u32>) {
        let Some(fetcher) = state.fetcher.clone() else {
            return;
        };

        *state.slot(direction) = LoadState::Loading;
        if direction == Direction::Refresh {
            state.refresh_key = key;
        }
        self.snapshot.send_replace(state.snapshot());

        let generation = state.generation;
        let shared = Arc::clone(self);
        state.tasks.retain(|t| !t.is_finished());
        state.tasks.push(tokio::spawn(async move {
            let result = fetcher.load(key).await;
            shared.complete(generation, direction, result);
        }));
    }

    fn complete(&self, generation: u64, direction: Direction, result: Result<Page<T>, PageError>) {
        let failure = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(?direction, "Discarding stale page");
                return;
            }

            let failure = match result {
                Ok(page) => {
                    apply_page(&mut state, direction, page);
                    None
                }
                Err(err) => {
                    if direction == Direction::Refresh {
                        state.pages.clear();
                    }
                    *state.slot(direction) = LoadState::Error(err.clone());
                    Some(err)
                }
            };
            self.snapshot.send_replace(state.snapshot());
            failure
        };

        if let (Some(err), Some(hook)) = (failure, self.on_error.as_ref()) {
            hook(&err);
        }
    }
}

fn apply_page<T>(state: &mut PagerState<T>, direction: Direction, page: Page<T>) {
    let at_start = page.prev_key.is_none();
    let at_end = page.next_key.is_none();

    match direction {
        Direction::Refresh => {
            state.pages = vec![page];
            state.refresh = LoadState::Loaded {
                end_of_data: at_start && at_end,
            };
            state.prepend = LoadState::Loaded { end_of_data: at_start };
            state.append = LoadState::Loaded { end_of_data: at_end };
        }
        Direction::Prepend => {
            if let Some(anchor) = state.anchor.as_mut() {
                *anchor += page.data.len();
            }
            state.pages.insert(0, page);
            state.prepend = LoadState::Loaded { end_of_data: at_start };
        }
        Direction::Append => {
            state.pages.push(page);
            state.append = LoadState::Loaded { end_of_data: at_end };
        }
    }
}

// ============================================================================
// Pager
// ============================================================================

/// Incremental loader for one list.
///
/// Loads run on spawned tasks, so every operation must be called from
/// within a tokio runtime. Dropping the pager aborts in-flight loads.
pub struct Pager<T> {
    shared: Arc<Shared<T>>,
}

impl<T> fmt::Debug for Pager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pager").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Pager<T> {
    /// Creates a pager that builds its paginator with `factory`.
    pub fn new(factory: impl Fn(QueryParams) -> PagedFetcher<T> + Send + Sync + 'static) -> Self {
        Self::build(Box::new(factory), None)
    }

    /// Creates a pager that also reports every load failure to `hook`.
    pub fn with_error_hook(
        factory: impl Fn(QueryParams) -> PagedFetcher<T> + Send + Sync + 'static,
        hook: impl Fn(&PageError) + Send + Sync + 'static,
    ) -> Self {
        Self::build(Box::new(factory), Some(Box::new(hook)))
    }

    fn build(factory: Box<FetcherFactory<T>>, on_error: Option<Box<ErrorHook>>) -> Self {
        let (snapshot, _) = watch::channel(PagerSnapshot::idle());
        Self {
            shared: Arc::new(Shared {
                factory,
                state: Mutex::new(PagerState {
                    generation: 0,
                    fetcher: None,
                    pages: Vec::new(),
                    anchor: None,
                    refresh_key: None,
                    refresh: LoadState::IDLE,
                    prepend: LoadState::IDLE,
                    append: LoadState::IDLE,
                    tasks: Vec::new(),
                }),
                snapshot,
                on_error,
            }),
        }
    }

    /// Subscribes to snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PagerSnapshot<T>> {
        self.shared.snapshot.subscribe()
    }

    /// Returns the latest snapshot.
    pub fn snapshot(&self) -> PagerSnapshot<T> {
        self.shared.snapshot.borrow().clone()
    }

    /// Starts over with a new query at offset 0.
    ///
    /// `None` publishes an empty, fully loaded list without calling
    /// upstream.
    pub fn submit(&self, query: Option<QueryParams>) {
        let mut state = self.shared.lock();
        state.restart();
        state.pages.clear();
        state.anchor = None;
        state.refresh_key = None;

        match query {
            Some(query) => {
                debug!(params = query.len(), "Pager query submitted");
                state.fetcher = Some((self.shared.factory)(query));
                state.prepend = LoadState::IDLE;
                state.append = LoadState::IDLE;
                self.shared.start(&mut state, Direction::Refresh, None);
            }
            None => {
                debug!("Pager cleared");
                state.fetcher = None;
                state.refresh = LoadState::DONE;
                state.prepend = LoadState::DONE;
                state.append = LoadState::DONE;
                self.shared.snapshot.send_replace(state.snapshot());
            }
        }
    }

    /// Loads the page after the last loaded one.
    ///
    /// Ignored while a refresh or append is in flight, after a failed
    /// append (use [`Self::retry`]) and at the end of data.
    pub fn load_next(&self) {
        let mut state = self.shared.lock();
        if state.refresh.is_loading() || !matches!(state.append, LoadState::Loaded { end_of_data: false }) {
            return;
        }
        if let Some(key) = state.pages.last().and_then(|p| p.next_key) {
            self.shared.start(&mut state, Direction::Append, Some(key));
        }
    }

    /// Loads the page before the first loaded one.
    pub fn load_previous(&self) {
        let mut state = self.shared.lock();
        if state.refresh.is_loading() || !matches!(state.prepend, LoadState::Loaded { end_of_data: false }) {
            return;
        }
        if let Some(key) = state.pages.first().and_then(|p| p.prev_key) {
            self.shared.start(&mut state, Direction::Prepend, Some(key));
        }
    }

    /// Records the position the consumer is looking at.
    pub fn set_anchor(&self, position: usize) {
        self.shared.lock().anchor = Some(position);
    }

    /// Reloads the current query, resuming near the anchor position.
    pub fn refresh(&self) {
        let mut state = self.shared.lock();
        let Some(fetcher) = state.fetcher.clone() else {
            return;
        };

        let key = fetcher.refresh_key(&PagingState {
            pages: state.pages.clone(),
            anchor_position: state.anchor,
        });
        state.restart();
        self.shared.start(&mut state, Direction::Refresh, key);
    }

    /// Re-runs whichever of refresh, prepend or append failed.
    pub fn retry(&self) {
        let mut state = self.shared.lock();
        if state.refresh.error().is_some() {
            let key = state.refresh_key;
            state.restart();
            self.shared.start(&mut state, Direction::Refresh, key);
            return;
        }
        if state.prepend.error().is_some() {
            if let Some(key) = state.pages.first().and_then(|p| p.prev_key) {
                self.shared.start(&mut state, Direction::Prepend, Some(key));
            }
        }
        if state.append.error().is_some() {
            if let Some(key) = state.pages.last().and_then(|p| p.next_key) {
                self.shared.start(&mut state, Direction::Append, Some(key));
            }
        }
    }
}

impl<T> Drop for Pager<T> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().unwrap_or_else(PoisonError::into_inner);
        for task in state.tasks.drain(..) {
            task.abort();
        }
    }
}
