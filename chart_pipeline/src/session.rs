//! One mounted chart: fetch, normalize and publish, with stale work cancelled.
//!
//! A [`ChartSession`] owns the background task for the query it currently
//! shows. Loading a new query aborts that task before starting the next one,
//! and a generation counter keeps a result that was already in flight from
//! overwriting the newer state. Dropping the session aborts everything.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use shared_utils::config::{ChartConfig, LayoutConfig, RequestConfig};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    models::{chart_query::ChartQuery, method::IndicatorJob, record::RecordSeries, series_request::SeriesRequest},
    pipeline::{
        layout::{IndicatorPane, LayoutError, PaneLayout, plan_panes},
        normalizer::{Normalized, normalize_for},
        windowing::{DEFAULT_VISIBLE_BARS, Window, window_with},
    },
    providers::SeriesProvider,
    requests::{RequestError, builder::RequestBuilder},
};

/// Everything the presentation layer needs to draw one chart.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartView {
    pub query: ChartQuery,
    pub records: RecordSeries,
    /// Initially visible X range.
    pub window: Window,
    /// Indicator panes that have data to draw, in stacking order.
    pub panes: Vec<IndicatorPane>,
}

impl ChartView {
    /// Split a canvas of `total_height` pixels between price and [`Self::panes`].
    pub fn layout(&self, total_height: u32) -> Result<PaneLayout, LayoutError> {
        plan_panes(total_height, &self.panes)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum ChartState {
    #[default]
    Loading,
    /// The API answered but there were no bars to show.
    Empty,
    Ready(Arc<ChartView>),
    /// The fetch failed; holds the error message.
    Failed(String),
}

impl ChartState {
    pub fn view(&self) -> Option<&ChartView> {
        match self {
            ChartState::Ready(view) => Some(view),
            _ => None,
        }
    }
}

pub struct ChartSession {
    provider: Arc<dyn SeriesProvider>,
    request_config: RequestConfig,
    indicators: Vec<IndicatorJob>,
    visible_bars: usize,
    pane_candidates: Vec<IndicatorPane>,
    refresh: Option<Duration>,
    query: Option<ChartQuery>,
    state_tx: Arc<watch::Sender<ChartState>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ChartSession {
    pub fn new(provider: Arc<dyn SeriesProvider>) -> Self {
        let (state_tx, _) = watch::channel(ChartState::Loading);
        Self {
            provider,
            request_config: RequestConfig::default(),
            indicators: Vec::new(),
            visible_bars: DEFAULT_VISIBLE_BARS,
            pane_candidates: IndicatorPane::configured(&LayoutConfig::default()),
            refresh: None,
            query: None,
            state_tx: Arc::new(state_tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    /// Session using the `[request]` and `[chart]` tables of `config`.
    pub fn from_config(provider: Arc<dyn SeriesProvider>, config: &ChartConfig) -> Self {
        let mut session = Self::new(provider).with_visible_bars(config.chart.visible_bars);
        session.request_config = config.request.clone();
        session.pane_candidates = IndicatorPane::configured(&config.chart);
        session
    }

    /// Indicator jobs requested alongside the bars on every load.
    pub fn with_indicators(mut self, indicators: impl IntoIterator<Item = IndicatorJob>) -> Self {
        self.indicators = indicators.into_iter().collect();
        self
    }

    /// Re-fetch every `period`; each result replaces the previous state.
    pub fn with_refresh(mut self, period: Duration) -> Self {
        self.refresh = Some(period);
        self
    }

    pub fn with_visible_bars(mut self, visible_bars: usize) -> Self {
        self.visible_bars = visible_bars;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ChartState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ChartState {
        self.state_tx.borrow().clone()
    }

    pub fn query(&self) -> Option<&ChartQuery> {
        self.query.as_ref()
    }

    /// Show `query`, replacing whatever the session was showing.
    ///
    /// The request is validated before anything is cancelled, so an invalid
    /// configuration leaves the current chart untouched. Must be called from
    /// within a Tokio runtime.
    pub fn load(&mut self, query: ChartQuery) -> Result<(), RequestError> {
        let builder = RequestBuilder::from_config(&query, &self.request_config)?
            .indicators(self.indicators.iter().cloned());
        let request = builder.build()?;

        self.cancel();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state_tx.send_replace(ChartState::Loading);

        info!(
            pair = %query.pair,
            interval = %query.interval,
            start = %request.start_date,
            end = %request.end_date,
            generation,
            "loading chart"
        );

        let worker = Worker {
            provider: Arc::clone(&self.provider),
            state_tx: Arc::clone(&self.state_tx),
            current: Arc::clone(&self.generation),
            generation,
            query: query.clone(),
            builder,
            visible_bars: self.visible_bars,
            pane_candidates: self.pane_candidates.clone(),
            refresh: self.refresh,
        };
        self.task = Some(tokio::spawn(worker.run(request)));
        self.query = Some(query);
        Ok(())
    }

    /// Stop all background work; the last published state stays readable.
    pub fn unmount(&mut self) {
        self.cancel();
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.query = None;
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

impl Drop for ChartSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Worker {
    provider: Arc<dyn SeriesProvider>,
    state_tx: Arc<watch::Sender<ChartState>>,
    current: Arc<AtomicU64>,
    generation: u64,
    query: ChartQuery,
    builder: RequestBuilder,
    visible_bars: usize,
    pane_candidates: Vec<IndicatorPane>,
    refresh: Option<Duration>,
}

impl Worker {
    async fn run(self, mut request: SeriesRequest) {
        let mut ticker = self.refresh.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let state = self.fetch(&request).await;
            if !self.publish(state) {
                debug!(generation = self.generation, "dropping result of superseded load");
                return;
            }

            let Some(ticker) = ticker.as_mut() else {
                return;
            };
            ticker.tick().await;

            // The date range slides with the clock.
            request = match self.builder.build() {
                Ok(request) => request,
                Err(err) => {
                    warn!(error = %err, "could not rebuild refresh request");
                    return;
                }
            };
        }
    }

    async fn fetch(&self, request: &SeriesRequest) -> ChartState {
        match self.provider.fetch_series(request).await {
            Ok(batch) => match normalize_for(&batch, request) {
                Normalized::Empty => ChartState::Empty,
                Normalized::Ready(records) => match window_with(records.len(), self.visible_bars) {
                    Some(window) => {
                        let panes = IndicatorPane::for_records(&records, self.pane_candidates.clone());
                        ChartState::Ready(Arc::new(ChartView {
                            query: self.query.clone(),
                            records,
                            window,
                            panes,
                        }))
                    }
                    None => ChartState::Empty,
                },
            },
            Err(err) => {
                warn!(pair = %self.query.pair, error = %err, "chart fetch failed");
                ChartState::Failed(err.to_string())
            }
        }
    }

    /// Replace the published state unless a newer load has started.
    fn publish(&self, state: ChartState) -> bool {
        self.state_tx.send_if_modified(|current| {
            if self.current.load(Ordering::SeqCst) != self.generation {
                return false;
            }
            *current = state;
            true
        })
    }
}
