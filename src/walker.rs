//! Depth-first walk over the option tree of one state.
//!
//! A single recursive procedure handles every level: resolve the next
//! [`Level`] under the current [`SelectionPath`], drop the branch if nothing
//! comes back, otherwise recurse into each option in the order the oracle
//! listed them. At a complete path the voter-list lookup runs and a found
//! link goes to the [`Sink`].
//!
//! # Concurrency
//!
//! District and village options are always walked one after another.
//! Ward and registration-centre options ([`Level::fans_out`]) are handed to
//! a pool of `concurrency` workers. Every oracle request, at any level,
//! first takes a permit from one shared semaphore of the same size, so no
//! more than `concurrency` requests are ever in flight. With
//! `concurrency = 1` the walk is strictly sequential and its output order
//! is fully determined by the oracle's responses.
//!
//! # Failure handling
//!
//! Oracle failures never abort the walk: an empty or failed option list
//! prunes that branch, and a failed or link-less leaf lookup is reported
//! and skipped. A sink error aborts the walk.

use anyhow::{anyhow, Context, Result};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, TryStreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::lookup::LinkLookup;
use crate::models::{LeafRecord, Level, SelectionPath};
use crate::progress::{NoProgress, WalkEvent, WalkReporter};
use crate::resolver::OptionResolver;
use crate::traits::{Oracle, Sink};

/// Counters for one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub districts: u64,
    pub villages: u64,
    pub wards: u64,
    pub reg_centres: u64,
    /// Branches dropped because their option list was empty or failed.
    pub pruned_branches: u64,
    /// Complete paths reached (lookups issued, or counted in a dry run).
    pub leaf_paths: u64,
    pub links_written: u64,
    pub links_not_found: u64,
    pub failed_lookups: u64,
}

#[derive(Default)]
struct WalkStats {
    options: [AtomicU64; 4],
    pruned_branches: AtomicU64,
    leaf_paths: AtomicU64,
    links_written: AtomicU64,
    links_not_found: AtomicU64,
    failed_lookups: AtomicU64,
}

impl WalkStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self) -> WalkSummary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        WalkSummary {
            districts: load(&self.options[Level::District.depth()]),
            villages: load(&self.options[Level::Village.depth()]),
            wards: load(&self.options[Level::Ward.depth()]),
            reg_centres: load(&self.options[Level::RegCentre.depth()]),
            pruned_branches: load(&self.pruned_branches),
            leaf_paths: load(&self.leaf_paths),
            links_written: load(&self.links_written),
            links_not_found: load(&self.links_not_found),
            failed_lookups: load(&self.failed_lookups),
        }
    }
}

/// Walks the hierarchy below a state and feeds found links to a sink.
pub struct Walker {
    resolver: OptionResolver,
    lookup: LinkLookup,
    sink: Arc<dyn Sink>,
    reporter: Arc<dyn WalkReporter>,
    concurrency: usize,
    permits: Semaphore,
    dry_run: bool,
}

impl Walker {
    /// A sequential walker with no progress reporting.
    pub fn new(oracle: Arc<dyn Oracle>, sink: Arc<dyn Sink>) -> Self {
        Self {
            resolver: OptionResolver::new(oracle.clone()),
            lookup: LinkLookup::new(oracle),
            sink,
            reporter: Arc::new(NoProgress),
            concurrency: 1,
            permits: Semaphore::new(1),
            dry_run: false,
        }
    }

    /// Allow up to `concurrency` oracle requests in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        self.concurrency = concurrency;
        self.permits = Semaphore::new(concurrency);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn WalkReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Enumerate the tree but skip voter-list lookups and sink writes.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Walk everything below `state`. Each call starts from scratch.
    ///
    /// # Errors
    ///
    /// Only sink failures are returned; every oracle failure is logged,
    /// counted in the summary, and skipped.
    pub async fn walk(&self, state: &str) -> Result<WalkSummary> {
        tracing::info!(
            state,
            concurrency = self.concurrency,
            dry_run = self.dry_run,
            "starting walk"
        );
        let stats = WalkStats::default();
        self.descend(&stats, SelectionPath::new(state)).await?;
        let summary = stats.summary();
        tracing::info!(
            state,
            leaf_paths = summary.leaf_paths,
            links_written = summary.links_written,
            "walk finished"
        );
        Ok(summary)
    }

    fn descend<'a>(&'a self, stats: &'a WalkStats, path: SelectionPath) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let Some(level) = path.next_level() else {
                return self.visit_leaf(stats, &path).await;
            };

            let options = {
                let _permit = self.permits.acquire().await.context("worker pool closed")?;
                self.resolver.resolve(level, &path).await
            };
            stats.options[level.depth()].fetch_add(options.len() as u64, Ordering::Relaxed);

            if options.is_empty() {
                WalkStats::bump(&stats.pruned_branches);
                tracing::warn!(%path, %level, "no {} options, skipping branch {}", level, path);
                self.reporter.report(WalkEvent::BranchPruned {
                    level,
                    path: path.to_string(),
                });
                return Ok(());
            }

            if level.fans_out() && self.concurrency > 1 {
                let children = options.into_iter().map(|option| Ok::<_, anyhow::Error>(path.child(option)));
                return stream::iter(children)
                    .try_for_each_concurrent(self.concurrency, move |child| {
                        self.descend(stats, child)
                    })
                    .await;
            }

            let total = options.len();
            for (i, option) in options.into_iter().enumerate() {
                let child = path.child(option);
                if !level.fans_out() {
                    self.reporter.report(WalkEvent::Entering {
                        level,
                        path: child.to_string(),
                        label: child
                            .selection(level)
                            .map(|o| o.label.clone())
                            .unwrap_or_default(),
                        index: i + 1,
                        total,
                    });
                }
                self.descend(stats, child).await?;
            }
            Ok(())
        })
    }

    async fn visit_leaf(&self, stats: &WalkStats, path: &SelectionPath) -> Result<()> {
        WalkStats::bump(&stats.leaf_paths);
        if self.dry_run {
            return Ok(());
        }

        let outcome = {
            let _permit = self.permits.acquire().await.context("worker pool closed")?;
            self.lookup.try_lookup(path).await
        };

        match outcome {
            Ok(Some(link)) => {
                let record = LeafRecord::from_path(path, link.clone())
                    .ok_or_else(|| anyhow!("leaf path is incomplete: {}", path))?;
                self.sink
                    .append(&record)
                    .with_context(|| format!("Failed to record link for {}", path))?;
                WalkStats::bump(&stats.links_written);
                tracing::debug!(%path, link = %link, "link recorded");
                self.reporter.report(WalkEvent::LinkFound {
                    path: path.to_string(),
                    link,
                });
            }
            Ok(None) => {
                WalkStats::bump(&stats.links_not_found);
                tracing::warn!(%path, "Link not found for {}", path);
                self.reporter.report(WalkEvent::LinkNotFound {
                    path: path.to_string(),
                });
            }
            Err(e) => {
                WalkStats::bump(&stats.failed_lookups);
                tracing::warn!(%path, error = %e, "Failed to get final response for {}", path);
                self.reporter.report(WalkEvent::LookupFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::sink::MemorySink;
    use crate::traits::{Endpoint, OracleReply};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// One district, one village, `wards` wards with `centres` centres each.
    /// Every request sleeps briefly and the peak number of concurrent
    /// requests is recorded.
    struct WideTree {
        wards: usize,
        centres: usize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl WideTree {
        fn new(wards: usize, centres: usize) -> Arc<Self> {
            Arc::new(Self {
                wards,
                centres,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }

        fn options(n: usize) -> String {
            let html: String = (0..n)
                .map(|i| format!("<option value=\"{}\">Option {}</option>", i, i))
                .collect();
            serde_json::json!({ "result": html }).to_string()
        }
    }

    #[async_trait]
    impl Oracle for WideTree {
        async fn submit(&self, endpoint: Endpoint, form: &Form) -> anyhow::Result<OracleReply> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let body = match (endpoint, form.get("list_type")) {
                (Endpoint::Options, Some("district")) | (Endpoint::Options, Some("vdc")) => {
                    Self::options(1)
                }
                (Endpoint::Options, Some("ward")) => Self::options(self.wards),
                (Endpoint::Options, _) => Self::options(self.centres),
                (Endpoint::VoterList, _) => format!(
                    "<a style=\"color:white\" target=\"_blank\" href='https://x/{}-{}'>आफ्नो मतदान केन्द्र हेर्नुहोस्</a>",
                    form.get("ward").unwrap_or_default(),
                    form.get("reg_centre").unwrap_or_default()
                ),
            };
            Ok(OracleReply::ok(body))
        }
    }

    #[tokio::test]
    async fn test_pool_bounds_requests_in_flight() {
        let oracle = WideTree::new(6, 5);
        let sink = Arc::new(MemorySink::new());
        let walker = Walker::new(oracle.clone(), sink.clone()).with_concurrency(3);

        let summary = walker.walk("1").await.unwrap();

        assert_eq!(summary.leaf_paths, 30);
        assert_eq!(summary.links_written, 30);
        assert_eq!(sink.len(), 30);
        let peak = oracle.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight requests was {}", peak);
        assert!(peak >= 2, "pool never ran requests concurrently");
    }

    #[tokio::test]
    async fn test_sequential_walk_has_one_request_in_flight() {
        let oracle = WideTree::new(3, 3);
        let sink = Arc::new(MemorySink::new());
        let walker = Walker::new(oracle.clone(), sink.clone());
        assert_eq!(walker.concurrency(), 1);

        walker.walk("1").await.unwrap();

        assert_eq!(oracle.peak.load(Ordering::SeqCst), 1);
        let links: Vec<String> = sink.records().into_iter().map(|r| r.link).collect();
        assert_eq!(
            links,
            vec![
                "https://x/0-0",
                "https://x/0-1",
                "https://x/0-2",
                "https://x/1-0",
                "https://x/1-1",
                "https://x/1-2",
                "https://x/2-0",
                "https://x/2-1",
                "https://x/2-2",
            ]
        );
    }

    #[tokio::test]
    async fn test_dry_run_counts_leaves_without_lookups() {
        let oracle = WideTree::new(2, 4);
        let sink = Arc::new(MemorySink::new());
        let summary = Walker::new(oracle, sink.clone())
            .with_dry_run(true)
            .walk("1")
            .await
            .unwrap();
        assert_eq!(summary.leaf_paths, 8);
        assert_eq!(summary.links_written, 0);
        assert_eq!(summary.wards, 2);
        assert_eq!(summary.reg_centres, 8);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let walker = Walker::new(WideTree::new(1, 1), Arc::new(MemorySink::new()))
            .with_concurrency(0);
        assert_eq!(walker.concurrency(), 1);
    }
}
