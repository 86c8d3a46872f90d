//! Reconciliation loop
//!
//! The Reconciler is responsible for:
//! - Resolving the public IP once per cycle via IpResolver
//! - Reading each configured record via RecordStore
//! - Writing the record only when its content differs from the public IP
//! - Sleeping between cycles until a shutdown signal arrives
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐        ┌──────────────┐        ┌─────────────┐
//! │ IpResolver  │◄───────│  Reconciler  │───────►│ RecordStore │
//! │ (per cycle) │        └──────────────┘        │ (per record)│
//! └─────────────┘               │                └─────────────┘
//!                               ▼
//!                         CycleReport (logged)
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve public IP; on failure skip every record this cycle
//! 2. For each record in configured order: read, compare, maybe write
//! 3. A failed read or write is logged and the next record is processed
//! 4. Sleep for the configured interval, then start again

use crate::config::{DdnsConfig, RecordTarget};
use crate::error::{Error, Result};
use crate::traits::{IpResolver, RecordStore, DEFAULT_TTL};
use std::fmt;
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// What happened to one record during one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored content already equals the public IP; no write issued
    Unchanged {
        /// The address the record points at
        ip: String,
    },

    /// Stored content differed and the write succeeded
    Updated {
        /// Content before the write
        previous: String,
        /// Content written
        current: String,
    },

    /// Stored content differed but dry-run mode suppressed the write
    Skipped {
        /// Content left in place
        previous: String,
        /// Content that would have been written
        current: String,
    },

    /// The provider read failed; the record was not compared
    ReadFailed {
        /// Underlying provider error
        error: Error,
    },

    /// Stored content differed and the write failed
    WriteFailed {
        /// Content left in place
        previous: String,
        /// Content that should have been written
        current: String,
        /// Underlying provider error
        error: Error,
    },
}

impl RecordOutcome {
    /// Whether a write call was issued for this outcome
    pub fn wrote(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::WriteFailed { .. })
    }

    /// Whether this outcome represents a failed provider call
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ReadFailed { .. } | Self::WriteFailed { .. })
    }
}

/// Outcome for one named record
///
/// The `Display` form is the log line emitted for the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    /// Record name
    pub name: String,
    /// What happened to it
    pub outcome: RecordOutcome,
}

impl RecordReport {
    fn new(name: &str, outcome: RecordOutcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
        }
    }
}

impl fmt::Display for RecordReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        match &self.outcome {
            RecordOutcome::Unchanged { ip } => write!(f, "[{name}] IP unchanged: {ip}"),
            RecordOutcome::Updated { previous, current } => {
                write!(f, "[{name}] Updating IP from {previous} to {current}")
            }
            RecordOutcome::Skipped { previous, current } => write!(
                f,
                "[{name}] Would update IP from {previous} to {current} (dry-run, write skipped)"
            ),
            RecordOutcome::ReadFailed { error } => {
                write!(f, "[{name}] Failed to query provider: {error}")
            }
            RecordOutcome::WriteFailed { error, .. } => {
                write!(f, "[{name}] Failed to update: {error}")
            }
        }
    }
}

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// The public IP could not be resolved; no record was touched
    IpUnavailable {
        /// Underlying resolver error
        error: Error,
    },

    /// Every configured record was processed
    Completed {
        /// The public IP the records were compared against
        ip: Ipv4Addr,
        /// One report per configured record, in configured order
        records: Vec<RecordReport>,
    },
}

impl CycleReport {
    /// Per-record reports (empty when the IP was unavailable)
    pub fn records(&self) -> &[RecordReport] {
        match self {
            Self::IpUnavailable { .. } => &[],
            Self::Completed { records, .. } => records,
        }
    }

    /// Number of write calls issued during the cycle
    pub fn writes_attempted(&self) -> usize {
        self.records().iter().filter(|r| r.outcome.wrote()).count()
    }

    /// Number of records whose read or write failed
    pub fn failures(&self) -> usize {
        self.records().iter().filter(|r| r.outcome.is_failure()).count()
    }
}

/// Core reconciliation loop
///
/// Holds the read-only record list and the two collaborators. All work runs
/// on the calling task, one record at a time.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Start with [`Reconciler::run()`] or [`Reconciler::run_with_shutdown()`]
/// 3. The loop runs until a shutdown signal is received
///
/// [`Reconciler::run_cycle()`] and [`Reconciler::run_cycles()`] drive a
/// bounded number of cycles without any shutdown plumbing.
pub struct Reconciler {
    /// Public IP resolver
    resolver: Box<dyn IpResolver>,

    /// DNS record store
    store: Box<dyn RecordStore>,

    /// Records to reconcile, in configured order
    records: Vec<RecordTarget>,

    /// Sleep between cycles
    interval: Duration,

    /// Read but never write
    dry_run: bool,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("resolver", &self.resolver.resolver_name())
            .field("store", &self.store.provider_name())
            .field("records", &self.records)
            .field("interval", &self.interval)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(
        resolver: Box<dyn IpResolver>,
        store: Box<dyn RecordStore>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            store,
            records: config.records.clone(),
            interval: config.interval(),
            dry_run: config.dry_run,
        })
    }

    /// Override the inter-cycle sleep
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Records this reconciler manages
    pub fn records(&self) -> &[RecordTarget] {
        &self.records
    }

    /// Run until Ctrl-C is received
    pub async fn run(&self) {
        self.run_with_shutdown(None).await;
    }

    /// Run until the given shutdown signal fires
    ///
    /// With `None`, the loop stops on Ctrl-C. A dropped sender counts as a
    /// shutdown signal.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => {
                self.run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await
            }
        }
    }

    /// Run exactly `cycles` cycles, sleeping between them
    pub async fn run_cycles(&self, cycles: usize) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(cycles);

        for cycle in 0..cycles {
            reports.push(self.run_cycle().await);

            if cycle + 1 < cycles {
                tokio::time::sleep(self.interval).await;
            }
        }

        reports
    }

    async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        let names: Vec<&str> = self.records.iter().map(|r| r.name.as_str()).collect();
        info!(
            "Starting cfddns | records: {} | interval: {}s{}",
            names.join(", "),
            self.interval.as_secs(),
            if self.dry_run { " | mode: DRY-RUN" } else { "" }
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                report = self.run_cycle() => {
                    debug!(
                        "Cycle finished: {} record(s), {} write(s), {} failure(s)",
                        report.records().len(),
                        report.writes_attempted(),
                        report.failures()
                    );
                }
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received, reconciler stopped");
    }

    /// Run a single reconciliation cycle
    ///
    /// Never fails: resolver and provider errors are logged and captured in
    /// the returned report.
    pub async fn run_cycle(&self) -> CycleReport {
        let ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Failed to get public IP: {}", e);
                return CycleReport::IpUnavailable { error: e };
            }
        };

        debug!("Public IP from {}: {}", self.resolver.resolver_name(), ip);

        let current = ip.to_string();
        let mut records = Vec::with_capacity(self.records.len());
        for target in &self.records {
            records.push(self.reconcile_record(target, &current).await);
        }

        CycleReport::Completed { ip, records }
    }

    /// Read, compare and conditionally write one record
    async fn reconcile_record(&self, target: &RecordTarget, current: &str) -> RecordReport {
        let stored = match self.store.read_record(target).await {
            Ok(stored) => stored,
            Err(error) => {
                let report = RecordReport::new(&target.name, RecordOutcome::ReadFailed { error });
                warn!("{}", report);
                return report;
            }
        };

        if stored == current {
            let report = RecordReport::new(
                &target.name,
                RecordOutcome::Unchanged {
                    ip: current.to_string(),
                },
            );
            info!("{}", report);
            return report;
        }

        if self.dry_run {
            let report = RecordReport::new(
                &target.name,
                RecordOutcome::Skipped {
                    previous: stored,
                    current: current.to_string(),
                },
            );
            info!("{}", report);
            return report;
        }

        let updating = RecordReport::new(
            &target.name,
            RecordOutcome::Updated {
                previous: stored.clone(),
                current: current.to_string(),
            },
        );
        info!("{}", updating);

        match self
            .store
            .write_record(target, current, DEFAULT_TTL)
            .await
        {
            Ok(()) => {
                debug!(
                    "[{}] Update accepted by {}",
                    target.name,
                    self.store.provider_name()
                );
                updating
            }
            Err(error) => {
                let report = RecordReport::new(
                    &target.name,
                    RecordOutcome::WriteFailed {
                        previous: stored,
                        current: current.to_string(),
                        error,
                    },
                );
                error!("{}", report);
                report
            }
        }
    }
}
