//! Single and repeated attribute sampling.
//!
//! The polling loop resolves its target once, then writes one line per
//! sample. In repeating mode it sleeps between samples and stops as soon as
//! the shared [`CancellationToken`] is cancelled, including mid-sleep.

use std::io::{self, Write};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::RegistryConnection;
use crate::query::AttributeQueryEngine;

/// How many samples to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// One sample, then return.
    Once,
    /// Sample, sleep `pause`, repeat until cancelled.
    Repeating { pause: Duration },
}

impl PollMode {
    /// Builds the mode from the `infinite` flag and pause in whole seconds.
    pub fn from_args(infinite: bool, pause_secs: u64) -> Self {
        if infinite {
            Self::Repeating {
                pause: Duration::from_secs(pause_secs),
            }
        } else {
            Self::Once
        }
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self, Self::Repeating { .. })
    }
}

/// Samples one attribute according to a [`PollMode`].
pub struct PollingLoop<'c> {
    engine: AttributeQueryEngine<'c>,
    mode: PollMode,
    cancel: CancellationToken,
}

impl<'c> PollingLoop<'c> {
    pub fn new(connection: &'c mut RegistryConnection, mode: PollMode, cancel: CancellationToken) -> Self {
        Self {
            engine: AttributeQueryEngine::new(connection),
            mode,
            cancel,
        }
    }

    /// Runs the loop, writing each sample as a line to `out`.
    ///
    /// Returns the number of samples written. Registry failures never end
    /// the loop; they show up as placeholder lines.
    ///
    /// # Errors
    ///
    /// Only write failures on `out`.
    pub async fn run<W: Write>(&mut self, identifier: &str, attribute: &str, out: &mut W) -> io::Result<u64> {
        // Without a session every sample is the no-connection placeholder,
        // so a pattern is left unresolved
        let target = if self.engine.resolver().connection().is_connected() {
            let Some(target) = self.engine.resolver().resolve(identifier).await else {
                debug!(object = %identifier, "Nothing to sample");
                return Ok(0);
            };
            target
        } else {
            identifier.to_string()
        };

        debug!(object = %target, attribute = %attribute, mode = ?self.mode, "Starting sampling");

        let pause = match self.mode {
            PollMode::Once => {
                self.sample(&target, attribute, out).await?;
                return Ok(1);
            }
            PollMode::Repeating { pause } => pause,
        };

        let mut samples = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.sample(&target, attribute, out).await?;
            samples += 1;

            if self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = self.cancel.cancelled() => break,
            }
        }

        debug!(samples, "Sampling stopped");
        Ok(samples)
    }

    async fn sample<W: Write>(&mut self, target: &str, attribute: &str, out: &mut W) -> io::Result<()> {
        let value = self.engine.get_attribute(target, attribute).await;
        writeln!(out, "{value}")?;
        out.flush()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::query::{NO_CONNECTION, UNSUPPORTED};
    use crate::testing::{connection, FakeRegistry, RecordingReporter};
    use serde_json::json;
    use tokio::time::Instant;

    fn pool_registry() -> FakeRegistry {
        FakeRegistry::default().with_object("pkg:type=Pool", &[("size", "int", json!(42))])
    }

    #[test]
    fn test_poll_mode_from_args() {
        assert_eq!(PollMode::from_args(false, 5), PollMode::Once);
        assert_eq!(
            PollMode::from_args(true, 2),
            PollMode::Repeating {
                pause: Duration::from_secs(2)
            }
        );
        assert!(PollMode::from_args(true, 0).is_repeating());
        assert!(!PollMode::Once.is_repeating());
    }

    #[tokio::test]
    async fn test_once_writes_single_line() {
        let registry = pool_registry();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, PollMode::Once, CancellationToken::new())
            .run("pkg:type=Pool", "size", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "42\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_sleeps_between_samples() {
        let cancel = CancellationToken::new();
        let registry = pool_registry().cancel_after(2, cancel.clone());
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let started = Instant::now();
        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Pool", "size", &mut out)
            .await
            .unwrap();
        conn.close().await;

        assert_eq!(samples, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "42\n42\n");
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(registry.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep_ends_loop() {
        let cancel = CancellationToken::new();
        let registry = pool_registry();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Pool", "size", &mut out)
            .await
            .unwrap();

        // Samples at t=0, 1 and 2; the cancel at 2.5 lands mid-sleep
        assert_eq!(samples, 3);
        assert_eq!(registry.samples(), 3);
        assert!(reporter.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_already_cancelled_takes_no_samples() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let registry = pool_registry();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Pool", "size", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 0);
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wildcard_resolved_once() {
        let cancel = CancellationToken::new();
        let registry = FakeRegistry::default()
            .with_object("pkg:type=Pool,name=a", &[("size", "int", json!(1))])
            .cancel_after(3, cancel.clone());
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Pool.*", "size", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 3);
        assert_eq!(registry.listings(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "1\n1\n1\n");
    }

    #[tokio::test]
    async fn test_wildcard_without_match_samples_nothing() {
        let registry = pool_registry();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, PollMode::Once, CancellationToken::new())
            .run("nothing:type=.*", "size", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 0);
        assert!(out.is_empty());
        assert_eq!(registry.samples(), 0);
        assert!(reporter.kinds().is_empty());
        assert_eq!(reporter.notices().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wildcard_without_connection_prints_placeholder() {
        let cancel = CancellationToken::new();
        let registry = pool_registry().refuse_connections();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Po.*", "size", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 2);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{NO_CONNECTION}\n{NO_CONNECTION}\n"));
        assert_eq!(reporter.kinds(), vec![ErrorKind::Connect]);
        assert!(reporter.notices().is_empty());
        assert_eq!(registry.listings(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_samples_keep_loop_alive() {
        let cancel = CancellationToken::new();
        let registry = pool_registry();
        let reporter = RecordingReporter::default();
        let mut conn = connection(&registry, &reporter);
        conn.connect().await;

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        let mode = PollMode::Repeating {
            pause: Duration::from_secs(1),
        };
        let mut out = Vec::new();
        let samples = PollingLoop::new(&mut conn, mode, cancel)
            .run("pkg:type=Pool", "missing", &mut out)
            .await
            .unwrap();

        assert_eq!(samples, 2);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{UNSUPPORTED}\n{UNSUPPORTED}\n"));
        assert_eq!(reporter.kinds(), vec![ErrorKind::NotFound, ErrorKind::NotFound]);
    }
}
