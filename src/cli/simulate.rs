// src/cli/simulate.rs
// In-process host: connects recipients and lets every producer announce

use anyhow::Result;
use herald::{
    AnnounceOutcome, DescriptorFile, InMemoryAttachmentStore, Producer, ProducerDescriptor,
    RecipientId, RecipientTracker, Settings, TracingChannel,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Counters from one simulated run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub recipients: usize,
    pub announcements: usize,
    pub drivers: usize,
    pub purged: usize,
}

/// Run the simulation until `duration` elapses or Ctrl-C
pub async fn run_simulate(
    settings: &Settings,
    descriptors: &Path,
    recipients: usize,
    duration: Duration,
) -> Result<()> {
    let file = DescriptorFile::load(descriptors)?;
    info!(
        producers = file.producers.len(),
        recipients,
        period_ms = settings.rotation.period.as_millis() as u64,
        display = settings.rotation.display.as_str(),
        "Starting simulation"
    );

    let tracker = RecipientTracker::new(
        Arc::new(InMemoryAttachmentStore::new()),
        Arc::new(TracingChannel),
        settings.rotation,
    );

    let until = async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
    };

    let report = simulate(&tracker, file.producers, recipients, until).await?;
    info!(
        recipients = report.recipients,
        announcements = report.announcements,
        drivers = report.drivers,
        purged = report.purged,
        "Simulation finished"
    );
    Ok(())
}

/// Load every producer, connect `recipients`, let each producer announce to
/// each recipient, wait for `until`, then disconnect everyone
pub async fn simulate<F>(
    tracker: &RecipientTracker,
    descriptors: Vec<ProducerDescriptor>,
    recipients: usize,
    until: F,
) -> Result<SimulationReport>
where
    F: Future<Output = ()>,
{
    let producers = descriptors
        .into_iter()
        .map(|d| Producer::new(d, tracker.clone()))
        .collect::<herald::Result<Vec<_>>>()?;
    for producer in &producers {
        producer.log_startup();
    }

    let mut report = SimulationReport {
        recipients,
        ..Default::default()
    };

    let ids: Vec<RecipientId> = (0..recipients).map(|_| RecipientId::new()).collect();
    for id in &ids {
        tracker.on_connect(*id);
        for producer in &producers {
            match producer.on_connect(id) {
                Ok(Some(outcome)) => {
                    report.announcements += 1;
                    if let AnnounceOutcome::Driver(_) = outcome {
                        report.drivers += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(producer = %producer.descriptor().name, error = %e, "Announce failed"),
            }
        }
    }

    until.await;

    for id in &ids {
        report.purged += tracker.on_disconnect(id).purged;
    }
    Ok(report)
}
