use super::*;
use crate::error::{AcquisitionError, BatchError};
use crate::orchestrator::test_helpers::{
    FailingCatalog, Harness, Scripted, create_harness, create_test_orchestrator, numbered_tracks,
    test_config,
};
use crate::types::{MediaSource, ProgressEvent};
use futures::StreamExt;
use std::time::Duration;


/// Drain a batch stream, failing the test if it does not end in time
async fn collect_events(stream: BatchStream) -> Vec<ProgressEvent> {
    tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("batch stream did not finish")
}

/// Wait until the broadcast channel reports `state` for the track named `name`
async fn wait_for_state(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    name: &str,
    wanted: AcquisitionState,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(Event::TrackStateChanged {
                name: event_name,
                state,
                ..
            }) = rx.recv().await
                && event_name == name
                && state == wanted
            {
                return;
            }
        }
    })
    .await
    .expect("track never reached the expected state");
}

fn statuses(events: &[ProgressEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress { status, .. } => Some(status.clone()),
            _ => None,
        })
        .collect()
}
