use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::constants::swarm_settings::SwarmConfig;
use crate::engine::catalog::image_catalog::SortMetric;
use crate::engine::core::app_state::CollageState;
use crate::engine::swarm::entity_pool::RebuildCollage;
use crate::engine::swarm::fade::{FadeTransition, request_replacement};
use crate::error::SwarmError;

#[cfg(target_arch = "wasm32")]
use crate::constants::path;

/// A completed sort fetch, tagged with the collage generation at issue time.
#[derive(Debug)]
pub struct SortOutcome {
    pub generation: u64,
    pub result: Result<Vec<String>, SwarmError>,
}

pub type SortQueue = Arc<Mutex<Vec<SortOutcome>>>;

/// Thread-safe handoff between the fetch continuation and the main
/// schedule, mirroring the message queue used for page commands.
#[derive(Resource, Default, Clone)]
pub struct SortResultQueue(pub SortQueue);

/// Keep only results issued against the current generation; anything older
/// raced with a rebuild and must not resurrect a superseded selection.
pub fn partition_outcomes(
    outcomes: Vec<SortOutcome>,
    current_generation: u64,
) -> Vec<Result<Vec<String>, SwarmError>> {
    outcomes
        .into_iter()
        .filter(|outcome| outcome.generation == current_generation)
        .map(|outcome| outcome.result)
        .collect()
}

/// Drain completed sort fetches. Failures keep the current collage and log
/// a diagnostic; successes replace the pool with the server's order (no
/// local shuffle, the order is the point).
pub fn drain_sort_results(
    time: Res<Time>,
    config: Res<SwarmConfig>,
    queue: Res<SortResultQueue>,
    collage: Res<CollageState>,
    mut fade: ResMut<FadeTransition>,
    mut rebuilds: EventWriter<RebuildCollage>,
) {
    let outcomes = match queue.0.lock() {
        Ok(mut pending) => std::mem::take(&mut *pending),
        Err(_) => return,
    };
    if outcomes.is_empty() {
        return;
    }

    let received = outcomes.len();
    let applicable = partition_outcomes(outcomes, collage.generation);
    if applicable.len() < received {
        info!(
            "Discarded {} stale sort result(s)",
            received - applicable.len()
        );
    }

    for result in applicable {
        match result {
            Ok(mut identifiers) => {
                identifiers.truncate(config.max_images);
                info!("Applying server sort order: {} identifiers", identifiers.len());
                request_replacement(
                    &config,
                    &mut fade,
                    &mut rebuilds,
                    &collage,
                    time.elapsed_secs(),
                    identifiers,
                );
            }
            Err(err) => {
                warn!("{err}; keeping current collage");
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn issue_sort_request(
    queue: SortQueue,
    generation: u64,
    metric: SortMetric,
    category: String,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = fetch_sorted_identifiers(metric, &category).await;
        if let Ok(mut pending) = queue.lock() {
            pending.push(SortOutcome { generation, result });
        }
    });
}

#[cfg(not(target_arch = "wasm32"))]
pub fn issue_sort_request(
    _queue: SortQueue,
    _generation: u64,
    metric: SortMetric,
    _category: String,
) {
    warn!(
        "Sort endpoint is only reachable in browser builds (metric={})",
        metric.wire_name()
    );
}

#[cfg(target_arch = "wasm32")]
async fn fetch_sorted_identifiers(
    metric: SortMetric,
    category: &str,
) -> Result<Vec<String>, SwarmError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let failed = |detail: String| SwarmError::SortRequestFailed(detail);

    let window = web_sys::window().ok_or_else(|| failed("no window object".into()))?;
    let url = format!(
        "{}?metric={}&category={}",
        path::SORT_ENDPOINT,
        metric.wire_name(),
        category
    );

    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| failed("unexpected fetch result".into()))?;
    if !response.ok() {
        return Err(failed(format!("server responded with {}", response.status())));
    }

    let body = JsFuture::from(response.text().map_err(|err| failed(format!("{err:?}")))?)
        .await
        .map_err(|err| failed(format!("{err:?}")))?;
    let body = body
        .as_string()
        .ok_or_else(|| failed("non-string response body".into()))?;

    serde_json::from_str(&body).map_err(|err| failed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_outcome(generation: u64, name: &str) -> SortOutcome {
        SortOutcome {
            generation,
            result: Ok(vec![name.to_string()]),
        }
    }

    #[test]
    fn stale_generations_are_discarded() {
        let outcomes = vec![
            ok_outcome(3, "old.png"),
            ok_outcome(5, "current.png"),
            SortOutcome {
                generation: 4,
                result: Err(SwarmError::SortRequestFailed("timeout".into())),
            },
        ];
        let applicable = partition_outcomes(outcomes, 5);
        assert_eq!(applicable.len(), 1);
        assert_eq!(applicable[0], Ok(vec!["current.png".to_string()]));
    }

    #[test]
    fn current_failures_survive_partitioning() {
        let outcomes = vec![SortOutcome {
            generation: 2,
            result: Err(SwarmError::SortRequestFailed("boom".into())),
        }];
        let applicable = partition_outcomes(outcomes, 2);
        assert_eq!(
            applicable,
            vec![Err(SwarmError::SortRequestFailed("boom".into()))]
        );
    }

    #[test]
    fn queue_drains_to_empty() {
        let queue = SortResultQueue::default();
        queue.0.lock().unwrap().push(ok_outcome(1, "a.png"));
        let taken = std::mem::take(&mut *queue.0.lock().unwrap());
        assert_eq!(taken.len(), 1);
        assert!(queue.0.lock().unwrap().is_empty());
    }
}
