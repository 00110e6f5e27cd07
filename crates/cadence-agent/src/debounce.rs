// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-counterpart debounce buffer with single-flight processing.
//!
//! Rapid-fire inbound fragments are batched so exactly one generation cycle
//! runs per burst of typing, not per message. Each counterpart owns at most
//! one live task: a new fragment restarts the quiet window, and a fragment
//! arriving after handoff cancels the in-flight processing (the reply being
//! generated no longer reflects the latest input).
//!
//! The buffer is supervised, not fire-and-forget: every replacement first
//! cancels the previous task and awaits its handle, so there is no window in
//! which two tasks race for one counterpart.
//!
//! All state is in-memory and best-effort; a crash loses unflushed fragments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cadence_core::types::{CombinedMessage, CounterpartId, InboundFragment};

/// Processing callback invoked with the merged window contents.
///
/// The handler must treat the [`CancellationToken`] as its supersession
/// signal: check it at every suspension point and apply no side effects once
/// it fires.
pub type WindowHandler =
    Arc<dyn Fn(CombinedMessage, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

struct Slot {
    generation: u64,
    fragments: Vec<InboundFragment>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Per-counterpart fragment accumulator with window-restart and
/// cancel-and-supersede semantics.
pub struct DebounceBuffer {
    slots: Arc<Mutex<HashMap<CounterpartId, Slot>>>,
    handler: WindowHandler,
    next_generation: AtomicU64,
}

impl DebounceBuffer {
    pub fn new(handler: WindowHandler) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            handler,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Appends a fragment to the counterpart's pending list and (re)starts
    /// its quiet window.
    ///
    /// Any previous task for the counterpart -- still waiting out its window
    /// or already mid-processing -- is cancelled and awaited before the
    /// replacement starts. Fragments not yet handed off carry over into the
    /// new window; a duplicate fragment (same normalized text and
    /// second-truncated arrival) is dropped.
    pub async fn append(
        &self,
        counterpart_id: CounterpartId,
        fragment: InboundFragment,
        window: Duration,
    ) {
        let previous = {
            let mut slots = self.slots.lock().await;
            slots.remove(&counterpart_id)
        };

        // Cancel-and-await outside the lock so a slow in-flight handler
        // cannot stall unrelated counterparts.
        let mut fragments = match previous {
            Some(slot) => {
                slot.cancel.cancel();
                if let Err(e) = slot.task.await {
                    warn!(
                        counterpart_id = %counterpart_id,
                        error = %e,
                        "superseded window task panicked"
                    );
                }
                slot.fragments
            }
            None => Vec::new(),
        };

        if fragments.iter().any(|f| same_fragment(f, &fragment)) {
            debug!(
                counterpart_id = %counterpart_id,
                "dropping duplicate fragment"
            );
        } else {
            fragments.push(fragment);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let task = self.spawn_window_task(counterpart_id.clone(), generation, cancel.clone(), window);

        let mut slots = self.slots.lock().await;
        slots.insert(
            counterpart_id,
            Slot {
                generation,
                fragments,
                cancel,
                task,
            },
        );
    }

    /// Number of fragments currently buffered for a counterpart.
    pub async fn pending_fragments(&self, counterpart_id: &CounterpartId) -> usize {
        self.slots
            .lock()
            .await
            .get(counterpart_id)
            .map(|slot| slot.fragments.len())
            .unwrap_or(0)
    }

    /// Cancels and awaits every live task. Unflushed fragments are dropped.
    pub async fn shutdown(&self) {
        let drained: Vec<Slot> = {
            let mut slots = self.slots.lock().await;
            slots.drain().map(|(_, slot)| slot).collect()
        };
        for slot in drained {
            slot.cancel.cancel();
            let _ = slot.task.await;
        }
    }

    fn spawn_window_task(
        &self,
        counterpart_id: CounterpartId,
        generation: u64,
        cancel: CancellationToken,
        window: Duration,
    ) -> JoinHandle<()> {
        let slots = Arc::clone(&self.slots);
        let handler = Arc::clone(&self.handler);

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(counterpart_id = %counterpart_id, "window restarted");
                    return;
                }
                _ = tokio::time::sleep(window) => {}
            }

            // Quiet window elapsed: drain the accumulated fragments. The slot
            // entry stays registered so a late fragment still supersedes us.
            let fragments = {
                let mut slots = slots.lock().await;
                match slots.get_mut(&counterpart_id) {
                    Some(slot) if slot.generation == generation => {
                        std::mem::take(&mut slot.fragments)
                    }
                    _ => return,
                }
            };

            if let Some(combined) = merge_fragments(&counterpart_id, fragments) {
                debug!(
                    counterpart_id = %counterpart_id,
                    fragments = combined.fragment_count,
                    "debounce window expired, handing off"
                );
                handler(combined, cancel.clone()).await;
            }

            // Clear our own registration unless a newer window took over.
            if !cancel.is_cancelled() {
                let mut slots = slots.lock().await;
                if slots
                    .get(&counterpart_id)
                    .is_some_and(|slot| slot.generation == generation)
                {
                    slots.remove(&counterpart_id);
                }
            }
        })
    }
}

/// Merges fragments into one chronologically ordered combined message.
///
/// Returns `None` for an empty list (every fragment was deduplicated away or
/// the slot was already drained).
fn merge_fragments(
    counterpart_id: &CounterpartId,
    mut fragments: Vec<InboundFragment>,
) -> Option<CombinedMessage> {
    if fragments.is_empty() {
        return None;
    }

    fragments.sort_by_key(|f| f.arrived_at);

    let first_arrived_at = fragments.first()?.arrived_at;
    let last_arrived_at = fragments.last()?.arrived_at;
    let fragment_count = fragments.len();
    let text = fragments
        .iter()
        .map(fragment_text)
        .collect::<Vec<_>>()
        .join(" ");

    Some(CombinedMessage {
        counterpart_id: counterpart_id.clone(),
        text,
        fragment_count,
        first_arrived_at,
        last_arrived_at,
    })
}

fn fragment_text(fragment: &InboundFragment) -> String {
    let text = normalize_text(&fragment.text);
    match &fragment.media {
        Some(media) if text.is_empty() => format!("[{media}]"),
        Some(media) => format!("{text} [{media}]"),
        None => text,
    }
}

/// Collapses runs of whitespace and trims the ends.
fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Duplicate detection key: normalized text plus second-truncated arrival.
///
/// Platform-level echoes and retried webhook deliveries repeat the same text
/// within the same second; genuinely repeated user messages arrive later.
fn same_fragment(a: &InboundFragment, b: &InboundFragment) -> bool {
    normalize_text(&a.text) == normalize_text(&b.text)
        && a.arrived_at.timestamp() == b.arrived_at.timestamp()
}
