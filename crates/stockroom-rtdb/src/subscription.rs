//! Scoped collection subscriptions.
//!
//! Each subscription owns one streaming connection and a pump task that
//! classifies raw stream frames into [`ChangeEvent`]s. Dropping the handle
//! aborts the pump and closes the connection; there is no explicit release
//! call to forget.

use std::collections::HashSet;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use stockroom_models::{ChangeEvent, Record, RecordId};

use crate::client::RtdbClient;
use crate::error::{RtdbError, RtdbResult};
use crate::metrics::record_stream_event;
use crate::path::CollectionPath;
use crate::repos::records_from_tree;
use crate::stream::{EventStream, ServerEvent};

/// Buffered events per subscription before backpressure applies.
const EVENT_BUFFER_SIZE: usize = 32;

/// Live subscription to a collection.
///
/// Yields a [`ChangeEvent::Snapshot`] with the collection's current
/// contents, then one event per observed write. A stream that fails or
/// is cancelled by the server yields one final `Err` item before it
/// ends. Also usable as a [`futures_util::Stream`].
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<RtdbResult<ChangeEvent>>,
    pump: JoinHandle<()>,
}

impl Subscription {
    pub(crate) async fn open(client: RtdbClient, path: CollectionPath) -> RtdbResult<Self> {
        let stream = client.stream(&path).await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let pump = tokio::spawn(pump_events(stream, path, tx));
        Ok(Self { rx, pump })
    }

    /// Receive the next change event.
    ///
    /// A stream failure or server-side cancel surfaces as one final
    /// `Err` item. `None` means the stream ended cleanly and every
    /// buffered event was delivered.
    pub async fn recv(&mut self) -> Option<RtdbResult<ChangeEvent>> {
        self.rx.recv().await
    }
}

impl futures_util::Stream for Subscription {
    type Item = RtdbResult<ChangeEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump_events(
    mut stream: EventStream,
    path: CollectionPath,
    tx: mpsc::Sender<RtdbResult<ChangeEvent>>,
) {
    let mut translator = EventTranslator::new();

    loop {
        let event = match stream.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(path = %path, "Event stream closed");
                break;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Event stream failed");
                let _ = tx.send(Err(e)).await;
                break;
            }
        };

        if matches!(event, ServerEvent::KeepAlive) {
            record_stream_event("keep_alive");
        }

        match translator.translate(event) {
            Translation::Deliver(events) => {
                for event in events {
                    record_stream_event(event.kind().as_str());
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            }
            Translation::Continue => {}
            Translation::Close(reason) => {
                warn!(path = %path, reason, "Event stream closed by server");
                let _ = tx.send(Err(RtdbError::stream_closed(reason))).await;
                break;
            }
        }
    }
}

/// Outcome of translating one server event.
#[derive(Debug)]
pub(crate) enum Translation {
    /// Change events to deliver, in order.
    Deliver(Vec<ChangeEvent>),
    /// Nothing to deliver, keep reading.
    Continue,
    /// The server ended the stream.
    Close(&'static str),
}

/// Classifies stream frames into change events.
///
/// Holds only the set of keys currently present under the subscribed
/// path, never record values; classification needs no local copy of the
/// data.
pub(crate) struct EventTranslator {
    known: HashSet<RecordId>,
}

impl EventTranslator {
    pub(crate) fn new() -> Self {
        Self {
            known: HashSet::new(),
        }
    }

    pub(crate) fn translate(&mut self, event: ServerEvent) -> Translation {
        match event {
            ServerEvent::Put(payload) => {
                let segments = split_path(&payload.path);
                match segments.as_slice() {
                    [] => self.apply_root_put(payload.data),
                    [key] => self.apply_child_put(key, payload.data),
                    [key, rest @ ..] => self.apply_deep_write(key, rest, payload.data),
                }
            }
            ServerEvent::Patch(payload) => {
                let segments = split_path(&payload.path);
                match segments.as_slice() {
                    [] => self.apply_root_patch(payload.data),
                    [key] => self.apply_child_patch(key, payload.data),
                    [key, rest @ ..] => self.apply_deep_write(key, rest, payload.data),
                }
            }
            ServerEvent::KeepAlive => Translation::Continue,
            ServerEvent::Cancel => Translation::Close("cancelled by server"),
            ServerEvent::AuthRevoked => Translation::Close("credentials revoked"),
        }
    }

    /// The whole subscribed subtree was replaced: emit a fresh snapshot.
    fn apply_root_put(&mut self, data: Value) -> Translation {
        let records = records_from_tree(data);
        self.known = records.iter().filter_map(|r| r.id().cloned()).collect();
        Translation::Deliver(vec![ChangeEvent::snapshot(records)])
    }

    fn apply_child_put(&mut self, key: &str, data: Value) -> Translation {
        let id = match parse_key(key) {
            Some(id) => id,
            None => return Translation::Continue,
        };
        if data.is_null() {
            self.known.remove(&id);
            return Translation::Deliver(vec![ChangeEvent::removed(id)]);
        }
        match data {
            Value::Object(fields) => {
                let event = self.classify(id, Record::from_fields(fields));
                Translation::Deliver(vec![event])
            }
            other => {
                debug!(key = %key, value = %other, "Skipping non-object record value");
                Translation::Continue
            }
        }
    }

    /// A write landed below a record node: deliver the delta subtree.
    fn apply_deep_write(&mut self, key: &str, rest: &[&str], data: Value) -> Translation {
        let id = match parse_key(key) {
            Some(id) => id,
            None => return Translation::Continue,
        };
        let record = Record::from_fields(nest_delta(rest, data));
        let event = self.classify(id, record);
        Translation::Deliver(vec![event])
    }

    fn apply_root_patch(&mut self, data: Value) -> Translation {
        let children = match data {
            Value::Object(children) => children,
            _ => {
                debug!("Skipping non-object patch at subscription root");
                return Translation::Continue;
            }
        };

        let mut events = Vec::new();
        for (key, value) in children {
            let id = match parse_key(&key) {
                Some(id) => id,
                None => continue,
            };
            if value.is_null() {
                self.known.remove(&id);
                events.push(ChangeEvent::removed(id));
                continue;
            }
            match value {
                Value::Object(fields) => {
                    events.push(self.classify(id, Record::from_fields(fields)));
                }
                other => debug!(key = %key, value = %other, "Skipping non-object record value"),
            }
        }

        if events.is_empty() {
            Translation::Continue
        } else {
            Translation::Deliver(events)
        }
    }

    fn apply_child_patch(&mut self, key: &str, data: Value) -> Translation {
        let id = match parse_key(key) {
            Some(id) => id,
            None => return Translation::Continue,
        };
        match data {
            Value::Object(fields) => {
                let event = self.classify(id, Record::from_fields(fields));
                Translation::Deliver(vec![event])
            }
            other => {
                debug!(key = %key, value = %other, "Skipping non-object patch value");
                Translation::Continue
            }
        }
    }

    fn classify(&mut self, id: RecordId, record: Record) -> ChangeEvent {
        if self.known.insert(id.clone()) {
            ChangeEvent::added(id, record)
        } else {
            ChangeEvent::changed(id, record)
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_key(key: &str) -> Option<RecordId> {
    match RecordId::new(key) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(key = %key, error = %e, "Skipping stream child with unusable key");
            None
        }
    }
}

/// Rebuild the nested shape of a write that landed `segments` deep
/// inside a record.
fn nest_delta(segments: &[&str], data: Value) -> Map<String, Value> {
    let mut value = data;
    for segment in segments.iter().skip(1).rev() {
        let mut wrap = Map::new();
        wrap.insert((*segment).to_string(), value);
        value = Value::Object(wrap);
    }
    let mut fields = Map::new();
    fields.insert(segments[0].to_string(), value);
    fields
}
