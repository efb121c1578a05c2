//! Event channel built on crossbeam-channel.
//!
//! Detectors run on rayon workers, so the sender must be cheap to clone
//! and safe to share across threads.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the core library.
///
/// This is a thin wrapper around crossbeam's Sender that can be
/// cloned and sent across threads.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event. Non-blocking if the channel isn't full.
    ///
    /// Events sent after the receiver is dropped are discarded.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receives events on the UI side.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    ///
    /// Use this for most cases - events are small and fast.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel; senders block once `capacity` events are queued.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// Sender whose receiver is already gone; every event is dropped.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::findings::Technique;
    use crate::events::{AnalysisEvent, BatchEvent, BatchProgress, PipelineEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Batch(BatchEvent::Progress(BatchProgress {
                completed: 3,
                total: 25,
                current_path: PathBuf::from("/test/c.png"),
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Batch(BatchEvent::Progress(p)) => {
                assert_eq!(p.completed, 3);
                assert_eq!(p.total, 25);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn cloned_senders_share_one_receiver() {
        let (sender, receiver) = EventChannel::new();
        let workers: Vec<_> = [Technique::ErrorLevel, Technique::Splicing]
            .into_iter()
            .map(|technique| {
                let sender = sender.clone();
                thread::spawn(move || {
                    sender.send(Event::Analysis(AnalysisEvent::DetectorFinished {
                        technique,
                        triggered: false,
                        score: 0.0,
                    }));
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        drop(sender);

        assert_eq!(receiver.iter().count(), 2);
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.send(Event::Pipeline(PipelineEvent::Cancelled));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
