//! Media references collected while pages render.
//!
//! Templates only reveal which media files they use while they are being
//! evaluated, so the host reports every `(source file, public URL)` pair to a
//! [`MediaSink`]. The sink ignores reports until it is activated, and is
//! drained exactly once after the last page has rendered.

use crate::types::MediaRecord;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct MediaSink {
    active: bool,
    records: Vec<MediaRecord>,
    seen: HashSet<MediaRecord>,
}

impl MediaSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Report a media file. No-op while the sink is inactive.
    pub fn record(&mut self, root: impl Into<PathBuf>, url: impl Into<String>) {
        if !self.active {
            return;
        }
        let record = MediaRecord {
            root: root.into(),
            url: url.into(),
        };
        if self.seen.insert(record.clone()) {
            self.records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take every record collected so far and deactivate the sink.
    pub fn drain(&mut self) -> Vec<MediaRecord> {
        self.active = false;
        self.seen.clear();
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_sink_ignores_records() {
        let mut sink = MediaSink::new();
        sink.record("/content/a.jpg", "/media/a.jpg");
        assert!(sink.is_empty());
    }

    #[test]
    fn active_sink_deduplicates() {
        let mut sink = MediaSink::new();
        sink.set_active(true);
        sink.record("/content/a.jpg", "/media/a.jpg");
        sink.record("/content/a.jpg", "/media/a.jpg");
        sink.record("/content/b.jpg", "/media/b.jpg");
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn drain_clears_and_deactivates() {
        let mut sink = MediaSink::new();
        sink.set_active(true);
        sink.record("/content/a.jpg", "/media/a.jpg");

        let records = sink.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "/media/a.jpg");
        assert!(sink.is_empty());
        assert!(!sink.is_active());

        sink.record("/content/c.jpg", "/media/c.jpg");
        assert!(sink.is_empty());
    }
}
