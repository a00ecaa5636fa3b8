use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the session loop and the socket link.
#[derive(Default, Debug)]
pub struct SharedDiagnostics {
    pub frames_received: AtomicU64,
    pub malformed_frames: AtomicU64,
    pub commands_sent: AtomicU64,
    pub commands_dropped: AtomicU64,
    pub reconnect_attempts: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub frames_received: u64,
    pub malformed_frames: u64,
    pub commands_sent: u64,
    pub commands_dropped: u64,
    pub reconnect_attempts: u64,
}

impl SharedDiagnostics {
    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.commands_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconnect(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_dropped: self.commands_dropped.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
        }
    }
}
