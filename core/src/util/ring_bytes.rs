use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded byte buffer that keeps the most recent `cap` bytes.
///
/// Recipe stdout and stderr are pushed into the same ring, so the capture
/// is their interleaving at chunk granularity.
#[derive(Debug)]
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
    truncated: Mutex<bool>,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(64 * 1024))),
            cap,
            truncated: Mutex::new(false),
        })
    }

    pub fn push(&self, data: &[u8]) {
        let mut g = lock(&self.inner);
        let data = if data.len() > self.cap {
            *lock(&self.truncated) = true;
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            *lock(&self.truncated) = true;
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = lock(&self.inner);
        let mut vec = Vec::with_capacity(g.len());
        vec.extend(g.iter().copied());
        vec
    }

    /// Captured bytes as text, prefixed with a marker if older output was dropped.
    pub fn to_string_lossy(&self) -> String {
        let text = String::from_utf8_lossy(&self.to_bytes()).into_owned();
        if *lock(&self.truncated) {
            format!("[... output truncated ...]\n{text}")
        } else {
            text
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
