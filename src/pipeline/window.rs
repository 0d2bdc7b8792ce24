//! Sample Window - fixed-depth FIFO of accelerometer scalars
//!
//! Holds the most recent F/3 readings as `x0,y0,z0,x1,y1,z1,…`, oldest first.
//! A push rotates the buffer left by one reading and overwrites the vacated
//! tail, so the length never changes and nothing is allocated after
//! construction.
//!
//! The window is shared between exactly two tasks through [`shared_window`]:
//! a [`WindowWriter`] for the ingestor and a [`WindowReader`] for the engine.
//! Neither handle is `Clone`, so a second writer or reader cannot exist.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::smoothing::ConfigurationError;
use crate::types::{Axes, AXES_PER_READING};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    samples: Vec<f32>,
    /// Total readings pushed since construction
    pushed: u64,
}

impl SampleWindow {
    /// Create a zero-filled window of `frame_size` scalars.
    pub fn new(frame_size: usize) -> Result<Self, ConfigurationError> {
        if frame_size == 0 {
            return Err(ConfigurationError::EmptyFrame);
        }
        if frame_size % AXES_PER_READING != 0 {
            return Err(ConfigurationError::FrameNotMultipleOfAxes {
                frame_size,
                axes: AXES_PER_READING,
            });
        }
        Ok(Self {
            samples: vec![0.0; frame_size],
            pushed: 0,
        })
    }

    /// Append one reading at the tail, evicting the oldest.
    pub fn push_sample(&mut self, x: f32, y: f32, z: f32) {
        let len = self.samples.len();
        self.samples.copy_within(AXES_PER_READING.., 0);
        self.samples[len - 3] = x;
        self.samples[len - 2] = y;
        self.samples[len - 1] = z;
        self.pushed += 1;
    }

    pub fn push(&mut self, axes: Axes) {
        self.push_sample(axes.x, axes.y, axes.z);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn frame_size(&self) -> usize {
        self.samples.len()
    }

    /// Readings pushed since construction. Below `frame_size / 3` the
    /// leading slots still hold the initial zeros.
    pub const fn readings_pushed(&self) -> u64 {
        self.pushed
    }
}

// ============================================================================
// Shared Handles
// ============================================================================

/// Create one window and split it into its single writer and single reader.
pub fn shared_window(frame_size: usize) -> Result<(WindowWriter, WindowReader), ConfigurationError> {
    let window = Arc::new(Mutex::new(SampleWindow::new(frame_size)?));
    Ok((
        WindowWriter {
            inner: Arc::clone(&window),
        },
        WindowReader { inner: window },
    ))
}

fn lock(inner: &Mutex<SampleWindow>) -> MutexGuard<'_, SampleWindow> {
    // A panic mid-push leaves at worst one partially written reading
    inner.lock().unwrap_or_else(|e| {
        warn!("Sample window mutex poisoned, recovering");
        e.into_inner()
    })
}

/// Ingestor side of the window.
#[derive(Debug)]
pub struct WindowWriter {
    inner: Arc<Mutex<SampleWindow>>,
}

impl WindowWriter {
    pub fn push_sample(&self, x: f32, y: f32, z: f32) {
        lock(&self.inner).push_sample(x, y, z);
    }

    pub fn push(&self, axes: Axes) {
        lock(&self.inner).push(axes);
    }
}

/// Engine side of the window.
#[derive(Debug)]
pub struct WindowReader {
    inner: Arc<Mutex<SampleWindow>>,
}

impl WindowReader {
    /// Copy the whole window into `out` under the lock. Returns readings pushed so far.
    ///
    /// `out` must be exactly `frame_size` long.
    pub fn snapshot_into(&self, out: &mut [f32]) -> u64 {
        let window = lock(&self.inner);
        out.copy_from_slice(window.as_slice());
        window.readings_pushed()
    }

    /// Owned copy of the window.
    pub fn snapshot(&self) -> Vec<f32> {
        lock(&self.inner).as_slice().to_vec()
    }

    pub fn frame_size(&self) -> usize {
        lock(&self.inner).frame_size()
    }
}
