use std::{
    alloc::{GlobalAlloc, Layout, System},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// A [`GlobalAlloc`] that tracks the peak number of bytes allocated while it is enabled.
///
/// Only allocations made while the tracking is enabled are counted, so memory that was already
/// allocated before [`PeakAllocator::enable`] does not show up in [`PeakAllocator::peak`]. Frees of
/// such memory are clamped at zero.
pub struct PeakAllocator {
    enabled: AtomicBool,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl PeakAllocator {
    /// Returns a new disabled [`PeakAllocator`].
    pub const fn new() -> Self {
        PeakAllocator {
            enabled: AtomicBool::new(false),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Enable the peak memory tracking.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable the peak memory tracking.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Whether the peak memory tracking is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Resets the current and peak memory allocation trackers.
    pub fn reset(&self) {
        self.current.store(0, Ordering::Relaxed);
        self.peak.store(0, Ordering::Relaxed);
    }

    /// Get the peak memory consumption since the last reset.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// Runs `f` with fresh tracking and returns its result together with the peak allocation.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> (T, usize) {
        self.reset();
        self.enable();
        let result = f();
        self.disable();
        (result, self.peak())
    }
}

/// Delegate allocations to the [`System`] allocator while tracking the peak allocation.
unsafe impl GlobalAlloc for PeakAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // Safety: We forward the layout to the system allocator. The requirements are guaranteed by our caller.
        let ret = unsafe { System.alloc(layout) };
        if !ret.is_null() && self.is_enabled() {
            let prev = self.current.fetch_add(layout.size(), Ordering::Relaxed);
            self.peak.fetch_max(prev + layout.size(), Ordering::Relaxed);
        }
        ret
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // Safety: We simply forward ptr and layout to the System allocator
        unsafe {
            System.dealloc(ptr, layout);
        }
        if self.is_enabled() {
            // the closure never returns None, so the update cannot fail
            let _ = self
                .current
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |val| {
                    Some(val.saturating_sub(layout.size()))
                });
        }
    }
}

impl Default for PeakAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale the memory in bytes depending on its size and return the scaled value plus unit.
pub fn scale_memory(bytes: f64) -> (f64, &'static str) {
    if bytes < 1_000.0 {
        (1.0, " B")
    } else if bytes < 1_000.0_f64.powi(2) {
        (1_000.0, " KB")
    } else if bytes < 1_000.0_f64.powi(3) {
        (1_000.0_f64.powi(2), " MB")
    } else {
        (1_000.0_f64.powi(3), " GB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_the_largest_fitting_unit() {
        assert_eq!(scale_memory(999.0), (1.0, " B"));
        assert_eq!(scale_memory(1_500.0), (1_000.0, " KB"));
        assert_eq!(scale_memory(2_000_000.0), (1_000_000.0, " MB"));
        assert_eq!(scale_memory(3e9), (1e9, " GB"));
    }
}
