//! Haptic feedback
//!
//! A short vibration pulse on a successful wave. Unsupported devices do nothing.

/// Fire-and-forget vibration
pub trait Haptics {
    fn pulse(&self, duration_ms: u32);
}

/// No vibration motor (tests, desktop)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHaptics;

impl Haptics for NullHaptics {
    fn pulse(&self, _duration_ms: u32) {}
}

/// Vibrates through `navigator.vibrate`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebHaptics;

#[cfg(target_arch = "wasm32")]
impl Haptics for WebHaptics {
    fn pulse(&self, duration_ms: u32) {
        if let Some(window) = web_sys::window() {
            // Returns false where vibration is unsupported or blocked
            let _ = window.navigator().vibrate_with_duration(duration_ms);
        }
    }
}
