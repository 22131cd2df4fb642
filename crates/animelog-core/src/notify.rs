//! Transient user notifications.

/// Shows short-lived messages to the user.
pub trait Notifier: Send + Sync {
    fn notice(&self, message: &str);
}

#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingNotifier;

#[cfg(any(test, feature = "test-util"))]
mod recording {
    use std::sync::Mutex;

    use super::Notifier;

    /// Keeps every notice, for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        notices: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn notices(&self) -> Vec<String> {
            self.notices.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notice(&self, message: &str) {
            self.notices.lock().unwrap().push(message.to_string());
        }
    }
}
