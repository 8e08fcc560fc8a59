//! Error types for the notification bridge

/// Failure reported by a handler while processing a notification.
///
/// Handler failures never reach the producer: the dispatcher logs them with
/// the owning listener's name and moves on to the next binding.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Handler reported a failure of its own
    #[error("Handler execution failed: {0}")]
    Execution(String),

    /// Handler panicked while running
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// A binding received a notification of a different type than it was bound to
    #[error("Handler bound to {expected} received a different notification type")]
    TypeMismatch { expected: &'static str },

    /// Handler tried to cancel a notification that cannot be cancelled
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// Any other error raised by handler code
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for HandlerError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        HandlerError::Other(err)
    }
}

impl HandlerError {
    /// Convenience constructor for ad-hoc failures
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Execution(message.into())
    }

    /// Converts a panic payload into a structured error
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        HandlerError::Panicked(message)
    }
}

/// Errors raised by the notification model itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    /// Attempted to change the cancelled state of a notification that cannot be cancelled
    #[error("Notification {0} is not cancellable")]
    NotCancellable(&'static str),
}

/// Result type returned by every handler
pub type HandlerResult = Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let from_str = HandlerError::from_panic(Box::new("boom"));
        assert_eq!(from_str.to_string(), "Handler panicked: boom");

        let from_string = HandlerError::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(from_string.to_string(), "Handler panicked: kaboom");

        let opaque = HandlerError::from_panic(Box::new(42_u32));
        assert!(matches!(opaque, HandlerError::Panicked(ref m) if m == "unknown panic payload"));
    }

    #[test]
    fn boxed_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(io);
        let err: HandlerError = boxed.into();
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn notification_errors_pass_through() {
        let err: HandlerError = NotificationError::NotCancellable("ServerTick").into();
        assert_eq!(err.to_string(), "Notification ServerTick is not cancellable");
    }
}
