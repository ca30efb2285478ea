//! In-memory OTP session state.

use crate::types::OtpChannel;
use std::time::Duration;
use tokio::time::Instant;

/// The verification currently awaiting a code.
///
/// Exactly one handle exists per pending verification, matching its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pending {
    /// Phone-auth backend issued a verification id for this number.
    Phone {
        verification_id: String,
        phone: String,
    },
    /// Locally generated code sent to this address.
    Email {
        code: String,
        issued_at: Instant,
        email: String,
    },
    /// Legacy vendor sent a code to this number.
    LegacySms { phone: String },
}

impl Pending {
    pub fn channel(&self) -> OtpChannel {
        match self {
            Pending::Phone { .. } => OtpChannel::PhoneSms,
            Pending::Email { .. } => OtpChannel::Email,
            Pending::LegacySms { .. } => OtpChannel::GenericSms,
        }
    }

    /// The normalized number or address the code went to.
    pub fn sent_to(&self) -> &str {
        match self {
            Pending::Phone { phone, .. } | Pending::LegacySms { phone } => phone,
            Pending::Email { email, .. } => email,
        }
    }
}

/// Per-coordinator session: the pending verification plus the SMS
/// rate-limit counter.
#[derive(Debug, Default)]
pub(crate) struct OtpSession {
    pending: Option<Pending>,
    attempt_count: u32,
    last_attempt_at: Option<Instant>,
}

impl OtpSession {
    pub fn channel(&self) -> Option<OtpChannel> {
        self.pending.as_ref().map(Pending::channel)
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    /// Replace whatever was pending.
    pub fn begin(&mut self, pending: Pending) {
        self.pending = Some(pending);
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Counted SMS failures, after dropping an elapsed window.
    pub fn attempt_count(&mut self, now: Instant, window: Duration) -> u32 {
        if let Some(last) = self.last_attempt_at {
            if now.saturating_duration_since(last) >= window {
                self.attempt_count = 0;
                self.last_attempt_at = None;
            }
        }
        self.attempt_count
    }

    /// Count one rate-limited SMS failure.
    pub fn record_rate_limited(&mut self, now: Instant) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.last_attempt_at = Some(now);
    }

    pub fn sms_exhausted(&mut self, max_attempts: u32, now: Instant, window: Duration) -> bool {
        self.attempt_count(now, window) >= max_attempts
    }

    pub fn remaining_attempts(&mut self, max_attempts: u32, now: Instant, window: Duration) -> u32 {
        max_attempts.saturating_sub(self.attempt_count(now, window))
    }

    /// Clear everything, counters included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3600);

    #[test]
    fn test_pending_channel() {
        let mut session = OtpSession::default();
        assert_eq!(session.channel(), None);

        session.begin(Pending::Phone {
            verification_id: "vid".into(),
            phone: "+919876543210".into(),
        });
        assert_eq!(session.channel(), Some(OtpChannel::PhoneSms));
        assert_eq!(session.pending().map(Pending::sent_to), Some("+919876543210"));

        // A new send replaces the previous handle
        session.begin(Pending::Email {
            code: "123456".into(),
            issued_at: Instant::now(),
            email: "a@b.com".into(),
        });
        assert_eq!(session.channel(), Some(OtpChannel::Email));
        assert_eq!(session.pending().map(Pending::sent_to), Some("a@b.com"));
        assert!(matches!(session.pending(), Some(Pending::Email { .. })));

        session.clear_pending();
        assert_eq!(session.channel(), None);
    }

    #[test]
    fn test_attempts_counted_within_window() {
        let mut session = OtpSession::default();
        let start = Instant::now();

        for _ in 0..3 {
            session.record_rate_limited(start);
        }

        assert!(session.sms_exhausted(3, start + Duration::from_secs(60), WINDOW));
        assert_eq!(session.remaining_attempts(3, start, WINDOW), 0);
    }

    #[test]
    fn test_attempts_reset_after_window() {
        let mut session = OtpSession::default();
        let start = Instant::now();

        session.record_rate_limited(start);
        session.record_rate_limited(start);
        assert_eq!(session.attempt_count(start, WINDOW), 2);

        let later = start + WINDOW;
        assert_eq!(session.attempt_count(later, WINDOW), 0);
        assert_eq!(session.remaining_attempts(3, later, WINDOW), 3);
    }

    #[test]
    fn test_window_measured_from_last_attempt() {
        let mut session = OtpSession::default();
        let start = Instant::now();

        session.record_rate_limited(start);
        session.record_rate_limited(start + Duration::from_secs(50 * 60));

        // 61 minutes after the first attempt, 11 after the last
        let now = start + Duration::from_secs(61 * 60);
        assert_eq!(session.attempt_count(now, WINDOW), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = OtpSession::default();
        let now = Instant::now();
        session.record_rate_limited(now);
        session.begin(Pending::LegacySms {
            phone: "+919876543210".into(),
        });

        session.reset();

        assert_eq!(session.channel(), None);
        assert_eq!(session.remaining_attempts(3, now, WINDOW), 3);
    }
}
