//! # Tracker Control Loop
//!
//! Ties the receiver, scheduler, publisher and indicator together. Two
//! states only: `Connecting` retries the mobile link forever with no
//! backoff, then `Tracking` loops every tick until power-off — there is no
//! shutdown state and no error escapes a tick.
//!
//! Tick order matters: the serial line is drained first, unconditionally,
//! before any blocking network work, because buffered GPS bytes overflow if
//! they sit. Sentences arriving during a heartbeat POST are lost; accepted,
//! heartbeats are periodic anyway.

use tracing::{debug, info, warn};

use crate::gps::{poll_update, GpsUpdate, Receiver};
use crate::heartbeat::HeartbeatTimer;
use crate::indicator::{Lamp, StatusIndicator};
use crate::telemetry::{publish, Credentials, Transport, APN_CREDENTIALS};

/// Control-loop states. `Tracking` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Connecting,
    Tracking,
}

/// The main control loop, exclusive owner of all collaborator handles
pub struct Tracker<R, T, I> {
    receiver: R,
    transport: T,
    indicator: I,
    timer: HeartbeatTimer,
    credentials: Credentials,
    state: TrackerState,
}

impl<R, T, I> Tracker<R, T, I>
where
    R: Receiver,
    T: Transport,
    I: StatusIndicator,
{
    pub fn new(receiver: R, transport: T, indicator: I) -> Self {
        Self {
            receiver,
            transport,
            indicator,
            timer: HeartbeatTimer::start(),
            credentials: APN_CREDENTIALS,
            state: TrackerState::Connecting,
        }
    }

    /// Current control-loop state
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// `Connecting`: attempt the mobile link until it comes up.
    ///
    /// No backoff, no attempt cap; the device cannot do anything useful
    /// without the link and there is no alternate path.
    pub async fn connect(&mut self) {
        loop {
            info!("Connecting to mobile network...");
            match self.transport.connect(&self.credentials).await {
                Ok(()) => break,
                Err(e) => warn!("Could not connect, retrying: {}", e),
            }
        }

        info!("Connected!");
        self.indicator.set(Lamp::NetworkLink, true);
        self.state = TrackerState::Tracking;
        // Tracking time starts now; however long the link took to come up
        // must not count toward the first heartbeat.
        self.timer.reset();
    }

    /// One `Tracking` iteration
    pub async fn tick(&mut self) {
        self.receiver.drain().await;
        let update = poll_update(&mut self.receiver);

        match &update {
            GpsUpdate::Fix(report) => {
                info!("GPS update @ {}", report);
                self.indicator.set(Lamp::FixAcquired, true);
            }
            GpsUpdate::NoFix(timestamp) => {
                debug!("GPS not yet found fix @ {}", timestamp);
                self.indicator.set(Lamp::FixAcquired, false);
            }
            GpsUpdate::None => {}
        }

        match update {
            GpsUpdate::Fix(report) if self.timer.is_due(true) => {
                self.indicator.set(Lamp::HeartbeatInFlight, true);

                match publish(&mut self.transport, &report).await {
                    Ok(bytes) => {
                        info!("Executed POST successfully - read {} bytes", bytes);
                        self.indicator.set(Lamp::TxError, false);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        self.indicator.set(Lamp::TxError, true);
                    }
                }

                // Reset on attempt, not on success: caps attempts at one per
                // period whatever the network did.
                self.timer.reset();
            }
            _ => {
                if self.timer.decay_due() {
                    self.indicator.set(Lamp::HeartbeatInFlight, false);
                    self.indicator.set(Lamp::TxError, false);
                }
            }
        }
    }

    /// Run forever: connect, then tick until power-off
    pub async fn run(&mut self) {
        self.connect().await;
        loop {
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::receiver::mocks::MockReceiver;
    use crate::heartbeat::HEARTBEAT_PERIOD_S;
    use crate::indicator::mocks::MockIndicator;
    use crate::telemetry::transport::mocks::MockTransport;
    use crate::telemetry::TransportError;
    use tokio::time::{advance, Duration};

    const RMC_FIX: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const RMC_NO_FIX: &str = "$GPRMC,081836,V,,,,,,,130998,,*3F";

    fn tracker() -> Tracker<MockReceiver, MockTransport, MockIndicator> {
        Tracker::new(MockReceiver::new(), MockTransport::new(), MockIndicator::new())
    }

    fn period() -> Duration {
        Duration::from_secs(HEARTBEAT_PERIOD_S)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retries_until_success() {
        let mut t = tracker();
        t.transport.fail_connects(3);

        assert_eq!(t.state(), TrackerState::Connecting);
        t.connect().await;

        assert_eq!(t.state(), TrackerState::Tracking);
        assert_eq!(
            t.transport.connect_calls, 4,
            "3 failures then the successful attempt"
        );
        assert!(t.indicator.is_lit(Lamp::NetworkLink));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connecting_time_does_not_count_toward_heartbeat() {
        let mut t = tracker();
        // The link takes a long time to come up
        advance(period() * 3).await;
        t.connect().await;

        // First valid fix right after connect: period has NOT elapsed in
        // Tracking terms, so no heartbeat
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;

        assert!(t.transport.posts.is_empty());
        assert!(t.indicator.is_lit(Lamp::FixAcquired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ticks_change_nothing() {
        let mut t = tracker();
        t.connect().await;
        t.receiver.push_idle(3);

        for _ in 0..3 {
            t.tick().await;
        }

        assert!(t.transport.posts.is_empty());
        assert!(!t.indicator.is_lit(Lamp::FixAcquired));
        assert_eq!(t.receiver.parse_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_sentence_leaves_indicator_unchanged() {
        let mut t = tracker();
        t.connect().await;

        // Establish a fix first
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert!(t.indicator.is_lit(Lamp::FixAcquired));
        let history_len = t.indicator.history.len();

        // A corrupted sentence is a "no update" tick
        t.receiver.push_sentence("$GPRMC,123519,A,junk*00");
        t.tick().await;

        assert!(t.indicator.is_lit(Lamp::FixAcquired), "lamp must persist");
        assert_eq!(
            t.indicator.history.len(),
            history_len,
            "no lamp transitions on a failed-parse tick"
        );
        assert!(t.transport.posts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_fires_when_due_with_fix() {
        let mut t = tracker();
        t.connect().await;
        advance(period()).await;

        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;

        assert_eq!(t.transport.posts.len(), 1);
        assert!(t.indicator.is_lit(Lamp::HeartbeatInFlight));
        assert!(!t.indicator.is_lit(Lamp::TxError));

        let (_, form) = &t.transport.posts[0];
        assert_eq!(form[0].0, "location");
        assert_eq!(form[0].1, "48.1173N, 11.5167E");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_without_elapsed_period() {
        let mut t = tracker();
        t.connect().await;
        advance(period() - Duration::from_secs(1)).await;

        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;

        assert!(t.transport.posts.is_empty(), "9s is under the period");
        assert!(t.indicator.is_lit(Lamp::FixAcquired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixless_ticks_never_fire_even_when_due() {
        let mut t = tracker();
        t.connect().await;
        advance(period() * 2).await;

        t.receiver.push_sentence(RMC_NO_FIX);
        t.tick().await;

        assert!(t.transport.posts.is_empty());
        assert!(!t.indicator.is_lit(Lamp::FixAcquired), "fix lamp cleared");
        // Elapsed keeps accumulating: the next valid fix fires immediately
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert_eq!(t.transport.posts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nine_fixless_ticks_then_fix_fires_exactly_once() {
        let mut t = tracker();
        t.connect().await;

        for _ in 0..9 {
            t.receiver.push_sentence(RMC_NO_FIX);
        }
        t.receiver.push_sentence(RMC_FIX);

        for _ in 0..9 {
            t.tick().await;
            advance(Duration::from_secs(1)).await;
        }
        // elapsed is now 9s... one more second makes the period
        advance(Duration::from_secs(1)).await;
        t.tick().await;

        assert_eq!(t.transport.posts.len(), 1, "exactly one heartbeat");
        // And it used that tick's report
        let (_, form) = &t.transport.posts[0];
        assert_eq!(form[0].1, "48.1173N, 11.5167E");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_sets_error_lamp_and_resets_timer() {
        let mut t = tracker();
        t.connect().await;
        t.transport.fail_next_post(TransportError::Post {
            code: 2,
            status: 500,
        });
        advance(period()).await;

        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;

        assert_eq!(t.transport.posts.len(), 1);
        assert!(t.indicator.is_lit(Lamp::TxError), "error indicator set");

        // No immediate retry: the very next valid fix is under the period
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert_eq!(t.transport.posts.len(), 1, "timer was reset on the attempt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_success_clears_error_lamp() {
        let mut t = tracker();
        t.connect().await;

        // First cycle fails
        t.transport.fail_next_post(TransportError::PostNoResponse { code: 1 });
        advance(period()).await;
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert!(t.indicator.is_lit(Lamp::TxError));

        // Next cycle succeeds
        t.transport.respond_with("{}");
        advance(period()).await;
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;

        assert_eq!(t.transport.posts.len(), 2);
        assert!(!t.indicator.is_lit(Lamp::TxError), "success clears the error");
        assert!(t.indicator.is_lit(Lamp::HeartbeatInFlight));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_lamps_decay_after_one_second() {
        let mut t = tracker();
        t.connect().await;

        // Fire a heartbeat so the transient lamps are lit
        advance(period()).await;
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert!(t.indicator.is_lit(Lamp::HeartbeatInFlight));

        // Under a second: idle tick leaves them alone
        t.receiver.push_idle(1);
        t.tick().await;
        assert!(t.indicator.is_lit(Lamp::HeartbeatInFlight));

        // A second after the attempt they decay, fix or no fix
        advance(Duration::from_secs(1)).await;
        t.receiver.push_idle(1);
        t.tick().await;
        assert!(!t.indicator.is_lit(Lamp::HeartbeatInFlight));
        assert!(!t.indicator.is_lit(Lamp::TxError));
        // The persistent lamps are untouched by the decay
        assert!(t.indicator.is_lit(Lamp::NetworkLink));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_runs_every_tick_before_anything_else() {
        let mut t = tracker();
        t.connect().await;
        t.receiver.push_idle(4);

        for _ in 0..4 {
            t.tick().await;
        }
        assert_eq!(t.receiver.drain_calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fix_report_produced_iff_parse_and_fix_flag() {
        let mut t = tracker();
        t.connect().await;

        // Parsed, fix flag false: fix lamp cleared, nothing sent
        t.receiver.push_sentence(RMC_NO_FIX);
        t.tick().await;
        assert!(!t.indicator.is_lit(Lamp::FixAcquired));

        // Parsed, fix flag true: fix lamp set
        t.receiver.push_sentence(RMC_FIX);
        t.tick().await;
        assert!(t.indicator.is_lit(Lamp::FixAcquired));
    }
}
