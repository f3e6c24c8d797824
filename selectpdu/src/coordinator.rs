//! Control coordination
//!
//! [`PowerUnit`] arbitrates between polling and control actions on one unit.
//! Device conversations are serialized through the device lock. After any
//! control action the unit gets a cooldown window during which polls are
//! answered from the snapshot alone, so the control connection is not
//! contended while outlets settle.
//!
//! Locks are always taken in the order device, then state. The state lock is
//! never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use selectpdu_core::{Session, SessionState, constants::DEFAULT_COOLDOWN_MS};
use selectpdu_types::{ProtocolStatus, Snapshot};

use crate::config::DeviceConfig;
use crate::control::{ControlAction, ControlOutcome, ControlRequest};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::reconcile;
use crate::scanner;
use crate::worker::ScanWorker;

struct MonitorState {
    snapshot: Snapshot,
    last_control: Option<Instant>,
    /// Failure of the last scan, reported by the next poll
    last_error: Option<Error>,
    cooldown: Duration,
}

impl MonitorState {
    fn in_cooldown(&self) -> bool {
        self.last_control
            .is_some_and(|stamp| stamp.elapsed() < self.cooldown)
    }

    fn stamp_control(&mut self) {
        self.last_control = Some(Instant::now());
    }
}

struct Shared {
    device: tokio::sync::Mutex<Device>,
    state: parking_lot::Mutex<MonitorState>,
    session: Session,
}

impl Shared {
    /// Background scan: refresh, scan, merge
    async fn scan(&self) {
        let mut device = self.device.lock().await;
        if self.state.lock().in_cooldown() {
            debug!("Control action finished while the scan waited, skipping it");
            return;
        }
        debug!("Retrieving outlet statistics");

        let result = refresh_and_scan(&mut device).await;

        {
            let mut state = self.state.lock();
            match result {
                Ok(inventory) => {
                    reconcile::apply_inventory(&mut state.snapshot, &inventory);
                    state.snapshot.set_protocol_status(ProtocolStatus::Available);
                    state.last_error = None;
                }
                Err(e) if e.is_connection_timeout() => {
                    warn!("Unable to connect to the unit, its control channel is occupied");
                    state.snapshot.set_protocol_status(ProtocolStatus::Unavailable);
                    state.snapshot.clear_controls();
                }
                Err(e) => {
                    if e.is_malformed_reply() {
                        warn!("Unit sent an unexpected reply: {}", e);
                    } else {
                        debug!("Scan failed: {}", e);
                    }
                    state.last_error = Some(e);
                }
            }
        }

        device.end_conversation().await;
    }

    async fn dispatch(
        &self,
        device: &mut Device,
        action: &ControlAction,
    ) -> Result<ControlOutcome> {
        device.refresh_session().await?;

        match action {
            ControlAction::SetOutlet {
                property,
                slot,
                state,
            } => {
                let actual = device.write_outlet(*slot, *state).await?;

                let mut monitor = self.state.lock();
                monitor.stamp_control();
                reconcile::apply_outlet_write(&mut monitor.snapshot, property, *state, actual);
                if actual == state.code() {
                    Ok(ControlOutcome::Applied)
                } else {
                    Ok(ControlOutcome::Rejected)
                }
            }
            ControlAction::Sequence(direction) => {
                let started = device.start_sequence(*direction).await?;

                let mut monitor = self.state.lock();
                monitor.stamp_control();
                if started {
                    reconcile::apply_sequence(&mut monitor.snapshot, *direction);
                    Ok(ControlOutcome::Applied)
                } else {
                    Ok(ControlOutcome::Rejected)
                }
            }
        }
    }
}

async fn refresh_and_scan(device: &mut Device) -> Result<selectpdu_types::Inventory> {
    device.refresh_session().await?;
    scanner::scan(device).await
}

/// One Select unit with its cached state
///
/// # Examples
///
/// ```no_run
/// use selectpdu::{Device, PowerUnit};
///
/// #[tokio::main]
/// async fn main() -> selectpdu::Result<()> {
///     let device = Device::new("192.168.1.50", 60000).with_credentials("user", "12345");
///     let unit = PowerUnit::new(device);
///
///     let snapshot = unit.statistics().await?;
///     println!("{:?}", snapshot.statistics());
///
///     unit.control_property("Sequence up", "").await?;
///     unit.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct PowerUnit {
    shared: Arc<Shared>,
    worker: ScanWorker,
}

impl PowerUnit {
    /// Wrap a device with the default cooldown
    pub fn new(device: Device) -> Self {
        let session = device.session().clone();

        Self {
            shared: Arc::new(Shared {
                device: tokio::sync::Mutex::new(device),
                state: parking_lot::Mutex::new(MonitorState {
                    snapshot: Snapshot::new(),
                    last_control: None,
                    last_error: None,
                    cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
                }),
                session,
            }),
            worker: ScanWorker::new(),
        }
    }

    /// Build the device and coordinator from configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(Device::from_config(config)).with_cooldown(config.cooldown())
    }

    /// Set how long polls are served from the snapshot after a control action
    pub fn with_cooldown(self, cooldown: Duration) -> Self {
        self.shared.state.lock().cooldown = cooldown;
        self
    }

    /// Check if polls are currently served from the snapshot
    pub fn in_cooldown(&self) -> bool {
        self.shared.state.lock().in_cooldown()
    }

    /// Current session state
    pub fn session_state(&self) -> SessionState {
        self.shared.session.state()
    }

    /// Check if a background scan is still talking to the unit
    pub async fn scan_in_progress(&self) -> bool {
        self.worker.is_busy().await
    }

    /// Copy of the snapshot, without touching the unit
    pub fn snapshot(&self) -> Snapshot {
        self.shared.state.lock().snapshot.clone()
    }

    /// Poll the unit
    ///
    /// Outside the cooldown window this starts a background scan and returns
    /// the snapshot as it was before the scan. If the previous scan failed,
    /// its error is returned instead, once.
    pub async fn statistics(&self) -> Result<Snapshot> {
        let (snapshot, error) = {
            let mut state = self.shared.state.lock();
            if state.in_cooldown() {
                debug!("Unit is occupied by control operations, skipping scan");
                return Ok(state.snapshot.clone());
            }
            (state.snapshot.clone(), state.last_error.take())
        };

        let shared = Arc::clone(&self.shared);
        self.worker.submit(async move { shared.scan().await }).await;

        match error {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    /// Apply one control request
    ///
    /// Unknown properties and values are ignored without talking to the
    /// unit. A running scan is cancelled before the device is locked, and a
    /// scan submitted while the control held the lock is cancelled after it
    /// is released. The connection is released whatever the outcome.
    pub async fn control_property(
        &self,
        property: &str,
        value: &str,
    ) -> Result<ControlOutcome> {
        let Some(action) = ControlAction::parse(property, value) else {
            debug!("Ignoring control '{}' = '{}'", property, value);
            return Ok(ControlOutcome::Ignored);
        };

        self.worker.shutdown().await;

        let result = {
            let mut device = self.shared.device.lock().await;
            let result = self.shared.dispatch(&mut device, &action).await;
            device.end_conversation().await;
            result
        };

        self.worker.shutdown().await;

        match &result {
            Ok(outcome) => info!("Control '{}' = '{}': {}", property, value, outcome),
            Err(e) => warn!("Control '{}' = '{}' failed: {}", property, value, e),
        }

        result
    }

    /// Apply control requests in order, stopping at the first error
    pub async fn control_properties(
        &self,
        requests: &[ControlRequest],
    ) -> Result<Vec<ControlOutcome>> {
        if requests.is_empty() {
            return Err(Error::InvalidArgument("no control requests given".into()));
        }

        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.control_property(&request.property, &request.value).await?);
        }
        Ok(outcomes)
    }

    /// Cancel any scan and release the connection
    pub async fn shutdown(&self) {
        self.worker.shutdown().await;
        self.shared.device.lock().await.end_conversation().await;
        info!("Unit shut down");
    }

    #[cfg(test)]
    async fn settle(&self) {
        self.worker.settle().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePdu;
    use pretty_assertions::assert_eq;
    use selectpdu_core::ErrorReply;
    use selectpdu_types::naming::{SEQUENCE_DOWN, SEQUENCE_UP};

    fn unit(pdu: &FakePdu) -> PowerUnit {
        PowerUnit::new(Device::with_transport(pdu.clone()).with_credentials("user", "12345"))
    }

    /// Poll once and wait for the scan to land
    async fn scanned(unit: &PowerUnit) {
        unit.statistics().await.unwrap();
        unit.settle().await;
    }

    fn rack() -> FakePdu {
        FakePdu::new()
            .with_outlet(0x43, "A", false)
            .with_outlet(0x58, "", false)
            .with_outlet(0x4E, "B", true)
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_snapshot_before_scan() {
        let pdu = rack();
        let unit = unit(&pdu);

        let first = unit.statistics().await.unwrap();
        assert!(first.statistics().is_empty());
        unit.settle().await;

        let second = unit.statistics().await.unwrap();
        assert_eq!(second.statistic("Controllable outlets#A - 1"), Some("0"));
        assert_eq!(second.statistic("B - 3"), Some("On"));
        assert_eq!(second.statistic("ControlProtocolStatus"), Some("AVAILABLE"));
        assert_eq!(second.statistic(SEQUENCE_UP), Some(""));
        assert!(second.statistic(SEQUENCE_DOWN).is_none());
        assert_eq!(second.statistics().len(), 4);
        assert_eq!(unit.session_state(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_serves_snapshot() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;

        let outcome = unit.control_property("Controllable outlets#A - 1", "1").await.unwrap();
        assert_eq!(outcome, ControlOutcome::Applied);
        assert!(unit.in_cooldown());
        pdu.clear_sent();

        let during = unit.statistics().await.unwrap();
        unit.settle().await;
        let again = unit.statistics().await.unwrap();

        assert_eq!(during, again);
        assert_eq!(during.statistic("Controllable outlets#A - 1"), Some("1"));
        assert!(pdu.sent().is_empty());

        tokio::time::advance(Duration::from_millis(5001)).await;
        assert!(!unit.in_cooldown());

        scanned(&unit).await;
        assert!(!pdu.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescan_picks_up_external_change() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;

        pdu.set_outlet_on(1, true);
        scanned(&unit).await;

        let snapshot = unit.snapshot();
        assert_eq!(snapshot.statistic("Controllable outlets#A - 1"), Some("1"));
        assert_eq!(snapshot.control("Controllable outlets#A - 1").unwrap().value, "1");
        assert!(snapshot.control(SEQUENCE_UP).is_none());
        assert!(snapshot.control(SEQUENCE_DOWN).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_cooldown() {
        let pdu = rack();
        let unit = unit(&pdu).with_cooldown(Duration::from_millis(100));
        scanned(&unit).await;

        unit.control_property("A - 1", "1").await.unwrap();
        assert!(unit.in_cooldown());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!unit.in_cooldown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_reconciles_snapshot() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;

        let outcome = unit.control_property("A - 1", "1").await.unwrap();

        assert_eq!(outcome, ControlOutcome::Applied);
        assert!(pdu.outlet_on(1));
        let snapshot = unit.snapshot();
        assert_eq!(snapshot.statistic("Controllable outlets#A - 1"), Some("1"));
        assert_eq!(snapshot.control("Controllable outlets#A - 1").unwrap().value, "1");
        assert_eq!(snapshot.control(SEQUENCE_DOWN).map(|c| c.is_button()), Some(true));
        assert!(snapshot.control(SEQUENCE_UP).is_none());
        assert_eq!(unit.session_state(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_write_is_rejected() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;
        let before = unit.snapshot();

        // Slot 3 is fixed: the unit answers "not controllable"
        let outcome = unit.control_property("B - 3", "0").await.unwrap();

        assert_eq!(outcome, ControlOutcome::Rejected);
        assert_eq!(unit.snapshot(), before);
        assert!(unit.in_cooldown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_up() {
        let pdu = FakePdu::new()
            .with_outlet(0x43, "A", false)
            .with_outlet(0x43, "B", false);
        let unit = unit(&pdu);
        scanned(&unit).await;

        let outcome = unit.control_property(SEQUENCE_UP, "").await.unwrap();

        assert_eq!(outcome, ControlOutcome::Applied);
        let snapshot = unit.snapshot();
        assert_eq!(snapshot.statistic("Controllable outlets#A - 1"), Some("1"));
        assert_eq!(snapshot.statistic("Controllable outlets#B - 2"), Some("1"));
        assert!(snapshot.control(SEQUENCE_UP).is_none());
        assert!(snapshot.control(SEQUENCE_DOWN).is_some());
        assert!(pdu.outlet_on(1) && pdu.outlet_on(2));
        assert_eq!(
            pdu.sent().last().unwrap(),
            &vec![0xFE, 0x08, 0x00, 0x36, 0x01, 0x01, 0x30, 0x30, 0x30, 0x30, 0x7E, 0xFF]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_login_stops_control() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;
        let before = unit.snapshot();

        pdu.set_accept_login(false);
        pdu.clear_sent();
        let err = unit.control_property("A - 1", "1").await.unwrap_err();

        assert!(err.is_session_error());
        assert!(pdu.sent().iter().all(|frame| frame[3] != 0x20));
        assert_eq!(unit.snapshot(), before);
        assert!(!unit.in_cooldown());
        assert!(!pdu.outlet_on(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_error_reply_fails_control() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;
        let before = unit.snapshot();

        // The login goes through, the write is refused
        pdu.reject_next(0x20, ErrorReply::DataBytesInvalid);
        let err = unit.control_property("A - 1", "1").await.unwrap_err();

        assert!(matches!(
            err,
            Error::Transport(selectpdu_transport::Error::CommandFailed(
                ErrorReply::DataBytesInvalid
            ))
        ));
        assert_eq!(unit.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_timeout_marks_unavailable() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;
        assert!(!unit.snapshot().controls().is_empty());

        pdu.set_connect_timeout(true);
        scanned(&unit).await;

        // Not raised, only reported
        let snapshot = unit.statistics().await.unwrap();
        assert_eq!(snapshot.protocol_status(), Some(ProtocolStatus::Unavailable));
        assert!(snapshot.controls().is_empty());
        assert_eq!(snapshot.statistic("B - 3"), Some("On"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_error_is_reported_once() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;

        pdu.set_accept_login(false);
        scanned(&unit).await;

        pdu.set_accept_login(true);
        let err = unit.statistics().await.unwrap_err();
        assert!(matches!(err, Error::LoginRejected { .. }));
        unit.settle().await;

        let snapshot = unit.statistics().await.unwrap();
        assert_eq!(snapshot.protocol_status(), Some(ProtocolStatus::Available));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_control_sends_nothing() {
        let pdu = rack();
        let unit = unit(&pdu);

        assert_eq!(unit.control_property("Reboot", "1").await.unwrap(), ControlOutcome::Ignored);
        assert_eq!(unit.control_property("A - 1", "on").await.unwrap(), ControlOutcome::Ignored);
        assert!(pdu.sent().is_empty());
        assert_eq!(pdu.connect_count(), 0);
        assert!(!unit.in_cooldown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_properties() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;

        assert!(matches!(
            unit.control_properties(&[]).await,
            Err(Error::InvalidArgument(_))
        ));

        let outcomes = unit
            .control_properties(&[
                ControlRequest::new("A - 1", "1"),
                ControlRequest::new("Unknown", "1"),
                ControlRequest::new("A - 1", "0"),
            ])
            .await
            .unwrap();

        assert_eq!(
            outcomes,
            vec![ControlOutcome::Applied, ControlOutcome::Ignored, ControlOutcome::Applied]
        );
        assert!(!pdu.outlet_on(1));
        assert_eq!(unit.snapshot().statistic("Controllable outlets#A - 1"), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_cancels_running_scan() {
        let pdu = rack();
        let unit = unit(&pdu);

        pdu.set_stall(true);
        unit.statistics().await.unwrap();
        while pdu.sent().is_empty() {
            tokio::task::yield_now().await;
        }
        pdu.set_stall(false);

        let outcome = unit.control_property("A - 1", "1").await.unwrap();

        assert_eq!(outcome, ControlOutcome::Applied);
        assert_eq!(pdu.connect_count(), 2);
        assert_eq!(unit.session_state(), SessionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_during_control_does_not_scan_in_cooldown() {
        let pdu = rack();
        let unit = Arc::new(unit(&pdu));

        // Stand in for a control conversation that is still running
        let busy = unit.shared.device.lock().await;

        let control = tokio::spawn({
            let unit = Arc::clone(&unit);
            async move { unit.control_property("A - 1", "1").await }
        });
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        unit.statistics().await.unwrap();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        drop(busy);
        let outcome = control.await.unwrap().unwrap();
        unit.settle().await;

        assert_eq!(outcome, ControlOutcome::Applied);
        assert!(unit.in_cooldown());
        let commands: Vec<u8> = pdu.sent().iter().map(|frame| frame[3]).collect();
        assert_eq!(commands, vec![0x02, 0x20]);
        assert!(!pdu.connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_scan_skips_during_cooldown() {
        let pdu = rack();
        let unit = unit(&pdu);
        unit.shared.state.lock().stamp_control();

        unit.shared.scan().await;

        assert!(pdu.sent().is_empty());
        assert_eq!(pdu.connect_count(), 0);
        assert!(unit.snapshot().statistics().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_to_unknown_name_leaves_snapshot() {
        let pdu = rack();
        let unit = unit(&pdu);
        scanned(&unit).await;
        let before = unit.snapshot();

        let outcome = unit.control_property("Typo - 1", "1").await.unwrap();

        assert_eq!(outcome, ControlOutcome::Applied);
        assert!(pdu.outlet_on(1));
        assert_eq!(unit.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_connection() {
        let pdu = rack();
        let unit = unit(&pdu);

        pdu.set_stall(true);
        unit.statistics().await.unwrap();
        while pdu.sent().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(unit.scan_in_progress().await);

        unit.shutdown().await;

        assert!(!unit.scan_in_progress().await);
        assert_eq!(unit.session_state(), SessionState::Disconnected);
        assert!(!pdu.connected());
    }
}
