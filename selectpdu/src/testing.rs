//! Scripted in-memory unit for tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;
use selectpdu_core::{
    Command, ErrorReply, Frame, Subcommand,
    constants::{ZERO_DELAY_FIELD, slot_codes},
};
use selectpdu_transport::{Error, Result, Transport};

struct FakeOutlet {
    code: u8,
    name: String,
    on: bool,
}

struct PduState {
    outlets: Vec<FakeOutlet>,
    accept_login: bool,
    ping_alive: bool,
    connect_timeout: bool,
    stall: bool,
    reject: Option<(u8, ErrorReply)>,
    connected: bool,
    pending: Option<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    logins: u32,
    connects: u32,
}

impl Default for PduState {
    fn default() -> Self {
        Self {
            outlets: Vec::new(),
            accept_login: true,
            ping_alive: true,
            connect_timeout: false,
            stall: false,
            reject: None,
            connected: false,
            pending: None,
            sent: Vec::new(),
            logins: 0,
            connects: 0,
        }
    }
}

impl PduState {
    fn outlet_mut(&mut self, slot: u8) -> Option<&mut FakeOutlet> {
        self.outlets.get_mut(usize::from(slot).checked_sub(1)?)
    }

    fn respond(&mut self, request: &[u8]) -> Vec<u8> {
        let command = request[3];
        let subcommand = request[4];

        if let Some((rejected, error)) = self.reject {
            if rejected == command {
                self.reject = None;
                return error.frame().to_vec();
            }
        }

        let frame = match (command, subcommand) {
            (0x01, _) if self.ping_alive => Frame::new(Command::Ping, Subcommand::Set),
            (0x01, _) => Frame::new(Command::Ping, Subcommand::Response),
            (0x02, _) => {
                self.logins += 1;
                reply(Command::Login, vec![u8::from(self.accept_login)])
            }
            (0x22, _) => reply(
                Command::BulkOutletStatus,
                self.outlets.iter().map(|o| o.code).collect(),
            ),
            (0x21, _) => {
                let slot = request[5];
                let mut payload = vec![slot];
                if let Some(outlet) = self.outlet_mut(slot) {
                    payload.extend_from_slice(outlet.name.as_bytes());
                }
                reply(Command::OutletName, payload)
            }
            (0x20, 0x02) => {
                let slot = request[5];
                let on = self.outlet_mut(slot).is_some_and(|o| o.on);
                reply(Command::PowerOutlet, outlet_payload(slot, u8::from(on)))
            }
            (0x20, _) => {
                let slot = request[5];
                let requested = request[6];
                let actual = match self.outlet_mut(slot) {
                    Some(outlet) if outlet.code == slot_codes::CONTROLLABLE => {
                        outlet.on = requested == 0x01;
                        requested
                    }
                    _ => 0x03,
                };
                reply(Command::PowerOutlet, outlet_payload(slot, actual))
            }
            (0x36, _) => {
                let on = request[5] == 0x01;
                for outlet in &mut self.outlets {
                    if outlet.code == slot_codes::CONTROLLABLE {
                        outlet.on = on;
                    }
                }
                reply(Command::PowerSequence, vec![0x01])
            }
            _ => return ErrorReply::PreviousCommandInvalid.frame().to_vec(),
        };

        frame.encode().to_vec()
    }
}

fn reply(command: Command, payload: Vec<u8>) -> Frame {
    Frame::with_payload(command, Subcommand::Response, payload).unwrap()
}

fn outlet_payload(slot: u8, state: u8) -> Vec<u8> {
    let mut payload = vec![slot, state];
    payload.extend_from_slice(&ZERO_DELAY_FIELD);
    payload
}

/// In-memory Select unit
///
/// Clones share the same unit, so a test keeps one handle for inspection
/// while the device owns another as its transport. Slots are numbered in the
/// order outlets are added.
#[derive(Clone, Default)]
pub struct FakePdu {
    state: Arc<Mutex<PduState>>,
}

impl FakePdu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next slot
    pub fn with_outlet(self, code: u8, name: &str, on: bool) -> Self {
        self.state.lock().outlets.push(FakeOutlet {
            code,
            name: name.to_string(),
            on,
        });
        self
    }

    pub fn set_accept_login(&self, accept: bool) {
        self.state.lock().accept_login = accept;
    }

    pub fn set_ping_alive(&self, alive: bool) {
        self.state.lock().ping_alive = alive;
    }

    pub fn set_connect_timeout(&self, timeout: bool) {
        self.state.lock().connect_timeout = timeout;
    }

    /// Never answer while set
    pub fn set_stall(&self, stall: bool) {
        self.state.lock().stall = stall;
    }

    /// Answer the next request carrying `command` with an error frame
    pub fn reject_next(&self, command: u8, error: ErrorReply) {
        self.state.lock().reject = Some((command, error));
    }

    /// Change an outlet behind the driver's back
    pub fn set_outlet_on(&self, slot: u8, on: bool) {
        if let Some(outlet) = self.state.lock().outlet_mut(slot) {
            outlet.on = on;
        }
    }

    pub fn outlet_on(&self, slot: u8) -> bool {
        self.state.lock().outlet_mut(slot).is_some_and(|o| o.on)
    }

    /// Every frame received so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Login frames received
    pub fn login_count(&self) -> u32 {
        self.state.lock().logins
    }

    pub fn connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn connect_count(&self) -> u32 {
        self.state.lock().connects
    }
}

#[async_trait]
impl Transport for FakePdu {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.connect_timeout {
            return Err(Error::ConnectionTimeout);
        }
        if state.connected {
            return Err(Error::AlreadyConnected);
        }
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.connected = false;
        state.pending = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.sent.push(data.to_vec());
        let response = state.respond(data);
        state.pending = Some(response);
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> Result<BytesMut> {
        let stall = self.state.lock().stall;
        if stall {
            std::future::pending::<()>().await;
        }

        let pending = self.state.lock().pending.take();
        pending.map(|reply| BytesMut::from(&reply[..])).ok_or(Error::ReadTimeout)
    }

    fn remote_addr(&self) -> String {
        "fake-pdu:60000".to_string()
    }
}
