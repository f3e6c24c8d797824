//! High-level device interface

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use selectpdu_core::{
    LoginOutcome, OutletState, SequenceDirection, Session, SlotStatus,
    catalog,
    constants::DEFAULT_READ_TIMEOUT_MS,
    frame::{Frame, Reply},
};
use selectpdu_transport::{TcpTransport, Transport};

use crate::config::DeviceConfig;
use crate::error::{Error, Result};

/// Middle Atlantic Select unit
///
/// Owns the transport and the session. Every device conversation is
/// bracketed by [`Device::refresh_session`] and [`Device::end_conversation`]:
/// the unit only serves one control connection at a time, so the socket is
/// released as soon as a conversation finishes.
///
/// # Examples
///
/// ```no_run
/// use selectpdu::Device;
///
/// #[tokio::main]
/// async fn main() -> selectpdu::Result<()> {
///     let mut device = Device::new("192.168.1.50", 60000).with_credentials("user", "12345");
///
///     device.refresh_session().await?;
///     let statuses = device.read_slot_statuses().await?;
///     println!("{} slots", statuses.len());
///
///     device.end_conversation().await;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    session: Session,
    timeout: Duration,
    login: String,
    password: String,
    /// A conversation started and has not been ended yet
    conversation_open: bool,
}

impl Device {
    /// Create a new device instance (TCP transport)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(TcpTransport::new(host, port))
    }

    /// Create a device from configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        let transport = TcpTransport::new(config.host.clone(), config.port)
            .with_connect_timeout(config.connect_timeout());

        Self::with_transport(transport)
            .with_credentials(config.login.clone(), config.password.clone())
            .with_timeout(config.read_timeout())
    }

    /// Create a device over any transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            session: Session::new(),
            timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            login: String::new(),
            password: String::new(),
            conversation_open: false,
        }
    }

    /// Set login credentials
    pub fn with_credentials(
        mut self,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.login = login.into();
        self.password = password.into();
        self
    }

    /// Set reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Session handle, shared with observers
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected() && self.transport.is_connected()
    }

    /// Open the socket if it is not open yet
    async fn ensure_connected(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            return Ok(());
        }

        // Transport dropped the socket on its own
        self.session.close();

        info!("Connecting to {}...", self.transport.remote_addr());
        self.transport.connect().await?;
        self.session.open()?;

        Ok(())
    }

    /// Send a frame and wrap the reply
    async fn exchange(&mut self, frame: &Frame) -> Result<Reply> {
        self.ensure_connected().await?;

        let data = frame.encode();
        trace!("-> {} {}", frame.command, hex::encode(&data));

        let raw = self.transport.request(&data, self.timeout).await?;
        let reply = Reply::decode(raw.freeze());

        trace!("<- {:?}", reply);

        if let Err(e) = reply.verify_checksum() {
            warn!("{} reply: {}", frame.command, e);
        }

        Ok(reply)
    }

    /// Close the socket
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.transport.is_connected() {
            self.session.close();
            return Ok(());
        }

        debug!("Disconnecting from {}...", self.transport.remote_addr());

        let result = self.transport.disconnect().await;
        self.session.close();

        result.map_err(Error::from)
    }

    /// Liveness check
    ///
    /// Without an open socket the unit counts as "not alive" and nothing is sent.
    pub async fn ping(&mut self) -> Result<bool> {
        if !self.transport.is_connected() {
            debug!("Socket connection is not active");
            return Ok(false);
        }

        let reply = self.exchange(&catalog::ping()).await?;
        Ok(catalog::parse_ping(&reply)?)
    }

    /// Log in on a fresh socket
    pub async fn login(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            self.disconnect().await?;
        }

        let frame = catalog::login(&self.login, &self.password)?;
        let reply = self.exchange(&frame).await?;

        match catalog::parse_login(&reply)? {
            LoginOutcome::Accepted => {
                self.session.authenticate()?;
                info!("Logged in to {} as '{}'", self.transport.remote_addr(), self.login);
                Ok(())
            }
            LoginOutcome::Rejected(code) => {
                warn!("Login rejected with code 0x{:02X}", code);
                if let Err(e) = self.disconnect().await {
                    warn!("Failed to disconnect after rejected login: {}", e);
                }
                Err(Error::LoginRejected { code })
            }
        }
    }

    /// Make sure the session is alive before talking to the unit
    ///
    /// Pings first and logs in again when the ping does not come back alive.
    /// A rejected login is not retried.
    pub async fn refresh_session(&mut self) -> Result<()> {
        if self.conversation_open {
            // The previous conversation was cancelled mid-exchange
            warn!("Previous conversation was interrupted, reconnecting");
            self.disconnect().await?;
        }
        self.conversation_open = true;

        if !self.ping().await? {
            debug!("Logging in on an invalid ping response");
            self.login().await?;
        }

        Ok(())
    }

    /// Finish a conversation and release the socket
    pub async fn end_conversation(&mut self) {
        self.conversation_open = false;

        if let Err(e) = self.disconnect().await {
            warn!("Failed to disconnect: {}", e);
        }
    }

    /// Status of every slot, slot 1 first
    pub async fn read_slot_statuses(&mut self) -> Result<Vec<SlotStatus>> {
        let reply = self.exchange(&catalog::bulk_outlet_status()).await?;
        Ok(catalog::parse_bulk_status(&reply)?)
    }

    /// Sanitized outlet name, empty when the unit did not answer with one
    pub async fn read_outlet_name(&mut self, slot: u8) -> Result<String> {
        let reply = self.exchange(&catalog::outlet_name(slot)?).await?;
        Ok(catalog::parse_outlet_name(&reply)?)
    }

    /// Whether the outlet is on
    pub async fn read_outlet_state(&mut self, slot: u8) -> Result<bool> {
        let reply = self.exchange(&catalog::outlet_status(slot)?).await?;
        Ok(catalog::parse_outlet_status(&reply)?)
    }

    /// Switch an outlet and return the state the unit reports
    pub async fn write_outlet(&mut self, slot: u8, state: OutletState) -> Result<u8> {
        let reply = self.exchange(&catalog::write_outlet(slot, state)?).await?;
        let actual = catalog::parse_write_outlet(&reply, state)?;

        debug!("Outlet {} write {:?}: unit reports 0x{:02X}", slot, state, actual);
        Ok(actual)
    }

    /// Start a power sequence
    pub async fn start_sequence(&mut self, direction: SequenceDirection) -> Result<bool> {
        let reply = self.exchange(&catalog::start_sequence(direction)).await?;
        Ok(catalog::parse_sequence(&reply)?)
    }
}
