use embassy_time::Instant;
use sunrise_core::WifiCredentials;

use crate::domain::entity::PortalForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The radio rejected the configuration or failed to start
    Radio,
    /// No association with the access point
    Connect,
    /// Joining did not finish in time
    Timeout,
}

/// Station side of the radio
#[allow(async_fn_in_trait)]
pub trait StationLink {
    /// Join a network and wait for an address
    async fn join(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError>;
}

/// Setup access point with a configuration page
#[allow(async_fn_in_trait)]
pub trait CaptivePortal {
    /// Bring up the access point and serve `form`
    async fn open(&mut self, form: &PortalForm) -> Result<(), LinkError>;

    /// Wait for the user to submit the page
    async fn next_submission(&mut self) -> PortalForm;

    /// When a client last talked to the page
    fn last_activity(&self) -> Option<Instant>;

    /// Tear the access point down
    async fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The portal sat idle for its whole timeout
    PortalTimeout,
    /// The setup access point could not be started
    Portal(LinkError),
    /// The submitted network could not be joined
    Join(LinkError),
}
