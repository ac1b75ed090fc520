//! OTA update controller
//!
//! Tracks one update session between the listener task and the flash
//! service, and reports its phases to the log.

use log::{error, info, warn};
use sunrise_core::ota::{HexDigest, ImageTracker, OtaError, OtaEvent, OtaInvitation};

use crate::infrastructure::services::{OtaService, OtaSession};

struct ActiveUpdate {
    session: OtaSession,
    tracker: ImageTracker,
    md5: HexDigest,
}

impl ActiveUpdate {
    fn write(&mut self, chunk: &[u8]) -> Result<(), OtaError> {
        self.tracker.update(chunk)?;
        self.session.write_chunk(chunk).map_err(|e| {
            warn!("ota: flash write failed: {:?}", e);
            OtaError::Receive
        })?;

        if self.tracker.progress_milestone().is_some() {
            report(OtaEvent::Progress {
                received: self.tracker.received(),
                total: self.tracker.total(),
            });
        }
        Ok(())
    }
}

pub struct OtaController {
    service: OtaService,
    update: Option<ActiveUpdate>,
}

impl OtaController {
    pub fn new(service: OtaService) -> Self {
        Self {
            service,
            update: None,
        }
    }

    /// Open a session for an accepted invitation.
    pub fn start(&mut self, invitation: &OtaInvitation) -> Result<(), OtaError> {
        report(OtaEvent::Start(invitation.command));
        let session = self
            .service
            .begin(invitation.command, invitation.size)
            .map_err(|e| {
                warn!("ota: cannot begin update: {:?}", e);
                OtaError::Begin
            })?;

        self.update = Some(ActiveUpdate {
            session,
            tracker: ImageTracker::new(invitation.size),
            md5: invitation.md5.clone(),
        });
        Ok(())
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), OtaError> {
        match self.update.as_mut() {
            Some(update) => update.write(chunk),
            None => Err(OtaError::Receive),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.update
            .as_ref()
            .is_some_and(|update| update.tracker.is_complete())
    }

    /// Verify the received image and activate it.
    pub fn finish(&mut self) -> Result<(), OtaError> {
        let update = self.update.take().ok_or(OtaError::End)?;
        update.tracker.verify(&update.md5)?;
        update.session.finalize().map_err(|e| {
            warn!("ota: cannot activate image: {:?}", e);
            OtaError::End
        })?;
        report(OtaEvent::End);
        Ok(())
    }

    /// Abandon the current session.
    pub fn fail(&mut self, error: OtaError) {
        self.update = None;
        report(OtaEvent::Error(error));
    }
}

fn report(event: OtaEvent) {
    match event {
        OtaEvent::Start(command) => info!("Start updating {}", command.as_str()),
        OtaEvent::Progress { received, total } => {
            let percent = u64::from(received) * 100 / u64::from(total.max(1));
            info!("Progress: {}%", percent);
        }
        OtaEvent::End => info!("End"),
        OtaEvent::Error(error) => error!("Error[{}]: {}", error.code(), error.as_str()),
    }
}
