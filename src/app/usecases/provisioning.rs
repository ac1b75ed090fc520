use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use log::{debug, info, warn};
use sunrise_core::{IdleWatch, WifiCredentials};

use crate::domain::entity::{PortalForm, ProvisioningOutcome};
use crate::domain::ports::{
    CaptivePortal, ConfigurationStore, LinkError, ProvisioningError, StationLink,
};

/// Joins the stored network or collects new settings through the setup portal.
pub struct ProvisioningUsecases<S, W> {
    store: S,
    wifi: W,
    join_timeout: Duration,
    portal_timeout: Duration,
}

impl<S: ConfigurationStore, W: StationLink + CaptivePortal> ProvisioningUsecases<S, W> {
    pub fn new(store: S, wifi: W, join_timeout: Duration, portal_timeout: Duration) -> Self {
        Self {
            store,
            wifi,
            join_timeout,
            portal_timeout,
        }
    }

    /// Give the radio back once provisioning is over
    pub fn into_wifi(self) -> W {
        self.wifi
    }

    pub async fn run(&mut self) -> Result<ProvisioningOutcome, ProvisioningError> {
        let settings = self.store.load_settings().await;
        let credentials = self.store.load_credentials().await;

        if credentials.is_configured() {
            info!("provisioning: joining {}", credentials.ssid);
            match self.join(&credentials).await {
                Ok(()) => {
                    return Ok(ProvisioningOutcome {
                        settings,
                        changed: false,
                    });
                }
                Err(err) => warn!("provisioning: join failed: {:?}", err),
            }
        } else {
            info!("provisioning: no stored network");
        }

        let form = PortalForm::prefilled(&credentials, &settings);
        let submission = self.collect(&form).await?;

        if let Err(err) = self.store.save_credentials(&submission.credentials).await {
            warn!("provisioning: failed to save credentials: {:?}", err);
        }
        if let Err(err) = self.store.save_settings(&submission.settings).await {
            warn!("provisioning: failed to save settings: {:?}", err);
        }
        info!("provisioning: settings saved");

        info!("provisioning: joining {}", submission.credentials.ssid);
        self.join(&submission.credentials)
            .await
            .map_err(ProvisioningError::Join)?;

        Ok(ProvisioningOutcome {
            settings: submission.settings,
            changed: true,
        })
    }

    async fn join(&mut self, credentials: &WifiCredentials) -> Result<(), LinkError> {
        with_timeout(self.join_timeout, self.wifi.join(credentials))
            .await
            .unwrap_or(Err(LinkError::Timeout))
    }

    /// Serve the portal until a submission arrives or it sits idle for the
    /// portal timeout; every request pushes the deadline back.
    async fn collect(&mut self, form: &PortalForm) -> Result<PortalForm, ProvisioningError> {
        self.wifi.open(form).await.map_err(ProvisioningError::Portal)?;
        let mut watch = IdleWatch::new(self.portal_timeout, Instant::now());

        let submission = loop {
            if let Some(at) = self.wifi.last_activity() {
                watch.touch(at);
            }
            if watch.is_expired(Instant::now()) {
                break None;
            }
            match select(self.wifi.next_submission(), Timer::at(watch.deadline())).await {
                Either::First(submission) => break Some(submission),
                Either::Second(()) => {
                    debug!("provisioning: portal deadline reached, checking activity");
                }
            }
        };
        self.wifi.close().await;

        submission.ok_or(ProvisioningError::PortalTimeout)
    }
}
