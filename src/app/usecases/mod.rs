mod provisioning;
mod sunrise;

pub use provisioning::ProvisioningUsecases;
pub use sunrise::SunriseContext;
