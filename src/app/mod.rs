pub mod usecases;

pub use usecases::{ProvisioningUsecases, SunriseContext};
