mod ota;
pub(crate) mod portal;

pub use ota::OtaController;
pub use portal::PortalHttpController;
