pub mod device;
pub mod error;
pub mod hub;
pub mod inputs;

pub use device::DeviceOption;
pub use error::{Error, Result};
pub use hub::{HubParams, HubRepo, ModelWeights, WeightsFormat};
pub use inputs::ClassifierInputs;
