pub mod device;
pub mod live_data;
pub mod periodic_data;

pub use device::{DeviceData, SystemDetail};
pub use live_data::{LiveData, Power};
pub use periodic_data::{CurrentCost, PeriodicData, TotalConsumption};

use serde::{Deserialize, Deserializer};

/// The API sends `null` for empty lists on some accounts.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
