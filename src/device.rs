//! The contract the climate adapter requires from the vendor device
//! library.
//!
//! The real client owns the network transport, the unit's identity and
//! a cache of the most recently reported raw values; the adapter only
//! consumes that cache and pushes translated settings back through the
//! client. Network failures stay opaque to the adapter and surface
//! through the associated error type.

use std::collections::BTreeMap;

/// A decoded view of one enumerated attribute: the raw wire value
/// alongside the vendor's human readable token for it (`"3"` decodes
/// to `"cool"` for the mode key, for example).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Representation {
    pub raw: String,
    pub human: String,
}

#[allow(async_fn_in_trait)]
pub trait DeviceClient {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Cached raw value for a vendor key, or `None` when the unit has
    /// not reported the key. Never performs I/O.
    fn cached(&self, key: &str) -> Option<String>;

    /// Decoded representation for an enumerated vendor key. Never
    /// performs I/O.
    fn represent(&self, key: &str) -> Option<Representation>;

    /// Push a batch of settings to the unit in one request. Values are
    /// the vendor's lowercase tokens (`"auto"`, not the wire code
    /// `"A"`); the client performs the final wire encoding. An empty
    /// batch is a valid request that resumes a powered-down unit.
    async fn write(&self, batch: BTreeMap<&'static str, String>) -> Result<(), Self::Error>;

    /// Toggle the unit's holiday ("away") flag. This is a dedicated
    /// call on the wire, not part of the settings request.
    async fn set_holiday(&self, enabled: bool) -> Result<(), Self::Error>;

    /// Poll the unit and replace the cached values. Scheduling is the
    /// caller's concern.
    async fn refresh(&self) -> Result<(), Self::Error>;

    fn supports_away(&self) -> bool;
    fn supports_fan_rate(&self) -> bool;
    fn supports_swing(&self) -> bool;

    /// Fan speed names the unit accepts, in the device library's
    /// display casing.
    fn fan_rate_options(&self) -> Vec<String>;

    /// Swing position tokens the unit accepts, in the vendor's own
    /// lowercase casing.
    fn swing_options(&self) -> Vec<String>;

    fn name(&self) -> String;

    /// The unit's hardware (MAC) address.
    fn hardware_address(&self) -> String;

    /// Vendor model and firmware descriptor.
    fn device_descriptor(&self) -> String;
}
