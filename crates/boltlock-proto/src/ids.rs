//! Addressing identifiers used on the attribute bus.

/// Logical sub-device on the controller (front door, back door, ...).
pub type EndpointId = u16;

/// Cluster identifier (a group of related attributes and commands).
pub type ClusterId = u32;

/// Attribute identifier within a cluster.
pub type AttributeId = u32;

/// Index of the fabric (administrative domain) that issued a change.
pub type FabricIndex = u8;

/// Well-known cluster identifiers.
pub mod clusters {
    use super::ClusterId;

    /// On/Off cluster. Its boolean attribute doubles as the desired lock
    /// state on lock-bearing endpoints.
    pub const ON_OFF: ClusterId = 0x0006;
}

/// Well-known attribute identifiers.
pub mod attributes {
    use super::AttributeId;

    /// `OnOff` attribute of the On/Off cluster.
    pub const ON_OFF: AttributeId = 0x0000;
}
