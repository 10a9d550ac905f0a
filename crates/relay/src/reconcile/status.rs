//! Status marker classification.
//!
//! Both status signals are free text: the operational status tag is a
//! metafield written by store staff, and the tracking page is the
//! carrier's human-facing HTML. Classification scans for known marker
//! substrings and nothing else.

/// Pickup status tag: the parcel reached the carrier branch.
pub const ARRIVED_AT_BRANCH_MARKER: &str = "הגיע לסניף";

/// Pickup status tag: the parcel was handed to the customer.
pub const ARRIVED_AT_CUSTOMER_MARKER: &str = "הגיע ללקוח";

/// Pickup status tag: the customer collected the parcel at the branch.
pub const COLLECTED_MARKER: &str = "נאסף";

/// Tracking page: the shipment entered the carrier's sorting facility.
pub const SORTING_FACILITY_MARKER: &str = "נקלט במרכז המיון";

/// Tracking page: the carrier closed the delivery.
pub const CLOSED_MARKER: &str = "נסגרה";

/// Tracking page: delivered with a left-at-door authorization.
pub const LEFT_AT_DOOR_MARKER: &str = "אישור השארה";

/// Recognized operational status of a branch-pickup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupStatus {
    /// Parcel is at the branch, waiting for the customer.
    ArrivedAtBranch,
    /// Parcel reached the customer.
    ArrivedAtCustomer,
    /// Customer collected the parcel.
    Collected,
}

impl PickupStatus {
    /// Classify an operational status tag.
    ///
    /// Returns `None` for tags the relay does not act on (in transit,
    /// returned, free-text notes from staff).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.contains(ARRIVED_AT_CUSTOMER_MARKER) {
            Some(Self::ArrivedAtCustomer)
        } else if tag.contains(COLLECTED_MARKER) {
            Some(Self::Collected)
        } else if tag.contains(ARRIVED_AT_BRANCH_MARKER) {
            Some(Self::ArrivedAtBranch)
        } else {
            None
        }
    }

    /// Whether this status ends the order's lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ArrivedAtCustomer | Self::Collected)
    }
}

/// Recognized state of a carrier tracking page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Shipment is progressing (sorting facility).
    Intermediate,
    /// Shipment was delivered or the delivery was closed.
    Terminal,
}

impl PageStatus {
    /// Classify tracking page content.
    ///
    /// Terminal markers win: a delivered shipment's page still lists the
    /// sorting-facility event in its history.
    #[must_use]
    pub fn classify(content: &str) -> Option<Self> {
        if content.contains(CLOSED_MARKER) || content.contains(LEFT_AT_DOOR_MARKER) {
            Some(Self::Terminal)
        } else if content.contains(SORTING_FACILITY_MARKER) {
            Some(Self::Intermediate)
        } else {
            None
        }
    }
}
