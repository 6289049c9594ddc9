//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// value objects with the same values are the same value. Line-item
/// snapshots, tracking events, and quality-check records are value objects:
/// once written they never change, only new ones are appended.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
