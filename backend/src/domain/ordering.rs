//! Ordered sibling sets.
//!
//! Sections within a challenge and tasks within a section carry a 1-based
//! `order`. For a fixed parent the orders form the dense sequence `1..=N`.
//! This module only plans the changes; storage adapters execute the planned
//! [`OrderShift`] followed by the single-row assignment inside one
//! transaction, so readers never observe a duplicate or a gap.
//!
//! Moves past the current maximum are not clamped: the moved sibling takes
//! the requested order and the gap it leaves is not filled.

use serde::{Deserialize, Serialize};

/// Validation failures for order values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("order must be a positive integer, got {value}")]
    NonPositive { value: i64 },
    #[error("order {value} exceeds the supported maximum")]
    TooLarge { value: i64 },
}

/// A validated 1-based position among siblings.
///
/// # Examples
/// ```
/// use hardinfinity::domain::SiblingOrder;
///
/// let order = SiblingOrder::new(3).expect("positive order");
/// assert_eq!(order.get(), 3);
/// assert!(SiblingOrder::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct SiblingOrder(u32);

impl SiblingOrder {
    /// The first position in any sibling set.
    pub const FIRST: Self = Self(1);

    /// Largest order representable by the storage column.
    const MAX: u32 = i32::MAX as u32;

    /// Validate a raw order value.
    pub fn new(value: i64) -> Result<Self, OrderingError> {
        if value <= 0 {
            return Err(OrderingError::NonPositive { value });
        }
        u32::try_from(value)
            .ok()
            .filter(|order| *order <= Self::MAX)
            .map(Self)
            .ok_or(OrderingError::TooLarge { value })
    }

    /// Raw order value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// The position immediately after this one, saturating at the maximum.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX))
    }
}

impl TryFrom<i64> for SiblingOrder {
    type Error = OrderingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for SiblingOrder {
    type Error = OrderingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<SiblingOrder> for u32 {
    fn from(value: SiblingOrder) -> Self {
        value.0
    }
}

impl std::fmt::Display for SiblingOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a bulk order shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Every affected sibling moves one place towards the back.
    Up,
    /// Every affected sibling moves one place towards the front.
    Down,
}

impl ShiftDirection {
    /// Signed change applied to each affected order.
    pub fn delta(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Bulk update of all siblings whose order lies in `first..=last`.
///
/// An absent `last` leaves the range open towards the back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderShift {
    first: u32,
    last: Option<u32>,
    direction: ShiftDirection,
}

impl OrderShift {
    /// Lowest affected order.
    pub fn lowest(&self) -> u32 {
        self.first
    }

    /// Highest affected order, if bounded.
    pub fn highest(&self) -> Option<u32> {
        self.last
    }

    /// Direction of the shift.
    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    /// Whether a sibling currently at `order` is affected.
    pub fn contains(&self, order: u32) -> bool {
        order >= self.first && self.last.is_none_or(|last| order <= last)
    }

    /// Order of a sibling after the shift.
    pub fn apply(&self, order: u32) -> u32 {
        if !self.contains(order) {
            return order;
        }
        match self.direction {
            ShiftDirection::Up => order.saturating_add(1),
            ShiftDirection::Down => order.saturating_sub(1),
        }
    }
}

/// Steps for moving one sibling to a new absolute order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Shift applied to the other siblings first.
    pub shift: OrderShift,
    /// Order assigned to the moved sibling afterwards.
    pub target: SiblingOrder,
}

/// Plan a move from `current` to `target`.
///
/// Returns `None` when the sibling already sits at `target`.
///
/// # Examples
/// ```
/// use hardinfinity::domain::{SiblingOrder, plan_move};
///
/// let current = SiblingOrder::new(4).expect("valid");
/// let target = SiblingOrder::new(2).expect("valid");
/// let plan = plan_move(current, target).expect("order changes");
/// assert_eq!(plan.shift.lowest(), 2);
/// assert_eq!(plan.shift.highest(), Some(3));
/// ```
pub fn plan_move(current: SiblingOrder, target: SiblingOrder) -> Option<MovePlan> {
    let shift = match target.cmp(&current) {
        std::cmp::Ordering::Equal => return None,
        std::cmp::Ordering::Less => OrderShift {
            first: target.get(),
            last: Some(current.get().saturating_sub(1)),
            direction: ShiftDirection::Up,
        },
        std::cmp::Ordering::Greater => OrderShift {
            first: current.get().saturating_add(1),
            last: Some(target.get()),
            direction: ShiftDirection::Down,
        },
    };
    Some(MovePlan { shift, target })
}

/// Steps for inserting a new sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    /// Shift making room for the new sibling, when it is not appended.
    pub shift: Option<OrderShift>,
    /// Order assigned to the new sibling.
    pub position: SiblingOrder,
}

/// Plan an insertion given the current maximum order of the parent.
///
/// Without a requested position the sibling is appended. A requested
/// position is clamped to the end of the list and displaces the siblings at
/// or after it.
pub fn plan_insert(max_existing: Option<SiblingOrder>, requested: Option<SiblingOrder>) -> InsertPlan {
    let append_at = max_existing.map_or(SiblingOrder::FIRST, SiblingOrder::next);
    match requested {
        Some(position) if position < append_at => InsertPlan {
            shift: Some(OrderShift {
                first: position.get(),
                last: None,
                direction: ShiftDirection::Up,
            }),
            position,
        },
        _ => InsertPlan {
            shift: None,
            position: append_at,
        },
    }
}

/// Compaction applied to the remaining siblings after removing `removed`.
pub fn plan_removal(removed: SiblingOrder) -> OrderShift {
    OrderShift {
        first: removed.get().saturating_add(1),
        last: None,
        direction: ShiftDirection::Down,
    }
}

/// Whether `orders` is exactly `{1..=N}` for its length `N`.
pub fn is_dense(orders: impl IntoIterator<Item = u32>) -> bool {
    let mut sorted: Vec<u32> = orders.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .zip(1_u32..)
        .all(|(order, expected)| *order == expected)
}

#[cfg(test)]
#[path = "ordering_tests.rs"]
mod tests;
