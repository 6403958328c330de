use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::warn;

use fulfil_core::{BranchId, DomainError, DomainResult, MovementId, ProductId};

use crate::movement::{Direction, MovementReference, MovementType, NewMovement, StockMovement};

/// Key of one movement stream: a product at a branch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StockKey {
    product: ProductId,
    branch: BranchId,
}

/// Outcome of a cache reconciliation pass for one (product, branch) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Cached on-hand value before the pass.
    pub cached: i64,
    /// Signed sum of all recorded movements.
    pub derived: i64,
    /// true when the cache disagreed with the movement log and was repaired.
    pub repaired: bool,
}

/// Append-only stock ledger.
///
/// Movements are immutable facts; on-hand quantity is the signed sum of a
/// stream's movements. Implementations may cache the sum per stream, but the
/// movement log is ground truth: `reconcile` must re-derive and repair the
/// cache on any mismatch. Each `record_movement` call runs as one atomic
/// unit against its stream (no interleaving with a concurrent call on the
/// same product + branch).
pub trait StockLedger: Send + Sync {
    /// Append one movement. Quantity must be >= 0 (direction is encoded in
    /// the movement type, not the sign).
    fn record_movement(&self, movement: NewMovement) -> DomainResult<MovementId>;

    /// Current on-hand quantity for a product at a branch (cached value).
    fn current_quantity(&self, product: ProductId, branch: BranchId) -> DomainResult<i64>;

    /// Full movement history for a product at a branch, in recorded order.
    fn movements(&self, product: ProductId, branch: BranchId) -> DomainResult<Vec<StockMovement>>;

    /// Record a physical count: appends one adjustment movement carrying the
    /// signed delta `counted - system`, not the raw counted value. Returns
    /// `None` when the count matches the system quantity.
    fn record_physical_count(
        &self,
        product: ProductId,
        branch: BranchId,
        counted: i64,
        reference: MovementReference,
    ) -> DomainResult<Option<MovementId>>;

    /// Re-derive on-hand from the movement log and repair the cache on
    /// mismatch.
    fn reconcile(&self, product: ProductId, branch: BranchId) -> DomainResult<Reconciliation>;
}

impl<L> StockLedger for Arc<L>
where
    L: StockLedger + ?Sized,
{
    fn record_movement(&self, movement: NewMovement) -> DomainResult<MovementId> {
        (**self).record_movement(movement)
    }

    fn current_quantity(&self, product: ProductId, branch: BranchId) -> DomainResult<i64> {
        (**self).current_quantity(product, branch)
    }

    fn movements(&self, product: ProductId, branch: BranchId) -> DomainResult<Vec<StockMovement>> {
        (**self).movements(product, branch)
    }

    fn record_physical_count(
        &self,
        product: ProductId,
        branch: BranchId,
        counted: i64,
        reference: MovementReference,
    ) -> DomainResult<Option<MovementId>> {
        (**self).record_physical_count(product, branch, counted, reference)
    }

    fn reconcile(&self, product: ProductId, branch: BranchId) -> DomainResult<Reconciliation> {
        (**self).reconcile(product, branch)
    }
}

#[derive(Debug, Default)]
struct Streams {
    movements: HashMap<StockKey, Vec<StockMovement>>,
    on_hand: HashMap<StockKey, i64>,
}

impl Streams {
    fn derived(&self, key: StockKey) -> i64 {
        self.movements
            .get(&key)
            .map(|stream| stream.iter().map(StockMovement::signed_quantity).sum())
            .unwrap_or(0)
    }

    fn append(&mut self, movement: StockMovement) -> MovementId {
        let key = StockKey {
            product: movement.product,
            branch: movement.branch,
        };
        let id = movement.id;
        *self.on_hand.entry(key).or_insert(0) += movement.signed_quantity();
        self.movements.entry(key).or_default().push(movement);
        id
    }
}

/// In-memory stock ledger.
///
/// Intended for tests/dev. Not optimized for performance. A single `RwLock`
/// over all streams makes each append and each count atomic against
/// concurrent calls on the same stream.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    inner: RwLock<Streams>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, Streams>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("stock ledger lock poisoned"))
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, Streams>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("stock ledger lock poisoned"))
    }

    #[cfg(test)]
    fn overwrite_cache(&self, product: ProductId, branch: BranchId, value: i64) {
        let mut streams = self.inner.write().unwrap();
        streams.on_hand.insert(StockKey { product, branch }, value);
    }
}

impl StockLedger for InMemoryStockLedger {
    fn record_movement(&self, movement: NewMovement) -> DomainResult<MovementId> {
        if movement.quantity < 0 {
            return Err(DomainError::invalid_quantity(format!(
                "movement quantity cannot be negative (got {})",
                movement.quantity
            )));
        }

        let mut streams = self.write()?;
        let stored = StockMovement {
            id: MovementId::new(),
            product: movement.product,
            branch: movement.branch,
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            unit_price: movement.unit_price,
            reference: movement.reference,
            recorded_at: Utc::now(),
        };
        Ok(streams.append(stored))
    }

    fn current_quantity(&self, product: ProductId, branch: BranchId) -> DomainResult<i64> {
        let streams = self.read()?;
        Ok(streams
            .on_hand
            .get(&StockKey { product, branch })
            .copied()
            .unwrap_or(0))
    }

    fn movements(&self, product: ProductId, branch: BranchId) -> DomainResult<Vec<StockMovement>> {
        let streams = self.read()?;
        Ok(streams
            .movements
            .get(&StockKey { product, branch })
            .cloned()
            .unwrap_or_default())
    }

    fn record_physical_count(
        &self,
        product: ProductId,
        branch: BranchId,
        counted: i64,
        reference: MovementReference,
    ) -> DomainResult<Option<MovementId>> {
        if counted < 0 {
            return Err(DomainError::invalid_quantity(
                "counted quantity cannot be negative",
            ));
        }

        // Single write guard: the delta is computed against the log, and the
        // adjustment lands before any other movement can interleave.
        let mut streams = self.write()?;
        let key = StockKey { product, branch };
        let system = streams.derived(key);
        let delta = counted - system;
        if delta == 0 {
            streams.on_hand.insert(key, counted);
            return Ok(None);
        }

        let direction = if delta > 0 {
            Direction::Inbound
        } else {
            Direction::Outbound
        };
        let stored = StockMovement {
            id: MovementId::new(),
            product,
            branch,
            movement_type: MovementType::Adjustment(direction),
            quantity: delta.abs(),
            unit_price: 0,
            reference: Some(reference),
            recorded_at: Utc::now(),
        };
        Ok(Some(streams.append(stored)))
    }

    fn reconcile(&self, product: ProductId, branch: BranchId) -> DomainResult<Reconciliation> {
        let mut streams = self.write()?;
        let key = StockKey { product, branch };
        let cached = streams.on_hand.get(&key).copied().unwrap_or(0);
        let derived = streams.derived(key);
        let repaired = cached != derived;
        if repaired {
            warn!(
                product = %product,
                branch = %branch,
                cached,
                derived,
                "on-hand cache drifted from movement log; repairing"
            );
            streams.on_hand.insert(key, derived);
        }
        Ok(Reconciliation {
            cached,
            derived,
            repaired,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use uuid::Uuid;

    use super::*;
    use crate::movement::ReferenceKind;

    fn test_key() -> (ProductId, BranchId) {
        (ProductId::new(), BranchId::new())
    }

    fn movement(
        product: ProductId,
        branch: BranchId,
        movement_type: MovementType,
        quantity: i64,
    ) -> NewMovement {
        NewMovement {
            product,
            branch,
            movement_type,
            quantity,
            unit_price: 100,
            reference: None,
        }
    }

    #[test]
    fn on_hand_tracks_signed_sum() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();

        ledger
            .record_movement(movement(product, branch, MovementType::Purchase, 20))
            .unwrap();
        ledger
            .record_movement(movement(product, branch, MovementType::Sale, 6))
            .unwrap();
        ledger
            .record_movement(movement(product, branch, MovementType::Damage, 1))
            .unwrap();

        assert_eq!(ledger.current_quantity(product, branch).unwrap(), 13);
        assert_eq!(ledger.movements(product, branch).unwrap().len(), 3);
    }

    #[test]
    fn negative_quantity_is_rejected_and_appends_nothing() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();

        let err = ledger
            .record_movement(movement(product, branch, MovementType::Purchase, -5))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity(_)));
        assert!(ledger.movements(product, branch).unwrap().is_empty());
    }

    #[test]
    fn streams_are_isolated_per_product_and_branch() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();
        let other_branch = BranchId::new();

        ledger
            .record_movement(movement(product, branch, MovementType::Purchase, 8))
            .unwrap();
        ledger
            .record_movement(movement(product, other_branch, MovementType::Purchase, 3))
            .unwrap();

        assert_eq!(ledger.current_quantity(product, branch).unwrap(), 8);
        assert_eq!(ledger.current_quantity(product, other_branch).unwrap(), 3);
    }

    #[test]
    fn physical_count_records_delta_not_counted_value() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();
        let reference = MovementReference::new(ReferenceKind::PhysicalCount, Uuid::now_v7());

        ledger
            .record_movement(movement(product, branch, MovementType::Purchase, 10))
            .unwrap();

        // Count found 7 on the shelf: one outbound adjustment of 3.
        let id = ledger
            .record_physical_count(product, branch, 7, reference)
            .unwrap();
        assert!(id.is_some());

        let movements = ledger.movements(product, branch).unwrap();
        let adjustment = movements.last().unwrap();
        assert_eq!(
            adjustment.movement_type,
            MovementType::Adjustment(Direction::Outbound)
        );
        assert_eq!(adjustment.quantity, 3);
        assert_eq!(ledger.current_quantity(product, branch).unwrap(), 7);
    }

    #[test]
    fn matching_physical_count_appends_no_movement() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();
        let reference = MovementReference::new(ReferenceKind::PhysicalCount, Uuid::now_v7());

        ledger
            .record_movement(movement(product, branch, MovementType::Purchase, 5))
            .unwrap();

        let id = ledger
            .record_physical_count(product, branch, 5, reference)
            .unwrap();
        assert!(id.is_none());
        assert_eq!(ledger.movements(product, branch).unwrap().len(), 1);
    }

    #[test]
    fn reconcile_repairs_a_drifted_cache() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();

        ledger
            .record_movement(movement(product, branch, MovementType::Purchase, 12))
            .unwrap();

        // Simulate drift (e.g. a cache restored from a stale snapshot).
        ledger.overwrite_cache(product, branch, 99);
        assert_eq!(ledger.current_quantity(product, branch).unwrap(), 99);

        let outcome = ledger.reconcile(product, branch).unwrap();
        assert!(outcome.repaired);
        assert_eq!(outcome.cached, 99);
        assert_eq!(outcome.derived, 12);
        assert_eq!(ledger.current_quantity(product, branch).unwrap(), 12);
    }

    #[test]
    fn reconcile_is_a_no_op_when_cache_is_consistent() {
        let ledger = InMemoryStockLedger::new();
        let (product, branch) = test_key();

        ledger
            .record_movement(movement(product, branch, MovementType::Return, 2))
            .unwrap();

        let outcome = ledger.reconcile(product, branch).unwrap();
        assert!(!outcome.repaired);
        assert_eq!(outcome.cached, outcome.derived);
    }

    fn arb_movement_type() -> impl Strategy<Value = MovementType> {
        prop_oneof![
            Just(MovementType::Purchase),
            Just(MovementType::Sale),
            Just(MovementType::Adjustment(Direction::Inbound)),
            Just(MovementType::Adjustment(Direction::Outbound)),
            Just(MovementType::Transfer(Direction::Inbound)),
            Just(MovementType::Transfer(Direction::Outbound)),
            Just(MovementType::Production),
            Just(MovementType::Return),
            Just(MovementType::Damage),
        ]
    }

    proptest! {
        /// For any sequence of movements, the cached on-hand quantity equals
        /// the signed sum of the log, and reconciliation finds nothing to
        /// repair.
        #[test]
        fn cache_always_equals_signed_sum(
            entries in proptest::collection::vec((arb_movement_type(), 0i64..1_000), 0..64)
        ) {
            let ledger = InMemoryStockLedger::new();
            let (product, branch) = test_key();

            let mut expected = 0i64;
            for (movement_type, quantity) in entries {
                expected += match movement_type.direction() {
                    Direction::Inbound => quantity,
                    Direction::Outbound => -quantity,
                };
                ledger
                    .record_movement(movement(product, branch, movement_type, quantity))
                    .unwrap();
            }

            prop_assert_eq!(ledger.current_quantity(product, branch).unwrap(), expected);
            let outcome = ledger.reconcile(product, branch).unwrap();
            prop_assert!(!outcome.repaired);
            prop_assert_eq!(outcome.derived, expected);
        }
    }
}
