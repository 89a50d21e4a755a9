use crate::types::Outcome;
use crate::ExecutorError;
use common::types::EntityRef;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Outcomes of one run, shared between the coordinator and its step tasks.
///
/// Each entity gets exactly one record; a second one is refused.
#[derive(Debug, Default)]
pub struct OutcomeLedger {
    entries: RwLock<HashMap<EntityRef, Outcome>>,
}

impl OutcomeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entity: EntityRef, outcome: Outcome) -> Result<(), ExecutorError> {
        let mut g = self.entries.write();
        if g.contains_key(&entity) {
            return Err(ExecutorError::duplicate_outcome(&entity));
        }
        g.insert(entity, outcome);
        Ok(())
    }

    pub fn get(&self, entity: &EntityRef) -> Option<Outcome> {
        self.entries.read().get(entity).cloned()
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.entries.read().contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove and return the outcome for `entity`.
    pub fn take(&self, entity: &EntityRef) -> Option<Outcome> {
        self.entries.write().remove(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::EntityKind;

    #[test]
    fn second_record_for_an_entity_is_rejected() {
        let ledger = OutcomeLedger::new();
        let entity = EntityRef::new(EntityKind::Dataset, "daily");
        ledger.record(entity.clone(), Outcome::Skipped).unwrap();

        let err = ledger.record(entity.clone(), Outcome::Updated).unwrap_err();
        match &err {
            ExecutorError::DuplicateOutcome { context } => {
                assert_eq!(context.entity(), Some(&entity))
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ledger.get(&entity), Some(Outcome::Skipped));

        // same id, different kind
        ledger
            .record(EntityRef::new(EntityKind::Visual, "daily"), Outcome::Skipped)
            .unwrap();
        assert_eq!(ledger.len(), 2);
    }
}
