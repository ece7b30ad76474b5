//! Subject specialists
//!
//! Each specialist builds its own prompt from the query and the history
//! window it is handed. Math and physics try a deterministic tool first and
//! only ask the model to explain a computed result.

mod chemistry;
mod history;
mod math;
mod physics;
mod prompt;
mod traits;

use std::collections::HashMap;
use std::sync::Arc;

pub use chemistry::{ChemistrySpecialist, ChemistryTopic};
pub use history::{HistorySpecialist, HistoryTopic};
pub use math::MathSpecialist;
pub use physics::PhysicsSpecialist;
pub use prompt::{history_context, tutor_prompt};
pub use traits::{Answer, Specialist};

use crate::llm::ModelInvoker;
use crate::routing::Category;

/// The four subject specialists sharing one invoker
pub fn default_specialists(invoker: &Arc<ModelInvoker>) -> HashMap<Category, Arc<dyn Specialist>> {
    let specialists: [Arc<dyn Specialist>; 4] = [
        Arc::new(MathSpecialist::new(Arc::clone(invoker))),
        Arc::new(PhysicsSpecialist::new(Arc::clone(invoker))),
        Arc::new(ChemistrySpecialist::new(Arc::clone(invoker))),
        Arc::new(HistorySpecialist::new(Arc::clone(invoker))),
    ];

    specialists
        .into_iter()
        .map(|s| (s.category(), s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    #[test]
    fn test_default_specialists_cover_every_subject() {
        let invoker = Arc::new(ModelInvoker::new(
            Arc::new(ScriptedModel::replying("ok")),
            Arc::new(ResponseCache::new(Duration::from_secs(60))),
        ));
        let specialists = default_specialists(&invoker);

        assert_eq!(specialists.len(), 4);
        for category in Category::SPECIALISTS {
            assert_eq!(specialists[&category].category(), category);
        }
    }
}
