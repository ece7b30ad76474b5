//! Model-backed physics scenario description

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::llm::ModelInvoker;

/// Describes the outcome of a simple physics scenario using the model
#[derive(Debug, Clone)]
pub struct ScenarioSimulator {
    invoker: Arc<ModelInvoker>,
}

impl ScenarioSimulator {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self { invoker }
    }

    /// Build the fixed instructional prompt for a scenario
    pub fn prompt_for(scenario: &str) -> String {
        format!(
            "You are a physics tutor helping students understand simple physics scenarios.\n\n\
             Scenario: {scenario}\n\n\
             Please provide a simple, educational response that includes:\n\
             1. What type of physics situation this is\n\
             2. What would happen in this scenario\n\
             3. Basic explanation of the physics principles involved\n\
             4. Keep it simple and easy to understand\n\n\
             Format your response in a clear, educational way suitable for students."
        )
    }

    /// Describe what happens in `scenario`
    pub async fn simulate(&self, scenario: &str) -> Result<String> {
        info!(scenario = %scenario, "Simulating physics scenario");
        self.invoker.invoke(&Self::prompt_for(scenario)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    #[tokio::test]
    async fn test_simulate_uses_template() {
        let model = Arc::new(ScriptedModel::replying("The ball accelerates downward."));
        let invoker = Arc::new(ModelInvoker::new(
            model.clone(),
            Arc::new(ResponseCache::new(Duration::from_secs(60))),
        ));
        let simulator = ScenarioSimulator::new(invoker);

        let text = simulator.simulate("a ball dropped from 10 m").await.unwrap();

        assert_eq!(text, "The ball accelerates downward.");
        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Scenario: a ball dropped from 10 m"));
        assert!(prompt.starts_with("You are a physics tutor"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_propagates_upstream_error() {
        let model = Arc::new(ScriptedModel::always_failing("boom"));
        let invoker = Arc::new(
            ModelInvoker::new(model, Arc::new(ResponseCache::new(Duration::from_secs(60))))
                .with_max_retries(2),
        );

        let err = ScenarioSimulator::new(invoker)
            .simulate("two carts collide")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E102");
    }
}
