//! Physics specialist

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::conversation::Interaction;
use crate::llm::ModelInvoker;
use crate::routing::Category;
use crate::tools::{ScenarioSimulator, find_constant_in, format_number, get_constant};

use super::prompt::history_context;
use super::traits::{Answer, Specialist, explanation_or_error};

static SCENARIO_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(simulate|drop|dropped|collision|collide|pendulum|projectile|thrown|launch|incline|spring|falls)\b",
    )
    .expect("valid regex")
});

/// Looks up constants, simulates scenarios, otherwise asks the model
pub struct PhysicsSpecialist {
    invoker: Arc<ModelInvoker>,
    simulator: ScenarioSimulator,
}

impl PhysicsSpecialist {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self {
            simulator: ScenarioSimulator::new(Arc::clone(&invoker)),
            invoker,
        }
    }

    /// Whether the query describes a scenario to simulate
    pub fn is_scenario(query: &str) -> bool {
        SCENARIO_KEYWORDS.is_match(&query.to_lowercase())
    }

    async fn explain_constant(&self, name: &str, history: &[Interaction]) -> Answer {
        info!(constant = %name, "Found physics constant request");
        let constant = match get_constant(name) {
            Ok(constant) => constant,
            Err(e) => {
                warn!(error = %e, "Constant lookup failed");
                return Answer::ToolFailed(e);
            }
        };

        let prompt = format!(
            "{}Explain the significance of the {} in physics. Concisely.",
            history_context(history),
            constant.name
        );
        let explanation = explanation_or_error(self.invoker.invoke(&prompt).await);
        Answer::Ok(format!(
            "Value: {} {}\nExplanation: {}",
            format_value(constant.value),
            constant.unit,
            explanation
        ))
    }
}

/// Plain notation for everyday magnitudes, scientific otherwise
fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e9).contains(&magnitude) {
        format_number(value)
    } else {
        format!("{:e}", value)
    }
}

#[async_trait]
impl Specialist for PhysicsSpecialist {
    fn category(&self) -> Category {
        Category::Physics
    }

    async fn handle_query(&self, query: &str, history: &[Interaction]) -> Answer {
        if let Some(name) = find_constant_in(query) {
            return self.explain_constant(name, history).await;
        }

        if Self::is_scenario(query) {
            info!("Detected physics scenario");
            return Answer::from_model(self.simulator.simulate(query).await);
        }

        info!("Processing general physics query");
        let prompt = format!(
            "{}You are a physics tutor. Please answer this physics question: {}",
            history_context(history),
            query
        );
        Answer::from_model(self.invoker.invoke(&prompt).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    fn specialist(model: Arc<ScriptedModel>) -> PhysicsSpecialist {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
        PhysicsSpecialist::new(Arc::new(
            ModelInvoker::new(model, cache).with_max_retries(1),
        ))
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(299_792_458.0), "299792458");
        assert_eq!(format_value(6.67430e-11), "6.6743e-11");
        assert_eq!(format_value(6.02214076e23), "6.02214076e23");
    }

    #[test]
    fn test_scenario_detection() {
        assert!(PhysicsSpecialist::is_scenario("A ball is dropped from a roof"));
        assert!(PhysicsSpecialist::is_scenario("simulate a pendulum"));
        assert!(!PhysicsSpecialist::is_scenario("what is a droplet"));
    }

    #[tokio::test]
    async fn test_constant_lookup() {
        let model = Arc::new(ScriptedModel::replying("It is the universal speed limit."));
        let physics = specialist(model.clone());

        let answer = physics
            .handle_query("What is the speed of light?", &[])
            .await;

        assert_eq!(
            answer.render(),
            "Value: 299792458 m/s\nExplanation: It is the universal speed limit."
        );
        assert_eq!(
            model.last_prompt().unwrap(),
            "Explain the significance of the speed of light in physics. Concisely."
        );
    }

    #[tokio::test]
    async fn test_scenario_uses_simulator_template() {
        let model = Arc::new(ScriptedModel::replying("It swings back and forth."));
        let physics = specialist(model.clone());

        let answer = physics.handle_query("simulate a pendulum", &[]).await;

        assert_eq!(answer.render(), "It swings back and forth.");
        assert!(
            model
                .last_prompt()
                .unwrap()
                .contains("Scenario: simulate a pendulum")
        );
    }

    #[tokio::test]
    async fn test_scenario_upstream_error_is_returned() {
        let model = Arc::new(ScriptedModel::always_failing("unavailable"));
        let physics = specialist(model);

        let answer = physics.handle_query("two cars collide head on", &[]).await;

        assert!(matches!(answer, Answer::UpstreamFailed(_)));
        assert!(answer.render().contains("unavailable"));
    }

    #[tokio::test]
    async fn test_general_physics_question() {
        let model = Arc::new(ScriptedModel::replying("Momentum is mass times velocity."));
        let physics = specialist(model.clone());

        let answer = physics.handle_query("what is momentum", &[]).await;

        assert_eq!(answer.render(), "Momentum is mass times velocity.");
        assert!(
            model
                .last_prompt()
                .unwrap()
                .ends_with("Please answer this physics question: what is momentum")
        );
    }
}
