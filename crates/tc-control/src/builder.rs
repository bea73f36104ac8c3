//! Fluent builder for constructing a [`StepCoordinator`].

use std::sync::Arc;

use tc_core::{ControlConfig, SimClock};
use tc_engine::TrafficEngine;
use tc_entity::EntityRegistry;

use crate::{import_all, ControlResult, OverridePolicy, StepCoordinator};

/// Fluent builder for [`StepCoordinator<E>`].
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                   |
/// |---------------------|-------------------------------------------|
/// | `.registry(r)`      | A fresh, empty `EntityRegistry`           |
/// | `.policy(p)`        | `OverridePolicy::from_config(&config)`    |
/// | `.import_network()` | Off: the registry is used as given        |
///
/// # Example
///
/// ```rust,ignore
/// let mut coordinator = CoordinatorBuilder::new(Arc::new(engine), config)
///     .import_network()
///     .build()?;
/// coordinator.run(&mut NoopSink)?;
/// ```
pub struct CoordinatorBuilder<E: TrafficEngine> {
    engine:   Arc<E>,
    config:   ControlConfig,
    registry: Option<Arc<EntityRegistry>>,
    policy:   Option<OverridePolicy>,
    import:   bool,
}

impl<E: TrafficEngine> CoordinatorBuilder<E> {
    pub fn new(engine: Arc<E>, config: ControlConfig) -> Self {
        Self {
            engine,
            config,
            registry: None,
            policy:   None,
            import:   false,
        }
    }

    /// Share an existing registry, e.g. one a `Commands` handle already uses.
    pub fn registry(mut self, registry: Arc<EntityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn policy(mut self, policy: OverridePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Import routes, traffic lights, and charging stations from the engine
    /// during [`build`][Self::build].
    pub fn import_network(mut self) -> Self {
        self.import = true;
        self
    }

    /// Validate the config, run the optional import, and return a
    /// ready-to-run coordinator.
    pub fn build(self) -> ControlResult<StepCoordinator<E>> {
        self.config.validate()?;

        let registry = self.registry.unwrap_or_default();
        if self.import {
            import_all(self.engine.as_ref(), &registry)?;
        }

        Ok(StepCoordinator {
            policy:      self.policy.unwrap_or_else(|| OverridePolicy::from_config(&self.config)),
            clock:       SimClock::new(self.config.step_length_secs),
            total_steps: self.config.total_steps,
            engine:      self.engine,
            registry,
        })
    }
}
