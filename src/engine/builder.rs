//! Builder pattern for StrokeEngine.

use tokio::runtime::Handle;

use crate::config::{
    validate_config, EngineConfig, HomingConfig, MachineGeometry, MotorProperties,
    StrokingConfig,
};
use crate::driver::StepperDriver;
use crate::error::{ConfigError, EngineError, Error, Result};
use crate::pattern::{Pattern, PatternRegistry};

use super::controller::StrokeEngine;

/// Builder for creating StrokeEngine instances.
pub struct StrokeEngineBuilder<D>
where
    D: StepperDriver + Send + 'static,
{
    geometry: Option<MachineGeometry>,
    motor: Option<MotorProperties>,
    homing: HomingConfig,
    stroking: StrokingConfig,
    driver: Option<D>,
    patterns: PatternRegistry,
    runtime: Option<Handle>,
}

impl<D> Default for StrokeEngineBuilder<D>
where
    D: StepperDriver + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<D> StrokeEngineBuilder<D>
where
    D: StepperDriver + Send + 'static,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            geometry: None,
            motor: None,
            homing: HomingConfig::default(),
            stroking: StrokingConfig::default(),
            driver: None,
            patterns: PatternRegistry::new(),
            runtime: None,
        }
    }

    /// Configure from a loaded EngineConfig.
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.geometry = Some(config.machine);
        self.motor = Some(config.motor);
        self.homing = config.homing;
        self.stroking = config.stroking;
        self
    }

    /// Set the machine geometry.
    pub fn geometry(mut self, geometry: MachineGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the motor properties.
    pub fn motor(mut self, motor: MotorProperties) -> Self {
        self.motor = Some(motor);
        self
    }

    /// Set the homing timing.
    pub fn homing(mut self, homing: HomingConfig) -> Self {
        self.homing = homing;
        self
    }

    /// Set the stroking loop timing.
    pub fn stroking(mut self, stroking: StrokingConfig) -> Self {
        self.stroking = stroking;
        self
    }

    /// Set the stepper driver.
    pub fn driver(mut self, driver: D) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Register a pattern. Indices follow registration order.
    pub fn pattern<P: Pattern + 'static>(self, pattern: P) -> Self {
        self.boxed_pattern(Box::new(pattern))
    }

    /// Register an already boxed pattern.
    pub fn boxed_pattern(mut self, pattern: Box<dyn Pattern>) -> Self {
        self.patterns.register(pattern);
        self
    }

    /// Run the background routines on this runtime.
    ///
    /// Defaults to the runtime `build` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the StrokeEngine.
    ///
    /// The engine starts `Disabled` with the motor outputs off.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing, the configuration
    /// is invalid, no pattern is registered or no runtime is available.
    pub fn build(self) -> Result<StrokeEngine<D>> {
        let machine = self
            .geometry
            .ok_or(Error::Config(ConfigError::Missing("geometry")))?;
        let motor = self
            .motor
            .ok_or(Error::Config(ConfigError::Missing("motor")))?;
        let driver = self
            .driver
            .ok_or(Error::Config(ConfigError::Missing("driver")))?;

        let config = EngineConfig {
            machine,
            motor,
            homing: self.homing,
            stroking: self.stroking,
        };
        validate_config(&config)?;

        if self.patterns.is_empty() {
            return Err(EngineError::NoPatterns.into());
        }

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| Error::Engine(EngineError::NoRuntime))?,
        };

        Ok(StrokeEngine::new(config, driver, self.patterns, runtime))
    }
}
