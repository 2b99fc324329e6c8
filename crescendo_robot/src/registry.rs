//! Named commands and autonomous routines.
//!
//! Routines refer to commands by name. Every name is checked, and every
//! routine trial-compiled, when the routine is registered, so a broken
//! routine fails at startup rather than when autonomous begins.

use std::collections::BTreeMap;
use std::time::Duration;

use crescendo_common::robot::routine::{RoutineConfig, RoutineStep};
use thiserror::Error;
use tracing::{debug, info};

use crate::command::basic::WaitCommand;
use crate::command::composite::{Parallel, Sequence};
use crate::command::drive::FollowSegments;
use crate::command::{BoxedCommand, CommandExt, CompositionError};

/// Builds a fresh command instance on every call.
pub type CommandFactory = Box<dyn Fn() -> Result<BoxedCommand, CompositionError>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Name '{0}' is already registered")]
    DuplicateName(String),

    #[error("No routine named '{0}'")]
    NotFound(String),

    #[error("Routine '{routine}' uses unknown command '{command}'")]
    UnknownCommand { routine: String, command: String },

    #[error("'{name}' is malformed: {source}")]
    Composition {
        name: String,
        #[source]
        source: CompositionError,
    },
}

// ─── Named Commands ─────────────────────────────────────────────────

/// Name → command factory map used by routines.
#[derive(Default)]
pub struct NamedCommands {
    factories: BTreeMap<String, CommandFactory>,
}

impl NamedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory; it is invoked once here so malformed groups fail now.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<BoxedCommand, CompositionError> + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        if let Err(source) = factory() {
            return Err(RegistryError::Composition { name, source });
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// A new instance of the named command.
    pub fn build(&self, name: &str) -> Option<Result<BoxedCommand, CompositionError>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

// ─── Routines ───────────────────────────────────────────────────────

enum Routine {
    Steps(RoutineConfig),
    Factory(CommandFactory),
}

/// Name → routine map; resolving a name builds a fresh command graph.
pub struct RoutineRegistry {
    named: NamedCommands,
    routines: BTreeMap<String, Routine>,
}

impl RoutineRegistry {
    pub fn new(named: NamedCommands) -> Self {
        Self {
            named,
            routines: BTreeMap::new(),
        }
    }

    pub fn named_commands(&self) -> &NamedCommands {
        &self.named
    }

    /// Register a routine declared as steps over named commands.
    pub fn register_steps(&mut self, routine: RoutineConfig) -> Result<(), RegistryError> {
        if self.routines.contains_key(&routine.name) {
            return Err(RegistryError::DuplicateName(routine.name));
        }
        for step in &routine.steps {
            for command in step.command_names() {
                if !self.named.contains(command) {
                    return Err(RegistryError::UnknownCommand {
                        routine: routine.name.clone(),
                        command: command.to_string(),
                    });
                }
            }
        }
        // Surface requirement overlaps now.
        self.compile(&routine)?;
        info!("registered routine '{}' ({} steps)", routine.name, routine.steps.len());
        self.routines
            .insert(routine.name.clone(), Routine::Steps(routine));
        Ok(())
    }

    /// Register a routine built in code.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<BoxedCommand, CompositionError> + 'static,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.routines.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        if let Err(source) = factory() {
            return Err(RegistryError::Composition { name, source });
        }
        self.routines.insert(name, Routine::Factory(Box::new(factory)));
        Ok(())
    }

    /// Build the command for routine `name`.
    pub fn resolve(&self, name: &str) -> Result<BoxedCommand, RegistryError> {
        match self.routines.get(name) {
            Some(Routine::Steps(routine)) => Ok(self.compile(routine)?.boxed()),
            Some(Routine::Factory(factory)) => factory().map_err(|source| {
                RegistryError::Composition {
                    name: name.to_string(),
                    source,
                }
            }),
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    /// Routine names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }

    fn compile(&self, routine: &RoutineConfig) -> Result<Sequence, RegistryError> {
        let mut children = Vec::with_capacity(routine.steps.len());
        for step in &routine.steps {
            children.push(self.compile_step(&routine.name, step)?);
        }
        debug!("compiled routine '{}'", routine.name);
        Ok(Sequence::named(routine.name.clone(), children))
    }

    fn compile_step(&self, routine: &str, step: &RoutineStep) -> Result<BoxedCommand, RegistryError> {
        let composition = |source: CompositionError| RegistryError::Composition {
            name: routine.to_string(),
            source,
        };
        let build = |name: &str| match self.named.build(name) {
            Some(built) => built.map_err(composition),
            None => Err(RegistryError::UnknownCommand {
                routine: routine.to_string(),
                command: name.to_string(),
            }),
        };

        let command = match step {
            RoutineStep::Command { command } => build(command.as_str())?,
            RoutineStep::Timeout { timeout, command } => build(command.as_str())?
                .with_timeout(Duration::try_from_secs_f64(timeout.max(0.0)).unwrap_or(Duration::MAX))
                .boxed(),
            RoutineStep::Wait { wait } => WaitCommand::from_secs(*wait).boxed(),
            RoutineStep::Parallel { parallel } => {
                let children: Vec<BoxedCommand> = parallel.iter().map(|n| build(n.as_str())).collect::<Result<_, _>>()?;
                Parallel::all(children).map_err(composition)?.boxed()
            }
            RoutineStep::Race { race } => {
                let children: Vec<BoxedCommand> = race.iter().map(|n| build(n.as_str())).collect::<Result<_, _>>()?;
                Parallel::race(children).map_err(composition)?.boxed()
            }
            RoutineStep::Drive { drive } => {
                FollowSegments::new(format!("{routine} path"), drive.clone()).boxed()
            }
        };
        Ok(command)
    }
}

impl std::fmt::Debug for RoutineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineRegistry")
            .field("routines", &self.routines.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

// ─── Chooser ────────────────────────────────────────────────────────

/// Operator selection of the autonomous routine.
#[derive(Debug, Clone, Default)]
pub struct AutoChooser {
    selected: Option<String>,
}

impl AutoChooser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, name: impl Into<String>) {
        self.selected = Some(name.into());
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected routine's command; `Ok(None)` when nothing is selected.
    pub fn autonomous_command(
        &self,
        registry: &RoutineRegistry,
    ) -> Result<Option<BoxedCommand>, RegistryError> {
        self.selected
            .as_deref()
            .map(|name| registry.resolve(name))
            .transpose()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
