//! Actor types and the constructor registry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use stagehand_core::error::GmError;

use crate::actor::GameActor;

/// Category plus name identifying a registered kind of actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorType {
    pub category: String,
    pub name: String,
}

impl ActorType {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.name)
    }
}

type Constructor = Box<dyn Fn() -> Box<dyn GameActor> + Send>;

/// Registry of actor constructors, keyed by [`ActorType`].
#[derive(Default)]
pub struct ActorFactory {
    constructors: HashMap<ActorType, Constructor>,
}

impl ActorFactory {
    /// Register a constructor for an actor type. A later registration for
    /// the same type replaces the earlier one.
    pub fn register<F>(&mut self, actor_type: ActorType, constructor: F)
    where
        F: Fn() -> Box<dyn GameActor> + Send + 'static,
    {
        self.constructors.insert(actor_type, Box::new(constructor));
    }

    /// Construct a fresh actor of the given type.
    pub fn create(&self, actor_type: &ActorType) -> Result<Box<dyn GameActor>, GmError> {
        let constructor =
            self.constructors
                .get(actor_type)
                .ok_or_else(|| GmError::UnknownActorType {
                    category: actor_type.category.clone(),
                    name: actor_type.name.clone(),
                })?;
        Ok(constructor())
    }

    /// Look up a registered type by category and name.
    pub fn find_type(&self, category: &str, name: &str) -> Option<&ActorType> {
        self.constructors
            .keys()
            .find(|t| t.category == category && t.name == name)
    }

    pub fn is_registered(&self, actor_type: &ActorType) -> bool {
        self.constructors.contains_key(actor_type)
    }

    /// All registered types, in no particular order.
    pub fn types(&self) -> Vec<&ActorType> {
        self.constructors.keys().collect()
    }
}
