//! Controller resolution.
//!
//! Controllers are registered under `bundle::name` and hold named actions.
//! Restful controllers key their actions by verb: a `GET` to the `index`
//! action runs `get_index`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::action::{Delegate, Response, DEFAULT_BUNDLE};
use crate::routing::error::DispatchError;
use crate::routing::method::Method;

/// A controller action: receives the remaining route parameters.
pub type ControllerAction = Arc<dyn Fn(&[String]) -> Response + Send + Sync>;

/// Resolves a delegate to a controller action and runs it.
pub trait ControllerResolver: Send + Sync {
    fn call(&self, delegate: &Delegate, method: &str, verb: Method, params: &[String]) -> Result<Response, DispatchError>;
}

#[derive(Clone, Default)]
pub struct Controller {
    restful: bool,
    actions: HashMap<String, ControllerAction>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller whose actions are named `<verb>_<action>`.
    pub fn restful() -> Self {
        Self {
            restful: true,
            actions: HashMap::new(),
        }
    }

    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&[String]) -> Response + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    fn action_key(&self, method: &str, verb: Method) -> String {
        if self.restful {
            format!("{}_{}", verb.verb(), method)
        } else {
            method.to_string()
        }
    }
}

/// In-memory controller registry.
#[derive(Clone, Default)]
pub struct Controllers {
    controllers: HashMap<String, Controller>,
}

impl std::fmt::Debug for Controllers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Controllers").field("controllers", &names).finish()
    }
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller; `identifier` without a bundle goes into the
    /// default bundle.
    pub fn register(&mut self, identifier: &str, controller: Controller) -> &mut Self {
        self.controllers.insert(qualify(identifier), controller);
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.controllers.contains_key(&qualify(identifier))
    }
}

fn qualify(identifier: &str) -> String {
    if identifier.contains("::") {
        identifier.to_string()
    } else {
        format!("{}::{}", DEFAULT_BUNDLE, identifier)
    }
}

impl ControllerResolver for Controllers {
    fn call(&self, delegate: &Delegate, method: &str, verb: Method, params: &[String]) -> Result<Response, DispatchError> {
        let identifier = delegate.identifier();
        let controller = self
            .controllers
            .get(&identifier)
            .ok_or_else(|| DispatchError::ControllerNotFound(identifier.clone()))?;

        let key = controller.action_key(method, verb);
        let action = controller
            .actions
            .get(&key)
            .ok_or_else(|| DispatchError::ActionNotFound {
                controller: identifier.clone(),
                action: key.clone(),
            })?;

        tracing::debug!(controller = %identifier, action = %key, "Calling controller action");
        Ok(action(params))
    }
}
