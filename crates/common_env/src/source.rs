use std::{collections::HashMap, env::VarError};

use log::debug;

/// Read-only name to value lookup the reader takes raw values from.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process. Every lookup reads it anew.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        match std::env::var(name) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                debug!("Variable '{name}' is not valid unicode, treating it as unset");
                None
            }
        }
    }
}

/// Fixed snapshot of variables, handy for tests and for values collected elsewhere.
impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<S: EnvSource + ?Sized> EnvSource for &S {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}
