//! Scripted model backend for exercising the pipeline without a real model.

use crate::agent::{BackendError, ModelBackend};
use crate::role::Role;
use std::sync::Mutex;

pub struct ScriptedBackend {
    fail_at: Option<Role>,
    blank: bool,
    pub calls: Mutex<Vec<Role>>,
}

impl ScriptedBackend {
    /// Every role answers with a canned, role-tagged response.
    pub fn echo() -> Self {
        Self {
            fail_at: None,
            blank: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Roles before `role` answer normally; `role` itself errors.
    pub fn failing_at(role: Role) -> Self {
        Self {
            fail_at: Some(role),
            blank: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every role answers with whitespace only.
    pub fn blank() -> Self {
        Self {
            fail_at: None,
            blank: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_log(&self) -> Vec<Role> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModelBackend for ScriptedBackend {
    fn complete(
        &self,
        role: Role,
        _system_prompt: &str,
        prompt: &str,
    ) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(role);
        if self.fail_at == Some(role) {
            return Err(format!("scripted failure for {role}").into());
        }
        if self.blank {
            return Ok("   ".into());
        }
        // Echo enough of the prompt that tests can assert on data flow.
        let head: String = prompt.chars().take(120).collect();
        Ok(format!("{role} response: {head}"))
    }
}
