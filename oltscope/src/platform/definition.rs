//! Dialect definition: prompts and the fixed command set of an OLT CLI.

use regex::bytes::Regex;

use crate::channel::compile_prompt_pattern;
use crate::error::{ConfigError, Result};

/// Compiled prompt patterns, one per CLI state the client visits.
#[derive(Debug, Clone)]
pub struct Prompts {
    pub login: Regex,
    pub password: Regex,
    /// Unprivileged exec prompt (`OLT>`).
    pub user: Regex,
    /// Privileged exec prompt (`OLT#`).
    pub privileged: Regex,
    /// Either exec prompt; used right after login.
    pub exec: Regex,
    /// Global configuration prompt (`OLT(config)#`).
    pub config: Regex,
    /// Interface-scoped prompt (`OLT(config-pon-0/1)#`).
    pub interface: Regex,
}

/// Command strings. `{port}` and `{onu}` are substituted when rendered.
#[derive(Debug, Clone)]
pub struct Commands {
    pub enable: String,
    pub disable_paging: String,
    pub configure: String,
    pub interface: String,
    pub exit_context: String,
    pub status_listing: String,
    pub description: String,
    pub optical: String,
    pub link_state: String,
}

/// Everything dialect-specific about talking to one family of OLTs.
#[derive(Debug, Clone)]
pub struct OltDialect {
    /// Dialect name (e.g., "epon").
    pub name: String,

    pub prompts: Prompts,

    pub commands: Commands,

    /// Output fragments that mark a rejected command.
    pub failed_when_contains: Vec<String>,

    /// How many trailing bytes of output are searched for prompts.
    pub search_depth: usize,
}

impl OltDialect {
    /// Start a dialect definition.
    pub fn builder(name: impl Into<String>) -> DialectBuilder {
        DialectBuilder::new(name)
    }

    pub fn interface_command(&self, port: &str) -> String {
        self.commands.interface.replace("{port}", port)
    }

    pub fn description_command(&self, onu: u32) -> String {
        render_onu(&self.commands.description, onu)
    }

    pub fn optical_command(&self, onu: u32) -> String {
        render_onu(&self.commands.optical, onu)
    }

    pub fn link_state_command(&self, onu: u32) -> String {
        render_onu(&self.commands.link_state, onu)
    }

    /// Strip the command echo from the front of captured output.
    pub fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw.trim_start_matches(['\r', '\n']);
        let (first, rest) = match output.split_once('\n') {
            Some((first, rest)) => (first, rest),
            None => (output, ""),
        };

        if !command.is_empty() && first.trim_end().ends_with(command) {
            rest.to_string()
        } else {
            output.to_string()
        }
    }

    /// Detect command failure from output.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .cloned()
    }
}

fn render_onu(template: &str, onu: u32) -> String {
    template.replace("{onu}", &onu.to_string())
}

/// Builder for [`OltDialect`]; patterns are compiled in [`DialectBuilder::build`].
#[derive(Debug, Clone)]
pub struct DialectBuilder {
    name: String,
    login: String,
    password: String,
    user: String,
    privileged: String,
    config: String,
    interface: String,
    commands: Commands,
    failed_when_contains: Vec<String>,
    search_depth: usize,
}

impl DialectBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login: r"(?i)(?:login|user\s*name)\s*:".to_string(),
            password: r"(?i)password\s*:".to_string(),
            user: r"(?m)^[\w.\-@]{1,63}>".to_string(),
            privileged: r"(?m)^[\w.\-@]{1,63}#".to_string(),
            config: r"(?m)^[\w.\-@]{1,63}\(config\)#".to_string(),
            interface: r"(?m)^[\w.\-@]{1,63}\(config-[\w.\-/:]+\)#".to_string(),
            commands: Commands {
                enable: "enable".to_string(),
                disable_paging: "terminal length 0".to_string(),
                configure: "configure terminal".to_string(),
                interface: "interface {port}".to_string(),
                exit_context: "end".to_string(),
                status_listing: "show onu info".to_string(),
                description: "show onu {onu} description".to_string(),
                optical: "show onu {onu} optical-info".to_string(),
                link_state: "show onu {onu} link-state".to_string(),
            },
            failed_when_contains: vec![],
            search_depth: 1000,
        }
    }

    pub fn with_login_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.login = pattern.into();
        self
    }

    pub fn with_password_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.password = pattern.into();
        self
    }

    pub fn with_user_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.user = pattern.into();
        self
    }

    pub fn with_privileged_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.privileged = pattern.into();
        self
    }

    pub fn with_config_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.config = pattern.into();
        self
    }

    pub fn with_interface_prompt(mut self, pattern: impl Into<String>) -> Self {
        self.interface = pattern.into();
        self
    }

    /// Replace the command set.
    pub fn with_commands(mut self, commands: Commands) -> Self {
        self.commands = commands;
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Compile all prompt patterns.
    pub fn build(self) -> Result<OltDialect> {
        let compile = |pattern: &str| -> Result<Regex> {
            compile_prompt_pattern(pattern).map_err(|e| ConfigError::InvalidPattern(e).into())
        };

        let prompts = Prompts {
            login: compile(&self.login)?,
            password: compile(&self.password)?,
            user: compile(&self.user)?,
            privileged: compile(&self.privileged)?,
            exec: compile(&format!("(?:(?:{})|(?:{}))", self.user, self.privileged))?,
            config: compile(&self.config)?,
            interface: compile(&self.interface)?,
        };

        Ok(OltDialect {
            name: self.name,
            prompts,
            commands: self.commands,
            failed_when_contains: self.failed_when_contains,
            search_depth: self.search_depth,
        })
    }
}
