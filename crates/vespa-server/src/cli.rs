//! Typed command-line surface (spec §6).
//!
//! Argument parsing and process wiring belong to the surrounding CLI
//! tool (an external collaborator, spec §1); this module is the typed
//! boundary that tool targets: a closed `Command` enum, the flags it
//! accepts, and the exit-code contract ("Exit code 0 on success,
//! non-zero on validation or transport failure").

use std::path::PathBuf;

use crate::error::ServerError;

/// Flags common to every command (spec §6: `--zone`, `--log-level`,
/// `--target`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonFlags {
    pub zone: Option<String>,
    pub log_level: Option<String>,
    pub target: Option<String>,
}

/// The closed set of commands spec §6 names: `deploy`, `prepare`,
/// `activate`, `prod init`, `prod submit`, `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Deploy { application_directory: PathBuf, flags: CommonFlags },
    Prepare { application_directory: PathBuf, flags: CommonFlags },
    Activate { flags: CommonFlags },
    ProdInit { flags: CommonFlags },
    ProdSubmit { application_directory: PathBuf, flags: CommonFlags },
    Status { flags: CommonFlags },
}

impl Command {
    pub fn flags(&self) -> &CommonFlags {
        match self {
            Command::Deploy { flags, .. }
            | Command::Prepare { flags, .. }
            | Command::Activate { flags }
            | Command::ProdInit { flags }
            | Command::ProdSubmit { flags, .. }
            | Command::Status { flags } => flags,
        }
    }
}

/// The process exit-code contract: 0 on success, non-zero on validation
/// or transport failure (spec §6). Distinguishes the two non-zero cases
/// so operator tooling can script on them, mirroring the error taxonomy
/// in spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    ValidationFailure = 1,
    TransportFailure = 2,
    Fatal = 3,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&ServerError> for ExitCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::Config(vespa_config::ConfigError::Transport(_) | vespa_config::ConfigError::Timeout) => {
                ExitCode::TransportFailure
            }
            ServerError::Core(vespa_types::CoreError::TransientTransport(_)) => ExitCode::TransportFailure,
            ServerError::Core(vespa_types::CoreError::LogicViolation(_)) => ExitCode::Fatal,
            _ => ExitCode::ValidationFailure,
        }
    }
}

/// Resolves a command's environment-sourced default target config id,
/// per spec §6 ("`VESPA_CONFIG_ID` selects a default config id when not
/// provided on the command line").
pub fn resolve_target(flags: &CommonFlags, env_config_id: Option<&str>) -> Option<String> {
    flags.target.clone().or_else(|| env_config_id.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_target_prefers_explicit_flag() {
        let flags = CommonFlags { target: Some("explicit".into()), ..Default::default() };
        assert_eq!(resolve_target(&flags, Some("from-env")), Some("explicit".to_string()));
    }

    #[test]
    fn resolve_target_falls_back_to_env() {
        let flags = CommonFlags::default();
        assert_eq!(resolve_target(&flags, Some("from-env")), Some("from-env".to_string()));
    }

    #[test]
    fn exit_code_success_is_zero() {
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn transport_error_maps_to_transport_exit_code() {
        let err = ServerError::Config(vespa_config::ConfigError::Timeout);
        assert_eq!(ExitCode::from(&err), ExitCode::TransportFailure);
    }

    #[test]
    fn logic_violation_maps_to_fatal_exit_code() {
        let err = ServerError::Core(vespa_types::CoreError::LogicViolation("bug".into()));
        assert_eq!(ExitCode::from(&err), ExitCode::Fatal);
    }

    #[test]
    fn command_flags_accessor_covers_every_variant() {
        let flags = CommonFlags { zone: Some("z".into()), ..Default::default() };
        let cmd = Command::Status { flags: flags.clone() };
        assert_eq!(cmd.flags(), &flags);
    }
}
