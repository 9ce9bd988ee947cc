//! Staging commands reachable through `custom`.
//!
//! There is no server behind the in-memory backend, so other users' activity
//! and outages are staged by the host itself:
//!
//! | Command | Arguments | Effect |
//! | --- | --- | --- |
//! | `seed` | `<path>...` | add files at revision 1, synced |
//! | `checkout-by` | `<user> <path>...` | another user checks files out |
//! | `lock-by` | `<user> <path>...` | another user locks files |
//! | `remote-submit` | `<user> <description> <path>...` | another user submits |
//! | `outage` | `<connects>` | drop the connection and refuse reconnects |
//! | `files` | | list `path#have/head` for every depot file |

use std::num::ParseIntError;

use thiserror::Error;
use vcsbridged::BackendError;

/// A parsed staging command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Script {
    Seed {
        paths: Vec<String>,
    },
    CheckoutBy {
        user: String,
        paths: Vec<String>,
    },
    LockBy {
        user: String,
        paths: Vec<String>,
    },
    RemoteSubmit {
        user: String,
        description: String,
        paths: Vec<String>,
    },
    Outage {
        connects: u32,
    },
    Files,
}

/// Errors raised while parsing a staging command.
#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("unknown custom command '{name}'")]
    Unknown { name: String },
    #[error("'{command}' requires {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{command}': invalid count '{value}': {source}")]
    InvalidCount {
        command: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl From<ScriptError> for BackendError {
    fn from(error: ScriptError) -> Self {
        match error {
            ScriptError::Unknown { name } => Self::unsupported(name),
            other => Self::failed(other.to_string()),
        }
    }
}

fn paths(command: &'static str, arguments: &[String]) -> Result<Vec<String>, ScriptError> {
    if arguments.is_empty() {
        return Err(ScriptError::MissingArgument {
            command,
            expected: "at least one path",
        });
    }
    Ok(arguments.to_vec())
}

fn user_and_paths(
    command: &'static str,
    arguments: &[String],
) -> Result<(String, Vec<String>), ScriptError> {
    let Some((user, rest)) = arguments.split_first() else {
        return Err(ScriptError::MissingArgument {
            command,
            expected: "a user",
        });
    };
    Ok((user.clone(), paths(command, rest)?))
}

impl Script {
    pub(crate) fn parse(name: &str, arguments: &[String]) -> Result<Self, ScriptError> {
        match name {
            "seed" => Ok(Self::Seed {
                paths: paths("seed", arguments)?,
            }),
            "checkout-by" => {
                let (user, paths) = user_and_paths("checkout-by", arguments)?;
                Ok(Self::CheckoutBy { user, paths })
            }
            "lock-by" => {
                let (user, paths) = user_and_paths("lock-by", arguments)?;
                Ok(Self::LockBy { user, paths })
            }
            "remote-submit" => {
                let Some((user, rest)) = arguments.split_first() else {
                    return Err(ScriptError::MissingArgument {
                        command: "remote-submit",
                        expected: "a user",
                    });
                };
                let Some((description, paths)) = rest.split_first() else {
                    return Err(ScriptError::MissingArgument {
                        command: "remote-submit",
                        expected: "a description",
                    });
                };
                Ok(Self::RemoteSubmit {
                    user: user.clone(),
                    description: description.clone(),
                    paths: self::paths("remote-submit", paths)?,
                })
            }
            "outage" => {
                let value = arguments.first().ok_or(ScriptError::MissingArgument {
                    command: "outage",
                    expected: "a reconnect count",
                })?;
                let connects = value
                    .parse()
                    .map_err(|source| ScriptError::InvalidCount {
                        command: "outage",
                        value: value.clone(),
                        source,
                    })?;
                Ok(Self::Outage { connects })
            }
            "files" => Ok(Self::Files),
            other => Err(ScriptError::Unknown {
                name: other.to_owned(),
            }),
        }
    }
}
