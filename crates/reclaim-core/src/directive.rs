use serde::{Deserialize, Serialize};

use crate::signal::Signal;
use crate::technique::Technique;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScriptDirective {
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_must_succeed")]
    pub must_succeed: bool,
}

fn default_must_succeed() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SignalDirective {
    pub bundle_id: String,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "technique", content = "payload", rename_all = "snake_case")]
pub enum Directive {
    EarlyScript(ScriptDirective),
    Launchctl(String),
    Quit(String),
    Signal(SignalDirective),
    LoginItem(String),
    Kext(String),
    Pkgutil(String),
    Script(ScriptDirective),
    Rmdir(Vec<String>),
    Delete(Vec<String>),
    Trash(Vec<String>),
}

impl Directive {
    pub fn technique(&self) -> Technique {
        match self {
            Self::EarlyScript(_) => Technique::EarlyScript,
            Self::Launchctl(_) => Technique::Launchctl,
            Self::Quit(_) => Technique::Quit,
            Self::Signal(_) => Technique::Signal,
            Self::LoginItem(_) => Technique::LoginItem,
            Self::Kext(_) => Technique::Kext,
            Self::Pkgutil(_) => Technique::Pkgutil,
            Self::Script(_) => Technique::Script,
            Self::Rmdir(_) => Technique::Rmdir,
            Self::Delete(_) => Technique::Delete,
            Self::Trash(_) => Technique::Trash,
        }
    }

    pub fn target(&self) -> String {
        match self {
            Self::EarlyScript(script) | Self::Script(script) => {
                if script.args.is_empty() {
                    script.executable.clone()
                } else {
                    format!("{} {}", script.executable, script.args.join(" "))
                }
            }
            Self::Launchctl(value)
            | Self::Quit(value)
            | Self::LoginItem(value)
            | Self::Kext(value)
            | Self::Pkgutil(value) => value.clone(),
            Self::Signal(signal) => {
                let names = signal
                    .signals
                    .iter()
                    .map(|signal| signal.as_str())
                    .collect::<Vec<_>>();
                format!("{} [{}]", signal.bundle_id, names.join(", "))
            }
            Self::Rmdir(paths) | Self::Delete(paths) | Self::Trash(paths) => paths.join(", "),
        }
    }
}
