use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    EarlyScript,
    Launchctl,
    Quit,
    Signal,
    LoginItem,
    Kext,
    Pkgutil,
    Script,
    Rmdir,
    Delete,
    Trash,
}

impl Technique {
    // Uninstall phase sequence. Scripts and service/process shutdown come
    // before any bulk filesystem removal.
    pub const PHASE_ORDER: [Technique; 11] = [
        Self::EarlyScript,
        Self::Launchctl,
        Self::Quit,
        Self::Signal,
        Self::LoginItem,
        Self::Kext,
        Self::Pkgutil,
        Self::Script,
        Self::Rmdir,
        Self::Delete,
        Self::Trash,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EarlyScript => "early_script",
            Self::Launchctl => "launchctl",
            Self::Quit => "quit",
            Self::Signal => "signal",
            Self::LoginItem => "login_item",
            Self::Kext => "kext",
            Self::Pkgutil => "pkgutil",
            Self::Script => "script",
            Self::Rmdir => "rmdir",
            Self::Delete => "delete",
            Self::Trash => "trash",
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
