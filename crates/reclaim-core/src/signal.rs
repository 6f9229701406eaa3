use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Signal {
    Hup,
    Int,
    Quit,
    Abrt,
    Kill,
    Alrm,
    Term,
    Usr1,
    Usr2,
    Stop,
    Cont,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hup => "HUP",
            Self::Int => "INT",
            Self::Quit => "QUIT",
            Self::Abrt => "ABRT",
            Self::Kill => "KILL",
            Self::Alrm => "ALRM",
            Self::Term => "TERM",
            Self::Usr1 => "USR1",
            Self::Usr2 => "USR2",
            Self::Stop => "STOP",
            Self::Cont => "CONT",
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        let upper = value.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        match name {
            "HUP" => Ok(Self::Hup),
            "INT" => Ok(Self::Int),
            "QUIT" => Ok(Self::Quit),
            "ABRT" => Ok(Self::Abrt),
            "KILL" => Ok(Self::Kill),
            "ALRM" => Ok(Self::Alrm),
            "TERM" => Ok(Self::Term),
            "USR1" => Ok(Self::Usr1),
            "USR2" => Ok(Self::Usr2),
            "STOP" => Ok(Self::Stop),
            "CONT" => Ok(Self::Cont),
            _ => Err(anyhow!(
                "unsupported signal '{value}'; supported: HUP, INT, QUIT, ABRT, KILL, ALRM, TERM, USR1, USR2, STOP, CONT"
            )),
        }
    }
}

impl TryFrom<String> for Signal {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Signal> for String {
    fn from(value: Signal) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
