use anyhow::{anyhow, Context};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::directive::{Directive, ScriptDirective, SignalDirective};
use crate::technique::Technique;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallSpec {
    pub token: String,
    pub version: Option<String>,
    directives: Vec<Directive>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageDocument {
    token: String,
    version: Option<String>,
    #[serde(default)]
    uninstall: Vec<UninstallStanza>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct UninstallStanza {
    #[serde(default)]
    early_script: OneOrMany<ScriptEntry>,
    #[serde(default)]
    launchctl: OneOrMany<String>,
    #[serde(default)]
    quit: OneOrMany<String>,
    #[serde(default)]
    signal: OneOrMany<SignalDirective>,
    #[serde(default)]
    login_item: OneOrMany<String>,
    #[serde(default)]
    kext: OneOrMany<String>,
    #[serde(default)]
    pkgutil: OneOrMany<String>,
    #[serde(default)]
    script: OneOrMany<ScriptEntry>,
    #[serde(default)]
    rmdir: OneOrMany<String>,
    #[serde(default)]
    delete: OneOrMany<String>,
    #[serde(default)]
    trash: OneOrMany<String>,
}

// A single value or an array of values. Element errors are reported as-is.
#[derive(Debug)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match toml::Value::deserialize(deserializer)? {
            toml::Value::Array(items) => items
                .into_iter()
                .map(|item| T::deserialize(item).map_err(de::Error::custom))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => T::deserialize(other)
                .map(Self::One)
                .map_err(de::Error::custom),
        }
    }
}

#[derive(Debug)]
struct ScriptEntry(ScriptDirective);

impl<'de> Deserialize<'de> for ScriptEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match toml::Value::deserialize(deserializer)? {
            toml::Value::String(executable) => Ok(Self(ScriptDirective {
                executable,
                args: Vec::new(),
                must_succeed: true,
            })),
            other => ScriptDirective::deserialize(other)
                .map(Self)
                .map_err(de::Error::custom),
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl UninstallSpec {
    pub fn new(token: impl Into<String>, directives: Vec<Directive>) -> Self {
        Self {
            token: token.into(),
            version: None,
            directives,
        }
    }

    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let document: PackageDocument =
            toml::from_str(input).context("failed to parse package description")?;
        if document.token.trim().is_empty() {
            return Err(anyhow!("package token must not be empty"));
        }

        let mut directives = Vec::new();
        for (index, stanza) in document.uninstall.into_iter().enumerate() {
            flatten_stanza(stanza, &mut directives)
                .with_context(|| format!("invalid uninstall stanza #{}", index + 1))?;
        }

        Ok(Self {
            token: document.token,
            version: document.version,
            directives,
        })
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn groups(&self) -> Vec<(Technique, Vec<&Directive>)> {
        Technique::PHASE_ORDER
            .into_iter()
            .filter_map(|technique| {
                let entries = self
                    .directives
                    .iter()
                    .filter(|directive| directive.technique() == technique)
                    .collect::<Vec<_>>();
                (!entries.is_empty()).then_some((technique, entries))
            })
            .collect()
    }

    pub fn execution_order(&self) -> Vec<&Directive> {
        self.groups()
            .into_iter()
            .flat_map(|(_, entries)| entries)
            .collect()
    }
}

fn flatten_stanza(stanza: UninstallStanza, directives: &mut Vec<Directive>) -> anyhow::Result<()> {
    for ScriptEntry(script) in stanza.early_script.into_vec() {
        validate_script(&script, Technique::EarlyScript)?;
        directives.push(Directive::EarlyScript(script));
    }
    for label in stanza.launchctl.into_vec() {
        directives.push(Directive::Launchctl(validated_token(label, Technique::Launchctl)?));
    }
    for bundle_id in stanza.quit.into_vec() {
        directives.push(Directive::Quit(validated_token(bundle_id, Technique::Quit)?));
    }
    for signal in stanza.signal.into_vec() {
        validate_signal(&signal)?;
        directives.push(Directive::Signal(signal));
    }
    for name in stanza.login_item.into_vec() {
        directives.push(Directive::LoginItem(validated_token(name, Technique::LoginItem)?));
    }
    for kext_id in stanza.kext.into_vec() {
        directives.push(Directive::Kext(validated_token(kext_id, Technique::Kext)?));
    }
    for pattern in stanza.pkgutil.into_vec() {
        directives.push(Directive::Pkgutil(validated_token(pattern, Technique::Pkgutil)?));
    }
    for ScriptEntry(script) in stanza.script.into_vec() {
        validate_script(&script, Technique::Script)?;
        directives.push(Directive::Script(script));
    }

    let rmdir = validated_paths(stanza.rmdir.into_vec(), Technique::Rmdir)?;
    if !rmdir.is_empty() {
        directives.push(Directive::Rmdir(rmdir));
    }
    let delete = validated_paths(stanza.delete.into_vec(), Technique::Delete)?;
    if !delete.is_empty() {
        directives.push(Directive::Delete(delete));
    }
    let trash = validated_paths(stanza.trash.into_vec(), Technique::Trash)?;
    if !trash.is_empty() {
        directives.push(Directive::Trash(trash));
    }

    Ok(())
}

fn validated_token(value: String, technique: Technique) -> anyhow::Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{technique} entry must not be empty"));
    }
    if trimmed.contains('\n') {
        return Err(anyhow!("{technique} entry must not contain newlines: {value:?}"));
    }
    Ok(trimmed.to_string())
}

fn validated_paths(paths: Vec<String>, technique: Technique) -> anyhow::Result<Vec<String>> {
    paths
        .into_iter()
        .map(|path| validated_token(path, technique))
        .collect()
}

fn validate_script(script: &ScriptDirective, technique: Technique) -> anyhow::Result<()> {
    if script.executable.trim().is_empty() {
        return Err(anyhow!("{technique} executable must not be empty"));
    }
    Ok(())
}

fn validate_signal(signal: &SignalDirective) -> anyhow::Result<()> {
    if signal.bundle_id.trim().is_empty() {
        return Err(anyhow!("signal bundle_id must not be empty"));
    }
    if signal.signals.is_empty() {
        return Err(anyhow!(
            "signal directive for '{}' must list at least one signal",
            signal.bundle_id
        ));
    }
    Ok(())
}
