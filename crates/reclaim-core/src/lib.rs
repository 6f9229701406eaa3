mod directive;
mod signal;
mod spec;
mod technique;

pub use directive::{Directive, ScriptDirective, SignalDirective};
pub use signal::Signal;
pub use spec::UninstallSpec;
pub use technique::Technique;

#[cfg(test)]
mod tests;
