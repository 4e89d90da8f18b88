use std::collections::BTreeMap;

use log::debug;

use super::TransactionPlugin;
use crate::commands::Command;
use crate::data::TransactionData;
use crate::error::TxError;
use crate::types::Address;

/// Rewrites `org/app[/version]` package names to on-chain addresses.
///
/// Substitution runs in `before_build` and again in `build`, so names
/// introduced by earlier plugins are still caught. `after_build` rejects
/// any `name::` token that is left.
#[derive(Debug, Clone, Default)]
pub struct NamedPackagesPlugin {
    packages: BTreeMap<String, String>,
}

impl NamedPackagesPlugin {
    pub const NAME: &'static str = "NamedPackages";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_packages<I, N, A>(packages: I) -> Result<Self, TxError>
    where
        I: IntoIterator<Item = (N, A)>,
        N: Into<String>,
        A: Into<String>,
    {
        let mut plugin = Self::new();
        for (name, address) in packages {
            plugin.add_package(name, address)?;
        }
        Ok(plugin)
    }

    /// The address is stored as given, after checking it parses.
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<(), TxError> {
        let name = name.into();
        let address = address.into();
        if !is_valid_name(&name) {
            return Err(TxError::InvalidNamedPackage(name));
        }
        address.parse::<Address>()?;
        self.packages.insert(name, address);
        Ok(())
    }

    pub fn packages(&self) -> &BTreeMap<String, String> {
        &self.packages
    }

    fn substitute(&self, data: &mut TransactionData) {
        for command in &mut data.commands {
            match command {
                Command::MoveCall(call) => {
                    if let Some(address) = self.packages.get(&call.package) {
                        debug!("{} -> {address}", call.package);
                        call.package = address.clone();
                    }
                    for type_arg in &mut call.type_arguments {
                        self.substitute_type(type_arg);
                    }
                }
                Command::MakeMoveVec {
                    type_arg: Some(type_arg),
                    ..
                } => self.substitute_type(type_arg),
                _ => {}
            }
        }
    }

    fn substitute_type(&self, type_arg: &mut String) {
        for (name, address) in &self.packages {
            if let Some(replaced) = replace_package_prefix(type_arg, name, address) {
                *type_arg = replaced;
            }
        }
    }
}

impl TransactionPlugin for NamedPackagesPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_build(&self, data: &mut TransactionData) -> Result<(), TxError> {
        self.substitute(data);
        Ok(())
    }

    fn build(&self, data: &mut TransactionData) -> Result<(), TxError> {
        self.substitute(data);
        Ok(())
    }

    fn after_build(&self, data: &mut TransactionData) -> Result<(), TxError> {
        for command in &data.commands {
            let leftover = match command {
                Command::MoveCall(call) => find_unresolved(&call.target()).or_else(|| {
                    call.type_arguments
                        .iter()
                        .find_map(|t| find_unresolved(t))
                }),
                Command::MakeMoveVec {
                    type_arg: Some(type_arg),
                    ..
                } => find_unresolved(type_arg),
                _ => None,
            };
            if let Some(name) = leftover {
                return Err(TxError::UnresolvedNamedPackage(name));
            }
        }
        Ok(())
    }
}

/// `org/app` or `org/app/version`, where version is a positive integer.
fn is_valid_name(name: &str) -> bool {
    let segment_ok = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    };
    let parts: Vec<&str> = name.split('/').collect();
    match parts.as_slice() {
        [org, app] => segment_ok(org) && segment_ok(app),
        [org, app, version] => {
            segment_ok(org)
                && segment_ok(app)
                && version.parse::<u64>().map(|v| v > 0).unwrap_or(false)
        }
        _ => false,
    }
}

/// Replace `name::` wherever it starts a type path: at the start of the
/// text or after `<`, `,` or whitespace. `None` when nothing matched.
fn replace_package_prefix(text: &str, name: &str, address: &str) -> Option<String> {
    let needle = format!("{name}::");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut prev: Option<char> = None;
    let mut changed = false;

    while let Some(pos) = rest.find(&needle) {
        let before = rest[..pos].chars().next_back().or(prev);
        out.push_str(&rest[..pos]);
        if before.map_or(true, |c| c == '<' || c == ',' || c.is_whitespace()) {
            out.push_str(address);
            out.push_str("::");
            changed = true;
        } else {
            out.push_str(&needle);
        }
        prev = Some(':');
        rest = &rest[pos + needle.len()..];
    }
    out.push_str(rest);
    changed.then_some(out)
}

/// First `org/app` in a `org/app::...` token, if any is left.
fn find_unresolved(text: &str) -> Option<String> {
    text.split(|c: char| c == '<' || c == '>' || c == ',' || c.is_whitespace())
        .find(|token| token.contains('/') && token.contains("::"))
        .and_then(|token| token.split("::").next())
        .map(str::to_owned)
}
