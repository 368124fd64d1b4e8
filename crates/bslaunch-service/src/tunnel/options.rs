//! Tunnel start options.

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Options handed to a tunnel process on start.
///
/// Keys follow the BrowserStack Local naming (`key`, `forcelocal`,
/// `onlyAutomate`, `localIdentifier`, ...). Insertion order is kept so the
/// rendered command line is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TunnelOptions(Map<String, Value>);

impl TunnelOptions {
    /// Base options for `key`, with `overrides` applied on top.
    pub fn build(key: Option<&str>, overrides: &Map<String, Value>) -> Self {
        let mut opts = Map::new();
        if let Some(key) = key {
            opts.insert("key".into(), Value::from(key));
        }
        opts.insert("forcelocal".into(), Value::Bool(true));
        opts.insert("onlyAutomate".into(), Value::Bool(true));
        for (name, value) in overrides {
            opts.insert(name.clone(), value.clone());
        }
        Self(opts)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn key(&self) -> Option<&str> {
        self.0.get("key").and_then(Value::as_str)
    }

    pub fn force_local(&self) -> bool {
        self.flag("forcelocal")
    }

    pub fn only_automate(&self) -> bool {
        self.flag("onlyAutomate")
    }

    pub fn local_identifier(&self) -> Option<String> {
        self.0.get("localIdentifier").and_then(scalar)
    }

    /// Executable override; never rendered as an argument.
    pub fn binary_path(&self) -> Option<PathBuf> {
        self.0
            .get("binarypath")
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    fn flag(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(truthy)
    }

    /// Render the options as BrowserStackLocal command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (name, value) in &self.0 {
            match name.as_str() {
                "binarypath" => {}
                "key" => push_valued(&mut args, "--key", value),
                "forcelocal" => push_flag(&mut args, "--force-local", value),
                "onlyAutomate" => push_flag(&mut args, "--only-automate", value),
                "force" => push_flag(&mut args, "--force", value),
                "forceProxy" => push_flag(&mut args, "--force-proxy", value),
                "localIdentifier" => push_valued(&mut args, "--local-identifier", value),
                "f" | "folder" => push_valued(&mut args, "-f", value),
                "logFile" => push_valued(&mut args, "--log-file", value),
                "proxyHost" => push_valued(&mut args, "--proxy-host", value),
                "proxyPort" => push_valued(&mut args, "--proxy-port", value),
                "proxyUser" => push_valued(&mut args, "--proxy-user", value),
                "proxyPass" => push_valued(&mut args, "--proxy-pass", value),
                "parallelRuns" => push_valued(&mut args, "--parallel-runs", value),
                "verbose" => match value {
                    Value::Bool(true) => args.push("--verbose".into()),
                    Value::Number(_) | Value::String(_) => {
                        push_valued(&mut args, "--verbose", value);
                    }
                    _ => {}
                },
                other => match value {
                    Value::Bool(true) => args.push(format!("--{other}")),
                    Value::Number(_) | Value::String(_) => {
                        push_valued(&mut args, &format!("--{other}"), value);
                    }
                    _ => {}
                },
            }
        }
        args
    }

    /// Arguments identifying this tunnel to `--daemon stop`.
    pub fn identity_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(key) = self.key() {
            args.push("--key".into());
            args.push(key.into());
        }
        if let Some(id) = self.local_identifier() {
            args.push("--local-identifier".into());
            args.push(id);
        }
        args
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: &Value) {
    if truthy(value) {
        args.push(flag.into());
    }
}

fn push_valued(args: &mut Vec<String>, flag: &str, value: &Value) {
    if let Some(value) = scalar(value) {
        args.push(flag.into());
        args.push(value);
    }
}
