//! Rhai engine wrapper for resolving and invoking callback modules.
//!
//! One [`ScriptHost`] lives inside each callback node. It owns the configured
//! Rhai engine, performs `${name}` substitution on file-path templates, and
//! invokes the resolved entry point for sync and listen callbacks.

use crate::config::CallbackConfig;
use crate::error::{CallbackError, Result, ResultExt};
use crate::scripting::{CompiledModule, SyncPayload};
use rhai::{Dynamic, Engine, Scope};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared buffer collecting messages scripts emit through `log()`
pub(crate) type ScriptLog = Arc<Mutex<Vec<String>>>;

/// The script engine bound to one callback node
pub struct ScriptHost {
    /// The Rhai engine instance
    engine: Engine,
    /// Entry-point symbol looked up on resolved modules
    entry_point: String,
    /// Substitution variables for file-path templates
    vars: HashMap<String, String>,
    /// Messages emitted by scripts via `log()`
    log: ScriptLog,
}

impl ScriptHost {
    /// Create a script host from explicit configuration
    pub fn new(config: &CallbackConfig) -> Self {
        let log: ScriptLog = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, config, log.clone());

        Self {
            engine,
            entry_point: config.entry_point.clone(),
            vars: config.script_vars.clone(),
            log,
        }
    }

    /// Configure safety limits and builtins on the Rhai engine
    fn configure_engine(engine: &mut Engine, config: &CallbackConfig, log: ScriptLog) {
        engine.set_max_expr_depths(config.max_expr_depth, config.max_expr_depth);
        engine.set_max_call_levels(config.max_call_levels);
        engine.set_max_operations(config.max_operations);

        // Diagnostics channel for callback scripts.
        {
            let log = log.clone();
            engine.register_fn("log", move |message: &str| {
                tracing::debug!(target: "callback_node::script", "{}", message);
                if let Ok(mut buf) = log.lock() {
                    buf.push(message.to_string());
                }
            });
        }

        engine.on_print(|s| tracing::info!(target: "callback_node::script", "{}", s));
        engine.on_debug(|s, source, pos| {
            tracing::debug!(target: "callback_node::script", ?source, %pos, "{}", s)
        });
    }

    /// The configured entry-point symbol name
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Substitute `${name}` tokens from the configured variables, falling
    /// back to process environment variables. Unknown tokens stay literal.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            match rest[start..].find('}') {
                Some(end) => {
                    let name = &rest[start + 2..start + end];
                    match self.lookup_var(name) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(&rest[start..=start + end]),
                    }
                    rest = &rest[start + end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn lookup_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    /// Resolve script text into a compiled module.
    ///
    /// The substituted text is tried as a filesystem path first; if it names
    /// an existing file the file contents are compiled. Otherwise the raw
    /// text itself must compile as Rhai source.
    pub fn resolve(&self, module_name: &str, script_text: &str) -> Result<CompiledModule> {
        let candidate = self.substitute(script_text);
        let path = Path::new(candidate.trim());
        if path.is_file() {
            let source = std::fs::read_to_string(path)
                .map_err(CallbackError::from)
                .with_context(|| format!("reading script file `{}`", path.display()))?;
            let ast = self.engine.compile(&source).map_err(|e| {
                CallbackError::Script(format!("{}: {}", path.display(), e))
            })?;
            return Ok(CompiledModule::new(module_name, source, ast));
        }

        let ast = self
            .engine
            .compile(script_text)
            .map_err(|e| CallbackError::Script(e.to_string()))?;
        Ok(CompiledModule::new(module_name, script_text, ast))
    }

    /// Invoke the entry point of a sync slot's module
    pub fn invoke_sync(
        &self,
        module: &CompiledModule,
        node_name: &str,
        payload: &SyncPayload,
    ) -> Result<()> {
        let mut scope = Scope::new();
        self.engine
            .call_fn::<Dynamic>(
                &mut scope,
                module.ast(),
                &self.entry_point,
                (node_name.to_string(), payload.to_map()),
            )
            .map(|_| ())
            .map_err(|e| {
                CallbackError::Script(format!("{} -> {}: {}", module.name(), self.entry_point, e))
            })
    }

    /// Invoke the entry point of a listen slot's module
    pub fn invoke_listen(
        &self,
        module: &CompiledModule,
        node_name: &str,
        message_bits: u32,
        plug_name: &str,
        other_plug_name: Option<&str>,
    ) -> Result<()> {
        let other = other_plug_name
            .map(|n| Dynamic::from(n.to_string()))
            .unwrap_or(Dynamic::UNIT);
        let mut scope = Scope::new();
        self.engine
            .call_fn::<Dynamic>(
                &mut scope,
                module.ast(),
                &self.entry_point,
                (
                    node_name.to_string(),
                    message_bits as i64,
                    plug_name.to_string(),
                    other,
                ),
            )
            .map(|_| ())
            .map_err(|e| {
                CallbackError::Script(format!("{} -> {}: {}", module.name(), self.entry_point, e))
            })
    }

    /// Take all messages scripts emitted through `log()` so far
    pub fn drain_log(&self) -> Vec<String> {
        self.log
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("entry_point", &self.entry_point)
            .field("vars", &self.vars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::CallType;
    use std::io::Write;

    fn host() -> ScriptHost {
        ScriptHost::new(&CallbackConfig::default())
    }

    #[test]
    fn test_resolve_literal_source() {
        let module = host()
            .resolve("__CallbackCache[0]__", "fn __callback__(node, data) {}")
            .unwrap();
        assert_eq!(module.name(), "__CallbackCache[0]__");
        assert!(module.has_function("__callback__"));
        assert!(!module.has_function("missing"));
    }

    #[test]
    fn test_resolve_invalid_source() {
        let err = host().resolve("__CallbackCache[0]__", "fn __callback__(");
        assert!(err.is_err());
    }

    #[test]
    fn test_resolve_file_with_substitution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cb.rhai");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "fn __callback__(node, data) {{ log(node); }}").unwrap();

        let config = CallbackConfig::new().with_var("__dir__", dir.path().to_string_lossy());
        let scripts = ScriptHost::new(&config);
        let module = scripts
            .resolve("__CallbackCache[1]__", "${__dir__}/cb.rhai")
            .unwrap();
        assert!(module.has_function("__callback__"));
        assert!(module.source().contains("log(node)"));
    }

    #[test]
    fn test_substitution_unknown_token_stays_literal() {
        let scripts = host();
        assert_eq!(
            scripts.substitute("${__no_such_var_xyz__}/cb.rhai"),
            "${__no_such_var_xyz__}/cb.rhai"
        );
    }

    #[test]
    fn test_substitution_env_fallback() {
        std::env::set_var("CBNODE_TEST_SUB_DIR", "/opt/scripts");
        let scripts = host();
        assert_eq!(
            scripts.substitute("${CBNODE_TEST_SUB_DIR}/cb.rhai"),
            "/opt/scripts/cb.rhai"
        );
        std::env::remove_var("CBNODE_TEST_SUB_DIR");
    }

    #[test]
    fn test_invoke_sync_passes_payload() {
        let scripts = host();
        let module = scripts
            .resolve(
                "__CallbackCache[0]__",
                r#"
fn __callback__(node, data) {
    log(node + "|" + data["type"] + "|" + data["inputs"][0] + "|" + data["outputs"][0]);
}
"#,
            )
            .unwrap();

        let payload = SyncPayload {
            inputs: vec!["A.out".to_string()],
            outputs: vec!["B.in".to_string()],
            call_type: CallType::Eval,
        };
        scripts.invoke_sync(&module, "cbnode1", &payload).unwrap();
        assert_eq!(scripts.drain_log(), vec!["cbnode1|eval|A.out|B.in"]);
        // Log is drained, not retained.
        assert!(scripts.drain_log().is_empty());
    }

    #[test]
    fn test_invoke_listen_with_and_without_other_plug() {
        let scripts = host();
        let module = scripts
            .resolve(
                "__CallbackCache[0]__",
                r#"
fn __callback__(node, msg, plug, other) {
    if other == () {
        log(plug + ":" + msg);
    } else {
        log(plug + ":" + msg + ":" + other);
    }
}
"#,
            )
            .unwrap();

        scripts
            .invoke_listen(&module, "cbnode1", 1, "peer.tx", None)
            .unwrap();
        scripts
            .invoke_listen(&module, "cbnode1", 2, "peer.tx", Some("cbnode1.lg[0].li[0]"))
            .unwrap();
        assert_eq!(
            scripts.drain_log(),
            vec!["peer.tx:1", "peer.tx:2:cbnode1.lg[0].li[0]"]
        );
    }

    #[test]
    fn test_invoke_missing_entry_point_fails() {
        let scripts = host();
        let module = scripts
            .resolve("__CallbackCache[0]__", "fn other_name(a, b) {}")
            .unwrap();
        let payload = SyncPayload {
            inputs: vec![],
            outputs: vec![],
            call_type: CallType::Eval,
        };
        assert!(scripts.invoke_sync(&module, "cbnode1", &payload).is_err());
    }

    #[test]
    fn test_entry_point_override() {
        let config = CallbackConfig::new().with_entry_point("on_change");
        let scripts = ScriptHost::new(&config);
        let module = scripts
            .resolve("__CallbackCache[0]__", "fn on_change(node, data) { log(\"hit\"); }")
            .unwrap();
        assert!(module.has_function("on_change"));

        let payload = SyncPayload {
            inputs: vec!["x".to_string()],
            outputs: vec!["y".to_string()],
            call_type: CallType::MakeConnection,
        };
        scripts.invoke_sync(&module, "cbnode1", &payload).unwrap();
        assert_eq!(scripts.drain_log(), vec!["hit"]);
    }
}
