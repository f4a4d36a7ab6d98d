//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

pub use builders::Scenario;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing output for the test run; honors `RUST_LOG` and is a
/// no-op after the first call.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,callback_node_rs=trace")),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Script whose callback logs the full sync payload as one line
pub const PAYLOAD_LOGGER: &str = r#"
fn __callback__(node, data) {
    let inputs = "";
    for i in data["inputs"] { inputs += i + ";"; }
    let outputs = "";
    for o in data["outputs"] { outputs += o + ";"; }
    log(data["type"] + "|" + inputs + "|" + outputs);
}
"#;

/// Script whose callback logs listen-event arguments as one line
pub const LISTEN_LOGGER: &str = r#"
fn __callback__(node, msg, plug, other) {
    if other == () {
        log(node + "<-" + plug + "@" + msg);
    } else {
        log(node + "<-" + plug + "@" + msg + "~" + other);
    }
}
"#;
