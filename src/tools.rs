//! Tool dispatch surface: an explicit static registry mapping operation
//! names to handlers. Listing queries the registry directly; there is no
//! runtime type introspection anywhere.
//!
//! Transport framing is the caller's concern; handlers only see primitive
//! string arguments and return text.

use crate::formatter::format_report;
use crate::orchestrator::{RunParams, run_all, run_scenario};
use crate::scenarios::{EmptyFieldsScenario, InvalidLoginScenario, ValidLoginScenario};
use crate::{Probe, ProbeError, Result};
use futures::future::BoxFuture;
use serde_json::{Map, Value};

pub type ToolArgs = Map<String, Value>;

type Handler = for<'a> fn(&'a Probe, ToolArgs) -> BoxFuture<'a, Result<String>>;

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    handler: Handler,
}

pub static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "helloCheck",
        description: "Says hello to the given name; verifies the tool channel works.",
        handler: hello_check,
    },
    ToolDef {
        name: "listTools",
        description: "Returns all registered tools.",
        handler: list_tools_tool,
    },
    ToolDef {
        name: "scenarioValidLogin",
        description: "Runs the valid-login scenario against the given url with the given credentials.",
        handler: scenario_valid_login,
    },
    ToolDef {
        name: "scenarioInvalidLogin",
        description: "Runs the invalid-login scenario; passes when the system rejects the credentials.",
        handler: scenario_invalid_login,
    },
    ToolDef {
        name: "scenarioEmptyFields",
        description: "Runs the empty-fields validation scenario against the given url.",
        handler: scenario_empty_fields,
    },
    ToolDef {
        name: "runAllScenarios",
        description: "Runs all three login scenarios in order and returns the detailed report.",
        handler: run_all_scenarios,
    },
];

/// One line per registered tool.
pub fn list_tools() -> String {
    TOOLS
        .iter()
        .map(|tool| format!("{} - {}", tool.name, tool.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up and invoke a tool by name. `args` must be a JSON object (or null
/// for tools without arguments).
pub async fn dispatch(probe: &Probe, name: &str, args: &Value) -> Result<String> {
    let tool = TOOLS.iter().find(|tool| tool.name == name).ok_or_else(|| {
        let available = TOOLS.iter().map(|t| t.name).collect::<Vec<_>>().join("\n  - ");
        ProbeError::InvalidInput(format!("Unknown tool '{name}'. Available tools:\n  - {available}"))
    })?;

    let args = match args {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        _ => {
            return Err(ProbeError::InvalidInput(
                "tool arguments must be a JSON object".to_string(),
            ));
        }
    };

    (tool.handler)(probe, args).await
}

fn required(args: &ToolArgs, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProbeError::InvalidInput(format!("missing required string argument '{key}'")))
}

fn optional(args: &ToolArgs, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn hello_check(_probe: &Probe, args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move {
        let name = required(&args, "name")?;
        Ok(format!("Hello {name} from loginprobe!"))
    })
}

fn list_tools_tool(_probe: &Probe, _args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move { Ok(list_tools()) })
}

fn scenario_valid_login(probe: &Probe, args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move {
        let url = required(&args, "url")?;
        let username = required(&args, "username")?;
        let password = required(&args, "password")?;
        run_scenario(probe, &ValidLoginScenario, &url, &username, &password).await
    })
}

fn scenario_invalid_login(probe: &Probe, args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move {
        let url = required(&args, "url")?;
        let username = required(&args, "username")?;
        let password = required(&args, "password")?;
        run_scenario(probe, &InvalidLoginScenario, &url, &username, &password).await
    })
}

fn scenario_empty_fields(probe: &Probe, args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move {
        let url = required(&args, "url")?;
        run_scenario(probe, &EmptyFieldsScenario, &url, "", "").await
    })
}

fn run_all_scenarios(probe: &Probe, args: ToolArgs) -> BoxFuture<'_, Result<String>> {
    Box::pin(async move {
        let url = required(&args, "url")?;
        let valid_username = required(&args, "validUsername")?;
        let valid_password = required(&args, "validPassword")?;
        let mut params = RunParams::new(&url, &valid_username, &valid_password);
        if let Some(username) = optional(&args, "invalidUsername") {
            params.invalid_username = username;
        }
        if let Some(password) = optional(&args, "invalidPassword") {
            params.invalid_password = password;
        }

        let cancel = probe.shutdown_token().child_token();
        let summary = run_all(probe, &params, &cancel).await;

        let mut report = format_report(&summary);
        if let Some(path) = probe.sink.location() {
            report.push_str(&format!("\nFull HTML report available at: {}\n", path.display()));
        }
        Ok(report)
    })
}
