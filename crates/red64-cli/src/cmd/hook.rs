use crate::output::print_json_line;
use crate::root;
use anyhow::Context;
use clap::Subcommand;
use red64_core::config::Config;
use red64_core::context::ContextAssembler;
use red64_core::paths;
use red64_core::standards::FsStandardsStore;
use red64_core::types::TaskType;
use red64_core::validator::{EditRequest, EditValidator, Verdict};
use red64_core::Red64Error;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const EXIT_OK: i32 = 0;
/// Tells the host to stop and show `additionalContext` to the user.
pub const EXIT_BLOCKING: i32 = 2;

const PROMPT_EVENT: &str = "UserPromptSubmit";

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum HookSubcommand {
    /// Prompt-submit hook: read a prompt payload on stdin, emit context JSON
    Context,

    /// Pre-tool-use hook: read an Edit/Write payload on stdin, emit a verdict
    Validate,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PromptPayload {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default)]
    plugins_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolInput {
    #[serde(default)]
    file_path: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    new_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolPayload {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: ToolInput,
    #[serde(default)]
    cwd: Option<PathBuf>,
    #[serde(default)]
    plugins_dir: Option<PathBuf>,
}

impl ToolPayload {
    /// `content` for Write; Edit payloads carry the replacement in `new_string`.
    fn edit_request(&self) -> EditRequest {
        let content = match (&self.tool_input.content, &self.tool_input.new_string) {
            (Some(c), _) if !c.is_empty() => c.clone(),
            (_, Some(s)) if self.tool_name == "Edit" => s.clone(),
            (c, _) => c.clone().unwrap_or_default(),
        };
        EditRequest {
            tool_name: self.tool_name.clone(),
            file_path: self.tool_input.file_path.clone(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HookSpecificOutput {
    hook_event_name: &'static str,
    additional_context: String,
}

#[derive(Debug, Serialize)]
struct ContextOutput {
    #[serde(rename = "hookSpecificOutput")]
    hook_specific_output: HookSpecificOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_types: Option<Vec<String>>,
}

impl ContextOutput {
    fn success(additional_context: String, task_type: TaskType, file_types: Vec<String>) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: PROMPT_EVENT,
                additional_context,
            },
            task_type: Some(task_type),
            file_types: Some(file_types),
        }
    }

    fn error(message: String) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: PROMPT_EVENT,
                additional_context: message,
            },
            task_type: None,
            file_types: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Returns the process exit code the host expects.
pub fn run(explicit_root: Option<&Path>, subcmd: HookSubcommand) -> anyhow::Result<i32> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read hook payload from stdin")?;

    match subcmd {
        HookSubcommand::Context => context(explicit_root, &input),
        HookSubcommand::Validate => validate(explicit_root, &input),
    }
}

fn project_root(explicit: Option<&Path>, cwd: Option<&Path>) -> red64_core::Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => {
            let start = cwd.map(Path::to_path_buf).unwrap_or_else(root::current_dir);
            paths::find_project_root(&start)
        }
    }
}

fn config_error_message(err: &Red64Error) -> String {
    match err {
        Red64Error::ConfigMalformed(detail) => format!(
            "Error: Red64 configuration is malformed. {detail} \
             Please run /red64:init to reinitialize your project."
        ),
        _ => "Error: Red64 configuration not found. \
              Please run /red64:init to initialize your project."
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// context
// ---------------------------------------------------------------------------

fn context(explicit_root: Option<&Path>, input: &str) -> anyhow::Result<i32> {
    let payload: PromptPayload = match serde_json::from_str(input) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable prompt payload");
            print_json_line(&ContextOutput::error(
                "Error: Invalid JSON input. Please run /red64:init to set up your project."
                    .to_string(),
            ))?;
            return Ok(EXIT_BLOCKING);
        }
    };

    let root = match project_root(explicit_root, payload.cwd.as_deref()) {
        Ok(root) => root,
        Err(e) => {
            print_json_line(&ContextOutput::error(config_error_message(&e)))?;
            return Ok(EXIT_BLOCKING);
        }
    };
    let plugins_dir = payload
        .plugins_dir
        .clone()
        .unwrap_or_else(|| paths::plugins_dir(&root));

    let assembler = ContextAssembler::for_project(&root, &plugins_dir);
    match assembler.assemble(&payload.prompt, Config::load(&root)) {
        Ok(assembled) => {
            print_json_line(&ContextOutput::success(
                assembled.additional_context,
                assembled.task_type,
                assembled.file_types,
            ))?;
            Ok(EXIT_OK)
        }
        Err(e) if e.is_config_error() => {
            print_json_line(&ContextOutput::error(config_error_message(&e)))?;
            Ok(EXIT_BLOCKING)
        }
        Err(e) => Err(e).context("context assembly failed"),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(explicit_root: Option<&Path>, input: &str) -> anyhow::Result<i32> {
    let verdict = match serde_json::from_str::<ToolPayload>(input) {
        Ok(payload) => validate_payload(explicit_root, &payload),
        Err(e) => {
            tracing::warn!(error = %e, "unparsable tool payload, allowing");
            Verdict::allow()
        }
    };
    print_json_line(&verdict)?;
    Ok(EXIT_OK)
}

/// Anything that keeps the validator from running allows the write.
fn validate_payload(explicit_root: Option<&Path>, payload: &ToolPayload) -> Verdict {
    let root = match project_root(explicit_root, payload.cwd.as_deref()) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!(error = %e, "no project root, allowing");
            return Verdict::allow();
        }
    };
    let config = match Config::load(&root) {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(error = %e, "config unavailable, allowing");
            return Verdict::allow();
        }
    };
    let plugins_dir = payload
        .plugins_dir
        .clone()
        .unwrap_or_else(|| paths::plugins_dir(&root));

    let mut validator = EditValidator::new(FsStandardsStore::new(plugins_dir));
    validator
        .validate(&payload.edit_request(), &config.standards.enabled)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "validation failed, allowing");
            Verdict::allow()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ToolPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn edit_falls_back_to_new_string() {
        let p = payload(
            r#"{"tool_name":"Edit","tool_input":{"file_path":"a.ts","old_string":"x","new_string":"var y"}}"#,
        );
        assert_eq!(p.edit_request().content, "var y");
    }

    #[test]
    fn write_uses_content_only() {
        let p = payload(
            r#"{"tool_name":"Write","tool_input":{"file_path":"a.ts","content":"let a","new_string":"var y"}}"#,
        );
        assert_eq!(p.edit_request().content, "let a");

        let p = payload(r#"{"tool_name":"Write","tool_input":{"file_path":"a.ts","new_string":"var y"}}"#);
        assert_eq!(p.edit_request().content, "");
    }

    #[test]
    fn missing_fields_default() {
        let p = payload("{}");
        let req = p.edit_request();
        assert!(req.tool_name.is_empty());
        assert!(req.file_path.is_empty());
    }

    #[test]
    fn context_output_shape() {
        let out = ContextOutput::success("ctx".into(), TaskType::Debug, vec![".ts".into()]);
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["hookSpecificOutput"]["hookEventName"], "UserPromptSubmit");
        assert_eq!(v["hookSpecificOutput"]["additionalContext"], "ctx");
        assert_eq!(v["task_type"], "debug");
        assert_eq!(v["file_types"][0], ".ts");

        let v = serde_json::to_value(ContextOutput::error("boom".into())).unwrap();
        assert!(v.get("task_type").is_none());
    }

    #[test]
    fn malformed_message_mentions_detail() {
        let msg = config_error_message(&Red64Error::ConfigMalformed("bad indent".into()));
        assert!(msg.contains("malformed. bad indent Please run /red64:init"));
        let msg = config_error_message(&Red64Error::ConfigNotFound);
        assert!(msg.contains("not found"));
    }
}
