use super::*;
use crate::context_store::MAX_CONTEXT_CHARS;
use crate::personas::StaticPersonas;
use crate::phase::{Phase, PhaseOutcome};
use crate::rules::RuleBook;
use crate::session::{OutputFormat, Verbosity};
use crate::utility::{UtilityInvoker, UtilityOutput};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Replies with a canned output and remembers every call.
struct FakeInvoker {
    reply: UtilityOutput,
    calls: Rc<RefCell<Vec<(String, String, Vec<String>)>>>,
}

impl UtilityInvoker for FakeInvoker {
    fn invoke(&self, category: &str, name: &str, args: &[String]) -> UtilityOutput {
        self.calls
            .borrow_mut()
            .push((category.to_string(), name.to_string(), args.to_vec()));
        self.reply.clone()
    }
}

type Calls = Rc<RefCell<Vec<(String, String, Vec<String>)>>>;

fn services_with(reply: UtilityOutput) -> (Services, Calls) {
    let calls = Calls::default();
    let services = Services {
        personas: Box::new(StaticPersonas::builtin()),
        utilities: Box::new(FakeInvoker {
            reply,
            calls: Rc::clone(&calls),
        }),
        rules: RuleBook::builtin().expect("built-in rules"),
    };
    (services, calls)
}

fn orchestrator() -> Orchestrator {
    let (services, _) = services_with(UtilityOutput::failed("no utilities in this test"));
    Orchestrator::new(services)
}

/// Logs phase entries into a log the test keeps a handle to.
struct Spy {
    log: Rc<RefCell<Vec<Phase>>>,
}

impl Spy {
    fn enter(&self, phase: Phase) -> PhaseOutcome {
        self.log.borrow_mut().push(phase);
        Ok(json!({"status": "completed"}))
    }
}

impl Workflow for Spy {
    fn category(&self) -> &str {
        "spy"
    }

    fn supported_commands(&self) -> &[&'static str] {
        &["spy:run"]
    }

    fn run_initialization(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        self.enter(Phase::Initialization)
    }

    fn run_parameters(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        self.enter(Phase::Parameters)?;
        Ok(json!({"status": "completed", "visible": ctx.global_context().len()}))
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        self.enter(Phase::Workflow)?;
        ctx.result = Some(json!({"success": true, "action": "ran"}));
        Ok(json!({"status": "completed"}))
    }

    fn run_validation(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        self.enter(Phase::Validation)
    }

    fn run_output(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        self.enter(Phase::Output)
    }
}

fn with_spy() -> (Orchestrator, Rc<RefCell<Vec<Phase>>>) {
    let mut orchestrator = orchestrator();
    let log = Rc::new(RefCell::new(Vec::new()));
    orchestrator.register(Box::new(Spy {
        log: Rc::clone(&log),
    }));
    (orchestrator, log)
}

#[test]
fn unknown_category_runs_no_phase() {
    let (mut orchestrator, log) = with_spy();
    let err = orchestrator
        .dispatch("bogus:foo", Params::new())
        .expect_err("unknown category");
    assert_eq!(err.kind(), "unknown_category");
    assert!(err.to_string().contains("'bogus'"), "{err}");
    assert!(log.borrow().is_empty());
}

#[test]
fn unsupported_command_never_enters_pipeline() {
    let (mut orchestrator, log) = with_spy();
    let err = orchestrator
        .dispatch("spy:walk", Params::new().with("context", "should not land"))
        .expect_err("unsupported command");
    assert_eq!(err.kind(), "unsupported_command");
    assert!(err.to_string().contains("spy:run"), "{err}");
    assert!(log.borrow().is_empty());
    assert!(orchestrator.context_store().is_empty());
}

#[test]
fn malformed_command_is_rejected() {
    let mut orchestrator = orchestrator();
    let err = orchestrator
        .dispatch("message", Params::new())
        .expect_err("no separator");
    assert_eq!(err.kind(), "invalid_command");
}

#[test]
fn spy_sees_every_phase_in_order() {
    let (mut orchestrator, log) = with_spy();
    let result = orchestrator.dispatch("spy:run", Params::new()).expect("dispatch");
    assert_eq!(result, json!({"success": true, "action": "ran"}));
    assert_eq!(*log.borrow(), Phase::ALL.to_vec());
}

#[test]
fn message_new_returns_created_message() {
    let mut orchestrator = orchestrator();
    let result = orchestrator
        .dispatch(
            "message:new",
            Params::new()
                .with("message", "hi")
                .with("to", "discussion-moderator"),
        )
        .expect("dispatch");
    assert_eq!(
        result,
        json!({
            "success": true,
            "action": "created",
            "message": {"content": "hi", "to": "discussion-moderator"},
        })
    );
}

#[test]
fn message_recipient_defaults_to_active_agent() {
    let mut orchestrator = orchestrator();
    let result = orchestrator
        .dispatch("message:new", Params::new().with_positional("hello").with_positional("there"))
        .expect("dispatch");
    assert_eq!(result["message"]["content"], "hello there");
    assert_eq!(result["message"]["to"], "discussion-moderator");
}

#[test]
fn message_rules_report_every_violation() {
    let mut orchestrator = orchestrator();
    let err = orchestrator
        .dispatch(
            "message:new",
            Params::new()
                .with("message", "x".repeat(4001))
                .with("to", "Not An Agent"),
        )
        .expect_err("rule violations");
    assert_eq!(err.kind(), "validation_failure");
    let DispatchError::ValidationFailure { errors } = &err else {
        panic!("expected validation failure, got {err:?}");
    };
    assert_eq!(errors.len(), 2, "{errors:?}");
}

#[test]
fn verbosity_rejects_values_outside_enumeration() {
    let mut orchestrator = orchestrator();
    let err = orchestrator
        .dispatch("output:verbosity", Params::new().with("level", "extreme"))
        .expect_err("invalid level");
    assert_eq!(err.kind(), "missing_or_invalid_parameter");
    assert_eq!(
        err.to_string(),
        "invalid value 'extreme' for --level (expected one of: low, medium, high, off)"
    );
    assert_eq!(orchestrator.settings().verbosity, Verbosity::Off);
}

#[test]
fn output_commands_change_settings_until_reset() {
    let mut orchestrator = orchestrator();
    orchestrator
        .dispatch("output:verbosity", Params::new().with_positional("high"))
        .expect("verbosity");
    orchestrator
        .dispatch("output:format", Params::new().with("format", "markdown"))
        .expect("format");
    assert_eq!(orchestrator.settings().verbosity, Verbosity::High);
    assert_eq!(orchestrator.settings().format, OutputFormat::Markdown);

    orchestrator.reset_settings();
    assert_eq!(*orchestrator.settings(), SessionSettings::default());
}

#[test]
fn context_add_then_list() {
    let mut orchestrator = orchestrator();
    orchestrator
        .dispatch("meta:context", Params::new().with("add", "note"))
        .expect("add");
    let result = orchestrator
        .dispatch("meta:context", Params::new().with_flag("list"))
        .expect("list");
    assert_eq!(result["action"], "context-listed");
    let entries = result["entries"].as_array().expect("entries");
    assert!(entries.iter().any(|entry| entry["content"] == "note"));
}

#[test]
fn meta_context_needs_exactly_one_operation() {
    let mut orchestrator = orchestrator();
    let err = orchestrator
        .dispatch("meta:context", Params::new())
        .expect_err("no operation");
    assert_eq!(err.kind(), "missing_or_invalid_parameter");
    let err = orchestrator
        .dispatch("meta:context", Params::new().with_flag("list").with_flag("clear"))
        .expect_err("two operations");
    assert_eq!(err.kind(), "missing_or_invalid_parameter");
}

#[test]
fn global_context_is_visible_to_later_commands() {
    let (mut orchestrator, _log) = with_spy();
    orchestrator
        .dispatch("output:settings", Params::new().with("context", "reviewing release"))
        .expect("settings");

    let trace = orchestrator
        .dispatch_traced("spy:run", Params::new())
        .expect("spy");
    assert_eq!(trace.phase_results[&Phase::Parameters]["visible"], 1);

    let entry = &orchestrator.context_store().list()[0];
    assert_eq!(entry.command, "output:settings");
    assert_eq!(entry.content, "reviewing release");
}

#[test]
fn oversize_context_is_rejected_and_not_stored() {
    let (mut orchestrator, log) = with_spy();
    let err = orchestrator
        .dispatch(
            "spy:run",
            Params::new().with("context", "x".repeat(MAX_CONTEXT_CHARS + 1)),
        )
        .expect_err("context too long");
    assert_eq!(err.kind(), "missing_or_invalid_parameter");
    assert_eq!(*log.borrow(), vec![Phase::Initialization]);
    assert!(orchestrator.context_store().is_empty());
}

#[test]
fn save_writes_trace_with_original_params() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("traces").join("status.json");
    let mut orchestrator = orchestrator();
    let params = Params::new().with("save", path.display().to_string());
    orchestrator.dispatch("meta:status", params).expect("dispatch");

    let text = std::fs::read_to_string(&path).expect("read trace");
    let trace: Value = serde_json::from_str(&text).expect("parse trace");
    assert_eq!(trace["command"], "meta:status");
    assert_eq!(trace["params"]["flags"]["save"], path.display().to_string());
    assert_eq!(trace["result"]["action"], "status");
    assert_eq!(
        trace["phase_results"]
            .as_object()
            .expect("phase results")
            .len(),
        5
    );
}

#[test]
fn bad_save_path_is_rejected_before_workflow() {
    let (mut orchestrator, log) = with_spy();
    let err = orchestrator
        .dispatch("spy:run", Params::new().with("save", "trace.json"))
        .expect_err("relative path");
    assert!(err.to_string().contains("--save"), "{err}");
    assert_eq!(*log.borrow(), vec![Phase::Initialization]);
}

#[test]
fn agent_switch_requires_known_persona() {
    let mut orchestrator = orchestrator();
    let err = orchestrator
        .dispatch("agent:switch", Params::new().with("name", "ghost"))
        .expect_err("unknown persona");
    assert_eq!(err.kind(), "missing_or_invalid_parameter");
    assert_eq!(orchestrator.settings().active_agent, "discussion-moderator");

    let result = orchestrator
        .dispatch("agent:switch", Params::new().with_positional("architect"))
        .expect("switch");
    assert_eq!(result["previous"], "discussion-moderator");
    assert_eq!(orchestrator.settings().active_agent, "architect");

    let current = orchestrator
        .dispatch("agent:current", Params::new())
        .expect("current");
    assert_eq!(current["agent"], "architect");
}

#[test]
fn message_send_hands_off_to_utility() {
    let (services, calls) = services_with(UtilityOutput::ok("{\"id\": 42}"));
    let mut orchestrator = Orchestrator::new(services);
    let result = orchestrator
        .dispatch(
            "message:send",
            Params::new().with("message", "ship it").with("to", "qa-engineer"),
        )
        .expect("send");
    assert_eq!(result["action"], "sent");
    assert_eq!(result["delivery"], json!({"id": 42}));
    assert_eq!(
        *calls.borrow(),
        vec![(
            "message".to_string(),
            "send".to_string(),
            vec!["qa-engineer".to_string(), "ship it".to_string()],
        )]
    );
}

#[test]
fn failed_utility_aborts_dispatch() {
    let (services, _) = services_with(UtilityOutput::failed("mailbox full"));
    let mut orchestrator = Orchestrator::new(services);
    let err = orchestrator
        .dispatch("message:send", Params::new().with("message", "hello"))
        .expect_err("utility failure");
    assert_eq!(err.kind(), "utility_execution_failure");
    assert!(err.to_string().contains("mailbox full"), "{err}");
}

#[test]
fn rejected_utility_plan_never_invokes() {
    let (services, calls) = services_with(UtilityOutput::ok("done"));
    let mut orchestrator = Orchestrator::new(services);
    let err = orchestrator
        .dispatch(
            "utility:run",
            Params::new().with("category", "../etc").with("name", "passwd"),
        )
        .expect_err("bad category");
    assert_eq!(err.kind(), "validation_failure");
    assert!(calls.borrow().is_empty());
}

#[test]
fn engine_stays_usable_after_failures() {
    let mut orchestrator = orchestrator();
    assert!(orchestrator.dispatch("bogus:foo", Params::new()).is_err());
    assert!(orchestrator.dispatch("message:new", Params::new()).is_err());
    let result = orchestrator
        .dispatch("agent:list", Params::new())
        .expect("list agents");
    assert_eq!(result["active"], "discussion-moderator");
}

#[test]
fn register_replaces_existing_category() {
    let mut orchestrator = orchestrator();
    let log = Rc::new(RefCell::new(Vec::new()));
    assert!(orchestrator
        .register(Box::new(Spy {
            log: Rc::clone(&log)
        }))
        .is_none());
    let replaced = orchestrator.register(Box::new(Spy { log }));
    assert_eq!(replaced.map(|workflow| workflow.category().to_string()), Some("spy".to_string()));
    assert_eq!(orchestrator.catalog()["spy"], vec!["spy:run".to_string()]);
    assert!(orchestrator.categories().contains(&"spy"));
}

#[test]
fn blank_context_is_rejected_and_not_stored() {
    let (mut orchestrator, log) = with_spy();
    for params in [Params::new().with("context", "  "), Params::new().with_flag("context")] {
        let err = orchestrator
            .dispatch("spy:run", params)
            .expect_err("blank context");
        assert_eq!(err.kind(), "missing_or_invalid_parameter");
    }
    assert!(orchestrator.context_store().is_empty());
    assert!(!log.borrow().contains(&Phase::Workflow));
}

#[test]
fn rules_check_needs_a_named_set() {
    let mut orchestrator = orchestrator();
    for sets in [",", " , ", ""] {
        let err = orchestrator
            .dispatch(
                "rules:check",
                Params::new()
                    .with("sets", sets)
                    .with("data", r#"{"name": "Bad Name"}"#),
            )
            .expect_err(sets);
        assert_eq!(err.kind(), "missing_or_invalid_parameter", "{sets:?}");
        assert!(err.to_string().contains("--sets"), "{err}");
    }
}

#[test]
fn rules_list_names_loaded_sets() {
    let mut orchestrator = orchestrator();
    let result = orchestrator.dispatch("rules:list", Params::new()).expect("list");
    assert_eq!(result["action"], "listed");
    assert_eq!(
        result["rule_sets"],
        json!(["agent", "context", "message", "utility"])
    );
}

#[test]
fn meta_commands_reports_catalog() {
    let mut orchestrator = orchestrator();
    let result = orchestrator
        .dispatch("meta:commands", Params::new())
        .expect("commands");
    assert_eq!(result["action"], "commands");
    assert_eq!(result["commands"]["rules"], json!(["rules:list", "rules:check"]));
    assert_eq!(
        result["commands"]
            .as_object()
            .expect("catalog")
            .len(),
        orchestrator.categories().len()
    );
}

#[test]
fn utility_run_invokes_with_positionals() {
    let (services, calls) = services_with(UtilityOutput::ok("{\"lines\": 12}"));
    let mut orchestrator = Orchestrator::new(services);
    let result = orchestrator
        .dispatch(
            "utility:run",
            Params::new()
                .with("category", "lint")
                .with("name", "markdown")
                .with_positional("README.md")
                .with_positional("--strict"),
        )
        .expect("run");
    assert_eq!(result["action"], "ran");
    assert_eq!(result["utility"]["args"], json!(["README.md", "--strict"]));
    assert_eq!(result["output"], json!({"lines": 12}));
    assert_eq!(
        *calls.borrow(),
        vec![(
            "lint".to_string(),
            "markdown".to_string(),
            vec!["README.md".to_string(), "--strict".to_string()],
        )]
    );
}

#[test]
fn utility_run_failure_names_the_utility() {
    let (services, calls) = services_with(UtilityOutput::failed("exited with status 2"));
    let mut orchestrator = Orchestrator::new(services);
    let err = orchestrator
        .dispatch(
            "utility:run",
            Params::new().with("category", "lint").with("name", "markdown"),
        )
        .expect_err("utility failure");
    assert_eq!(err.kind(), "utility_execution_failure");
    assert_eq!(
        err.to_string(),
        "utility lint/markdown failed: exited with status 2"
    );
    assert_eq!(calls.borrow().len(), 1);
}
