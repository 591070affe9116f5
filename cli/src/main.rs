//! sendero CLI — driving adapter for the sendero dispatch engine.
//!
//! Subcommands:
//! - `check <config>` — validate a route table loads without errors
//! - `match <config> <directive> <path>` — show the chosen action and
//!   extracted parameters
//! - `rules <config> [--group <g>]` — print rewrite-rule lines for every
//!   routed action
//! - `dispatch <config> <directive> <path>` — run a full dispatch with echo
//!   handlers and print the body
//!
//! Route tables are JSON or YAML, selected by file extension. Configured
//! handlers are backed by echo handlers, so the CLI exercises the real
//! resolution, compilation, and dispatch paths without site code.

use std::process;

use sendero::{
    load_resolver, CompiledRule, Directive, DispatchError, Dispatcher, Handler, HandlerCatalog,
    Request, RequestScope, Resolver, RouteExpression, SiteConfig, DEFAULT_ACTION,
};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "check" => cmd_check(&args[2..]),
        "match" => cmd_match(&args[2..]),
        "rules" => cmd_rules(&args[2..]),
        "dispatch" => cmd_dispatch(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("check requires a config file path".into());
    }

    let config = load_config(&args[0])?;
    let handlers = config.handlers.len();
    let actions: usize = config.handlers.iter().map(|h| h.actions.len()).sum();
    build_resolver(config)?;

    println!("Config valid: {handlers} handlers, {actions} actions");
    Ok(())
}

fn cmd_match(args: &[String]) -> Result<(), String> {
    if args.len() < 3 {
        return Err("match requires <config> <directive> <path>".into());
    }

    let config = load_config(&args[0])?;
    let directive = Directive::parse(&args[1]);
    let path = &args[2];

    let resolver = build_resolver(config)?;
    let spec = resolver
        .resolve(directive.handler())
        .map_err(|e| e.to_string())?;

    let chosen = spec
        .action(directive.action())
        .or_else(|| spec.action(DEFAULT_ACTION))
        .ok_or_else(|| {
            format!(
                "action \"{}\" is not declared on handler \"{}\"",
                directive.action(),
                directive.handler()
            )
        })?;

    println!("handler:  {}", spec.name());
    println!("action:   {}", chosen.name());
    match chosen.rule().extract(path) {
        Some(params) if params.is_empty() => println!("match:    yes (no parameters)"),
        Some(params) => println!("match:    yes [{}]", params.join(", ")),
        None => println!("match:    no"),
    }

    Ok(())
}

fn cmd_rules(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("rules requires a config file path".into());
    }

    let config = load_config(&args[0])?;
    let group = parse_group(&args[1..])?;

    for handler in &config.handlers {
        for action in &handler.actions {
            let Some(template) = &action.route else {
                continue;
            };
            let expr = RouteExpression::parse(template).map_err(|e| {
                format!("{}::{}: {e}", handler.name, action.name)
            })?;
            let rule = CompiledRule::compile(&expr).map_err(|e| {
                format!("{}::{}: {e}", handler.name, action.name)
            })?;
            if let Some(pattern) = rule.pattern() {
                println!("{pattern}\t{group}|{}|{}", handler.name, action.name);
            }
        }
    }

    Ok(())
}

fn cmd_dispatch(args: &[String]) -> Result<(), String> {
    if args.len() < 3 {
        return Err("dispatch requires <config> <directive> <path>".into());
    }

    let config = load_config(&args[0])?;
    let resolver = build_resolver(config)?;
    let dispatcher = Dispatcher::builder(resolver).build();

    let request = Request::new(args[1].as_str(), args[2].as_str());
    let mut out = Vec::new();
    let report = dispatcher
        .dispatch(&request, &mut out)
        .map_err(|e| e.to_string())?;

    println!("{}", String::from_utf8_lossy(&out));
    if report.fallback_used {
        eprintln!("(fell back to the default action)");
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolver assembly (composition root)
// ═══════════════════════════════════════════════════════════════════════════════

/// Echo handler standing in for site code: prints what was invoked.
struct EchoHandler {
    name: String,
}

impl Handler for EchoHandler {
    fn call(
        &mut self,
        action: &str,
        params: &[String],
        scope: &mut RequestScope,
    ) -> Result<(), DispatchError> {
        scope.write(&format!("{}::{}({})", self.name, action, params.join(",")));
        Ok(())
    }
}

fn build_resolver(config: SiteConfig) -> Result<Resolver, String> {
    let mut catalog = HandlerCatalog::builder();
    for handler in &config.handlers {
        let name = handler.name.clone();
        catalog = catalog.handler(&handler.name, move || EchoHandler { name: name.clone() });
    }

    load_resolver(config, &catalog.build()).map_err(|e| format!("config load failed: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<SiteConfig, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    let is_json = std::path::Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_group(args: &[String]) -> Result<String, String> {
    let mut group = String::from("site");
    let mut i = 0;

    while i < args.len() {
        if args[i] == "--group" {
            i += 1;
            let value = args
                .get(i)
                .ok_or_else(|| "missing value after --group".to_owned())?;
            group = value.clone();
            i += 1;
        } else {
            return Err(format!("unexpected argument \"{}\"", args[i]));
        }
    }

    Ok(group)
}

fn print_usage() {
    eprintln!(
        "Usage: sendero <command> [options]

Commands:
  check <config>                         Validate a route table
  match <config> <directive> <path>      Show the chosen action and parameters
  rules <config> [--group <g>]           Print rewrite-rule lines
  dispatch <config> <directive> <path>   Dispatch with echo handlers
  help                                   Show this help"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.display().to_string()
    }

    const JSON_TABLE: &str = r#"{
        "handlers": [{
            "name": "blog",
            "actions": [
                { "name": "show", "route": "blog/{string:slug}" },
                { "name": "index" }
            ]
        }]
    }"#;

    const YAML_TABLE: &str = "
handlers:
  - name: user
    actions:
      - name: profile
        route: user/{number(1-11):id}/profile
";

    #[test]
    fn parse_group_default() {
        assert_eq!(parse_group(&[]).unwrap(), "site");
    }

    #[test]
    fn parse_group_override() {
        let args: Vec<String> = vec!["--group".into(), "admin".into()];
        assert_eq!(parse_group(&args).unwrap(), "admin");
    }

    #[test]
    fn parse_group_missing_value() {
        let args: Vec<String> = vec!["--group".into()];
        assert!(parse_group(&args).is_err());
    }

    #[test]
    fn parse_group_rejects_strays() {
        let args: Vec<String> = vec!["stray".into()];
        assert!(parse_group(&args).is_err());
    }

    #[test]
    fn load_json_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "table.json", JSON_TABLE);
        let config = load_config(&path).unwrap();
        assert_eq!(config.handlers[0].name, "blog");
    }

    #[test]
    fn load_yaml_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "table.yaml", YAML_TABLE);
        let config = load_config(&path).unwrap();
        assert_eq!(config.handlers[0].name, "user");
    }

    #[test]
    fn build_resolver_backs_every_configured_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "table.json", JSON_TABLE);
        let config = load_config(&path).unwrap();
        let resolver = build_resolver(config).unwrap();
        assert!(resolver.probe("blog"));
    }

    #[test]
    fn dispatch_echoes_through_configured_routes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "table.json", JSON_TABLE);
        let config = load_config(&path).unwrap();
        let dispatcher = Dispatcher::builder(build_resolver(config).unwrap()).build();

        let mut out = Vec::new();
        dispatcher
            .dispatch(&Request::new("site|blog|show", "blog/my-post"), &mut out)
            .unwrap();
        assert_eq!(out, b"blog::show(my-post)");
    }

    #[test]
    fn check_command_reports_bad_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "bad.json",
            r#"{ "handlers": [{ "name": "x", "actions": [{ "name": "a", "route": "{nope:v}" }] }] }"#,
        );
        let args: Vec<String> = vec![path];
        assert!(cmd_check(&args).is_err());
    }
}
