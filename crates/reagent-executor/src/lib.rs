//! Restricted code executor for agent-generated snippets.
//!
//! The agent loop hands each extracted code block to a [`CodeExecutor`]. The
//! shipped implementation, [`RestrictedExecutor`], interprets the linear
//! Python subset the system prompt asks the model to write: imports checked
//! against an allow-list, assignments, literals, arithmetic, f-strings, list
//! indexing, `print`, and calls to registered tools or a handful of builtins.
//! Anything outside that surface halts the snippet with a containment error
//! that is rendered into the execution log — never raised to the loop.
//!
//! Variables persist across `execute` calls for the lifetime of the executor,
//! so a snippet can build on results printed in an earlier step.

use std::collections::HashMap;
use std::sync::Arc;

use async_recursion::async_recursion;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use reagent_tools::ToolRegistry;

mod ast;
pub mod value;

use ast::{BinOp, Expr, Stmt};
pub use value::Value;

/// Failure inside a snippet. All variants end up as text in the execution
/// log; none of them propagate past [`CodeExecutor::execute`].
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The snippet tried to reach outside the allowed surface.
    #[error("{0}")]
    Containment(String),

    #[error("{0}")]
    Runtime(String),

    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },
}

/// Result of executing one snippet.
#[derive(Debug)]
pub struct Execution {
    /// Final-answer payload when `is_final_answer` is set; otherwise the last
    /// evaluated non-`None` value, if any.
    pub value: Option<Value>,
    /// Human-readable log of printed output and error text. This, not the
    /// value, is what goes back into the next prompt.
    pub logs: String,
    /// True exactly when the terminal tool was invoked.
    pub is_final_answer: bool,
}

/// The executor collaborator interface used by the agent loop.
///
/// `execute` is infallible by contract: every failure is captured into the
/// execution log so the loop always completes the step and the model gets to
/// see what went wrong.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: Option<&str>) -> Execution;
}

const NO_CODE_MESSAGE: &str = "Error: no code block found in the reply. Write your code in a ```py fenced block ending with ```<end_code>.";

pub struct RestrictedExecutor {
    tools: Arc<ToolRegistry>,
    authorized_imports: Vec<String>,
    env: Mutex<HashMap<String, Value>>,
}

impl RestrictedExecutor {
    pub fn new(tools: Arc<ToolRegistry>, authorized_imports: Vec<String>) -> Self {
        Self {
            tools,
            authorized_imports,
            env: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CodeExecutor for RestrictedExecutor {
    async fn execute(&self, code: Option<&str>) -> Execution {
        let Some(code) = code else {
            return Execution {
                value: None,
                logs: NO_CODE_MESSAGE.to_string(),
                is_final_answer: false,
            };
        };

        debug!(code_len = code.len(), "executing snippet");

        let stmts = match ast::parse_program(code) {
            Ok(stmts) => stmts,
            Err(e) => {
                return Execution {
                    value: None,
                    logs: format!("Code execution failed: {e}"),
                    is_final_answer: false,
                };
            }
        };

        let mut env = self.env.lock().await;
        let mut prints: Vec<String> = Vec::new();
        let mut final_answer: Option<Value> = None;
        let mut last_value = Value::None;
        let mut error: Option<ExecError> = None;

        {
            let mut eval = Evaluator {
                tools: &self.tools,
                authorized_imports: &self.authorized_imports,
                env: &mut *env,
                prints: &mut prints,
                final_answer: &mut final_answer,
            };

            for stmt in &stmts {
                match eval.eval_stmt(stmt).await {
                    Ok(value) => {
                        last_value = value;
                        if eval.final_answer.is_some() {
                            break;
                        }
                    }
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                }
            }
        }

        let mut logs = prints.join("\n");

        if let Some(err) = &error {
            if !logs.is_empty() {
                logs.push('\n');
            }
            logs.push_str(&format!("Code execution failed: {err}"));
            return Execution {
                value: None,
                logs,
                is_final_answer: false,
            };
        }

        if let Some(answer) = final_answer {
            return Execution {
                value: Some(answer),
                logs,
                is_final_answer: true,
            };
        }

        if !last_value.is_none() {
            if !logs.is_empty() {
                logs.push('\n');
            }
            logs.push_str(&format!("Last output from code snippet: {last_value}"));
            return Execution {
                value: Some(last_value),
                logs,
                is_final_answer: false,
            };
        }

        Execution {
            value: None,
            logs,
            is_final_answer: false,
        }
    }
}

struct Evaluator<'a> {
    tools: &'a ToolRegistry,
    authorized_imports: &'a [String],
    env: &'a mut HashMap<String, Value>,
    prints: &'a mut Vec<String>,
    final_answer: &'a mut Option<Value>,
}

impl Evaluator<'_> {
    async fn eval_stmt(&mut self, stmt: &Stmt) -> Result<Value, ExecError> {
        match stmt {
            Stmt::Import { module, base } => {
                if !self.authorized_imports.iter().any(|m| m == base) {
                    return Err(ExecError::Containment(format!(
                        "Import of '{module}' is not allowed. Authorized imports are: [{}]",
                        self.authorized_imports.join(", ")
                    )));
                }
                // The import is permitted but the interpreter carries no
                // module bindings; tools and builtins are the working surface.
                Ok(Value::None)
            }
            Stmt::Assign(name, expr) => {
                let value = self.eval_expr(expr).await?;
                self.env.insert(name.clone(), value);
                Ok(Value::None)
            }
            Stmt::Expr(expr) => self.eval_expr(expr).await,
        }
    }

    #[async_recursion]
    async fn eval_expr(&mut self, expr: &Expr) -> Result<Value, ExecError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::FStr(s) => self.eval_fstring(s).await,
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::NoneLit => Ok(Value::None),
            Expr::Name(name) => self.env.get(name).cloned().ok_or_else(|| {
                ExecError::Runtime(format!("The variable '{name}' is not defined"))
            }),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item).await?);
                }
                Ok(Value::List(values))
            }
            Expr::Neg(inner) => match self.eval_expr(inner).await? {
                Value::Num(n) => Ok(Value::Num(-n)),
                other => Err(ExecError::Runtime(format!(
                    "bad operand type for unary -: '{}'",
                    other.type_name()
                ))),
            },
            Expr::BinOp(op, lhs, rhs) => {
                let left = self.eval_expr(lhs).await?;
                let right = self.eval_expr(rhs).await?;
                apply_binop(*op, left, right)
            }
            Expr::Index(target, index) => {
                let target = self.eval_expr(target).await?;
                let index = self.eval_expr(index).await?;
                apply_index(target, index)
            }
            Expr::Call { name, args, kwargs } => self.eval_call(name, args, kwargs).await,
        }
    }

    async fn eval_fstring(&mut self, body: &str) -> Result<Value, ExecError> {
        let mut out = String::new();
        let chars: Vec<char> = body.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    out.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    out.push('}');
                    i += 2;
                }
                '{' => {
                    let Some(end) = chars[i + 1..].iter().position(|c| *c == '}') else {
                        return Err(ExecError::Syntax(
                            "unmatched '{' in f-string".to_string(),
                        ));
                    };
                    let inner: String = chars[i + 1..i + 1 + end].iter().collect();
                    let expr = ast::parse_expression(&inner)?;
                    let value = self.eval_expr(&expr).await?;
                    out.push_str(&value.to_string());
                    i += end + 2;
                }
                '}' => {
                    return Err(ExecError::Syntax(
                        "unmatched '}' in f-string".to_string(),
                    ));
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }
        Ok(Value::Str(out))
    }

    #[async_recursion]
    async fn eval_call(
        &mut self,
        name: &str,
        args: &[Expr],
        kwargs: &[(String, Expr)],
    ) -> Result<Value, ExecError> {
        // Builtins first — they shadow nothing since tool names never collide
        // with them in practice, and the registry rejects duplicates anyway.
        match name {
            "print" => {
                if !kwargs.is_empty() {
                    return Err(ExecError::Runtime(
                        "print does not support keyword arguments here".to_string(),
                    ));
                }
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.eval_expr(arg).await?.to_string());
                }
                self.prints.push(parts.join(" "));
                return Ok(Value::None);
            }
            "len" | "str" | "int" | "float" | "abs" | "round" | "min" | "max" => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg).await?);
                }
                if !kwargs.is_empty() {
                    return Err(ExecError::Runtime(format!(
                        "{name}() does not support keyword arguments"
                    )));
                }
                return apply_builtin(name, values);
            }
            _ => {}
        }

        if name == self.tools.terminal_name() {
            let answer = if let Some(first) = args.first() {
                self.eval_expr(first).await?
            } else if let Some((_, expr)) = kwargs.iter().find(|(k, _)| k == "answer") {
                self.eval_expr(expr).await?
            } else {
                return Err(ExecError::Runtime(format!(
                    "{name}() requires an answer argument"
                )));
            };
            *self.final_answer = Some(answer.clone());
            return Ok(answer);
        }

        let Some(tool) = self.tools.get(name) else {
            return Err(ExecError::Containment(format!(
                "Forbidden function evaluation: '{name}' is not among the explicitly allowed tools"
            )));
        };

        let spec = tool.parameters();
        let mut params = serde_json::Map::new();

        for (i, arg) in args.iter().enumerate() {
            let Some(param) = spec.get(i) else {
                return Err(ExecError::Runtime(format!(
                    "{name}() takes at most {} positional arguments",
                    spec.len()
                )));
            };
            let value = self.eval_expr(arg).await?;
            params.insert(param.name.to_string(), value.to_json());
        }
        for (key, expr) in kwargs {
            if !spec.iter().any(|p| p.name == key) {
                return Err(ExecError::Runtime(format!(
                    "{name}() got an unexpected keyword argument '{key}'"
                )));
            }
            let value = self.eval_expr(expr).await?;
            params.insert(key.clone(), value.to_json());
        }

        debug!(tool = %name, "invoking tool");
        let output = tool
            .invoke(serde_json::Value::Object(params))
            .await
            .map_err(|e| ExecError::Tool {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        if output.is_error {
            return Err(ExecError::Tool {
                name: name.to_string(),
                message: output.content,
            });
        }

        Ok(Value::Str(output.content))
    }
}

fn apply_binop(op: BinOp, left: Value, right: Value) -> Result<Value, ExecError> {
    match (op, &left, &right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::List(items))
        }
        (BinOp::Mul, Value::Str(s), Value::Num(n)) | (BinOp::Mul, Value::Num(n), Value::Str(s)) => {
            if n.fract() != 0.0 || *n < 0.0 {
                return Err(ExecError::Runtime(
                    "string repetition needs a non-negative integer".to_string(),
                ));
            }
            Ok(Value::Str(s.repeat(*n as usize)))
        }
        (op, Value::Num(a), Value::Num(b)) => {
            let result = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => {
                    if *b == 0.0 {
                        return Err(ExecError::Runtime("division by zero".to_string()));
                    }
                    a / b
                }
                BinOp::FloorDiv => {
                    if *b == 0.0 {
                        return Err(ExecError::Runtime("division by zero".to_string()));
                    }
                    (a / b).floor()
                }
                BinOp::Mod => {
                    if *b == 0.0 {
                        return Err(ExecError::Runtime("division by zero".to_string()));
                    }
                    a.rem_euclid(*b)
                }
            };
            Ok(Value::Num(result))
        }
        _ => Err(ExecError::Runtime(format!(
            "unsupported operand types for '{}': {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn apply_index(target: Value, index: Value) -> Result<Value, ExecError> {
    let Value::Num(raw) = index else {
        return Err(ExecError::Runtime(format!(
            "indices must be integers, not {}",
            index.type_name()
        )));
    };
    if raw.fract() != 0.0 {
        return Err(ExecError::Runtime(
            "indices must be integers".to_string(),
        ));
    }
    let idx = raw as i64;

    match target {
        Value::List(items) => {
            let len = items.len() as i64;
            let effective = if idx < 0 { len + idx } else { idx };
            if effective < 0 || effective >= len {
                return Err(ExecError::Runtime("list index out of range".to_string()));
            }
            Ok(items[effective as usize].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let effective = if idx < 0 { len + idx } else { idx };
            if effective < 0 || effective >= len {
                return Err(ExecError::Runtime("string index out of range".to_string()));
            }
            Ok(Value::Str(chars[effective as usize].to_string()))
        }
        other => Err(ExecError::Runtime(format!(
            "'{}' is not subscriptable",
            other.type_name()
        ))),
    }
}

fn apply_builtin(name: &str, values: Vec<Value>) -> Result<Value, ExecError> {
    let arity = |n: usize| -> Result<(), ExecError> {
        if values.len() != n {
            return Err(ExecError::Runtime(format!(
                "{name}() takes exactly {n} argument{}",
                if n == 1 { "" } else { "s" }
            )));
        }
        Ok(())
    };

    match name {
        "len" => {
            arity(1)?;
            match &values[0] {
                Value::Str(s) => Ok(Value::Num(s.chars().count() as f64)),
                Value::List(items) => Ok(Value::Num(items.len() as f64)),
                other => Err(ExecError::Runtime(format!(
                    "object of type '{}' has no len()",
                    other.type_name()
                ))),
            }
        }
        "str" => {
            arity(1)?;
            Ok(Value::Str(values[0].to_string()))
        }
        "int" => {
            arity(1)?;
            match &values[0] {
                Value::Num(n) => Ok(Value::Num(n.trunc())),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(|n| Value::Num(n.trunc()))
                    .map_err(|_| {
                        ExecError::Runtime(format!("invalid literal for int(): '{s}'"))
                    }),
                other => Err(ExecError::Runtime(format!(
                    "int() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            }
        }
        "float" => {
            arity(1)?;
            match &values[0] {
                Value::Num(n) => Ok(Value::Num(*n)),
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Num).map_err(|_| {
                    ExecError::Runtime(format!("could not convert string to float: '{s}'"))
                }),
                other => Err(ExecError::Runtime(format!(
                    "float() argument must be a string or a number, not '{}'",
                    other.type_name()
                ))),
            }
        }
        "abs" => {
            arity(1)?;
            match &values[0] {
                Value::Num(n) => Ok(Value::Num(n.abs())),
                other => Err(ExecError::Runtime(format!(
                    "bad operand type for abs(): '{}'",
                    other.type_name()
                ))),
            }
        }
        "round" => {
            if values.is_empty() || values.len() > 2 {
                return Err(ExecError::Runtime(
                    "round() takes one or two arguments".to_string(),
                ));
            }
            let Value::Num(n) = &values[0] else {
                return Err(ExecError::Runtime(format!(
                    "round() argument must be a number, not '{}'",
                    values[0].type_name()
                )));
            };
            let digits = match values.get(1) {
                None => 0,
                Some(Value::Num(d)) if d.fract() == 0.0 => *d as i32,
                Some(other) => {
                    return Err(ExecError::Runtime(format!(
                        "round() digits must be an integer, not '{}'",
                        other.type_name()
                    )));
                }
            };
            let factor = 10f64.powi(digits);
            Ok(Value::Num((n * factor).round() / factor))
        }
        "min" | "max" => {
            let nums: Vec<f64> = match values.as_slice() {
                [Value::List(items)] => items
                    .iter()
                    .map(|v| match v {
                        Value::Num(n) => Ok(*n),
                        other => Err(ExecError::Runtime(format!(
                            "{name}() only supports numbers, got '{}'",
                            other.type_name()
                        ))),
                    })
                    .collect::<Result<_, _>>()?,
                _ => values
                    .iter()
                    .map(|v| match v {
                        Value::Num(n) => Ok(*n),
                        other => Err(ExecError::Runtime(format!(
                            "{name}() only supports numbers, got '{}'",
                            other.type_name()
                        ))),
                    })
                    .collect::<Result<_, _>>()?,
            };
            if nums.is_empty() {
                return Err(ExecError::Runtime(format!("{name}() of empty sequence")));
            }
            let folded = if name == "min" {
                nums.iter().cloned().fold(f64::INFINITY, f64::min)
            } else {
                nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            };
            Ok(Value::Num(folded))
        }
        _ => unreachable!("apply_builtin called with unknown builtin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reagent_core::types::{ParamSpec, ValueKind};
    use reagent_tools::{Tool, ToolOutput};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back its input text."
        }
        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec {
                name: "text",
                kind: ValueKind::Text,
                description: "Text to echo.",
            }]
        }
        fn output_kind(&self) -> ValueKind {
            ValueKind::Text
        }
        async fn invoke(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text(
                args["text"].as_str().unwrap_or_default().to_string(),
            ))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "lookup"
        }
        fn description(&self) -> &str {
            "Always fails."
        }
        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec {
                name: "query",
                kind: ValueKind::Text,
                description: "Query.",
            }]
        }
        fn output_kind(&self) -> ValueKind {
            ValueKind::Text
        }
        async fn invoke(&self, _args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::error(
                "No results found! Try a less restrictive/shorter query.",
            ))
        }
    }

    fn executor() -> RestrictedExecutor {
        let registry = ToolRegistry::with_tools(vec![
            Box::new(EchoTool),
            Box::new(FailingTool),
        ])
        .unwrap();
        RestrictedExecutor::new(
            Arc::new(registry),
            vec!["math".to_string(), "datetime".to_string()],
        )
    }

    #[tokio::test]
    async fn test_final_answer_terminates() {
        let exec = executor();
        let result = exec.execute(Some("final_answer(4)")).await;
        assert!(result.is_final_answer);
        assert_eq!(result.value, Some(Value::Num(4.0)));
        assert_eq!(result.value.unwrap().to_string(), "4");
    }

    #[tokio::test]
    async fn test_final_answer_keyword_form() {
        let exec = executor();
        let result = exec.execute(Some("final_answer(answer='done')")).await;
        assert!(result.is_final_answer);
        assert_eq!(result.value, Some(Value::Str("done".into())));
    }

    #[tokio::test]
    async fn test_final_answer_stops_remaining_statements() {
        let exec = executor();
        let result = exec
            .execute(Some("final_answer('early')\nprint('unreachable')"))
            .await;
        assert!(result.is_final_answer);
        assert!(!result.logs.contains("unreachable"));
    }

    #[tokio::test]
    async fn test_print_capture() {
        let exec = executor();
        let result = exec.execute(Some("print('hello')\nprint(1 + 1)")).await;
        assert!(!result.is_final_answer);
        assert_eq!(result.logs, "hello\n2");
    }

    #[tokio::test]
    async fn test_state_persists_between_executions() {
        let exec = executor();
        exec.execute(Some("x = 21")).await;
        let result = exec.execute(Some("print(x * 2)")).await;
        assert_eq!(result.logs, "42");
    }

    #[tokio::test]
    async fn test_no_code_sentinel() {
        let exec = executor();
        let result = exec.execute(None).await;
        assert!(!result.is_final_answer);
        assert!(result.logs.contains("no code block found"));
    }

    #[tokio::test]
    async fn test_division_by_zero_recovered_into_log() {
        let exec = executor();
        let result = exec.execute(Some("x = 1 / 0")).await;
        assert!(!result.is_final_answer);
        assert!(result.value.is_none());
        assert!(result.logs.contains("Code execution failed"));
        assert!(result.logs.contains("division by zero"));
    }

    #[tokio::test]
    async fn test_unknown_call_is_containment_error() {
        let exec = executor();
        let result = exec.execute(Some("os_system('ls')")).await;
        assert!(result.logs.contains("Forbidden function evaluation"));
        assert!(result.logs.contains("os_system"));
    }

    #[tokio::test]
    async fn test_disallowed_import() {
        let exec = executor();
        let result = exec.execute(Some("import os")).await;
        assert!(result.logs.contains("Import of 'os' is not allowed"));
    }

    #[tokio::test]
    async fn test_allowed_import_is_noop() {
        let exec = executor();
        let result = exec.execute(Some("import math\nfinal_answer(1)")).await;
        assert!(result.is_final_answer);
    }

    #[tokio::test]
    async fn test_tool_invocation_result_is_text() {
        let exec = executor();
        let result = exec
            .execute(Some("r = echo(text='observed')\nprint(r)"))
            .await;
        assert_eq!(result.logs, "observed");
    }

    #[tokio::test]
    async fn test_tool_positional_argument() {
        let exec = executor();
        let result = exec.execute(Some("print(echo('positional'))")).await;
        assert_eq!(result.logs, "positional");
    }

    #[tokio::test]
    async fn test_tool_error_halts_snippet() {
        let exec = executor();
        let result = exec
            .execute(Some("r = lookup(query='nothing')\nprint('after')"))
            .await;
        assert!(result.logs.contains("Tool 'lookup' failed"));
        assert!(result.logs.contains("No results found"));
        assert!(!result.logs.contains("after"));
    }

    #[tokio::test]
    async fn test_prints_kept_before_error() {
        let exec = executor();
        let result = exec.execute(Some("print('first')\nx = 1 / 0")).await;
        assert!(result.logs.starts_with("first\n"));
        assert!(result.logs.contains("division by zero"));
    }

    #[tokio::test]
    async fn test_last_output_line_for_bare_expression() {
        let exec = executor();
        let result = exec.execute(Some("1 + 2")).await;
        assert_eq!(result.logs, "Last output from code snippet: 3");
        assert_eq!(result.value, Some(Value::Num(3.0)));
    }

    #[tokio::test]
    async fn test_fstring_interpolation() {
        let exec = executor();
        let result = exec
            .execute(Some("name = 'world'\nprint(f'hello {name}')"))
            .await;
        assert_eq!(result.logs, "hello world");
    }

    #[tokio::test]
    async fn test_list_indexing() {
        let exec = executor();
        let result = exec
            .execute(Some("items = ['a', 'b', 'c']\nprint(items[-1])"))
            .await;
        assert_eq!(result.logs, "c");
    }

    #[tokio::test]
    async fn test_undefined_variable() {
        let exec = executor();
        let result = exec.execute(Some("print(missing)")).await;
        assert!(result.logs.contains("The variable 'missing' is not defined"));
    }

    #[tokio::test]
    async fn test_unexpected_keyword_argument() {
        let exec = executor();
        let result = exec.execute(Some("echo(wrong='x')")).await;
        assert!(result.logs.contains("unexpected keyword argument 'wrong'"));
    }

    #[tokio::test]
    async fn test_builtin_round_and_len() {
        let exec = executor();
        let result = exec
            .execute(Some("print(round(3.14159, 2))\nprint(len('abc'))"))
            .await;
        assert_eq!(result.logs, "3.14\n3");
    }
}
