use std::{cmp::Ordering, rc::Rc};

use crate::{
    ast::{Node, Script},
    context::{Context, ContextRef},
    diagnostics::{Result, SkribeError},
    registry::{Function, Registry},
    value::{Value, ValueKind},
};

/// Runs `script` in `context`. A `return` at any depth ends the script with
/// its value.
pub fn run_script(registry: &Registry, script: &Script, context: &ContextRef) -> Result<Value> {
    Interpreter::new(registry).run(script, context)
}

/// Invokes a script-defined function body with already checked arguments.
pub(crate) fn call_script_function(
    registry: &Registry,
    params: &[&str],
    body: &Node,
    closure: &ContextRef,
    args: Vec<Value>,
) -> Result<Value> {
    let frame = Context::child(closure);
    {
        let mut scope = frame.borrow_mut();
        let mut args = args.into_iter();
        for name in params {
            scope.set(name, args.next().unwrap_or_else(Value::null));
        }
    }
    let interpreter = Interpreter::new(registry);
    Ok(interpreter.execute(body, &frame)?.into_value())
}

/// Outcome of executing one node. `Returned` unwinds through blocks, branches
/// and loops until a function, script or handler boundary turns it back into
/// a plain value.
#[derive(Debug)]
enum FlowControl {
    Completed(Value),
    Returned(Value),
}

impl FlowControl {
    fn into_value(self) -> Value {
        match self {
            FlowControl::Completed(value) | FlowControl::Returned(value) => value,
        }
    }
}

pub struct Interpreter<'r> {
    registry: &'r Registry,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn run(&self, script: &Script, ctx: &ContextRef) -> Result<Value> {
        Ok(self.execute(script.root(), ctx)?.into_value())
    }

    fn execute(&self, node: &Node, ctx: &ContextRef) -> Result<FlowControl> {
        match node {
            Node::Block(statements) => {
                let mut last_value = Value::null();
                for stmt in statements {
                    match self.execute(stmt, ctx)? {
                        FlowControl::Completed(value) => last_value = value,
                        returned => return Ok(returned),
                    }
                }
                Ok(FlowControl::Completed(last_value))
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, ctx)?.is_truthy() {
                    self.execute(then_branch, ctx)
                } else if let Some(branch) = else_branch {
                    self.execute(branch, ctx)
                } else {
                    Ok(FlowControl::Completed(Value::null()))
                }
            }
            Node::While { condition, body } => {
                let mut last_value = Value::null();
                while self.evaluate(condition, ctx)?.is_truthy() {
                    match self.execute(body, ctx)? {
                        FlowControl::Completed(value) => last_value = value,
                        returned => return Ok(returned),
                    }
                }
                Ok(FlowControl::Completed(last_value))
            }
            Node::For {
                init,
                condition,
                increment,
                body,
            } => {
                self.evaluate(init, ctx)?;
                let mut last_value = Value::null();
                while self.evaluate(condition, ctx)?.is_truthy() {
                    match self.execute(body, ctx)? {
                        FlowControl::Completed(value) => last_value = value,
                        returned => return Ok(returned),
                    }
                    self.evaluate(increment, ctx)?;
                }
                Ok(FlowControl::Completed(last_value))
            }
            Node::Return(value) => {
                let value = self.evaluate(value, ctx)?;
                Ok(FlowControl::Returned(value))
            }
            Node::FunctionDef { name, params, body } => {
                let function = Function::script(name.clone(), params, Rc::clone(body), Rc::clone(ctx));
                self.registry.define_function(function);
                Ok(FlowControl::Completed(Value::null()))
            }
            Node::EventHandler { event, body } => {
                let script = Script::from_shared(Rc::clone(body));
                self.registry.register_handler(event, script, Rc::clone(ctx))?;
                Ok(FlowControl::Completed(Value::null()))
            }
            Node::Trigger { event, args } => {
                let args = self.evaluate_all(args, ctx)?;
                self.registry.trigger_event(event, args)?;
                Ok(FlowControl::Completed(Value::null()))
            }
            expr => Ok(FlowControl::Completed(self.evaluate(expr, ctx)?)),
        }
    }

    /// Evaluates a node in expression position. Statements nested here (only
    /// possible for a `for` initializer) contribute their completion value.
    fn evaluate(&self, node: &Node, ctx: &ContextRef) -> Result<Value> {
        match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Variable(path) => self.resolve_path(path, ctx),
            Node::Assignment { name, value } => {
                let value = self.evaluate(value, ctx)?;
                self.assign(name, value.clone(), ctx)?;
                Ok(value)
            }
            Node::Binary {
                left,
                operator,
                right,
            } => self.binary(left, operator, right, ctx),
            Node::Unary { operator, operand } => {
                let value = self.evaluate(operand, ctx)?;
                self.unary(operator, value)
            }
            Node::Call { name, args } => {
                let function =
                    self.registry
                        .function(name)
                        .ok_or_else(|| SkribeError::UnknownFunction {
                            name: name.clone(),
                        })?;
                let args = self.evaluate_all(args, ctx)?;
                function.invoke(self.registry, args)
            }
            statement => Ok(self.execute(statement, ctx)?.into_value()),
        }
    }

    fn evaluate_all(&self, nodes: &[Node], ctx: &ContextRef) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(nodes.len());
        for node in nodes {
            values.push(self.evaluate(node, ctx)?);
        }
        Ok(values)
    }

    fn resolve_path(&self, path: &str, ctx: &ContextRef) -> Result<Value> {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or(path);
        let mut value =
            self.registry
                .lookup(ctx, root)
                .ok_or_else(|| SkribeError::UndefinedVariable {
                    name: root.to_string(),
                })?;
        for segment in segments {
            value = member(&value, segment)?;
        }
        Ok(value)
    }

    fn assign(&self, path: &str, value: Value, ctx: &ContextRef) -> Result<()> {
        let Some((owner_path, member_name)) = path.rsplit_once('.') else {
            ctx.borrow_mut().set(path, value);
            return Ok(());
        };
        let owner = self.resolve_path(owner_path, ctx)?;
        match owner.kind() {
            ValueKind::Null => Err(SkribeError::NullMemberAccess {
                member: member_name.to_string(),
            }),
            ValueKind::Object(object) => {
                if object.borrow_mut().set_member(member_name, value) {
                    Ok(())
                } else {
                    Err(no_such_member(&owner, member_name))
                }
            }
            _ => Err(no_such_member(&owner, member_name)),
        }
    }

    fn binary(&self, left: &Node, operator: &str, right: &Node, ctx: &ContextRef) -> Result<Value> {
        let left = self.evaluate(left, ctx)?;
        match operator {
            "and" => {
                if !left.is_truthy() {
                    return Ok(Value::bool(false));
                }
                return Ok(Value::bool(self.evaluate(right, ctx)?.is_truthy()));
            }
            "or" => {
                if left.is_truthy() {
                    return Ok(Value::bool(true));
                }
                return Ok(Value::bool(self.evaluate(right, ctx)?.is_truthy()));
            }
            _ => {}
        }

        let right = self.evaluate(right, ctx)?;
        match operator {
            "+" if left.as_text().is_some() || right.as_text().is_some() => Ok(Value::text(
                format!("{}{}", concat_text(&left), concat_text(&right)),
            )),
            "+" => numeric(operator, &left, &right, |a, b| a + b),
            "-" => numeric(operator, &left, &right, |a, b| a - b),
            "*" => numeric(operator, &left, &right, |a, b| a * b),
            "/" => numeric(operator, &left, &right, |a, b| a / b),
            "%" => numeric(operator, &left, &right, |a, b| a % b),
            "==" => Ok(Value::bool(left == right)),
            "!=" => Ok(Value::bool(left != right)),
            "<" => ordering(operator, &left, &right, Ordering::is_lt),
            ">" => ordering(operator, &left, &right, Ordering::is_gt),
            "<=" => ordering(operator, &left, &right, Ordering::is_le),
            ">=" => ordering(operator, &left, &right, Ordering::is_ge),
            _ => Err(SkribeError::UnknownOperator {
                operator: operator.to_string(),
            }),
        }
    }

    fn unary(&self, operator: &str, value: Value) -> Result<Value> {
        match operator {
            "-" => value
                .to_number()
                .map(|n| Value::number(-n))
                .ok_or_else(|| SkribeError::UnsupportedOperator {
                    operator: operator.to_string(),
                    left: value.type_name(),
                    right: "nothing".to_string(),
                }),
            "!" | "not" => Ok(Value::bool(!value.is_truthy())),
            _ => Err(SkribeError::UnknownOperator {
                operator: operator.to_string(),
            }),
        }
    }
}

/// Reads one member of `value`. Text and lists expose `length`; host objects
/// answer through their own member table.
fn member(value: &Value, name: &str) -> Result<Value> {
    match value.kind() {
        ValueKind::Null => Err(SkribeError::NullMemberAccess {
            member: name.to_string(),
        }),
        ValueKind::Text(text) if name == "length" => Ok(Value::number(text.chars().count() as f64)),
        ValueKind::List(values) if name == "length" => Ok(Value::number(values.len() as f64)),
        ValueKind::Object(object) => {
            let found = object.borrow().get_member(name);
            found.ok_or_else(|| no_such_member(value, name))
        }
        _ => Err(no_such_member(value, name)),
    }
}

fn no_such_member(owner: &Value, name: &str) -> SkribeError {
    SkribeError::NoSuchMember {
        member: name.to_string(),
        type_name: owner.type_name(),
    }
}

/// Null contributes nothing to a concatenation.
fn concat_text(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn numeric<F>(operator: &str, left: &Value, right: &Value, func: F) -> Result<Value>
where
    F: Fn(f64, f64) -> f64,
{
    match (left.to_number(), right.to_number()) {
        (Some(a), Some(b)) => Ok(Value::number(func(a, b))),
        _ => Err(unsupported(operator, left, right)),
    }
}

fn ordering<F>(operator: &str, left: &Value, right: &Value, test: F) -> Result<Value>
where
    F: Fn(Ordering) -> bool,
{
    left.compare(right)
        .map(|ord| Value::bool(test(ord)))
        .ok_or_else(|| unsupported(operator, left, right))
}

fn unsupported(operator: &str, left: &Value, right: &Value) -> SkribeError {
    SkribeError::UnsupportedOperator {
        operator: operator.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}
