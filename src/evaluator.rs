//! Environments and the tree-walking evaluator.
//!
//! An [`Environment`] maps names to values and chains to a parent scope.
//! Lookup resolves reserved builtin names before anything else, which makes
//! builtins unshadowable by user definitions. Evaluation is synchronous and
//! recursive; depth is bounded only by the host stack.
//!
//! Special forms live here as well: they share the builtin calling
//! convention (unevaluated arguments plus the environment) and simply decide
//! for themselves what to evaluate.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::ast::Value;
use crate::builtins::{self, eval_args, exact_args};
use crate::parser;
use crate::{Error, ErrorKind};

/// One scope: local definitions plus an optional parent. A lambda's
/// captured environment has no parent until application time, when the
/// caller's scope is attached for the duration of the body evaluation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    defs: HashMap<String, Value>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a name: the reserved builtin table first, then local
    /// definitions, then the parent chain.
    pub fn get(&self, name: &str) -> Result<Value, Error> {
        if let Some(builtin) = builtins::reserved(name) {
            return Ok(builtin);
        }
        if let Some(value) = self.defs.get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(Error::new(
                ErrorKind::AtomNotDefined,
                Value::atom(name),
                self,
            )),
        }
    }

    /// Bind a name in this scope, replacing any existing local binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.defs.insert(name.into(), value);
    }

    /// True when the name has a user definition in this scope or any
    /// ancestor. Reserved builtins do not count; closure capture relies on
    /// that to avoid copying them into captured scopes.
    pub fn has(&self, name: &str) -> bool {
        self.defs.contains_key(name) || self.parent.as_ref().is_some_and(|p| p.has(name))
    }

    /// A user definition from this scope or its ancestors, bypassing the
    /// reserved table.
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.defs
            .get(name)
            .or_else(|| self.parent.as_deref().and_then(|p| p.lookup(name)))
    }

    /// Overlay every binding of `other` onto this scope, replacing
    /// colliding keys. Used by `include`.
    pub fn combine(&mut self, other: &Environment) {
        for (name, value) in &other.defs {
            self.defs.insert(name.clone(), value.clone());
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Environment) {
        self.parent = Some(Box::new(parent));
    }
}

/// Renders the local definitions of this scope, in name order.
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.defs.keys().collect();
        names.sort();
        f.write_str("{ ")?;
        for name in names {
            write!(f, "'{}' : {:?}, ", name, self.defs[name])?;
        }
        f.write_str("}")
    }
}

/// Reduce a value to a value.
///
/// Quotes shed one layer, atoms are looked up, and non-empty lists become
/// calls: the head is evaluated to a callable, and the remaining elements
/// are evaluated only when the callable is not a builtin (builtins may be
/// special forms, so they receive their arguments raw). Everything else is
/// self-evaluating.
pub fn eval(expr: &Value, env: &mut Environment) -> Result<Value, Error> {
    match expr {
        Value::Quote(inner) => Ok((**inner).clone()),
        Value::Atom(name) => env.get(name),
        Value::List(items) => {
            let Some((head, rest)) = items.split_first() else {
                return Err(Error::new(ErrorKind::EvalEmptyList, expr.clone(), env));
            };
            let function = eval(head, env)?;
            let args = if function.is_builtin() {
                rest.to_vec()
            } else {
                rest.iter()
                    .map(|arg| eval(arg, env))
                    .collect::<Result<Vec<_>, Error>>()?
            };
            apply(&function, args, env)
        }
        other => Ok(other.clone()),
    }
}

/// Apply a callable to already-prepared arguments.
///
/// For a lambda this binds parameters in a copy of the captured scope,
/// attaches the caller's environment as its parent, and evaluates the body
/// there. Builtins are invoked directly.
pub fn apply(function: &Value, args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    match function {
        Value::Lambda {
            params,
            body,
            scope,
        } => {
            if params.len() > args.len() {
                return Err(Error::new(ErrorKind::TooFewArgs, Value::List(args), env));
            }
            if params.len() < args.len() {
                return Err(Error::new(ErrorKind::TooManyArgs, Value::List(args), env));
            }
            let mut call_env = scope.clone();
            call_env.set_parent(env.clone());
            for (param, arg) in params.iter().zip(args) {
                match param {
                    Value::Atom(name) => call_env.set(name.clone(), arg),
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidLambda,
                            function.clone(),
                            env,
                        ));
                    }
                }
            }
            eval(body, &mut call_env)
        }
        Value::Builtin { func, .. } => func(args, env),
        _ => Err(Error::new(
            ErrorKind::CallNonFunction,
            function.clone(),
            env,
        )),
    }
}

/// Parse a source text and evaluate its expressions in order, returning the
/// last result (Unit for an empty program).
pub fn run(source: &str, env: &mut Environment) -> Result<Value, Error> {
    let mut result = Value::Unit;
    for expr in parser::parse_all(source)? {
        result = eval(&expr, env)?;
    }
    Ok(result)
}

/// Collect every atom name referenced anywhere in an expression, walking
/// through lists, quotes, and nested lambda bodies. Nested lambda
/// parameters are not treated as binding; over-capturing an unused name
/// costs a copy, not correctness.
fn referenced_atoms(expr: &Value, names: &mut BTreeSet<String>) {
    match expr {
        Value::Atom(name) => {
            names.insert(name.clone());
        }
        Value::Quote(inner) => referenced_atoms(inner, names),
        Value::List(items) => {
            for item in items {
                referenced_atoms(item, names);
            }
        }
        Value::Lambda { body, .. } => referenced_atoms(body, names),
        _ => {}
    }
}

/// Construct a lambda, capturing the current value of every referenced name
/// that has a user definition in the creation environment. Reserved builtin
/// names are never captured; they resolve through the reserved table at
/// call time.
pub(crate) fn make_lambda(params: Vec<Value>, body: Value, env: &Environment) -> Value {
    let mut names = BTreeSet::new();
    referenced_atoms(&body, &mut names);
    let mut scope = Environment::new();
    for name in names {
        if let Some(value) = env.lookup(&name) {
            scope.set(name, value.clone());
        }
    }
    Value::Lambda {
        params,
        body: Box::new(body),
        scope,
    }
}

//
// Special forms. Arguments arrive unevaluated.
//

/// `(lambda (params) body)`
pub(crate) fn eval_lambda(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    if args.len() < 2 {
        return Err(Error::new(ErrorKind::TooFewArgs, Value::atom("lambda"), env));
    }
    match &args[0] {
        Value::List(params) => Ok(make_lambda(params.clone(), args[1].clone(), env)),
        other => Err(Error::new(ErrorKind::InvalidLambda, other.clone(), env)),
    }
}

/// `(define name expr)` - evaluates `expr`, binds it in the current scope,
/// and returns it.
pub(crate) fn eval_define(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    exact_args("define", &args, 2, env)?;
    let value = eval(&args[1], env)?;
    env.set(args[0].to_string(), value.clone());
    Ok(value)
}

/// `(defun name (params) body)` - sugar for defining a named lambda.
pub(crate) fn eval_defun(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    exact_args("defun", &args, 3, env)?;
    let function = match &args[1] {
        Value::List(params) => make_lambda(params.clone(), args[2].clone(), env),
        other => return Err(Error::new(ErrorKind::InvalidLambda, other.clone(), env)),
    };
    env.set(args[0].to_string(), function.clone());
    Ok(function)
}

/// `(if cond then else)`
pub(crate) fn eval_if(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    exact_args("if", &args, 3, env)?;
    if eval(&args[0], env)?.as_bool() {
        eval(&args[1], env)
    } else {
        eval(&args[2], env)
    }
}

/// `(do e1 ... en)` - evaluates in order in the current scope.
pub(crate) fn eval_do(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let mut acc = Value::Unit;
    for expr in &args {
        acc = eval(expr, env)?;
    }
    Ok(acc)
}

/// `(scope e1 ... en)` - evaluates in a copy of the current scope, so new
/// bindings do not leak out.
pub(crate) fn eval_scope(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let mut inner = env.clone();
    let mut acc = Value::Unit;
    for expr in &args {
        acc = eval(expr, &mut inner)?;
    }
    Ok(acc)
}

/// `(quote e1 ... en)` - returns the arguments, verbatim, as a list.
/// Distinct from the `'` reader syntax, which wraps one expression in the
/// Quote tag.
pub(crate) fn eval_quote(args: Vec<Value>, _env: &mut Environment) -> Result<Value, Error> {
    Ok(Value::List(args))
}

/// `(while cond e1 ... en)` - returns the last body value evaluated, or
/// Unit when the loop never runs.
pub(crate) fn eval_while(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    match args.split_first() {
        Some((cond, body)) => {
            let mut acc = Value::Unit;
            while eval(cond, env)?.as_bool() {
                for expr in body {
                    acc = eval(expr, env)?;
                }
            }
            Ok(acc)
        }
        None => Err(Error::new(ErrorKind::TooFewArgs, Value::atom("while"), env)),
    }
}

/// `(for name list-expr e1 ... en)` - binds `name` to each element of the
/// list in turn, in the current scope, and returns the final body value.
pub(crate) fn eval_for(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    if args.len() < 2 {
        return Err(Error::new(ErrorKind::TooFewArgs, Value::atom("for"), env));
    }
    let name = args[0].to_string();
    let items = eval(&args[1], env)?.as_list()?.to_vec();
    let mut acc = Value::Unit;
    for item in items {
        env.set(name.clone(), item);
        for expr in &args[2..] {
            acc = eval(expr, env)?;
        }
    }
    Ok(acc)
}

/// `(eval e)` - evaluates its (already evaluated) argument once more.
pub(crate) fn eval_value(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("eval", &args, 1, env)?;
    eval(&args[0], env)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    /// Test result variants for the comprehensive evaluation table.
    #[derive(Debug)]
    enum Expect {
        /// The final value of the program.
        Val(Value),
        /// The debug form of the final value.
        Dbg(&'static str),
        /// The program fails with this error kind.
        Fails(ErrorKind),
    }
    use Expect::*;

    fn run_program(source: &str) -> Result<Value, Error> {
        let mut env = Environment::new();
        run(source, &mut env)
    }

    fn run_eval_tests(test_cases: Vec<(&str, Expect)>) {
        for (i, (source, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Eval test #{}", i + 1);
            match (run_program(source), expected) {
                (Ok(actual), Val(value)) => {
                    assert_eq!(&actual, value, "{test_id}: value mismatch for '{source}'");
                }
                (Ok(actual), Dbg(text)) => {
                    assert_eq!(
                        format!("{actual:?}"),
                        *text,
                        "{test_id}: debug form mismatch for '{source}'"
                    );
                }
                (Err(err), Fails(kind)) => {
                    assert_eq!(err.kind(), *kind, "{test_id}: wrong error for '{source}'");
                }
                (Ok(actual), Fails(kind)) => {
                    panic!("{test_id}: expected {kind:?} for '{source}', got {actual:?}");
                }
                (Err(err), _) => {
                    panic!("{test_id}: unexpected error for '{source}': {err}");
                }
            }
        }
    }

    #[test]
    fn test_evaluation_comprehensive() {
        let test_cases = vec![
            // === SELF-EVALUATING FORMS ===
            ("42", Val(Value::Int(42))),
            ("2.5", Val(Value::Float(2.5))),
            ("\"hi\"", Val(Value::string("hi"))),
            ("@", Val(Value::Unit)),
            ("", Val(Value::Unit)),
            ("; just a comment", Val(Value::Unit)),
            // === QUOTING ===
            ("'x", Dbg("x")),
            ("'(+ 1 2)", Dbg("(+ 1 2)")),
            ("''x", Dbg("'x")),
            ("(quote 1 2 3)", Dbg("(1 2 3)")),
            ("(quote)", Dbg("()")),
            // === ARITHMETIC ===
            ("(+ 1 2 3)", Val(Value::Int(6))),
            ("(+ 1 2.5)", Val(Value::Float(3.5))),
            ("(+ \"foo\" \"bar\")", Val(Value::string("foobar"))),
            ("(+ (list 1) (list 2 3))", Dbg("(1 2 3)")),
            ("(+ 1 @)", Val(Value::Unit)),
            ("(+ @ 1 2)", Val(Value::Unit)),
            ("(- 10 4)", Val(Value::Int(6))),
            ("(* 2 3 4)", Val(Value::Int(24))),
            ("(/ 7 2)", Val(Value::Int(3))),
            ("(/ 7.0 2)", Val(Value::Float(3.5))),
            ("(% 7 3)", Val(Value::Int(1))),
            ("(% 7.5 2)", Val(Value::Float(1.5))),
            ("(+ 1)", Fails(ErrorKind::TooFewArgs)),
            ("(- 1 2 3)", Fails(ErrorKind::TooManyArgs)),
            ("(/ 1 0)", Fails(ErrorKind::InvalidBinOp)),
            ("(+ 1 \"x\")", Fails(ErrorKind::InvalidBinOp)),
            // === COMPARISON ===
            ("(= 2 2.0)", Val(Value::Int(1))),
            ("(= \"a\" \"a\")", Val(Value::Int(1))),
            ("(!= 1 2)", Val(Value::Int(1))),
            ("(< 1 2)", Val(Value::Int(1))),
            ("(> 1 2)", Val(Value::Int(0))),
            ("(<= 2 2)", Val(Value::Int(1))),
            ("(>= 1 2)", Val(Value::Int(0))),
            ("(< \"a\" 1)", Fails(ErrorKind::InvalidOrder)),
            ("(< 1 \"a\")", Fails(ErrorKind::InvalidBinOp)),
            ("(= 1 2 3)", Fails(ErrorKind::TooManyArgs)),
            // === CONDITIONALS AND TRUTHINESS ===
            ("(if 1 \"yes\" \"no\")", Val(Value::string("yes"))),
            ("(if 0 \"yes\" \"no\")", Val(Value::string("no"))),
            ("(if 0.0 \"yes\" \"no\")", Val(Value::string("no"))),
            ("(if @ \"yes\" \"no\")", Val(Value::string("yes"))),
            ("(if (list) \"yes\" \"no\")", Val(Value::string("yes"))),
            ("(if (< 1 2) 1 2)", Val(Value::Int(1))),
            ("(if 1 2)", Fails(ErrorKind::TooFewArgs)),
            ("(if 1 2 3 4)", Fails(ErrorKind::TooManyArgs)),
            // Only the taken branch is evaluated.
            ("(if 1 42 undefined)", Val(Value::Int(42))),
            // === DEFINE / DEFUN / LAMBDA ===
            ("(define x 10) (+ x 1)", Val(Value::Int(11))),
            ("(define x 1) (define x 2) x", Val(Value::Int(2))),
            ("(define x 5)", Val(Value::Int(5))),
            ("((lambda (x) (* x x)) 4)", Val(Value::Int(16))),
            ("((lambda () 9))", Val(Value::Int(9))),
            ("(defun double (x) (* x 2)) (double 21)", Val(Value::Int(42))),
            ("(lambda (x))", Fails(ErrorKind::TooFewArgs)),
            ("(lambda 5 5)", Fails(ErrorKind::InvalidLambda)),
            ("(defun f 5 5)", Fails(ErrorKind::InvalidLambda)),
            ("((lambda (x) x))", Fails(ErrorKind::TooFewArgs)),
            ("((lambda (x) x) 1 2)", Fails(ErrorKind::TooManyArgs)),
            ("((lambda (5) 5) 1)", Fails(ErrorKind::InvalidLambda)),
            // === RECURSION THROUGH THE CALLER SCOPE ===
            (
                "(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1)))))) (fact 5)",
                Val(Value::Int(120)),
            ),
            (
                "(defun fib (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))) (fib 10)",
                Val(Value::Int(55)),
            ),
            // === DO / SCOPE ===
            ("(do 1 2 3)", Val(Value::Int(3))),
            ("(do)", Val(Value::Unit)),
            ("(do (define x 1) (define x (+ x 1)) x)", Val(Value::Int(2))),
            // `do` shares the caller's scope; `scope` copies it.
            ("(do (define x 1)) x", Val(Value::Int(1))),
            ("(define x 10) (scope (define x 20) x) x", Val(Value::Int(10))),
            ("(scope (define y 5) y)", Val(Value::Int(5))),
            ("(scope (define y 5)) y", Fails(ErrorKind::AtomNotDefined)),
            ("(define x 1) (scope x)", Val(Value::Int(1))),
            // === WHILE / FOR ===
            (
                "(define i 0) (while (< i 3) (define i (+ i 1)))",
                Val(Value::Int(3)),
            ),
            ("(while 0 1)", Val(Value::Unit)),
            ("(while)", Fails(ErrorKind::TooFewArgs)),
            ("(for i (range 0 3) (* i 2))", Val(Value::Int(4))),
            // `for` mutates the current scope.
            ("(for i (range 0 3) i) i", Val(Value::Int(2))),
            ("(for i (list) i)", Val(Value::Unit)),
            ("(for i 5 i)", Fails(ErrorKind::BadCast)),
            // === CALL ERRORS ===
            ("()", Fails(ErrorKind::EvalEmptyList)),
            ("(1 2 3)", Fails(ErrorKind::CallNonFunction)),
            ("missing", Fails(ErrorKind::AtomNotDefined)),
            ("(missing 1)", Fails(ErrorKind::AtomNotDefined)),
            // === META ===
            ("(define e '(1 2)) (eval 'e)", Dbg("(1 2)")),
            ("(type 5)", Val(Value::string("int"))),
            ("(type 5.0)", Val(Value::string("float"))),
            ("(type type)", Val(Value::string("function"))),
            ("(type (lambda (x) x))", Val(Value::string("function"))),
            ("(type '(1))", Val(Value::string("list"))),
            ("(type ''x)", Val(Value::string("quote"))),
            ("(parse \"1 2\")", Dbg("(1 2)")),
            ("(eval (head (parse \"(+ 1 2)\")))", Val(Value::Int(3))),
            ("(parse 5)", Fails(ErrorKind::InvalidArgument)),
            ("(parse \"(\")", Fails(ErrorKind::MalformedProgram)),
            // === RESERVED NAMES ARE NOT SHADOWABLE ===
            ("(define + 0)", Val(Value::Int(0))),
            ("(define + 0) (+ 1 2)", Val(Value::Int(3))),
            ("endl", Val(Value::string("\n"))),
            // Builtins compare by function pointer identity; aliases share it.
            ("(= + +)", Val(Value::Int(1))),
            ("(= + -)", Val(Value::Int(0))),
            ("(= first head)", Val(Value::Int(1))),
            ("(= quit exit)", Val(Value::Int(1))),
        ];

        run_eval_tests(test_cases);
    }

    #[test]
    fn eval_quote_strips_one_layer_without_evaluating() {
        let mut env = Environment::new();
        let inner = Value::List(vec![Value::atom("undefined-op"), Value::Int(1)]);
        let quoted = Value::quote(inner.clone());
        assert_eq!(eval(&quoted, &mut env).unwrap(), inner);
    }

    #[test]
    fn lambda_captures_only_referenced_names() {
        let mut env = Environment::new();
        run(
            "(define a 1) (define b 2) (define f (lambda (x) (+ x a)))",
            &mut env,
        )
        .unwrap();
        let Value::Lambda { scope, .. } = env.get("f").unwrap() else {
            panic!("expected a lambda binding");
        };
        assert!(scope.has("a"));
        assert!(!scope.has("b"));
        // `+` and `x` are referenced but have no user definition.
        assert!(!scope.has("+"));
        assert!(!scope.has("x"));
    }

    #[test]
    fn capture_is_a_snapshot_taken_at_creation() {
        let mut env = Environment::new();
        run(
            "(define a 1) (define f (lambda () a)) (define a 100)",
            &mut env,
        )
        .unwrap();
        assert_eq!(run("(f)", &mut env).unwrap(), Value::Int(1));
        assert_eq!(run("a", &mut env).unwrap(), Value::Int(100));
    }

    #[test]
    fn capture_walks_quotes_and_nested_lambdas() {
        let mut env = Environment::new();
        run(
            "(define a 1) (define b 2) \
             (define f (lambda (x) (do 'a ((lambda (y) b) x))))",
            &mut env,
        )
        .unwrap();
        let Value::Lambda { scope, .. } = env.get("f").unwrap() else {
            panic!("expected a lambda binding");
        };
        // Quoted atoms and nested-lambda bodies both contribute names.
        assert!(scope.has("a"));
        assert!(scope.has("b"));
    }

    #[test]
    fn combine_overlays_and_replaces() {
        let mut base = Environment::new();
        base.set("x", Value::Int(1));
        base.set("y", Value::Int(2));
        let mut other = Environment::new();
        other.set("y", Value::Int(20));
        other.set("z", Value::Int(30));
        base.combine(&other);
        assert_eq!(base.get("x").unwrap(), Value::Int(1));
        assert_eq!(base.get("y").unwrap(), Value::Int(20));
        assert_eq!(base.get("z").unwrap(), Value::Int(30));
    }

    #[test]
    fn environment_display_is_sorted_with_trailing_commas() {
        let mut env = Environment::new();
        assert_eq!(format!("{env}"), "{ }");
        env.set("b", Value::Int(2));
        env.set("a", Value::string("x"));
        assert_eq!(format!("{env}"), "{ 'a' : \"x\", 'b' : 2, }");
    }

    #[test]
    fn error_descriptions_carry_cause_and_scope() {
        let err = run_program("(define x 5) missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AtomNotDefined);
        assert_eq!(
            format!("{err}"),
            "error: the expression `missing` failed in scope { 'x' : 5, } with message \"atom not defined\""
        );
        let parse_err = run_program("(").unwrap_err();
        assert_eq!(format!("{parse_err}"), "malformed program");
    }
}
