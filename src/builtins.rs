//! The reserved builtin table and every ordinary builtin function.
//!
//! All builtins share one calling convention: a list of unevaluated
//! argument values plus the current environment. The special forms (which
//! live in the evaluator module) use the raw arguments directly; everything
//! here starts by evaluating its arguments with [`eval_args`].
//!
//! Name resolution consults [`reserved`] before any user definition, so
//! these names cannot be shadowed. Aliases (`first`/`head`, `last`/`pop`,
//! `quit`/`exit`) share the same function pointer and therefore compare
//! equal.

use std::io::Write;

use rand::Rng;

use crate::ast::{Builtin, Value};
use crate::evaluator::{self, Environment, apply, eval};
use crate::parser;
use crate::{Error, ErrorKind};

/// Resolve a reserved builtin name to its value.
pub(crate) fn reserved(name: &str) -> Option<Value> {
    let (name, func): (&'static str, Builtin) = match name {
        // Meta operations
        "eval" => ("eval", evaluator::eval_value),
        "type" => ("type", type_name),
        "parse" => ("parse", parse_source),

        // Special forms
        "do" => ("do", evaluator::eval_do),
        "if" => ("if", evaluator::eval_if),
        "for" => ("for", evaluator::eval_for),
        "while" => ("while", evaluator::eval_while),
        "scope" => ("scope", evaluator::eval_scope),
        "quote" => ("quote", evaluator::eval_quote),
        "defun" => ("defun", evaluator::eval_defun),
        "define" => ("define", evaluator::eval_define),
        "lambda" => ("lambda", evaluator::eval_lambda),

        // Comparison operations
        "=" => ("=", equal),
        "!=" => ("!=", not_equal),
        ">" => (">", greater),
        "<" => ("<", less),
        ">=" => (">=", greater_eq),
        "<=" => ("<=", less_eq),

        // Arithmetic operations
        "+" => ("+", sum),
        "-" => ("-", subtract),
        "*" => ("*", product),
        "/" => ("/", divide),
        "%" => ("%", remainder),

        // List operations
        "list" => ("list", list),
        "insert" => ("insert", insert),
        "index" => ("index", index),
        "remove" => ("remove", remove),
        "len" => ("len", length),
        "push" => ("push", push),
        "pop" => ("pop", pop),
        "head" => ("head", head),
        "tail" => ("tail", tail),
        "first" => ("first", head),
        "last" => ("last", pop),
        "range" => ("range", range),

        // Functional operations
        "map" => ("map", map_list),
        "filter" => ("filter", filter_list),
        "reduce" => ("reduce", reduce_list),

        // IO operations
        "exit" => ("exit", exit),
        "quit" => ("quit", exit),
        "print" => ("print", print),
        "input" => ("input", input),
        "random" => ("random", random),
        "include" => ("include", include),
        "read-file" => ("read-file", read_file),
        "write-file" => ("write-file", write_file),

        // Formatting operations
        "debug" => ("debug", debug_form),
        "replace" => ("replace", replace),
        "display" => ("display", display_form),

        // Casting operations
        "int" => ("int", cast_int),
        "float" => ("float", cast_float),

        // Constants
        "endl" => return Some(Value::string("\n")),

        _ => return None,
    };
    Some(Value::builtin(name, func))
}

/// Evaluate each argument in order. Builtins that are not special forms
/// call this first.
pub(crate) fn eval_args(args: Vec<Value>, env: &mut Environment) -> Result<Vec<Value>, Error> {
    args.iter().map(|arg| eval(arg, env)).collect()
}

/// Require exactly `count` arguments.
pub(crate) fn exact_args(
    name: &str,
    args: &[Value],
    count: usize,
    env: &Environment,
) -> Result<(), Error> {
    if args.len() < count {
        Err(Error::new(ErrorKind::TooFewArgs, Value::atom(name), env))
    } else if args.len() > count {
        Err(Error::new(ErrorKind::TooManyArgs, Value::atom(name), env))
    } else {
        Ok(())
    }
}

/// Require at least `count` arguments.
fn at_least_args(
    name: &str,
    args: &[Value],
    count: usize,
    env: &Environment,
) -> Result<(), Error> {
    if args.len() < count {
        Err(Error::new(ErrorKind::TooFewArgs, Value::atom(name), env))
    } else {
        Ok(())
    }
}

/// Require at most `count` arguments.
fn at_most_args(
    name: &str,
    args: &[Value],
    count: usize,
    env: &Environment,
) -> Result<(), Error> {
    if args.len() > count {
        Err(Error::new(ErrorKind::TooManyArgs, Value::atom(name), env))
    } else {
        Ok(())
    }
}

//
// Meta operations
//

fn type_name(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("type", &args, 1, env)?;
    Ok(Value::string(args[0].type_name()))
}

fn parse_source(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("parse", &args, 1, env)?;
    match &args[0] {
        Value::String(source) => Ok(Value::List(parser::parse_all(source)?)),
        other => Err(Error::new(ErrorKind::InvalidArgument, other.clone(), env)),
    }
}

//
// Comparison operations
//

fn equal(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("=", &args, 2, env)?;
    Ok(Value::Int((args[0] == args[1]) as i64))
}

fn not_equal(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("!=", &args, 2, env)?;
    Ok(Value::Int((args[0] != args[1]) as i64))
}

// Generate the ordering comparisons; they differ only in the Value method
// they defer to.
macro_rules! ordering_builtin {
    ($fn_name:ident, $name:literal, $method:ident) => {
        fn $fn_name(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
            let args = eval_args(args, env)?;
            exact_args($name, &args, 2, env)?;
            Ok(Value::Int(args[0].$method(&args[1])? as i64))
        }
    };
}

ordering_builtin!(greater, ">", gt);
ordering_builtin!(less, "<", lt);
ordering_builtin!(greater_eq, ">=", gte);
ordering_builtin!(less_eq, "<=", lte);

//
// Arithmetic operations
//

fn sum(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    at_least_args("+", &args, 2, env)?;
    let mut acc = args[0].clone();
    for value in &args[1..] {
        acc = acc.add(value)?;
    }
    Ok(acc)
}

fn product(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    at_least_args("*", &args, 2, env)?;
    let mut acc = args[0].clone();
    for value in &args[1..] {
        acc = acc.mul(value)?;
    }
    Ok(acc)
}

fn subtract(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("-", &args, 2, env)?;
    args[0].sub(&args[1])
}

fn divide(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("/", &args, 2, env)?;
    args[0].div(&args[1])
}

fn remainder(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("%", &args, 2, env)?;
    args[0].rem(&args[1])
}

//
// List operations
//

fn list(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    Ok(Value::List(eval_args(args, env)?))
}

fn push(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let mut args = eval_args(args, env)?;
    at_least_args("push", &args, 1, env)?;
    let mut target = args.remove(0);
    match &mut target {
        Value::List(items) => {
            items.extend(args);
            Ok(target)
        }
        other => Err(Error::new(
            ErrorKind::MismatchedTypes,
            other.clone(),
            env,
        )),
    }
}

/// Pops the final element; `last` is an alias.
fn pop(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("pop", &args, 1, env)?;
    match &args[0] {
        Value::List(items) => items
            .last()
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::IndexOutOfRange, args[0].clone(), env)),
        other => Err(Error::new(
            ErrorKind::MismatchedTypes,
            other.clone(),
            env,
        )),
    }
}

/// The first element; `first` is an alias.
fn head(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("head", &args, 1, env)?;
    let items = args[0].as_list()?;
    items
        .first()
        .cloned()
        .ok_or_else(|| Error::new(ErrorKind::IndexOutOfRange, args[0].clone(), env))
}

fn tail(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("tail", &args, 1, env)?;
    let items = args[0].as_list()?;
    Ok(Value::List(items.iter().skip(1).cloned().collect()))
}

fn length(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("len", &args, 1, env)?;
    Ok(Value::Int(args[0].as_list()?.len() as i64))
}

fn index(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("index", &args, 2, env)?;
    let items = args[0].as_list()?;
    usize::try_from(args[1].as_int()?)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| Error::new(ErrorKind::IndexOutOfRange, args[1].clone(), env))
}

fn insert(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("insert", &args, 3, env)?;
    let mut items = args[0].as_list()?.to_vec();
    let slot = usize::try_from(args[1].as_int()?)
        .ok()
        .filter(|&i| i <= items.len())
        .ok_or_else(|| Error::new(ErrorKind::IndexOutOfRange, args[1].clone(), env))?;
    items.insert(slot, args[2].clone());
    Ok(Value::List(items))
}

fn remove(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("remove", &args, 2, env)?;
    let mut items = args[0].as_list()?.to_vec();
    let slot = usize::try_from(args[1].as_int()?)
        .ok()
        .filter(|&i| i < items.len())
        .ok_or_else(|| Error::new(ErrorKind::IndexOutOfRange, args[1].clone(), env))?;
    items.remove(slot);
    Ok(Value::List(items))
}

/// `(range lo hi)` - the values from `lo` up to but excluding `hi`, in
/// steps of one; empty when `lo >= hi`.
fn range(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("range", &args, 2, env)?;
    let (low, high) = (&args[0], &args[1]);
    if !low.is_number() {
        return Err(Error::new(ErrorKind::MismatchedTypes, low.clone(), env));
    }
    if !high.is_number() {
        return Err(Error::new(ErrorKind::MismatchedTypes, high.clone(), env));
    }
    let mut items = Vec::new();
    let mut cursor = low.clone();
    while cursor.lt(high)? {
        items.push(cursor.clone());
        cursor = cursor.add(&Value::Int(1))?;
    }
    Ok(Value::List(items))
}

//
// Functional operations
//

fn map_list(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("map", &args, 2, env)?;
    let items = args[1].as_list()?.to_vec();
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(apply(&args[0], vec![item], env)?);
    }
    Ok(Value::List(mapped))
}

fn filter_list(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("filter", &args, 2, env)?;
    let items = args[1].as_list()?.to_vec();
    let mut kept = Vec::new();
    for item in items {
        if apply(&args[0], vec![item.clone()], env)?.as_bool() {
            kept.push(item);
        }
    }
    Ok(Value::List(kept))
}

fn reduce_list(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("reduce", &args, 3, env)?;
    let items = args[2].as_list()?.to_vec();
    let mut acc = args[1].clone();
    for item in items {
        acc = apply(&args[0], vec![acc, item], env)?;
    }
    Ok(acc)
}

//
// IO operations
//

fn exit(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    at_most_args("exit", &args, 1, env)?;
    let code = match args.first() {
        Some(value) => value.as_int()? as i32,
        None => 0,
    };
    std::process::exit(code)
}

/// Writes the display forms of all arguments, space-separated, followed by
/// a newline. Returns the last argument.
fn print(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    match args.split_last() {
        Some((last, _)) => {
            let mut line = String::new();
            for (i, value) in args.iter().enumerate() {
                if i > 0 {
                    line.push(' ');
                }
                line.push_str(&value.to_string());
            }
            println!("{line}");
            Ok(last.clone())
        }
        None => Err(Error::new(ErrorKind::TooFewArgs, Value::atom("print"), env)),
    }
}

/// Optionally displays a prompt, then reads one line from stdin.
fn input(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    at_most_args("input", &args, 1, env)?;
    if let Some(prompt) = args.first() {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
    }
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|_| Error::new(ErrorKind::InvalidArgument, Value::atom("input"), env))?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(Value::String(line))
}

/// `(random lo hi)` - a uniform integer in `[lo, hi]` inclusive.
fn random(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("random", &args, 2, env)?;
    let low = args[0].as_int()?;
    let high = args[1].as_int()?;
    if low > high {
        return Err(Error::new(
            ErrorKind::InvalidArgument,
            Value::List(args),
            env,
        ));
    }
    Ok(Value::Int(rand::rng().random_range(low..=high)))
}

fn read_file(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("read-file", &args, 1, env)?;
    let contents = std::fs::read_to_string(args[0].as_string()?)
        .map_err(|_| Error::new(ErrorKind::InvalidArgument, args[0].clone(), env))?;
    Ok(Value::String(contents))
}

/// Returns Int 1 when the write succeeds and Int 0 when it fails.
fn write_file(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("write-file", &args, 2, env)?;
    let path = args[0].as_string()?;
    let contents = args[1].as_string()?;
    Ok(Value::Int(std::fs::write(path, contents).is_ok() as i64))
}

/// Evaluates a file in a fresh environment, overlays its definitions onto
/// the caller's scope, and returns the file's final value.
fn include(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("include", &args, 1, env)?;
    let source = std::fs::read_to_string(args[0].as_string()?)
        .map_err(|_| Error::new(ErrorKind::InvalidArgument, args[0].clone(), env))?;
    let mut file_env = Environment::new();
    let result = evaluator::run(&source, &mut file_env)?;
    env.combine(&file_env);
    Ok(result)
}

//
// Formatting operations
//

fn debug_form(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("debug", &args, 1, env)?;
    Ok(Value::String(format!("{:?}", args[0])))
}

fn display_form(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("display", &args, 1, env)?;
    Ok(Value::String(args[0].to_string()))
}

/// `(replace text from to)` - replaces every occurrence.
fn replace(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("replace", &args, 3, env)?;
    let text = args[0].as_string()?;
    let from = args[1].as_string()?;
    let to = args[2].as_string()?;
    Ok(Value::String(text.replace(from, to)))
}

//
// Casting operations
//

fn cast_int(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("int", &args, 1, env)?;
    args[0].cast_to_int()
}

fn cast_float(args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    let args = eval_args(args, env)?;
    exact_args("float", &args, 1, env)?;
    args[0].cast_to_float()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::evaluator::run;

    fn run_program(source: &str) -> Result<Value, Error> {
        let mut env = Environment::new();
        run(source, &mut env)
    }

    fn ok(source: &str) -> Value {
        run_program(source).unwrap()
    }

    fn fails(source: &str) -> ErrorKind {
        run_program(source).unwrap_err().kind()
    }

    #[test]
    fn list_construction_and_access() {
        assert_eq!(format!("{:?}", ok("(list 1 \"two\" @)")), "(1 \"two\" @)");
        assert_eq!(ok("(head (list 1 2 3))"), Value::Int(1));
        assert_eq!(ok("(first (list 1 2 3))"), Value::Int(1));
        assert_eq!(format!("{:?}", ok("(tail (list 1 2 3))")), "(2 3)");
        assert_eq!(format!("{:?}", ok("(tail (list))")), "()");
        assert_eq!(ok("(pop (list 1 2 3))"), Value::Int(3));
        assert_eq!(ok("(last (list 1 2 3))"), Value::Int(3));
        assert_eq!(ok("(len (list 1 2 3))"), Value::Int(3));
        assert_eq!(ok("(len (list))"), Value::Int(0));
        assert_eq!(ok("(index (list 10 20 30) 1)"), Value::Int(20));
        assert_eq!(format!("{:?}", ok("(push (list 1) 2 3)")), "(1 2 3)");
        assert_eq!(format!("{:?}", ok("(insert (list 1 3) 1 2)")), "(1 2 3)");
        assert_eq!(format!("{:?}", ok("(insert (list 1) 1 2)")), "(1 2)");
        assert_eq!(format!("{:?}", ok("(remove (list 1 2 3) 1)")), "(1 3)");
    }

    #[test]
    fn list_mutation_copies_leave_bindings_alone() {
        assert_eq!(
            format!("{:?}", ok("(define l (list 1 2)) (push l 3) l")),
            "(1 2)"
        );
        assert_eq!(ok("(define l (list 1 2)) (pop l) (len l)"), Value::Int(2));
    }

    #[test]
    fn list_edge_cases() {
        assert_eq!(fails("(head (list))"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(pop (list))"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(index (list 1 2) 2)"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(index (list 1 2) -1)"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(insert (list 1) 5 0)"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(remove (list 1) 1)"), ErrorKind::IndexOutOfRange);
        assert_eq!(fails("(push 5 1)"), ErrorKind::MismatchedTypes);
        assert_eq!(fails("(head 5)"), ErrorKind::BadCast);
        assert_eq!(fails("(len \"abc\")"), ErrorKind::BadCast);
        assert_eq!(fails("(index 5 0)"), ErrorKind::BadCast);
    }

    #[test]
    fn range_contracts() {
        assert_eq!(format!("{:?}", ok("(range 1 5)")), "(1 2 3 4)");
        assert_eq!(format!("{:?}", ok("(range 0 1)")), "(0)");
        assert_eq!(format!("{:?}", ok("(range 5 5)")), "()");
        assert_eq!(format!("{:?}", ok("(range 5 1)")), "()");
        assert_eq!(format!("{:?}", ok("(range -2 1)")), "(-2 -1 0)");
        assert_eq!(format!("{:?}", ok("(range 0.5 3)")), "(0.5 1.5 2.5)");
        assert_eq!(fails("(range \"a\" 3)"), ErrorKind::MismatchedTypes);
        assert_eq!(fails("(range 0 @)"), ErrorKind::MismatchedTypes);
        assert_eq!(fails("(range 1)"), ErrorKind::TooFewArgs);
    }

    #[test]
    fn functional_operations() {
        assert_eq!(
            format!("{:?}", ok("(map (lambda (x) (* x x)) (range 1 5))")),
            "(1 4 9 16)"
        );
        assert_eq!(
            format!(
                "{:?}",
                ok("(filter (lambda (x) (> x 2)) (list 1 2 3 4))")
            ),
            "(3 4)"
        );
        assert_eq!(
            ok("(reduce (lambda (a b) (+ a b)) 0 (range 1 11))"),
            Value::Int(55)
        );
        // Builtins work as the mapped function too.
        assert_eq!(
            format!("{:?}", ok("(map debug (list 1 \"a\"))")),
            "(\"1\" \"\\\"a\\\"\")"
        );
        assert_eq!(fails("(map head)"), ErrorKind::TooFewArgs);
        assert_eq!(fails("(reduce + 0)"), ErrorKind::TooFewArgs);
        assert_eq!(fails("(map 5 (list 1))"), ErrorKind::CallNonFunction);
    }

    #[test]
    fn formatting_operations() {
        assert_eq!(ok("(display \"hi\")"), Value::string("hi"));
        assert_eq!(ok("(debug \"hi\")"), Value::string("\"hi\""));
        assert_eq!(ok("(display '(1 \"a\"))"), Value::string("(1 \"a\")"));
        assert_eq!(ok("(debug 3.5)"), Value::string("3.5"));
        assert_eq!(
            ok("(replace \"a-b-c\" \"-\" \"+\")"),
            Value::string("a+b+c")
        );
        assert_eq!(fails("(replace \"a\" 1 \"b\")"), ErrorKind::BadCast);
        assert_eq!(ok("(+ \"a\" endl)"), Value::string("a\n"));
    }

    #[test]
    fn casting_operations() {
        assert_eq!(ok("(int 3.9)"), Value::Int(3));
        assert_eq!(ok("(int 3)"), Value::Int(3));
        assert_eq!(ok("(float 3)"), Value::Float(3.0));
        assert_eq!(fails("(int \"3\")"), ErrorKind::BadCast);
        assert_eq!(fails("(float @)"), ErrorKind::BadCast);
        assert_eq!(fails("(int 1 2)"), ErrorKind::TooManyArgs);
    }

    #[test]
    fn random_is_inclusive_and_validates_bounds() {
        let mut env = Environment::new();
        for _ in 0..64 {
            let Value::Int(n) = run("(random 1 6)", &mut env).unwrap() else {
                panic!("random should produce an int");
            };
            assert!((1..=6).contains(&n));
        }
        assert_eq!(run("(random 3 3)", &mut env).unwrap(), Value::Int(3));
        assert_eq!(fails("(random 6 1)"), ErrorKind::InvalidArgument);
        assert_eq!(fails("(random \"a\" 2)"), ErrorKind::BadCast);
    }

    #[test]
    fn print_returns_its_last_argument() {
        assert_eq!(ok("(print 1 2 3)"), Value::Int(3));
        assert_eq!(ok("(for i (range 0 3) (print i))"), Value::Int(2));
        assert_eq!(fails("(print)"), ErrorKind::TooFewArgs);
    }

    #[test]
    fn file_roundtrip_and_include() {
        let path = std::env::temp_dir().join("wisp-builtins-include.lisp");
        let path = path.to_string_lossy().into_owned();
        let mut env = Environment::new();

        let write = format!("(write-file \"{path}\" \"(define shared 42) shared\")");
        assert_eq!(run(&write, &mut env).unwrap(), Value::Int(1));

        let read = format!("(read-file \"{path}\")");
        assert_eq!(
            run(&read, &mut env).unwrap(),
            Value::string("(define shared 42) shared")
        );

        // `include` returns the file's final value and merges its scope.
        let include = format!("(include \"{path}\")");
        assert_eq!(run(&include, &mut env).unwrap(), Value::Int(42));
        assert_eq!(run("shared", &mut env).unwrap(), Value::Int(42));

        assert_eq!(
            fails("(read-file \"wisp-definitely-missing-file\")"),
            ErrorKind::InvalidArgument
        );
    }
}
