//! Host functions installed into the global frame.
//!
//! Every native goes through the same callable contract as user-defined
//! functions: declared arity checked by the evaluator before dispatch,
//! invocation via a plain `fn(&[Value]) -> Result<Value, String>`.
//! Argument indexing below is safe because the arity check already ran.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::debug;

use crate::environment::Environment;
use crate::function::NativeFunction;
use crate::value::{Callable, Value};

/// Define all native functions in `globals`.
pub fn install(globals: &Rc<RefCell<Environment>>) {
    let mut env = globals.borrow_mut();

    let natives: [NativeFunction; 7] = [
        NativeFunction {
            name: "clock",
            arity: 0,
            func: clock,
        },
        NativeFunction {
            name: "sleep",
            arity: 1,
            func: sleep,
        },
        NativeFunction {
            name: "input",
            arity: 0,
            func: input,
        },
        NativeFunction {
            name: "toUpper",
            arity: 1,
            func: to_upper,
        },
        NativeFunction {
            name: "toLower",
            arity: 1,
            func: to_lower,
        },
        NativeFunction {
            name: "sqrt",
            arity: 1,
            func: sqrt,
        },
        NativeFunction {
            name: "pow",
            arity: 2,
            func: pow,
        },
    ];

    for native in natives {
        debug!("Installing native function '{}'", native.name);

        env.define_implicit(native.name, Value::Callable(Callable::Native(Rc::new(native))));
    }
}

/// Milliseconds since the Unix epoch.
fn clock(_args: &[Value]) -> Result<Value, String> {
    Ok(Value::Number(Utc::now().timestamp_millis() as f64))
}

/// Block the whole process for the given number of milliseconds.
fn sleep(args: &[Value]) -> Result<Value, String> {
    let Value::Number(ms) = args[0] else {
        return Err("'sleep' expects a number of milliseconds.".to_string());
    };

    if ms < 0.0 {
        return Err("'sleep' expects a non-negative number of milliseconds.".to_string());
    }

    thread::sleep(Duration::from_millis(ms as u64));
    Ok(Value::Null)
}

/// Read one line from standard input, without the trailing newline.
fn input(_args: &[Value]) -> Result<Value, String> {
    let mut line = String::new();

    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| format!("'input' failed to read from stdin: {}", e))?;

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(Value::String(line))
}

fn to_upper(args: &[Value]) -> Result<Value, String> {
    let Value::String(s) = &args[0] else {
        return Err("'toUpper' expects a string argument.".to_string());
    };

    Ok(Value::String(s.to_uppercase()))
}

fn to_lower(args: &[Value]) -> Result<Value, String> {
    let Value::String(s) = &args[0] else {
        return Err("'toLower' expects a string argument.".to_string());
    };

    Ok(Value::String(s.to_lowercase()))
}

fn sqrt(args: &[Value]) -> Result<Value, String> {
    let Value::Number(n) = args[0] else {
        return Err("'sqrt' expects a number argument.".to_string());
    };

    if n < 0.0 {
        return Err("'sqrt' expects a non-negative number.".to_string());
    }

    Ok(Value::Number(n.sqrt()))
}

fn pow(args: &[Value]) -> Result<Value, String> {
    let (Value::Number(base), Value::Number(exponent)) = (&args[0], &args[1]) else {
        return Err("'pow' expects two number arguments.".to_string());
    };

    Ok(Value::Number(base.powf(*exponent)))
}
