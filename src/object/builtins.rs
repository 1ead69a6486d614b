//! Native functions.
//!
//! The position of a builtin in [`BUILTINS`] is the operand of
//! `OpGetBuiltin`, so entries may only be appended.

use std::rc::Rc;

use crate::object::{Builtin, Object};

pub static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: len,
    },
    Builtin {
        name: "puts",
        func: puts,
    },
    Builtin {
        name: "first",
        func: first,
    },
    Builtin {
        name: "last",
        func: last,
    },
    Builtin {
        name: "rest",
        func: rest,
    },
    Builtin {
        name: "push",
        func: push,
    },
];

pub fn lookup_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

fn wrong_arity(got: usize, want: usize) -> Object {
    Object::error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn len(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::String(s) => Object::Integer(s.len() as i64),
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        other => Object::error(format!(
            "argument to `len` not supported, got {}",
            other.kind()
        )),
    }
}

fn puts(args: &[Object]) -> Object {
    for arg in args {
        println!("{}", arg);
    }
    Object::Null
}

fn array_arg<'a>(name: &str, args: &'a [Object]) -> Result<&'a Rc<Vec<Object>>, Object> {
    match &args[0] {
        Object::Array(elements) => Ok(elements),
        other => Err(Object::error(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.kind()
        ))),
    }
}

fn first(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match array_arg("first", args) {
        Ok(elements) => elements.first().cloned().unwrap_or(Object::Null),
        Err(err) => err,
    }
}

fn last(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match array_arg("last", args) {
        Ok(elements) => elements.last().cloned().unwrap_or(Object::Null),
        Err(err) => err,
    }
}

fn rest(args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match array_arg("rest", args) {
        Ok(elements) if elements.is_empty() => Object::Null,
        Ok(elements) => Object::array(elements[1..].to_vec()),
        Err(err) => err,
    }
}

fn push(args: &[Object]) -> Object {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    match array_arg("push", args) {
        Ok(elements) => {
            let mut extended = Vec::with_capacity(elements.len() + 1);
            extended.extend(elements.iter().cloned());
            extended.push(args[1].clone());
            Object::array(extended)
        }
        Err(err) => err,
    }
}
