//! Helper functions callable from rule templates.
//!
//! Arguments arrive in call order with the piped value, if any, last.

use crate::rule::template::{RuleContext, Value};

pub type Func = for<'c> fn(RuleContext<'c>, Vec<Value<'c>>) -> Result<Value<'c>, String>;

pub fn lookup(name: &str) -> Option<Func> {
    let func: Func = match name {
        "normalize" => normalize,
        "index" => index,
        "label" => label,
        "default" => default,
        "lower" => lower,
        "upper" => upper,
        "trim" => trim,
        "trimPrefix" => trim_prefix,
        "trimSuffix" => trim_suffix,
        "replace" => replace,
        "splitList" => split_list,
        "join" => join,
        "reverse" => reverse,
        "strsToItfs" => strs_to_itfs,
        _ => return None,
    };
    Some(func)
}

/// Turn an arbitrary name into one usable as a router or host label.
///
/// Runs of characters other than ASCII letters and digits collapse into a single `-`.
pub fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn expect_args(args: &[Value<'_>], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        if min == max {
            return Err(format!("wrong number of args: want {}, got {}", min, args.len()));
        }
        return Err(format!("wrong number of args: want {} to {}, got {}", min, max, args.len()));
    }
    Ok(())
}

fn string(value: &Value<'_>) -> Result<String, String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {}", other.type_name())),
    }
}

fn list<'c>(value: Value<'c>) -> Result<Vec<Value<'c>>, String> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(format!("expected a list, got {}", other.type_name())),
    }
}

fn map_string<'c>(args: Vec<Value<'c>>, f: impl Fn(&str) -> String) -> Result<Value<'c>, String> {
    expect_args(&args, 1, 1)?;
    Ok(Value::Str(f(&string(&args[0])?)))
}

fn normalize<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    map_string(args, normalize_name)
}

fn lower<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    map_string(args, str::to_lowercase)
}

fn upper<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    map_string(args, str::to_uppercase)
}

fn trim<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    map_string(args, |s| s.trim().to_string())
}

fn index<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let mut args = args.into_iter();
    let (Some(collection), Some(key)) = (args.next(), args.next()) else {
        return Err("missing arguments".to_string());
    };
    match (collection, key) {
        (Value::Labels(labels), key) => {
            let key = string(&key)?;
            Ok(Value::Str(labels.get(&key).cloned().unwrap_or_default()))
        }
        (Value::List(items), Value::Int(i)) => usize::try_from(i)
            .ok()
            .and_then(|i| items.into_iter().nth(i))
            .ok_or_else(|| format!("index out of range: {}", i)),
        (collection, _) => Err(format!("can't index item of type {}", collection.type_name())),
    }
}

/// `label KEY [DEFAULT]`: the instance label `KEY`, or `DEFAULT` when it is missing or empty.
fn label<'c>(ctx: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 1, 2)?;
    let key = string(&args[0])?;
    let fallback = match args.get(1) {
        Some(value) => string(value)?,
        None => String::new(),
    };
    Ok(Value::Str(
        ctx.labels
            .get(&key)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or(fallback),
    ))
}

/// `default DEFAULT VALUE`: `VALUE` unless it is empty.
fn default<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let mut args = args.into_iter();
    let (Some(fallback), Some(value)) = (args.next(), args.next()) else {
        return Err("missing arguments".to_string());
    };
    let empty = match &value {
        Value::Str(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Int(i) => *i == 0,
        Value::Bool(b) => !b,
        Value::Labels(labels) => labels.is_empty(),
        Value::Context(_) => false,
    };
    Ok(if empty { fallback } else { value })
}

fn trim_prefix<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let prefix = string(&args[0])?;
    let s = string(&args[1])?;
    Ok(Value::Str(s.strip_prefix(prefix.as_str()).unwrap_or(&s).to_string()))
}

fn trim_suffix<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let suffix = string(&args[0])?;
    let s = string(&args[1])?;
    Ok(Value::Str(s.strip_suffix(suffix.as_str()).unwrap_or(&s).to_string()))
}

/// `replace OLD NEW S`
fn replace<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 3, 3)?;
    let old = string(&args[0])?;
    let new = string(&args[1])?;
    let s = string(&args[2])?;
    Ok(Value::Str(s.replace(&old, &new)))
}

/// `splitList SEP S`
fn split_list<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let sep = string(&args[0])?;
    let s = string(&args[1])?;
    let parts = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep.as_str()).map(|p| Value::Str(p.to_string())).collect()
    };
    Ok(Value::List(parts))
}

/// `join SEP LIST`
fn join<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 2, 2)?;
    let mut args = args.into_iter();
    let (Some(sep), Some(items)) = (args.next(), args.next()) else {
        return Err("missing arguments".to_string());
    };
    let sep = string(&sep)?;
    let parts = match items {
        Value::List(items) => items.iter().map(Value::render).collect::<Result<Vec<_>, _>>()?,
        other => vec![string(&other)?],
    };
    Ok(Value::Str(parts.join(&sep)))
}

fn reverse<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 1, 1)?;
    let mut items = list(args.into_iter().next().ok_or("missing argument")?)?;
    items.reverse();
    Ok(Value::List(items))
}

/// Lists are already untyped; kept so templates written for typed lists still run.
fn strs_to_itfs<'c>(_: RuleContext<'c>, args: Vec<Value<'c>>) -> Result<Value<'c>, String> {
    expect_args(&args, 1, 1)?;
    Ok(Value::List(list(args.into_iter().next().ok_or("missing argument")?)?))
}
