//! Positional argument helpers.

use minijinja::value::{Value, ValueKind};
use minijinja::{Error, ErrorKind};

/// Require exactly `count` arguments.
pub(crate) fn exact<'a>(
    name: &str,
    args: &'a [Value],
    count: usize,
) -> Result<&'a [Value], Error> {
    match args.len().cmp(&count) {
        std::cmp::Ordering::Less => Err(Error::new(
            ErrorKind::MissingArgument,
            format!("{name} expects {count} argument(s), got {}", args.len()),
        )),
        std::cmp::Ordering::Greater => Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("{name} expects {count} argument(s), got {}", args.len()),
        )),
        std::cmp::Ordering::Equal => Ok(args),
    }
}

/// Require at least `count` arguments.
pub(crate) fn at_least<'a>(
    name: &str,
    args: &'a [Value],
    count: usize,
) -> Result<&'a [Value], Error> {
    if args.len() < count {
        return Err(Error::new(
            ErrorKind::MissingArgument,
            format!("{name} expects at least {count} argument(s), got {}", args.len()),
        ));
    }
    Ok(args)
}

/// Borrow a string argument.
pub(crate) fn string<'a>(name: &str, value: &'a Value) -> Result<&'a str, Error> {
    value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("{name} expects a string, got {}", value.kind()),
        )
    })
}

/// Convert an integer argument.
pub(crate) fn int(name: &str, value: &Value) -> Result<i64, Error> {
    if value.kind() != ValueKind::Number || !value.is_integer() {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{name} expects an integer, got {}", value.kind()),
        ));
    }
    i64::try_from(value.clone())
}
