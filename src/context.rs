// src/context.rs
//! Context extension traits and early-return macros for error handling.
//!
//! anyhow-like `.context()` / `.with_context()` on any `Result` whose error
//! converts into our `Error`, plus `Option` support and `bail!` / `ensure!`.

use crate::error::{Error, Result};

/// `.context()` / `.with_context()` on any `Result`.
pub trait Context<T, E> {
    /// Add static or owned context (eager, use only when cheap).
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>;

    /// Add context lazily (closure only runs on the error path).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    #[inline]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>,
    {
        self.map_err(|err| err.into().context(context))
    }

    #[inline]
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|err| err.into().context(f()))
    }
}

/// `Option<T>` → `Result<T>` with a message.
pub trait OptionContext<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>;

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    #[inline]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>,
    {
        self.ok_or_else(|| Error::custom(context))
    }

    #[inline]
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| Error::custom(f()))
    }
}

// ====================== CONVENIENCE MACROS ======================

/// Early return with an error: `bail!("msg")`, `bail!(err)` or formatted.
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::Error::msg($msg))
    };
    ($err:expr $(,)?) => {
        return Err(Into::<$crate::error::Error>::into($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::format(format_args!($fmt, $($arg)*)))
    };
}

/// Ensure a condition is true, else `bail!`.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !($cond) {
            $crate::bail!($msg);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($fmt, $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_segments(raw: &str) -> Result<u32> {
        let n: u32 = raw
            .parse()
            .map_err(|e: std::num::ParseIntError| Error::custom(e.to_string()))
            .context("parsing segment count")?;
        crate::ensure!(n > 0, "segment count must be positive, got {}", n);
        Ok(n)
    }

    #[test]
    fn test_result_context_wraps_error() {
        let err = parse_segments("abc").unwrap_err();
        assert!(err.to_string().starts_with("parsing segment count: "));
    }

    #[test]
    fn test_ensure_formats_message() {
        let err = parse_segments("0").unwrap_err();
        assert_eq!(err.to_string(), "segment count must be positive, got 0");
        assert_eq!(parse_segments("1000").unwrap(), 1000);
    }

    #[test]
    fn test_option_context() {
        let none: Option<u8> = None;
        let err = none.with_context(|| "no sRGB surface format").unwrap_err();
        assert_eq!(err.to_string(), "no sRGB surface format");
        assert_eq!(Some(3u8).context("unused").unwrap(), 3);
    }
}
