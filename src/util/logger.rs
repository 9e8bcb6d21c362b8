use std::fmt::{Display, Formatter};

use super::Log;

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Order of the log level, used to compare against a threshold with `>=`.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl Log<&'static str> {
    /// Raise the verbosity level by one notch per repeated `-v` flag,
    /// saturating at `Verbose`.
    pub fn from_verbosity(label: &'static str, count: u8) -> Self {
        match count {
            0 => Log::None,
            1 => Log::Default(label),
            2 => Log::Success(label),
            3 => Log::Result(label),
            _ => Log::Verbose(label),
        }
    }
}
