//! Value multiplicity.
//!
//! The multiplicity of an attribute is the number of values it holds,
//! as constrained by the data dictionary.
//! It is used for validation only:
//! the element framing never depends on it.

use snafu::{Backtrace, Snafu};
use std::fmt;
use std::str::FromStr;

/// Error raised when parsing a value multiplicity from its textual form.
#[derive(Debug, Snafu)]
#[snafu(display("Invalid value multiplicity `{}`", text))]
pub struct ParseVmError {
    text: String,
    backtrace: Backtrace,
}

/// A declared value multiplicity.
///
/// Either a fixed number of values,
/// or a range whose upper bound may be unbounded
/// and whose count may be restricted to multiples of a step
/// (as in `2-2n` or `3-3n`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VM {
    /// Exactly this many values.
    Fixed(u32),
    /// Between `min` and `max` values (inclusive),
    /// `max` being `None` if unbounded,
    /// and the count being a multiple of `step`.
    Range {
        /// minimum number of values
        min: u32,
        /// maximum number of values, if bounded
        max: Option<u32>,
        /// the count must be a multiple of this number
        step: u32,
    },
}

impl VM {
    /// A single value (`1`).
    pub const ONE: VM = VM::Fixed(1);
    /// One or more values (`1-n`).
    pub const ONE_OR_MORE: VM = VM::Range {
        min: 1,
        max: None,
        step: 1,
    };

    /// Check whether a value count is admitted by this multiplicity.
    ///
    /// ```
    /// # use dcmio_core::VM;
    /// let vm: VM = "3-3n".parse()?;
    /// assert!(vm.is_valid(6));
    /// assert!(!vm.is_valid(4));
    /// # Ok::<(), dcmio_core::vm::ParseVmError>(())
    /// ```
    pub fn is_valid(self, count: u32) -> bool {
        match self {
            VM::Fixed(n) => count == n,
            VM::Range { min, max, step } => {
                count >= min
                    && max.map(|max| count <= max).unwrap_or(true)
                    && (step <= 1 || count % step == 0)
            }
        }
    }

    /// Check whether a multiplicity deduced from the data (`other`)
    /// fits within this reference multiplicity.
    pub fn compatible(self, other: VM) -> bool {
        if self == VM::Fixed(0) {
            return false;
        }
        match other {
            VM::Fixed(0) => true,
            VM::Fixed(n) => self.is_valid(n),
            VM::Range { min, max, step } => match self {
                VM::Fixed(_) => false,
                VM::Range {
                    min: self_min,
                    max: self_max,
                    step: self_step,
                } => {
                    min >= self_min
                        && match (self_max, max) {
                            (None, _) => true,
                            (Some(_), None) => false,
                            (Some(a), Some(b)) => b <= a,
                        }
                        && (self_step <= 1 || step % self_step == 0)
                }
            },
        }
    }

    /// Guess a multiplicity from a binary value length
    /// and the size of each sample.
    ///
    /// This is only a lower bound,
    /// and yields `Fixed(0)` when the length is not a multiple of the size.
    pub fn from_length(length: usize, size: u32) -> VM {
        if length == 0 || size == 0 || length % size as usize != 0 {
            return VM::Fixed(0);
        }
        VM::Fixed((length / size as usize) as u32)
    }

    /// Count the values in a backslash separated text value.
    /// Empty components (spaces only) are not counted.
    pub fn count_text_values(text: &[u8]) -> u32 {
        let mut count = 0;
        let mut value_found = false;
        for &c in text {
            match c {
                b' ' | b'\0' => {}
                b'\\' => {
                    if value_found {
                        count += 1;
                        value_found = false;
                    }
                }
                _ => value_found = true,
            }
        }
        if value_found {
            count += 1;
        }
        count
    }
}

impl FromStr for VM {
    type Err = ParseVmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = || ParseVmSnafu { text: s }.build();
        let s = s.trim();
        match s.split_once('-') {
            None => s.parse().map(VM::Fixed).map_err(|_| fail()),
            Some((min, max)) => {
                let min: u32 = min.parse().map_err(|_| fail())?;
                if let Some(factor) = max.strip_suffix('n') {
                    let step = if factor.is_empty() {
                        1
                    } else {
                        factor.parse().map_err(|_| fail())?
                    };
                    if step == 0 || (step > 1 && min != step) {
                        return Err(fail());
                    }
                    Ok(VM::Range {
                        min,
                        max: None,
                        step,
                    })
                } else {
                    let max: u32 = max.parse().map_err(|_| fail())?;
                    if max < min {
                        return Err(fail());
                    }
                    Ok(VM::Range {
                        min,
                        max: Some(max),
                        step: 1,
                    })
                }
            }
        }
    }
}

impl fmt::Display for VM {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VM::Fixed(n) => write!(f, "{}", n),
            VM::Range {
                min,
                max: Some(max),
                ..
            } => write!(f, "{}-{}", min, max),
            VM::Range {
                min,
                max: None,
                step: 1,
            } => write!(f, "{}-n", min),
            VM::Range {
                min,
                max: None,
                step,
            } => write!(f, "{}-{}n", min, step),
        }
    }
}
