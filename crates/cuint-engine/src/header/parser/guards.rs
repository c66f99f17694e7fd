//! Parser guards to prevent infinite loops and stack overflow

use super::ParseError;
use crate::header::token::Span;

/// Maximum iterations for any parser loop before bailing out.
///
/// Preprocessed headers that pull in libc easily reach tens of thousands of
/// tokens, so this is sized for whole translation units.
const MAX_LOOP_ITERATIONS: usize = 4_000_000;

/// Maximum declarator nesting depth before rejecting parse
pub const MAX_PARSE_DEPTH: usize = 64;

/// Guard against infinite loops in parser
///
/// Tracks iteration count and returns error if exceeded.
///
/// # Example
///
/// ```ignore
/// let mut guard = LoopGuard::new("members");
/// while !done {
///     guard.check(span)?;
///     // ... parse something ...
/// }
/// ```
pub struct LoopGuard {
    name: &'static str,
    count: usize,
    max: usize,
}

impl LoopGuard {
    /// Create a new loop guard with default limit
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            count: 0,
            max: MAX_LOOP_ITERATIONS,
        }
    }

    /// Create a loop guard with custom limit
    #[cfg(test)]
    pub fn with_limit(name: &'static str, max: usize) -> Self {
        Self { name, count: 0, max }
    }

    /// Check iteration count, return error if exceeded
    #[inline]
    pub fn check(&mut self, span: Span) -> Result<(), ParseError> {
        self.count += 1;
        if self.count > self.max {
            return Err(ParseError::parser_limit_exceeded(
                format!("loop '{}' exceeded {} iterations", self.name, self.max),
                span,
            ));
        }
        Ok(())
    }
}

/// Depth counter for recursive declarator parsing.
///
/// The parser calls [`DepthCounter::enter`] before recursing and
/// [`DepthCounter::leave`] after. A failed parse is abandoned as a whole, so
/// error paths do not need to unwind the counter.
#[derive(Debug, Default)]
pub struct DepthCounter {
    depth: usize,
}

impl DepthCounter {
    #[inline]
    pub fn enter(&mut self, name: &'static str, span: Span) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(ParseError::parser_limit_exceeded(
                format!("maximum nesting depth ({}) exceeded in {}", MAX_PARSE_DEPTH, name),
                span,
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_guard_trips_after_limit() {
        let mut guard = LoopGuard::with_limit("test", 2);
        assert!(guard.check(Span::default()).is_ok());
        assert!(guard.check(Span::default()).is_ok());
        assert!(guard.check(Span::default()).is_err());
    }

    #[test]
    fn test_depth_counter_limits_nesting() {
        let mut depth = DepthCounter::default();
        for _ in 0..MAX_PARSE_DEPTH {
            depth.enter("test", Span::default()).unwrap();
        }
        assert!(depth.enter("test", Span::default()).is_err());
        depth.leave();
        depth.leave();
        assert!(depth.enter("test", Span::default()).is_ok());
    }
}
