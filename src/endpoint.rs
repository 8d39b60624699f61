//! Endpoint grammar for sources, sinks, and sanitizers.
//!
//! Sources and sinks are written `[module:]function/arity$location` where the
//! location is `ret` or `argN`. Sanitizers use the same grammar without the
//! `$location` suffix.

use crate::error::TaintError;
use crate::graph::{FieldPath, Locator, ProcId, TaintNode};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Returns the compiled endpoint regex.
fn get_endpoint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(?:([^:/$]+):)?([^:/$]+)/([0-9]+)\$(ret|arg([0-9]+))$")
            .expect("Invalid endpoint regex pattern")
    })
}

/// Returns the compiled bare-procedure regex used for sanitizers.
fn get_proc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(?:([^:/$]+):)?([^:/$]+)/([0-9]+)$")
            .expect("Invalid procedure regex pattern")
    })
}

impl ProcId {
    /// Parses a bare procedure descriptor, e.g. `m:f/1` or `f/0`.
    ///
    /// # Errors
    ///
    /// Returns [`TaintError::BadEndpoint`] on any deviation from the grammar.
    pub fn parse(text: &str) -> Result<Self, TaintError> {
        let captures = get_proc_re()
            .captures(text)
            .ok_or_else(|| TaintError::BadEndpoint(text.to_owned()))?;
        let module = captures.get(1).map_or("", |m| m.as_str());
        let name = captures.get(2).map_or("", |m| m.as_str());
        let arity: u32 = captures
            .get(3)
            .map_or("", |m| m.as_str())
            .parse()
            .map_err(|_| TaintError::BadEndpoint(text.to_owned()))?;
        Ok(Self::new(module, name, arity))
    }
}

/// A parsed source or sink: a procedure plus a formal location within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// The named procedure.
    pub proc: ProcId,
    /// The formal location, `ret` or `argN` with the whole-value field path.
    pub locator: Locator,
}

impl Endpoint {
    /// Parses an endpoint descriptor, e.g. `m:f/1$ret` or `f/2$arg0`.
    ///
    /// # Errors
    ///
    /// Returns [`TaintError::BadEndpoint`] on any deviation from the grammar.
    pub fn parse(text: &str) -> Result<Self, TaintError> {
        let captures = get_endpoint_re()
            .captures(text)
            .ok_or_else(|| TaintError::BadEndpoint(text.to_owned()))?;
        let module = captures.get(1).map_or("", |m| m.as_str());
        let name = captures.get(2).map_or("", |m| m.as_str());
        let arity: u32 = captures
            .get(3)
            .map_or("", |m| m.as_str())
            .parse()
            .map_err(|_| TaintError::BadEndpoint(text.to_owned()))?;
        let locator = match captures.get(5) {
            Some(index) => {
                let index: usize = index
                    .as_str()
                    .parse()
                    .map_err(|_| TaintError::BadEndpoint(text.to_owned()))?;
                Locator::Argument(index, FieldPath::root())
            }
            None => Locator::Return(FieldPath::root()),
        };
        Ok(Self {
            proc: ProcId::new(module, name, arity),
            locator,
        })
    }

    /// The interprocedural work item this endpoint denotes.
    #[must_use]
    pub fn node(&self) -> TaintNode {
        TaintNode::new(self.proc.clone(), self.locator.clone())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.proc, self.locator)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_ret_endpoint() {
        let endpoint = Endpoint::parse("m:f/1$ret").unwrap();
        assert_eq!(endpoint.proc, ProcId::new("m", "f", 1));
        assert_eq!(endpoint.locator, Locator::Return(FieldPath::root()));
    }

    #[test]
    fn test_parse_arg_endpoint() {
        let endpoint = Endpoint::parse("mod:handle/3$arg2").unwrap();
        assert_eq!(endpoint.proc, ProcId::new("mod", "handle", 3));
        assert_eq!(endpoint.locator, Locator::Argument(2, FieldPath::root()));
    }

    #[test]
    fn test_parse_default_module() {
        let endpoint = Endpoint::parse("f/0$ret").unwrap();
        assert!(endpoint.proc.module.is_empty());
        assert_eq!(endpoint.to_string(), "f/0$ret");
    }

    #[test]
    fn test_endpoint_round_trip() {
        for text in ["m:f/1$ret", "m:f/12$arg3", "g/0$ret", "a_b:c_d/7$arg0"] {
            let endpoint = Endpoint::parse(text).unwrap();
            assert_eq!(endpoint.to_string(), text);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_endpoints() {
        for text in [
            "",
            "m:f/1",
            "m:f$ret",
            "m:f/x$ret",
            "m:f/1$arg",
            "m:f/1$argx",
            "m:f/1$local",
            ":f/1$ret",
            "m:/1$ret",
            "m:f/1$ret$ret",
            "m:f/-1$ret",
        ] {
            let result = Endpoint::parse(text);
            assert!(
                matches!(result, Err(TaintError::BadEndpoint(ref bad)) if bad == text),
                "expected BadEndpoint for '{text}'"
            );
        }
    }

    #[test]
    fn test_parse_sanitizer_descriptor() {
        let proc = ProcId::parse("m:san/1").unwrap();
        assert_eq!(proc, ProcId::new("m", "san", 1));
        assert_eq!(proc.to_string(), "m:san/1");
        assert!(ProcId::parse("m:san/1$ret").is_err());
        assert!(ProcId::parse("san").is_err());
    }
}
