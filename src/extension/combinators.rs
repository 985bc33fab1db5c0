//! Validators built from other validators.

use crate::error::ExtensionError;

use super::{ExtensionResult, TriplePack, Validator, ValidatorArg, validate};

/// Runs every inner validator in sequence on the previous one's output.
///
/// Stops at the first failure. An empty `And` passes the pack through.
#[derive(Debug)]
pub struct And {
    pub validators: Vec<Box<dyn Validator>>,
}

impl Validator for And {
    fn name(&self) -> &str {
        "And"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        validate(pack, &self.validators)
    }
}

/// Passes if any inner validator accepts the original pack.
///
/// Each alternative sees the unmodified input; the first success wins. When
/// every alternative fails the last failure is returned.
#[derive(Debug)]
pub struct Or {
    pub validators: Vec<Box<dyn Validator>>,
}

impl Validator for Or {
    fn name(&self) -> &str {
        "Or"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        let mut last = None;
        for v in &self.validators {
            match v.validate(pack.clone()) {
                Ok(out) => return Ok(out),
                Err(e) => {
                    tracing::trace!(alternative = v.name(), error = %e, "alternative rejected");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| ExtensionError::ValidationFailed {
            validator: "Or".into(),
            reason: "no alternatives to try".into(),
        }))
    }
}

fn validators(name: &str, args: Vec<ValidatorArg>) -> ExtensionResult<Vec<Box<dyn Validator>>> {
    args.into_iter().map(|a| a.into_validator(name)).collect()
}

pub fn and(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    Ok(Box::new(And {
        validators: validators("And", args)?,
    }))
}

pub fn or(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    Ok(Box::new(Or {
        validators: validators("Or", args)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::cardinality::{AtLeastOne, Exclude, ExactlyN};
    use crate::graph::Triple;
    use crate::value::{Uri, Value};

    fn uri(s: &str) -> Uri {
        Uri::new(s)
    }

    fn pack() -> TriplePack<'static> {
        TriplePack::detached(
            uri("f"),
            vec![
                Triple::new(uri("f"), uri("a"), 1i64),
                Triple::new(uri("f"), uri("b"), 2i64),
            ],
        )
    }

    #[test]
    fn and_threads_output_through() {
        let v = And {
            validators: vec![
                Box::new(Exclude { predicate: uri("a") }),
                Box::new(ExactlyN {
                    predicate: uri("a"),
                    count: 0,
                }),
            ],
        };
        assert_eq!(v.validate(pack()).unwrap().len(), 1);
    }

    #[test]
    fn and_stops_at_first_failure() {
        let v = And {
            validators: vec![
                Box::new(AtLeastOne { predicate: uri("zzz") }),
                Box::new(Exclude { predicate: uri("a") }),
            ],
        };
        assert!(matches!(
            v.validate(pack()).unwrap_err(),
            ExtensionError::Cardinality { .. }
        ));
    }

    #[test]
    fn or_tries_each_alternative_on_original_input() {
        // The first alternative would drop `a`; the second must still see it.
        let v = Or {
            validators: vec![
                Box::new(AtLeastOne { predicate: uri("zzz") }),
                Box::new(ExactlyN {
                    predicate: uri("a"),
                    count: 1,
                }),
            ],
        };
        assert_eq!(v.validate(pack()).unwrap().len(), 2);
    }

    #[test]
    fn or_returns_last_failure() {
        let v = Or {
            validators: vec![
                Box::new(AtLeastOne { predicate: uri("x") }),
                Box::new(AtLeastOne { predicate: uri("y") }),
            ],
        };
        let err = v.validate(pack()).unwrap_err();
        assert!(matches!(
            err,
            ExtensionError::Cardinality { ref predicate, .. } if predicate == "<y>"
        ));
    }

    #[test]
    fn empty_or_fails() {
        let v = Or { validators: vec![] };
        assert!(matches!(
            v.validate(pack()).unwrap_err(),
            ExtensionError::ValidationFailed { .. }
        ));
    }

    #[test]
    fn factories_require_validator_arguments() {
        let err = and(vec![ValidatorArg::Value(Value::from(1i64))]).unwrap_err();
        assert!(matches!(err, ExtensionError::InvalidArguments { .. }));
        assert!(or(vec![]).is_ok());
    }
}
