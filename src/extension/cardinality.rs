//! Cardinality validators and predicate filters.

use crate::error::ExtensionError;
use crate::value::Uri;

use super::{ExtensionResult, TriplePack, Validator, ValidatorArg, exact_args};

/// Every subject in the pack (the focus included) has at least one `predicate` triple.
#[derive(Debug, Clone)]
pub struct AtLeastOne {
    pub predicate: Uri,
}

impl Validator for AtLeastOne {
    fn name(&self) -> &str {
        "AtLeastOne"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        for subject in pack.subjects() {
            if pack.count_for(subject, &self.predicate) == 0 {
                return Err(ExtensionError::Cardinality {
                    predicate: self.predicate.to_string(),
                    subject: subject.to_string(),
                    expected: "at least 1".into(),
                    actual: 0,
                });
            }
        }
        Ok(pack)
    }
}

/// No subject has more than one `predicate` triple.
#[derive(Debug, Clone)]
pub struct AtMostOne {
    pub predicate: Uri,
}

impl Validator for AtMostOne {
    fn name(&self) -> &str {
        "AtMostOne"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        for subject in pack.subjects() {
            let actual = pack.count_for(subject, &self.predicate);
            if actual > 1 {
                return Err(ExtensionError::Cardinality {
                    predicate: self.predicate.to_string(),
                    subject: subject.to_string(),
                    expected: "at most 1".into(),
                    actual,
                });
            }
        }
        Ok(pack)
    }
}

/// The pack holds exactly `count` triples with `predicate`.
#[derive(Debug, Clone)]
pub struct ExactlyN {
    pub predicate: Uri,
    pub count: usize,
}

impl Validator for ExactlyN {
    fn name(&self) -> &str {
        "ExactlyN"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        let actual = pack.with_predicate(&self.predicate).count();
        if actual != self.count {
            return Err(ExtensionError::Cardinality {
                predicate: self.predicate.to_string(),
                subject: pack.focus().to_string(),
                expected: format!("exactly {}", self.count),
                actual,
            });
        }
        Ok(pack)
    }
}

/// Drops every triple with `predicate`; never fails.
#[derive(Debug, Clone)]
pub struct Exclude {
    pub predicate: Uri,
}

impl Validator for Exclude {
    fn name(&self) -> &str {
        "Exclude"
    }

    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>> {
        let before = pack.len();
        let pack = pack.retain(|t| t.predicate != self.predicate);
        tracing::trace!(
            predicate = %self.predicate,
            dropped = before - pack.len(),
            "excluded triples"
        );
        Ok(pack)
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

pub fn at_least_one(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    let [predicate] = exact_args("AtLeastOne", args)?;
    Ok(Box::new(AtLeastOne {
        predicate: predicate.into_uri("AtLeastOne")?,
    }))
}

pub fn at_most_one(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    let [predicate] = exact_args("AtMostOne", args)?;
    Ok(Box::new(AtMostOne {
        predicate: predicate.into_uri("AtMostOne")?,
    }))
}

/// `ExactlyOne(p)` is `ExactlyN(p, 1)`.
pub fn exactly_one(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    let [predicate] = exact_args("ExactlyOne", args)?;
    Ok(Box::new(ExactlyN {
        predicate: predicate.into_uri("ExactlyOne")?,
        count: 1,
    }))
}

pub fn exactly_n(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    let [predicate, count] = exact_args("ExactlyN", args)?;
    Ok(Box::new(ExactlyN {
        predicate: predicate.into_uri("ExactlyN")?,
        count: count.into_count("ExactlyN")?,
    }))
}

pub fn exclude(args: Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>> {
    let [predicate] = exact_args("Exclude", args)?;
    Ok(Box::new(Exclude {
        predicate: predicate.into_uri("Exclude")?,
    }))
}
