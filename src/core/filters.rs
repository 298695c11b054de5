use crate::models::{DepartmentPolicy, Person};
use thiserror::Error;

/// Errors raised while joining the roster
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("malformed input: {email} has no `{attribute}` attribute")]
    MissingAttribute { email: String, attribute: String },
}

/// Split the roster into the primary department (group A) and the
/// secondary group (group B)
///
/// Both groups keep roster order. With a secondary allow-list, people in
/// neither group are left out entirely.
pub fn partition_by_department<'a>(
    roster: &'a [Person],
    policy: &DepartmentPolicy,
) -> (Vec<&'a Person>, Vec<&'a Person>) {
    let mut group_a = Vec::new();
    let mut group_b = Vec::new();

    for person in roster {
        if policy.is_primary(person) {
            group_a.push(person);
        } else if policy.is_secondary(person) {
            group_b.push(person);
        }
    }

    (group_a, group_b)
}

/// Join key of a person over the criteria, or `None` when any value is blank
///
/// A missing attribute is malformed input.
pub fn join_key<'a>(person: &'a Person, criteria: &[String]) -> Result<Option<Vec<&'a str>>, MatchError> {
    let mut key = Vec::with_capacity(criteria.len());
    for attribute in criteria {
        let value = person
            .attribute(attribute)
            .ok_or_else(|| MatchError::MissingAttribute {
                email: person.email.clone(),
                attribute: attribute.clone(),
            })?;
        if value.is_empty() {
            return Ok(None);
        }
        key.push(value);
    }
    Ok(Some(key))
}
